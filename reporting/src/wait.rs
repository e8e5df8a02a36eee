use std::time::Duration;

use thiserror::Error;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::ReportClient;

/// Delay between reachability polls of the Kuberhealthy endpoint.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum WaitError {
    #[error("stopped waiting for Kuberhealthy at {url}: cancelled")]
    Cancelled { url: String },
}

impl ReportClient {
    /// Poll the reporting endpoint's origin until it answers with any HTTP
    /// response, or until `cancel` fires.
    pub async fn wait_for_kuberhealthy(&self, cancel: &CancellationToken) -> Result<(), WaitError> {
        let origin = origin_of(self.reporting_url());
        let mut interval = tokio::time::interval(POLL_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                () = cancel.cancelled() => {
                    return Err(WaitError::Cancelled { url: origin.to_string() });
                }
                _ = interval.tick() => {}
            }

            let attempt = tokio::select! {
                biased;

                () = cancel.cancelled() => {
                    return Err(WaitError::Cancelled { url: origin.to_string() });
                }
                attempt = self.http.get(origin.clone()).send() => attempt,
            };

            match attempt {
                Ok(response) => {
                    tracing::debug!(status = %response.status(), "Kuberhealthy is reachable");
                    return Ok(());
                }
                Err(e) => tracing::debug!(url = %origin, "Kuberhealthy not reachable yet: {e}"),
            }
        }
    }
}

/// The reporting URL with path and query stripped.
fn origin_of(url: &Url) -> Url {
    let mut origin = url.clone();
    origin.set_path("/");
    origin.set_query(None);
    origin.set_fragment(None);
    origin
}
