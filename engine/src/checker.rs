//! Race coordinator for one check run.
//!
//! The probe runs as a detached task that hands its result back over a
//! oneshot channel. The coordinator waits on three events and acts on the
//! first one only:
//!
//! ```text
//!                 +--> cancellation token fired --> Cancelled
//!   Running ------+--> check timer elapsed -------> TimedOut   (cancels token)
//!                 +--> probe result received -----> Success | Failure (cancels token)
//! ```
//!
//! Only the completion branch looks at `target_unreachable`. A timeout or an
//! interrupt is a failure even when unreachability is the expected state.
//! When the timer or the token wins, the probe task is left running; its
//! eventual send fails because the receiver is gone, and the result is lost.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use netcheck_config::{CheckConfig, ClusterContext};
use netcheck_types::{ProbeTarget, Verdict};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::prober::{DialProber, ProbeError, Prober};

/// Report future type alias.
pub type ReportFut<'a> = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>>;

/// Sink for the single pass/fail report of a run.
pub trait Reporter: Send + Sync {
    fn report_success(&self) -> ReportFut<'_>;
    fn report_failure(&self, errors: Vec<String>) -> ReportFut<'_>;
}

/// Runs one bounded, cancellable probe and decides the verdict.
pub struct Checker<P = DialProber> {
    target: ProbeTarget,
    target_unreachable: bool,
    check_timeout: Duration,
    cluster: ClusterContext,
    prober: Arc<P>,
}

impl Checker<DialProber> {
    #[must_use]
    pub fn new(target: ProbeTarget, target_unreachable: bool, check_timeout: Duration) -> Self {
        Self {
            target,
            target_unreachable,
            check_timeout,
            cluster: ClusterContext::default(),
            prober: Arc::new(DialProber),
        }
    }

    #[must_use]
    pub fn from_config(config: &CheckConfig) -> Self {
        Self::new(
            ProbeTarget::parse(config.connection_target.as_str()),
            config.target_unreachable,
            config.check_timeout,
        )
        .with_cluster(config.cluster.clone())
    }
}

impl<P: Prober> Checker<P> {
    /// Swap the prober, keeping everything else.
    #[must_use]
    pub fn with_prober<Q: Prober>(self, prober: Q) -> Checker<Q> {
        Checker {
            target: self.target,
            target_unreachable: self.target_unreachable,
            check_timeout: self.check_timeout,
            cluster: self.cluster,
            prober: Arc::new(prober),
        }
    }

    #[must_use]
    pub fn with_cluster(mut self, cluster: ClusterContext) -> Self {
        self.cluster = cluster;
        self
    }

    #[must_use]
    pub fn target(&self) -> &ProbeTarget {
        &self.target
    }

    #[must_use]
    pub fn check_timeout(&self) -> Duration {
        self.check_timeout
    }

    #[must_use]
    pub fn cluster(&self) -> &ClusterContext {
        &self.cluster
    }

    /// Run the probe against the timer and `cancel`, returning exactly one verdict.
    ///
    /// `cancel` is triggered on the way out of the timeout and completion
    /// branches so anything else waiting on it is released.
    pub async fn run(&self, cancel: &CancellationToken) -> Verdict {
        tracing::info!(
            connection_target = %self.target,
            namespace = self.cluster.namespace.as_deref().unwrap_or("<none>"),
            kubeconfig = ?self.cluster.kubeconfig,
            timeout = ?self.check_timeout,
            "Running network connection checker"
        );

        let (done_tx, done_rx) = oneshot::channel::<Result<(), ProbeError>>();
        let probe = self
            .prober
            .probe(self.target.clone(), self.check_timeout);
        tokio::spawn(async move {
            // Receiver is gone once the timer or the token has won.
            let _ = done_tx.send(probe.await);
        });

        tokio::select! {
            biased;

            () = cancel.cancelled() => {
                tracing::info!("Cancelling check and shutting down due to interrupt.");
                Verdict::Cancelled
            }
            () = tokio::time::sleep(self.check_timeout) => {
                cancel.cancel();
                tracing::info!("Cancelling check and shutting down due to timeout.");
                Verdict::TimedOut
            }
            result = done_rx => {
                cancel.cancel();
                self.judge(result)
            }
        }
    }

    /// Run, then hand the verdict to `reporter` with exactly one call.
    pub async fn run_and_report<R>(
        &self,
        cancel: &CancellationToken,
        reporter: &R,
    ) -> anyhow::Result<Verdict>
    where
        R: Reporter + ?Sized,
    {
        let verdict = self.run(cancel).await;
        match verdict.failure_message() {
            None => reporter
                .report_success()
                .await
                .context("reporting check success")?,
            Some(message) => reporter
                .report_failure(vec![message.to_string()])
                .await
                .context("reporting check failure")?,
        }
        Ok(verdict)
    }

    fn judge(&self, result: Result<Result<(), ProbeError>, oneshot::error::RecvError>) -> Verdict {
        match result {
            Ok(Ok(())) => Verdict::Success,
            Ok(Err(err)) if self.target_unreachable => {
                tracing::info!(
                    connection_target = %self.target,
                    "Target unreachable as expected: {err}"
                );
                Verdict::Success
            }
            Ok(Err(err)) => Verdict::Failure(err.to_string()),
            Err(_) => Verdict::Failure(format!(
                "Network connection check for {} ended without a result",
                self.target
            )),
        }
    }
}
