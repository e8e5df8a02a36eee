//! Kuberhealthy status reporting.
//!
//! A check run ends with one `POST` of a [`Report`] to the URL in
//! `KH_REPORTING_URL`, tagged with the run's `kh-run-uuid` header. Kuberhealthy
//! answers `200 OK` when it accepted the report; anything else is an error.
//!
//! [`ReportClient::wait_for_kuberhealthy`] gates the check on the reporting
//! endpoint being reachable at all, so a node that just joined the cluster
//! does not fail the check before its network is up.

mod wait;

use std::time::Duration;

use netcheck_config::ReportingConfig;
use netcheck_engine::{ReportFut, Reporter};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub use wait::{POLL_INTERVAL, WaitError};

/// Header carrying the run identifier.
pub const RUN_UUID_HEADER: &str = "kh-run-uuid";

const REQUEST_TIMEOUT_SECS: u64 = 10;
const MAX_ERROR_BODY_BYTES: usize = 4 * 1024;

/// Body Kuberhealthy expects from a check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub ok: bool,
    pub errors: Vec<String>,
}

impl Report {
    #[must_use]
    pub fn success() -> Self {
        Self {
            ok: true,
            errors: Vec::new(),
        }
    }

    #[must_use]
    pub fn failure(errors: Vec<String>) -> Self {
        Self { ok: false, errors }
    }
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to build reporting HTTP client: {0}")]
    Build(#[source] reqwest::Error),
    #[error("failed to send report to {url}: {source}")]
    Send {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("bad status code from kuberhealthy status reporting url: [{status}] {body}")]
    Status { status: StatusCode, body: String },
}

/// HTTP client bound to one check run.
#[derive(Debug, Clone)]
pub struct ReportClient {
    http: reqwest::Client,
    reporting_url: Url,
    run_uuid: String,
}

impl ReportClient {
    pub fn new(config: &ReportingConfig) -> Result<Self, ReportError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(ReportError::Build)?;
        Ok(Self {
            http,
            reporting_url: config.reporting_url.clone(),
            run_uuid: config.run_uuid.clone(),
        })
    }

    #[must_use]
    pub fn reporting_url(&self) -> &Url {
        &self.reporting_url
    }

    pub async fn send(&self, report: &Report) -> Result<(), ReportError> {
        tracing::info!(
            ok = report.ok,
            url = %self.reporting_url,
            "Reporting check result to Kuberhealthy"
        );

        let response = self
            .http
            .post(self.reporting_url.clone())
            .header(RUN_UUID_HEADER, &self.run_uuid)
            .json(report)
            .send()
            .await
            .map_err(|source| ReportError::Send {
                url: self.reporting_url.to_string(),
                source,
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            let mut body = response.text().await.unwrap_or_default();
            truncate_at_char_boundary(&mut body, MAX_ERROR_BODY_BYTES);
            return Err(ReportError::Status { status, body });
        }
        Ok(())
    }

    pub async fn report_success(&self) -> Result<(), ReportError> {
        self.send(&Report::success()).await
    }

    pub async fn report_failure(&self, errors: Vec<String>) -> Result<(), ReportError> {
        self.send(&Report::failure(errors)).await
    }
}

impl Reporter for ReportClient {
    fn report_success(&self) -> ReportFut<'_> {
        Box::pin(async move { Ok(ReportClient::report_success(self).await?) })
    }

    fn report_failure(&self, errors: Vec<String>) -> ReportFut<'_> {
        Box::pin(async move { Ok(ReportClient::report_failure(self, errors).await?) })
    }
}

fn truncate_at_char_boundary(text: &mut String, max_bytes: usize) {
    if text.len() <= max_bytes {
        return;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text.truncate(end);
}
