//! Shared test utilities and fixtures
//!
//! Common infrastructure for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::Duration;

use netcheck_config::{REPORTING_URL_ENV, RUN_UUID_ENV, ReportingConfig};
use netcheck_engine::{
    DialError, ProbeError, ProbeFut, ProbeTarget, Prober, ReportFut, Reporter,
};
use netcheck_reporting::{RUN_UUID_HEADER, ReportClient};
use tokio::net::TcpListener;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const RUN_UUID: &str = "0d6f3c52-5a7e-4b8f-8c11-6e2f9a4b7d10";

/// Listener that accepts connections for the lifetime of the test.
pub async fn reachable_target() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

/// Loopback address with nothing listening on it.
pub async fn unreachable_target() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Report client pointed at `/check` on the mock server.
pub fn report_client(server: &MockServer) -> ReportClient {
    let url = format!("{}/check", server.uri());
    let config = ReportingConfig::load(|name| match name {
        REPORTING_URL_ENV => Some(url.clone()),
        RUN_UUID_ENV => Some(RUN_UUID.to_string()),
        _ => None,
    })
    .unwrap();
    ReportClient::new(&config).unwrap()
}

/// Expect exactly one report with the given body.
pub async fn expect_report(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/check"))
        .and(header(RUN_UUID_HEADER, RUN_UUID))
        .and(body_json(body))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(server)
        .await;
}

/// Prober that never finishes within any reasonable test timeout.
pub struct Stalled;

impl Prober for Stalled {
    fn probe(&self, target: ProbeTarget, _timeout: Duration) -> ProbeFut {
        Box::pin(async move {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(ProbeError::Down {
                target: target.raw().to_string(),
                cause: DialError::Timeout {
                    network: target.transport().to_string(),
                    address: target.host_port().to_string(),
                },
            })
        })
    }
}

/// What a reporter was asked to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    Success,
    Failure(Vec<String>),
}

/// In-memory reporter that records every call.
#[derive(Default)]
pub struct RecordingReporter {
    calls: Mutex<Vec<Recorded>>,
}

impl RecordingReporter {
    pub fn calls(&self) -> Vec<Recorded> {
        self.calls.lock().unwrap().clone()
    }
}

impl Reporter for RecordingReporter {
    fn report_success(&self) -> ReportFut<'_> {
        self.calls.lock().unwrap().push(Recorded::Success);
        Box::pin(async { Ok(()) })
    }

    fn report_failure(&self, errors: Vec<String>) -> ReportFut<'_> {
        self.calls.lock().unwrap().push(Recorded::Failure(errors));
        Box::pin(async { Ok(()) })
    }
}

/// Macro to skip tests that need real outbound network access
#[macro_export]
macro_rules! require_network {
    () => {
        if std::env::var("NETCHECK_TEST_NETWORK").is_err() {
            eprintln!("Skipping test: NETCHECK_TEST_NETWORK is not set");
            return;
        }
    };
}
