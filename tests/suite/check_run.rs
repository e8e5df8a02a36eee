//! End-to-end check runs: configuration, real dialing, and Kuberhealthy reports.

use std::path::Path;

use chrono::Utc;
use netcheck_config::{CONNECTION_TARGET_ENV, CONNECTION_TARGET_UNREACHABLE_ENV, CheckConfig};
use netcheck_engine::{CancellationToken, Checker, Verdict};
use wiremock::MockServer;

use crate::common::{expect_report, reachable_target, report_client, unreachable_target};

fn config(target: &str, unreachable: Option<&str>) -> CheckConfig {
    let target = target.to_string();
    let unreachable = unreachable.map(str::to_string);
    CheckConfig::load(
        move |name: &str| match name {
            CONNECTION_TARGET_ENV => Some(target.clone()),
            CONNECTION_TARGET_UNREACHABLE_ENV => unreachable.clone(),
            _ => None,
        },
        Utc::now(),
        Path::new("/nonexistent/netcheck/namespace"),
    )
    .unwrap()
}

#[tokio::test]
async fn reachable_target_reports_ok() {
    let (_listener, addr) = reachable_target().await;
    let server = MockServer::start().await;
    expect_report(&server, serde_json::json!({ "ok": true, "errors": [] })).await;

    let checker = Checker::from_config(&config(&format!("tcp://{addr}"), None));
    let verdict = checker
        .run_and_report(&CancellationToken::new(), &report_client(&server))
        .await
        .unwrap();

    assert_eq!(verdict, Verdict::Success);
}

#[tokio::test]
async fn unreachable_target_reports_down() {
    let addr = unreachable_target().await;
    let raw = format!("tcp://{addr}");
    let server = MockServer::start().await;

    let checker = Checker::from_config(&config(&raw, Some("false")));
    let verdict = checker.run(&CancellationToken::new()).await;
    let Verdict::Failure(message) = &verdict else {
        panic!("expected Failure, got {verdict:?}");
    };
    assert!(message.contains(&format!("{addr} is DOWN")), "{message}");

    expect_report(
        &server,
        serde_json::json!({ "ok": false, "errors": [message] }),
    )
    .await;
    let reported = checker
        .run_and_report(&CancellationToken::new(), &report_client(&server))
        .await
        .unwrap();
    assert_eq!(reported, verdict);
}

#[tokio::test]
async fn unreachable_target_passes_when_expected() {
    let addr = unreachable_target().await;
    let server = MockServer::start().await;
    expect_report(&server, serde_json::json!({ "ok": true, "errors": [] })).await;

    let checker = Checker::from_config(&config(&format!("tcp://{addr}"), Some("true")));
    let verdict = checker
        .run_and_report(&CancellationToken::new(), &report_client(&server))
        .await
        .unwrap();

    assert_eq!(verdict, Verdict::Success);
}

#[tokio::test]
async fn reachable_target_still_passes_when_unreachability_expected() {
    let (_listener, addr) = reachable_target().await;
    let checker = Checker::from_config(&config(&addr.to_string(), Some("true")));
    assert_eq!(checker.run(&CancellationToken::new()).await, Verdict::Success);
}

#[tokio::test]
async fn rejected_report_is_an_error() {
    let (_listener, addr) = reachable_target().await;
    let server = MockServer::start().await;
    wiremock::Mock::given(wiremock::matchers::method("POST"))
        .respond_with(wiremock::ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let checker = Checker::from_config(&config(&addr.to_string(), None));
    let err = checker
        .run_and_report(&CancellationToken::new(), &report_client(&server))
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("503"), "{err:#}");
}

#[tokio::test]
async fn public_host_is_reachable() {
    crate::require_network!();

    let checker = Checker::from_config(&config("example.com:80", None));
    assert_eq!(checker.run(&CancellationToken::new()).await, Verdict::Success);
}
