//! Exactly one report per run, whichever branch of the race wins.

use std::time::Duration;

use netcheck_engine::{CancellationToken, Checker, ProbeTarget, Verdict};
use netcheck_types::{INTERRUPT_MESSAGE, TIMEOUT_MESSAGE};

use crate::common::{Recorded, RecordingReporter, Stalled, reachable_target, unreachable_target};

#[tokio::test]
async fn completion_reports_once() {
    let (_listener, addr) = reachable_target().await;
    let reporter = RecordingReporter::default();
    let cancel = CancellationToken::new();

    let checker = Checker::new(ProbeTarget::parse(addr.to_string()), false, Duration::from_secs(5));
    let verdict = checker.run_and_report(&cancel, &reporter).await.unwrap();

    assert_eq!(verdict, Verdict::Success);
    assert_eq!(reporter.calls(), vec![Recorded::Success]);
    assert!(cancel.is_cancelled());
}

#[tokio::test]
async fn failure_reports_once_with_diagnostic() {
    let addr = unreachable_target().await;
    let reporter = RecordingReporter::default();

    let checker = Checker::new(
        ProbeTarget::parse(format!("tcp://{addr}")),
        false,
        Duration::from_secs(5),
    );
    checker
        .run_and_report(&CancellationToken::new(), &reporter)
        .await
        .unwrap();

    let calls = reporter.calls();
    assert_eq!(calls.len(), 1);
    match &calls[0] {
        Recorded::Failure(errors) => {
            assert_eq!(errors.len(), 1);
            assert!(errors[0].contains(&format!("{addr} is DOWN")), "{}", errors[0]);
        }
        other => panic!("expected Failure, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn timeout_reports_once_even_when_unreachability_expected() {
    for inverted in [false, true] {
        let reporter = RecordingReporter::default();
        let cancel = CancellationToken::new();
        let checker = Checker::new(
            ProbeTarget::parse("tcp://10.0.0.1:9"),
            inverted,
            Duration::from_secs(2),
        )
        .with_prober(Stalled);

        let verdict = checker.run_and_report(&cancel, &reporter).await.unwrap();

        assert_eq!(verdict, Verdict::TimedOut);
        assert_eq!(
            reporter.calls(),
            vec![Recorded::Failure(vec![TIMEOUT_MESSAGE.to_string()])]
        );
        assert!(cancel.is_cancelled());
    }
}

#[tokio::test(start_paused = true)]
async fn interrupt_reports_once_even_when_unreachability_expected() {
    for inverted in [false, true] {
        let reporter = RecordingReporter::default();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(250)).await;
            trigger.cancel();
        });

        let checker = Checker::new(
            ProbeTarget::parse("tcp://10.0.0.1:9"),
            inverted,
            Duration::from_secs(2),
        )
        .with_prober(Stalled);

        let verdict = checker.run_and_report(&cancel, &reporter).await.unwrap();

        assert_eq!(verdict, Verdict::Cancelled);
        assert_eq!(
            reporter.calls(),
            vec![Recorded::Failure(vec![INTERRUPT_MESSAGE.to_string()])]
        );
    }
}
