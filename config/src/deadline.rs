//! Check deadline handling.
//!
//! Kuberhealthy hands every check run an absolute deadline as unix seconds.
//! The check stops a fixed margin before it so the report still has time to
//! reach the orchestrator.

use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Used when no usable deadline is provided.
pub const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(20);

/// Headroom kept between the end of the check and the orchestrator deadline.
pub const DEADLINE_SAFETY_MARGIN: Duration = Duration::from_secs(5);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeadlineError {
    #[error("{var} environment variable has not been set")]
    Missing { var: &'static str },
    #[error("{var} could not be parsed as unix seconds: {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Parse a unix-seconds deadline value.
pub fn parse_deadline(var: &'static str, value: &str) -> Result<DateTime<Utc>, DeadlineError> {
    value
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .ok_or_else(|| DeadlineError::Invalid {
            var,
            value: value.to_string(),
        })
}

/// Time left before `deadline`, minus the safety margin. Never negative.
#[must_use]
pub fn effective_timeout(deadline: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    let margin = chrono::TimeDelta::from_std(DEADLINE_SAFETY_MARGIN).unwrap_or_default();
    (deadline - (now + margin)).to_std().unwrap_or(Duration::ZERO)
}
