//! Environment configuration for the network connection check.
//!
//! Everything the check needs is read once at process start. Loading goes
//! through an injectable variable lookup and clock, so tests never mutate the
//! process environment.
//!
//! | Variable | Required | Meaning |
//! |----------|----------|---------|
//! | `CONNECTION_TARGET` | yes | `host:port` or `proto://host:port` |
//! | `CONNECTION_TARGET_UNREACHABLE` | no | pass the check when the target is unreachable |
//! | `KH_CHECK_RUN_DEADLINE` | no | unix-seconds deadline; 20s timeout when absent |
//! | `KUBECONFIG` | no | kubeconfig path for out-of-cluster runs |
//! | `KH_REPORTING_URL` | reporter | Kuberhealthy status endpoint |
//! | `KH_RUN_UUID` | reporter | identifier of this check run |

mod deadline;
mod namespace;

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use url::Url;

pub use deadline::{
    DEADLINE_SAFETY_MARGIN, DEFAULT_CHECK_TIMEOUT, DeadlineError, effective_timeout,
    parse_deadline,
};
pub use namespace::{NAMESPACE_FILE, read_namespace};

pub const CONNECTION_TARGET_ENV: &str = "CONNECTION_TARGET";
pub const CONNECTION_TARGET_UNREACHABLE_ENV: &str = "CONNECTION_TARGET_UNREACHABLE";
pub const CHECK_RUN_DEADLINE_ENV: &str = "KH_CHECK_RUN_DEADLINE";
pub const KUBECONFIG_ENV: &str = "KUBECONFIG";
pub const REPORTING_URL_ENV: &str = "KH_REPORTING_URL";
pub const RUN_UUID_ENV: &str = "KH_RUN_UUID";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("CONNECTION_TARGET environment variable has not been set")]
    MissingTarget,
    #[error("CONNECTION_TARGET_UNREACHABLE could not be parsed: invalid syntax: {value:?}")]
    InvalidUnreachableFlag { value: String },
    #[error("{var} environment variable has not been set")]
    MissingVar { var: &'static str },
    #[error("KH_REPORTING_URL is not a valid URL: {source}")]
    InvalidReportingUrl {
        #[source]
        source: url::ParseError,
    },
}

/// Process-scoped cluster details handed to the checker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterContext {
    pub kubeconfig: Option<PathBuf>,
    pub namespace: Option<String>,
}

/// Resolved configuration for one check run.
#[derive(Debug, Clone)]
pub struct CheckConfig {
    /// Network target to dial, as configured.
    pub connection_target: String,
    /// Report success when the target cannot be reached.
    pub target_unreachable: bool,
    /// Effective time budget for the check.
    pub check_timeout: Duration,
    pub cluster: ClusterContext,
}

impl CheckConfig {
    /// Load from the process environment and the service account mount.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(
            |name| std::env::var(name).ok(),
            Utc::now(),
            Path::new(NAMESPACE_FILE),
        )
    }

    pub fn load<F>(
        lookup: F,
        now: DateTime<Utc>,
        namespace_file: &Path,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let check_timeout = match lookup_deadline(&lookup) {
            Ok(deadline) => effective_timeout(deadline, now),
            Err(e) => {
                tracing::info!("There was an issue getting the check deadline: {e}");
                DEFAULT_CHECK_TIMEOUT
            }
        };
        tracing::info!(timeout = ?check_timeout, "Check time limit set");

        let connection_target = non_empty(&lookup, CONNECTION_TARGET_ENV)
            .ok_or(ConfigError::MissingTarget)?;

        let target_unreachable = match non_empty(&lookup, CONNECTION_TARGET_UNREACHABLE_ENV) {
            Some(value) => {
                parse_bool(&value).ok_or(ConfigError::InvalidUnreachableFlag { value })?
            }
            None => false,
        };

        let namespace = read_namespace(namespace_file);
        if let Some(namespace) = &namespace {
            tracing::info!(namespace = %namespace, "Found pod namespace");
        }

        let cluster = ClusterContext {
            kubeconfig: non_empty(&lookup, KUBECONFIG_ENV).map(PathBuf::from),
            namespace,
        };

        Ok(Self {
            connection_target,
            target_unreachable,
            check_timeout,
            cluster,
        })
    }
}

/// Where and how to report the check result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportingConfig {
    pub reporting_url: Url,
    pub run_uuid: String,
}

impl ReportingConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(|name| std::env::var(name).ok())
    }

    pub fn load<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_url = non_empty(&lookup, REPORTING_URL_ENV).ok_or(ConfigError::MissingVar {
            var: REPORTING_URL_ENV,
        })?;
        let reporting_url =
            Url::parse(&raw_url).map_err(|source| ConfigError::InvalidReportingUrl { source })?;
        let run_uuid = non_empty(&lookup, RUN_UUID_ENV).ok_or(ConfigError::MissingVar {
            var: RUN_UUID_ENV,
        })?;

        Ok(Self {
            reporting_url,
            run_uuid,
        })
    }
}

fn lookup_deadline<F>(lookup: &F) -> Result<DateTime<Utc>, DeadlineError>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = non_empty(lookup, CHECK_RUN_DEADLINE_ENV).ok_or(DeadlineError::Missing {
        var: CHECK_RUN_DEADLINE_ENV,
    })?;
    parse_deadline(CHECK_RUN_DEADLINE_ENV, &raw)
}

fn non_empty<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).filter(|value| !value.is_empty())
}

/// Boolean parsing with the spellings Kuberhealthy checks have always accepted.
#[must_use]
pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
