//! Check execution for the network connection check.
//!
//! - [`prober`] - one bounded dial/close attempt against a [`ProbeTarget`]
//! - [`checker`] - races the prober against a timer and an external
//!   cancellation token, producing exactly one [`Verdict`]
//!
//! Probe failures never escape as errors; they become verdicts. Only the
//! [`Reporter`] seam returns `anyhow` errors.

pub mod checker;
pub mod prober;

pub use checker::{Checker, ReportFut, Reporter};
pub use netcheck_types::{ProbeTarget, Verdict};
pub use prober::{DialError, DialProber, ProbeError, ProbeFut, Prober};
pub use tokio_util::sync::CancellationToken;
