//! Core domain types for the network connection check.
//!
//! This crate contains pure domain types with no IO, no async, and no
//! dependencies. The address parser lives here because it is a total function
//! over strings.

mod target;
mod verdict;

pub use target::{IpFamily, ProbeTarget, Transport, split_address};
pub use verdict::{INTERRUPT_MESSAGE, TIMEOUT_MESSAGE, Verdict};
