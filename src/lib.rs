//! Sidekiq Dead Queue Check Library
//!
//! Polls a Sidekiq stats endpoint and reports whether the dead queue is empty,
//! honouring optional silence windows for weekends and a recurring daily period.

pub mod config;
pub mod silence;
pub mod stats;
pub mod checker;
pub mod outcome;
pub mod errors;

pub use config::{argument_error_message, Cli, Config, Credentials};
pub use silence::{Clock, FixedClock, SilenceReason, SilenceSpec, SilenceWindow, SystemClock};
pub use stats::{HttpStatsFetcher, StatsFetcher, StatsSnapshot};
pub use checker::{QueueHealthChecker, DeadQueueCheck};
pub use outcome::{CheckOutcome, Severity};
pub use errors::{CheckError, Result};
