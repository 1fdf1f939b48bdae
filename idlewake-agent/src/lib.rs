//! Idlewake agent - suspend an idle server until its next busy hour
//!
//! Each invocation is one stateless check:
//! - Sample the 1/5/15 minute load averages
//! - Honor a manual lock flag and a recent-wakeup debounce marker
//! - Pick the next allowed wakeup hour (weekday vs weekend schedule)
//! - Run the RTC wake + suspend command and record the wakeup

pub mod check;
pub mod config;
pub mod error;
pub mod execution;
pub mod logging;
pub mod metrics;
pub mod policy;
pub mod signals;

pub use check::{IdleCheck, RunReport};
pub use config::AgentConfig;
pub use error::{Error, Result};
pub use execution::{CommandOutput, CommandRunner, ProcessRunner};
pub use metrics::LoadSample;
pub use policy::{Decision, PolicyEngine, SkipReason, WakeupSchedule};
pub use signals::{FsSignalStore, SignalStore};
