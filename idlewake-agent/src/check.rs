//! Single idle check run
//!
//! Wires the policy engine to its collaborators: reads the lock flag and
//! wakeup marker from the signal store, evaluates the policy, runs the
//! suspend command and records the wakeup.

use chrono::{DateTime, Duration, Local, Timelike};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::{AgentConfig, SignalsConfig};
use crate::error::Result;
use crate::execution::{suspend_argv, CommandOutput, CommandRunner};
use crate::metrics::LoadSample;
use crate::policy::{Decision, PolicyEngine};
use crate::signals::SignalStore;

/// What happened during one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub sample: LoadSample,
    pub decision: Decision,
    pub command: Option<CommandOutput>,
    pub marker_updated: bool,
}

impl RunReport {
    fn skipped(sample: LoadSample, decision: Decision) -> Self {
        Self {
            sample,
            decision,
            command: None,
            marker_updated: false,
        }
    }
}

pub struct IdleCheck<R, S> {
    engine: PolicyEngine,
    runner: R,
    store: S,
    signals: SignalsConfig,
    suspend_command: Vec<String>,
    recent_wake: Duration,
}

impl<R: CommandRunner, S: SignalStore> IdleCheck<R, S> {
    pub fn new(config: &AgentConfig, runner: R, store: S) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            engine: config.policy_engine()?,
            runner,
            store,
            signals: config.signals.clone(),
            suspend_command: config.suspend.command.clone(),
            recent_wake: Duration::minutes(i64::from(config.policy.recent_wake_minutes)),
        })
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Evaluate the policy once and suspend if it says so.
    ///
    /// Only a lock flag that cannot be read is an error; command failures
    /// are logged and reported.
    pub async fn run_once(&self, sample: LoadSample, now: DateTime<Local>) -> Result<RunReport> {
        info!("getloadavg: {} (threshold {})", sample, self.engine.load_threshold());

        let locked = self.store.exists(&self.signals.lock).await?;
        if locked {
            info!("Lock signal {} is set", self.signals.lock);
        }
        let recently_woke = self.recently_woke(now).await;

        let decision = self
            .engine
            .evaluate(&sample, now.naive_local(), locked, recently_woke);

        let (hour, seconds) = match decision {
            Decision::Suspend { hour, seconds_until_wake } => (hour, seconds_until_wake),
            Decision::DoNotSuspend { reason } => {
                info!("Not suspending: {}", reason);
                return Ok(RunReport::skipped(sample, decision));
            }
        };

        let now_hour = f64::from(now.num_seconds_from_midnight()) / 3600.0;
        info!("time_to_next_wakeup: {:.4},{} -> {}s", now_hour, hour, seconds);

        let argv = suspend_argv(&self.suspend_command, seconds);
        info!("Running suspend command: {:?}", argv);

        let output = match self.runner.run(&argv).await {
            Ok(output) => output,
            Err(e) => {
                error!("Suspend command failed to start: {}", e);
                return Ok(RunReport::skipped(sample, decision));
            }
        };

        info!("Suspend command stdout: {:?}", output.stdout);
        info!("Suspend command stderr: {:?}", output.stderr);

        if !output.success() {
            error!(
                "Suspend command exited with {:?} after {}ms",
                output.exit_code, output.execution_time_ms
            );
            return Ok(RunReport {
                sample,
                decision,
                command: Some(output),
                marker_updated: false,
            });
        }

        let marker_updated = match self.store.touch(&self.signals.wake_marker).await {
            Ok(()) => {
                info!("Updated wakeup marker {}", self.signals.wake_marker);
                true
            }
            Err(e) => {
                warn!("Failed to update wakeup marker {}: {}", self.signals.wake_marker, e);
                false
            }
        };

        Ok(RunReport {
            sample,
            decision,
            command: Some(output),
            marker_updated,
        })
    }

    /// Whether the wakeup marker was touched within the debounce window.
    /// An absent or unreadable marker counts as "not recent".
    async fn recently_woke(&self, now: DateTime<Local>) -> bool {
        let stamp = match self.store.modified(&self.signals.wake_marker).await {
            Ok(Some(stamp)) => stamp,
            Ok(None) => return false,
            Err(e) => {
                warn!("Cannot read wakeup marker {}: {}", self.signals.wake_marker, e);
                return false;
            }
        };

        // a marker from the future (clock stepped back after resume) is recent
        let recent = now - stamp < self.recent_wake;
        if recent {
            info!("Last wakeup at {}, within {} minutes", stamp, self.recent_wake.num_minutes());
        }
        recent
    }
}
