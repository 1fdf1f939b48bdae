//! Configuration management
//!
//! Handles:
//! - Idle threshold, lookahead margin and debounce window
//! - Weekday / weekend wakeup hours
//! - Signal directory and names (lock flag, wakeup marker)
//! - Suspend command template
//! - Log file location and rotation limits

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::execution::SECONDS_PLACEHOLDER;
use crate::policy::{HourSet, PolicyEngine, WakeupSchedule, DEFAULT_WEEKDAY_HOURS};

pub const CONFIG_ENV_VAR: &str = "IDLEWAKE_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub policy: PolicyConfig,
    pub schedule: ScheduleConfig,
    pub signals: SignalsConfig,
    pub suspend: SuspendConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub load_threshold: f64,
    pub lookahead_minutes: u32,
    pub recent_wake_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub weekday_hours: Vec<u8>,
    pub weekend_hours: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalsConfig {
    pub dir: PathBuf,
    pub lock: String,
    pub wake_marker: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuspendConfig {
    pub command: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub path: Option<PathBuf>,
    pub max_bytes: u64,
    pub backups: usize,
    pub level: String,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            load_threshold: 0.5,
            lookahead_minutes: 5,
            recent_wake_minutes: 30,
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            weekday_hours: DEFAULT_WEEKDAY_HOURS.to_vec(),
            weekend_hours: (9..=23).collect(),
        }
    }
}

impl Default for SignalsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("/var/lib/idlewake"),
            lock: "idlewake.lock".to_string(),
            wake_marker: "last_wakeup".to_string(),
        }
    }
}

impl Default for SuspendConfig {
    fn default() -> Self {
        Self {
            command: ["rtcwake", "-m", "mem", "-s", SECONDS_PLACEHOLDER]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: None,
            max_bytes: 5 * 1024 * 1024,
            backups: 2,
            level: "info".to_string(),
        }
    }
}

impl AgentConfig {
    /// Load config from `$IDLEWAKE_CONFIG` or the OS config directory,
    /// falling back to defaults when no file exists.
    pub async fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path).await
    }

    pub async fn load_from(path: &Path) -> Result<Self> {
        let config = if tokio::fs::try_exists(path).await? {
            let content = tokio::fs::read_to_string(path).await?;
            Self::from_toml(&content)?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Get config file path, honoring the environment override
    pub fn config_file_path() -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
            return Ok(PathBuf::from(path));
        }

        let mut path = dirs::config_dir()
            .ok_or_else(|| Error::Config("could not find config directory".to_string()))?;
        path.push("idlewake");
        path.push("config.toml");
        Ok(path)
    }

    pub fn validate(&self) -> Result<()> {
        let threshold = self.policy.load_threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(Error::Config(format!(
                "load_threshold must be a non-negative number, got {}",
                threshold
            )));
        }
        if self.suspend.command.is_empty() {
            return Err(Error::Config("suspend command is empty".to_string()));
        }
        self.wakeup_schedule()?;
        Ok(())
    }

    pub fn wakeup_schedule(&self) -> Result<WakeupSchedule> {
        Ok(WakeupSchedule::new(
            HourSet::new(self.schedule.weekday_hours.iter().copied())?,
            HourSet::new(self.schedule.weekend_hours.iter().copied())?,
        ))
    }

    pub fn policy_engine(&self) -> Result<PolicyEngine> {
        Ok(PolicyEngine::new(
            self.policy.load_threshold,
            self.policy.lookahead_minutes,
            self.wakeup_schedule()?,
        ))
    }
}
