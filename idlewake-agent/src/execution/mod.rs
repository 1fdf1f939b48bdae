//! External command execution
//!
//! Handles the suspend/RTC-wake command:
//! - Argv template expansion (`{seconds}` placeholder)
//! - Process spawn with captured stdout/stderr
//! - Exit code and timing reporting

use async_trait::async_trait;
use serde::Serialize;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command as AsyncCommand;
use tracing::debug;

use crate::error::{Error, Result};

pub const SECONDS_PLACEHOLDER: &str = "{seconds}";

/// Captured result of one external command
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub execution_time_ms: u128,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `argv[0]` with the remaining arguments and wait for it to exit
    async fn run(&self, argv: &[String]) -> Result<CommandOutput>;
}

/// Spawns real processes through tokio
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, argv: &[String]) -> Result<CommandOutput> {
        let (program, args) = argv.split_first().ok_or(Error::EmptyCommand)?;
        let start_time = Instant::now();
        debug!("Spawning {} {:?}", program, args);

        let output = AsyncCommand::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| Error::Spawn {
                program: program.clone(),
                source,
            })?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
            execution_time_ms: start_time.elapsed().as_millis(),
        })
    }
}

/// Expand the suspend command template for a given delay
pub fn suspend_argv(template: &[String], seconds: u64) -> Vec<String> {
    let seconds = seconds.to_string();
    template
        .iter()
        .map(|arg| arg.replace(SECONDS_PLACEHOLDER, &seconds))
        .collect()
}
