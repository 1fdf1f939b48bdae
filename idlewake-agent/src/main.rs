//! Idlewake - cron-driven idle check
//!
//! Suspends the machine when it is idle and schedules an RTC wakeup at the
//! next configured hour. Meant to be triggered every few minutes by an
//! external scheduler; every run makes exactly one decision and exits.

use anyhow::{Context, Result};
use chrono::Local;
use idlewake_agent::{logging, AgentConfig, FsSignalStore, IdleCheck, LoadSample, ProcessRunner};
use tracing::instrument::WithSubscriber;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // .env may carry IDLEWAKE_CONFIG / RUST_LOG
    dotenvy::dotenv().ok();

    let config = AgentConfig::load()
        .await
        .context("Failed to load configuration")?;

    let dispatch = logging::dispatch(&config.log).context("Failed to open log sink")?;

    let store = FsSignalStore::new(&config.signals.dir);
    let check = IdleCheck::new(&config, ProcessRunner, store)
        .context("Failed to create idle check")?;

    let run = async {
        let sample = LoadSample::read();
        check.run_once(sample, Local::now()).await
    };
    run.with_subscriber(dispatch)
        .await
        .context("Idle check failed")?;

    Ok(())
}
