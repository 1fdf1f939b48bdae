/*!
Test Harness pour le check d'inactivité

Facilite l'écriture de scénarios de bout en bout avec:
- Configuration par défaut modifiable (seuil, horaires, commande)
- Runner et signal store simulés partagés avec le check
- Exécution d'un run avec une charge et une heure fixées
*/

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate, TimeZone};
use idlewake_agent::{AgentConfig, IdleCheck, LoadSample, RunReport};

use crate::runner_stub::RecordingRunner;
use crate::signal_stub::MemorySignalStore;

/// Heure locale fixe pour les scénarios
pub fn local_time(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Local> {
    let naive = NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(h, min, s))
        .expect("valid test date");
    Local
        .from_local_datetime(&naive)
        .earliest()
        .expect("local time exists")
}

/// Harness de test complet pour un run
pub struct TestHarness {
    pub config: AgentConfig,
    pub runner: RecordingRunner,
    pub store: MemorySignalStore,
}

impl TestHarness {
    /// Crée un harness avec la configuration par défaut
    pub fn new() -> Self {
        env_logger::try_init().ok(); // Init logging pour tests

        Self {
            config: AgentConfig::default(),
            runner: RecordingRunner::new(),
            store: MemorySignalStore::new(),
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.config.policy.load_threshold = threshold;
        self
    }

    pub fn with_command(mut self, argv: &[&str]) -> Self {
        self.config.suspend.command = argv.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Pose le lock manuel
    pub fn lock(&self, at: DateTime<Local>) {
        self.store.set(&self.config.signals.lock, at);
    }

    /// Simule un réveil précédent
    pub fn woke_at(&self, at: DateTime<Local>) {
        self.store.set(&self.config.signals.wake_marker, at);
    }

    pub fn wake_marker(&self) -> Option<DateTime<Local>> {
        self.store.get(&self.config.signals.wake_marker)
    }

    /// Construit le check avec les stubs partagés
    pub fn check(&self) -> Result<IdleCheck<RecordingRunner, MemorySignalStore>> {
        IdleCheck::new(&self.config, self.runner.clone(), self.store.clone())
            .context("Failed to build idle check")
    }

    /// Exécute un run complet
    pub async fn run(&self, load: [f64; 3], now: DateTime<Local>) -> Result<RunReport> {
        let report = self
            .check()?
            .run_once(LoadSample::from(load), now)
            .await
            .context("Idle check run failed")?;
        log::info!("Run report: {:?}", report.decision);
        Ok(report)
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
