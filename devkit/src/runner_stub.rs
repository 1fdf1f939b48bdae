/*!
Runner de commandes simulé

Remplace le lancement de processus: chaque argv est enregistré et une réponse
préparée (code de sortie, stdout, stderr ou échec de lancement) est renvoyée.
*/

use async_trait::async_trait;
use idlewake_agent::{CommandOutput, CommandRunner, Error};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
enum StubResponse {
    Exit(CommandOutput),
    SpawnFailure,
}

/// Runner qui enregistre les commandes au lieu de les exécuter
#[derive(Clone, Default)]
pub struct RecordingRunner {
    calls: Arc<Mutex<Vec<Vec<String>>>>,
    responses: Arc<Mutex<VecDeque<StubResponse>>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prépare la prochaine réponse (par défaut: sortie 0 sans output)
    pub fn respond_with(&self, exit_code: i32, stdout: &str, stderr: &str) -> &Self {
        self.responses.lock().unwrap().push_back(StubResponse::Exit(CommandOutput {
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            exit_code: Some(exit_code),
            execution_time_ms: 0,
        }));
        self
    }

    /// La prochaine commande échouera au lancement (programme introuvable)
    pub fn fail_to_spawn(&self) -> &Self {
        self.responses.lock().unwrap().push_back(StubResponse::SpawnFailure);
        self
    }

    /// Toutes les commandes reçues, dans l'ordre
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_call(&self) -> Option<Vec<String>> {
        self.calls.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, argv: &[String]) -> idlewake_agent::Result<CommandOutput> {
        self.calls.lock().unwrap().push(argv.to_vec());
        log::info!("[MOCK] Command: {:?}", argv);

        let response = self.responses.lock().unwrap().pop_front();
        match response {
            Some(StubResponse::Exit(output)) => Ok(output),
            Some(StubResponse::SpawnFailure) => Err(Error::Spawn {
                program: argv.first().cloned().unwrap_or_default(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "stubbed spawn failure"),
            }),
            None => Ok(CommandOutput {
                exit_code: Some(0),
                ..CommandOutput::default()
            }),
        }
    }
}
