/*!
# Idlewake DevKit - Stubs et utilitaires pour les tests

Bibliothèque facilitant les tests du check d'inactivité sans toucher au système:
- Runner de commandes qui enregistre les appels (pas de vrai rtcwake)
- Signal store en mémoire (lock, marqueur de réveil)
- Harness pour exécuter un run complet avec une horloge et une charge fixées
*/

pub mod runner_stub;
pub mod signal_stub;
pub mod test_utils;

pub use runner_stub::RecordingRunner;
pub use signal_stub::MemorySignalStore;
pub use test_utils::{local_time, TestHarness};
