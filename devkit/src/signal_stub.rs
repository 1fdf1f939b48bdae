/*!
Signal store en mémoire

Remplace les fichiers de lock / marqueur de réveil. Permet aussi de simuler
un marqueur illisible pour tester le comportement "fail open".
*/

use async_trait::async_trait;
use chrono::{DateTime, Local};
use idlewake_agent::{Error, SignalStore};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct MemorySignalStore {
    signals: Arc<Mutex<HashMap<String, DateTime<Local>>>>,
    unreadable: Arc<Mutex<HashSet<String>>>,
    touches: Arc<Mutex<Vec<String>>>,
}

impl MemorySignalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Positionne un signal avec un timestamp donné
    pub fn set(&self, name: &str, at: DateTime<Local>) {
        self.signals.lock().unwrap().insert(name.to_string(), at);
    }

    pub fn remove(&self, name: &str) {
        self.signals.lock().unwrap().remove(name);
    }

    /// Toute lecture de ce signal renverra une erreur I/O
    pub fn mark_unreadable(&self, name: &str) {
        self.unreadable.lock().unwrap().insert(name.to_string());
    }

    pub fn get(&self, name: &str) -> Option<DateTime<Local>> {
        self.signals.lock().unwrap().get(name).copied()
    }

    /// Noms passés à `touch`, dans l'ordre
    pub fn touches(&self) -> Vec<String> {
        self.touches.lock().unwrap().clone()
    }

    fn check_readable(&self, name: &str) -> idlewake_agent::Result<()> {
        if self.unreadable.lock().unwrap().contains(name) {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                format!("signal {} is unreadable", name),
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl SignalStore for MemorySignalStore {
    async fn exists(&self, name: &str) -> idlewake_agent::Result<bool> {
        self.check_readable(name)?;
        Ok(self.signals.lock().unwrap().contains_key(name))
    }

    async fn touch(&self, name: &str) -> idlewake_agent::Result<()> {
        self.touches.lock().unwrap().push(name.to_string());
        self.set(name, Local::now());
        log::info!("[MOCK] Touched signal {}", name);
        Ok(())
    }

    async fn modified(&self, name: &str) -> idlewake_agent::Result<Option<DateTime<Local>>> {
        self.check_readable(name)?;
        Ok(self.get(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_touch_and_unreadable() {
        let store = MemorySignalStore::new();
        assert!(!store.exists("idlewake.lock").await.unwrap());

        store.touch("last_wakeup").await.unwrap();
        assert!(store.modified("last_wakeup").await.unwrap().is_some());
        assert_eq!(store.touches(), vec!["last_wakeup".to_string()]);

        store.mark_unreadable("last_wakeup");
        assert!(store.modified("last_wakeup").await.is_err());
    }
}
