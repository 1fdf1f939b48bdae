//! Named signals (lock flag, last-wakeup marker)
//!
//! A signal is a name whose presence and modification time carry meaning.
//! The default store keeps one empty file per signal in a directory.

use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

use crate::error::{Error, Result};

#[async_trait]
pub trait SignalStore: Send + Sync {
    /// Whether the signal is currently set
    async fn exists(&self, name: &str) -> Result<bool>;

    /// Set the signal, bumping its timestamp to now
    async fn touch(&self, name: &str) -> Result<()>;

    /// Last time the signal was touched, `None` if it is not set
    async fn modified(&self, name: &str) -> Result<Option<DateTime<Local>>>;
}

/// Filesystem-backed store: `<dir>/<name>`
#[derive(Debug, Clone)]
pub struct FsSignalStore {
    dir: PathBuf,
}

impl FsSignalStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> Result<PathBuf> {
        let invalid = name.is_empty()
            || name == "."
            || name == ".."
            || name.contains('/')
            || name.contains('\\');
        if invalid {
            return Err(Error::InvalidSignalName(name.to_string()));
        }
        Ok(self.dir.join(name))
    }
}

#[async_trait]
impl SignalStore for FsSignalStore {
    async fn exists(&self, name: &str) -> Result<bool> {
        let path = self.path_for(name)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    async fn touch(&self, name: &str) -> Result<()> {
        let path = self.path_for(name)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?
            .into_std()
            .await;
        // opening an existing file does not bump its mtime
        tokio::task::spawn_blocking(move || file.set_modified(SystemTime::now()))
            .await
            .map_err(std::io::Error::other)??;

        debug!("Touched signal {}", path.display());
        Ok(())
    }

    async fn modified(&self, name: &str) -> Result<Option<DateTime<Local>>> {
        let path = self.path_for(name)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) => Ok(Some(DateTime::<Local>::from(meta.modified()?))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_touch_creates_signal() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsSignalStore::new(dir.path().join("signals"));

        assert!(!store.exists("last_wakeup").await.unwrap());
        assert!(store.modified("last_wakeup").await.unwrap().is_none());

        store.touch("last_wakeup").await.unwrap();
        assert!(store.exists("last_wakeup").await.unwrap());

        let stamp = store.modified("last_wakeup").await.unwrap().unwrap();
        let age = Local::now() - stamp;
        assert!(age.num_seconds().abs() < 60);
    }

    #[tokio::test]
    async fn test_touch_bumps_existing_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last_wakeup");
        let old = SystemTime::now() - std::time::Duration::from_secs(3 * 3600);
        let file = std::fs::File::create(&path).unwrap();
        file.set_modified(old).unwrap();
        drop(file);

        let store = FsSignalStore::new(dir.path());
        let before = store.modified("last_wakeup").await.unwrap().unwrap();
        assert!((Local::now() - before).num_minutes() >= 170);

        store.touch("last_wakeup").await.unwrap();
        let after = store.modified("last_wakeup").await.unwrap().unwrap();
        assert!((Local::now() - after).num_minutes() < 1);
    }

    #[tokio::test]
    async fn test_rejects_path_like_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsSignalStore::new(dir.path());

        for name in ["", ".", "..", "../escape", "a/b"] {
            assert!(matches!(
                store.exists(name).await,
                Err(Error::InvalidSignalName(_))
            ));
        }
    }
}
