use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::store::{Entity, Result, Snapshot, Store};

/// Keeps the whole catalog in one pretty-printed JSON document and rewrites it
/// after every change.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    snapshot: Snapshot,
}

impl JsonFileStore {
    /// Opens the document at `path`. A missing file starts an empty catalog;
    /// an unreadable one is an error so it never gets overwritten.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let snapshot = if path.exists() {
            let content = fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            warn!("Catalog file {} does not exist yet, starting empty", path.display());
            Snapshot::default()
        };

        Ok(Self { path, snapshot })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, snapshot: &Snapshot) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(snapshot)?;
        fs::write(&self.path, content)?;
        debug!("Wrote catalog to {}", self.path.display());
        Ok(())
    }
}

impl Store for JsonFileStore {
    fn load_all(&self) -> Result<Snapshot> {
        Ok(self.snapshot.clone())
    }

    fn save(&mut self, entity: &Entity) -> Result<()> {
        let mut snapshot = self.snapshot.clone();
        snapshot.upsert(entity);
        self.write(&snapshot)?;
        self.snapshot = snapshot;
        Ok(())
    }

    fn delete(&mut self, entity: &Entity) -> Result<()> {
        let mut snapshot = self.snapshot.clone();
        snapshot.remove(entity);
        self.write(&snapshot)?;
        self.snapshot = snapshot;
        Ok(())
    }
}
