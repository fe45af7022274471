use crate::error::RegistryError;
use crate::supervisor::Supervisor;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// One entry in the available-backends manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendEntry {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct ManifestFile {
    #[serde(flatten)]
    backends: HashMap<String, BackendEntry>,
}

/// The set of backend executables this controller knows how to spawn,
/// loaded from a small TOML manifest of `name = { path = "..." }` entries.
/// Distinct from the [`Registry`] of currently-running supervisors: this is
/// the catalog, that is the live state.
#[derive(Debug, Clone, Default)]
pub struct AvailableBackends {
    entries: HashMap<String, BackendEntry>,
}

impl AvailableBackends {
    pub async fn load_manifest(path: &Path) -> Result<Self, RegistryError> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|source| RegistryError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let parsed: ManifestFile = toml::from_str(&raw).map_err(|source| RegistryError::Parse {
            path: path.display().to_string(),
            source,
        })?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let entries = parsed
            .backends
            .into_iter()
            .map(|(name, entry)| (name, BackendEntry { path: base.join(entry.path) }))
            .collect();

        Ok(Self { entries })
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BackendEntry> {
        self.entries.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// Process-wide map of backend id to its running supervisor.
#[derive(Clone, Default)]
pub struct Registry {
    supervisors: Arc<RwLock<HashMap<String, Arc<Supervisor>>>>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, id: String, supervisor: Arc<Supervisor>) -> Result<(), RegistryError> {
        let mut supervisors = self.supervisors.write().await;
        if supervisors.contains_key(&id) {
            return Err(RegistryError::DuplicateBackend(id));
        }
        supervisors.insert(id, supervisor);
        Ok(())
    }

    pub async fn get(&self, id: &str) -> Option<Arc<Supervisor>> {
        self.supervisors.read().await.get(id).cloned()
    }

    pub async fn remove(&self, id: &str) -> Result<Arc<Supervisor>, RegistryError> {
        self.supervisors
            .write()
            .await
            .remove(id)
            .ok_or_else(|| RegistryError::UnknownBackend(id.to_string()))
    }

    pub async fn ids(&self) -> Vec<String> {
        self.supervisors.read().await.keys().cloned().collect()
    }
}
