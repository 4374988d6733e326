use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Entity, EntityId, Tag, TagId};

const CATALOG_VERSION: &str = "1.0.0";
const CATALOG_FILENAME: &str = "catalog.json";

/// Tags and entities persisted to disk as a single document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSnapshot {
    pub version: String,
    pub generated_at: DateTime<Utc>,
    pub tags: Vec<Tag>,
    pub entities: Vec<Entity>,
}

impl CatalogSnapshot {
    pub fn new(tags: Vec<Tag>, entities: Vec<Entity>) -> Self {
        Self {
            version: CATALOG_VERSION.to_string(),
            generated_at: Utc::now(),
            tags,
            entities,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    pub fn tag(&self, id: TagId) -> Option<&Tag> {
        self.tags.iter().find(|tag| tag.id == id)
    }

    pub fn tag_by_canonical_name(&self, canonical_name: &str) -> Option<&Tag> {
        self.tags
            .iter()
            .find(|tag| tag.canonical_name == canonical_name)
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id == id)
    }

    /// Next free tag id. Ids start at 1 since 0 is the root sentinel.
    pub fn next_tag_id(&self) -> TagId {
        self.tags.iter().map(|tag| tag.id).max().unwrap_or(0) + 1
    }
}

/// JSON store that manages the read/write lifecycle of the catalog snapshot.
#[derive(Debug)]
pub struct CatalogStore {
    path: PathBuf,
}

impl CatalogStore {
    /// Create a new store rooted at the provided data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let mut path = data_dir.into();
        path.push(CATALOG_FILENAME);
        Self { path }
    }

    /// Load the catalog from disk if present and compatible with the current schema version.
    pub fn load(&self) -> Result<Option<CatalogSnapshot>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let snapshot: CatalogSnapshot =
                    serde_json::from_str(&contents).context("failed to parse catalog json")?;
                if snapshot.version != CATALOG_VERSION {
                    anyhow::bail!(
                        "catalog schema mismatch (found {}, expected {})",
                        snapshot.version,
                        CATALOG_VERSION
                    );
                }
                Ok(Some(snapshot))
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Persist the provided snapshot to disk.
    pub fn persist(&self, snapshot: &CatalogSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = self.path.with_extension(format!(
            "{}.tmp",
            Utc::now().timestamp_nanos_opt().unwrap_or(0)
        ));
        let json =
            serde_json::to_string_pretty(snapshot).context("failed to serialize catalog")?;

        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Attempt to load an existing catalog, falling back to a rebuild if none or invalid.
    pub fn load_or_rebuild<F>(&self, rebuild: F) -> Result<CatalogSnapshot>
    where
        F: FnOnce() -> Result<CatalogSnapshot>,
    {
        match self.load() {
            Ok(Some(snapshot)) => Ok(snapshot),
            Ok(None) => {
                tracing::info!(path = %self.path.display(), "catalog missing, rebuilding");
                self.rebuild_with(rebuild)
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to read catalog, rebuilding");
                self.rebuild_with(rebuild)
            }
        }
    }

    fn rebuild_with<F>(&self, rebuild: F) -> Result<CatalogSnapshot>
    where
        F: FnOnce() -> Result<CatalogSnapshot>,
    {
        let mut snapshot = rebuild().context("rebuild callback failed")?;
        snapshot.version = CATALOG_VERSION.to_string();
        self.persist(&snapshot)?;
        Ok(snapshot)
    }
}

/// Read a seed snapshot (same layout as the catalog file, version optional).
pub fn read_seed(path: &std::path::Path) -> Result<CatalogSnapshot> {
    #[derive(Deserialize)]
    struct Seed {
        #[serde(default)]
        tags: Vec<Tag>,
        #[serde(default)]
        entities: Vec<Entity>,
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read seed file '{}'", path.display()))?;
    let seed: Seed = serde_json::from_str(&contents).context("failed to parse seed json")?;
    Ok(CatalogSnapshot::new(seed.tags, seed.entities))
}
