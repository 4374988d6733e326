use std::{collections::HashSet, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::instrument;

use super::{
    AutocompleteTag, CatalogSnapshot, CatalogStore, Entity, EntityId, EntitySummary, ROOT_TAG_ID,
    Tag, TagId, canonical_name,
};
use crate::{
    services::search::{SearchQuery, SearchService},
    tags::tree,
};

/// Failures reported by catalog collaborators.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("tag '{0}' already exists")]
    Conflict(String),
    #[error("parent tag {0} does not exist")]
    InvalidParent(TagId),
    #[error("unknown tag id {0}")]
    UnknownTag(TagId),
    #[error("tag {parent} is {tag} or lies below it")]
    CyclicParent { tag: TagId, parent: TagId },
    #[error("invalid tag name '{0}'")]
    InvalidName(String),
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
    #[error("failed to persist catalog")]
    Storage(#[source] anyhow::Error),
}

/// Operations the search and tag surfaces consume from the media catalog.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Every reachable tag together with its root-to-self display path.
    async fn fetch_autocomplete_tags(&self) -> Result<Vec<AutocompleteTag>, CatalogError>;

    /// Flat tag list, used to build the browsable hierarchy.
    async fn fetch_tags(&self) -> Result<Vec<Tag>, CatalogError>;

    /// Create `name` under `parent_id` (`ROOT_TAG_ID` for a top-level tag).
    async fn add_tag(&self, parent_id: TagId, name: &str) -> Result<Tag, CatalogError>;

    /// Move `tag_id` under `parent_id`, or to the top level for `None`.
    async fn set_parent(
        &self,
        tag_id: TagId,
        parent_id: Option<TagId>,
    ) -> Result<Tag, CatalogError>;

    /// Entity summaries, optionally restricted to a token query.
    async fn fetch_entities(
        &self,
        query: Option<&[String]>,
    ) -> Result<Vec<EntitySummary>, CatalogError>;

    async fn fetch_entity(&self, id: EntityId) -> Result<Entity, CatalogError>;

    /// Persist the entity's tag associations and return the stored record.
    async fn save_entity(&self, entity: &Entity) -> Result<Entity, CatalogError>;

    async fn delete_entity(&self, id: EntityId) -> Result<(), CatalogError>;
}

/// In-process catalog backed by the shared snapshot, optionally written through to disk.
#[derive(Clone)]
pub struct LocalCatalog {
    snapshot: Arc<RwLock<CatalogSnapshot>>,
    store: Option<Arc<CatalogStore>>,
}

impl LocalCatalog {
    pub fn new(snapshot: Arc<RwLock<CatalogSnapshot>>, store: Option<Arc<CatalogStore>>) -> Self {
        Self { snapshot, store }
    }

    /// Catalog that lives only in memory.
    pub fn in_memory(snapshot: CatalogSnapshot) -> Self {
        Self::new(Arc::new(RwLock::new(snapshot)), None)
    }

    pub fn snapshot(&self) -> Arc<RwLock<CatalogSnapshot>> {
        self.snapshot.clone()
    }

    pub async fn tag_by_canonical_name(&self, name: &str) -> Result<Tag, CatalogError> {
        let canonical = canonical_name(name);
        self.snapshot
            .read()
            .await
            .tag_by_canonical_name(&canonical)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("tag {canonical}")))
    }

    /// Write `candidate` to disk, then make it the live snapshot. On a failed
    /// write the live snapshot is left as it was.
    fn commit(
        &self,
        live: &mut CatalogSnapshot,
        candidate: CatalogSnapshot,
    ) -> Result<(), CatalogError> {
        if let Some(store) = &self.store {
            store.persist(&candidate).map_err(CatalogError::Storage)?;
        }
        *live = candidate;
        Ok(())
    }
}

#[async_trait]
impl CatalogApi for LocalCatalog {
    async fn fetch_autocomplete_tags(&self) -> Result<Vec<AutocompleteTag>, CatalogError> {
        let snapshot = self.snapshot.read().await;
        let entries = match tree::build_subtree(&snapshot.tags, ROOT_TAG_ID) {
            Some(forest) => forest
                .paths()
                .into_iter()
                .map(|(node, path)| AutocompleteTag {
                    tag: forest.node(node).tag.clone(),
                    path,
                })
                .collect(),
            None => Vec::new(),
        };
        Ok(entries)
    }

    async fn fetch_tags(&self) -> Result<Vec<Tag>, CatalogError> {
        Ok(self.snapshot.read().await.tags.clone())
    }

    #[instrument(skip(self))]
    async fn add_tag(&self, parent_id: TagId, name: &str) -> Result<Tag, CatalogError> {
        let name = name.trim();
        let canonical = canonical_name(name);
        if canonical.is_empty() {
            return Err(CatalogError::InvalidName(name.to_string()));
        }

        let mut snapshot = self.snapshot.write().await;
        if parent_id != ROOT_TAG_ID && snapshot.tag(parent_id).is_none() {
            return Err(CatalogError::InvalidParent(parent_id));
        }
        if snapshot.tag_by_canonical_name(&canonical).is_some() {
            return Err(CatalogError::Conflict(canonical));
        }

        let tag = Tag {
            id: snapshot.next_tag_id(),
            name: name.to_string(),
            canonical_name: canonical,
            parent_id,
        };
        let mut candidate = snapshot.clone();
        candidate.tags.push(tag.clone());
        self.commit(&mut snapshot, candidate)?;
        tracing::info!(tag_id = tag.id, canonical_name = %tag.canonical_name, "tag created");
        Ok(tag)
    }

    #[instrument(skip(self))]
    async fn set_parent(
        &self,
        tag_id: TagId,
        parent_id: Option<TagId>,
    ) -> Result<Tag, CatalogError> {
        let parent_id = parent_id.unwrap_or(ROOT_TAG_ID);
        let mut snapshot = self.snapshot.write().await;
        if parent_id != ROOT_TAG_ID {
            if snapshot.tag(parent_id).is_none() {
                return Err(CatalogError::InvalidParent(parent_id));
            }
            if is_within(&snapshot, parent_id, tag_id) {
                return Err(CatalogError::CyclicParent {
                    tag: tag_id,
                    parent: parent_id,
                });
            }
        }

        let mut candidate = snapshot.clone();
        let tag = candidate
            .tags
            .iter_mut()
            .find(|tag| tag.id == tag_id)
            .ok_or(CatalogError::UnknownTag(tag_id))?;
        tag.parent_id = parent_id;
        let moved = tag.clone();
        // entities carry copies of their tags
        for entity in &mut candidate.entities {
            for tag in entity.tags.iter_mut().filter(|tag| tag.id == tag_id) {
                tag.parent_id = parent_id;
            }
        }

        self.commit(&mut snapshot, candidate)?;
        tracing::info!(parent_id, "tag moved");
        Ok(moved)
    }

    async fn fetch_entities(
        &self,
        query: Option<&[String]>,
    ) -> Result<Vec<EntitySummary>, CatalogError> {
        let snapshot = self.snapshot.read().await;
        let entities = match query {
            Some(tokens) => SearchService::execute(&snapshot, &SearchQuery::new(tokens)),
            None => SearchService::newest_first(&snapshot),
        };
        Ok(entities.into_iter().map(Entity::summary).collect())
    }

    async fn fetch_entity(&self, id: EntityId) -> Result<Entity, CatalogError> {
        self.snapshot
            .read()
            .await
            .entity(id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("entity {id}")))
    }

    #[instrument(skip(self, entity), fields(entity_id = entity.id))]
    async fn save_entity(&self, entity: &Entity) -> Result<Entity, CatalogError> {
        let mut snapshot = self.snapshot.write().await;

        let mut tags: Vec<Tag> = Vec::with_capacity(entity.tags.len());
        for requested in &entity.tags {
            let stored = snapshot
                .tag(requested.id)
                .cloned()
                .ok_or(CatalogError::UnknownTag(requested.id))?;
            if !tags.iter().any(|tag| tag.id == stored.id) {
                tags.push(stored);
            }
        }

        let mut candidate = snapshot.clone();
        let stored = candidate
            .entity_mut(entity.id)
            .ok_or_else(|| CatalogError::NotFound(format!("entity {}", entity.id)))?;
        let added = tags
            .iter()
            .filter(|tag| !stored.tags.iter().any(|current| current.id == tag.id))
            .count();
        let removed = stored
            .tags
            .iter()
            .filter(|current| !tags.iter().any(|tag| tag.id == current.id))
            .count();
        stored.tags = tags;
        let saved = stored.clone();

        self.commit(&mut snapshot, candidate)?;
        tracing::info!(added, removed, "entity tags updated");
        Ok(saved)
    }

    #[instrument(skip(self))]
    async fn delete_entity(&self, id: EntityId) -> Result<(), CatalogError> {
        let mut snapshot = self.snapshot.write().await;
        if snapshot.entity(id).is_none() {
            return Err(CatalogError::NotFound(format!("entity {id}")));
        }
        let mut candidate = snapshot.clone();
        candidate.entities.retain(|entity| entity.id != id);
        self.commit(&mut snapshot, candidate)?;
        tracing::info!("entity deleted");
        Ok(())
    }
}

/// Whether `id` is `ancestor` or one of its descendants, following parent links.
fn is_within(snapshot: &CatalogSnapshot, id: TagId, ancestor: TagId) -> bool {
    let mut seen = HashSet::new();
    let mut current = id;
    while current != ROOT_TAG_ID && seen.insert(current) {
        if current == ancestor {
            return true;
        }
        match snapshot.tag(current) {
            Some(tag) => current = tag.parent_id,
            None => return false,
        }
    }
    false
}
