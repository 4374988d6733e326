use std::sync::Arc;

use chrono::{TimeZone, Utc};
use imagedb::catalog::{
    CatalogSnapshot, CatalogStore, Entity, EntityId, LocalCatalog, MediaType, Tag, TagId,
    canonical_name,
};
use tempfile::TempDir;
use tokio::sync::RwLock;

pub fn tag(id: TagId, parent_id: TagId, name: &str) -> Tag {
    Tag {
        id,
        name: name.into(),
        canonical_name: canonical_name(name),
        parent_id,
    }
}

pub fn entity(id: EntityId, year: i32, tags: Vec<Tag>) -> Entity {
    Entity {
        id,
        media_type: MediaType::Image,
        path: format!("media/{id}.jpg"),
        thumbnail_path: format!("thumbnails/{id}.jpg"),
        preview_path: format!("previews/{id}.jpg"),
        uploaded: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
        created: Some(Utc.with_ymd_and_hms(year, 6, 1, 12, 0, 0).unwrap()),
        location: None,
        tags,
    }
}

pub fn snapshot() -> CatalogSnapshot {
    let animals = tag(1, 0, "Animals");
    let cats = tag(2, 1, "Cats");
    let dogs = tag(3, 1, "Dogs");
    let outdoors = tag(4, 0, "Outdoors");

    CatalogSnapshot::new(
        vec![animals, cats.clone(), dogs.clone(), outdoors.clone()],
        vec![
            entity(1, 2019, vec![cats.clone()]),
            entity(2, 2020, vec![cats, outdoors.clone()]),
            entity(3, 2021, vec![dogs, outdoors]),
        ],
    )
}

/// Catalog written through to a temporary data dir.
pub fn persisted_catalog() -> (LocalCatalog, Arc<CatalogStore>, TempDir) {
    let dir = TempDir::new().expect("temp data dir");
    let store = Arc::new(CatalogStore::new(dir.path()));
    let loaded = store
        .load_or_rebuild(|| Ok(snapshot()))
        .expect("initial catalog");
    let catalog = LocalCatalog::new(Arc::new(RwLock::new(loaded)), Some(store.clone()));
    (catalog, store, dir)
}
