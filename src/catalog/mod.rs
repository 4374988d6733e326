use chrono::{DateTime, Utc};
use deunicode::deunicode;
use serde::{Deserialize, Serialize};

mod client;
mod store;

pub use client::{CatalogApi, CatalogError, LocalCatalog};
pub use store::{CatalogSnapshot, CatalogStore, read_seed};

pub type TagId = u32;
pub type EntityId = u32;

/// Parent id of tags that sit at the top of the hierarchy.
pub const ROOT_TAG_ID: TagId = 0;

/// A catalog tag. `canonical_name` is the stable identifier used for matching and URLs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    pub canonical_name: String,
    #[serde(default)]
    pub parent_id: TagId,
}

impl Tag {
    pub fn is_root(&self) -> bool {
        self.parent_id == ROOT_TAG_ID
    }
}

impl AsRef<Tag> for Tag {
    fn as_ref(&self) -> &Tag {
        self
    }
}

/// Tag plus its display-name path from the root of the hierarchy down to itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AutocompleteTag {
    pub tag: Tag,
    pub path: Vec<String>,
}

impl AutocompleteTag {
    /// Label shown in suggestion lists, e.g. `Animals/Cats`.
    pub fn label(&self) -> String {
        self.path.join("/")
    }
}

impl AsRef<Tag> for AutocompleteTag {
    fn as_ref(&self) -> &Tag {
        &self.tag
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    Image,
    Video,
}

/// Capture location of a media item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place: Option<String>,
}

/// Full media record, including its tag associations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: EntityId,
    pub media_type: MediaType,
    pub path: String,
    pub thumbnail_path: String,
    pub preview_path: String,
    pub uploaded: DateTime<Utc>,
    pub created: Option<DateTime<Utc>>,
    pub location: Option<Coordinates>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Entity {
    pub fn has_tag(&self, canonical_name: &str) -> bool {
        self.tags
            .iter()
            .any(|tag| tag.canonical_name == canonical_name)
    }

    pub fn summary(&self) -> EntitySummary {
        EntitySummary {
            id: self.id,
            thumbnail_path: self.thumbnail_path.clone(),
            media_type: self.media_type,
        }
    }
}

/// List form of an entity as returned by media searches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EntitySummary {
    pub id: EntityId,
    pub thumbnail_path: String,
    pub media_type: MediaType,
}

/// Derive the canonical identifier for a display name.
///
/// The name is transliterated to ASCII, whitespace runs become a single `-`
/// and the result is lowercased, so `"Åre Ski Trip"` becomes
/// `"are-ski-trip"` and `"Łódź"` becomes `"lodz"`.
pub fn canonical_name(name: &str) -> String {
    deunicode(name)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}
