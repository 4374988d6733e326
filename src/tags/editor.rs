//! Per-entity tag panel: attach, create and detach tags on one media item.

use thiserror::Error;
use tracing::instrument;

use crate::{
    catalog::{AutocompleteTag, CatalogApi, CatalogError, Entity, ROOT_TAG_ID, Tag, TagId},
    search::{Autocomplete, CommitMode, InputEvent, OptionsState, Outcome},
};

/// User-visible reasons a new tag is refused. Nothing is mutated when returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("a tag named '{0}' already exists")]
    Duplicate(String),
    #[error("tag name must not be empty")]
    EmptyName,
    /// Known tags could not be fetched, so duplicates cannot be ruled out.
    #[error("tag list unavailable, reload before creating tags")]
    TagsUnavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddTagOutcome {
    Added(Tag),
    Rejected(Rejection),
}

pub struct TagEditor<C> {
    catalog: C,
    known: Vec<AutocompleteTag>,
    picker: Autocomplete,
}

impl<C: CatalogApi> TagEditor<C> {
    /// Fetch the known tags once. A failed fetch leaves the picker in its
    /// unavailable state; attaching and removing tags still work, creating
    /// tags is refused until [`TagEditor::reload`] succeeds.
    pub async fn load(catalog: C) -> Self {
        let mut editor = Self {
            catalog,
            known: Vec::new(),
            picker: Autocomplete::new(CommitMode::Select),
        };
        editor.reload().await;
        editor
    }

    /// Refetch the known tags.
    pub async fn reload(&mut self) {
        match self.catalog.fetch_autocomplete_tags().await {
            Ok(known) => {
                self.known = known.clone();
                self.handle(InputEvent::OptionsLoaded(known));
            }
            Err(err) => {
                tracing::warn!(error = %err, "tag list unavailable");
                self.known.clear();
                self.handle(InputEvent::OptionsFailed(err.to_string()));
            }
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn known_tags(&self) -> impl Iterator<Item = &Tag> {
        self.known.iter().map(|entry| &entry.tag)
    }

    pub fn picker(&self) -> &Autocomplete {
        &self.picker
    }

    /// Forward an input event to the inline tag picker.
    pub fn handle(&mut self, event: InputEvent) -> Outcome {
        let (picker, outcome) = std::mem::take(&mut self.picker).update(event);
        self.picker = picker;
        outcome
    }

    /// Case-sensitive duplicate check against every known display and canonical name.
    pub fn check_name(&self, name: &str) -> Result<(), Rejection> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Rejection::EmptyName);
        }
        if !matches!(self.picker.options(), OptionsState::Ready(_)) {
            return Err(Rejection::TagsUnavailable);
        }
        if self
            .known_tags()
            .any(|tag| tag.name == name || tag.canonical_name == name)
        {
            return Err(Rejection::Duplicate(name.to_string()));
        }
        Ok(())
    }

    /// Create a tag under `parent_id` and add it to the known tags.
    #[instrument(skip(self))]
    pub async fn create_tag(
        &mut self,
        name: &str,
        parent_id: TagId,
    ) -> Result<AddTagOutcome, CatalogError> {
        if let Err(rejection) = self.check_name(name) {
            tracing::debug!(%rejection, "tag creation rejected");
            return Ok(AddTagOutcome::Rejected(rejection));
        }

        let tag = self.catalog.add_tag(parent_id, name.trim()).await?;
        let entry = AutocompleteTag {
            path: self.path_below(parent_id, &tag.name),
            tag: tag.clone(),
        };
        self.known.push(entry.clone());
        self.handle(InputEvent::OptionAppended(entry));
        Ok(AddTagOutcome::Added(tag))
    }

    /// Create a tag and attach it to `entity`, then persist the entity.
    ///
    /// The local entity is updated before the save; a failed save is
    /// returned as an error and the local change is kept.
    pub async fn add_tag(
        &mut self,
        entity: &mut Entity,
        name: &str,
        parent_id: TagId,
    ) -> Result<AddTagOutcome, CatalogError> {
        let outcome = self.create_tag(name, parent_id).await?;
        if let AddTagOutcome::Added(tag) = &outcome {
            entity.tags.push(tag.clone());
            *entity = self.catalog.save_entity(entity).await?;
        }
        Ok(outcome)
    }

    /// Attach an existing tag. Returns false if it was already attached.
    pub async fn attach_tag(&self, entity: &mut Entity, tag: Tag) -> Result<bool, CatalogError> {
        if entity.has_tag(&tag.canonical_name) {
            return Ok(false);
        }
        entity.tags.push(tag);
        *entity = self.catalog.save_entity(entity).await?;
        Ok(true)
    }

    /// Detach every tag with `canonical_name` and persist. Returns whether anything was removed.
    pub async fn remove_tag(
        &self,
        entity: &mut Entity,
        canonical_name: &str,
    ) -> Result<bool, CatalogError> {
        let before = entity.tags.len();
        entity.tags.retain(|tag| tag.canonical_name != canonical_name);
        let removed = entity.tags.len() != before;
        *entity = self.catalog.save_entity(entity).await?;
        Ok(removed)
    }

    fn path_below(&self, parent_id: TagId, name: &str) -> Vec<String> {
        let mut path = if parent_id == ROOT_TAG_ID {
            Vec::new()
        } else {
            self.known
                .iter()
                .find(|entry| entry.tag.id == parent_id)
                .map(|entry| entry.path.clone())
                .unwrap_or_default()
        };
        path.push(name.to_string());
        path
    }
}
