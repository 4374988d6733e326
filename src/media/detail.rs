//! Entity detail view with stale-response protection.
//!
//! Navigating to an adjacent entity while the previous fetch is still in
//! flight must not let the late response overwrite the newer one. Each
//! navigation hands out a [`LoadTicket`]; a response is applied only while
//! its ticket is still the current one.

use crate::catalog::{CatalogApi, CatalogError, Entity, EntityId};

/// Chevron direction of the previous/next controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

impl Direction {
    /// Parse a direction name.
    ///
    /// # Panics
    ///
    /// On anything other than `prev`, `left`, `next` or `right`. Directions
    /// come from code, never from user input, so an unknown value is a bug.
    pub fn parse(value: &str) -> Self {
        match value {
            "prev" | "left" => Self::Previous,
            "next" | "right" => Self::Next,
            other => panic!("unknown chevron direction '{other}'"),
        }
    }

    pub fn glyph(self) -> char {
        match self {
            Self::Previous => '‹',
            Self::Next => '›',
        }
    }
}

/// Neighbour of `current` in `ids`. No wrap-around at either end.
pub fn adjacent(ids: &[EntityId], current: EntityId, direction: Direction) -> Option<EntityId> {
    let position = ids.iter().position(|id| *id == current)?;
    let target = match direction {
        Direction::Previous => position.checked_sub(1)?,
        Direction::Next => position + 1,
    };
    ids.get(target).copied()
}

/// Handle for one in-flight entity fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    entity_id: EntityId,
    generation: u64,
}

impl LoadTicket {
    pub fn entity_id(&self) -> EntityId {
        self.entity_id
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DetailState {
    #[default]
    Idle,
    Loading(EntityId),
    Ready(Entity),
    /// Fetch failed; recoverable by navigating again.
    Failed { entity_id: EntityId, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Applied,
    Discarded,
}

#[derive(Debug)]
pub struct DetailView {
    current: Option<EntityId>,
    generation: u64,
    state: DetailState,
    mounted: bool,
}

impl DetailView {
    pub fn new() -> Self {
        Self {
            current: None,
            generation: 0,
            state: DetailState::Idle,
            mounted: true,
        }
    }

    pub fn current(&self) -> Option<EntityId> {
        self.current
    }

    pub fn state(&self) -> &DetailState {
        &self.state
    }

    pub fn entity(&self) -> Option<&Entity> {
        match &self.state {
            DetailState::Ready(entity) => Some(entity),
            _ => None,
        }
    }

    /// Show `id` and start loading it. Any earlier ticket becomes stale.
    pub fn navigate(&mut self, id: EntityId) -> LoadTicket {
        self.generation += 1;
        self.current = Some(id);
        self.state = DetailState::Loading(id);
        LoadTicket {
            entity_id: id,
            generation: self.generation,
        }
    }

    /// Apply a fetch result if its ticket is still current.
    pub fn resolve(
        &mut self,
        ticket: LoadTicket,
        result: Result<Entity, CatalogError>,
    ) -> Resolution {
        if !self.mounted
            || ticket.generation != self.generation
            || self.current != Some(ticket.entity_id)
        {
            tracing::debug!(
                entity_id = ticket.entity_id,
                current = ?self.current,
                "discarding stale entity response"
            );
            return Resolution::Discarded;
        }

        self.state = match result {
            Ok(entity) => DetailState::Ready(entity),
            Err(err) => {
                tracing::warn!(entity_id = ticket.entity_id, error = %err, "entity load failed");
                DetailState::Failed {
                    entity_id: ticket.entity_id,
                    message: err.to_string(),
                }
            }
        };
        Resolution::Applied
    }

    /// Navigate to `id` and load it from `catalog`.
    pub async fn load<C>(&mut self, catalog: &C, id: EntityId) -> Resolution
    where
        C: CatalogApi + ?Sized,
    {
        let ticket = self.navigate(id);
        let result = catalog.fetch_entity(id).await;
        self.resolve(ticket, result)
    }

    /// Step to the neighbour of the current entity in `ids`, if any.
    pub fn step(&mut self, ids: &[EntityId], direction: Direction) -> Option<LoadTicket> {
        let target = adjacent(ids, self.current?, direction)?;
        Some(self.navigate(target))
    }

    /// Later responses are ignored once unmounted.
    pub fn unmount(&mut self) {
        self.mounted = false;
    }
}

impl Default for DetailView {
    fn default() -> Self {
        Self::new()
    }
}
