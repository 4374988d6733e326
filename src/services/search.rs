use std::{
    cmp::Ordering,
    collections::{HashMap, HashSet},
};

use crate::catalog::{CatalogSnapshot, Entity, TagId, canonical_name};

/// Normalized tag query: canonical names an entity must match, all of them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchQuery {
    required_tags: Vec<String>,
}

impl SearchQuery {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut required_tags: Vec<String> = Vec::new();
        for token in tokens {
            if let Some(token) = normalize_token(token.as_ref())
                && !required_tags.contains(&token)
            {
                required_tags.push(token);
            }
        }
        Self { required_tags }
    }

    pub fn required_tags(&self) -> &[String] {
        &self.required_tags
    }

    pub fn is_empty(&self) -> bool {
        self.required_tags.is_empty()
    }
}

pub struct SearchService;

impl SearchService {
    /// Entities matching every required tag, where a tag also matches through
    /// any of its descendants. Ordered by capture time, unknown last, then id.
    ///
    /// An empty query lists everything newest first.
    pub fn execute<'a>(snapshot: &'a CatalogSnapshot, query: &SearchQuery) -> Vec<&'a Entity> {
        if query.is_empty() {
            return Self::newest_first(snapshot);
        }

        let children = child_index(snapshot);
        let mut required: Vec<HashSet<TagId>> = Vec::with_capacity(query.required_tags().len());
        for name in query.required_tags() {
            let Some(tag) = snapshot.tag_by_canonical_name(name) else {
                tracing::debug!(tag = %name, "unknown tag in query");
                return Vec::new();
            };
            required.push(descendants(&children, tag.id));
        }

        let mut matched: Vec<&Entity> = snapshot
            .entities
            .iter()
            .filter(|entity| {
                required.iter().all(|accepted| {
                    entity.tags.iter().any(|tag| accepted.contains(&tag.id))
                })
            })
            .collect();
        matched.sort_by(|a, b| {
            let by_created = match (a.created, b.created) {
                (Some(a), Some(b)) => a.cmp(&b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            by_created.then(a.id.cmp(&b.id))
        });
        matched
    }

    /// Every entity, highest id first.
    pub fn newest_first(snapshot: &CatalogSnapshot) -> Vec<&Entity> {
        let mut entities: Vec<&Entity> = snapshot.entities.iter().collect();
        entities.sort_by(|a, b| b.id.cmp(&a.id));
        entities
    }
}

fn child_index(snapshot: &CatalogSnapshot) -> HashMap<TagId, Vec<TagId>> {
    let mut index: HashMap<TagId, Vec<TagId>> = HashMap::new();
    for tag in &snapshot.tags {
        index.entry(tag.parent_id).or_default().push(tag.id);
    }
    index
}

/// `root` and every tag below it. Parent cycles are visited once.
fn descendants(children: &HashMap<TagId, Vec<TagId>>, root: TagId) -> HashSet<TagId> {
    let mut seen = HashSet::from([root]);
    let mut pending = vec![root];
    while let Some(id) = pending.pop() {
        for child in children.get(&id).into_iter().flatten() {
            if seen.insert(*child) {
                pending.push(*child);
            }
        }
    }
    seen
}

fn normalize_token(token: &str) -> Option<String> {
    let normalized = canonical_name(token);
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}
