use std::collections::HashMap;

use crate::catalog::{ROOT_TAG_ID, Tag, TagId};

/// Nesting deeper than this is not expanded.
pub const MAX_TREE_DEPTH: usize = 64;

pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagNode {
    pub tag: Tag,
    children: Vec<NodeId>,
}

impl TagNode {
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Tag hierarchy stored as an arena; `roots` are the children of the requested parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagForest {
    nodes: Vec<TagNode>,
    roots: Vec<NodeId>,
}

impl TagForest {
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> &TagNode {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Display names of the given nodes, in order.
    pub fn names(&self, ids: &[NodeId]) -> Vec<&str> {
        ids.iter()
            .map(|id| self.nodes[*id].tag.name.as_str())
            .collect()
    }

    /// Every node in depth-first order with its display-name path from the forest roots.
    pub fn paths(&self) -> Vec<(NodeId, Vec<String>)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut path = Vec::new();
        for root in &self.roots {
            self.collect_paths(*root, &mut path, &mut out);
        }
        out
    }

    fn collect_paths(
        &self,
        id: NodeId,
        path: &mut Vec<String>,
        out: &mut Vec<(NodeId, Vec<String>)>,
    ) {
        let node = &self.nodes[id];
        path.push(node.tag.name.clone());
        out.push((id, path.clone()));
        for child in &node.children {
            self.collect_paths(*child, path, out);
        }
        path.pop();
    }
}

/// Build the subtree below `parent_id`, children sorted case-insensitively by display name.
///
/// Returns `None` when no tag has `parent_id` as its parent. A tag that would
/// appear as its own ancestor is skipped, so malformed parent cycles terminate.
pub fn build_subtree(catalog: &[Tag], parent_id: TagId) -> Option<TagForest> {
    let mut index: HashMap<TagId, Vec<usize>> = HashMap::new();
    for (position, tag) in catalog.iter().enumerate() {
        index.entry(tag.parent_id).or_default().push(position);
    }
    for children in index.values_mut() {
        children.sort_by_cached_key(|position| {
            let tag = &catalog[*position];
            (tag.name.to_lowercase(), tag.canonical_name.clone())
        });
    }

    let mut builder = Builder {
        catalog,
        index: &index,
        nodes: Vec::new(),
        ancestors: Vec::new(),
    };
    if parent_id != ROOT_TAG_ID {
        builder.ancestors.push(parent_id);
    }
    let roots = builder.attach_children(parent_id);
    if roots.is_empty() {
        return None;
    }

    Some(TagForest {
        nodes: builder.nodes,
        roots,
    })
}

struct Builder<'a> {
    catalog: &'a [Tag],
    index: &'a HashMap<TagId, Vec<usize>>,
    nodes: Vec<TagNode>,
    ancestors: Vec<TagId>,
}

impl Builder<'_> {
    fn attach_children(&mut self, parent_id: TagId) -> Vec<NodeId> {
        let (catalog, index) = (self.catalog, self.index);
        let Some(children) = index.get(&parent_id) else {
            return Vec::new();
        };

        let mut attached = Vec::with_capacity(children.len());
        for position in children {
            let tag = &catalog[*position];
            if self.ancestors.contains(&tag.id) {
                tracing::warn!(
                    tag_id = tag.id,
                    parent_id,
                    "tag parent cycle detected, subtree skipped"
                );
                continue;
            }
            if self.ancestors.len() >= MAX_TREE_DEPTH {
                tracing::warn!(tag_id = tag.id, "tag hierarchy too deep, subtree truncated");
                continue;
            }

            let id = self.nodes.len();
            self.nodes.push(TagNode {
                tag: tag.clone(),
                children: Vec::new(),
            });
            self.ancestors.push(tag.id);
            let grandchildren = self.attach_children(tag.id);
            self.ancestors.pop();
            self.nodes[id].children = grandchildren;
            attached.push(id);
        }
        attached
    }
}
