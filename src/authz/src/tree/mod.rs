//! Resource hierarchy reconstruction
//!
//! [`assemble`] rebuilds parent links from a flat resource list in two passes:
//! the complete key index is built first, and only then is every resource
//! attached to its parent. Linking during the indexing pass would make a
//! resource that precedes its parent in the input look like a root.
//!
//! [`sort_forest`] then orders every level by sort index.
//!
//! Assembly, sorting, counting, lookup and drop walk the tree with explicit
//! stacks. Serialization and `Clone` still recurse once per level.

mod assemble;
mod sort;


pub use assemble::{assemble, assemble_by_id, assemble_by_name, Forest};
pub use sort::sort_forest;

use crate::resource::Resource;
use serde::Serialize;

/// Resolved resource with its visible children
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceView {
    pub id: String,

    pub name: String,

    /// Parent key the node was linked by
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission: Option<String>,

    pub children: Vec<ResourceView>,
}

impl ResourceView {
    /// Childless view of a resource with an explicit parent key
    pub fn new(resource: &Resource, parent_key: Option<&str>) -> Self {
        Self {
            id: resource.id.clone(),
            name: resource.name.clone(),
            parent_id: parent_key.map(str::to_string),
            sort: resource.sort,
            permission: resource.permission.clone(),
            children: Vec::new(),
        }
    }

    /// Number of nodes in this subtree, itself included
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }

    /// Depth-first search by id
    pub fn find(&self, id: &str) -> Option<&ResourceView> {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.id == id {
                return Some(node);
            }
            stack.extend(node.children.iter().rev());
        }
        None
    }
}

impl Drop for ResourceView {
    fn drop(&mut self) {
        // Flatten before dropping so deep chains do not recurse
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}
