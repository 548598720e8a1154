use super::ResourceView;
use crate::resource::Resource;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Roots of an assembled hierarchy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Forest {
    pub roots: Vec<ResourceView>,
}

impl Forest {
    /// Total nodes across every tree
    pub fn node_count(&self) -> usize {
        self.roots.iter().map(ResourceView::node_count).sum()
    }

    pub fn find(&self, id: &str) -> Option<&ResourceView> {
        self.roots.iter().find_map(|root| root.find(id))
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn into_roots(self) -> Vec<ResourceView> {
        self.roots
    }
}

/// Link resources into a forest using arbitrary keys
///
/// The first resource carrying a key owns it. A resource whose parent key is
/// missing, unknown or its own key becomes a root. Resources caught in a
/// parent cycle are unreachable from any root; once the regular roots are
/// placed, each remaining cycle is broken at the member first reached by
/// walking up from the earliest unplaced resource, and that member becomes a
/// root carrying the rest of the cycle and its descendants. Every input
/// resource appears exactly once in the result.
///
/// Linking uses an explicit stack, so arbitrarily deep parent chains are safe.
pub fn assemble<K, P>(resources: &[Resource], key_of: K, parent_key_of: P) -> Forest
where
    K: Fn(&Resource) -> &str,
    P: Fn(&Resource) -> Option<&str>,
{
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(resources.len());
    for (pos, resource) in resources.iter().enumerate() {
        index.entry(key_of(resource)).or_insert(pos);
    }

    let mut parents: Vec<Option<usize>> = vec![None; resources.len()];
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); resources.len()];
    for (pos, resource) in resources.iter().enumerate() {
        let parent = parent_key_of(resource).and_then(|key| index.get(key).copied());
        if let Some(parent) = parent.filter(|&parent| parent != pos) {
            parents[pos] = Some(parent);
            children[parent].push(pos);
        }
    }

    let mut linker = Linker {
        resources,
        parent_key_of: &parent_key_of,
        children: &children,
        placed: vec![false; resources.len()],
    };

    let mut roots = Vec::new();
    for (pos, parent) in parents.iter().enumerate() {
        if parent.is_none() {
            linker.place(pos, &mut roots);
        }
    }
    for pos in 0..resources.len() {
        if !linker.placed[pos] {
            let entry = cycle_entry(&parents, pos);
            linker.place(entry, &mut roots);
        }
    }

    Forest { roots }
}

/// Forest keyed by resource id, linked through `parent_id`
pub fn assemble_by_id(resources: &[Resource]) -> Forest {
    assemble(resources, |r| r.id.as_str(), |r| r.parent_id.as_deref())
}

/// Forest keyed by resource name, linked through the first value of the
/// `parent_attribute` attribute
pub fn assemble_by_name(resources: &[Resource], parent_attribute: &str) -> Forest {
    assemble(
        resources,
        |r| r.name.as_str(),
        |r| r.single_attribute(parent_attribute),
    )
}

/// First node revisited while walking up from `pos`
///
/// Only called for unplaced nodes, whose ancestry never reaches a root and so
/// must loop.
fn cycle_entry(parents: &[Option<usize>], pos: usize) -> usize {
    let mut seen = HashSet::new();
    let mut current = pos;
    while seen.insert(current) {
        match parents[current] {
            Some(parent) => current = parent,
            None => break,
        }
    }
    current
}

struct Linker<'a, P> {
    resources: &'a [Resource],
    parent_key_of: &'a P,
    children: &'a [Vec<usize>],
    placed: Vec<bool>,
}

impl<P> Linker<'_, P>
where
    P: Fn(&Resource) -> Option<&str>,
{
    /// Build the subtree under `start` and push it onto `roots`
    fn place(&mut self, start: usize, roots: &mut Vec<ResourceView>) {
        // Preorder walk; links[slot] is the slot of the tree parent
        let mut order = Vec::new();
        let mut links: Vec<Option<usize>> = Vec::new();
        let mut stack = vec![(start, None)];
        self.placed[start] = true;

        while let Some((pos, link)) = stack.pop() {
            let slot = order.len();
            order.push(pos);
            links.push(link);
            for &child in self.children[pos].iter().rev() {
                if !self.placed[child] {
                    self.placed[child] = true;
                    stack.push((child, Some(slot)));
                }
            }
        }

        let mut views: Vec<ResourceView> = order
            .iter()
            .map(|&pos| {
                let resource = &self.resources[pos];
                ResourceView::new(resource, (self.parent_key_of)(resource))
            })
            .collect();

        // Every child sits at a higher slot than its parent, so popping from
        // the back completes each node before it is attached.
        while let Some(mut view) = views.pop() {
            view.children.reverse();
            match links[views.len()] {
                Some(parent) => views[parent].children.push(view),
                None => roots.push(view),
            }
        }
    }
}
