//! Revision-stamped, read-only resource snapshot

use super::lazy::LazyField;
use crate::resource::Resource;
use crate::types::{ResourceId, ResourceServerId, ScopeId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Cache entry identified by id and stamped with the revision it reflects
pub trait Revisioned {
    fn id(&self) -> &str;
    fn revision(&self) -> u64;
}

/// Attribute map of a resource
pub type Attributes = HashMap<String, Vec<String>>;

fn uris_of(resource: &Resource) -> HashSet<String> {
    resource.uris.iter().cloned().collect()
}

fn scope_ids_of(resource: &Resource) -> HashSet<ScopeId> {
    resource.scope_ids().map(str::to_string).collect()
}

fn attributes_of(resource: &Resource) -> Attributes {
    resource.attributes.clone()
}

fn sub_resources_of(resource: &Resource) -> HashSet<ResourceId> {
    resource.sub_resources.iter().cloned().collect()
}

/// Builds a collection field: captured now when the store already loaded it,
/// otherwise derived on first read
fn field<V>(
    fetched: bool,
    resource: &Resource,
    derive: fn(&Resource) -> V,
    default: fn() -> V,
) -> LazyField<Resource, V> {
    if fetched {
        LazyField::eager(derive(resource))
    } else {
        LazyField::deferred(derive, default)
    }
}

/// Immutable copy of a resource at one revision
///
/// Scalar fields are copied at construction. The four collection fields are
/// read through a refresh callable returning the current live resource; it is
/// only invoked the first time a deferred field is read.
#[derive(Debug)]
pub struct CachedResource {
    revision: u64,
    id: ResourceId,
    name: String,
    display_name: Option<String>,
    resource_type: Option<String>,
    owner: Option<String>,
    icon_uri: Option<String>,
    owner_managed_access: bool,
    resource_server_id: ResourceServerId,
    parent_id: Option<ResourceId>,
    sort: Option<i32>,
    permission: Option<String>,
    enabled: bool,
    uris: LazyField<Resource, HashSet<String>>,
    scope_ids: LazyField<Resource, HashSet<ScopeId>>,
    attributes: LazyField<Resource, Attributes>,
    sub_resources: LazyField<Resource, HashSet<ResourceId>>,
}

impl CachedResource {
    pub fn new(revision: u64, resource: &Resource) -> Self {
        let fetched = resource.fetched;

        Self {
            revision,
            id: resource.id.clone(),
            name: resource.name.clone(),
            display_name: resource.display_name.clone(),
            resource_type: resource.resource_type.clone(),
            owner: resource.owner.clone(),
            icon_uri: resource.icon_uri.clone(),
            owner_managed_access: resource.owner_managed_access,
            resource_server_id: resource.resource_server_id.clone(),
            parent_id: resource.parent_id.clone(),
            sort: resource.sort,
            permission: resource.permission.clone(),
            enabled: resource.enabled,
            uris: field(fetched.uris, resource, uris_of, HashSet::new),
            scope_ids: field(fetched.scopes, resource, scope_ids_of, HashSet::new),
            attributes: field(fetched.attributes, resource, attributes_of, HashMap::new),
            sub_resources: field(fetched.sub_resources, resource, sub_resources_of, HashSet::new),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn resource_type(&self) -> Option<&str> {
        self.resource_type.as_deref()
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn icon_uri(&self) -> Option<&str> {
        self.icon_uri.as_deref()
    }

    pub fn is_owner_managed_access(&self) -> bool {
        self.owner_managed_access
    }

    pub fn resource_server_id(&self) -> &str {
        &self.resource_server_id
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    pub fn sort(&self) -> Option<i32> {
        self.sort
    }

    pub fn permission(&self) -> Option<&str> {
        self.permission.as_deref()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn uris<F>(&self, refresh: F) -> Arc<HashSet<String>>
    where
        F: FnOnce() -> Option<Resource>,
    {
        self.uris.get(refresh)
    }

    pub fn scope_ids<F>(&self, refresh: F) -> Arc<HashSet<ScopeId>>
    where
        F: FnOnce() -> Option<Resource>,
    {
        self.scope_ids.get(refresh)
    }

    pub fn attributes<F>(&self, refresh: F) -> Arc<Attributes>
    where
        F: FnOnce() -> Option<Resource>,
    {
        self.attributes.get(refresh)
    }

    pub fn sub_resources<F>(&self, refresh: F) -> Arc<HashSet<ResourceId>>
    where
        F: FnOnce() -> Option<Resource>,
    {
        self.sub_resources.get(refresh)
    }
}

impl Revisioned for CachedResource {
    fn id(&self) -> &str {
        &self.id
    }

    fn revision(&self) -> u64 {
        self.revision
    }
}
