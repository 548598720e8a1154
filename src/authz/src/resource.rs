//! Protected resources and the resource store contract

use crate::error::Result;
use crate::types::{ResourceId, ResourceServerId, ScopeId};
use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Named capability that can be attached to resources and policies
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    pub id: ScopeId,
    pub name: String,
}

impl Scope {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Which collection fields the backing store loaded together with the resource
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedFields {
    #[serde(default)]
    pub uris: bool,
    #[serde(default)]
    pub scopes: bool,
    #[serde(default)]
    pub attributes: bool,
    #[serde(default)]
    pub sub_resources: bool,
}

impl FetchedFields {
    /// Every collection field was loaded
    pub fn all() -> Self {
        Self {
            uris: true,
            scopes: true,
            attributes: true,
            sub_resources: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Protected object with an optional parent and explicit display order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_uri: Option<String>,

    #[serde(default)]
    pub owner_managed_access: bool,

    pub resource_server_id: ResourceServerId,

    /// Parent resource id; may dangle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ResourceId>,

    /// Display order among siblings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<i32>,

    /// Permission name carried by the resource
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission: Option<String>,

    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub uris: Vec<String>,

    #[serde(default)]
    pub scopes: Vec<Scope>,

    #[serde(default)]
    pub attributes: HashMap<String, Vec<String>>,

    #[serde(default)]
    pub sub_resources: Vec<ResourceId>,

    #[serde(default)]
    pub fetched: FetchedFields,
}

impl Resource {
    /// Create an enabled resource with no parent, order or collections
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        resource_server_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            display_name: None,
            resource_type: None,
            owner: None,
            icon_uri: None,
            owner_managed_access: false,
            resource_server_id: resource_server_id.into(),
            parent_id: None,
            sort: None,
            permission: None,
            enabled: true,
            uris: Vec::new(),
            scopes: Vec::new(),
            attributes: HashMap::new(),
            sub_resources: Vec::new(),
            fetched: FetchedFields::default(),
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_sort(mut self, sort: i32) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permission = Some(permission.into());
        self
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scopes.push(scope);
        self
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uris.push(uri.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, values: Vec<String>) -> Self {
        self.attributes.insert(key.into(), values);
        self
    }

    pub fn with_sub_resource(mut self, id: impl Into<String>) -> Self {
        self.sub_resources.push(id.into());
        self
    }

    pub fn with_fetched(mut self, fetched: FetchedFields) -> Self {
        self.fetched = fetched;
        self
    }

    /// Ids of the attached scopes
    pub fn scope_ids(&self) -> impl Iterator<Item = &str> {
        self.scopes.iter().map(|s| s.id.as_str())
    }

    /// First value of a multi-valued attribute
    pub fn single_attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }
}

/// Resource store contract
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Get a resource by id
    async fn find_by_id(&self, id: &str, server_id: &str) -> Result<Option<Resource>>;

    /// Get a resource by its unique name
    async fn find_by_name(&self, name: &str, server_id: &str) -> Result<Option<Resource>>;

    /// Resources carrying at least one of the given scopes
    async fn find_by_scope(&self, scope_ids: &[ScopeId], server_id: &str) -> Result<Vec<Resource>>;

    /// Resources carrying the given permission name
    async fn find_resource_id_by_permission(
        &self,
        server_id: &str,
        permission: &str,
    ) -> Result<Vec<Resource>>;
}

/// In-memory resource store implementation
///
/// Reads are synchronous under the hood, so [`InMemoryResourceStore::get`]
/// can back a snapshot refresh callable directly.
#[derive(Clone, Default)]
pub struct InMemoryResourceStore {
    resources: Arc<RwLock<HashMap<ResourceServerId, IndexMap<ResourceId, Resource>>>>,
}

impl InMemoryResourceStore {
    /// Create a new in-memory resource store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a resource, keeping its original position on replace
    pub fn put(&self, resource: Resource) {
        let mut resources = self.resources.write();
        resources
            .entry(resource.resource_server_id.clone())
            .or_default()
            .insert(resource.id.clone(), resource);
    }

    /// Remove a resource
    pub fn remove(&self, server_id: &str, id: &str) -> Option<Resource> {
        let mut resources = self.resources.write();
        resources
            .get_mut(server_id)
            .and_then(|server| server.shift_remove(id))
    }

    /// Synchronous lookup by id
    pub fn get(&self, server_id: &str, id: &str) -> Option<Resource> {
        let resources = self.resources.read();
        resources.get(server_id).and_then(|server| server.get(id)).cloned()
    }

    /// Number of resources held for a server
    pub fn count(&self, server_id: &str) -> usize {
        self.resources.read().get(server_id).map_or(0, IndexMap::len)
    }

    fn filter<F>(&self, server_id: &str, predicate: F) -> Vec<Resource>
    where
        F: Fn(&Resource) -> bool,
    {
        let resources = self.resources.read();
        resources
            .get(server_id)
            .map(|server| server.values().filter(|r| predicate(r)).cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ResourceStore for InMemoryResourceStore {
    async fn find_by_id(&self, id: &str, server_id: &str) -> Result<Option<Resource>> {
        Ok(self.get(server_id, id))
    }

    async fn find_by_name(&self, name: &str, server_id: &str) -> Result<Option<Resource>> {
        Ok(self.filter(server_id, |r| r.name == name).into_iter().next())
    }

    async fn find_by_scope(&self, scope_ids: &[ScopeId], server_id: &str) -> Result<Vec<Resource>> {
        if scope_ids.is_empty() {
            return Ok(Vec::new());
        }
        let wanted: HashSet<&str> = scope_ids.iter().map(String::as_str).collect();
        Ok(self.filter(server_id, |r| r.scope_ids().any(|id| wanted.contains(id))))
    }

    async fn find_resource_id_by_permission(
        &self,
        server_id: &str,
        permission: &str,
    ) -> Result<Vec<Resource>> {
        Ok(self.filter(server_id, |r| r.permission.as_deref() == Some(permission)))
    }
}
