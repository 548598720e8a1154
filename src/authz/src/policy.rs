//! Policy definition and storage

use crate::error::Result;
use crate::resource::Resource;
use crate::roles::ROLES_CONFIG_KEY;
use crate::types::{PolicyId, ResourceServerId, ScopeId};
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Policy category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyCategory {
    /// Permission attaching resources directly
    Resource,
    /// Permission attaching scopes
    Scope,
    /// Role list condition
    Role,
    /// Composition of other policies
    Aggregate,
    /// Any other policy type (time, js, client, ...)
    #[serde(other)]
    Other,
}

impl PolicyCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyCategory::Resource => "resource",
            PolicyCategory::Scope => "scope",
            PolicyCategory::Role => "role",
            PolicyCategory::Aggregate => "aggregate",
            PolicyCategory::Other => "other",
        }
    }
}

impl fmt::Display for PolicyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Policy definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    /// Unique policy identifier
    pub id: PolicyId,

    /// Policy name
    pub name: String,

    /// Policy category
    #[serde(rename = "type")]
    pub category: PolicyCategory,

    /// Owning resource server
    pub resource_server_id: ResourceServerId,

    /// Policies this one depends on
    #[serde(default)]
    pub associated_policies: Vec<PolicyId>,

    /// Raw configuration; structured values are JSON-encoded strings
    #[serde(default)]
    pub config: HashMap<String, String>,

    /// Resources attached to a resource permission
    #[serde(default)]
    pub resources: Vec<Resource>,

    /// Scopes attached to a scope permission
    #[serde(default)]
    pub scopes: Vec<ScopeId>,
}

impl Policy {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: PolicyCategory,
        resource_server_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            resource_server_id: resource_server_id.into(),
            associated_policies: Vec::new(),
            config: HashMap::new(),
            resources: Vec::new(),
            scopes: Vec::new(),
        }
    }

    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    /// Set the `roles` entry from plain role ids
    pub fn with_roles<I, S>(self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries: Vec<serde_json::Value> = roles
            .into_iter()
            .map(|id| serde_json::json!({ "id": id.into() }))
            .collect();
        self.with_config(ROLES_CONFIG_KEY, serde_json::Value::Array(entries).to_string())
    }

    pub fn with_associated(mut self, policy_id: impl Into<String>) -> Self {
        self.associated_policies.push(policy_id.into());
        self
    }

    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resources.push(resource);
        self
    }

    pub fn with_scope(mut self, scope_id: impl Into<String>) -> Self {
        self.scopes.push(scope_id.into());
        self
    }
}

/// Policy store contract
#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// Policies of one category attached to a resource server
    async fn find_by_type(
        &self,
        category: PolicyCategory,
        server_id: &str,
    ) -> Result<Vec<Policy>>;

    /// Get a policy by id
    async fn find_by_id(&self, id: &str, server_id: &str) -> Result<Option<Policy>>;
}

/// In-memory policy store implementation
pub struct InMemoryPolicyStore {
    policies: Arc<RwLock<HashMap<ResourceServerId, IndexMap<PolicyId, Policy>>>>,
}

impl InMemoryPolicyStore {
    /// Create a new in-memory policy store
    pub fn new() -> Self {
        Self {
            policies: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Store a policy
    pub async fn put(&self, policy: Policy) {
        let mut policies = self.policies.write().await;
        policies
            .entry(policy.resource_server_id.clone())
            .or_default()
            .insert(policy.id.clone(), policy);
    }

    /// Delete a policy
    pub async fn delete(&self, server_id: &str, id: &str) -> Option<Policy> {
        let mut policies = self.policies.write().await;
        policies
            .get_mut(server_id)
            .and_then(|server| server.shift_remove(id))
    }

    /// List every policy of a server in insertion order
    pub async fn list(&self, server_id: &str) -> Vec<Policy> {
        let policies = self.policies.read().await;
        policies
            .get(server_id)
            .map(|server| server.values().cloned().collect())
            .unwrap_or_default()
    }
}

impl Default for InMemoryPolicyStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PolicyStore for InMemoryPolicyStore {
    async fn find_by_type(
        &self,
        category: PolicyCategory,
        server_id: &str,
    ) -> Result<Vec<Policy>> {
        let policies = self.policies.read().await;
        Ok(policies
            .get(server_id)
            .map(|server| {
                server
                    .values()
                    .filter(|p| p.category == category)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn find_by_id(&self, id: &str, server_id: &str) -> Result<Option<Policy>> {
        let policies = self.policies.read().await;
        Ok(policies.get(server_id).and_then(|server| server.get(id)).cloned())
    }
}
