//! JSON dataset loading into the in-memory stores
//!
//! A dataset describes one or more resource servers end to end: resources,
//! policies, client role catalogs, composite roles, users and the clients the
//! caller may view. Policies reference their resources by id; structured
//! configuration values may be written as plain JSON and are re-encoded into
//! the string form policies carry.
//!
//! ```json
//! {
//!   "clients": [{ "id": "billing", "roles": ["A"] }],
//!   "users": [{ "id": "alice", "roles": ["A"] }],
//!   "resources": [{ "id": "r1", "name": "orders", "resource_server_id": "billing" }],
//!   "policies": [
//!     { "id": "p-role", "name": "Role A", "type": "role",
//!       "resource_server_id": "billing", "config": { "roles": [{ "id": "A" }] } },
//!     { "id": "p1", "name": "Orders", "type": "resource",
//!       "resource_server_id": "billing", "associated_policies": ["p-role"],
//!       "resources": ["r1"] }
//!   ]
//! }
//! ```

use crate::access::StaticClientAccess;
use crate::config::ResolverConfig;
use crate::error::{AuthzError, Result};
use crate::policy::{InMemoryPolicyStore, Policy, PolicyCategory};
use crate::resolver::ResourceResolver;
use crate::resource::{InMemoryResourceStore, Resource};
use crate::roles::{InMemoryRoleDirectory, RoleMappedUser};
use crate::types::{Client, PolicyId, ResourceId, ResourceServerId, RoleId, ScopeId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Serialized description of stores, clients and users
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub clients: Vec<DatasetClient>,

    #[serde(default)]
    pub users: Vec<DatasetUser>,

    #[serde(default)]
    pub resources: Vec<Resource>,

    #[serde(default)]
    pub policies: Vec<DatasetPolicy>,

    /// Composite role -> contained roles
    #[serde(default)]
    pub composites: HashMap<RoleId, Vec<RoleId>>,

    /// Clients the caller may view; every client when absent
    #[serde(default)]
    pub viewable_clients: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetClient {
    pub id: String,

    /// Owned resource server; the client id when absent
    #[serde(default)]
    pub resource_server: Option<ResourceServerId>,

    /// Client role catalog
    #[serde(default)]
    pub roles: Vec<RoleId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetUser {
    pub id: String,

    /// Directly granted roles
    #[serde(default)]
    pub roles: Vec<RoleId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetPolicy {
    pub id: PolicyId,

    pub name: String,

    #[serde(rename = "type")]
    pub category: PolicyCategory,

    pub resource_server_id: ResourceServerId,

    #[serde(default)]
    pub associated_policies: Vec<PolicyId>,

    /// String values are kept verbatim, anything else is JSON-encoded
    #[serde(default)]
    pub config: HashMap<String, serde_json::Value>,

    /// Ids of attached resources
    #[serde(default)]
    pub resources: Vec<ResourceId>,

    #[serde(default)]
    pub scopes: Vec<ScopeId>,
}

impl Dataset {
    pub fn from_json_str(contents: &str) -> Result<Self> {
        serde_json::from_str(contents)
            .map_err(|e| AuthzError::InvalidInput(format!("Invalid dataset: {}", e)))
    }

    /// Load a dataset from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        use anyhow::Context;

        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read dataset {}", path.display()))?;

        Ok(Self::from_json_str(&contents)?)
    }

    /// Populate fresh in-memory stores
    ///
    /// Fails when a policy attaches a resource id the dataset does not define.
    pub async fn load(&self) -> Result<Stores> {
        let resources = InMemoryResourceStore::new();
        let mut by_id: HashMap<(&str, &str), &Resource> = HashMap::new();
        for resource in &self.resources {
            resources.put(resource.clone());
            by_id.insert((resource.resource_server_id.as_str(), resource.id.as_str()), resource);
        }

        let policies = InMemoryPolicyStore::new();
        for entry in &self.policies {
            let mut policy = Policy::new(
                entry.id.clone(),
                entry.name.clone(),
                entry.category,
                entry.resource_server_id.clone(),
            );
            policy.associated_policies = entry.associated_policies.clone();
            policy.scopes = entry.scopes.clone();

            for (key, value) in &entry.config {
                let raw = match value {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                policy.config.insert(key.clone(), raw);
            }

            for id in &entry.resources {
                let resource = by_id
                    .get(&(entry.resource_server_id.as_str(), id.as_str()))
                    .ok_or_else(|| {
                        AuthzError::InvalidInput(format!(
                            "Policy {} attaches unknown resource {}",
                            entry.name, id
                        ))
                    })?;
                policy.resources.push((*resource).clone());
            }

            policies.put(policy).await;
        }

        let mut directory = InMemoryRoleDirectory::new();
        let mut clients = HashMap::new();
        for entry in &self.clients {
            for role in &entry.roles {
                directory = directory.with_client_role(entry.id.clone(), role.clone());
            }
            let client = match &entry.resource_server {
                Some(server) => Client::new(entry.id.clone()).with_resource_server(server.clone()),
                None => Client::new(entry.id.clone()),
            };
            clients.insert(entry.id.clone(), client);
        }
        for (composite, children) in &self.composites {
            for child in children {
                directory = directory.with_composite(composite.clone(), child.clone());
            }
        }

        let access = match &self.viewable_clients {
            Some(viewable) => viewable
                .iter()
                .fold(StaticClientAccess::deny_all(), |access, id| access.allow(id.clone())),
            None => StaticClientAccess::allow_all(),
        };

        let users = self
            .users
            .iter()
            .map(|user| (user.id.clone(), user.roles.clone()))
            .collect();

        info!(
            "Loaded dataset with {} resources, {} policies, {} clients, {} users",
            self.resources.len(),
            self.policies.len(),
            self.clients.len(),
            self.users.len()
        );

        Ok(Stores {
            resources: Arc::new(resources),
            policies: Arc::new(policies),
            directory: Arc::new(directory),
            access: Arc::new(access),
            clients,
            users,
        })
    }
}

/// In-memory stores populated from a [`Dataset`]
#[derive(Clone)]
pub struct Stores {
    pub resources: Arc<InMemoryResourceStore>,
    pub policies: Arc<InMemoryPolicyStore>,
    pub directory: Arc<InMemoryRoleDirectory>,
    pub access: Arc<StaticClientAccess>,
    clients: HashMap<String, Client>,
    users: HashMap<String, Vec<RoleId>>,
}

impl Stores {
    pub fn client(&self, id: &str) -> Option<Client> {
        self.clients.get(id).cloned()
    }

    /// User with its granted roles, expanded through the dataset's composites
    pub fn user(&self, id: &str) -> Option<RoleMappedUser> {
        self.users
            .get(id)
            .map(|roles| self.directory.user(id, roles.iter().cloned()))
    }

    /// Resolver over these stores
    pub fn resolver(&self, config: ResolverConfig) -> ResourceResolver {
        ResourceResolver::new(
            self.access.clone(),
            self.directory.clone(),
            self.policies.clone(),
            self.resources.clone(),
            config,
        )
    }
}
