//! Effective role resolution against a client's role catalog

use crate::error::Result;
use crate::types::{Client, RoleId};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tracing::debug;

/// Source of a client's role catalog
#[async_trait]
pub trait RoleDirectory: Send + Sync {
    /// Every role defined by the client
    async fn client_roles(&self, client_id: &str) -> Result<Vec<RoleId>>;
}

/// Principal whose role membership is being resolved
#[async_trait]
pub trait Principal: Send + Sync {
    fn id(&self) -> &str;

    /// Membership test, including roles reached through composites
    async fn has_role(&self, role: &str) -> Result<bool>;
}

/// Narrows a client's role catalog to the roles a principal holds
#[derive(Clone)]
pub struct EffectiveRoleResolver {
    directory: Arc<dyn RoleDirectory>,
}

impl EffectiveRoleResolver {
    pub fn new(directory: Arc<dyn RoleDirectory>) -> Self {
        Self { directory }
    }

    /// Roles of `client` held by `user`
    pub async fn resolve(&self, client: &Client, user: &dyn Principal) -> Result<HashSet<RoleId>> {
        let catalog = self.directory.client_roles(&client.id).await?;
        let mut effective = HashSet::new();

        for role in catalog {
            if user.has_role(&role).await? {
                effective.insert(role);
            }
        }

        debug!(
            "Effective roles for user={} on client={}: {}",
            user.id(),
            client.id,
            effective.len()
        );

        Ok(effective)
    }
}

/// In-memory role directory with composite roles
#[derive(Debug, Clone, Default)]
pub struct InMemoryRoleDirectory {
    /// Client id -> role catalog
    clients: HashMap<String, Vec<RoleId>>,

    /// Composite role -> roles it contains
    composites: Arc<HashMap<RoleId, Vec<RoleId>>>,
}

impl InMemoryRoleDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client_role(mut self, client_id: impl Into<String>, role: impl Into<String>) -> Self {
        self.clients.entry(client_id.into()).or_default().push(role.into());
        self
    }

    pub fn with_composite(mut self, composite: impl Into<String>, child: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.composites)
            .entry(composite.into())
            .or_default()
            .push(child.into());
        self
    }

    /// A user directly granted `granted`, sharing this directory's composites
    pub fn user<I, S>(&self, id: impl Into<String>, granted: I) -> RoleMappedUser
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RoleMappedUser {
            id: id.into(),
            granted: granted.into_iter().map(Into::into).collect(),
            composites: Arc::clone(&self.composites),
        }
    }
}

#[async_trait]
impl RoleDirectory for InMemoryRoleDirectory {
    async fn client_roles(&self, client_id: &str) -> Result<Vec<RoleId>> {
        Ok(self.clients.get(client_id).cloned().unwrap_or_default())
    }
}

/// User with direct role grants, expanded through composites on lookup
#[derive(Debug, Clone)]
pub struct RoleMappedUser {
    id: String,
    granted: Vec<RoleId>,
    composites: Arc<HashMap<RoleId, Vec<RoleId>>>,
}

impl RoleMappedUser {
    fn reaches(&self, role: &str) -> bool {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = self.granted.iter().map(String::as_str).collect();

        while let Some(current) = queue.pop_front() {
            if current == role {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(children) = self.composites.get(current) {
                queue.extend(children.iter().map(String::as_str));
            }
        }

        false
    }
}

#[async_trait]
impl Principal for RoleMappedUser {
    fn id(&self) -> &str {
        &self.id
    }

    async fn has_role(&self, role: &str) -> Result<bool> {
        Ok(self.reaches(role))
    }
}
