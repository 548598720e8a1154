//! Resource resolution entry point
//!
//! Composes client access, effective roles, collection, assembly and sorting:
//!
//! ```text
//! Client + Principal → ClientAccess → EffectiveRoleResolver → ResourceCollector
//!                                                                   ↓
//!                                          Forest ← sort_forest ← assemble
//! ```

use crate::access::ClientAccess;
use crate::collector::{ResourceCollector, Strategy};
use crate::config::ResolverConfig;
use crate::error::Result;
use crate::policy::PolicyStore;
use crate::resource::{Resource, ResourceStore};
use crate::roles::{EffectiveRoleResolver, Principal, RoleDirectory};
use crate::tree::{assemble_by_id, assemble_by_name, sort_forest, Forest};
use crate::types::Client;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Strategies behind the "all visible resources" queries
const VISIBLE: [Strategy; 2] = [Strategy::Direct, Strategy::ScopeExpansion];

/// How resolved resources are linked into a hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hierarchy {
    /// Keyed by id, linked through `parent_id`
    ById,

    /// Keyed by name, linked through the configured parent attribute
    ByName,
}

/// Computes the resource forest a principal may see on a client
pub struct ResourceResolver {
    access: Arc<dyn ClientAccess>,
    roles: EffectiveRoleResolver,
    collector: ResourceCollector,
    config: ResolverConfig,
}

impl ResourceResolver {
    pub fn new(
        access: Arc<dyn ClientAccess>,
        directory: Arc<dyn RoleDirectory>,
        policies: Arc<dyn PolicyStore>,
        resources: Arc<dyn ResourceStore>,
        config: ResolverConfig,
    ) -> Self {
        let collector = ResourceCollector::new(policies, resources)
            .with_roles_config_key(config.roles_config_key.clone());

        info!(
            "ResourceResolver initialized with roles_config_key={}, parent_attribute={}, sort_output={}",
            config.roles_config_key, config.parent_attribute, config.sort_output
        );

        Self {
            access,
            roles: EffectiveRoleResolver::new(directory),
            collector,
            config,
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Every resource granted directly or through scopes, linked by id
    pub async fn resources_for_user(&self, client: &Client, user: &dyn Principal) -> Result<Forest> {
        self.resolve(client, user, &VISIBLE, Hierarchy::ById).await
    }

    /// Every resource granted directly or through scopes, linked by name
    pub async fn sub_resources_for_user(
        &self,
        client: &Client,
        user: &dyn Principal,
    ) -> Result<Forest> {
        self.resolve(client, user, &VISIBLE, Hierarchy::ByName).await
    }

    /// Granted resources equal to, or directly under, the named resource
    pub async fn resources_by_name(
        &self,
        client: &Client,
        user: &dyn Principal,
        name: &str,
    ) -> Result<Forest> {
        let strategy = [Strategy::NameScoped(name.to_string())];
        self.resolve(client, user, &strategy, Hierarchy::ById).await
    }

    /// Granted resources carrying, or directly under one carrying, a permission
    pub async fn resources_by_permission(
        &self,
        client: &Client,
        user: &dyn Principal,
        permission: &str,
    ) -> Result<Forest> {
        let strategy = [Strategy::PermissionScoped(permission.to_string())];
        self.resolve(client, user, &strategy, Hierarchy::ById).await
    }

    /// Run the full pipeline
    ///
    /// 1. Require view permission on the client; nothing is read otherwise
    /// 2. Resolve the user's effective roles on the client
    /// 3. Collect the union of the strategies' resources
    /// 4. Assemble the hierarchy
    /// 5. Sort every level, unless disabled in configuration
    ///
    /// Any failure aborts the call; no partial forest is returned.
    pub async fn resolve(
        &self,
        client: &Client,
        user: &dyn Principal,
        strategies: &[Strategy],
        hierarchy: Hierarchy,
    ) -> Result<Forest> {
        let start = Instant::now();

        self.access.require_view(client)?;

        let effective_roles = self.roles.resolve(client, user).await?;
        let resources = self
            .collector
            .collect_all(&client.resource_server, &effective_roles, strategies)
            .await?;

        debug!(
            "Collected {} resources for user={} on client={}",
            resources.len(),
            user.id(),
            client.id
        );

        let forest = self.build(&resources, hierarchy);

        info!(
            "Resolved {} resources in {} trees for user={} on client={} in {:?}",
            forest.node_count(),
            forest.roots.len(),
            user.id(),
            client.id,
            start.elapsed()
        );

        Ok(forest)
    }

    fn build(&self, resources: &[Resource], hierarchy: Hierarchy) -> Forest {
        let mut forest = match hierarchy {
            Hierarchy::ById => assemble_by_id(resources),
            Hierarchy::ByName => assemble_by_name(resources, &self.config.parent_attribute),
        };

        if self.config.sort_output {
            sort_forest(&mut forest.roots);
        }

        forest
    }
}
