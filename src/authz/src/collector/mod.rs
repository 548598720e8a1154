//! Role-gated resource collection
//!
//! Every strategy walks the server's top-level policies of one category. A
//! policy is granted when one of its associated role policies lists a role the
//! caller holds; a granted policy then contributes resources according to the
//! [`Strategy`]. Contributions are unioned by resource id in first-seen order.
//!
//! Associated policies are referenced by id. Aggregate policies are descended
//! into; each walk tracks visited ids, so a cycle in the association graph
//! only costs a revisit check.

mod strategy;

#[cfg(test)]
mod tests;

pub use strategy::Strategy;

use strategy::ResourceFilter;

use crate::error::Result;
use crate::policy::{Policy, PolicyCategory, PolicyStore};
use crate::resource::{Resource, ResourceStore};
use crate::roles::{RoleConstraint, ROLES_CONFIG_KEY};
use crate::types::{PolicyId, ResourceId, ResourceServer, RoleId};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Collects the resources granted to a set of effective roles
#[derive(Clone)]
pub struct ResourceCollector {
    policies: Arc<dyn PolicyStore>,
    resources: Arc<dyn ResourceStore>,
    roles_config_key: String,
}

impl ResourceCollector {
    pub fn new(policies: Arc<dyn PolicyStore>, resources: Arc<dyn ResourceStore>) -> Self {
        Self {
            policies,
            resources,
            roles_config_key: ROLES_CONFIG_KEY.to_string(),
        }
    }

    /// Read role lists from a different configuration key
    pub fn with_roles_config_key(mut self, key: impl Into<String>) -> Self {
        self.roles_config_key = key.into();
        self
    }

    /// Resources contributed by one strategy
    pub async fn collect(
        &self,
        server: &ResourceServer,
        effective_roles: &HashSet<RoleId>,
        strategy: &Strategy,
    ) -> Result<Vec<Resource>> {
        let mut collected = IndexMap::new();
        self.collect_into(server, effective_roles, strategy, &mut collected)
            .await?;
        Ok(collected.into_values().collect())
    }

    /// Union of several strategies, in the order given
    ///
    /// Any error discards everything collected so far.
    pub async fn collect_all(
        &self,
        server: &ResourceServer,
        effective_roles: &HashSet<RoleId>,
        strategies: &[Strategy],
    ) -> Result<Vec<Resource>> {
        let mut collected = IndexMap::new();
        for strategy in strategies {
            self.collect_into(server, effective_roles, strategy, &mut collected)
                .await?;
        }
        Ok(collected.into_values().collect())
    }

    async fn collect_into(
        &self,
        server: &ResourceServer,
        effective_roles: &HashSet<RoleId>,
        strategy: &Strategy,
        collected: &mut IndexMap<ResourceId, Resource>,
    ) -> Result<()> {
        let Some(filter) = self.filter_for(server, strategy).await? else {
            debug!("Strategy {} has no anchor on server={}", strategy, server.id);
            return Ok(());
        };

        let policies = self
            .policies
            .find_by_type(strategy.category(), &server.id)
            .await?;
        let before = collected.len();

        for policy in &policies {
            if !self.is_granted(server, policy, effective_roles).await? {
                continue;
            }

            debug!("Policy {} granted under {}", policy.name, strategy);

            for resource in self.contribution(server, policy, strategy).await? {
                if filter.accepts(&resource) {
                    collected.entry(resource.id.clone()).or_insert(resource);
                }
            }
        }

        debug!(
            "Strategy {} on server={} walked {} policies, added {} resources",
            strategy,
            server.id,
            policies.len(),
            collected.len() - before
        );

        Ok(())
    }

    /// Filter for the strategy, or `None` when its anchor does not resolve
    async fn filter_for(
        &self,
        server: &ResourceServer,
        strategy: &Strategy,
    ) -> Result<Option<ResourceFilter>> {
        let filter = match strategy {
            Strategy::Direct | Strategy::ScopeExpansion => ResourceFilter::All,
            Strategy::NameScoped(name) => {
                match self.resources.find_by_name(name, &server.id).await? {
                    Some(anchor) => ResourceFilter::Anchored(anchor.id),
                    None => return Ok(None),
                }
            }
            Strategy::PermissionScoped(permission) => {
                let tagged = self
                    .resources
                    .find_resource_id_by_permission(&server.id, permission)
                    .await?;
                ResourceFilter::Permission(tagged.into_iter().map(|r| r.id).collect())
            }
        };
        Ok(Some(filter))
    }

    async fn contribution(
        &self,
        server: &ResourceServer,
        policy: &Policy,
        strategy: &Strategy,
    ) -> Result<Vec<Resource>> {
        match strategy {
            Strategy::ScopeExpansion => {
                if policy.scopes.is_empty() {
                    return Ok(Vec::new());
                }
                self.resources.find_by_scope(&policy.scopes, &server.id).await
            }
            _ => Ok(policy.resources.clone()),
        }
    }

    /// Walks the association graph of `policy` and reports whether any role
    /// policy in it matches the effective roles
    ///
    /// Every role policy is decoded, matched or not, so malformed configuration
    /// always surfaces.
    async fn is_granted(
        &self,
        server: &ResourceServer,
        policy: &Policy,
        effective_roles: &HashSet<RoleId>,
    ) -> Result<bool> {
        let mut visited: HashSet<PolicyId> = HashSet::from([policy.id.clone()]);
        let mut pending: Vec<PolicyId> = policy.associated_policies.iter().rev().cloned().collect();
        let mut granted = false;

        while let Some(id) = pending.pop() {
            if !visited.insert(id.clone()) {
                debug!("Policy {} already visited from {}", id, policy.name);
                continue;
            }

            let Some(associated) = self.policies.find_by_id(&id, &server.id).await? else {
                warn!("Policy {} references unknown policy {}", policy.name, id);
                continue;
            };

            match associated.category {
                PolicyCategory::Role => {
                    let constraint = RoleConstraint::decode(
                        &associated.config,
                        &self.roles_config_key,
                        &policy.name,
                    )
                    .inspect_err(|_| {
                        warn!(
                            "Role policy {} under {} has malformed configuration",
                            associated.name, policy.name
                        )
                    })?;
                    granted |= constraint.matches(effective_roles);
                }
                PolicyCategory::Aggregate => {
                    pending.extend(associated.associated_policies.iter().rev().cloned());
                }
                _ => {}
            }
        }

        Ok(granted)
    }
}
