//! Resource collection strategies

use crate::policy::PolicyCategory;
use crate::resource::Resource;
use crate::types::ResourceId;
use std::collections::HashSet;
use std::fmt;

/// How a granted policy contributes resources
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Resource permissions contribute their attached resources
    Direct,

    /// Scope permissions contribute every server resource sharing a scope
    ScopeExpansion,

    /// Direct, restricted to the named resource and its immediate children
    NameScoped(String),

    /// Direct, restricted to resources carrying a permission name or whose
    /// parent does
    PermissionScoped(String),
}

impl Strategy {
    /// Category of the top-level policies this strategy walks
    pub fn category(&self) -> PolicyCategory {
        match self {
            Strategy::ScopeExpansion => PolicyCategory::Scope,
            Strategy::Direct | Strategy::NameScoped(_) | Strategy::PermissionScoped(_) => {
                PolicyCategory::Resource
            }
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Direct => f.write_str("direct"),
            Strategy::ScopeExpansion => f.write_str("scope-expansion"),
            Strategy::NameScoped(name) => write!(f, "name-scoped({})", name),
            Strategy::PermissionScoped(permission) => write!(f, "permission-scoped({})", permission),
        }
    }
}

/// Per-call filter over a policy's attached resources
#[derive(Debug, Clone)]
pub(crate) enum ResourceFilter {
    All,
    /// Resolved anchor id: keep the anchor and its direct children
    Anchored(ResourceId),
    /// Ids carrying the permission
    Permission(HashSet<ResourceId>),
}

impl ResourceFilter {
    pub(crate) fn accepts(&self, resource: &Resource) -> bool {
        match self {
            ResourceFilter::All => true,
            ResourceFilter::Anchored(anchor) => {
                resource.id == *anchor || resource.parent_id.as_deref() == Some(anchor.as_str())
            }
            ResourceFilter::Permission(ids) => {
                ids.contains(&resource.id)
                    || resource
                        .parent_id
                        .as_ref()
                        .is_some_and(|parent| ids.contains(parent))
            }
        }
    }
}
