//! Role constraint decoding and matching

use crate::error::{AuthzError, Result};
use crate::types::RoleId;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Default configuration key holding the JSON role list
pub const ROLES_CONFIG_KEY: &str = "roles";

/// One entry of a role policy's role list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleEntry {
    pub id: RoleId,

    #[serde(default)]
    pub required: bool,
}

/// Decoded role list of a role-based policy
///
/// An empty constraint never matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleConstraint {
    entries: Vec<RoleEntry>,
}

impl RoleConstraint {
    /// Build a constraint from plain role ids
    pub fn from_roles<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: roles
                .into_iter()
                .map(|id| RoleEntry {
                    id: id.into(),
                    required: false,
                })
                .collect(),
        }
    }

    /// Decode the role list stored under `key`
    ///
    /// A missing entry yields an empty constraint. Content that is not a JSON
    /// list of `{"id": "..."}` objects fails with `ConfigMalformed` carrying
    /// `policy_name`.
    pub fn decode(config: &HashMap<String, String>, key: &str, policy_name: &str) -> Result<Self> {
        let Some(raw) = config.get(key) else {
            return Ok(Self::default());
        };

        let entries: Vec<RoleEntry> =
            serde_json::from_str(raw).map_err(|source| AuthzError::ConfigMalformed {
                policy: policy_name.to_string(),
                source,
            })?;

        Ok(Self { entries })
    }

    /// Role ids in configuration order
    pub fn role_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.id.as_str())
    }

    pub fn entries(&self) -> &[RoleEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True iff any listed role is among the effective roles
    pub fn matches(&self, effective_roles: &HashSet<RoleId>) -> bool {
        self.role_ids().any(|id| effective_roles.contains(id))
    }
}
