//! Role membership and role-policy matching
//!
//! - [`constraint`]: decodes a role policy's `roles` configuration into a typed
//!   [`RoleConstraint`] and matches it against effective roles by exact id.
//! - [`effective`]: narrows a client's role catalog to the roles a principal
//!   holds, delegating the membership test to the [`Principal`].

pub mod constraint;
pub mod effective;

pub use constraint::{RoleConstraint, RoleEntry, ROLES_CONFIG_KEY};
pub use effective::{
    EffectiveRoleResolver, InMemoryRoleDirectory, Principal, RoleDirectory, RoleMappedUser,
};
