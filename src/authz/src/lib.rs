//! # Resource Authorization
//!
//! Computes which protected resources a principal may see on a resource
//! server and returns them as a parent-linked, deterministically ordered
//! forest.
//!
//! ## Features
//!
//! - **Role-gated collection** over resource, scope, name and permission
//!   anchored policies
//! - **Cycle-safe policy traversal** through aggregate policies
//! - **Two-pass hierarchy assembly** keyed by id or by name
//! - **Stable recursive ordering** by sort index
//! - **Revision-stamped resource snapshots** with lazily materialized fields
//!
//! ## Example
//!
//! ```rust
//! use resource_authz::{Dataset, ResolverConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dataset = Dataset::from_json_str(r#"{
//!         "clients": [{ "id": "billing", "roles": ["A"] }],
//!         "users": [{ "id": "alice", "roles": ["A"] }],
//!         "resources": [{ "id": "r1", "name": "orders", "resource_server_id": "billing" }],
//!         "policies": [
//!             { "id": "role-a", "name": "Role A", "type": "role",
//!               "resource_server_id": "billing", "config": { "roles": [{ "id": "A" }] } },
//!             { "id": "orders", "name": "Orders", "type": "resource",
//!               "resource_server_id": "billing", "associated_policies": ["role-a"],
//!               "resources": ["r1"] }
//!         ]
//!     }"#)?;
//!
//!     let stores = dataset.load().await?;
//!     let resolver = stores.resolver(ResolverConfig::default());
//!
//!     let client = stores.client("billing").unwrap();
//!     let alice = stores.user("alice").unwrap();
//!     let forest = resolver.resources_for_user(&client, &alice).await?;
//!
//!     assert_eq!(forest.roots[0].name, "orders");
//!     Ok(())
//! }
//! ```

pub mod access;
pub mod cache;
pub mod collector;
pub mod config;
pub mod dataset;
pub mod error;
pub mod policy;
pub mod resolver;
pub mod resource;
pub mod roles;
pub mod telemetry;
pub mod tree;
pub mod types;

// Re-export commonly used types
pub use access::{ClientAccess, StaticClientAccess};
pub use cache::{CachedResource, LazyField, SnapshotCache};
pub use collector::{ResourceCollector, Strategy};
pub use config::ResolverConfig;
pub use dataset::{Dataset, Stores};
pub use error::{AuthzError, Result};
pub use policy::{InMemoryPolicyStore, Policy, PolicyCategory, PolicyStore};
pub use resolver::{Hierarchy, ResourceResolver};
pub use resource::{InMemoryResourceStore, Resource, ResourceStore, Scope};
pub use roles::{
    EffectiveRoleResolver, InMemoryRoleDirectory, Principal, RoleConstraint, RoleDirectory,
};
pub use tree::{Forest, ResourceView};
pub use types::{Client, ResourceServer};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
