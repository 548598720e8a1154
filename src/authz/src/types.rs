//! Core identity types

use serde::{Deserialize, Serialize};

/// Unique resource server identifier
pub type ResourceServerId = String;

/// Unique resource identifier
pub type ResourceId = String;

/// Unique policy identifier
pub type PolicyId = String;

/// Unique scope identifier
pub type ScopeId = String;

/// Unique role identifier
pub type RoleId = String;

/// Administrative boundary owning resources, scopes and policies
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceServer {
    pub id: ResourceServerId,
}

impl ResourceServer {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Client whose role catalog scopes a principal's effective roles
///
/// A client owns at most one resource server; resolution always runs against
/// the client's server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    /// Client identifier
    pub id: String,

    /// Resource server owned by the client
    pub resource_server: ResourceServer,
}

impl Client {
    /// Create a client whose resource server shares its id
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            resource_server: ResourceServer::new(id.clone()),
            id,
        }
    }

    /// Point the client at a differently named resource server
    pub fn with_resource_server(mut self, server_id: impl Into<String>) -> Self {
        self.resource_server = ResourceServer::new(server_id);
        self
    }
}
