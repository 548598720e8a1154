//! Administrative view permission on clients

use crate::error::{AuthzError, Result};
use crate::types::Client;
use std::collections::HashSet;

/// Answers whether the calling administrator may view a client
pub trait ClientAccess: Send + Sync {
    fn can_view(&self, client_id: &str) -> bool;

    /// Fail with `Forbidden` unless the client is viewable
    fn require_view(&self, client: &Client) -> Result<()> {
        if self.can_view(&client.id) {
            Ok(())
        } else {
            Err(AuthzError::Forbidden {
                client_id: client.id.clone(),
            })
        }
    }
}

/// Fixed set of viewable clients
#[derive(Debug, Clone, Default)]
pub struct StaticClientAccess {
    all: bool,
    clients: HashSet<String>,
}

impl StaticClientAccess {
    /// Every client is viewable
    pub fn allow_all() -> Self {
        Self {
            all: true,
            clients: HashSet::new(),
        }
    }

    /// No client is viewable
    pub fn deny_all() -> Self {
        Self::default()
    }

    pub fn allow(mut self, client_id: impl Into<String>) -> Self {
        self.clients.insert(client_id.into());
        self
    }
}

impl ClientAccess for StaticClientAccess {
    fn can_view(&self, client_id: &str) -> bool {
        self.all || self.clients.contains(client_id)
    }
}
