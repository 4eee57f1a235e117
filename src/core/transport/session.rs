//! Per-connection transport sessions.
//!
//! Every client connection gets its own entry, keyed by a generated session
//! id. There is no shared "current transport": each session is addressed
//! independently and lives until its transport detaches it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use rmcp::service::{Peer, RoleServer};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use super::TransportError;

/// Identifier of one client session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh random session id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The outbound side of a session, as seen by the discovery notifier.
#[async_trait]
pub trait SessionSink: Send + Sync {
    /// Tell the client that the tool list changed and should be re-fetched.
    async fn notify_tool_list_changed(&self) -> Result<(), TransportError>;
}

#[async_trait]
impl SessionSink for Peer<RoleServer> {
    async fn notify_tool_list_changed(&self) -> Result<(), TransportError> {
        Peer::<RoleServer>::notify_tool_list_changed(self)
            .await
            .map_err(|e| TransportError::ServiceError(e.to_string()))
    }
}

/// A live collection of sessions keyed by id.
pub struct SessionRegistry<T: ?Sized> {
    sessions: RwLock<HashMap<SessionId, Arc<T>>>,
}

impl<T: ?Sized> SessionRegistry<T> {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Attach a session under a freshly generated id.
    pub async fn attach(&self, session: Arc<T>) -> SessionId {
        let id = SessionId::generate();
        self.insert(id.clone(), session).await;
        id
    }

    /// Attach a session under a known id.
    pub async fn insert(&self, id: SessionId, session: Arc<T>) {
        debug!(session = %id, "Session attached");
        self.sessions.write().await.insert(id, session);
    }

    pub async fn get(&self, id: &SessionId) -> Option<Arc<T>> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Remove a session. Returns whether it was attached.
    pub async fn detach(&self, id: &SessionId) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            debug!(session = %id, "Session detached");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Clone out every session so callers can send without holding the lock.
    pub async fn snapshot(&self) -> Vec<(SessionId, Arc<T>)> {
        self.sessions
            .read()
            .await
            .iter()
            .map(|(id, session)| (id.clone(), session.clone()))
            .collect()
    }
}

impl<T: ?Sized> Default for SessionRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_attach_and_detach() {
        let registry: SessionRegistry<str> = SessionRegistry::new();
        let first = registry.attach(Arc::from("first")).await;
        let second = registry.attach(Arc::from("second")).await;

        assert_ne!(first, second);
        assert_eq!(registry.len().await, 2);
        assert_eq!(registry.get(&first).await.as_deref(), Some("first"));
        assert_eq!(registry.get(&second).await.as_deref(), Some("second"));

        assert!(registry.detach(&first).await);
        assert!(!registry.detach(&first).await);
        assert!(registry.get(&first).await.is_none());
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_insert_with_known_id() {
        let registry: SessionRegistry<str> = SessionRegistry::default();
        let id = SessionId::from("abc");
        registry.insert(id.clone(), Arc::from("session")).await;
        assert_eq!(registry.snapshot().await.len(), 1);
        assert_eq!(registry.get(&id).await.as_deref(), Some("session"));
    }
}
