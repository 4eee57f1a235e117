//! Discovery Notifier - tells every attached session when the tool list changes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::transport::{SessionId, SessionRegistry, SessionSink};

/// Dynamic tool discovery configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Advertise `tools.listChanged` and send change notifications.
    pub enabled: bool,
}

/// Broadcasts tool-list changes to all attached sessions.
///
/// Sessions are tracked whether or not discovery is enabled; notifications
/// are only sent when it is.
pub struct DiscoveryNotifier {
    enabled: bool,
    sessions: SessionRegistry<dyn SessionSink>,
}

impl DiscoveryNotifier {
    pub fn new(config: DiscoveryConfig) -> Self {
        Self {
            enabled: config.enabled,
            sessions: SessionRegistry::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Attach a session under a fresh id.
    pub async fn attach(&self, sink: Arc<dyn SessionSink>) -> SessionId {
        self.sessions.attach(sink).await
    }

    /// Attach a session under an id the transport already assigned.
    pub async fn attach_with_id(&self, id: SessionId, sink: Arc<dyn SessionSink>) {
        self.sessions.insert(id, sink).await;
    }

    pub async fn detach(&self, id: &SessionId) -> bool {
        self.sessions.detach(id).await
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.len().await
    }

    /// Send `notifications/tools/list_changed` to every attached session.
    ///
    /// Sessions whose transport is gone are detached. Returns the number of
    /// sessions that were notified.
    pub async fn notify_tool_list_changed(&self) -> usize {
        if !self.enabled {
            return 0;
        }

        let mut delivered = 0;
        for (id, sink) in self.sessions.snapshot().await {
            match sink.notify_tool_list_changed().await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!(session = %id, "Dropping session after failed notification: {}", e);
                    self.sessions.detach(&id).await;
                }
            }
        }

        info!("Notified {} session(s) of tool list change", delivered);
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transport::TransportError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct RecordingSink {
        received: AtomicUsize,
        closed: AtomicBool,
    }

    #[async_trait]
    impl SessionSink for RecordingSink {
        async fn notify_tool_list_changed(&self) -> Result<(), TransportError> {
            if self.closed.load(Ordering::SeqCst) {
                return Err(TransportError::SessionClosed("test".to_string()));
            }
            self.received.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_every_session_notified() {
        let notifier = DiscoveryNotifier::new(DiscoveryConfig { enabled: true });
        let first = Arc::new(RecordingSink::default());
        let second = Arc::new(RecordingSink::default());
        notifier.attach(first.clone()).await;
        notifier.attach(second.clone()).await;

        assert_eq!(notifier.notify_tool_list_changed().await, 2);
        assert_eq!(first.received.load(Ordering::SeqCst), 1);
        assert_eq!(second.received.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_disabled_sends_nothing() {
        let notifier = DiscoveryNotifier::new(DiscoveryConfig::default());
        let sink = Arc::new(RecordingSink::default());
        notifier.attach(sink.clone()).await;

        assert_eq!(notifier.notify_tool_list_changed().await, 0);
        assert_eq!(sink.received.load(Ordering::SeqCst), 0);
        assert_eq!(notifier.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_closed_session_detached() {
        let notifier = DiscoveryNotifier::new(DiscoveryConfig { enabled: true });
        let open = Arc::new(RecordingSink::default());
        let closed = Arc::new(RecordingSink::default());
        closed.closed.store(true, Ordering::SeqCst);
        notifier.attach(open.clone()).await;
        notifier.attach(closed).await;

        assert_eq!(notifier.notify_tool_list_changed().await, 1);
        assert_eq!(notifier.session_count().await, 1);
        assert_eq!(open.received.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_detached_session_not_notified() {
        let notifier = DiscoveryNotifier::new(DiscoveryConfig { enabled: true });
        let sink = Arc::new(RecordingSink::default());
        let id = notifier.attach(sink.clone()).await;
        assert!(notifier.detach(&id).await);

        assert_eq!(notifier.notify_tool_list_changed().await, 0);
        assert_eq!(sink.received.load(Ordering::SeqCst), 0);
    }
}
