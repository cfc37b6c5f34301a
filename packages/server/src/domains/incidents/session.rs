//! Live conversations and their tool handlers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::context::ConversationContext;
use super::coordinator::IncidentCoordinator;
use super::tools::{ToolCommand, ToolHandler};

/// Conversations untouched for this long are dropped by the idle sweep.
pub const DEFAULT_CONVERSATION_IDLE: Duration = Duration::from_secs(30 * 60);

/// One conversation: its context plus the shared coordinator.
pub struct Conversation {
    context: ConversationContext,
    coordinator: Arc<IncidentCoordinator>,
    last_active: Mutex<Instant>,
}

impl Conversation {
    pub fn new(id: impl Into<String>, coordinator: Arc<IncidentCoordinator>) -> Self {
        Self {
            context: ConversationContext::new(id),
            coordinator,
            last_active: Mutex::new(Instant::now()),
        }
    }

    fn last_active(&self) -> MutexGuard<'_, Instant> {
        self.last_active.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn touch(&self) {
        *self.last_active() = Instant::now();
    }

    /// Time since the conversation was last looked up.
    pub fn idle_for(&self) -> Duration {
        self.last_active().elapsed()
    }

    pub fn id(&self) -> &str {
        self.context.id()
    }

    pub fn context(&self) -> &ConversationContext {
        &self.context
    }

    /// Image event from the vision pipeline.
    pub async fn image_received(&self, image_url: &str, analysis: &str) {
        self.coordinator
            .record_image(&self.context, image_url, analysis)
            .await;
    }
}

#[async_trait]
impl ToolHandler for Conversation {
    async fn handle(&self, command: ToolCommand) -> String {
        debug!(conversation_id = %self.id(), tool = command.name(), "Handling tool call");
        self.coordinator.handle(&self.context, command).await
    }
}

/// Conversations by id. Contexts are never shared across ids.
///
/// Conversations end with [`remove`](Self::remove) or, when the client never
/// says goodbye, with [`evict_idle`](Self::evict_idle).
pub struct ConversationRegistry {
    coordinator: Arc<IncidentCoordinator>,
    conversations: RwLock<HashMap<String, Arc<Conversation>>>,
}

impl ConversationRegistry {
    pub fn new(coordinator: Arc<IncidentCoordinator>) -> Self {
        Self {
            coordinator,
            conversations: RwLock::new(HashMap::new()),
        }
    }

    pub fn coordinator(&self) -> &Arc<IncidentCoordinator> {
        &self.coordinator
    }

    pub async fn get(&self, id: &str) -> Option<Arc<Conversation>> {
        let conversation = self.conversations.read().await.get(id).cloned()?;
        conversation.touch();
        Some(conversation)
    }

    pub async fn get_or_create(&self, id: &str) -> Arc<Conversation> {
        if let Some(conversation) = self.get(id).await {
            return conversation;
        }

        let mut conversations = self.conversations.write().await;
        conversations
            .entry(id.to_string())
            .or_insert_with(|| {
                info!(conversation_id = %id, "Conversation started");
                Arc::new(Conversation::new(id, self.coordinator.clone()))
            })
            .clone()
    }

    /// End a conversation and drop its context.
    pub async fn remove(&self, id: &str) -> bool {
        let removed = self.conversations.write().await.remove(id).is_some();
        if removed {
            info!(conversation_id = %id, "Conversation ended");
        }
        removed
    }

    /// Drop conversations idle for at least `max_idle` that no request holds.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut conversations = self.conversations.write().await;
        let before = conversations.len();
        conversations.retain(|id, conversation| {
            let keep = Arc::strong_count(conversation) > 1 || conversation.idle_for() < max_idle;
            if !keep {
                info!(conversation_id = %id, "Idle conversation evicted");
            }
            keep
        });
        before - conversations.len()
    }

    /// Sweep idle conversations in the background.
    ///
    /// The task stops once the registry is dropped.
    pub fn spawn_idle_eviction(self: &Arc<Self>, max_idle: Duration) -> JoinHandle<()> {
        let registry: Weak<Self> = Arc::downgrade(self);
        let period = (max_idle / 2).max(Duration::from_secs(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(registry) = registry.upgrade() else {
                    break;
                };
                let evicted = registry.evict_idle(max_idle).await;
                if evicted > 0 {
                    let remaining = registry.len().await;
                    debug!(evicted, remaining, "Idle sweep finished");
                }
            }
        })
    }

    pub async fn len(&self) -> usize {
        self.conversations.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.conversations.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::notifications::NotificationDispatcher;
    use crate::kernel::{MockMailer, TestDependencies};

    async fn registry() -> ConversationRegistry {
        let deps = TestDependencies::new().into_server_deps().await.unwrap();
        let (dispatcher, _worker) = NotificationDispatcher::channel(Arc::new(MockMailer::new()), 4);
        ConversationRegistry::new(Arc::new(IncidentCoordinator::from_deps(&deps, dispatcher)))
    }

    #[tokio::test]
    async fn test_idle_conversations_are_evicted() {
        let registry = registry().await;
        drop(registry.get_or_create("stale").await);

        tokio::time::sleep(Duration::from_millis(30)).await;
        drop(registry.get_or_create("fresh").await);

        assert_eq!(registry.evict_idle(Duration::from_millis(20)).await, 1);
        assert!(registry.get("stale").await.is_none());
        assert!(registry.get("fresh").await.is_some());
    }

    #[tokio::test]
    async fn test_lookup_keeps_conversation_alive() {
        let registry = registry().await;
        drop(registry.get_or_create("call-1").await);

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(registry.get("call-1").await.is_some());

        assert_eq!(registry.evict_idle(Duration::from_millis(20)).await, 0);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_conversation_in_use_is_not_evicted() {
        let registry = registry().await;
        let held = registry.get_or_create("call-1").await;

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(registry.evict_idle(Duration::from_millis(20)).await, 0);
        assert_eq!(held.id(), "call-1");
        assert!(!registry.is_empty().await);
    }
}
