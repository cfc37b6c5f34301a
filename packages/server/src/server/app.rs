//! Application setup and server configuration.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::Extension,
    http::{header::CONTENT_TYPE, Method},
    routing::{delete, get, post},
    Router,
};
use knowledge::KnowledgeBase;
use sqlx::SqlitePool;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::domains::incidents::{ConversationRegistry, IncidentCoordinator};
use crate::domains::notifications::NotificationDispatcher;
use crate::kernel::ServerDeps;
use crate::server::routes::{
    end_conversation_handler, health_handler, location_handler, photo_handler, ping_handler,
    tool_call_handler, tools_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub knowledge: KnowledgeBase,
    pub conversations: Arc<ConversationRegistry>,
}

/// Build the Axum application router.
///
/// Spawns the notification worker on the current runtime; the returned
/// handle finishes once the router (and every dispatcher clone) is dropped.
/// Conversations idle for `conversation_idle` are swept from the registry.
pub fn build_app(
    deps: ServerDeps,
    top_k: usize,
    conversation_idle: Duration,
) -> (Router, JoinHandle<()>) {
    let (dispatcher, worker) = NotificationDispatcher::spawn(deps.mailer.clone());

    let coordinator = Arc::new(IncidentCoordinator::from_deps(&deps, dispatcher).with_top_k(top_k));

    let conversations = Arc::new(ConversationRegistry::new(coordinator));
    conversations.spawn_idle_eviction(conversation_idle);

    let app_state = AppState {
        db_pool: deps.directory.pool().clone(),
        knowledge: deps.knowledge.clone(),
        conversations,
    };

    // CORS configuration - allow any origin for development
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([CONTENT_TYPE]);

    let app = Router::new()
        .route("/ping", get(ping_handler))
        .route("/health", get(health_handler))
        .route("/tools", get(tools_handler))
        .route("/conversations/:id", delete(end_conversation_handler))
        .route("/conversations/:id/tools", post(tool_call_handler))
        .route("/conversations/:id/photo", post(photo_handler))
        .route("/conversations/:id/location", post(location_handler))
        .layer(Extension(app_state))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    (app, worker)
}
