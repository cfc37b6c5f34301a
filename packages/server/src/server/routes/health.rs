use axum::{extract::Extension, http::StatusCode, Json};
use serde::Serialize;
use serde_json::json;

use crate::server::app::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    database: DatabaseHealth,
    knowledge: KnowledgeHealth,
}

#[derive(Serialize)]
pub struct DatabaseHealth {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
pub struct KnowledgeHealth {
    status: String,
    chunks: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

pub async fn ping_handler() -> Json<serde_json::Value> {
    Json(json!({ "message": "Works!" }))
}

/// Health check endpoint
///
/// Returns 200 OK while the directory is reachable, 503 otherwise. An
/// unavailable knowledge base only degrades the status.
pub async fn health_handler(
    Extension(state): Extension<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let database = match tokio::time::timeout(
        std::time::Duration::from_secs(5),
        sqlx::query("SELECT 1").execute(&state.db_pool),
    )
    .await
    {
        Ok(Ok(_)) => DatabaseHealth {
            status: "ok".to_string(),
            error: None,
        },
        Ok(Err(e)) => DatabaseHealth {
            status: "error".to_string(),
            error: Some(format!("Query failed: {}", e)),
        },
        Err(_) => DatabaseHealth {
            status: "error".to_string(),
            error: Some("Query timeout (>5s)".to_string()),
        },
    };

    let knowledge = KnowledgeHealth {
        status: if state.knowledge.is_available() {
            "ok".to_string()
        } else {
            "unavailable".to_string()
        },
        chunks: state.knowledge.chunk_count(),
        reason: state.knowledge.unavailable_reason().map(str::to_string),
    };

    let (status_code, status) = match (database.status == "ok", state.knowledge.is_available()) {
        (true, true) => (StatusCode::OK, "healthy"),
        (true, false) => (StatusCode::OK, "degraded"),
        (false, _) => (StatusCode::SERVICE_UNAVAILABLE, "unhealthy"),
    };

    (
        status_code,
        Json(HealthResponse {
            status: status.to_string(),
            database,
            knowledge,
        }),
    )
}
