use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (status, documents) = match state.index.count().await {
        Ok(count) => ("ok", Some(count)),
        Err(err) => {
            tracing::warn!(error = %err, "health check could not reach the vector index");
            ("degraded", None)
        }
    };

    Json(json!({
        "status": status,
        "llm": state.llm.name(),
        "collection": state.index.collection(),
        "documents": documents,
        "sessions": state.sessions.len()
    }))
}
