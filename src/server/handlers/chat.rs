use std::sync::Arc;

use axum::extract::State;
use axum::response::{Html, IntoResponse};
use axum::Form;
use serde::Deserialize;

use crate::core::errors::ApiError;
use crate::state::AppState;

const INDEX_PAGE: &str = include_str!("../../../templates/index.html");

#[derive(Debug, Deserialize)]
pub struct ChatForm {
    #[serde(default)]
    pub msg: String,
    pub session_id: Option<String>,
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

/// Answers one chat message as plain text.
pub async fn get_response(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ChatForm>,
) -> Result<impl IntoResponse, ApiError> {
    let session_id = form
        .session_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .unwrap_or(state.settings.server.default_session_id.as_str());

    let answer = state.handle_message(session_id, &form.msg).await?;
    Ok(answer)
}
