use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::Deserialize;
use tracing::instrument;

use crate::{
    base::types::ChatMessage,
    interaction::sales_chat,
    runtime::Runtime,
    server::error::ApiError,
};

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub history: Vec<ChatMessage>,
    #[serde(default)]
    pub message: String,
}

pub async fn greeting() -> Json<ChatMessage> {
    Json(sales_chat::greeting())
}

#[instrument(name = "routes::chat::chat", skip_all)]
pub async fn chat(State(runtime): State<Runtime>, payload: Result<Json<ChatRequest>, JsonRejection>) -> Result<Json<ChatMessage>, ApiError> {
    let Json(request) = payload?;

    let exchange = sales_chat::respond(&runtime.llm, &request.history, &request.message)
        .await
        .ok_or_else(|| ApiError::bad_request("Message is required"))?;

    Ok(Json(exchange.bot))
}
