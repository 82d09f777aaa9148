use std::convert::Infallible;

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{instrument, warn};

use crate::{
    base::types::Email,
    interaction::inbox::{self, InboxSummary, ReplyRequest, StoredFilter},
    runtime::Runtime,
    server::error::ApiError,
};

#[derive(Debug, Clone, Deserialize)]
pub struct DraftRequest {
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SummarizeRequest {
    pub id: u32,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub from: String,
}

#[instrument(name = "routes::emails::sync", skip_all)]
pub async fn sync(State(runtime): State<Runtime>) -> Result<Json<Vec<Email>>, ApiError> {
    let emails = inbox::sync_inbox(&runtime.db, &runtime.llm, &runtime.mail, runtime.config.inbox_batch_size)
        .await
        .map_err(|err| ApiError::internal("Unable to fetch emails", format!("{err:#}")))?;

    Ok(Json(emails))
}

pub async fn stored(State(runtime): State<Runtime>, filter: Result<Query<StoredFilter>, QueryRejection>) -> Result<Json<Vec<Email>>, ApiError> {
    let Query(filter) = filter?;

    Ok(Json(inbox::stored_emails(&runtime.db, filter).await?))
}

/// Server-sent events for every change to a stored email.
///
/// Each event is named after the change (`create`, `update`, `delete`) and carries the record as JSON.
pub async fn events(State(runtime): State<Runtime>) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let changes = runtime.db.get_email_live_query().await?;

    let stream = changes.filter_map(|change| async move {
        let change = match change {
            Ok(change) => change,
            Err(err) => {
                warn!("Dropping live query error: {err}");
                return None;
            }
        };

        match Event::default().event(change.action.as_str()).json_data(&change.email) {
            Ok(event) => Some(Ok(event)),
            Err(err) => {
                warn!("Failed to encode email event: {err}");
                None
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

#[instrument(name = "routes::emails::mark_seen", skip(runtime))]
pub async fn mark_seen(State(runtime): State<Runtime>, Path(id): Path<u32>) -> Result<Json<Value>, ApiError> {
    inbox::mark_seen(&runtime.db, &runtime.mail, id)
        .await
        .map_err(|err| ApiError::internal("Failed to mark email as seen", format!("{err:#}")))?;

    Ok(Json(json!({ "status": "ok" })))
}

#[instrument(name = "routes::emails::draft_reply", skip_all)]
pub async fn draft_reply(State(runtime): State<Runtime>, payload: Result<Json<DraftRequest>, JsonRejection>) -> Result<Json<Value>, ApiError> {
    let Ok(Json(request)) = payload else {
        return Err(ApiError::bad_request("No data provided"));
    };

    if request.body.trim().is_empty() {
        return Err(ApiError::bad_request("Email body content is required"));
    }

    let reply = runtime.llm.generate_reply(&request.body).await.map_err(|err| ApiError::internal("Failed to generate reply", format!("{err:#}")))?;

    Ok(Json(json!({ "reply": reply })))
}

#[instrument(name = "routes::emails::send", skip_all)]
pub async fn send(State(runtime): State<Runtime>, payload: Result<Json<ReplyRequest>, JsonRejection>) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload?;

    inbox::send_reply(&runtime.db, &runtime.mail, &request).await?;

    Ok(Json(json!({ "status": "sent" })))
}

#[instrument(name = "routes::emails::summarize", skip_all)]
pub async fn summarize(State(runtime): State<Runtime>, payload: Result<Json<SummarizeRequest>, JsonRejection>) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload?;

    if request.body.trim().is_empty() {
        return Err(ApiError::bad_request("Email body content is required"));
    }

    let summary = inbox::summarize(&runtime.db, &runtime.llm, request.id, &request.title, &request.from, &request.body)
        .await
        .map_err(|err| ApiError::internal("Failed to summarize email", format!("{err:#}")))?;

    Ok(Json(json!({ "reply": summary })))
}

pub async fn dashboard_summary(State(runtime): State<Runtime>) -> Result<Json<InboxSummary>, ApiError> {
    Ok(Json(inbox::summary(&runtime.db).await?))
}
