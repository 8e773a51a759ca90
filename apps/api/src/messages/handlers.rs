use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::connections::handlers::connection_not_found;
use crate::connections::status::ConnectionStatus;
use crate::connections::store as connection_store;
use crate::errors::AppError;
use crate::messages::store;
use crate::models::connection::ConnectionRow;
use crate::models::message::MessageRow;
use crate::state::AppState;

pub const MAX_MESSAGE_CHARS: usize = 2000;

#[derive(Debug, Default, Deserialize)]
pub struct SendMessageRequest {
    pub sender_id: Option<Uuid>,
    pub content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MarkReadRequest {
    pub reader_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    pub updated: u64,
}

/// Trims the content and enforces the length bounds.
pub fn validate_content(raw: Option<&str>) -> Result<String, AppError> {
    let content = raw.map(str::trim).unwrap_or_default();
    if content.is_empty() {
        return Err(AppError::Validation("Message content is required".to_string()));
    }
    if content.chars().count() > MAX_MESSAGE_CHARS {
        return Err(AppError::Validation(format!(
            "Message content must be at most {MAX_MESSAGE_CHARS} characters"
        )));
    }
    Ok(content.to_string())
}

/// Only the two parties of a connection may write or read on it.
pub fn ensure_party(connection: &ConnectionRow, profile_id: Uuid) -> Result<(), AppError> {
    if connection.involves(profile_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "Profile {profile_id} is not part of connection {}",
            connection.id
        )))
    }
}

async fn load_connection(state: &AppState, id: Uuid) -> Result<ConnectionRow, AppError> {
    connection_store::get_connection(&state.db, id)
        .await?
        .ok_or_else(|| connection_not_found(id))
}

/// POST /api/connections/:id/messages
pub async fn handle_send_message(
    State(state): State<AppState>,
    Path(connection_id): Path<Uuid>,
    Json(req): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<MessageRow>), AppError> {
    let content = validate_content(req.content.as_deref())?;
    let sender_id = req
        .sender_id
        .ok_or_else(|| AppError::Validation("sender_id is required".to_string()))?;

    let connection = load_connection(&state, connection_id).await?;
    ensure_party(&connection, sender_id)?;
    if connection.status() != Some(ConnectionStatus::Accepted) {
        return Err(AppError::Validation(
            "Messages can only be sent on accepted connections".to_string(),
        ));
    }

    let message = store::insert_message(&state.db, connection_id, sender_id, &content).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// GET /api/connections/:id/messages
pub async fn handle_list_messages(
    State(state): State<AppState>,
    Path(connection_id): Path<Uuid>,
) -> Result<Json<Vec<MessageRow>>, AppError> {
    load_connection(&state, connection_id).await?;
    let messages = store::list_messages(&state.db, connection_id).await?;
    Ok(Json(messages))
}

/// PUT /api/connections/:id/messages/read
pub async fn handle_mark_read(
    State(state): State<AppState>,
    Path(connection_id): Path<Uuid>,
    Json(req): Json<MarkReadRequest>,
) -> Result<Json<MarkReadResponse>, AppError> {
    let reader_id = req
        .reader_id
        .ok_or_else(|| AppError::Validation("reader_id is required".to_string()))?;

    let connection = load_connection(&state, connection_id).await?;
    ensure_party(&connection, reader_id)?;

    let updated = store::mark_read(&state.db, connection_id, reader_id).await?;
    Ok(Json(MarkReadResponse { updated }))
}
