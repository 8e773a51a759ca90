use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::connections::status::{check_transition, parse_target, ConnectionStatus};
use crate::connections::store;
use crate::connections::views::{
    attach_counterparts, counterpart_ids, derive_friends, ConnectionView, FriendEntry,
};
use crate::errors::AppError;
use crate::models::connection::ConnectionRow;
use crate::profiles::handlers::profile_not_found;
use crate::profiles::store as profile_store;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CreateConnectionRequest {
    pub sender_id: Option<Uuid>,
    pub receiver_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateConnectionRequest {
    pub status: Option<String>,
}

pub(crate) fn connection_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Connection {id} not found"))
}

/// Checks the shape of a new request before touching the database.
pub fn validate_request(req: &CreateConnectionRequest) -> Result<(Uuid, Uuid), AppError> {
    let (Some(sender), Some(receiver)) = (req.sender_id, req.receiver_id) else {
        return Err(AppError::Validation(
            "sender_id and receiver_id are required".to_string(),
        ));
    };
    if sender == receiver {
        return Err(AppError::Validation(
            "Cannot send connection request to yourself".to_string(),
        ));
    }
    Ok((sender, receiver))
}

/// POST /api/connections
pub async fn handle_create_connection(
    State(state): State<AppState>,
    Json(req): Json<CreateConnectionRequest>,
) -> Result<(StatusCode, Json<ConnectionRow>), AppError> {
    let (sender, receiver) = validate_request(&req)?;

    for id in [sender, receiver] {
        if !profile_store::profile_exists(&state.db, id).await? {
            return Err(profile_not_found(id));
        }
    }
    if store::find_between(&state.db, sender, receiver).await?.is_some() {
        return Err(AppError::AlreadyExists(
            "Connection request already exists".to_string(),
        ));
    }

    let connection = store::insert_request(&state.db, sender, receiver).await?;
    Ok((StatusCode::CREATED, Json(connection)))
}

/// PUT /api/connections/:id
pub async fn handle_update_connection(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateConnectionRequest>,
) -> Result<Json<ConnectionRow>, AppError> {
    let target = parse_target(req.status.as_deref())?;

    let existing = store::get_connection(&state.db, id)
        .await?
        .ok_or_else(|| connection_not_found(id))?;
    let current = existing
        .status()
        .ok_or_else(|| anyhow::anyhow!("connection {id} has unknown status '{}'", existing.status))?;
    check_transition(current, target)?;

    let updated = store::answer_request(&state.db, id, target)
        .await?
        .ok_or_else(|| AppError::Validation("Connection has already been answered".to_string()))?;
    Ok(Json(updated))
}

/// DELETE /api/connections/:id
pub async fn handle_delete_connection(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !store::delete_connection(&state.db, id).await? {
        return Err(connection_not_found(id));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn ensure_profile(state: &AppState, id: Uuid) -> Result<(), AppError> {
    if profile_store::profile_exists(&state.db, id).await? {
        Ok(())
    } else {
        Err(profile_not_found(id))
    }
}

async fn with_counterparts(
    state: &AppState,
    viewer: Uuid,
    rows: Vec<ConnectionRow>,
) -> Result<Vec<ConnectionView>, AppError> {
    let ids = counterpart_ids(viewer, &rows);
    let summaries = profile_store::get_summaries(&state.db, &ids).await?;
    Ok(attach_counterparts(viewer, rows, summaries))
}

/// GET /api/profiles/:id/connections
pub async fn handle_list_connections(
    State(state): State<AppState>,
    Path(profile_id): Path<Uuid>,
) -> Result<Json<Vec<ConnectionView>>, AppError> {
    ensure_profile(&state, profile_id).await?;
    let rows = store::list_for_profile(&state.db, profile_id).await?;
    Ok(Json(with_counterparts(&state, profile_id, rows).await?))
}

/// GET /api/profiles/:id/requests
pub async fn handle_pending_requests(
    State(state): State<AppState>,
    Path(profile_id): Path<Uuid>,
) -> Result<Json<Vec<ConnectionView>>, AppError> {
    ensure_profile(&state, profile_id).await?;
    let rows =
        store::list_received(&state.db, profile_id, Some(ConnectionStatus::Pending)).await?;
    Ok(Json(with_counterparts(&state, profile_id, rows).await?))
}

/// GET /api/connections/sent/:profile_id
pub async fn handle_sent_connections(
    State(state): State<AppState>,
    Path(profile_id): Path<Uuid>,
) -> Result<Json<Vec<ConnectionView>>, AppError> {
    ensure_profile(&state, profile_id).await?;
    let rows = store::list_sent(&state.db, profile_id).await?;
    Ok(Json(with_counterparts(&state, profile_id, rows).await?))
}

/// GET /api/connections/received/:profile_id
pub async fn handle_received_connections(
    State(state): State<AppState>,
    Path(profile_id): Path<Uuid>,
) -> Result<Json<Vec<ConnectionView>>, AppError> {
    ensure_profile(&state, profile_id).await?;
    let rows = store::list_received(&state.db, profile_id, None).await?;
    Ok(Json(with_counterparts(&state, profile_id, rows).await?))
}

/// GET /api/profiles/:id/friends
pub async fn handle_list_friends(
    State(state): State<AppState>,
    Path(profile_id): Path<Uuid>,
) -> Result<Json<Vec<FriendEntry>>, AppError> {
    ensure_profile(&state, profile_id).await?;
    let accepted = store::list_accepted(&state.db, profile_id).await?;
    let ids = counterpart_ids(profile_id, &accepted);
    let profiles = profile_store::get_profiles_by_ids(&state.db, &ids).await?;
    Ok(Json(derive_friends(profile_id, &accepted, profiles)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_needs_both_ids() {
        let req = CreateConnectionRequest {
            sender_id: Some(Uuid::new_v4()),
            receiver_id: None,
        };
        let err = validate_request(&req).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("required")));
    }

    #[test]
    fn test_request_to_self_is_rejected() {
        let me = Uuid::new_v4();
        let req = CreateConnectionRequest {
            sender_id: Some(me),
            receiver_id: Some(me),
        };
        let err = validate_request(&req).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("yourself")));
    }

    #[test]
    fn test_valid_request_returns_pair() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let req = CreateConnectionRequest {
            sender_id: Some(a),
            receiver_id: Some(b),
        };
        assert_eq!(validate_request(&req).unwrap(), (a, b));
    }
}
