use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::events::store::{self, EventUpdate, JoinOutcome};
use crate::events::validation::{
    parse_rsvp, validate_event_update, validate_new_event, CreateEventRequest, UpdateEventRequest,
};
use crate::models::event::{EventRow, ParticipantRow};
use crate::profiles::handlers::profile_not_found;
use crate::profiles::store as profile_store;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct EventQuery {
    pub category: Option<String>,
    pub include_past: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct JoinEventRequest {
    pub profile_id: Option<Uuid>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventView {
    #[serde(flatten)]
    pub event: EventRow,
    pub available_spots: Option<i64>,
    pub is_full: bool,
}

impl From<EventRow> for EventView {
    fn from(event: EventRow) -> Self {
        EventView {
            available_spots: event.available_spots(),
            is_full: event.is_full(),
            event,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EventDetail {
    #[serde(flatten)]
    pub event: EventView,
    pub participants: Vec<ParticipantRow>,
}

fn event_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Event {id} not found"))
}

/// GET /api/events
pub async fn handle_list_events(
    State(state): State<AppState>,
    Query(query): Query<EventQuery>,
) -> Result<Json<Vec<EventView>>, AppError> {
    let category = query
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());
    let include_past = query.include_past.unwrap_or(false);

    let events = store::list_events(&state.db, category, include_past).await?;
    debug!(
        "Listed {} event(s) (category: {category:?}, include_past: {include_past})",
        events.len()
    );
    Ok(Json(events.into_iter().map(EventView::from).collect()))
}

/// POST /api/events
pub async fn handle_create_event(
    State(state): State<AppState>,
    Json(req): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<EventView>), AppError> {
    let new = validate_new_event(req)?;
    if !profile_store::profile_exists(&state.db, new.created_by).await? {
        return Err(profile_not_found(new.created_by));
    }
    let event = store::create_event(&state.db, &new).await?;
    Ok((StatusCode::CREATED, Json(event.into())))
}

/// GET /api/events/:id
pub async fn handle_get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EventDetail>, AppError> {
    let event = store::get_event(&state.db, id)
        .await?
        .ok_or_else(|| event_not_found(id))?;
    let participants = store::list_participants(&state.db, id).await?;
    Ok(Json(EventDetail {
        event: event.into(),
        participants,
    }))
}

/// PUT /api/events/:id
pub async fn handle_update_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateEventRequest>,
) -> Result<Json<EventView>, AppError> {
    let changes = validate_event_update(req)?;
    match store::update_event(&state.db, id, &changes).await? {
        EventUpdate::Updated(event) => Ok(Json(event.into())),
        EventUpdate::Missing => Err(event_not_found(id)),
        EventUpdate::BelowAttendance { attending } => Err(AppError::Validation(format!(
            "max_participants cannot be lower than the {attending} current participants"
        ))),
    }
}

/// DELETE /api/events/:id
pub async fn handle_delete_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !store::delete_event(&state.db, id).await? {
        return Err(event_not_found(id));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/events/:id/join
pub async fn handle_join_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<JoinEventRequest>,
) -> Result<(StatusCode, Json<ParticipantRow>), AppError> {
    let profile_id = req
        .profile_id
        .ok_or_else(|| AppError::Validation("profile_id is required".to_string()))?;
    let status = parse_rsvp(req.status.as_deref())?;

    if !profile_store::profile_exists(&state.db, profile_id).await? {
        return Err(profile_not_found(profile_id));
    }

    match store::join_event(&state.db, id, profile_id, status).await? {
        JoinOutcome::Joined(participant) => Ok((StatusCode::CREATED, Json(participant))),
        JoinOutcome::EventMissing => Err(event_not_found(id)),
        JoinOutcome::AlreadyJoined => Err(AppError::Validation(
            "Profile has already joined this event".to_string(),
        )),
        JoinOutcome::Full => Err(AppError::Validation("Event is full".to_string())),
    }
}

/// DELETE /api/events/:id/participants/:profile_id
pub async fn handle_leave_event(
    State(state): State<AppState>,
    Path((id, profile_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    if !store::leave_event(&state.db, id, profile_id).await? {
        return Err(AppError::NotFound(format!(
            "Profile {profile_id} is not a participant of event {id}"
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}
