pub mod health;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::connections::handlers as connections;
use crate::errors::AppError;
use crate::events::handlers as events;
use crate::matching::handlers as matching;
use crate::messages::handlers as messages;
use crate::profiles::handlers as profiles;
use crate::state::AppState;

async fn route_not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/health", get(health::health_handler))
        // Profiles
        .route(
            "/api/profiles",
            get(profiles::handle_list_profiles).post(profiles::handle_create_profile),
        )
        .route("/api/profiles/filter", post(profiles::handle_filter_profiles))
        .route(
            "/api/profiles/:id",
            get(profiles::handle_get_profile)
                .put(profiles::handle_update_profile)
                .delete(profiles::handle_delete_profile),
        )
        .route("/api/profiles/:id/filter", get(profiles::handle_filter_others))
        .route("/api/profiles/:id/matches", get(matching::handle_get_matches))
        // Connections
        .route(
            "/api/profiles/:id/connections",
            get(connections::handle_list_connections),
        )
        .route(
            "/api/profiles/:id/requests",
            get(connections::handle_pending_requests),
        )
        .route("/api/profiles/:id/friends", get(connections::handle_list_friends))
        .route("/api/connections", post(connections::handle_create_connection))
        .route(
            "/api/connections/:id",
            put(connections::handle_update_connection)
                .delete(connections::handle_delete_connection),
        )
        .route(
            "/api/connections/sent/:profile_id",
            get(connections::handle_sent_connections),
        )
        .route(
            "/api/connections/received/:profile_id",
            get(connections::handle_received_connections),
        )
        .route(
            "/api/connections/friends/:profile_id",
            get(connections::handle_list_friends),
        )
        // Messages
        .route(
            "/api/connections/:id/messages",
            get(messages::handle_list_messages).post(messages::handle_send_message),
        )
        .route(
            "/api/connections/:id/messages/read",
            put(messages::handle_mark_read),
        )
        // Events
        .route(
            "/api/events",
            get(events::handle_list_events).post(events::handle_create_event),
        )
        .route(
            "/api/events/:id",
            get(events::handle_get_event)
                .put(events::handle_update_event)
                .delete(events::handle_delete_event),
        )
        .route("/api/events/:id/join", post(events::handle_join_event))
        .route(
            "/api/events/:id/participants/:profile_id",
            delete(events::handle_leave_event),
        )
        .fallback(route_not_found)
        .with_state(state)
}
