use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An event together with how many profiles are attending. Declined RSVPs
/// are not counted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EventRow {
    pub id: Uuid,
    pub created_by: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub event_date: DateTime<Utc>,
    pub max_participants: Option<i32>,
    pub category: Option<String>,
    pub participant_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EventRow {
    /// Remaining places, or `None` for an event without a cap.
    pub fn available_spots(&self) -> Option<i64> {
        available_spots(self.max_participants, self.participant_count)
    }

    pub fn is_full(&self) -> bool {
        is_full(self.max_participants, self.participant_count)
    }
}

pub fn available_spots(max_participants: Option<i32>, taken: i64) -> Option<i64> {
    max_participants.map(|max| (i64::from(max) - taken).max(0))
}

pub fn is_full(max_participants: Option<i32>, taken: i64) -> bool {
    max_participants.is_some_and(|max| taken >= i64::from(max))
}

/// Whether a cap leaves room for everyone already attending.
pub fn cap_fits(max_participants: Option<i32>, attending: i64) -> bool {
    max_participants.map_or(true, |max| i64::from(max) >= attending)
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ParticipantRow {
    pub profile_id: Uuid,
    pub name: String,
    pub city: Option<String>,
    pub status: String,
    pub joined_at: DateTime<Utc>,
}
