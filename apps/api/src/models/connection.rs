use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::connections::status::ConnectionStatus;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ConnectionRow {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_contact_at: Option<DateTime<Utc>>,
}

impl ConnectionRow {
    pub fn status(&self) -> Option<ConnectionStatus> {
        self.status.parse().ok()
    }

    pub fn involves(&self, profile_id: Uuid) -> bool {
        self.sender_id == profile_id || self.receiver_id == profile_id
    }

    /// The other side of the connection, seen from `profile_id`.
    pub fn counterpart_of(&self, profile_id: Uuid) -> Option<Uuid> {
        if self.sender_id == profile_id {
            Some(self.receiver_id)
        } else if self.receiver_id == profile_id {
            Some(self.sender_id)
        } else {
            None
        }
    }
}
