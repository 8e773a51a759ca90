use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Pending,
    Accepted,
    Declined,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Pending => "pending",
            ConnectionStatus::Accepted => "accepted",
            ConnectionStatus::Declined => "declined",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ConnectionStatus::Pending),
            "accepted" => Ok(ConnectionStatus::Accepted),
            "declined" => Ok(ConnectionStatus::Declined),
            other => Err(format!("unknown connection status '{other}'")),
        }
    }
}

/// Parses the `status` of a `PUT /api/connections/:id` body. Only the two
/// terminal states are valid targets.
pub fn parse_target(raw: Option<&str>) -> Result<ConnectionStatus, AppError> {
    match raw.map(str::trim).map(str::to_lowercase).as_deref() {
        Some("accepted") => Ok(ConnectionStatus::Accepted),
        Some("declined") => Ok(ConnectionStatus::Declined),
        _ => Err(AppError::Validation(
            "Valid status required (accepted or declined)".to_string(),
        )),
    }
}

/// A request is answered once: pending → accepted | declined.
pub fn check_transition(
    current: ConnectionStatus,
    target: ConnectionStatus,
) -> Result<(), AppError> {
    match (current, target) {
        (ConnectionStatus::Pending, ConnectionStatus::Accepted | ConnectionStatus::Declined) => {
            Ok(())
        }
        (ConnectionStatus::Pending, ConnectionStatus::Pending) => Err(AppError::Validation(
            "Connection is already pending".to_string(),
        )),
        (current, _) => Err(AppError::Validation(format!(
            "Connection has already been {current}"
        ))),
    }
}
