use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::connections::status::ConnectionStatus;
use crate::models::connection::ConnectionRow;
use crate::models::profile::{ProfileRow, ProfileSummary};

/// A connection as seen by one of its parties.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionView {
    #[serde(flatten)]
    pub connection: ConnectionRow,
    pub direction: Direction,
    pub counterpart: Option<ProfileSummary>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Sent,
    Received,
}

/// An entry of the derived friends view: the other profile of an accepted
/// connection.
#[derive(Debug, Clone, Serialize)]
pub struct FriendEntry {
    pub connection_id: Uuid,
    pub connected_at: DateTime<Utc>,
    #[serde(flatten)]
    pub profile: ProfileRow,
}

/// Pairs each connection with the summary of the profile on the other side.
/// Connections not involving `viewer` are skipped.
pub fn attach_counterparts(
    viewer: Uuid,
    connections: Vec<ConnectionRow>,
    summaries: Vec<ProfileSummary>,
) -> Vec<ConnectionView> {
    let by_id: HashMap<Uuid, ProfileSummary> =
        summaries.into_iter().map(|s| (s.id, s)).collect();

    connections
        .into_iter()
        .filter_map(|connection| {
            let other = connection.counterpart_of(viewer)?;
            let direction = if connection.sender_id == viewer {
                Direction::Sent
            } else {
                Direction::Received
            };
            Some(ConnectionView {
                counterpart: by_id.get(&other).cloned(),
                direction,
                connection,
            })
        })
        .collect()
}

/// Ids of the profiles on the other side of `connections`, deduplicated, in
/// first-seen order.
pub fn counterpart_ids(viewer: Uuid, connections: &[ConnectionRow]) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = Vec::new();
    for id in connections.iter().filter_map(|c| c.counterpart_of(viewer)) {
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

/// Builds the friends list from accepted connections, keeping the order of
/// `accepted` (most recently updated first when loaded from the store).
pub fn derive_friends(
    viewer: Uuid,
    accepted: &[ConnectionRow],
    profiles: Vec<ProfileRow>,
) -> Vec<FriendEntry> {
    let mut by_id: HashMap<Uuid, ProfileRow> = profiles.into_iter().map(|p| (p.id, p)).collect();

    accepted
        .iter()
        .filter(|c| c.status() == Some(ConnectionStatus::Accepted))
        .filter_map(|c| {
            let other = c.counterpart_of(viewer)?;
            let profile = by_id.remove(&other)?;
            Some(FriendEntry {
                connection_id: c.id,
                connected_at: c.updated_at,
                profile,
            })
        })
        .collect()
}
