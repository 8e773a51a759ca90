// Connection requests between profiles and the friends view derived from them.
// A connection is unique per unordered pair and moves pending → accepted | declined.

pub mod handlers;
pub mod status;
pub mod store;
pub mod views;
