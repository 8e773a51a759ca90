// Messages exchanged over accepted connections.

pub mod handlers;
pub mod store;
