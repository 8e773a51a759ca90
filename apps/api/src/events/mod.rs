// Community events and their RSVPs.

pub mod handlers;
pub mod store;
pub mod validation;
