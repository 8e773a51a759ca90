pub mod connection;
pub mod event;
pub mod message;
pub mod profile;
