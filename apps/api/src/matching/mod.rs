// Match ranking for a single profile against everyone else.

pub mod handlers;
pub mod scoring;
