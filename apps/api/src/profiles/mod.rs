// Profile CRUD and browsing.
// Tags live in their own tables and are folded back into arrays on read.

pub mod filter;
pub mod handlers;
pub mod store;
pub mod validation;
