//! Request handlers for the management API.

pub mod tokens;
pub mod users;
