//! Database-layer request/response models.

pub mod tokens;
pub mod users;
