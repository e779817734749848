//! API-layer request and response models.

pub mod tokens;
pub mod users;
