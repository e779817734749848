//! Database layer.
//!
//! Access goes through repositories ([`handlers`]) which own the SQL for
//! their entity and translate sqlx failures into [`errors::DbError`]. The
//! request/response structs live in [`models`], separate from the API-layer
//! models so wire formats and storage shapes can evolve independently.

pub mod errors;
pub mod handlers;
pub mod models;
