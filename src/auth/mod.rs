//! Authentication and authorization.
//!
//! - [`current_user`]: resolves the caller from a trusted proxy header.
//! - [`hashing`]: Argon2 hashing for client secrets.
//! - [`permissions`]: capability checks used by the handlers.

pub mod current_user;
pub mod hashing;
pub mod permissions;
