//! HTTP API surface.
//!
//! All management routes live under `/admin/api/v1`:
//!
//! - `POST   /users` - create a user (manage-users)
//! - `GET    /users` - list users (manage-users)
//! - `GET    /users/{id}` - fetch a user (self or manage-users)
//! - `PATCH  /users/{id}` - update a user (manage-users)
//! - `DELETE /users/{id}` - delete a user (manage-users)
//! - `POST   /users/{id}/api-tokens` - issue a token
//! - `GET    /users/{id}/api-tokens` - list a user's tokens
//! - `GET    /users/{id}/api-tokens/{token_id}` - fetch a token
//! - `PATCH  /users/{id}/api-tokens/{token_id}` - rename / re-expire a token
//! - `DELETE /users/{id}/api-tokens/{token_id}` - delete a token
//!
//! `{id}` accepts the literal `current` to target the caller. All token
//! routes require `access-api`, and targeting another user additionally
//! requires `manage-users`.

pub mod handlers;
pub mod models;
