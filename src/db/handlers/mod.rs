//! Repositories: one per entity, all implementing [`Repository`].

pub mod repository;
pub mod tokens;
pub mod users;

pub use repository::Repository;
pub use tokens::ApiTokens;
pub use users::Users;
