//! Common CRUD interface implemented by every repository.

use crate::db::errors::DbError;

/// A repository owns the SQL for one entity and exposes typed CRUD
/// operations over a borrowed connection, so callers decide transaction
/// boundaries.
#[async_trait::async_trait]
pub trait Repository {
    type CreateRequest;
    type UpdateRequest;
    type Response;
    type Id;
    type Filter;

    /// Insert a new record and return it.
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response, DbError>;

    /// Fetch a record by id, `None` if absent.
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>, DbError>;

    /// List records matching a filter.
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>, DbError>;

    /// Update a record, returning the new state. `DbError::NotFound` if absent.
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response, DbError>;

    /// Delete a record. Returns whether a record was deleted.
    async fn delete(&mut self, id: Self::Id) -> Result<bool, DbError>;
}
