//! Data collaborator port for bookshelf modules.
//!
//! Handlers never touch storage directly. Each module is handed an
//! `Arc<dyn Collection<R>>` and matches on [`StoreError`] to tell a missing
//! record from a failing backend.

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

pub mod memory;

pub use memory::MemoryCollection;

/// A record stored in a [`Collection`], identified by a unique key.
pub trait Record: Clone + Send + Sync + 'static {
    type Key: Clone + PartialEq + fmt::Debug + Send + Sync + 'static;

    /// Partial update accepted by [`Collection::update_one`].
    type Patch: Send + 'static;

    fn key(&self) -> &Self::Key;

    /// Apply `patch` in place. The key must not change.
    fn apply(&mut self, patch: Self::Patch);
}

/// Outcome of a collection operation that did not succeed.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no matching record found")]
    NotFound,

    #[error("a record with the same key already exists")]
    Duplicate,

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Collection of records keyed by [`Record::key`].
#[async_trait]
pub trait Collection<R: Record>: Send + Sync {
    /// Every record, in insertion order.
    async fn find(&self) -> StoreResult<Vec<R>>;

    async fn find_one(&self, key: &R::Key) -> StoreResult<R>;

    /// Store `record` and return its key. Fails with [`StoreError::Duplicate`]
    /// when the key is taken.
    async fn insert_one(&self, record: R) -> StoreResult<R::Key>;

    /// Apply `patch` to the record under `key` and return the updated record.
    async fn update_one(&self, key: &R::Key, patch: R::Patch) -> StoreResult<R>;

    /// Remove the record under `key` and return it.
    async fn delete_one(&self, key: &R::Key) -> StoreResult<R>;
}
