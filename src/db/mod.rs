//! Persistence layer for bookmark-server.
//!
//! The auth core and the REST handlers only talk to the [`AccountStore`] and
//! [`BookmarkStore`] traits. [`DbOperations`] backs them with Postgres,
//! [`MemoryStore`] keeps everything in process.

pub mod memory;
pub mod models;
pub mod operations;

use crate::error::DatabaseError;
use async_trait::async_trait;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use models::{Bookmark, BookmarkUpdate, Identity, IdentityRecord, IdentityUpdate, NewBookmark, NewIdentity};
pub use operations::DbOperations;

/// Storage of user identities.
///
/// Implementations must enforce email uniqueness atomically and report a
/// violation as [`DatabaseError::Duplicate`], both on create and on update.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn create_identity(&self, new_identity: NewIdentity) -> Result<IdentityRecord, DatabaseError>;

    async fn find_identity_by_email(&self, email: &str) -> Result<Option<Identity>, DatabaseError>;

    async fn find_identity_by_id(&self, id: Uuid) -> Result<Option<Identity>, DatabaseError>;

    /// Fails with [`DatabaseError::NotFound`] when no identity has `id`.
    async fn update_identity(&self, id: Uuid, changes: IdentityUpdate) -> Result<Identity, DatabaseError>;
}

#[async_trait]
pub trait BookmarkStore: Send + Sync {
    /// Bookmarks owned by `user_id`, oldest first.
    async fn list_bookmarks(&self, user_id: Uuid) -> Result<Vec<Bookmark>, DatabaseError>;

    async fn find_bookmark(&self, id: Uuid) -> Result<Option<Bookmark>, DatabaseError>;

    async fn create_bookmark(&self, new_bookmark: NewBookmark) -> Result<Bookmark, DatabaseError>;

    async fn update_bookmark(&self, id: Uuid, changes: BookmarkUpdate) -> Result<Bookmark, DatabaseError>;

    async fn delete_bookmark(&self, id: Uuid) -> Result<(), DatabaseError>;
}
