use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::{Bookmark, BookmarkUpdate, Identity, IdentityRecord, IdentityUpdate, NewBookmark, NewIdentity};
use super::{AccountStore, BookmarkStore};
use crate::error::DatabaseError;

#[derive(Debug, Default)]
struct Accounts {
    by_id: HashMap<Uuid, Identity>,
    by_email: HashMap<String, Uuid>,
}

/// In-process store. Every uniqueness check and the write it guards happen
/// under a single write lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    accounts: RwLock<Accounts>,
    bookmarks: RwLock<Vec<Bookmark>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn create_identity(&self, new_identity: NewIdentity) -> Result<IdentityRecord, DatabaseError> {
        let mut accounts = self.accounts.write().await;

        if accounts.by_email.contains_key(&new_identity.email) {
            return Err(DatabaseError::Duplicate);
        }

        let identity = Identity {
            id: new_identity.id,
            email: new_identity.email,
            hash: new_identity.hash,
            first_name: None,
            last_name: None,
            created_at: new_identity.created_at,
            updated_at: new_identity.created_at,
        };
        let record = IdentityRecord::from(&identity);

        accounts.by_email.insert(identity.email.clone(), identity.id);
        accounts.by_id.insert(identity.id, identity);

        Ok(record)
    }

    async fn find_identity_by_email(&self, email: &str) -> Result<Option<Identity>, DatabaseError> {
        let accounts = self.accounts.read().await;
        Ok(accounts
            .by_email
            .get(email)
            .and_then(|id| accounts.by_id.get(id))
            .cloned())
    }

    async fn find_identity_by_id(&self, id: Uuid) -> Result<Option<Identity>, DatabaseError> {
        Ok(self.accounts.read().await.by_id.get(&id).cloned())
    }

    async fn update_identity(&self, id: Uuid, changes: IdentityUpdate) -> Result<Identity, DatabaseError> {
        let mut accounts = self.accounts.write().await;

        let current_email = accounts
            .by_id
            .get(&id)
            .map(|identity| identity.email.clone())
            .ok_or(DatabaseError::NotFound)?;

        if let Some(email) = changes.email.as_ref().filter(|email| **email != current_email) {
            if accounts.by_email.contains_key(email) {
                return Err(DatabaseError::Duplicate);
            }
            accounts.by_email.remove(&current_email);
            accounts.by_email.insert(email.clone(), id);
        }

        let identity = accounts.by_id.get_mut(&id).ok_or(DatabaseError::NotFound)?;
        if let Some(email) = changes.email {
            identity.email = email;
        }
        if let Some(first_name) = changes.first_name {
            identity.first_name = Some(first_name);
        }
        if let Some(last_name) = changes.last_name {
            identity.last_name = Some(last_name);
        }
        identity.updated_at = Utc::now();

        Ok(identity.clone())
    }
}

#[async_trait]
impl BookmarkStore for MemoryStore {
    async fn list_bookmarks(&self, user_id: Uuid) -> Result<Vec<Bookmark>, DatabaseError> {
        Ok(self
            .bookmarks
            .read()
            .await
            .iter()
            .filter(|bookmark| bookmark.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_bookmark(&self, id: Uuid) -> Result<Option<Bookmark>, DatabaseError> {
        Ok(self
            .bookmarks
            .read()
            .await
            .iter()
            .find(|bookmark| bookmark.id == id)
            .cloned())
    }

    async fn create_bookmark(&self, new_bookmark: NewBookmark) -> Result<Bookmark, DatabaseError> {
        if !self.accounts.read().await.by_id.contains_key(&new_bookmark.user_id) {
            return Err(DatabaseError::QueryError(format!(
                "bookmark owner {} does not exist",
                new_bookmark.user_id
            )));
        }

        let bookmark = Bookmark {
            id: new_bookmark.id,
            user_id: new_bookmark.user_id,
            title: new_bookmark.title,
            description: new_bookmark.description,
            link: new_bookmark.link,
            created_at: new_bookmark.created_at,
            updated_at: new_bookmark.created_at,
        };
        self.bookmarks.write().await.push(bookmark.clone());

        Ok(bookmark)
    }

    async fn update_bookmark(&self, id: Uuid, changes: BookmarkUpdate) -> Result<Bookmark, DatabaseError> {
        let mut bookmarks = self.bookmarks.write().await;
        let bookmark = bookmarks
            .iter_mut()
            .find(|bookmark| bookmark.id == id)
            .ok_or(DatabaseError::NotFound)?;

        if let Some(title) = changes.title {
            bookmark.title = title;
        }
        if let Some(description) = changes.description {
            bookmark.description = Some(description);
        }
        if let Some(link) = changes.link {
            bookmark.link = link;
        }
        bookmark.updated_at = Utc::now();

        Ok(bookmark.clone())
    }

    async fn delete_bookmark(&self, id: Uuid) -> Result<(), DatabaseError> {
        let mut bookmarks = self.bookmarks.write().await;
        let before = bookmarks.len();
        bookmarks.retain(|bookmark| bookmark.id != id);

        if bookmarks.len() == before {
            return Err(DatabaseError::NotFound);
        }
        Ok(())
    }
}
