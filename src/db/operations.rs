use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::db::models::{Bookmark, BookmarkUpdate, Identity, IdentityRecord, IdentityUpdate, NewBookmark, NewIdentity};
use crate::db::{AccountStore, BookmarkStore};
use crate::error::{AppError, DatabaseError};

const IDENTITY_COLUMNS: &str = "id, email, hash, first_name, last_name, created_at, updated_at";
const BOOKMARK_COLUMNS: &str = "id, user_id, title, description, link, created_at, updated_at";

/// Postgres-backed account and bookmark store.
pub struct DbOperations {
    pool: Arc<PgPool>,
}

impl DbOperations {
    pub async fn new_with_options(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

        Ok(Self { pool: Arc::new(pool) })
    }

    pub async fn run_migrations(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations").run(self.pool.as_ref()).await?;
        info!("Database migrations applied");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl AccountStore for DbOperations {
    async fn create_identity(&self, new_identity: NewIdentity) -> Result<IdentityRecord, DatabaseError> {
        let record = sqlx::query_as::<_, IdentityRecord>(
            r#"
            INSERT INTO users (id, email, hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING id, email, created_at
            "#,
        )
        .bind(new_identity.id)
        .bind(&new_identity.email)
        .bind(&new_identity.hash)
        .bind(new_identity.created_at)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(record)
    }

    async fn find_identity_by_email(&self, email: &str) -> Result<Option<Identity>, DatabaseError> {
        let identity = sqlx::query_as::<_, Identity>(&format!(
            "SELECT {IDENTITY_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(identity)
    }

    async fn find_identity_by_id(&self, id: Uuid) -> Result<Option<Identity>, DatabaseError> {
        let identity = sqlx::query_as::<_, Identity>(&format!(
            "SELECT {IDENTITY_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(identity)
    }

    async fn update_identity(&self, id: Uuid, changes: IdentityUpdate) -> Result<Identity, DatabaseError> {
        let identity = sqlx::query_as::<_, Identity>(&format!(
            r#"
            UPDATE users
            SET email = COALESCE($2, email),
                first_name = COALESCE($3, first_name),
                last_name = COALESCE($4, last_name),
                updated_at = now()
            WHERE id = $1
            RETURNING {IDENTITY_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.email)
        .bind(changes.first_name)
        .bind(changes.last_name)
        .fetch_optional(self.pool.as_ref())
        .await?;

        identity.ok_or(DatabaseError::NotFound)
    }
}

#[async_trait]
impl BookmarkStore for DbOperations {
    async fn list_bookmarks(&self, user_id: Uuid) -> Result<Vec<Bookmark>, DatabaseError> {
        let bookmarks = sqlx::query_as::<_, Bookmark>(&format!(
            "SELECT {BOOKMARK_COLUMNS} FROM bookmarks WHERE user_id = $1 ORDER BY created_at, id"
        ))
        .bind(user_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(bookmarks)
    }

    async fn find_bookmark(&self, id: Uuid) -> Result<Option<Bookmark>, DatabaseError> {
        let bookmark = sqlx::query_as::<_, Bookmark>(&format!(
            "SELECT {BOOKMARK_COLUMNS} FROM bookmarks WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(bookmark)
    }

    async fn create_bookmark(&self, new_bookmark: NewBookmark) -> Result<Bookmark, DatabaseError> {
        let bookmark = sqlx::query_as::<_, Bookmark>(&format!(
            r#"
            INSERT INTO bookmarks (id, user_id, title, description, link, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING {BOOKMARK_COLUMNS}
            "#
        ))
        .bind(new_bookmark.id)
        .bind(new_bookmark.user_id)
        .bind(&new_bookmark.title)
        .bind(&new_bookmark.description)
        .bind(&new_bookmark.link)
        .bind(new_bookmark.created_at)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(bookmark)
    }

    async fn update_bookmark(&self, id: Uuid, changes: BookmarkUpdate) -> Result<Bookmark, DatabaseError> {
        let bookmark = sqlx::query_as::<_, Bookmark>(&format!(
            r#"
            UPDATE bookmarks
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                link = COALESCE($4, link),
                updated_at = now()
            WHERE id = $1
            RETURNING {BOOKMARK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.title)
        .bind(changes.description)
        .bind(changes.link)
        .fetch_optional(self.pool.as_ref())
        .await?;

        bookmark.ok_or(DatabaseError::NotFound)
    }

    async fn delete_bookmark(&self, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM bookmarks WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound);
        }
        Ok(())
    }
}
