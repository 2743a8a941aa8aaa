use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::{info, warn};
use url::Url;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::db::{Bookmark, BookmarkUpdate, NewBookmark};
use crate::error::{AppError, AuthError, DatabaseError};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateBookmarkRequest {
    pub title: String,
    pub description: Option<String>,
    pub link: String,
}

impl CreateBookmarkRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_title(&self.title)?;
        validate_link(&self.link)
    }
}

fn validate_title(title: &str) -> Result<(), AppError> {
    if title.trim().is_empty() {
        return Err(AppError::ValidationError("title should not be empty".into()));
    }
    Ok(())
}

fn validate_link(link: &str) -> Result<(), AppError> {
    Url::parse(link)
        .map(|_| ())
        .map_err(|e| AppError::ValidationError(format!("link must be an absolute URL: {}", e)))
}

fn validate_update(changes: &BookmarkUpdate) -> Result<(), AppError> {
    if let Some(title) = &changes.title {
        validate_title(title)?;
    }
    if let Some(link) = &changes.link {
        validate_link(link)?;
    }
    Ok(())
}

/// Loads a bookmark for modification. Missing and foreign bookmarks are
/// both reported as forbidden.
async fn owned_bookmark(state: &AppState, user: &AuthenticatedUser, id: Uuid) -> Result<Bookmark, AppError> {
    match state.bookmarks.find_bookmark(id).await? {
        Some(bookmark) if bookmark.user_id == user.id => Ok(bookmark),
        _ => {
            warn!("Identity {} denied access to bookmark {}", user.id, id);
            Err(AuthError::Forbidden.into())
        }
    }
}

pub async fn list_bookmarks(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let bookmarks = state.bookmarks.list_bookmarks(user.id).await?;
    Ok(HttpResponse::Ok().json(bookmarks))
}

pub async fn create_bookmark(
    user: AuthenticatedUser,
    req: web::Json<CreateBookmarkRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    req.validate()?;
    let req = req.into_inner();

    let bookmark = state
        .bookmarks
        .create_bookmark(NewBookmark::new(user.id, req.title, req.description, req.link))
        .await?;

    info!("Bookmark {} created for identity {}", bookmark.id, user.id);
    Ok(HttpResponse::Created().json(bookmark))
}

pub async fn get_bookmark(
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    match state.bookmarks.find_bookmark(id).await? {
        Some(bookmark) if bookmark.user_id == user.id => Ok(HttpResponse::Ok().json(bookmark)),
        _ => Err(DatabaseError::NotFound.into()),
    }
}

pub async fn edit_bookmark(
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    req: web::Json<BookmarkUpdate>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let changes = req.into_inner();
    validate_update(&changes)?;

    let bookmark = owned_bookmark(&state, &user, path.into_inner()).await?;
    let updated = state.bookmarks.update_bookmark(bookmark.id, changes).await?;

    Ok(HttpResponse::Ok().json(updated))
}

pub async fn delete_bookmark(
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let bookmark = owned_bookmark(&state, &user, path.into_inner()).await?;
    state.bookmarks.delete_bookmark(bookmark.id).await?;

    info!("Bookmark {} deleted by identity {}", bookmark.id, user.id);
    Ok(HttpResponse::NoContent().finish())
}
