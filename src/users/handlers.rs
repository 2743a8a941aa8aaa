use actix_web::{web, HttpResponse};
use tracing::{error, info};

use crate::auth::handlers::validate_email;
use crate::auth::AuthenticatedUser;
use crate::db::IdentityUpdate;
use crate::error::{AppError, AuthError, DatabaseError};
use crate::AppState;

pub async fn get_me(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    // A valid token for a vanished account is no better than a forged one.
    let identity = state
        .accounts
        .find_identity_by_id(user.id)
        .await?
        .ok_or(AuthError::InvalidToken)?;

    Ok(HttpResponse::Ok().json(identity))
}

pub async fn edit_user(
    user: AuthenticatedUser,
    req: web::Json<IdentityUpdate>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let changes = req.into_inner();
    if let Some(email) = &changes.email {
        validate_email(email)?;
    }

    match state.accounts.update_identity(user.id, changes).await {
        Ok(identity) => {
            info!("Profile updated for identity: {}", identity.id);
            Ok(HttpResponse::Ok().json(identity))
        }
        Err(DatabaseError::Duplicate) => Err(AuthError::DuplicateIdentity.into()),
        Err(DatabaseError::NotFound) => Err(AuthError::InvalidToken.into()),
        Err(e) => {
            error!("Profile update failed for identity {}: {}", user.id, e);
            Err(e.into())
        }
    }
}
