use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AuthRequest {
    pub email: String,
    pub password: String,
}

impl AuthRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_email(&self.email)?;
        if self.password.is_empty() {
            return Err(AppError::ValidationError("password should not be empty".into()));
        }
        Ok(())
    }
}

/// Minimal shape check: something on both sides of a single `@`, no whitespace.
pub fn validate_email(email: &str) -> Result<(), AppError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(AppError::ValidationError("email must be an email".into()))
    }
}

pub async fn signup(
    req: web::Json<AuthRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    req.validate()?;
    info!("Received signup request for email: {}", req.email);

    match state.auth_service.register(&req.email, &req.password).await {
        Ok(token) => {
            info!("Signup successful for email: {}", req.email);
            Ok(HttpResponse::Ok().json(token))
        }
        Err(e) => {
            warn!("Signup failed for email: {}: {}", req.email, e);
            Err(e)
        }
    }
}

pub async fn signin(
    req: web::Json<AuthRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    req.validate()?;
    info!("Received signin request for email: {}", req.email);

    match state.auth_service.authenticate(&req.email, &req.password).await {
        Ok(token) => {
            info!("Signin successful for email: {}", req.email);
            Ok(HttpResponse::Ok().json(token))
        }
        Err(e) => {
            warn!("Signin failed for email: {}: {}", req.email, e);
            Err(e)
        }
    }
}
