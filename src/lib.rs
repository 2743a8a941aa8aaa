pub mod auth;
pub mod bookmarks;
pub mod config;
pub mod db;
pub mod error;
pub mod users;

use std::sync::Arc;
use std::time::Duration;

use actix_web::{web, HttpResponse};
use tracing::info;

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use config::Settings;

pub use auth::{AuthService, AuthenticatedUser, CredentialHasher, TokenIssuer};
pub use db::{AccountStore, BookmarkStore, DbOperations, MemoryStore};

use config::StoreBackend;

/// Health check endpoint handler
/// Returns a JSON response with server status and timestamp
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Application state shared across all components
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub auth_service: Arc<AuthService>,
    pub accounts: Arc<dyn AccountStore>,
    pub bookmarks: Arc<dyn BookmarkStore>,
}

impl AppState {
    /// Connects the configured store backend and wires the auth core to it.
    pub async fn new(config: Settings) -> Result<Self> {
        match config.database.backend {
            StoreBackend::Postgres => {
                let db = Arc::new(
                    DbOperations::new_with_options(
                        &config.database.url,
                        config.database.max_connections,
                        Duration::from_secs(config.database.acquire_timeout_secs),
                    )
                    .await?,
                );
                db.run_migrations().await?;
                info!("Connected to Postgres store");
                Self::with_stores(config, db.clone(), db)
            }
            StoreBackend::Memory => {
                let store = Arc::new(MemoryStore::new());
                info!("Using in-memory store; data will not survive a restart");
                Self::with_stores(config, store.clone(), store)
            }
        }
    }

    pub fn with_stores(
        config: Settings,
        accounts: Arc<dyn AccountStore>,
        bookmarks: Arc<dyn BookmarkStore>,
    ) -> Result<Self> {
        let hasher = CredentialHasher::new(&config.hashing)?;
        let tokens = TokenIssuer::from_config(&config.auth)?;
        let auth_service = AuthService::new(accounts.clone(), hasher, tokens);

        Ok(Self {
            config: Arc::new(config),
            auth_service: Arc::new(auth_service),
            accounts,
            bookmarks,
        })
    }
}

/// Malformed JSON bodies become 400 validation errors with the usual error body.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::ValidationError(err.to_string()).into())
}

/// Registers every route of the service.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .route("/health", web::get().to(health_check))
        .service(
            web::scope("/auth")
                .route("/signup", web::post().to(auth::handlers::signup))
                .route("/signin", web::post().to(auth::handlers::signin)),
        )
        .service(
            web::scope("/user")
                .route("/me", web::get().to(users::handlers::get_me))
                .route("", web::patch().to(users::handlers::edit_user)),
        )
        .service(
            web::scope("/bookmarks")
                .route("", web::get().to(bookmarks::handlers::list_bookmarks))
                .route("", web::post().to(bookmarks::handlers::create_bookmark))
                .route("/{id}", web::get().to(bookmarks::handlers::get_bookmark))
                .route("/{id}", web::patch().to(bookmarks::handlers::edit_bookmark))
                .route("/{id}", web::delete().to(bookmarks::handlers::delete_bookmark)),
        );
}
