use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use crate::auth::password::CredentialHasher;
use crate::auth::token::{AccessToken, TokenIssuer};
use crate::db::{AccountStore, NewIdentity};
use crate::error::{AppError, AuthError, CredentialError, DatabaseError};

/// Signup and signin on top of an [`AccountStore`].
///
/// Every call is independent; the only shared state is the store, which owns
/// the email uniqueness guarantee.
pub struct AuthService {
    accounts: Arc<dyn AccountStore>,
    hasher: CredentialHasher,
    tokens: TokenIssuer,
}

impl AuthService {
    pub fn new(accounts: Arc<dyn AccountStore>, hasher: CredentialHasher, tokens: TokenIssuer) -> Self {
        Self {
            accounts,
            hasher,
            tokens,
        }
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Creates an identity and returns a session token for it.
    #[instrument(skip(self, password))]
    pub async fn register(&self, email: &str, password: &str) -> Result<AccessToken, AppError> {
        let hash = self.hash_password(password).await?;

        let record = match self.accounts.create_identity(NewIdentity::new(email, hash)).await {
            Ok(record) => record,
            Err(DatabaseError::Duplicate) => {
                warn!("Registration rejected, email already exists");
                return Err(AuthError::DuplicateIdentity.into());
            }
            Err(e) => {
                error!("Failed to create identity: {}", e);
                return Err(AuthError::StoreFault.into());
            }
        };

        info!(identity_id = %record.id, "Identity created");
        self.tokens.sign_token(record.id, &record.email)
    }

    /// Checks the credentials and returns a fresh session token.
    ///
    /// Unknown emails and wrong passwords produce the same error.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<AccessToken, AppError> {
        let identity = match self.accounts.find_identity_by_email(email).await {
            Ok(Some(identity)) => identity,
            Ok(None) => {
                self.verify_decoy(password).await?;
                warn!("Authentication failed");
                return Err(AuthError::InvalidCredentials.into());
            }
            Err(e) => {
                error!("Failed to look up identity: {}", e);
                return Err(AuthError::StoreFault.into());
            }
        };

        match self.verify_password(identity.hash.clone(), password).await? {
            Ok(true) => {}
            Ok(false) => {
                warn!("Authentication failed");
                return Err(AuthError::InvalidCredentials.into());
            }
            Err(e) => {
                error!(identity_id = %identity.id, "Stored credential hash unusable: {}", e);
                return Err(AuthError::StoreFault.into());
            }
        }

        info!(identity_id = %identity.id, "Authentication successful");
        self.tokens.sign_token(identity.id, &identity.email)
    }

    async fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let hasher = self.hasher.clone();
        let password = password.to_owned();

        let hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AppError::InternalError(format!("hashing task failed: {}", e)))??;

        Ok(hash)
    }

    async fn verify_decoy(&self, password: &str) -> Result<(), AppError> {
        let hasher = self.hasher.clone();
        let password = password.to_owned();

        tokio::task::spawn_blocking(move || hasher.verify_decoy(&password))
            .await
            .map_err(|e| AppError::InternalError(format!("verification task failed: {}", e)))
    }

    async fn verify_password(
        &self,
        hash: String,
        password: &str,
    ) -> Result<Result<bool, CredentialError>, AppError> {
        let hasher = self.hasher.clone();
        let password = password.to_owned();

        tokio::task::spawn_blocking(move || hasher.verify(&hash, &password))
            .await
            .map_err(|e| AppError::InternalError(format!("verification task failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HashingConfig;
    use crate::db::{Identity, MemoryStore, MockAccountStore};
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    const SECRET: &str = "service-test-secret";

    fn cheap_hasher() -> CredentialHasher {
        CredentialHasher::new(&HashingConfig {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap()
    }

    fn service_with(accounts: Arc<dyn AccountStore>) -> AuthService {
        AuthService::new(accounts, cheap_hasher(), TokenIssuer::new(SECRET, Duration::days(7)))
    }

    fn auth_error(result: Result<AccessToken, AppError>) -> AuthError {
        match result {
            Err(AppError::AuthError(e)) => e,
            other => panic!("expected an auth error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_register_returns_token_for_new_identity() {
        let store = Arc::new(MemoryStore::new());
        let service = service_with(store.clone());

        let token = service.register("a@x.com", "1234").await.unwrap();
        let claims = service.tokens().verify_token(&token.access_token).unwrap();

        let identity = store.find_identity_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(claims.sub, identity.id.to_string());
        assert_eq!(claims.email, "a@x.com");
        assert_ne!(identity.hash, "1234");
        assert!(identity.hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let service = service_with(Arc::new(MemoryStore::new()));
        service.register("a@x.com", "1234").await.unwrap();

        let err = auth_error(service.register("a@x.com", "another").await);
        assert_eq!(err, AuthError::DuplicateIdentity);
        assert_eq!(err.to_string(), "Email already exists");
    }

    #[tokio::test]
    async fn test_authenticate() {
        let service = service_with(Arc::new(MemoryStore::new()));
        let registered = service.register("a@x.com", "1234").await.unwrap();

        let token = service.authenticate("a@x.com", "1234").await.unwrap();
        let signin_claims = service.tokens().verify_token(&token.access_token).unwrap();
        let signup_claims = service.tokens().verify_token(&registered.access_token).unwrap();
        assert_eq!(signin_claims.sub, signup_claims.sub);
    }

    #[tokio::test]
    async fn test_authenticate_failures_are_indistinguishable() {
        let service = service_with(Arc::new(MemoryStore::new()));
        service.register("a@x.com", "1234").await.unwrap();

        let wrong_password = service.authenticate("a@x.com", "wrong").await.unwrap_err();
        let unknown_email = service.authenticate("nobody@x.com", "1234").await.unwrap_err();

        assert!(matches!(wrong_password, AppError::AuthError(AuthError::InvalidCredentials)));
        assert!(matches!(unknown_email, AppError::AuthError(AuthError::InvalidCredentials)));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        assert_eq!(wrong_password.public_message(), "Wrong credentials");
    }

    #[tokio::test]
    async fn test_concurrent_registration_single_success() {
        let service = Arc::new(service_with(Arc::new(MemoryStore::new())));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let service = service.clone();
                tokio::spawn(async move { service.register("race@x.com", &format!("secret-{}", i)).await })
            })
            .collect();

        let mut successes = 0;
        let mut duplicates = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(AppError::AuthError(AuthError::DuplicateIdentity)) => duplicates += 1,
                Err(e) => panic!("unexpected error: {:?}", e),
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(duplicates, 7);
    }

    #[tokio::test]
    async fn test_store_fault_on_register_hides_details() {
        let mut accounts = MockAccountStore::new();
        accounts
            .expect_create_identity()
            .times(1)
            .returning(|_| Err(DatabaseError::QueryError("deadlock detected on users_pkey".into())));
        let service = service_with(Arc::new(accounts));

        let err = service.register("a@x.com", "1234").await.unwrap_err();
        assert!(matches!(err, AppError::AuthError(AuthError::StoreFault)));
        assert_eq!(err.public_message(), "Something went wrong");
        assert!(!err.to_string().contains("users_pkey"));
    }

    #[tokio::test]
    async fn test_store_fault_on_authenticate() {
        let mut accounts = MockAccountStore::new();
        accounts
            .expect_find_identity_by_email()
            .returning(|_| Err(DatabaseError::ConnectionError("pool timed out".into())));
        let service = service_with(Arc::new(accounts));

        let err = auth_error(service.authenticate("a@x.com", "1234").await);
        assert_eq!(err, AuthError::StoreFault);
    }

    #[tokio::test]
    async fn test_unknown_email_still_runs_a_verification() {
        let mut accounts = MockAccountStore::new();
        accounts
            .expect_find_identity_by_email()
            .times(1)
            .returning(|_| Ok(None));
        let service = service_with(Arc::new(accounts));

        let err = auth_error(service.authenticate("ghost@x.com", "1234").await);
        assert_eq!(err, AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_corrupt_stored_hash_is_a_store_fault() {
        let mut accounts = MockAccountStore::new();
        accounts.expect_find_identity_by_email().returning(|email| {
            let now = Utc::now();
            Ok(Some(Identity {
                id: Uuid::new_v4(),
                email: email.to_string(),
                hash: "plaintext-by-mistake".to_string(),
                first_name: None,
                last_name: None,
                created_at: now,
                updated_at: now,
            }))
        });
        let service = service_with(Arc::new(accounts));

        let err = auth_error(service.authenticate("a@x.com", "plaintext-by-mistake").await);
        assert_eq!(err, AuthError::StoreFault);
    }

    #[tokio::test]
    async fn test_register_never_stores_plaintext() {
        let mut accounts = MockAccountStore::new();
        accounts
            .expect_create_identity()
            .withf(|new_identity| new_identity.email == "a@x.com" && !new_identity.hash.contains("hunter2"))
            .returning(|new_identity| {
                Ok(crate::db::IdentityRecord {
                    id: new_identity.id,
                    email: new_identity.email,
                    created_at: new_identity.created_at,
                })
            });
        let service = service_with(Arc::new(accounts));

        assert!(service.register("a@x.com", "hunter2").await.is_ok());
    }
}
