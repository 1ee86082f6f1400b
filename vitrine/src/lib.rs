//! # Vitrine
//!
//! Vitrine is a professional directory service: public profiles with
//! specialties and locations, third-party reviews aggregated into a
//! one-decimal reputation score, media galleries, opaque-token
//! sessions, and a signed single-use password-recovery flow.
//!
//! All state lives behind a [`RepositoryProvider`]; the two bundled
//! backends (SQLite and an in-process document store) present
//! identical observable semantics, so callers choose a backend on
//! deployment shape alone.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vitrine::{TokenConfig, Vitrine};
//! use vitrine_storage_sqlite::SqliteRepositoryProvider;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = sqlx::SqlitePool::connect("sqlite::memory:").await?;
//!     let repositories = Arc::new(SqliteRepositoryProvider::new(pool));
//!
//!     let vitrine = Vitrine::new(repositories, TokenConfig::new(b"signing-secret".to_vec()));
//!     vitrine.migrate().await?;
//!
//!     let directory = vitrine.list_directory().await?;
//!     println!("{} listed accounts", directory.len());
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Deserialize;

use vitrine_core::{
    assets::{AssetStore, LocalAssetStore, is_allowed_media},
    error::{AuthError, ValidationError},
    mailer::{Mailer, TracingMailer},
    repositories::{
        AccountRepositoryAdapter, RepositoryProvider, SessionRepositoryAdapter,
    },
    services::{AccountService, RecoveryService, SessionService},
};

/// Re-export core types commonly used with the Vitrine API.
pub use vitrine_core::{
    Account, AccountId, Error, GalleryOp, ProfileChanges, Review, Session, SessionToken,
    TokenConfig,
    services::{FederatedIdentity, RegisterAccount},
};

/// Re-export storage backends behind their feature gates.
#[cfg(feature = "sqlite")]
pub use vitrine_storage_sqlite::SqliteRepositoryProvider;

#[cfg(feature = "document")]
pub use vitrine_storage_document::DocumentRepositoryProvider;

/// Review input as submitted by a visitor. The timestamp is optional
/// on the wire; the server fills in the current time when absent.
#[derive(Debug, Clone, Deserialize)]
pub struct NewReview {
    pub rating: f64,
    pub name: String,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

impl From<NewReview> for Review {
    fn from(new: NewReview) -> Self {
        Review {
            rating: new.rating,
            name: new.name,
            comment: new.comment,
            date: new
                .date
                .unwrap_or_else(|| Utc::now().to_rfc3339()),
        }
    }
}

/// Session lifetime configuration.
pub struct SessionConfig {
    /// The duration until a session expires.
    pub expires_in: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            expires_in: Duration::days(30),
        }
    }
}

impl SessionConfig {
    /// Set the session expiration time.
    pub fn expires_in(mut self, duration: Duration) -> Self {
        self.expires_in = duration;
        self
    }
}

/// The directory service coordinator.
///
/// `Vitrine` wires the account, session, and recovery services to a
/// single repository provider and exposes the full external surface:
/// registration, login (password and federated), sessions, profile and
/// gallery updates, reviews, the public listing, admin deletion, media
/// upload, and password recovery.
pub struct Vitrine<R: RepositoryProvider> {
    repositories: Arc<R>,
    account_service: Arc<AccountService<AccountRepositoryAdapter<R>>>,
    session_service: Arc<SessionService<SessionRepositoryAdapter<R>>>,
    recovery_service: Arc<RecoveryService<AccountRepositoryAdapter<R>>>,
    asset_store: Arc<dyn AssetStore>,
    token_config: TokenConfig,
    mailer: Arc<dyn Mailer>,
    reset_base_url: String,
    session_config: SessionConfig,
}

impl<R: RepositoryProvider> Vitrine<R> {
    /// Create a new Vitrine instance over a repository provider.
    ///
    /// Defaults: 30-day sessions, the logging mailer, a local asset
    /// store rooted at `uploads/`, and reset links under `/reset`.
    /// Override with the `with_*` builders.
    pub fn new(repositories: Arc<R>, token_config: TokenConfig) -> Self {
        let mailer: Arc<dyn Mailer> = Arc::new(TracingMailer);
        let reset_base_url = "/reset".to_string();

        let account_repo = Arc::new(AccountRepositoryAdapter::new(repositories.clone()));
        let session_repo = Arc::new(SessionRepositoryAdapter::new(repositories.clone()));

        Self {
            repositories: repositories.clone(),
            account_service: Arc::new(AccountService::new(account_repo.clone())),
            session_service: Arc::new(SessionService::new(session_repo)),
            recovery_service: Arc::new(RecoveryService::new(
                account_repo,
                token_config.clone(),
                mailer.clone(),
                reset_base_url.clone(),
            )),
            asset_store: Arc::new(LocalAssetStore::new("uploads", "/uploads")),
            token_config,
            mailer,
            reset_base_url,
            session_config: SessionConfig::default(),
        }
    }

    /// Set the session configuration.
    pub fn with_session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Replace the outbound mail transport.
    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = mailer;
        self.rebuild_recovery();
        self
    }

    /// Set the base URL embedded in password-reset links.
    pub fn with_reset_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.reset_base_url = base_url.into();
        self.rebuild_recovery();
        self
    }

    /// Replace the media asset store.
    pub fn with_asset_store(mut self, store: Arc<dyn AssetStore>) -> Self {
        self.asset_store = store;
        self
    }

    fn rebuild_recovery(&mut self) {
        self.recovery_service = Arc::new(RecoveryService::new(
            Arc::new(AccountRepositoryAdapter::new(self.repositories.clone())),
            self.token_config.clone(),
            self.mailer.clone(),
            self.reset_base_url.clone(),
        ));
    }

    /// Run the provider's schema setup. Idempotent.
    pub async fn migrate(&self) -> Result<(), Error> {
        self.repositories.migrate().await
    }

    /// Check connectivity to the underlying storage.
    pub async fn health_check(&self) -> Result<(), Error> {
        self.repositories.health_check().await
    }

    /// Register a new account.
    pub async fn register(&self, request: RegisterAccount) -> Result<Account, Error> {
        self.account_service.register(request).await
    }

    /// Create the administrator account. Seed path; the reserved
    /// specialty keeps it out of the public listing.
    pub async fn create_admin(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Account, Error> {
        self.account_service.create_admin(email, password, name).await
    }

    /// Authenticate by email or display name and open a session.
    pub async fn login(
        &self,
        identifier: &str,
        password: &str,
        user_agent: Option<String>,
        ip_address: Option<String>,
    ) -> Result<(Account, Session), Error> {
        let account = self
            .account_service
            .authenticate(identifier, password)
            .await?;
        let session = self
            .session_service
            .create_session(
                &account.id,
                user_agent,
                ip_address,
                self.session_config.expires_in,
            )
            .await?;

        Ok((account, session))
    }

    /// Log in with an externally verified identity assertion, creating
    /// a placeholder account on first contact. Returns whether the
    /// account was newly created.
    pub async fn federated_login(
        &self,
        identity: &FederatedIdentity,
        user_agent: Option<String>,
        ip_address: Option<String>,
    ) -> Result<(Account, Session, bool), Error> {
        let (account, is_new) = self
            .account_service
            .find_or_create_federated(identity)
            .await?;
        let session = self
            .session_service
            .create_session(
                &account.id,
                user_agent,
                ip_address,
                self.session_config.expires_in,
            )
            .await?;

        Ok((account, session, is_new))
    }

    /// Resolve the account behind a session token. Never errors: an
    /// unknown, expired, or storage-failing lookup is simply "no
    /// current user".
    pub async fn current_account(&self, token: &SessionToken) -> Option<Account> {
        let session = match self.session_service.get_session(token).await {
            Ok(Some(session)) => session,
            Ok(None) => return None,
            Err(e) => {
                tracing::debug!(error = %e, "session lookup failed");
                return None;
            }
        };

        match self.account_service.get_account(&session.account_id).await {
            Ok(account) => account,
            Err(e) => {
                tracing::debug!(error = %e, "account lookup failed");
                None
            }
        }
    }

    /// End a session. Idempotent; an unknown token is not an error.
    pub async fn logout(&self, token: &SessionToken) -> Result<(), Error> {
        self.session_service.delete_session(token).await
    }

    /// Apply a partial profile update for the session's account.
    pub async fn update_profile(
        &self,
        token: &SessionToken,
        changes: &ProfileChanges,
    ) -> Result<Account, Error> {
        let account = self.require_account(token).await?;
        self.account_service
            .update_profile(&account.id, changes)
            .await
    }

    /// The public directory: listed accounts in creation order.
    pub async fn list_directory(&self) -> Result<Vec<Account>, Error> {
        self.account_service.list_directory().await
    }

    /// Append a visitor review to an account and return the recomputed
    /// `(rating, review_count)` pair.
    pub async fn add_review(
        &self,
        id: &AccountId,
        review: NewReview,
    ) -> Result<(f64, u32), Error> {
        self.account_service.add_review(id, review.into()).await
    }

    /// Store an upload and return its public URL for use as a gallery
    /// entry.
    pub async fn upload_asset(&self, filename: &str, bytes: &[u8]) -> Result<String, Error> {
        if !is_allowed_media(filename) {
            return Err(
                ValidationError::UnsupportedMediaType(filename.to_string()).into(),
            );
        }
        if bytes.is_empty() {
            return Err(ValidationError::EmptyUpload.into());
        }

        self.asset_store.store(filename, bytes).await
    }

    /// Append entries to the session account's gallery.
    pub async fn add_gallery_items(
        &self,
        token: &SessionToken,
        urls: Vec<String>,
    ) -> Result<Vec<String>, Error> {
        let account = self.require_account(token).await?;
        self.account_service
            .mutate_gallery(&account.id, GalleryOp::Add(urls))
            .await
    }

    /// Remove the first value-equal entry from the session account's
    /// gallery; a no-op when absent.
    pub async fn remove_gallery_item(
        &self,
        token: &SessionToken,
        url: &str,
    ) -> Result<Vec<String>, Error> {
        let account = self.require_account(token).await?;
        self.account_service
            .mutate_gallery(&account.id, GalleryOp::Remove(url.to_string()))
            .await
    }

    /// Hard-delete an account. The session must belong to an admin,
    /// and an admin cannot delete themself.
    pub async fn admin_delete_account(
        &self,
        token: &SessionToken,
        target: &AccountId,
    ) -> Result<(), Error> {
        let actor = self.require_account(token).await?;
        self.account_service.admin_delete(&actor, target).await
    }

    /// Request a password reset. Always acknowledges, whether or not
    /// the email resolves to an account, and swallows mail transport
    /// failures; the response never reveals whether an email exists.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), Error> {
        self.recovery_service.request_password_reset(email).await?;
        Ok(())
    }

    /// Complete a password reset with a signed token from the reset
    /// email.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), Error> {
        self.recovery_service.reset_password(token, new_password).await
    }

    /// Drop expired sessions. Intended for a periodic maintenance
    /// task.
    pub async fn cleanup_expired_sessions(&self) -> Result<(), Error> {
        self.session_service.cleanup_expired_sessions().await
    }

    async fn require_account(&self, token: &SessionToken) -> Result<Account, Error> {
        self.current_account(token)
            .await
            .ok_or(Error::Auth(AuthError::Unauthorized))
    }
}
