//! Repository traits for the data access layer
//!
//! Services talk to storage through these traits only; both bundled
//! backends implement them against the same conformance suite so their
//! observable semantics cannot diverge.

pub mod account;
pub mod adapter;
pub mod session;

pub use account::AccountRepository;
pub use adapter::{AccountRepositoryAdapter, SessionRepositoryAdapter};
pub use session::SessionRepository;

use async_trait::async_trait;

use crate::Error;

/// Provider trait for account repository access.
pub trait AccountRepositoryProvider: Send + Sync + 'static {
    /// The account repository implementation type
    type AccountRepo: AccountRepository;

    /// Get the account repository
    fn account(&self) -> &Self::AccountRepo;
}

/// Provider trait for session repository access.
pub trait SessionRepositoryProvider: Send + Sync + 'static {
    /// The session repository implementation type
    type SessionRepo: SessionRepository;

    /// Get the session repository
    fn session(&self) -> &Self::SessionRepo;
}

/// Provider trait that storage backends implement to expose all
/// repositories plus lifecycle methods.
#[async_trait]
pub trait RepositoryProvider: AccountRepositoryProvider + SessionRepositoryProvider {
    /// Prepare the backing store (create tables, indexes).
    async fn migrate(&self) -> Result<(), Error>;

    /// Health check for the backing store.
    async fn health_check(&self) -> Result<(), Error>;
}
