use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    Error,
    account::{Account, AccountId, GalleryOp, NewAccount, ProfileChanges, Review},
};

/// Repository for account data access.
///
/// All operations take and return account data by value or by stable
/// id; no operation observes another operation's in-flight state.
/// `append_review`, `mutate_gallery`, and `consume_reset_token` are
/// read-modify-write over embedded collections and must be serialized
/// per account id by the implementation; operations on different ids
/// must not serialize against each other.
#[async_trait]
pub trait AccountRepository: Send + Sync + 'static {
    /// Create a new account. Fails with `Conflict` when the email is
    /// already taken (case-insensitive compare). Initializes empty
    /// reviews and gallery, rating 0, count 0.
    async fn create(&self, account: NewAccount) -> Result<Account, Error>;

    /// Find an account by id.
    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, Error>;

    /// Find an account by email, case-insensitively.
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, Error>;

    /// Find an account by email or display name, both compared
    /// case-insensitively. When the key matches one account's email
    /// and a different account's name, the email match wins.
    async fn find_by_email_or_name(&self, key: &str) -> Result<Option<Account>, Error>;

    /// Apply the fields present in `changes`, leaving everything else
    /// untouched. An email change re-checks uniqueness and fails with
    /// `Conflict` on collision.
    async fn update_profile(
        &self,
        id: &AccountId,
        changes: &ProfileChanges,
    ) -> Result<Account, Error>;

    /// Atomically append a review, recompute `(rating, review_count)`
    /// from the full list, and persist all three as one unit.
    /// Concurrent appends against the same account must not lose
    /// either review.
    async fn append_review(&self, id: &AccountId, review: Review) -> Result<(f64, u32), Error>;

    /// Apply a gallery mutation and return the resulting gallery.
    async fn mutate_gallery(&self, id: &AccountId, op: GalleryOp) -> Result<Vec<String>, Error>;

    /// Store a reset token and its expiry on the account, silently
    /// superseding any pending token.
    async fn set_reset_token(
        &self,
        id: &AccountId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), Error>;

    /// Atomically verify that `token` equals the stored reset token
    /// for `email` and that the stored expiry has not passed, then set
    /// the new password digest and clear both reset fields as one
    /// unit. Fails with a token error otherwise, making each stored
    /// token single-use.
    async fn consume_reset_token(
        &self,
        email: &str,
        token: &str,
        new_password_hash: &str,
    ) -> Result<Account, Error>;

    /// Hard-delete the account. Irreversible.
    async fn delete(&self, id: &AccountId) -> Result<(), Error>;

    /// All accounts in creation order, excluding reserved specialties
    /// (`Visitor`, `Administrator`).
    async fn list(&self) -> Result<Vec<Account>, Error>;
}
