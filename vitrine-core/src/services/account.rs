use std::sync::Arc;

use crate::{
    Error,
    account::{
        Account, AccountId, GalleryOp, NewAccount, ProfileChanges, Review, VISITOR_SPECIALTY,
    },
    credentials::CredentialVerifier,
    error::{AuthError, ValidationError},
    id::generate_prefixed_id,
    reputation,
    repositories::AccountRepository,
};

/// Registration input. `email`, `password`, and `name` are required;
/// everything else is optional profile text.
#[derive(Debug, Clone, Default)]
pub struct RegisterAccount {
    pub email: String,
    pub password: String,
    pub name: String,
    pub specialty: Option<String>,
    pub state: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
}

/// An identity assertion already verified by an external provider.
/// Verification happens outside the core; by the time this struct
/// exists the email is trusted.
#[derive(Debug, Clone)]
pub struct FederatedIdentity {
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
}

/// Service for account lifecycle, profile, review, and gallery
/// operations.
pub struct AccountService<R: AccountRepository> {
    repository: Arc<R>,
    verifier: CredentialVerifier,
}

impl<R: AccountRepository> AccountService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            verifier: CredentialVerifier::new(),
        }
    }

    /// Register a new account. Fails with `MissingField` when a
    /// required field is empty and `Conflict` when the email is
    /// already taken (case-insensitive).
    pub async fn register(&self, request: RegisterAccount) -> Result<Account, Error> {
        if request.password.is_empty() {
            return Err(ValidationError::MissingField("password".to_string()).into());
        }

        let new_account = NewAccount::builder()
            .email(request.email)
            .password_hash(self.verifier.hash(&request.password))
            .name(request.name)
            .specialty(request.specialty)
            .state(request.state)
            .location(request.location)
            .description(request.description)
            .image(request.image)
            .build()?;

        self.repository.create(new_account).await
    }

    /// Create the administrator account. Same path as `register` with
    /// the admin flag set; the account's reserved specialty keeps it
    /// out of the directory listing.
    pub async fn create_admin(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Account, Error> {
        let new_account = NewAccount::builder()
            .email(email.to_string())
            .password_hash(self.verifier.hash(password))
            .name(name.to_string())
            .specialty(Some("Administrator".to_string()))
            .admin(true)
            .build()?;

        self.repository.create(new_account).await
    }

    /// Resolve a login identifier (email or display name, both
    /// case-insensitive) and verify the secret. The same error covers
    /// an unknown identifier and a wrong secret.
    pub async fn authenticate(&self, identifier: &str, password: &str) -> Result<Account, Error> {
        let account = self
            .repository
            .find_by_email_or_name(identifier)
            .await?
            .ok_or(Error::Auth(AuthError::InvalidCredentials))?;

        if !self.verifier.verify(password, &account.password_hash) {
            return Err(AuthError::InvalidCredentials.into());
        }

        Ok(account)
    }

    /// Locate an account by a federated assertion's verified email,
    /// creating a placeholder account when none exists. Returns the
    /// account and whether it was newly created.
    pub async fn find_or_create_federated(
        &self,
        identity: &FederatedIdentity,
    ) -> Result<(Account, bool), Error> {
        if let Some(account) = self.repository.find_by_email(&identity.email).await? {
            return Ok((account, false));
        }

        // Placeholder credentials; the account can only be entered
        // through federated login until a password reset.
        let new_account = NewAccount::builder()
            .email(identity.email.clone())
            .password_hash(self.verifier.hash(&generate_prefixed_id("cred")))
            .name(identity.name.clone())
            .specialty(Some(VISITOR_SPECIALTY.to_string()))
            .image(identity.picture.clone())
            .build()?;

        let account = self.repository.create(new_account).await?;
        Ok((account, true))
    }

    pub async fn get_account(&self, id: &AccountId) -> Result<Option<Account>, Error> {
        self.repository.find_by_id(id).await
    }

    /// Apply a partial profile update.
    pub async fn update_profile(
        &self,
        id: &AccountId,
        changes: &ProfileChanges,
    ) -> Result<Account, Error> {
        self.repository.update_profile(id, changes).await
    }

    /// Append a review and return the recomputed `(rating, count)`.
    /// The review is validated before any state is touched.
    pub async fn add_review(&self, id: &AccountId, review: Review) -> Result<(f64, u32), Error> {
        reputation::validate_review(&review)?;
        self.repository.append_review(id, review).await
    }

    /// Apply a gallery mutation for the owning account and return the
    /// resulting gallery.
    pub async fn mutate_gallery(
        &self,
        id: &AccountId,
        op: GalleryOp,
    ) -> Result<Vec<String>, Error> {
        self.repository.mutate_gallery(id, op).await
    }

    /// Admin-only hard delete. The admin cannot delete themself.
    pub async fn admin_delete(&self, actor: &Account, target: &AccountId) -> Result<(), Error> {
        if !actor.is_admin {
            return Err(AuthError::Forbidden("admin access required".to_string()).into());
        }
        if &actor.id == target {
            return Err(
                AuthError::Forbidden("cannot delete your own account".to_string()).into(),
            );
        }

        self.repository.delete(target).await
    }

    /// The public directory: every account except those with a
    /// reserved specialty, in creation order.
    pub async fn list_directory(&self) -> Result<Vec<Account>, Error> {
        self.repository.list().await
    }
}
