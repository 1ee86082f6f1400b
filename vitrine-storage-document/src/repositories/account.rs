use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::{Arc, Mutex, PoisonError};
use vitrine_core::{
    Account, AccountId, Error, GalleryOp, NewAccount, ProfileChanges, Review, Session,
    account::apply_gallery_op,
    error::{StorageError, TokenError},
    reputation,
    repositories::AccountRepository,
};

/// Account repository over a concurrent document map.
///
/// `get_mut` on the map takes the entry's shard write lock, which is
/// what serializes read-modify-write operations per account id. The
/// `email_lock` mutex guards the uniqueness scan in `create` and in
/// email-changing profile updates; it is never acquired while an entry
/// reference is held, so it cannot deadlock against per-entry locks.
pub struct DocumentAccountRepository {
    accounts: DashMap<String, Account>,
    sessions: Arc<DashMap<String, Session>>,
    email_lock: Mutex<()>,
}

impl DocumentAccountRepository {
    pub fn new(sessions: Arc<DashMap<String, Session>>) -> Self {
        Self {
            accounts: DashMap::new(),
            sessions,
            email_lock: Mutex::new(()),
        }
    }

    /// Id of the account whose email matches `email` case-insensitively.
    fn id_for_email(&self, email: &str) -> Option<String> {
        self.accounts
            .iter()
            .find(|entry| entry.email.eq_ignore_ascii_case(email))
            .map(|entry| entry.key().clone())
    }
}

#[async_trait]
impl AccountRepository for DocumentAccountRepository {
    async fn create(&self, account: NewAccount) -> Result<Account, Error> {
        let _guard = self
            .email_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if self.id_for_email(&account.email).is_some() {
            return Err(StorageError::Conflict("email already exists".to_string()).into());
        }

        let now = Utc::now();
        let stored = Account {
            id: AccountId::new_random(),
            email: account.email,
            password_hash: account.password_hash,
            name: account.name,
            specialty: account.specialty,
            location: account.location,
            state: account.state,
            phone: None,
            whatsapp: None,
            description: account.description,
            image: account.image,
            rating: 0.0,
            review_count: 0,
            reviews: Vec::new(),
            gallery: Vec::new(),
            reset_token: None,
            reset_token_expires_at: None,
            is_admin: account.is_admin,
            created_at: now,
            updated_at: now,
        };

        self.accounts
            .insert(stored.id.as_str().to_string(), stored.clone());

        Ok(stored)
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, Error> {
        Ok(self.accounts.get(id.as_str()).map(|entry| entry.clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, Error> {
        Ok(self
            .accounts
            .iter()
            .find(|entry| entry.email.eq_ignore_ascii_case(email))
            .map(|entry| entry.value().clone()))
    }

    async fn find_by_email_or_name(&self, key: &str) -> Result<Option<Account>, Error> {
        let mut name_match = None;
        for entry in self.accounts.iter() {
            if entry.email.eq_ignore_ascii_case(key) {
                // An email match always wins over a name match.
                return Ok(Some(entry.value().clone()));
            }
            if name_match.is_none() && entry.name.eq_ignore_ascii_case(key) {
                name_match = Some(entry.value().clone());
            }
        }
        Ok(name_match)
    }

    async fn update_profile(
        &self,
        id: &AccountId,
        changes: &ProfileChanges,
    ) -> Result<Account, Error> {
        // Email changes re-check uniqueness under the same mutex as
        // create, so a racing create cannot slip in the same address.
        // The guard must outlive the mutation below.
        let mut _email_guard = None;
        if let Some(email) = changes.email.as_deref() {
            _email_guard = Some(
                self.email_lock
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner),
            );
            if let Some(holder) = self.id_for_email(email) {
                if holder != id.as_str() {
                    return Err(
                        StorageError::Conflict("email already exists".to_string()).into()
                    );
                }
            }
        }

        let mut entry = self
            .accounts
            .get_mut(id.as_str())
            .ok_or(Error::Storage(StorageError::NotFound))?;

        let account = entry.value_mut();
        if let Some(name) = &changes.name {
            account.name = name.clone();
        }
        if let Some(specialty) = &changes.specialty {
            account.specialty = Some(specialty.clone());
        }
        if let Some(location) = &changes.location {
            account.location = Some(location.clone());
        }
        if let Some(state) = &changes.state {
            account.state = Some(state.clone());
        }
        if let Some(phone) = &changes.phone {
            account.phone = Some(phone.clone());
        }
        if let Some(whatsapp) = &changes.whatsapp {
            account.whatsapp = Some(whatsapp.clone());
        }
        if let Some(description) = &changes.description {
            account.description = Some(description.clone());
        }
        if let Some(image) = &changes.image {
            account.image = Some(image.clone());
        }
        if let Some(email) = &changes.email {
            account.email = email.clone();
        }
        account.updated_at = Utc::now();

        Ok(account.clone())
    }

    async fn append_review(&self, id: &AccountId, review: Review) -> Result<(f64, u32), Error> {
        let mut entry = self
            .accounts
            .get_mut(id.as_str())
            .ok_or(Error::Storage(StorageError::NotFound))?;

        let account = entry.value_mut();
        let mut reviews = account.reviews.clone();
        reviews.push(review);

        // Validation failures reject the append before any write.
        let (rating, count) = reputation::aggregate(&reviews)?;

        account.reviews = reviews;
        account.rating = rating;
        account.review_count = count;
        account.updated_at = Utc::now();

        Ok((rating, count))
    }

    async fn mutate_gallery(&self, id: &AccountId, op: GalleryOp) -> Result<Vec<String>, Error> {
        let mut entry = self
            .accounts
            .get_mut(id.as_str())
            .ok_or(Error::Storage(StorageError::NotFound))?;

        let account = entry.value_mut();
        apply_gallery_op(&mut account.gallery, &op);
        account.updated_at = Utc::now();

        Ok(account.gallery.clone())
    }

    async fn set_reset_token(
        &self,
        id: &AccountId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), Error> {
        let mut entry = self
            .accounts
            .get_mut(id.as_str())
            .ok_or(Error::Storage(StorageError::NotFound))?;

        let account = entry.value_mut();
        account.reset_token = Some(token.to_string());
        account.reset_token_expires_at = Some(expires_at);
        account.updated_at = Utc::now();

        Ok(())
    }

    async fn consume_reset_token(
        &self,
        email: &str,
        token: &str,
        new_password_hash: &str,
    ) -> Result<Account, Error> {
        let id = self
            .id_for_email(email)
            .ok_or(Error::Token(TokenError::Invalid))?;

        let mut entry = self
            .accounts
            .get_mut(&id)
            .ok_or(Error::Token(TokenError::Invalid))?;

        let account = entry.value_mut();
        let stored_matches = account.reset_token.as_deref() == Some(token);
        let unexpired = account
            .reset_token_expires_at
            .is_some_and(|expires| expires >= Utc::now());
        if !stored_matches || !unexpired {
            return Err(TokenError::Invalid.into());
        }

        account.password_hash = new_password_hash.to_string();
        account.reset_token = None;
        account.reset_token_expires_at = None;
        account.updated_at = Utc::now();

        Ok(account.clone())
    }

    async fn delete(&self, id: &AccountId) -> Result<(), Error> {
        self.accounts.remove(id.as_str());
        self.sessions
            .retain(|_, session| session.account_id != *id);
        tracing::debug!(account_id = %id, "deleted account document and its sessions");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Account>, Error> {
        let mut accounts: Vec<Account> = self
            .accounts
            .iter()
            .filter(|entry| entry.is_listed())
            .map(|entry| entry.value().clone())
            .collect();

        accounts.sort_by(|a, b| {
            (a.created_at, a.id.as_str()).cmp(&(b.created_at, b.id.as_str()))
        });

        Ok(accounts)
    }
}
