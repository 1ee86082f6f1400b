//! Account data model
//!
//! The account is the central entity of the directory: a profile with
//! credentials, an owner-mutable media gallery, an append-only review
//! list, and the derived reputation pair. The `rating`/`review_count`
//! fields are recomputed by the repository on every review append and
//! are never independently settable.

use crate::{
    Error,
    error::ValidationError,
    id::{generate_prefixed_id, validate_prefixed_id},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Profile categories hidden from the public directory listing.
///
/// `Visitor` marks federated-login placeholder accounts and
/// `Administrator` marks the admin account; neither belongs in the
/// directory either backend serves.
pub const RESERVED_SPECIALTIES: [&str; 2] = ["Visitor", "Administrator"];

/// Specialty assigned to accounts created through federated login.
pub const VISITOR_SPECIALTY: &str = "Visitor";

/// Check whether a specialty is reserved and must be excluded from
/// directory listings.
pub fn is_reserved_specialty(specialty: &str) -> bool {
    RESERVED_SPECIALTIES.contains(&specialty)
}

/// A unique, stable identifier for a specific account.
/// The value is opaque and assigned by the storage backend at create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: &str) -> Self {
        AccountId(id.to_string())
    }

    pub fn new_random() -> Self {
        AccountId(generate_prefixed_id("acct"))
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_valid(&self) -> bool {
        validate_prefixed_id(&self.0, "acct")
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new_random()
    }
}

impl From<String> for AccountId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single third-party review, embedded in the account record.
///
/// Reviews are appended, never edited or removed, for the lifetime of
/// the account. The reviewer name is display text and is not checked
/// against any account identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub rating: f64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// RFC 3339 timestamp, caller-supplied or server-generated.
    pub date: String,
}

/// A stored account: profile, credentials, reputation, media, and the
/// password-recovery fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,

    /// Unique across all accounts, compared case-insensitively.
    pub email: String,

    /// Opaque digest produced by the credential verifier. Never
    /// exposed through the directory surface.
    pub password_hash: String,

    pub name: String,
    pub specialty: Option<String>,
    pub location: Option<String>,
    pub state: Option<String>,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,

    /// Derived: round(mean of review ratings, 1 decimal), 0 when the
    /// review list is empty.
    pub rating: f64,
    /// Derived: length of `reviews`.
    pub review_count: u32,
    /// Insertion order is display order.
    pub reviews: Vec<Review>,

    /// Opaque media references; duplicates permitted, order is
    /// insertion order and meaningful for display.
    pub gallery: Vec<String>,

    /// Non-null only while a reset has been requested and not yet
    /// consumed or superseded.
    pub reset_token: Option<String>,
    pub reset_token_expires_at: Option<DateTime<Utc>>,

    pub is_admin: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Whether this account appears in the public directory listing.
    pub fn is_listed(&self) -> bool {
        match &self.specialty {
            Some(specialty) => !is_reserved_specialty(specialty),
            None => true,
        }
    }
}

/// Input for creating an account. The repository assigns the id and
/// initializes the derived and recovery fields.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub specialty: Option<String>,
    pub location: Option<String>,
    pub state: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub is_admin: bool,
}

impl NewAccount {
    pub fn builder() -> NewAccountBuilder {
        NewAccountBuilder::default()
    }
}

#[derive(Default)]
pub struct NewAccountBuilder {
    email: Option<String>,
    password_hash: Option<String>,
    name: Option<String>,
    specialty: Option<String>,
    location: Option<String>,
    state: Option<String>,
    description: Option<String>,
    image: Option<String>,
    is_admin: bool,
}

impl NewAccountBuilder {
    pub fn email(mut self, email: String) -> Self {
        self.email = Some(email);
        self
    }

    pub fn password_hash(mut self, password_hash: String) -> Self {
        self.password_hash = Some(password_hash);
        self
    }

    pub fn name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    pub fn specialty(mut self, specialty: Option<String>) -> Self {
        self.specialty = specialty;
        self
    }

    pub fn location(mut self, location: Option<String>) -> Self {
        self.location = location;
        self
    }

    pub fn state(mut self, state: Option<String>) -> Self {
        self.state = state;
        self
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn image(mut self, image: Option<String>) -> Self {
        self.image = image;
        self
    }

    pub fn admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }

    pub fn build(self) -> Result<NewAccount, Error> {
        Ok(NewAccount {
            email: self
                .email
                .filter(|e| !e.is_empty())
                .ok_or(ValidationError::MissingField("email".to_string()))?,
            password_hash: self
                .password_hash
                .ok_or(ValidationError::MissingField("password".to_string()))?,
            name: self
                .name
                .filter(|n| !n.is_empty())
                .ok_or(ValidationError::MissingField("name".to_string()))?,
            specialty: self.specialty,
            location: self.location,
            state: self.state,
            description: self.description,
            image: self.image,
            is_admin: self.is_admin,
        })
    }
}

/// A partial profile update. Only the recognized mutable fields are
/// representable; a `Some` value is applied, `None` leaves the stored
/// value untouched. Unknown fields on the wire are ignored by serde
/// rather than rejected.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub specialty: Option<String>,
    pub location: Option<String>,
    pub state: Option<String>,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub email: Option<String>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.specialty.is_none()
            && self.location.is_none()
            && self.state.is_none()
            && self.phone.is_none()
            && self.whatsapp.is_none()
            && self.description.is_none()
            && self.image.is_none()
            && self.email.is_none()
    }
}

/// A gallery mutation.
///
/// `Add` appends one or many entries to the end, preserving order.
/// `Remove` deletes the first value-equal entry and is a no-op when
/// the target is absent.
#[derive(Debug, Clone)]
pub enum GalleryOp {
    Add(Vec<String>),
    Remove(String),
}

/// Apply a gallery op to an in-memory gallery. Both storage backends
/// route their serialized-document mutation through this so the
/// observable list semantics cannot drift apart.
pub fn apply_gallery_op(gallery: &mut Vec<String>, op: &GalleryOp) {
    match op {
        GalleryOp::Add(urls) => gallery.extend(urls.iter().cloned()),
        GalleryOp::Remove(url) => {
            if let Some(pos) = gallery.iter().position(|item| item == url) {
                gallery.remove(pos);
            }
        }
    }
}
