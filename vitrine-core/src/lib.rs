//! Core functionality for the vitrine directory service
//!
//! This crate owns the account data model, the error taxonomy, the
//! repository traits that storage backends implement, and the services
//! that orchestrate registration, sessions, reviews, galleries, and
//! password recovery.
//!
//! Storage backends implement [`repositories::RepositoryProvider`];
//! both bundled backends must present identical observable semantics,
//! which the facade crate's conformance suite enforces.

pub mod account;
pub mod assets;
pub mod credentials;
pub mod error;
pub mod id;
pub mod mailer;
pub mod reputation;
pub mod repositories;
pub mod services;
pub mod session;
pub mod token;

pub use account::{Account, AccountId, GalleryOp, NewAccount, ProfileChanges, Review};
pub use error::Error;
pub use session::{Session, SessionToken};
pub use token::{ResetTokenService, TokenConfig};
