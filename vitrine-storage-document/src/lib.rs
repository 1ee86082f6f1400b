//! Document storage backend
//!
//! Keeps whole account documents in a concurrent map, one entry per
//! account. Read-modify-write operations over an account's embedded
//! collections go through `get_mut`, whose shard write lock serializes
//! them per entry without serializing operations on different
//! accounts. Email uniqueness is a scan guarded by a dedicated mutex
//! so two creates (or an email change racing a create) cannot both
//! pass the check; that mutex is always acquired before any entry
//! reference is taken.
//!
//! Observable semantics match the SQLite backend exactly: same
//! conflict errors, same derived-field recomputation, same listing
//! filter and order.

pub mod repositories;

pub use repositories::DocumentRepositoryProvider;
