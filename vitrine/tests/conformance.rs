//! Backend conformance suite
//!
//! Every check runs identically against the SQLite and document
//! backends; a behavioral difference between them is a bug in one of
//! them, not a test artifact.

use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;
use vitrine::{
    DocumentRepositoryProvider, NewReview, ProfileChanges, RegisterAccount, SessionToken,
    SqliteRepositoryProvider, TokenConfig, Vitrine,
};
use vitrine_core::{
    error::{AuthError, Error},
    repositories::RepositoryProvider,
    services::FederatedIdentity,
};

async fn sqlite_vitrine() -> Vitrine<SqliteRepositoryProvider> {
    let _ = tracing_subscriber::fmt::try_init();

    // In-memory SQLite gives every pooled connection its own database,
    // so the pool is pinned to a single connection.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to connect to SQLite");

    let vitrine = Vitrine::new(
        Arc::new(SqliteRepositoryProvider::new(pool)),
        TokenConfig::new(b"conformance-secret".to_vec()),
    );
    vitrine.migrate().await.expect("Migration failed");
    vitrine
}

fn document_vitrine() -> Vitrine<DocumentRepositoryProvider> {
    let _ = tracing_subscriber::fmt::try_init();

    Vitrine::new(
        Arc::new(DocumentRepositoryProvider::new()),
        TokenConfig::new(b"conformance-secret".to_vec()),
    )
}

fn register_request(email: &str, name: &str) -> RegisterAccount {
    RegisterAccount {
        email: email.to_string(),
        password: "hunter2!".to_string(),
        name: name.to_string(),
        specialty: Some("Electrician".to_string()),
        ..Default::default()
    }
}

fn review(rating: f64) -> NewReview {
    NewReview {
        rating,
        name: "A Visitor".to_string(),
        comment: None,
        date: None,
    }
}

async fn check_register_and_conflict<R: RepositoryProvider>(vitrine: &Vitrine<R>) {
    let account = vitrine
        .register(register_request("sarah@example.com", "Sarah"))
        .await
        .expect("Registration failed");
    assert_eq!(account.rating, 0.0);
    assert_eq!(account.review_count, 0);
    assert!(account.gallery.is_empty());
    assert!(!account.is_admin);

    let err = vitrine
        .register(register_request("SARAH@Example.COM", "Other Sarah"))
        .await
        .expect_err("Duplicate email should conflict");
    assert!(err.is_conflict());
}

async fn check_login_by_email_or_name<R: RepositoryProvider>(vitrine: &Vitrine<R>) {
    vitrine
        .register(register_request("sarah@example.com", "Sarah"))
        .await
        .expect("Registration failed");

    let (by_email, _) = vitrine
        .login("SARAH@example.com", "hunter2!", None, None)
        .await
        .expect("Login by email failed");
    let (by_name, _) = vitrine
        .login("sarah", "hunter2!", None, None)
        .await
        .expect("Login by name failed");
    assert_eq!(by_email.id, by_name.id);

    let err = vitrine
        .login("sarah@example.com", "wrong", None, None)
        .await
        .expect_err("Wrong password should fail");
    assert!(matches!(err, Error::Auth(AuthError::InvalidCredentials)));

    let err = vitrine
        .login("nobody@example.com", "hunter2!", None, None)
        .await
        .expect_err("Unknown identifier should fail");
    assert!(matches!(err, Error::Auth(AuthError::InvalidCredentials)));
}

async fn check_login_tie_break_prefers_email<R: RepositoryProvider>(vitrine: &Vitrine<R>) {
    // One account's name is another account's email; the email match
    // must win regardless of creation order.
    let mut squatter = register_request("other@example.com", "pat@example.com");
    squatter.password = "squatter-pw".to_string();
    vitrine.register(squatter).await.expect("Registration failed");
    let owner = vitrine
        .register(register_request("pat@example.com", "Pat"))
        .await
        .expect("Registration failed");

    let (resolved, _) = vitrine
        .login("pat@example.com", "hunter2!", None, None)
        .await
        .expect("Login failed");
    assert_eq!(resolved.id, owner.id);
}

async fn check_sessions<R: RepositoryProvider>(vitrine: &Vitrine<R>) {
    vitrine
        .register(register_request("sarah@example.com", "Sarah"))
        .await
        .expect("Registration failed");
    let (account, session) = vitrine
        .login("sarah@example.com", "hunter2!", Some("test-agent".to_string()), None)
        .await
        .expect("Login failed");

    let current = vitrine
        .current_account(&session.token)
        .await
        .expect("Session should resolve");
    assert_eq!(current.id, account.id);

    assert!(vitrine
        .current_account(&SessionToken::new("sess_bogus"))
        .await
        .is_none());

    vitrine.logout(&session.token).await.expect("Logout failed");
    assert!(vitrine.current_account(&session.token).await.is_none());
    // Idempotent.
    vitrine.logout(&session.token).await.expect("Repeat logout failed");
}

async fn check_profile_update<R: RepositoryProvider>(vitrine: &Vitrine<R>) {
    vitrine
        .register(register_request("sarah@example.com", "Sarah"))
        .await
        .expect("Registration failed");
    let (_, session) = vitrine
        .login("sarah@example.com", "hunter2!", None, None)
        .await
        .expect("Login failed");

    let changes = ProfileChanges {
        location: Some("Porto".to_string()),
        phone: Some("+351 900 000 000".to_string()),
        ..Default::default()
    };
    let updated = vitrine
        .update_profile(&session.token, &changes)
        .await
        .expect("Profile update failed");
    assert_eq!(updated.location.as_deref(), Some("Porto"));
    assert_eq!(updated.phone.as_deref(), Some("+351 900 000 000"));
    assert_eq!(updated.name, "Sarah");
    assert_eq!(updated.specialty.as_deref(), Some("Electrician"));

    let err = vitrine
        .update_profile(&SessionToken::new("sess_bogus"), &changes)
        .await
        .expect_err("Update without session should fail");
    assert!(matches!(err, Error::Auth(AuthError::Unauthorized)));
}

async fn check_gallery_round_trip<R: RepositoryProvider>(vitrine: &Vitrine<R>) {
    vitrine
        .register(register_request("sarah@example.com", "Sarah"))
        .await
        .expect("Registration failed");
    let (_, session) = vitrine
        .login("sarah@example.com", "hunter2!", None, None)
        .await
        .expect("Login failed");

    vitrine
        .add_gallery_items(&session.token, vec!["/uploads/a.jpg".to_string()])
        .await
        .expect("Gallery add failed");
    vitrine
        .add_gallery_items(&session.token, vec!["/uploads/a.jpg".to_string()])
        .await
        .expect("Gallery add failed");
    let gallery = vitrine
        .remove_gallery_item(&session.token, "/uploads/a.jpg")
        .await
        .expect("Gallery remove failed");

    // add/add/remove of the same value leaves exactly one instance.
    assert_eq!(gallery, vec!["/uploads/a.jpg".to_string()]);
}

async fn check_review_aggregation<R: RepositoryProvider>(vitrine: &Vitrine<R>) {
    let account = vitrine
        .register(register_request("sarah@example.com", "Sarah"))
        .await
        .expect("Registration failed");

    vitrine.add_review(&account.id, review(5.0)).await.expect("Review failed");
    vitrine.add_review(&account.id, review(4.0)).await.expect("Review failed");
    let (rating, count) = vitrine
        .add_review(&account.id, review(3.0))
        .await
        .expect("Review failed");
    assert_eq!((rating, count), (4.0, 3));

    let (rating, count) = vitrine
        .add_review(&account.id, review(2.0))
        .await
        .expect("Review failed");
    assert_eq!((rating, count), (3.5, 4));

    let err = vitrine
        .add_review(&account.id, review(6.0))
        .await
        .expect_err("Out-of-range rating should fail");
    assert!(err.is_validation_error());
}

async fn check_directory_excludes_reserved<R: RepositoryProvider>(vitrine: &Vitrine<R>) {
    let listed = vitrine
        .register(register_request("sarah@example.com", "Sarah"))
        .await
        .expect("Registration failed");

    vitrine
        .create_admin("admin@example.com", "admin-pw", "Admin")
        .await
        .expect("Admin creation failed");

    let identity = FederatedIdentity {
        email: "visitor@example.com".to_string(),
        name: "Visitor".to_string(),
        picture: None,
    };
    let (_, _, is_new) = vitrine
        .federated_login(&identity, None, None)
        .await
        .expect("Federated login failed");
    assert!(is_new);

    let directory = vitrine.list_directory().await.expect("Listing failed");
    let ids: Vec<_> = directory.into_iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![listed.id]);
}

async fn check_federated_login_is_idempotent<R: RepositoryProvider>(vitrine: &Vitrine<R>) {
    let identity = FederatedIdentity {
        email: "visitor@example.com".to_string(),
        name: "Visitor".to_string(),
        picture: Some("https://example.com/pic.png".to_string()),
    };

    let (first, _, is_new) = vitrine
        .federated_login(&identity, None, None)
        .await
        .expect("Federated login failed");
    assert!(is_new);
    assert_eq!(first.specialty.as_deref(), Some("Visitor"));

    let (second, session, is_new) = vitrine
        .federated_login(&identity, None, None)
        .await
        .expect("Federated login failed");
    assert!(!is_new);
    assert_eq!(second.id, first.id);
    assert!(vitrine.current_account(&session.token).await.is_some());
}

async fn check_admin_delete_rules<R: RepositoryProvider>(vitrine: &Vitrine<R>) {
    let target = vitrine
        .register(register_request("sarah@example.com", "Sarah"))
        .await
        .expect("Registration failed");
    let (_, target_session) = vitrine
        .login("sarah@example.com", "hunter2!", None, None)
        .await
        .expect("Login failed");

    vitrine
        .register(register_request("peer@example.com", "Peer"))
        .await
        .expect("Registration failed");
    let (_, peer_session) = vitrine
        .login("peer@example.com", "hunter2!", None, None)
        .await
        .expect("Login failed");

    let admin = vitrine
        .create_admin("admin@example.com", "admin-pw", "Admin")
        .await
        .expect("Admin creation failed");
    let (_, admin_session) = vitrine
        .login("admin@example.com", "admin-pw", None, None)
        .await
        .expect("Admin login failed");

    // A regular account cannot delete anyone.
    let err = vitrine
        .admin_delete_account(&peer_session.token, &target.id)
        .await
        .expect_err("Non-admin delete should fail");
    assert!(matches!(err, Error::Auth(AuthError::Forbidden(_))));

    // An admin cannot delete themself.
    let err = vitrine
        .admin_delete_account(&admin_session.token, &admin.id)
        .await
        .expect_err("Self-delete should fail");
    assert!(matches!(err, Error::Auth(AuthError::Forbidden(_))));

    // No session at all is unauthorized.
    let err = vitrine
        .admin_delete_account(&SessionToken::new("sess_bogus"), &target.id)
        .await
        .expect_err("Unauthenticated delete should fail");
    assert!(matches!(err, Error::Auth(AuthError::Unauthorized)));

    vitrine
        .admin_delete_account(&admin_session.token, &target.id)
        .await
        .expect("Admin delete failed");

    // The account and its sessions are gone.
    assert!(vitrine.current_account(&target_session.token).await.is_none());
    let directory = vitrine.list_directory().await.expect("Listing failed");
    assert!(directory.iter().all(|a| a.id != target.id));
}

macro_rules! conformance_tests {
    ($($name:ident => $check:ident),+ $(,)?) => {
        mod sqlite_backend {
            use super::*;
            $(
                #[tokio::test]
                async fn $name() {
                    let vitrine = sqlite_vitrine().await;
                    $check(&vitrine).await;
                }
            )+
        }

        mod document_backend {
            use super::*;
            $(
                #[tokio::test]
                async fn $name() {
                    let vitrine = document_vitrine();
                    $check(&vitrine).await;
                }
            )+
        }
    };
}

conformance_tests! {
    test_register_and_conflict => check_register_and_conflict,
    test_login_by_email_or_name => check_login_by_email_or_name,
    test_login_tie_break_prefers_email => check_login_tie_break_prefers_email,
    test_sessions => check_sessions,
    test_profile_update => check_profile_update,
    test_gallery_round_trip => check_gallery_round_trip,
    test_review_aggregation => check_review_aggregation,
    test_directory_excludes_reserved => check_directory_excludes_reserved,
    test_federated_login_is_idempotent => check_federated_login_is_idempotent,
    test_admin_delete_rules => check_admin_delete_rules,
}
