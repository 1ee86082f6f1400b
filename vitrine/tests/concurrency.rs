//! Concurrent review appends must not lose updates on either backend.

use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;
use vitrine::{
    DocumentRepositoryProvider, NewReview, RegisterAccount, SqliteRepositoryProvider, TokenConfig,
    Vitrine,
};
use vitrine_core::repositories::RepositoryProvider;

const WRITERS: usize = 16;

async fn sqlite_vitrine() -> Vitrine<SqliteRepositoryProvider> {
    let _ = tracing_subscriber::fmt::try_init();

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to connect to SQLite");
    let vitrine = Vitrine::new(
        Arc::new(SqliteRepositoryProvider::new(pool)),
        TokenConfig::new(b"concurrency-secret".to_vec()),
    );
    vitrine.migrate().await.expect("Migration failed");
    vitrine
}

fn document_vitrine() -> Vitrine<DocumentRepositoryProvider> {
    let _ = tracing_subscriber::fmt::try_init();

    Vitrine::new(
        Arc::new(DocumentRepositoryProvider::new()),
        TokenConfig::new(b"concurrency-secret".to_vec()),
    )
}

async fn hammer_reviews<R: RepositoryProvider>(vitrine: Arc<Vitrine<R>>) {
    let account = vitrine
        .register(RegisterAccount {
            email: "sarah@example.com".to_string(),
            password: "hunter2!".to_string(),
            name: "Sarah".to_string(),
            specialty: Some("Electrician".to_string()),
            ..Default::default()
        })
        .await
        .expect("Registration failed");

    // Half fives, half fours; the mean is exactly 4.5 regardless of
    // interleaving, so a lost append shows up in either number.
    let mut handles = Vec::with_capacity(WRITERS);
    for i in 0..WRITERS {
        let vitrine = vitrine.clone();
        let id = account.id.clone();
        handles.push(tokio::spawn(async move {
            vitrine
                .add_review(
                    &id,
                    NewReview {
                        rating: if i % 2 == 0 { 5.0 } else { 4.0 },
                        name: format!("reviewer-{i}"),
                        comment: None,
                        date: None,
                    },
                )
                .await
                .expect("Review append failed");
        }));
    }
    for handle in handles {
        handle.await.expect("Writer task panicked");
    }

    let directory = vitrine.list_directory().await.expect("Listing failed");
    let stored = directory
        .iter()
        .find(|a| a.id == account.id)
        .expect("Account missing from directory");

    assert_eq!(stored.review_count, WRITERS as u32);
    assert_eq!(stored.reviews.len(), WRITERS);
    assert_eq!(stored.rating, 4.5);
}

async fn hammer_gallery<R: RepositoryProvider>(vitrine: Arc<Vitrine<R>>) {
    vitrine
        .register(RegisterAccount {
            email: "sarah@example.com".to_string(),
            password: "hunter2!".to_string(),
            name: "Sarah".to_string(),
            ..Default::default()
        })
        .await
        .expect("Registration failed");
    let (_, session) = vitrine
        .login("sarah@example.com", "hunter2!", None, None)
        .await
        .expect("Login failed");

    let mut handles = Vec::with_capacity(WRITERS);
    for i in 0..WRITERS {
        let vitrine = vitrine.clone();
        let token = session.token.clone();
        handles.push(tokio::spawn(async move {
            vitrine
                .add_gallery_items(&token, vec![format!("/uploads/{i}.jpg")])
                .await
                .expect("Gallery add failed");
        }));
    }
    for handle in handles {
        handle.await.expect("Writer task panicked");
    }

    let directory = vitrine.list_directory().await.expect("Listing failed");
    assert_eq!(directory[0].gallery.len(), WRITERS);
}

#[tokio::test]
async fn test_concurrent_reviews_sqlite() {
    hammer_reviews(Arc::new(sqlite_vitrine().await)).await;
}

#[tokio::test]
async fn test_concurrent_reviews_document() {
    hammer_reviews(Arc::new(document_vitrine())).await;
}

#[tokio::test]
async fn test_concurrent_gallery_adds_sqlite() {
    hammer_gallery(Arc::new(sqlite_vitrine().await)).await;
}

#[tokio::test]
async fn test_concurrent_gallery_adds_document() {
    hammer_gallery(Arc::new(document_vitrine())).await;
}
