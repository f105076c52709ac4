//! Reviews and the top-rated listing.

use delicious_core::validation::ReviewDraft;
use delicious_integration_tests::TestDb;
use delicious_web::services::DirectoryError;

fn review(text: &str, rating: i64) -> ReviewDraft {
    ReviewDraft {
        text: Some(text.to_owned()),
        rating: Some(rating),
    }
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with PostGIS (DATABASE_URL)"]
async fn test_top_rated_needs_two_reviews() {
    let db = TestDb::new().await;
    let author = db.user("Wes").await;
    let critic = db.user("Critic").await;
    let directory = db.directory();

    let lonely = db.store(&author, "Lonely", [0.0, 0.0], &[]).await;
    let popular = db.store(&author, "Popular", [0.0, 0.0], &[]).await;

    directory
        .add_review(lonely.id, critic.id, &review("Great", 5))
        .await
        .expect("review should save");
    directory
        .add_review(popular.id, critic.id, &review("Good", 4))
        .await
        .expect("review should save");
    directory
        .add_review(popular.id, author.id, &review("Great", 5))
        .await
        .expect("review should save");

    let top = directory.top_rated().await.expect("top_rated should succeed");

    assert_eq!(top.len(), 1);
    assert_eq!(top[0].store.id, popular.id);
    assert_eq!(top[0].review_count, 2);
    assert!((top[0].average_rating - 4.5).abs() < f64::EPSILON);

    db.cleanup().await;
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with PostGIS (DATABASE_URL)"]
async fn test_detail_lists_reviews_newest_first() {
    let db = TestDb::new().await;
    let author = db.user("Wes").await;
    let critic = db.user("Critic").await;
    let directory = db.directory();
    let store = db.store(&author, "Reviewed", [0.0, 0.0], &[]).await;

    directory
        .add_review(store.id, critic.id, &review("First", 3))
        .await
        .expect("review should save");
    directory
        .add_review(store.id, critic.id, &review("Second", 4))
        .await
        .expect("review should save");

    let detail = directory.detail("reviewed").await.expect("detail should succeed");

    assert_eq!(detail.store.id, store.id);
    assert_eq!(detail.author_summary.name, "Wes");
    let texts: Vec<_> = detail.reviews.iter().map(|r| r.review.text.as_str()).collect();
    assert_eq!(texts, ["Second", "First"]);
    assert_eq!(detail.reviews[0].author.name, "Critic");

    db.cleanup().await;
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with PostGIS (DATABASE_URL)"]
async fn test_review_for_missing_store_is_not_found() {
    let db = TestDb::new().await;
    let critic = db.user("Critic").await;

    let result = db
        .directory()
        .add_review(delicious_core::StoreId::new(9999), critic.id, &review("Hmm", 3))
        .await;

    assert!(matches!(result, Err(DirectoryError::NotFound)));

    db.cleanup().await;
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with PostGIS (DATABASE_URL)"]
async fn test_review_rating_out_of_range_is_rejected() {
    let db = TestDb::new().await;
    let author = db.user("Wes").await;
    let store = db.store(&author, "Strict", [0.0, 0.0], &[]).await;

    let result = db
        .directory()
        .add_review(store.id, author.id, &review("Too good", 6))
        .await;

    assert!(matches!(result, Err(DirectoryError::Validation(_))));

    db.cleanup().await;
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with PostGIS (DATABASE_URL)"]
async fn test_unknown_slug_is_not_found() {
    let db = TestDb::new().await;

    let result = db.directory().detail("no-such-store").await;

    assert!(matches!(result, Err(DirectoryError::NotFound)));

    db.cleanup().await;
}
