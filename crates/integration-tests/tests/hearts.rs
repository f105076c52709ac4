//! Heart toggling.

use delicious_integration_tests::{TestDb, ids};
use delicious_web::services::DirectoryError;

#[tokio::test]
#[ignore = "Requires PostgreSQL with PostGIS (DATABASE_URL)"]
async fn test_toggle_twice_restores_membership() {
    let db = TestDb::new().await;
    let author = db.user("Wes").await;
    let fan = db.user("Fan").await;
    let kept = db.store(&author, "Kept", [0.0, 0.0], &[]).await;
    let flipped = db.store(&author, "Flipped", [0.0, 0.0], &[]).await;
    let directory = db.directory();

    let before = directory
        .toggle_heart(fan.id, kept.id)
        .await
        .expect("toggle should succeed");
    assert_eq!(before, [kept.id]);

    let after_add = directory
        .toggle_heart(fan.id, flipped.id)
        .await
        .expect("toggle should succeed");
    assert_eq!(after_add, [kept.id, flipped.id]);

    let after_remove = directory
        .toggle_heart(fan.id, flipped.id)
        .await
        .expect("toggle should succeed");
    assert_eq!(after_remove, before);

    let hearted = directory.hearted(fan.id).await.expect("hearted should succeed");
    assert_eq!(ids(&hearted), [kept.id]);

    db.cleanup().await;
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with PostGIS (DATABASE_URL)"]
async fn test_hearts_are_per_user() {
    let db = TestDb::new().await;
    let author = db.user("Wes").await;
    let fan = db.user("Fan").await;
    let store = db.store(&author, "Shared", [0.0, 0.0], &[]).await;
    let directory = db.directory();

    directory
        .toggle_heart(fan.id, store.id)
        .await
        .expect("toggle should succeed");

    assert!(directory.hearts(author.id).await.expect("hearts").is_empty());
    assert_eq!(directory.hearts(fan.id).await.expect("hearts"), [store.id]);

    db.cleanup().await;
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with PostGIS (DATABASE_URL)"]
async fn test_heart_on_missing_store_is_not_found() {
    let db = TestDb::new().await;
    let fan = db.user("Fan").await;

    let result = db
        .directory()
        .toggle_heart(fan.id, delicious_core::StoreId::new(4242))
        .await;

    assert!(matches!(result, Err(DirectoryError::NotFound)));

    db.cleanup().await;
}
