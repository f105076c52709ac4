//! Slug assignment on create and update.

use delicious_integration_tests::{TestDb, draft};
use delicious_web::services::DirectoryError;

#[tokio::test]
#[ignore = "Requires PostgreSQL with PostGIS (DATABASE_URL)"]
async fn test_same_name_gets_numbered_slugs_in_creation_order() {
    let db = TestDb::new().await;
    let author = db.user("Wes").await;

    let mut slugs = Vec::new();
    for _ in 0..4 {
        let store = db.store(&author, "Bagel Barn", [-79.38, 43.65], &[]).await;
        slugs.push(store.slug.to_string());
    }

    assert_eq!(slugs, ["bagel-barn", "bagel-barn-2", "bagel-barn-3", "bagel-barn-4"]);

    db.cleanup().await;
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with PostGIS (DATABASE_URL)"]
async fn test_prefix_names_do_not_collide() {
    let db = TestDb::new().await;
    let author = db.user("Wes").await;

    let bagel = db.store(&author, "Bagel", [0.0, 0.0], &[]).await;
    let barn = db.store(&author, "Bagel Barn", [0.0, 0.0], &[]).await;

    assert_eq!(bagel.slug.as_str(), "bagel");
    assert_eq!(barn.slug.as_str(), "bagel-barn");

    db.cleanup().await;
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with PostGIS (DATABASE_URL)"]
async fn test_update_without_rename_keeps_slug() {
    let db = TestDb::new().await;
    let author = db.user("Wes").await;
    let store = db.store(&author, "Night Owl", [1.0, 1.0], &["Wifi"]).await;

    let mut edit = draft("Night Owl", [2.0, 2.0], &["Open Late"]);
    edit.description = Some("Now with pastries".to_owned());
    let updated = db
        .directory()
        .update(store.id, &edit, author.id)
        .await
        .expect("update should succeed");

    assert_eq!(updated.slug, store.slug);
    assert_eq!(updated.tags, ["Open Late"]);
    assert_eq!(updated.description.as_deref(), Some("Now with pastries"));

    db.cleanup().await;
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with PostGIS (DATABASE_URL)"]
async fn test_rename_recomputes_slug() {
    let db = TestDb::new().await;
    let author = db.user("Wes").await;
    db.store(&author, "Green Bowl", [0.0, 0.0], &[]).await;
    let store = db.store(&author, "Salad Spot", [0.0, 0.0], &[]).await;

    let updated = db
        .directory()
        .update(store.id, &draft("Green Bowl", [0.0, 0.0], &[]), author.id)
        .await
        .expect("update should succeed");

    assert_eq!(updated.slug.as_str(), "green-bowl-2");

    db.cleanup().await;
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with PostGIS (DATABASE_URL)"]
async fn test_only_the_author_may_edit() {
    let db = TestDb::new().await;
    let author = db.user("Wes").await;
    let other = db.user("Scott").await;
    let store = db.store(&author, "Pint House", [0.0, 0.0], &[]).await;

    let result = db
        .directory()
        .update(store.id, &draft("Mine Now", [0.0, 0.0], &[]), other.id)
        .await;

    assert!(matches!(result, Err(DirectoryError::Forbidden)));

    db.cleanup().await;
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with PostGIS (DATABASE_URL)"]
async fn test_name_whose_slug_looks_numbered_does_not_block_base_name() {
    let db = TestDb::new().await;
    let author = db.user("Wes").await;

    let two = db.store(&author, "Foo 2", [0.0, 0.0], &[]).await;
    let foo = db.store(&author, "Foo", [0.0, 0.0], &[]).await;
    let again = db.store(&author, "Foo", [0.0, 0.0], &[]).await;

    assert_eq!(two.slug.as_str(), "foo-2");
    assert_eq!(foo.slug.as_str(), "foo-3");
    assert_eq!(again.slug.as_str(), "foo-4");

    db.cleanup().await;
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with PostGIS (DATABASE_URL)"]
async fn test_create_after_rename_gap_takes_smallest_free_suffix() {
    let db = TestDb::new().await;
    let author = db.user("Wes").await;
    let first = db.store(&author, "Foo", [0.0, 0.0], &[]).await;
    db.store(&author, "Foo", [0.0, 0.0], &[]).await;
    db.store(&author, "Foo", [0.0, 0.0], &[]).await;

    db.directory()
        .update(first.id, &draft("Bar", [0.0, 0.0], &[]), author.id)
        .await
        .expect("rename should succeed");

    // "foo-2" and "foo-3" remain, so the count points at the taken "foo-3".
    let next = db
        .directory()
        .create(&draft("Foo", [0.0, 0.0], &[]), Some(author.id))
        .await
        .expect("create should succeed");

    assert_eq!(next.slug.as_str(), "foo-4");

    db.cleanup().await;
}

/// Slug assignment counts then inserts without a lock, so two concurrent
/// creates with the same name can pick the same slug. The unique constraint
/// rejects the loser, which picks again.
#[tokio::test]
#[ignore = "Requires PostgreSQL with PostGIS (DATABASE_URL)"]
async fn test_concurrent_same_name_both_get_distinct_slugs() {
    let db = TestDb::new().await;
    let author = db.user("Wes").await;
    let first = draft("Race Cafe", [0.0, 0.0], &[]);
    let second = first.clone();

    let directory = db.directory();
    let (a, b) = tokio::join!(
        directory.create(&first, Some(author.id)),
        directory.create(&second, Some(author.id)),
    );

    let mut slugs = [
        a.expect("first create should succeed").slug.to_string(),
        b.expect("second create should succeed").slug.to_string(),
    ];
    slugs.sort();
    assert_eq!(slugs, ["race-cafe", "race-cafe-2"]);

    db.cleanup().await;
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with PostGIS (DATABASE_URL)"]
async fn test_invalid_draft_reports_every_field() {
    let db = TestDb::new().await;

    let result = db.directory().create(&Default::default(), None).await;

    let Err(DirectoryError::Validation(errors)) = result else {
        panic!("expected a validation error");
    };
    let fields: Vec<_> = errors.errors.iter().map(|e| e.field).collect();
    assert!(fields.contains(&"name"));
    assert!(fields.contains(&"location.address"));
    assert!(fields.contains(&"location.coordinates"));
    assert!(fields.contains(&"author"));

    db.cleanup().await;
}
