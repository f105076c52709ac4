//! Pagination and tag aggregation.

use std::collections::HashSet;

use delicious_core::pagination::DEFAULT_PAGE_SIZE;
use delicious_integration_tests::{TestDb, ids};
use delicious_web::services::PageOutcome;

#[tokio::test]
#[ignore = "Requires PostgreSQL with PostGIS (DATABASE_URL)"]
async fn test_pages_concatenate_to_full_newest_first_listing() {
    let db = TestDb::new().await;
    let author = db.user("Wes").await;

    let mut created = Vec::new();
    for i in 0..10 {
        created.push(db.store(&author, &format!("Store {i}"), [0.0, 0.0], &[]).await.id);
    }
    created.reverse();

    let mut seen = Vec::new();
    let mut page = 1;
    loop {
        let (stores, total) = db
            .stores()
            .list_page(page, DEFAULT_PAGE_SIZE)
            .await
            .expect("list_page should succeed");
        assert_eq!(total, 10);
        if stores.is_empty() {
            break;
        }
        assert!(stores.len() <= 4);
        seen.extend(ids(&stores));
        page += 1;
    }

    assert_eq!(page, 4);
    assert_eq!(seen, created);
    assert_eq!(seen.iter().collect::<HashSet<_>>().len(), seen.len());

    db.cleanup().await;
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with PostGIS (DATABASE_URL)"]
async fn test_page_past_the_end_is_clamped_with_notice() {
    let db = TestDb::new().await;
    let author = db.user("Wes").await;
    for i in 0..5 {
        db.store(&author, &format!("Store {i}"), [0.0, 0.0], &[]).await;
    }

    let outcome = db.directory().page(9).await.expect("page should succeed");

    let PageOutcome::Page(page) = outcome else {
        panic!("expected a page");
    };
    assert_eq!(page.page, 2);
    assert_eq!(page.pages, 2);
    assert_eq!(page.stores.len(), 1);
    assert_eq!(
        page.notice.as_deref(),
        Some("Hey! You asked for page 9. But that page doesn't exist. So I put you on page 2")
    );

    db.cleanup().await;
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with PostGIS (DATABASE_URL)"]
async fn test_empty_directory_serves_first_page_and_rejects_zero() {
    let db = TestDb::new().await;
    let directory = db.directory();

    let PageOutcome::Page(page) = directory.page(3).await.expect("page should succeed") else {
        panic!("expected a page");
    };
    assert_eq!(page.page, 1);
    assert_eq!(page.total, 0);
    assert!(page.stores.is_empty());
    assert!(page.notice.is_none());

    assert!(matches!(
        directory.page(0).await.expect("page should succeed"),
        PageOutcome::RedirectToFirst
    ));

    db.cleanup().await;
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with PostGIS (DATABASE_URL)"]
async fn test_tag_counts_ordered_by_count() {
    let db = TestDb::new().await;
    let author = db.user("Wes").await;
    db.store(&author, "One", [0.0, 0.0], &["a", "b"]).await;
    db.store(&author, "Two", [0.0, 0.0], &["a"]).await;
    db.store(&author, "Three", [0.0, 0.0], &[]).await;

    let counts: Vec<_> = db
        .stores()
        .tag_counts()
        .await
        .expect("tag_counts should succeed")
        .into_iter()
        .map(|t| (t.tag, t.count))
        .collect();

    assert_eq!(counts, [("a".to_owned(), 2), ("b".to_owned(), 1)]);

    db.cleanup().await;
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with PostGIS (DATABASE_URL)"]
async fn test_by_tag_filters_and_any_means_tagged() {
    let db = TestDb::new().await;
    let author = db.user("Wes").await;
    let one = db.store(&author, "One", [0.0, 0.0], &["a", "b"]).await;
    let two = db.store(&author, "Two", [0.0, 0.0], &["a"]).await;
    db.store(&author, "Three", [0.0, 0.0], &[]).await;

    let directory = db.directory();
    let (tagged_b, counts) = directory.by_tag(Some("b")).await.expect("by_tag should succeed");
    assert_eq!(ids(&tagged_b), [one.id]);
    assert_eq!(counts.len(), 2);

    let (any, _) = directory.by_tag(None).await.expect("by_tag should succeed");
    let any: HashSet<_> = ids(&any).into_iter().collect();
    assert_eq!(any, HashSet::from([one.id, two.id]));

    db.cleanup().await;
}
