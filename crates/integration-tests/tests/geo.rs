//! Geo and text search.

use delicious_core::GeoPoint;
use delicious_integration_tests::TestDb;
use delicious_web::db::stores::DEFAULT_NEAR_RADIUS_METERS;
use delicious_web::services::DirectoryError;

#[tokio::test]
#[ignore = "Requires PostgreSQL with PostGIS (DATABASE_URL)"]
async fn test_near_is_ordered_by_distance_within_radius() {
    let db = TestDb::new().await;
    let author = db.user("Wes").await;
    let origin = [-79.3832, 43.6532];

    // Roughly 1 km, 300 m, 5 km and 50 km from the origin.
    db.store(&author, "Mid", [-79.3832, 43.6622], &[]).await;
    db.store(&author, "Close", [-79.3832, 43.6559], &[]).await;
    db.store(&author, "Edge", [-79.3832, 43.6982], &[]).await;
    db.store(&author, "Far", [-79.3832, 44.1032], &[]).await;

    let nearby = db
        .directory()
        .near(origin[0], origin[1])
        .await
        .expect("near should succeed");

    let names: Vec<_> = nearby.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["Close", "Mid", "Edge"]);
    assert!(nearby.windows(2).all(|w| w[0].distance < w[1].distance));
    assert!(nearby.iter().all(|s| s.distance <= DEFAULT_NEAR_RADIUS_METERS));

    db.cleanup().await;
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with PostGIS (DATABASE_URL)"]
async fn test_near_respects_limit_and_radius() {
    let db = TestDb::new().await;
    let author = db.user("Wes").await;
    for i in 0..5 {
        let offset = f64::from(i) * 0.001;
        db.store(&author, &format!("Spot {i}"), [0.0, offset], &[]).await;
    }

    // Spots sit about 111 m apart, so all five are inside 1 km.
    let point = GeoPoint::new(0.0, 0.0).expect("valid point");
    let nearby = db
        .stores()
        .near(point, 1000.0, 3)
        .await
        .expect("near should succeed");

    let names: Vec<_> = nearby.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["Spot 0", "Spot 1", "Spot 2"]);
    assert!(nearby.windows(2).all(|w| w[0].distance < w[1].distance));

    let within = db
        .stores()
        .near(point, 250.0, 10)
        .await
        .expect("near should succeed");

    assert_eq!(within.len(), 3);
    assert!(within.iter().all(|s| s.distance <= 250.0));

    db.cleanup().await;
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with PostGIS (DATABASE_URL)"]
async fn test_near_rejects_out_of_range_coordinates() {
    let db = TestDb::new().await;

    let result = db.directory().near(200.0, 0.0).await;

    assert!(matches!(result, Err(DirectoryError::Validation(_))));

    db.cleanup().await;
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with PostGIS (DATABASE_URL)"]
async fn test_search_matches_name_or_description_by_relevance() {
    let db = TestDb::new().await;
    let author = db.user("Wes").await;
    db.store(&author, "Coffee Coffee Coffee", [0.0, 0.0], &[]).await;
    db.store(&author, "Bagel Barn", [0.0, 0.0], &[]).await;
    db.store(&author, "Beer Hall", [0.0, 0.0], &[]).await;

    let hits = db.directory().search("coffee beer").await.expect("search should succeed");

    let names: Vec<_> = hits.iter().map(|h| h.store.name.as_str()).collect();
    assert_eq!(names.len(), 2);
    assert_eq!(names[0], "Coffee Coffee Coffee");
    assert!(names.contains(&"Beer Hall"));
    assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));

    assert!(db.directory().search("   ").await.expect("search").is_empty());

    db.cleanup().await;
}
