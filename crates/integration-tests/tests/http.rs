//! End-to-end HTTP flows against an in-process server.

use reqwest::{Client, StatusCode, redirect::Policy};
use serde_json::Value;

use delicious_integration_tests::TestDb;

fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

async fn register(client: &Client, base_url: &str, email: &str) {
    let resp = client
        .post(format!("{base_url}/register"))
        .form(&[
            ("name", "Wes"),
            ("email", email),
            ("password", "hunter22"),
            ("password_confirm", "hunter22"),
        ])
        .send()
        .await
        .expect("Failed to register");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with PostGIS (DATABASE_URL)"]
async fn test_health_endpoints() {
    let db = TestDb::new().await;
    let base_url = db.spawn_app().await;
    let client = client();

    let live = client.get(format!("{base_url}/health")).send().await.expect("health");
    assert_eq!(live.status(), StatusCode::OK);

    let ready = client
        .get(format!("{base_url}/health/ready"))
        .send()
        .await
        .expect("ready");
    assert_eq!(ready.status(), StatusCode::OK);

    db.cleanup().await;
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with PostGIS (DATABASE_URL)"]
async fn test_add_page_requires_login() {
    let db = TestDb::new().await;
    let base_url = db.spawn_app().await;

    let resp = client().get(format!("{base_url}/add")).send().await.expect("add");

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()["location"], "/login");

    db.cleanup().await;
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with PostGIS (DATABASE_URL)"]
async fn test_heart_api_needs_session_then_toggles() {
    let db = TestDb::new().await;
    let author = db.user("Owner").await;
    let store = db.store(&author, "Hearty", [0.0, 0.0], &[]).await;
    let base_url = db.spawn_app().await;
    let client = client();
    let heart_url = format!("{base_url}/api/stores/{}/heart", store.id.as_i32());

    let anonymous = client.post(&heart_url).send().await.expect("heart");
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    register(&client, &base_url, "fan@example.com").await;

    let body: Value = client
        .post(&heart_url)
        .send()
        .await
        .expect("heart")
        .json()
        .await
        .expect("json body");
    assert_eq!(body["hearts"], serde_json::json!([store.id.as_i32()]));

    let body: Value = client
        .post(&heart_url)
        .send()
        .await
        .expect("heart")
        .json()
        .await
        .expect("json body");
    assert_eq!(body["hearts"], serde_json::json!([]));

    db.cleanup().await;
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with PostGIS (DATABASE_URL)"]
async fn test_page_past_the_end_redirects_to_last_page() {
    let db = TestDb::new().await;
    let author = db.user("Owner").await;
    for i in 0..5 {
        db.store(&author, &format!("Store {i}"), [0.0, 0.0], &[]).await;
    }
    let base_url = db.spawn_app().await;

    let resp = client()
        .get(format!("{base_url}/stores/page/7"))
        .send()
        .await
        .expect("page");

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()["location"], "/stores/page/2");

    db.cleanup().await;
}

#[tokio::test]
#[ignore = "Requires PostgreSQL with PostGIS (DATABASE_URL)"]
async fn test_search_api_returns_json() {
    let db = TestDb::new().await;
    let author = db.user("Owner").await;
    db.store(&author, "Espresso Bar", [0.0, 0.0], &[]).await;
    let base_url = db.spawn_app().await;

    let hits: Vec<Value> = client()
        .get(format!("{base_url}/api/search?q=espresso"))
        .send()
        .await
        .expect("search")
        .json()
        .await
        .expect("json body");

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["slug"], "espresso-bar");

    db.cleanup().await;
}
