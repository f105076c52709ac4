//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database)
//!
//! # Stores
//! GET  /, /stores              - First page of stores
//! GET  /stores/page/{page}     - Page of stores (clamped to the last page)
//! GET  /store/{slug}           - Store detail with reviews
//! GET  /add                    - Add store form (auth)
//! POST /add                    - Create store (auth, multipart)
//! GET  /stores/{id}/edit       - Edit store form (owner)
//! POST /add/{id}               - Update store (owner, multipart)
//! GET  /tags, /tags/{tag}      - Stores by tag with tag counts
//! GET  /top                    - Top rated stores
//! GET  /map                    - Find stores near a point
//! GET  /hearts                 - Hearted stores (auth)
//! POST /reviews/{id}           - Review a store (auth)
//!
//! # JSON API
//! GET  /api/search?q=          - Text search
//! GET  /api/stores/near        - Stores near ?lng=&lat=
//! POST /api/stores/{id}/heart  - Toggle heart (auth)
//!
//! # Auth
//! GET  /login, POST /login     - Login (POST rate limited)
//! GET  /register, POST         - Register and log in (POST rate limited)
//! GET|POST /logout             - Logout
//!
//! # Account (requires auth unless noted)
//! GET  /account, POST          - View/update name and email
//! POST /account/forgot         - Email a reset link (no auth, rate limited)
//! GET  /account/reset/{token}  - Reset form (no auth)
//! POST /account/reset/{token}  - Reset password (no auth, rate limited)
//! ```

pub mod account;
pub mod api;
pub mod auth;
pub mod reviews;
pub mod stores;
pub mod tags;
pub mod views;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Create the store routes router.
pub fn store_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(stores::index))
        .route("/stores", get(stores::index))
        .route("/stores/page/{page}", get(stores::page))
        .route("/stores/{id}/edit", get(stores::edit_page))
        .route("/store/{slug}", get(stores::show))
        .route("/add", get(stores::add_page).post(stores::create))
        .route("/add/{id}", post(stores::update))
        .route("/tags", get(tags::index))
        .route("/tags/{tag}", get(tags::show))
        .route("/top", get(stores::top))
        .route("/map", get(stores::map))
        .route("/hearts", get(stores::hearted))
        .route("/reviews/{id}", post(reviews::create))
}

/// Create the JSON API routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/search", get(api::search))
        .route("/stores/near", get(api::near))
        .route("/stores/{id}/heart", post(api::toggle_heart))
}

/// Create the auth and account routes router.
///
/// Only the POSTs that take credentials or send mail are rate limited.
pub fn auth_routes() -> Router<AppState> {
    let limiter = auth_rate_limiter();

    Router::new()
        .route(
            "/login",
            get(auth::login_page).merge(post(auth::login).layer(limiter.clone())),
        )
        .route(
            "/register",
            get(auth::register_page).merge(post(auth::register).layer(limiter.clone())),
        )
        .route("/logout", get(auth::logout).post(auth::logout))
        .route("/account", get(account::index).post(account::update))
        .route(
            "/account/forgot",
            post(account::forgot).layer(limiter.clone()),
        )
        .route(
            "/account/reset/{token}",
            get(account::reset_page).merge(post(account::reset).layer(limiter)),
        )
}

/// Create all application routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(store_routes())
        .merge(auth_routes())
        .nest("/api", api_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
