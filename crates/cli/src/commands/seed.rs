//! Load or clear sample stores.
//!
//! # Usage
//!
//! ```bash
//! # Load stores from a JSON file, owned by an existing user
//! delicious seed load --file data/stores.json --author-email wes@example.com
//!
//! # Remove every store (reviews and hearts go with them)
//! delicious seed clear
//! ```
//!
//! The file is a JSON array of stores:
//!
//! ```json
//! [{ "name": "Bagel Barn", "description": "Bagels", "address": "1 Main St",
//!    "coordinates": [-79.38, 43.65], "tags": ["Wifi"], "photo": null }]
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info, warn};

use delicious_core::Email;
use delicious_core::validation::StoreDraft;
use delicious_web::db::{RepositoryError, StoreRepository, UserRepository, create_pool};

use super::{MissingEnvVar, database_url};

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Env(#[from] MissingEnvVar),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Could not read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid seed file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("No user with email {0}; register first")]
    UnknownAuthor(String),

    #[error("{0} stores failed validation")]
    Invalid(usize),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// One store in a seed file.
#[derive(Debug, Deserialize)]
struct SeedStore {
    #[serde(flatten)]
    draft: StoreDraft,
    /// File name under the uploads directory.
    #[serde(default)]
    photo: Option<String>,
}

impl SeedStore {
    fn into_draft(self) -> StoreDraft {
        StoreDraft {
            photo: self.photo,
            ..self.draft
        }
    }
}

/// Load stores from `file_path`, authored by the user with `author_email`.
///
/// Every store is validated before anything is written.
///
/// # Errors
///
/// Returns an error if the file is missing or malformed, the author does
/// not exist, any store is invalid, or a database write fails.
pub async fn load(file_path: &str, author_email: &str) -> Result<usize, SeedError> {
    let url = database_url()?;

    let path = Path::new(file_path);
    if !path.exists() {
        return Err(SeedError::FileNotFound(file_path.to_owned()));
    }

    info!(path = %file_path, "Loading stores from file");
    let content = tokio::fs::read_to_string(path).await?;
    let seeds: Vec<SeedStore> = serde_json::from_str(&content)?;
    info!(stores = seeds.len(), "Parsed seed file");

    let email = Email::parse(author_email)
        .map_err(|_| SeedError::InvalidEmail(author_email.to_owned()))?;

    let pool = create_pool(&url).await?;
    info!("Connected to database");

    let author = UserRepository::new(&pool)
        .get_by_email(&email)
        .await?
        .ok_or_else(|| SeedError::UnknownAuthor(author_email.to_owned()))?;

    let mut valid = Vec::with_capacity(seeds.len());
    let mut failures = 0;
    for (index, seed) in seeds.into_iter().enumerate() {
        match seed.into_draft().validate(Some(author.id)) {
            Ok(store) => valid.push(store),
            Err(e) => {
                failures += 1;
                error!(index, error = %e, "Invalid store");
            }
        }
    }
    if failures > 0 {
        return Err(SeedError::Invalid(failures));
    }

    let stores = StoreRepository::new(&pool);
    for store in &valid {
        let created = stores.create(store).await?;
        info!(slug = %created.slug, "Created store");
    }

    pool.close().await;
    info!(created = valid.len(), "Seeding complete!");
    Ok(valid.len())
}

/// Delete every store. Reviews and hearts cascade.
///
/// # Errors
///
/// Returns an error if the database is unreachable.
pub async fn clear() -> Result<u64, SeedError> {
    let url = database_url()?;
    let pool = create_pool(&url).await?;

    let deleted = sqlx::query("DELETE FROM stores")
        .execute(&pool)
        .await?
        .rows_affected();

    if deleted == 0 {
        warn!("No stores to delete");
    } else {
        info!(deleted, "Deleted stores");
    }

    pool.close().await;
    Ok(deleted)
}
