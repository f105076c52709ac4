//! Review repository for database operations.
//!
//! Reviews reference stores and users by foreign key; a store's reviews are
//! always obtained through a join, never stored on the store row.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use delicious_core::validation::ValidReview;
use delicious_core::{Email, Rating, ReviewId, StoreId, UserId};

use super::RepositoryError;
use crate::models::review::{Review, ReviewWithAuthor};
use crate::models::user::UserSummary;

#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: ReviewId,
    author_id: UserId,
    store_id: StoreId,
    text: String,
    rating: Rating,
    created: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: row.id,
            author: row.author_id,
            store: row.store_id,
            text: row.text,
            rating: row.rating,
            created: row.created,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ReviewWithAuthorRow {
    #[sqlx(flatten)]
    review: ReviewRow,
    author_name: String,
    author_email: Email,
}

/// Repository for review database operations.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Attach a review to a store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store or author does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    #[tracing::instrument(skip(self, review), fields(rating = review.rating.get()))]
    pub async fn create(
        &self,
        store: StoreId,
        author: UserId,
        review: &ValidReview,
    ) -> Result<Review, RepositoryError> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r"
            INSERT INTO reviews (author_id, store_id, text, rating)
            VALUES ($1, $2, $3, $4)
            RETURNING id, author_id, store_id, text, rating, created
            ",
        )
        .bind(author)
        .bind(store)
        .bind(&review.text)
        .bind(review.rating)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "duplicate review"))?;

        Ok(row.into())
    }

    /// Reviews of a store with their authors, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_store(
        &self,
        store: StoreId,
    ) -> Result<Vec<ReviewWithAuthor>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReviewWithAuthorRow>(
            r"
            SELECT r.id, r.author_id, r.store_id, r.text, r.rating, r.created,
                   u.name AS author_name, u.email AS author_email
            FROM reviews r
            JOIN users u ON u.id = r.author_id
            WHERE r.store_id = $1
            ORDER BY r.created DESC, r.id DESC
            ",
        )
        .bind(store)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ReviewWithAuthor {
                author: UserSummary {
                    id: row.review.author_id,
                    name: row.author_name,
                    gravatar: row.author_email.gravatar_url(),
                },
                review: row.review.into(),
            })
            .collect())
    }
}
