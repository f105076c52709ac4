//! User repository for database operations.
//!
//! Accounts, password hashes, reset tokens, and each user's set of hearted
//! stores.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use delicious_core::{Email, StoreId, UserId};

use super::RepositoryError;
use crate::models::user::User;

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: UserId,
    email: Email,
    name: String,
    created: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            name: row.name,
            created: row.created,
        }
    }
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, name, created FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await
        .map_err(decode_error)?;

        Ok(row.map(Into::into))
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, name, created FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(decode_error)?;

        Ok(row.map(Into::into))
    }

    /// Create a new user with a hashed password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_with_password(
        &self,
        name: &str,
        email: &Email,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, email, name, created
            ",
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "email already exists"))?;

        Ok(row.into())
    }

    /// Get a user's password hash by email.
    ///
    /// Returns `None` if the user doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct Row {
            #[sqlx(flatten)]
            user: UserRow,
            password_hash: String,
        }

        let row = sqlx::query_as::<_, Row>(
            "SELECT id, email, name, created, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await
        .map_err(decode_error)?;

        Ok(row.map(|r| (r.user.into(), r.password_hash)))
    }

    /// Change a user's display name and email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email belongs to another account.
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn update_account(
        &self,
        id: UserId,
        name: &str,
        email: &Email,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            UPDATE users SET name = $2, email = $3
            WHERE id = $1
            RETURNING id, email, name, created
            ",
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "email already exists"))?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Store a password reset token and its expiry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_reset_token(
        &self,
        id: UserId,
        token: &str,
        expires: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE users SET reset_password_token = $2, reset_password_expires = $3
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(token)
        .bind(expires)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Find the user holding `token`, if it has not expired.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_valid_reset_token(
        &self,
        token: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, email, name, created FROM users
            WHERE reset_password_token = $1 AND reset_password_expires > now()
            ",
        )
        .bind(token)
        .fetch_optional(self.pool)
        .await
        .map_err(decode_error)?;

        Ok(row.map(Into::into))
    }

    /// Replace the password of the user holding a still-valid `token`, and
    /// clear the token so it cannot be used twice.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the token is unknown or expired.
    pub async fn reset_password(
        &self,
        token: &str,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            UPDATE users
            SET password_hash = $2, reset_password_token = NULL, reset_password_expires = NULL
            WHERE reset_password_token = $1 AND reset_password_expires > now()
            RETURNING id, email, name, created
            ",
        )
        .bind(token)
        .bind(password_hash)
        .fetch_optional(self.pool)
        .await
        .map_err(decode_error)?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// IDs of the stores a user has hearted, ascending.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn hearts(&self, id: UserId) -> Result<Vec<StoreId>, RepositoryError> {
        let hearts = sqlx::query_scalar::<_, StoreId>(
            "SELECT store_id FROM user_hearts WHERE user_id = $1 ORDER BY store_id",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(hearts)
    }

    /// Add `store` to the user's hearts if absent, remove it if present.
    ///
    /// Runs as one statement so concurrent toggles never leave a duplicate.
    /// Returns the updated set of hearted store IDs, ascending.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store or user does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn toggle_heart(
        &self,
        id: UserId,
        store: StoreId,
    ) -> Result<Vec<StoreId>, RepositoryError> {
        // CTEs share one snapshot, so the final set is assembled from the
        // pre-statement rows minus what was removed plus what was added.
        let hearts = sqlx::query_scalar::<_, StoreId>(
            r"
            WITH removed AS (
                DELETE FROM user_hearts
                WHERE user_id = $1 AND store_id = $2
                RETURNING store_id
            ),
            added AS (
                INSERT INTO user_hearts (user_id, store_id)
                SELECT $1, $2
                WHERE NOT EXISTS (SELECT 1 FROM removed)
                ON CONFLICT DO NOTHING
                RETURNING store_id
            )
            SELECT store_id FROM user_hearts
            WHERE user_id = $1 AND store_id NOT IN (SELECT store_id FROM removed)
            UNION
            SELECT store_id FROM added
            ORDER BY store_id
            ",
        )
        .bind(id)
        .bind(store)
        .fetch_all(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "heart already recorded"))?;

        Ok(hearts)
    }
}

/// Surface undecodable columns (e.g. a malformed stored email) as corruption.
fn decode_error(err: sqlx::Error) -> RepositoryError {
    match err {
        sqlx::Error::ColumnDecode { index, source } => {
            RepositoryError::DataCorruption(format!("column {index}: {source}"))
        }
        other => RepositoryError::Database(other),
    }
}
