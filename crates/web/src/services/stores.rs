//! Store directory service.
//!
//! The façade the HTTP layer talks to. It owns the pagination policy,
//! ownership checks, and validation; the repositories underneath only run
//! queries.

use sqlx::PgPool;
use thiserror::Error;

use delicious_core::pagination::{self, DEFAULT_PAGE_SIZE, PageResolution};
use delicious_core::validation::{ReviewDraft, StoreDraft, ValidationError};
use delicious_core::{GeoPoint, Slug, StoreId, UserId};

use crate::db::stores::{DEFAULT_NEAR_RADIUS_METERS, DEFAULT_RESULT_LIMIT};
use crate::db::{RepositoryError, ReviewRepository, StoreRepository, UserRepository};
use crate::models::{
    NearbyStore, RatedStore, Review, SearchHit, Store, StoreDetail, TagCount,
};

/// Errors surfaced by directory operations.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Input failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The store (or a referenced row) does not exist.
    #[error("store not found")]
    NotFound,

    /// The caller does not own the store.
    #[error("you must own a store in order to edit it")]
    Forbidden,

    /// A uniqueness constraint was hit (e.g. a concurrent duplicate slug).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Repository/database error.
    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for DirectoryError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound,
            RepositoryError::Conflict(what) => Self::Conflict(what),
            other => Self::Repository(other),
        }
    }
}

impl From<sqlx::Error> for DirectoryError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

/// One rendered page of the store listing.
#[derive(Debug, Clone)]
pub struct StorePage {
    pub stores: Vec<Store>,
    pub page: i64,
    pub pages: i64,
    pub total: i64,
    /// Set when the requested page was past the end and got clamped.
    pub notice: Option<String>,
}

/// What to do with a request for a listing page.
#[derive(Debug, Clone)]
pub enum PageOutcome {
    /// The page number was below 1; send the client to page 1.
    RedirectToFirst,
    /// Serve this page (possibly clamped, see [`StorePage::notice`]).
    Page(StorePage),
}

/// Query façade over the store, review, and user repositories.
pub struct StoreDirectory<'a> {
    pool: &'a PgPool,
}

impl<'a> StoreDirectory<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    fn stores(&self) -> StoreRepository<'a> {
        StoreRepository::new(self.pool)
    }

    /// Resolve and fetch a listing page.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::Repository` if a query fails.
    #[tracing::instrument(skip(self))]
    pub async fn page(&self, requested: i64) -> Result<PageOutcome, DirectoryError> {
        if requested < 1 {
            return Ok(PageOutcome::RedirectToFirst);
        }

        let (stores, total) = self.stores().list_page(requested, DEFAULT_PAGE_SIZE).await?;

        match pagination::resolve_page(requested, total, DEFAULT_PAGE_SIZE) {
            PageResolution::RedirectToFirst => Ok(PageOutcome::RedirectToFirst),
            PageResolution::Serve { page, pages } => Ok(PageOutcome::Page(StorePage {
                stores,
                page,
                pages,
                total,
                notice: None,
            })),
            resolution @ PageResolution::Clamp { page, pages, .. } => {
                tracing::debug!(requested, page, "page past the end, clamping");
                let (stores, total) = self.stores().list_page(page, DEFAULT_PAGE_SIZE).await?;
                Ok(PageOutcome::Page(StorePage {
                    stores,
                    page,
                    pages,
                    total,
                    notice: resolution.notice(),
                }))
            }
        }
    }

    /// A store with its author and reviews.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::NotFound` if no store has this slug.
    pub async fn detail(&self, slug: &str) -> Result<StoreDetail, DirectoryError> {
        self.stores()
            .find_by_slug(&Slug::from_stored(slug))
            .await?
            .ok_or(DirectoryError::NotFound)
    }

    /// A store the given user is allowed to edit.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::NotFound` or `DirectoryError::Forbidden`.
    pub async fn editable(&self, id: StoreId, user: UserId) -> Result<Store, DirectoryError> {
        let store = self
            .stores()
            .get_by_id(id)
            .await?
            .ok_or(DirectoryError::NotFound)?;

        if !store.is_owned_by(user) {
            tracing::warn!(store_id = %id, user_id = %user, "edit attempt by non-owner");
            return Err(DirectoryError::Forbidden);
        }
        Ok(store)
    }

    /// Validate and insert a new store.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::Validation` with every failing field, or
    /// `DirectoryError::Conflict` if a concurrent create took the slug.
    pub async fn create(
        &self,
        draft: &StoreDraft,
        author: Option<UserId>,
    ) -> Result<Store, DirectoryError> {
        let store = draft.validate(author)?;
        Ok(self.stores().create(&store).await?)
    }

    /// Validate and apply an edit by `editor`.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::Forbidden` unless `editor` authored the store.
    pub async fn update(
        &self,
        id: StoreId,
        draft: &StoreDraft,
        editor: UserId,
    ) -> Result<Store, DirectoryError> {
        let existing = self.editable(id, editor).await?;
        let store = draft.validate(Some(existing.author))?;
        Ok(self.stores().update(&existing, &store).await?)
    }

    /// Stores for a tag page (`None` for every tagged store) and the tag
    /// cloud, fetched concurrently.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::Repository` if a query fails.
    pub async fn by_tag(
        &self,
        tag: Option<&str>,
    ) -> Result<(Vec<Store>, Vec<TagCount>), DirectoryError> {
        let stores = self.stores();
        let (tagged, counts) = tokio::try_join!(stores.list_by_tag(tag), stores.tag_counts())?;
        Ok((tagged, counts))
    }

    /// Stores near a point, within the default radius.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::Validation` if the coordinates are out of range.
    pub async fn near(&self, lng: f64, lat: f64) -> Result<Vec<NearbyStore>, DirectoryError> {
        let point = GeoPoint::new(lng, lat).map_err(|_| {
            ValidationError::single("coordinates", "You must supply coordinates!")
        })?;
        Ok(self
            .stores()
            .near(point, DEFAULT_NEAR_RADIUS_METERS, DEFAULT_RESULT_LIMIT)
            .await?)
    }

    /// Full-text store search.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::Repository` if the query fails.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchHit>, DirectoryError> {
        Ok(self.stores().search(query, DEFAULT_RESULT_LIMIT).await?)
    }

    /// Best-reviewed stores.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::Repository` if the query fails.
    pub async fn top_rated(&self) -> Result<Vec<RatedStore>, DirectoryError> {
        Ok(self.stores().top_rated(DEFAULT_RESULT_LIMIT).await?)
    }

    /// Stores the user has hearted.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::Repository` if the query fails.
    pub async fn hearted(&self, user: UserId) -> Result<Vec<Store>, DirectoryError> {
        Ok(self.stores().hearted_by(user).await?)
    }

    /// IDs of the stores the user has hearted.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::Repository` if the query fails.
    pub async fn hearts(&self, user: UserId) -> Result<Vec<StoreId>, DirectoryError> {
        Ok(UserRepository::new(self.pool).hearts(user).await?)
    }

    /// Validate and attach a review.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::Validation` or `DirectoryError::NotFound`.
    pub async fn add_review(
        &self,
        store: StoreId,
        author: UserId,
        draft: &ReviewDraft,
    ) -> Result<Review, DirectoryError> {
        let review = draft.validate()?;
        Ok(ReviewRepository::new(self.pool)
            .create(store, author, &review)
            .await?)
    }

    /// Flip the user's heart on a store; returns the updated heart set.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::NotFound` if the store does not exist.
    pub async fn toggle_heart(
        &self,
        user: UserId,
        store: StoreId,
    ) -> Result<Vec<StoreId>, DirectoryError> {
        Ok(UserRepository::new(self.pool)
            .toggle_heart(user, store)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_errors_map_to_directory_errors() {
        assert!(matches!(
            DirectoryError::from(RepositoryError::NotFound),
            DirectoryError::NotFound
        ));
        assert!(matches!(
            DirectoryError::from(RepositoryError::Conflict("slug".to_owned())),
            DirectoryError::Conflict(_)
        ));
        assert!(matches!(
            DirectoryError::from(RepositoryError::DataCorruption("x".to_owned())),
            DirectoryError::Repository(_)
        ));
    }

    #[test]
    fn test_validation_error_is_transparent() {
        let err = DirectoryError::from(ValidationError::single("name", "Please enter a store name!"));
        assert!(err.to_string().contains("Please enter a store name!"));
    }
}
