//! Store repository for database operations.
//!
//! Every query here is composed SQL: slug collisions are counted with a
//! regular expression, geo queries go through PostGIS, text search through
//! the generated `tsvector`, and aggregates through `GROUP BY`. Nothing is
//! filtered or sorted in Rust.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use delicious_core::pagination;
use delicious_core::validation::ValidStore;
use delicious_core::{Email, GeoPoint, Slug, StoreId, UserId};

use super::RepositoryError;
use super::reviews::ReviewRepository;
use crate::models::store::{
    Location, NearbyStore, RatedStore, SearchHit, Store, StoreDetail, TagCount,
};
use crate::models::user::UserSummary;

/// Default search radius for [`StoreRepository::near`], in meters.
pub const DEFAULT_NEAR_RADIUS_METERS: f64 = 10_000.0;

/// Default result cap for geo, text, and top-rated queries.
pub const DEFAULT_RESULT_LIMIT: i64 = 10;

/// How many times a create or rename picks a slug before giving up on a
/// unique violation.
pub const SLUG_ATTEMPTS: u32 = 3;

/// Columns selected for a full [`Store`], qualified with the `s` alias.
macro_rules! store_columns {
    () => {
        "s.id, s.name, s.slug, s.description, s.longitude, s.latitude, s.address, \
         s.photo, s.tags, s.author_id, s.created"
    };
}

#[derive(Debug, sqlx::FromRow)]
struct StoreRow {
    id: StoreId,
    name: String,
    slug: Slug,
    description: Option<String>,
    longitude: f64,
    latitude: f64,
    address: String,
    photo: Option<String>,
    tags: Vec<String>,
    author_id: UserId,
    created: DateTime<Utc>,
}

impl StoreRow {
    fn into_store(self) -> Result<Store, RepositoryError> {
        Ok(Store {
            id: self.id,
            name: self.name,
            slug: self.slug,
            description: self.description,
            location: location(self.longitude, self.latitude, self.address)?,
            photo: self.photo,
            tags: self.tags,
            author: self.author_id,
            created: self.created,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StoreWithAuthorRow {
    #[sqlx(flatten)]
    store: StoreRow,
    author_name: String,
    author_email: Email,
}

#[derive(Debug, sqlx::FromRow)]
struct NearbyRow {
    slug: Slug,
    name: String,
    description: Option<String>,
    photo: Option<String>,
    longitude: f64,
    latitude: f64,
    address: String,
    distance: f64,
}

#[derive(Debug, sqlx::FromRow)]
struct SearchRow {
    #[sqlx(flatten)]
    store: StoreRow,
    score: f32,
}

#[derive(Debug, sqlx::FromRow)]
struct TagCountRow {
    tag: String,
    count: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct RatedRow {
    #[sqlx(flatten)]
    store: StoreRow,
    average_rating: f64,
    review_count: i64,
}

fn location(lng: f64, lat: f64, address: String) -> Result<Location, RepositoryError> {
    let point = GeoPoint::new(lng, lat).map_err(|e| {
        RepositoryError::DataCorruption(format!("invalid coordinates in database: {e}"))
    })?;
    Ok(Location { point, address })
}

fn into_stores(rows: Vec<StoreRow>) -> Result<Vec<Store>, RepositoryError> {
    rows.into_iter().map(StoreRow::into_store).collect()
}

/// Repository for store database operations.
pub struct StoreRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StoreRepository<'a> {
    /// Create a new store repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Pick a slug for `name` that does not collide with existing stores.
    ///
    /// Counts stored slugs equal to the base or to `base-<n>`; with `N > 0`
    /// matches the first choice is `base-(N+1)`. The count can land on a
    /// slug that is already taken, because `base-<n>` may also be the base
    /// slug of another name ("Foo 2") or a rename may have left a gap. In
    /// that case the smallest unused suffix from 2 upwards is used instead.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn next_slug(&self, name: &str) -> Result<Slug, RepositoryError> {
        let base = Slug::from_name(name);
        let taken: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stores WHERE slug ~* $1")
            .bind(base.collision_pattern())
            .fetch_one(self.pool)
            .await?;

        if taken == 0 {
            return Ok(base);
        }

        let candidate = base.with_suffix(taken + 1);
        if !self.slug_exists(&candidate).await? {
            return Ok(candidate);
        }

        // N matching slugs cannot fill all N + 1 suffixes in 2..=N+2.
        let free: Option<i64> = sqlx::query_scalar(
            "SELECT n FROM generate_series(2::bigint, $2 + 2) AS n \
             WHERE NOT EXISTS (SELECT 1 FROM stores WHERE slug = $1 || '-' || n) \
             ORDER BY n LIMIT 1",
        )
        .bind(&base)
        .bind(taken)
        .fetch_optional(self.pool)
        .await?;

        tracing::debug!(base = %base, taken, ?free, "counted slug is taken");
        Ok(base.with_suffix(free.unwrap_or(taken + 2)))
    }

    async fn slug_exists(&self, slug: &Slug) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM stores WHERE slug = $1)")
            .bind(slug)
            .fetch_one(self.pool)
            .await?;
        Ok(exists)
    }

    /// Insert a validated store.
    ///
    /// A concurrent insert can claim the chosen slug between counting and
    /// inserting; the slug is then picked again, up to
    /// [`SLUG_ATTEMPTS`] times.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if every attempt lost a slug
    /// race, `RepositoryError::NotFound` if the author does not exist.
    #[tracing::instrument(skip(self, store), fields(name = %store.name))]
    pub async fn create(&self, store: &ValidStore) -> Result<Store, RepositoryError> {
        let mut attempt = 1;
        loop {
            let slug = self.next_slug(&store.name).await?;
            match self.insert(store, &slug).await {
                Err(RepositoryError::Conflict(_)) if attempt < SLUG_ATTEMPTS => {
                    tracing::warn!(slug = %slug, attempt, "slug claimed concurrently, retrying");
                    attempt += 1;
                }
                Ok(row) => {
                    tracing::info!(slug = %row.slug, "store created");
                    return row.into_store();
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn insert(&self, store: &ValidStore, slug: &Slug) -> Result<StoreRow, RepositoryError> {
        sqlx::query_as::<_, StoreRow>(concat!(
            "INSERT INTO stores AS s \
             (name, slug, description, longitude, latitude, address, photo, tags, author_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING ",
            store_columns!()
        ))
        .bind(&store.name)
        .bind(slug)
        .bind(&store.description)
        .bind(store.point.lng())
        .bind(store.point.lat())
        .bind(&store.address)
        .bind(&store.photo)
        .bind(&store.tags)
        .bind(store.author)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "store slug already exists"))
    }

    /// Overwrite an existing store with validated input.
    ///
    /// The slug is recomputed only when the name actually changed, and is
    /// picked again if a concurrent write claims it first. The author and
    /// creation time are never touched, and a missing photo keeps the
    /// current one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store vanished meanwhile,
    /// `RepositoryError::Conflict` if every attempt lost a slug race.
    #[tracing::instrument(skip(self, existing, store), fields(store_id = %existing.id))]
    pub async fn update(
        &self,
        existing: &Store,
        store: &ValidStore,
    ) -> Result<Store, RepositoryError> {
        let renamed = existing.name != store.name;
        let mut attempt = 1;
        loop {
            let slug = if renamed {
                self.next_slug(&store.name).await?
            } else {
                existing.slug.clone()
            };
            match self.overwrite(existing.id, store, &slug).await {
                Err(RepositoryError::Conflict(_)) if renamed && attempt < SLUG_ATTEMPTS => {
                    tracing::warn!(slug = %slug, attempt, "slug claimed concurrently, retrying");
                    attempt += 1;
                }
                result => return result?.into_store(),
            }
        }
    }

    async fn overwrite(
        &self,
        id: StoreId,
        store: &ValidStore,
        slug: &Slug,
    ) -> Result<StoreRow, RepositoryError> {
        sqlx::query_as::<_, StoreRow>(concat!(
            "UPDATE stores AS s SET \
             name = $2, slug = $3, description = $4, longitude = $5, latitude = $6, \
             address = $7, photo = COALESCE($8, s.photo), tags = $9 \
             WHERE s.id = $1 \
             RETURNING ",
            store_columns!()
        ))
        .bind(id)
        .bind(&store.name)
        .bind(slug)
        .bind(&store.description)
        .bind(store.point.lng())
        .bind(store.point.lat())
        .bind(&store.address)
        .bind(&store.photo)
        .bind(&store.tags)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "store slug already exists"))?
        .ok_or(RepositoryError::NotFound)
    }

    /// Get a store by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        sqlx::query_as::<_, StoreRow>(concat!(
            "SELECT ",
            store_columns!(),
            " FROM stores s WHERE s.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .map(StoreRow::into_store)
        .transpose()
    }

    /// Get a store by slug with its author and reviews (newest first).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn find_by_slug(&self, slug: &Slug) -> Result<Option<StoreDetail>, RepositoryError> {
        let row = sqlx::query_as::<_, StoreWithAuthorRow>(concat!(
            "SELECT ",
            store_columns!(),
            ", u.name AS author_name, u.email AS author_email \
             FROM stores s JOIN users u ON u.id = s.author_id \
             WHERE s.slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let author_summary = UserSummary {
            id: row.store.author_id,
            name: row.author_name,
            gravatar: row.author_email.gravatar_url(),
        };
        let store = row.store.into_store()?;
        let reviews = ReviewRepository::new(self.pool)
            .list_for_store(store.id)
            .await?;

        Ok(Some(StoreDetail {
            store,
            author_summary,
            reviews,
        }))
    }

    /// One page of stores, newest first, plus the total store count.
    ///
    /// Pages past the end are empty; clamping is the caller's business.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_page(
        &self,
        page: i64,
        page_size: i64,
    ) -> Result<(Vec<Store>, i64), RepositoryError> {
        let rows = sqlx::query_as::<_, StoreRow>(concat!(
            "SELECT ",
            store_columns!(),
            " FROM stores s ORDER BY s.created DESC, s.id DESC OFFSET $1 LIMIT $2"
        ))
        .bind(pagination::offset(page, page_size))
        .bind(page_size);

        let (rows, total) = tokio::try_join!(rows.fetch_all(self.pool), self.count())?;
        Ok((into_stores(rows)?, total))
    }

    /// Total number of stores.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if the query fails.
    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM stores")
            .fetch_one(self.pool)
            .await
    }

    /// Stores carrying `tag`, or with `None`, every store that has any tag.
    ///
    /// `None` lists only stores with at least one tag; a store whose `tags`
    /// is empty is left out on purpose rather than counted as "any".
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_tag(&self, tag: Option<&str>) -> Result<Vec<Store>, RepositoryError> {
        let rows = match tag {
            Some(tag) => {
                sqlx::query_as::<_, StoreRow>(concat!(
                    "SELECT ",
                    store_columns!(),
                    " FROM stores s WHERE $1 = ANY(s.tags) ORDER BY s.created DESC, s.id DESC"
                ))
                .bind(tag)
                .fetch_all(self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, StoreRow>(concat!(
                    "SELECT ",
                    store_columns!(),
                    " FROM stores s WHERE cardinality(s.tags) > 0 \
                     ORDER BY s.created DESC, s.id DESC"
                ))
                .fetch_all(self.pool)
                .await?
            }
        };
        into_stores(rows)
    }

    /// Stores whose ID is in `ids`, newest first. Unknown IDs are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_ids(&self, ids: &[StoreId]) -> Result<Vec<Store>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, StoreRow>(concat!(
            "SELECT ",
            store_columns!(),
            " FROM stores s WHERE s.id = ANY($1) ORDER BY s.created DESC, s.id DESC"
        ))
        .bind(ids)
        .fetch_all(self.pool)
        .await?;
        into_stores(rows)
    }

    /// Stores the user has hearted, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn hearted_by(&self, user: UserId) -> Result<Vec<Store>, RepositoryError> {
        let rows = sqlx::query_as::<_, StoreRow>(concat!(
            "SELECT ",
            store_columns!(),
            " FROM stores s JOIN user_hearts h ON h.store_id = s.id \
             WHERE h.user_id = $1 ORDER BY s.created DESC, s.id DESC"
        ))
        .bind(user)
        .fetch_all(self.pool)
        .await?;
        into_stores(rows)
    }

    /// Stores within `max_distance_meters` of `point`, nearest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[tracing::instrument(skip(self))]
    pub async fn near(
        &self,
        point: GeoPoint,
        max_distance_meters: f64,
        limit: i64,
    ) -> Result<Vec<NearbyStore>, RepositoryError> {
        let rows = sqlx::query_as::<_, NearbyRow>(
            r"
            WITH origin AS (
                SELECT ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography AS geog
            )
            SELECT s.slug, s.name, s.description, s.photo,
                   s.longitude, s.latitude, s.address,
                   ST_Distance(s.geog, origin.geog) AS distance
            FROM stores s, origin
            WHERE ST_DWithin(s.geog, origin.geog, $3)
            ORDER BY distance ASC, s.id ASC
            LIMIT $4
            ",
        )
        .bind(point.lng())
        .bind(point.lat())
        .bind(max_distance_meters)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|r| {
                Ok(NearbyStore {
                    slug: r.slug,
                    name: r.name,
                    description: r.description,
                    photo: r.photo,
                    location: location(r.longitude, r.latitude, r.address)?,
                    distance: r.distance,
                })
            })
            .collect()
    }

    /// Full-text search over name and description, best match first.
    ///
    /// Any term may match. A blank query returns nothing without a
    /// round-trip.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[tracing::instrument(skip(self))]
    pub async fn search(&self, query: &str, limit: i64) -> Result<Vec<SearchHit>, RepositoryError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, SearchRow>(concat!(
            "WITH q AS ( \
                 SELECT replace(plainto_tsquery('english', $1)::text, '&', '|')::tsquery AS query \
             ) \
             SELECT ",
            store_columns!(),
            ", ts_rank(s.search_vector, q.query) AS score \
             FROM stores s, q \
             WHERE s.search_vector @@ q.query \
             ORDER BY score DESC, s.id ASC \
             LIMIT $2"
        ))
        .bind(query)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|r| {
                Ok(SearchHit {
                    store: r.store.into_store()?,
                    score: r.score,
                })
            })
            .collect()
    }

    /// How many stores carry each tag, most common first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn tag_counts(&self) -> Result<Vec<TagCount>, RepositoryError> {
        let rows = sqlx::query_as::<_, TagCountRow>(
            r"
            SELECT tag, COUNT(*) AS count
            FROM stores, unnest(stores.tags) AS tag
            GROUP BY tag
            ORDER BY count DESC, tag ASC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| TagCount {
                tag: r.tag,
                count: r.count,
            })
            .collect())
    }

    /// Stores with at least two reviews, ranked by average rating.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn top_rated(&self, limit: i64) -> Result<Vec<RatedStore>, RepositoryError> {
        let rows = sqlx::query_as::<_, RatedRow>(concat!(
            "SELECT ",
            store_columns!(),
            ", AVG(r.rating)::float8 AS average_rating, COUNT(r.id) AS review_count \
             FROM stores s JOIN reviews r ON r.store_id = s.id \
             GROUP BY s.id \
             HAVING COUNT(r.id) >= 2 \
             ORDER BY average_rating DESC, review_count DESC, s.id ASC \
             LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|r| {
                Ok(RatedStore {
                    store: r.store.into_store()?,
                    average_rating: r.average_rating,
                    review_count: r.review_count,
                })
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_location_rejects_out_of_range_coordinates() {
        let err = location(200.0, 0.0, "x".to_owned()).unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(_)));
    }

    #[test]
    fn test_store_columns_are_alias_qualified() {
        for column in store_columns!().split(',') {
            assert!(column.trim().starts_with("s."), "{column}");
        }
    }
}
