//! Store listing, detail, and add/edit route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use delicious_core::validation::{SUGGESTED_TAGS, StoreDraft};
use delicious_core::StoreId;

use super::views::{Layout, StoreCard, photo_url};
use crate::db::stores::DEFAULT_NEAR_RADIUS_METERS;
use crate::error::{AppError, Result};
use crate::middleware::{Flashes, OptionalAuth, RequireAuth, push_flash};
use crate::models::{CurrentUser, FlashKind, Store, StoreDetail};
use crate::services::uploads::UploadError;
use crate::services::{DirectoryError, PageOutcome, StoreDirectory};
use crate::state::AppState;

// =============================================================================
// Templates
// =============================================================================

/// Grid of store cards, used by the listing and hearts pages.
#[derive(Template, WebTemplate)]
#[template(path = "stores.html")]
pub struct StoresTemplate {
    pub layout: Layout,
    pub heading: String,
    pub cards: Vec<StoreCard>,
    pub pagination: Option<PaginationView>,
}

/// Previous/next links under the grid.
pub struct PaginationView {
    pub page: i64,
    pub pages: i64,
    pub total: i64,
    pub prev: i64,
    pub next: i64,
    pub has_prev: bool,
    pub has_next: bool,
}

impl PaginationView {
    const fn new(page: i64, pages: i64, total: i64) -> Self {
        Self {
            page,
            pages,
            total,
            prev: page - 1,
            next: page + 1,
            has_prev: page > 1,
            has_next: page < pages,
        }
    }
}

/// Store detail page.
#[derive(Template, WebTemplate)]
#[template(path = "store.html")]
pub struct StoreTemplate {
    pub layout: Layout,
    pub store: StoreView,
    pub reviews: Vec<ReviewView>,
}

pub struct StoreView {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub address: String,
    pub lng: f64,
    pub lat: f64,
    pub photo_url: String,
    pub tags: Vec<String>,
    pub author_name: String,
    pub author_gravatar: String,
    pub editable: bool,
    pub can_review: bool,
}

pub struct ReviewView {
    pub author_name: String,
    pub author_gravatar: String,
    pub text: String,
    pub stars: String,
    pub created: String,
}

impl StoreTemplate {
    fn new(layout: Layout, detail: StoreDetail, viewer: Option<&CurrentUser>) -> Self {
        let StoreDetail {
            store,
            author_summary,
            reviews,
        } = detail;

        let reviews = reviews
            .into_iter()
            .map(|r| ReviewView {
                author_name: r.author.name,
                author_gravatar: r.author.gravatar,
                text: r.review.text,
                stars: stars(r.review.rating.get()),
                created: r.review.created.format("%B %-d, %Y").to_string(),
            })
            .collect();

        Self {
            layout,
            store: StoreView {
                id: store.id.as_i32(),
                editable: viewer.is_some_and(|u| store.is_owned_by(u.id)),
                can_review: viewer.is_some(),
                name: store.name,
                description: store.description.unwrap_or_default(),
                address: store.location.address,
                lng: store.location.point.lng(),
                lat: store.location.point.lat(),
                photo_url: photo_url(store.photo.as_deref()),
                tags: store.tags,
                author_name: author_summary.name,
                author_gravatar: author_summary.gravatar,
            },
            reviews,
        }
    }
}

/// Filled and empty stars for a 1–5 rating.
fn stars(rating: i16) -> String {
    let filled = usize::try_from(rating).unwrap_or(0).min(5);
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

/// Add/edit store form.
#[derive(Template, WebTemplate)]
#[template(path = "edit_store.html")]
pub struct EditStoreTemplate {
    pub layout: Layout,
    pub action: String,
    pub name: String,
    pub description: String,
    pub address: String,
    pub lng: String,
    pub lat: String,
    pub tags: Vec<TagChoice>,
    pub photo_url: String,
    pub has_photo: bool,
}

pub struct TagChoice {
    pub name: &'static str,
    pub checked: bool,
}

fn tag_choices(selected: &[String]) -> Vec<TagChoice> {
    SUGGESTED_TAGS
        .iter()
        .map(|&name| TagChoice {
            name,
            checked: selected.iter().any(|t| t == name),
        })
        .collect()
}

impl EditStoreTemplate {
    fn blank(layout: Layout) -> Self {
        Self {
            layout,
            action: "/add".to_owned(),
            name: String::new(),
            description: String::new(),
            address: String::new(),
            lng: String::new(),
            lat: String::new(),
            tags: tag_choices(&[]),
            photo_url: String::new(),
            has_photo: false,
        }
    }

    fn for_store(layout: Layout, store: &Store) -> Self {
        Self {
            layout,
            action: format!("/add/{}", store.id),
            name: store.name.clone(),
            description: store.description.clone().unwrap_or_default(),
            address: store.location.address.clone(),
            lng: store.location.point.lng().to_string(),
            lat: store.location.point.lat().to_string(),
            tags: tag_choices(&store.tags),
            photo_url: photo_url(store.photo.as_deref()),
            has_photo: store.photo.is_some(),
        }
    }

    /// Re-show what the user typed after a failed submit.
    fn from_submission(layout: Layout, action: String, form: &StoreForm) -> Self {
        Self {
            layout,
            action,
            name: form.draft.name.clone().unwrap_or_default(),
            description: form.draft.description.clone().unwrap_or_default(),
            address: form.draft.address.clone().unwrap_or_default(),
            lng: form.lng.clone(),
            lat: form.lat.clone(),
            tags: tag_choices(&form.draft.tags),
            photo_url: String::new(),
            has_photo: false,
        }
    }
}

// =============================================================================
// Multipart form
// =============================================================================

/// A submitted add/edit form, with its photo already stored.
struct StoreForm {
    draft: StoreDraft,
    lng: String,
    lat: String,
}

impl StoreForm {
    /// Read the multipart body, saving the `photo` part if one was sent.
    async fn read(state: &AppState, mut multipart: Multipart) -> Result<Self> {
        let mut draft = StoreDraft::default();
        let mut lng = String::new();
        let mut lat = String::new();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_owned();
            if name == "photo" {
                let content_type = field.content_type().unwrap_or_default().to_owned();
                let has_file = field.file_name().is_some_and(|f| !f.is_empty());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                if has_file && !bytes.is_empty() {
                    draft.photo = Some(state.photos().save(&content_type, &bytes).await?);
                }
                continue;
            }

            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            match name.as_str() {
                "name" => draft.name = Some(value),
                "description" => draft.description = Some(value),
                "address" => draft.address = Some(value),
                "lng" => lng = value,
                "lat" => lat = value,
                "tags" => draft.tags.push(value),
                _ => {}
            }
        }

        draft.coordinates = parse_coordinates(&lng, &lat);
        Ok(Self { draft, lng, lat })
    }
}

/// `[lng, lat]` when both parse as finite numbers.
fn parse_coordinates(lng: &str, lat: &str) -> Option<[f64; 2]> {
    let lng: f64 = lng.trim().parse().ok()?;
    let lat: f64 = lat.trim().parse().ok()?;
    (lng.is_finite() && lat.is_finite()).then_some([lng, lat])
}

// =============================================================================
// Listing
// =============================================================================

/// Display the first page of stores.
pub async fn index(
    state: State<AppState>,
    session: Session,
    auth: OptionalAuth,
    flashes: Flashes,
) -> Result<Response> {
    page(state, session, auth, flashes, Path(1)).await
}

/// Display a page of stores, newest first.
#[tracing::instrument(skip(state, session, auth, flashes))]
pub async fn page(
    State(state): State<AppState>,
    session: Session,
    auth: OptionalAuth,
    flashes: Flashes,
    Path(requested): Path<i64>,
) -> Result<Response> {
    let directory = StoreDirectory::new(state.pool());

    let store_page = match directory.page(requested).await? {
        PageOutcome::RedirectToFirst => {
            return Ok(Redirect::to("/stores/page/1").into_response());
        }
        PageOutcome::Page(store_page) => store_page,
    };

    if let Some(notice) = store_page.notice {
        push_flash(&session, FlashKind::Info, notice).await?;
        return Ok(Redirect::to(&format!("/stores/page/{}", store_page.page)).into_response());
    }

    let hearts = viewer_hearts(&directory, auth.0.as_ref()).await?;
    let cards = StoreCard::many(&store_page.stores, auth.0.as_ref(), &hearts);

    Ok(StoresTemplate {
        layout: Layout::from_request("Stores", &auth, flashes),
        heading: "Stores".to_owned(),
        cards,
        pagination: Some(PaginationView::new(
            store_page.page,
            store_page.pages,
            store_page.total,
        )),
    }
    .into_response())
}

/// Display the stores the current user has hearted.
pub async fn hearted(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    flashes: Flashes,
) -> Result<impl IntoResponse> {
    let directory = StoreDirectory::new(state.pool());
    let stores = directory.hearted(user.id).await?;
    let hearts: Vec<StoreId> = stores.iter().map(|s| s.id).collect();
    let cards = StoreCard::many(&stores, Some(&user), &hearts);

    Ok(StoresTemplate {
        layout: Layout::new("Hearted Stores", Some(&user), flashes.0),
        heading: "Hearted Stores".to_owned(),
        cards,
        pagination: None,
    })
}

/// Hearted store IDs for the viewer, empty for anonymous visitors.
pub(super) async fn viewer_hearts(
    directory: &StoreDirectory<'_>,
    viewer: Option<&CurrentUser>,
) -> std::result::Result<Vec<StoreId>, DirectoryError> {
    match viewer {
        Some(user) => directory.hearts(user.id).await,
        None => Ok(Vec::new()),
    }
}

/// Display a single store with its reviews.
#[tracing::instrument(skip(state, auth, flashes))]
pub async fn show(
    State(state): State<AppState>,
    auth: OptionalAuth,
    flashes: Flashes,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    let detail = StoreDirectory::new(state.pool()).detail(&slug).await?;
    let layout = Layout::from_request(detail.store.name.clone(), &auth, flashes);
    Ok(StoreTemplate::new(layout, detail, auth.0.as_ref()))
}

// =============================================================================
// Add / Edit
// =============================================================================

/// Display the add store form.
pub async fn add_page(RequireAuth(user): RequireAuth, flashes: Flashes) -> impl IntoResponse {
    EditStoreTemplate::blank(Layout::new("Add Store", Some(&user), flashes.0))
}

/// Handle the add store form.
#[tracing::instrument(skip_all, fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    multipart: Multipart,
) -> Result<Response> {
    let form = match StoreForm::read(&state, multipart).await {
        Ok(form) => form,
        Err(AppError::Upload(UploadError::UnsupportedType)) => {
            push_flash(&session, FlashKind::Error, UploadError::UnsupportedType.to_string())
                .await?;
            return Ok(Redirect::to("/add").into_response());
        }
        Err(e) => return Err(e),
    };

    let directory = StoreDirectory::new(state.pool());
    match directory.create(&form.draft, Some(user.id)).await {
        Ok(store) => {
            push_flash(
                &session,
                FlashKind::Success,
                format!("Successfully Created {}. Care to leave a review?", store.name),
            )
            .await?;
            Ok(Redirect::to(&format!("/store/{}", store.slug)).into_response())
        }
        Err(DirectoryError::Validation(errors)) => Ok(rerender_invalid(
            &user,
            "Add Store",
            "/add".to_owned(),
            &form,
            errors.messages(),
        )),
        Err(e) => Err(e.into()),
    }
}

/// Display the edit form for a store the user owns.
pub async fn edit_page(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    flashes: Flashes,
    Path(id): Path<i32>,
) -> Result<Response> {
    match StoreDirectory::new(state.pool())
        .editable(StoreId::new(id), user.id)
        .await
    {
        Ok(store) => {
            let layout = Layout::new(format!("Edit {}", store.name), Some(&user), flashes.0);
            Ok(EditStoreTemplate::for_store(layout, &store).into_response())
        }
        Err(DirectoryError::Forbidden) => forbidden_redirect(&session).await,
        Err(e) => Err(e.into()),
    }
}

/// Handle the edit form.
#[tracing::instrument(skip_all, fields(store_id = id, user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Response> {
    let edit_url = format!("/stores/{id}/edit");
    let form = match StoreForm::read(&state, multipart).await {
        Ok(form) => form,
        Err(AppError::Upload(UploadError::UnsupportedType)) => {
            push_flash(&session, FlashKind::Error, UploadError::UnsupportedType.to_string())
                .await?;
            return Ok(Redirect::to(&edit_url).into_response());
        }
        Err(e) => return Err(e),
    };

    let directory = StoreDirectory::new(state.pool());
    match directory.update(StoreId::new(id), &form.draft, user.id).await {
        Ok(store) => {
            push_flash(
                &session,
                FlashKind::Success,
                format!("Successfully updated {}.", store.name),
            )
            .await?;
            Ok(Redirect::to(&format!("/store/{}", store.slug)).into_response())
        }
        Err(DirectoryError::Validation(errors)) => Ok(rerender_invalid(
            &user,
            "Edit Store",
            format!("/add/{id}"),
            &form,
            errors.messages(),
        )),
        Err(DirectoryError::Forbidden) => forbidden_redirect(&session).await,
        Err(e) => Err(e.into()),
    }
}

fn rerender_invalid<'a>(
    user: &CurrentUser,
    title: &str,
    action: String,
    form: &StoreForm,
    messages: impl Iterator<Item = &'a str>,
) -> Response {
    let layout = messages.fold(Layout::new(title, Some(user), Vec::new()), |layout, m| {
        layout.with_flash(FlashKind::Error, m)
    });
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        EditStoreTemplate::from_submission(layout, action, form),
    )
        .into_response()
}

async fn forbidden_redirect(session: &Session) -> Result<Response> {
    push_flash(
        session,
        FlashKind::Error,
        "You must own a store in order to edit it!",
    )
    .await?;
    Ok(Redirect::to("/stores").into_response())
}

// =============================================================================
// Top rated
// =============================================================================

/// Top stores table.
#[derive(Template, WebTemplate)]
#[template(path = "top.html")]
pub struct TopTemplate {
    pub layout: Layout,
    pub rows: Vec<TopRow>,
}

pub struct TopRow {
    pub rank: usize,
    pub slug: String,
    pub name: String,
    pub photo_url: String,
    pub review_count: i64,
    pub average: String,
}

/// Display the best-reviewed stores.
pub async fn top(
    State(state): State<AppState>,
    auth: OptionalAuth,
    flashes: Flashes,
) -> Result<impl IntoResponse> {
    let rated = StoreDirectory::new(state.pool()).top_rated().await?;
    let rows = rated
        .into_iter()
        .enumerate()
        .map(|(i, r)| TopRow {
            rank: i + 1,
            slug: r.store.slug.into_inner(),
            name: r.store.name,
            photo_url: photo_url(r.store.photo.as_deref()),
            review_count: r.review_count,
            average: format!("{:.1}", r.average_rating),
        })
        .collect();

    Ok(TopTemplate {
        layout: Layout::from_request("Top Stores!", &auth, flashes),
        rows,
    })
}

/// Find-near-me page. Results come from `/api/stores/near` in the browser.
#[derive(Template, WebTemplate)]
#[template(path = "map.html")]
pub struct MapTemplate {
    pub layout: Layout,
    pub radius_km: String,
}

/// Display the map search form.
pub async fn map(auth: OptionalAuth, flashes: Flashes) -> impl IntoResponse {
    MapTemplate {
        layout: Layout::from_request("Map", &auth, flashes),
        radius_km: (DEFAULT_NEAR_RADIUS_METERS / 1000.0).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coordinates() {
        assert_eq!(parse_coordinates("-79.38", " 43.65 "), Some([-79.38, 43.65]));
        assert_eq!(parse_coordinates("", "43.65"), None);
        assert_eq!(parse_coordinates("abc", "1"), None);
        assert_eq!(parse_coordinates("NaN", "1"), None);
    }

    #[test]
    fn test_stars() {
        assert_eq!(stars(4), "★★★★☆");
        assert_eq!(stars(5), "★★★★★");
    }

    #[test]
    fn test_tag_choices_mark_selected() {
        let choices = tag_choices(&["Wifi".to_owned(), "Custom".to_owned()]);
        assert_eq!(choices.len(), SUGGESTED_TAGS.len());
        assert!(choices.iter().any(|c| c.name == "Wifi" && c.checked));
        assert!(choices.iter().filter(|c| c.checked).count() == 1);
    }

    #[test]
    fn test_pagination_view() {
        let view = PaginationView::new(1, 3, 10);
        assert!(!view.has_prev);
        assert!(view.has_next);
        assert_eq!(view.next, 2);

        let last = PaginationView::new(3, 3, 10);
        assert!(last.has_prev);
        assert!(!last.has_next);
    }
}
