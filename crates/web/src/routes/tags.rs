//! Tag browsing route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};

use super::stores::viewer_hearts;
use super::views::{Layout, StoreCard};
use crate::error::Result;
use crate::middleware::{Flashes, OptionalAuth};
use crate::services::StoreDirectory;
use crate::state::AppState;

/// Tag cloud plus the stores carrying the selected tag.
#[derive(Template, WebTemplate)]
#[template(path = "tags.html")]
pub struct TagsTemplate {
    pub layout: Layout,
    pub heading: String,
    pub tags: Vec<TagLink>,
    pub cards: Vec<StoreCard>,
}

pub struct TagLink {
    pub tag: String,
    pub count: i64,
    pub active: bool,
}

/// Every tagged store.
pub async fn index(
    state: State<AppState>,
    auth: OptionalAuth,
    flashes: Flashes,
) -> Result<impl IntoResponse> {
    render(state, auth, flashes, None).await
}

/// Stores carrying one tag.
pub async fn show(
    state: State<AppState>,
    auth: OptionalAuth,
    flashes: Flashes,
    Path(tag): Path<String>,
) -> Result<impl IntoResponse> {
    render(state, auth, flashes, Some(tag)).await
}

#[tracing::instrument(skip(state, auth, flashes))]
async fn render(
    State(state): State<AppState>,
    auth: OptionalAuth,
    flashes: Flashes,
    tag: Option<String>,
) -> Result<TagsTemplate> {
    let directory = StoreDirectory::new(state.pool());
    let (stores, counts) = directory.by_tag(tag.as_deref()).await?;
    let hearts = viewer_hearts(&directory, auth.0.as_ref()).await?;

    let tags = counts
        .into_iter()
        .map(|c| TagLink {
            active: tag.as_deref() == Some(c.tag.as_str()),
            tag: c.tag,
            count: c.count,
        })
        .collect();
    let heading = tag.clone().unwrap_or_else(|| "Tags".to_owned());

    Ok(TagsTemplate {
        layout: Layout::from_request(heading.clone(), &auth, flashes),
        heading,
        tags,
        cards: StoreCard::many(&stores, auth.0.as_ref(), &hearts),
    })
}
