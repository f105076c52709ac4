//! View models shared by the HTML templates.
//!
//! Templates only see plain strings, numbers, and booleans; everything that
//! needs a decision (photo fallback, truncation, heart state) is settled here.

use std::collections::HashSet;

use axum::http::{HeaderMap, header};
use url::Url;

use delicious_core::StoreId;

use crate::middleware::{Flashes, OptionalAuth};
use crate::models::{CurrentUser, FlashKind, FlashMessage, Store};

/// Photo shown for stores without an upload.
pub const FALLBACK_PHOTO: &str = "/public/images/store.png";

/// Words kept from a description on store cards.
const CARD_DESCRIPTION_WORDS: usize = 25;

/// A flash message as rendered.
#[derive(Debug, Clone)]
pub struct FlashView {
    pub kind: &'static str,
    pub message: String,
}

impl From<FlashMessage> for FlashView {
    fn from(flash: FlashMessage) -> Self {
        Self {
            kind: flash.kind.as_str(),
            message: flash.message,
        }
    }
}

/// Data every page's layout needs.
#[derive(Debug, Clone)]
pub struct Layout {
    pub title: String,
    pub logged_in: bool,
    pub user_name: String,
    pub user_gravatar: String,
    pub flashes: Vec<FlashView>,
}

impl Layout {
    #[must_use]
    pub fn new(title: impl Into<String>, user: Option<&CurrentUser>, flashes: Vec<FlashMessage>) -> Self {
        Self {
            title: title.into(),
            logged_in: user.is_some(),
            user_name: user.map(|u| u.name.clone()).unwrap_or_default(),
            user_gravatar: user.map(|u| u.email.gravatar_url()).unwrap_or_default(),
            flashes: flashes.into_iter().map(FlashView::from).collect(),
        }
    }

    /// Layout from the request's auth and flash extractors.
    #[must_use]
    pub fn from_request(title: impl Into<String>, auth: &OptionalAuth, flashes: Flashes) -> Self {
        Self::new(title, auth.0.as_ref(), flashes.0)
    }

    /// Add a message rendered on this page only (not stored in the session).
    #[must_use]
    pub fn with_flash(mut self, kind: FlashKind, message: impl Into<String>) -> Self {
        self.flashes.push(FlashView {
            kind: kind.as_str(),
            message: message.into(),
        });
        self
    }
}

/// A store as shown in a grid.
#[derive(Debug, Clone)]
pub struct StoreCard {
    pub id: i32,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub photo_url: String,
    pub hearted: bool,
    pub editable: bool,
}

impl StoreCard {
    #[must_use]
    pub fn new(store: &Store, viewer: Option<&CurrentUser>, hearts: &HashSet<StoreId>) -> Self {
        Self {
            id: store.id.as_i32(),
            slug: store.slug.to_string(),
            name: store.name.clone(),
            description: truncate_words(
                store.description.as_deref().unwrap_or_default(),
                CARD_DESCRIPTION_WORDS,
            ),
            photo_url: photo_url(store.photo.as_deref()),
            hearted: hearts.contains(&store.id),
            editable: viewer.is_some_and(|u| store.is_owned_by(u.id)),
        }
    }

    /// Cards for a list of stores.
    #[must_use]
    pub fn many(stores: &[Store], viewer: Option<&CurrentUser>, hearts: &[StoreId]) -> Vec<Self> {
        let hearts: HashSet<StoreId> = hearts.iter().copied().collect();
        stores
            .iter()
            .map(|store| Self::new(store, viewer, &hearts))
            .collect()
    }
}

/// Public URL of a stored photo, or the placeholder.
#[must_use]
pub fn photo_url(photo: Option<&str>) -> String {
    photo.map_or_else(|| FALLBACK_PHOTO.to_owned(), |p| format!("/uploads/{p}"))
}

/// First `max` words of `text`, with an ellipsis when cut.
#[must_use]
pub fn truncate_words(text: &str, max: usize) -> String {
    let mut words = text.split_whitespace();
    let kept: Vec<&str> = words.by_ref().take(max).collect();
    let mut out = kept.join(" ");
    if words.next().is_some() {
        out.push('…');
    }
    out
}

/// Where to send the user "back" to: the `Referer` path when it is one of
/// ours, otherwise `fallback`.
#[must_use]
pub fn back_to(headers: &HeaderMap, fallback: &str) -> String {
    headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .and_then(referer_path)
        .unwrap_or_else(|| fallback.to_owned())
}

fn referer_path(referer: &str) -> Option<String> {
    if referer.starts_with('/') && !referer.starts_with("//") {
        return Some(referer.to_owned());
    }
    let url = Url::parse(referer).ok()?;
    let mut path = url.path().to_owned();
    if let Some(query) = url.query() {
        path.push('?');
        path.push_str(query);
    }
    Some(path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_truncate_words() {
        assert_eq!(truncate_words("a b c", 5), "a b c");
        assert_eq!(truncate_words("a  b\nc d", 2), "a b…");
        assert_eq!(truncate_words("", 3), "");
    }

    #[test]
    fn test_photo_url_fallback() {
        assert_eq!(photo_url(None), FALLBACK_PHOTO);
        assert_eq!(photo_url(Some("abc.jpeg")), "/uploads/abc.jpeg");
    }

    #[test]
    fn test_back_to_uses_referer_path_only() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::REFERER,
            HeaderValue::from_static("https://evil.test/store/bagel-barn?x=1"),
        );
        assert_eq!(back_to(&headers, "/"), "/store/bagel-barn?x=1");
    }

    #[test]
    fn test_back_to_falls_back() {
        assert_eq!(back_to(&HeaderMap::new(), "/stores"), "/stores");

        let mut headers = HeaderMap::new();
        headers.insert(header::REFERER, HeaderValue::from_static("//evil.test/x"));
        assert_eq!(back_to(&headers, "/stores"), "/stores");
    }

    #[test]
    fn test_layout_without_user() {
        let layout = Layout::new("Stores", None, Vec::new()).with_flash(FlashKind::Info, "hi");
        assert!(!layout.logged_in);
        assert_eq!(layout.flashes.len(), 1);
        assert_eq!(layout.flashes[0].kind, "info");
    }
}
