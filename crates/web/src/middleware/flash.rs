//! One-shot flash messages carried in the session.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::models::{FlashKind, FlashMessage, session_keys};

/// Queue a message for the next rendered page.
///
/// # Errors
///
/// Returns an error if the session cannot be read or written.
pub async fn push_flash(
    session: &Session,
    kind: FlashKind,
    message: impl Into<String>,
) -> Result<(), tower_sessions::session::Error> {
    let mut flashes: Vec<FlashMessage> = session
        .get(session_keys::FLASHES)
        .await?
        .unwrap_or_default();
    flashes.push(FlashMessage {
        kind,
        message: message.into(),
    });
    session.insert(session_keys::FLASHES, flashes).await
}

/// Extractor that drains pending flash messages.
///
/// Taking them removes them, so each message is shown exactly once.
pub struct Flashes(pub Vec<FlashMessage>);

impl<S> FromRequestParts<S> for Flashes
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(session) = parts.extensions.get::<Session>() else {
            return Ok(Self(Vec::new()));
        };

        let flashes = match session
            .remove::<Vec<FlashMessage>>(session_keys::FLASHES)
            .await
        {
            Ok(flashes) => flashes.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read flash messages");
                Vec::new()
            }
        };

        Ok(Self(flashes))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_flashes_accumulate_in_order() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);

        push_flash(&session, FlashKind::Success, "first").await.unwrap();
        push_flash(&session, FlashKind::Error, "second").await.unwrap();

        let stored: Vec<FlashMessage> = session.get(session_keys::FLASHES).await.unwrap().unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].message, "first");
        assert_eq!(stored[1].kind, FlashKind::Error);
    }
}
