//! Review submission route handler.

use axum::{
    Form,
    extract::{Path, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use delicious_core::StoreId;
use delicious_core::validation::ReviewDraft;

use super::views::back_to;
use crate::error::Result;
use crate::middleware::{RequireAuth, push_flash};
use crate::models::FlashKind;
use crate::services::{DirectoryError, StoreDirectory};
use crate::state::AppState;

/// Review form data. The rating arrives as a radio button value.
#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    pub text: Option<String>,
    pub rating: Option<String>,
}

impl ReviewForm {
    fn draft(self) -> ReviewDraft {
        ReviewDraft {
            text: self.text,
            rating: self.rating.and_then(|r| r.trim().parse().ok()),
        }
    }
}

/// Attach a review to a store, then go back to where the form was.
#[tracing::instrument(skip(state, session, headers, user, form), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    RequireAuth(user): RequireAuth,
    Path(store_id): Path<i32>,
    Form(form): Form<ReviewForm>,
) -> Result<Response> {
    let back = back_to(&headers, "/stores");
    let result = StoreDirectory::new(state.pool())
        .add_review(StoreId::new(store_id), user.id, &form.draft())
        .await;

    match result {
        Ok(_) => push_flash(&session, FlashKind::Success, "Review Saved!").await?,
        Err(DirectoryError::Validation(errors)) => {
            for message in errors.messages() {
                push_flash(&session, FlashKind::Error, message).await?;
            }
        }
        Err(e) => return Err(e.into()),
    }

    Ok(Redirect::to(&back).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unparseable_rating_becomes_missing() {
        let draft = ReviewForm {
            text: Some("Great".to_owned()),
            rating: Some("five".to_owned()),
        }
        .draft();
        assert_eq!(draft.rating, None);

        let draft = ReviewForm {
            text: None,
            rating: Some(" 4 ".to_owned()),
        }
        .draft();
        assert_eq!(draft.rating, Some(4));
    }
}
