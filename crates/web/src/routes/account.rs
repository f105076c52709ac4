//! Account route handlers: profile edits and password resets.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use delicious_core::validation::{AccountDraft, validate_new_password};

use super::views::Layout;
use crate::error::Result;
use crate::middleware::{Flashes, OptionalAuth, RequireAuth, push_flash, set_current_user};
use crate::models::{CurrentUser, FlashKind};
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

const INVALID_RESET: &str = "Password reset link is invalid or has expired";

// =============================================================================
// Form Types
// =============================================================================

/// Forgot password form data.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordForm {
    pub email: String,
}

/// Reset password form data.
#[derive(Deserialize)]
pub struct ResetPasswordForm {
    pub password: String,
    pub password_confirm: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Account page template.
#[derive(Template, WebTemplate)]
#[template(path = "account.html")]
pub struct AccountTemplate {
    pub layout: Layout,
    pub name: String,
    pub email: String,
}

/// Reset password page template.
#[derive(Template, WebTemplate)]
#[template(path = "reset.html")]
pub struct ResetPasswordTemplate {
    pub layout: Layout,
    pub token: String,
}

// =============================================================================
// Account
// =============================================================================

/// Display the account page.
pub async fn index(RequireAuth(user): RequireAuth, flashes: Flashes) -> impl IntoResponse {
    AccountTemplate {
        layout: Layout::new("Edit Your Account", Some(&user), flashes.0),
        name: user.name.clone(),
        email: user.email.to_string(),
    }
}

/// Update the current user's name and email.
#[tracing::instrument(skip_all, fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(draft): Form<AccountDraft>,
) -> Result<Response> {
    let account = match draft.validate() {
        Ok(account) => account,
        Err(errors) => {
            for message in errors.messages() {
                push_flash(&session, FlashKind::Error, message).await?;
            }
            return Ok(Redirect::to("/account").into_response());
        }
    };

    match AuthService::new(state.pool())
        .update_account(user.id, &account)
        .await
    {
        Ok(updated) => {
            set_current_user(&session, &CurrentUser::from(&updated)).await?;
            push_flash(&session, FlashKind::Success, "Updated the profile!").await?;
        }
        Err(AuthError::UserAlreadyExists) => {
            push_flash(
                &session,
                FlashKind::Error,
                "An account with this email already exists",
            )
            .await?;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(Redirect::to("/account").into_response())
}

// =============================================================================
// Password Reset
// =============================================================================

/// Issue a reset token and email the link.
///
/// The response is identical whether or not the account exists.
#[tracing::instrument(skip_all)]
pub async fn forgot(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ForgotPasswordForm>,
) -> Result<Response> {
    let issued = AuthService::new(state.pool())
        .issue_reset_token(&form.email)
        .await?;

    if let Some((user, token)) = issued {
        let reset_url = state.config().url_for(&format!("/account/reset/{token}"));
        state
            .email()
            .send_password_reset(user.email.as_str(), &user.name, &reset_url)
            .await?;
    }

    push_flash(
        &session,
        FlashKind::Success,
        "A password reset has been mailed to you.",
    )
    .await?;
    Ok(Redirect::to("/login").into_response())
}

/// Display the reset form for a still-valid token.
pub async fn reset_page(
    State(state): State<AppState>,
    session: Session,
    auth: OptionalAuth,
    flashes: Flashes,
    Path(token): Path<String>,
) -> Result<Response> {
    match AuthService::new(state.pool())
        .user_for_reset_token(&token)
        .await
    {
        Ok(_) => Ok(ResetPasswordTemplate {
            layout: Layout::from_request("Reset your Password", &auth, flashes),
            token,
        }
        .into_response()),
        Err(AuthError::InvalidResetToken) => {
            push_flash(&session, FlashKind::Error, INVALID_RESET).await?;
            Ok(Redirect::to("/login").into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Set a new password from a reset link and log the user in.
#[tracing::instrument(skip_all)]
pub async fn reset(
    State(state): State<AppState>,
    session: Session,
    Path(token): Path<String>,
    Form(form): Form<ResetPasswordForm>,
) -> Result<Response> {
    if let Err(errors) = validate_new_password(&form.password, &form.password_confirm) {
        for message in errors.messages() {
            push_flash(&session, FlashKind::Error, message).await?;
        }
        return Ok(Redirect::to(&format!("/account/reset/{token}")).into_response());
    }

    match AuthService::new(state.pool())
        .reset_password(&token, &form.password)
        .await
    {
        Ok(user) => {
            set_current_user(&session, &CurrentUser::from(&user)).await?;
            push_flash(
                &session,
                FlashKind::Success,
                "💃 Nice! Your password has been reset! You are now logged in!",
            )
            .await?;
            Ok(Redirect::to("/").into_response())
        }
        Err(AuthError::InvalidResetToken) => {
            push_flash(&session, FlashKind::Error, INVALID_RESET).await?;
            Ok(Redirect::to("/login").into_response())
        }
        Err(e) => Err(e.into()),
    }
}
