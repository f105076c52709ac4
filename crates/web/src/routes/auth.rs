//! Authentication route handlers.
//!
//! Handles login, registration, and logout with email and password.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use delicious_core::validation::RegistrationDraft;

use super::views::Layout;
use crate::error::Result;
use crate::middleware::{
    Flashes, OptionalAuth, clear_current_user, push_flash, set_current_user,
};
use crate::models::{CurrentUser, FlashKind, User};
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template, with the forgot-password form alongside.
#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub layout: Layout,
    pub name: String,
    pub email: String,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(auth: OptionalAuth, flashes: Flashes) -> impl IntoResponse {
    LoginTemplate {
        layout: Layout::from_request("Login", &auth, flashes),
    }
}

/// Handle login form submission.
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    match AuthService::new(state.pool())
        .login(&form.email, &form.password)
        .await
    {
        Ok(user) => {
            set_current_user(&session, &CurrentUser::from(&user)).await?;
            tracing::info!(user_id = %user.id, "user logged in");
            push_flash(&session, FlashKind::Success, "You are now logged in!").await?;
            Ok(Redirect::to("/").into_response())
        }
        Err(AuthError::InvalidCredentials) => {
            push_flash(&session, FlashKind::Error, "Failed Login!").await?;
            Ok(Redirect::to("/login").into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Log out and go home.
pub async fn logout(session: Session) -> Result<Response> {
    clear_current_user(&session).await?;
    push_flash(&session, FlashKind::Success, "You are now logged out! 👋").await?;
    Ok(Redirect::to("/").into_response())
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(auth: OptionalAuth, flashes: Flashes) -> impl IntoResponse {
    RegisterTemplate {
        layout: Layout::from_request("Register", &auth, flashes),
        name: String::new(),
        email: String::new(),
    }
}

/// Handle registration: validate, create the account, and log it in.
///
/// Invalid submissions re-render the form with what was typed (minus the
/// passwords) and every problem listed.
#[tracing::instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(draft): Form<RegistrationDraft>,
) -> Result<Response> {
    let rerender = |messages: Vec<String>| {
        let layout = messages
            .into_iter()
            .fold(Layout::new("Register", None, Vec::new()), |layout, m| {
                layout.with_flash(FlashKind::Error, m)
            });
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            RegisterTemplate {
                layout,
                name: draft.name.clone().unwrap_or_default(),
                email: draft.email.clone().unwrap_or_default(),
            },
        )
            .into_response()
    };

    let registration = match draft.validate() {
        Ok(registration) => registration,
        Err(errors) => {
            return Ok(rerender(errors.messages().map(String::from).collect()));
        }
    };

    let user = match AuthService::new(state.pool()).register(&registration).await {
        Ok(user) => user,
        Err(AuthError::UserAlreadyExists) => {
            return Ok(rerender(vec![
                "An account with this email already exists".to_owned(),
            ]));
        }
        Err(e) => return Err(e.into()),
    };

    set_current_user(&session, &CurrentUser::from(&user)).await?;
    push_flash(&session, FlashKind::Success, "You are now logged in!").await?;
    Ok(Redirect::to("/").into_response())
}
