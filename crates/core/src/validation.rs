//! Draft validation with field-level messages.
//!
//! Handlers collect raw form input into a draft, call `validate()`, and
//! either persist the validated value or flash every [`FieldError`] back to
//! the user. Strings are trimmed here, so nothing downstream needs to.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{Email, GeoPoint, Rating, UserId};

/// Tags offered on the store form. Stores may carry any tag; these are the
/// checkboxes shown by default.
pub const SUGGESTED_TAGS: &[&str] = &[
    "Wifi",
    "Open Late",
    "Family Friendly",
    "Vegetarian",
    "Licensed",
];

/// A single invalid field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Dotted field path, e.g. `location.address`.
    pub field: &'static str,
    /// User-facing message.
    pub message: &'static str,
}

/// One or more invalid fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    /// A validation error for a single field.
    #[must_use]
    pub fn single(field: &'static str, message: &'static str) -> Self {
        Self {
            errors: vec![FieldError { field, message }],
        }
    }

    /// User-facing messages, in field order.
    pub fn messages(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.errors.iter().map(|e| e.message)
    }

    /// Whether the given field failed.
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "validation failed: {joined}")
    }
}

impl std::error::Error for ValidationError {}

/// Accumulates field errors while a draft is checked.
#[derive(Default)]
struct Collector(Vec<FieldError>);

impl Collector {
    fn push(&mut self, field: &'static str, message: &'static str) {
        self.0.push(FieldError { field, message });
    }

    fn finish<T>(self, value: impl FnOnce() -> T) -> Result<T, ValidationError> {
        if self.0.is_empty() {
            Ok(value())
        } else {
            Err(ValidationError { errors: self.0 })
        }
    }
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
}

// =============================================================================
// Stores
// =============================================================================

/// Raw store input as it arrives from a form, API, or seed file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreDraft {
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    /// `[lng, lat]`; `None` when either part was missing or not a number.
    pub coordinates: Option<[f64; 2]>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Set by the upload step, never by the client directly.
    #[serde(skip)]
    pub photo: Option<String>,
}

/// A store that passed validation, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidStore {
    pub name: String,
    pub description: Option<String>,
    pub address: String,
    pub point: GeoPoint,
    pub tags: Vec<String>,
    pub photo: Option<String>,
    pub author: UserId,
}

impl StoreDraft {
    /// Validate the draft for the given author.
    ///
    /// `author` is `None` when no authenticated user was supplied; that is
    /// reported alongside any field errors rather than short-circuiting.
    ///
    /// # Errors
    ///
    /// Returns every failing field at once.
    pub fn validate(&self, author: Option<UserId>) -> Result<ValidStore, ValidationError> {
        let mut errors = Collector::default();

        let name = trimmed(self.name.as_deref());
        if name.is_none() {
            errors.push("name", "Please enter a store name!");
        }

        let address = trimmed(self.address.as_deref());
        if address.is_none() {
            errors.push("location.address", "You must supply an address!");
        }

        let point = self
            .coordinates
            .and_then(|[lng, lat]| GeoPoint::new(lng, lat).ok());
        if point.is_none() {
            errors.push("location.coordinates", "You must supply coordinates!");
        }

        if author.is_none() {
            errors.push("author", "You must supply an author");
        }

        let tags = self
            .tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(ToOwned::to_owned)
            .collect();

        match (name, address, point, author) {
            (Some(name), Some(address), Some(point), Some(author)) => errors.finish(|| ValidStore {
                name,
                description: trimmed(self.description.as_deref()),
                address,
                point,
                tags,
                photo: trimmed(self.photo.as_deref()),
                author,
            }),
            _ => Err(ValidationError { errors: errors.0 }),
        }
    }
}

// =============================================================================
// Reviews
// =============================================================================

/// Raw review input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewDraft {
    pub text: Option<String>,
    pub rating: Option<i64>,
}

/// A review that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidReview {
    pub text: String,
    pub rating: Rating,
}

impl ReviewDraft {
    /// # Errors
    ///
    /// Returns every failing field at once.
    pub fn validate(&self) -> Result<ValidReview, ValidationError> {
        let mut errors = Collector::default();

        let text = trimmed(self.text.as_deref());
        if text.is_none() {
            errors.push("text", "Your review must have text!");
        }

        let rating = self.rating.and_then(|r| Rating::new(r).ok());
        if rating.is_none() {
            errors.push("rating", "Rating must be between 1 and 5");
        }

        match (text, rating) {
            (Some(text), Some(rating)) => errors.finish(|| ValidReview { text, rating }),
            _ => Err(ValidationError { errors: errors.0 }),
        }
    }
}

// =============================================================================
// Accounts
// =============================================================================

/// Raw registration input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationDraft {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub password_confirm: Option<String>,
}

/// A registration that passed validation. The password is not trimmed.
#[derive(Clone)]
pub struct ValidRegistration {
    pub name: String,
    pub email: Email,
    pub password: String,
}

impl fmt::Debug for ValidRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidRegistration")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl RegistrationDraft {
    /// # Errors
    ///
    /// Returns every failing field at once.
    pub fn validate(&self) -> Result<ValidRegistration, ValidationError> {
        let mut errors = Collector::default();

        let name = trimmed(self.name.as_deref());
        if name.is_none() {
            errors.push("name", "You must supply a name");
        }

        let email = self.email.as_deref().and_then(|e| Email::parse(e).ok());
        if email.is_none() {
            errors.push("email", "That email is not valid");
        }

        let password = self.password.clone().filter(|p| !p.is_empty());
        if password.is_none() {
            errors.push("password", "Password cannot be blank");
        }

        match self.password_confirm.as_deref().filter(|p| !p.is_empty()) {
            None => errors.push("password_confirm", "Confirmed Password cannot be blank"),
            Some(confirm) if Some(confirm) != password.as_deref() => {
                errors.push("password_confirm", "Oops! Your passwords do not match");
            }
            Some(_) => {}
        }

        match (name, email, password) {
            (Some(name), Some(email), Some(password)) => errors.finish(|| ValidRegistration {
                name,
                email,
                password,
            }),
            _ => Err(ValidationError { errors: errors.0 }),
        }
    }
}

/// Raw account update input (name and email only).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountDraft {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// A validated account update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidAccount {
    pub name: String,
    pub email: Email,
}

impl AccountDraft {
    /// # Errors
    ///
    /// Returns every failing field at once.
    pub fn validate(&self) -> Result<ValidAccount, ValidationError> {
        let mut errors = Collector::default();

        let name = trimmed(self.name.as_deref());
        if name.is_none() {
            errors.push("name", "You must supply a name");
        }
        let email = self.email.as_deref().and_then(|e| Email::parse(e).ok());
        if email.is_none() {
            errors.push("email", "That email is not valid");
        }

        match (name, email) {
            (Some(name), Some(email)) => errors.finish(|| ValidAccount { name, email }),
            _ => Err(ValidationError { errors: errors.0 }),
        }
    }
}

/// Checks a new password and its confirmation.
///
/// # Errors
///
/// Returns a field error when the password is blank or the two differ.
pub fn validate_new_password(password: &str, confirm: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::single(
            "password",
            "Password cannot be blank",
        ));
    }
    if password != confirm {
        return Err(ValidationError::single(
            "password_confirm",
            "Passwords do not match!",
        ));
    }
    Ok(())
}
