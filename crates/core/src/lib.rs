//! Delicious Core - Shared domain types.
//!
//! This crate provides the types used across all Delicious components:
//! - `web` - The store directory web application
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types, validation, and pure policy - no I/O,
//! no database access, no HTTP. Everything here can be unit tested without a
//! running database.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, emails, slugs, coordinates, and ratings
//! - [`validation`] - Draft validation with field-level error messages
//! - [`pagination`] - Page resolution policy for store listings

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod pagination;
pub mod types;
pub mod validation;

pub use types::*;
pub use validation::{FieldError, ValidationError};
