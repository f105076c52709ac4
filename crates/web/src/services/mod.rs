//! Business logic services.
//!
//! # Services
//!
//! - `stores` - Query façade over the store directory (pagination policy,
//!   ownership, validation)
//! - `auth` - Password authentication and password resets
//! - `email` - Email sending (password reset)
//! - `uploads` - Store photo storage

pub mod auth;
pub mod email;
pub mod stores;
pub mod uploads;

pub use stores::{DirectoryError, PageOutcome, StoreDirectory, StorePage};
