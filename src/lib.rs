//! Library loan management server
//!
//! REST JSON API over a PostgreSQL catalog of books, authors, categories and
//! borrowers, built around the loan ledger that tracks available copies
//! through the borrow and return lifecycle.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod ledger;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
