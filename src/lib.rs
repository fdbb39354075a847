//! Shelfmark Campus Library Management System
//!
//! A Rust REST API server for a campus library: students browse the
//! catalog, borrow and return books and accrue overdue fines, while
//! librarians and administrators manage users and inventory.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
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
