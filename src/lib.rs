//! Lending library core
//!
//! Tracks books, the people who may borrow them and the loans between them:
//! catalog listing and search, assign/release of books, overdue loans and
//! unique borrower names. Storage is PostgreSQL through sqlx, or an
//! in-process store.

pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use crate::config::AppConfig;
pub use crate::error::{AppError, AppResult, FieldError};
pub use crate::repository::Repository;
pub use crate::services::Services;
