//! Core domain models and business logic for database schema design

#[cfg(feature = "ssr")]
pub mod api;
pub mod config;
mod editor;
mod error;
pub mod insights;
mod schema;
mod sql_generator;
mod validation;

pub use editor::*;
pub use error::*;
pub use schema::*;
pub use sql_generator::*;
pub use validation::*;
