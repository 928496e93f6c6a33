//! SchemaCraft - Database Schema Designer
//!
//! Schema model, validation and SQL generation behind a visual database
//! designer, served over a small HTTP API.

pub mod core;
