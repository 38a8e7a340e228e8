//! Core domain types and logic.

pub mod chart;
pub mod config_validation;
pub mod error;
pub mod export;
pub mod loader;
pub mod model;
pub mod runtime;
pub mod schema;
pub mod script;
pub mod series_store;
