//! Configuration loading and schema definitions
//!
//! The settings store read once at each trigger boundary.

mod loader;
mod schema;

pub use loader::{Config, CONFIG_ENV};
pub use schema::*;
