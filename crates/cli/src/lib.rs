//! CLI utilities for the WebP optimizer
//!
//! Provides shared CLI functionality:
//! - Terminal output formatting
//! - Status messages
//! - Human-readable conversion summaries

#![warn(missing_docs)]

pub mod output;
