//! Common types and utilities for the tslower lowering engine.
//!
//! This crate provides foundational types used across all tslower crates:
//! - Diagnostics (`Diagnostic`, `DiagnosticCategory`, `Diagnostics`)
//! - Fatal transform errors (`TransformError`)
//! - Centralized limits and thresholds

pub mod diagnostics;
pub use diagnostics::{Diagnostic, DiagnosticCategory, Diagnostics};

pub mod error;
pub use error::TransformError;

// Centralized limits and thresholds
pub mod limits;
