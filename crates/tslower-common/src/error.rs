//! Fatal errors that abort a pipeline run.
//!
//! These signal inconsistencies in the upstream resolver that no downstream
//! heuristic can paper over. Recoverable conditions go through
//! [`crate::Diagnostics`] instead; nothing in the pipeline uses errors for
//! expected outcomes.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransformError {
    /// A `this(...)` constructor initializer whose target is not a member of
    /// the constructor group.
    #[error("delegating constructor target not found in type `{type_name}`")]
    MissingDelegateTarget { type_name: String },

    /// A delegating constructor whose target also delegates; only one level
    /// of delegation can be inlined into a base call.
    #[error("chained this-initializer in type `{type_name}` is not supported")]
    UnsupportedDelegation { type_name: String },
}
