//! The lowering pipeline: a fixed, ordered sequence of rewrite passes that
//! turns a resolved source tree into one satisfying the target language's
//! structural constraints.
//!
//! Passes run strictly in the order [`Pipeline::lowering`] declares; later
//! passes rely on invariants earlier ones establish (loop labeling before
//! goto encoding, constructor and overload merging before modifier
//! stripping). Each pass mutates the shared [`tslower_ast::NodeArena`] in
//! place.
//!
//! The two subsystems with real algorithmic content are
//! [`goto_removal`] (jump elimination via a repair ladder and a
//! while/switch dispatch encoding) and [`overloads`]/[`ctors`] (overload
//! unification behind runtime-guarded dispatchers). Everything else is a
//! mechanical one-for-one lowering.

pub mod classes;
pub mod ctors;
pub mod goto_removal;
pub mod members;
pub mod names;
pub mod overloads;
pub mod param_diff;
pub mod pipeline;
pub mod refs;
pub mod statements;
pub mod types;
mod util;

pub use pipeline::{Pass, PassContext, Pipeline};
