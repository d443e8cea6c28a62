//! Centralized limits and thresholds for the lowering pipeline.
//!
//! Centralizing these values prevents duplicate definitions with
//! inconsistent values and documents the rationale for each limit.

/// Number of structural-normalization attempts the goto eliminator makes per
/// callable before giving up.
///
/// Each attempt runs one hand-picked combination of repair steps on a fresh
/// clone of the callable body. The combinations are fixed; downstream output
/// for ambiguous control-flow shapes depends on which attempt succeeds first,
/// so the count and order are part of the observable behavior.
pub const GOTO_REPAIR_ATTEMPTS: usize = 4;
