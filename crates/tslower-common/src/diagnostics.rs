//! Diagnostics emitted by the lowering pipeline.
//!
//! Passes report recoverable conditions here instead of failing the run: a
//! callable whose goto labels cannot be normalized, an overload group that
//! cannot be guarded at runtime, a nested generic class colliding with its
//! generic parent. Fatal conditions use [`crate::TransformError`] instead.

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticCategory {
    Warning,
    Message,
}

/// Diagnostic codes for the conditions the pipeline can report.
pub mod diagnostic_codes {
    /// Goto-targeted labels remain without a common parent after all repair
    /// attempts; the callable is left untransformed.
    pub const UNRESOLVED_GOTO_LABELS: u32 = 1001;
    /// A nested class and its enclosing class are both generic; lifting
    /// concatenates the type parameter lists, which the target cannot express.
    pub const GENERIC_NESTED_CLASS: u32 = 1002;
    /// An overload group has a parameter type with no runtime constructor to
    /// check against; the group is left unmerged.
    pub const UNMERGEABLE_OVERLOAD_GROUP: u32 = 1003;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub code: u32,
    pub message_text: String,
}

impl Diagnostic {
    pub fn warning(code: u32, message: impl Into<String>) -> Self {
        Self {
            category: DiagnosticCategory::Warning,
            code,
            message_text: message.into(),
        }
    }

    pub fn message(code: u32, message: impl Into<String>) -> Self {
        Self {
            category: DiagnosticCategory::Message,
            code,
            message_text: message.into(),
        }
    }
}

/// Ordered collection of diagnostics produced by one pipeline run.
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_code(&self, code: u32) -> bool {
        self.items.iter().any(|d| d.code == code)
    }
}
