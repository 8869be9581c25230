use std::fmt;

use thiserror::Error;

/// Top-level error type for the inset engine.
#[derive(Debug, Error)]
pub enum InsetError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Operation(#[from] OperationError),
}

/// Errors related to point sets and polygon data.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("point set is already three-dimensional")]
    AlreadyThreeDimensional,

    #[error("point set is two-dimensional, a z coordinate is required")]
    NotThreeDimensional,

    #[error("vertex index {index} is out of range for a point set of {len} points")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Errors related to model-building operations.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("parameter {parameter} = {value} is invalid: {reason}")]
    InvalidParameter {
        parameter: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Convenience type alias for results using [`InsetError`].
pub type Result<T> = std::result::Result<T, InsetError>;

/// Kind of non-fatal condition met while computing a result.
///
/// Ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticKind {
    /// A degenerate feature (zero-length edge, collinear triple, zero-area
    /// loop) was dropped or treated as already converged.
    DegenerateInputDropped,
    /// An internal invariant did not hold and a best-effort continuation was
    /// used instead.
    InvariantFallbackUsed,
}

/// Summary of the diagnostics attached to a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Outcome {
    Clean,
    DegenerateInputDropped,
    InvariantFallbackUsed,
}

/// A single non-fatal condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// Collected non-fatal conditions of one operation.
///
/// Every pushed diagnostic is also logged at `warn` level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a degenerate-input condition.
    pub fn degenerate(&mut self, message: impl Into<String>) {
        self.push(DiagnosticKind::DegenerateInputDropped, message.into());
    }

    /// Records an invariant fallback.
    pub fn fallback(&mut self, message: impl Into<String>) {
        self.push(DiagnosticKind::InvariantFallbackUsed, message.into());
    }

    fn push(&mut self, kind: DiagnosticKind, message: String) {
        tracing::warn!(?kind, "{message}");
        self.items.push(Diagnostic { kind, message });
    }

    /// Appends every diagnostic of `other` without logging them again.
    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    /// Returns the recorded diagnostics in order.
    #[must_use]
    pub fn items(&self) -> &[Diagnostic] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Most severe condition recorded.
    #[must_use]
    pub fn outcome(&self) -> Outcome {
        match self.items.iter().map(|d| d.kind).max() {
            None => Outcome::Clean,
            Some(DiagnosticKind::DegenerateInputDropped) => Outcome::DegenerateInputDropped,
            Some(DiagnosticKind::InvariantFallbackUsed) => Outcome::InvariantFallbackUsed,
        }
    }
}

/// A value together with the diagnostics produced while computing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnosed<T> {
    pub value: T,
    pub diagnostics: Diagnostics,
}

impl<T> Diagnosed<T> {
    #[must_use]
    pub fn new(value: T, diagnostics: Diagnostics) -> Self {
        Self { value, diagnostics }
    }

    /// A value with no diagnostics.
    #[must_use]
    pub fn clean(value: T) -> Self {
        Self::new(value, Diagnostics::new())
    }

    #[must_use]
    pub fn outcome(&self) -> Outcome {
        self.diagnostics.outcome()
    }

    /// Discards the diagnostics.
    #[must_use]
    pub fn into_value(self) -> T {
        self.value
    }

    /// Moves the diagnostics into `sink` and returns the value.
    pub fn merge_into(self, sink: &mut Diagnostics) -> T {
        sink.extend(self.diagnostics);
        self.value
    }
}
