use std::fmt::{self, Display};

use serde::Serialize;
use thiserror::Error;

/// What kind of expectation a snapshot violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssertionKind {
    StatusMismatch,
    HeaderMissing,
    HeaderMismatch,
    FieldMissing,
    FieldUnexpected,
    FieldTypeMismatch,
    FieldValueMismatch,
    ElementMismatch { index: usize },
    LengthMismatch,
    TimingExceeded,
    InvalidPath,
}

impl Display for AssertionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssertionKind::StatusMismatch => write!(f, "status mismatch"),
            AssertionKind::HeaderMissing => write!(f, "header missing"),
            AssertionKind::HeaderMismatch => write!(f, "header mismatch"),
            AssertionKind::FieldMissing => write!(f, "field missing"),
            AssertionKind::FieldUnexpected => write!(f, "unexpected field"),
            AssertionKind::FieldTypeMismatch => write!(f, "field type mismatch"),
            AssertionKind::FieldValueMismatch => write!(f, "field value mismatch"),
            AssertionKind::ElementMismatch { index } => write!(f, "element {index} mismatch"),
            AssertionKind::LengthMismatch => write!(f, "length mismatch"),
            AssertionKind::TimingExceeded => write!(f, "timing exceeded"),
            AssertionKind::InvalidPath => write!(f, "invalid path"),
        }
    }
}

/// A violated expectation, with enough context to diagnose it without
/// re-running the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{kind} at {location}: expected {expected}, got {actual}")]
pub struct AssertionError {
    #[serde(flatten)]
    pub kind: AssertionKind,
    /// `status`, `header:<name>`, `elapsed`, or a field path.
    pub location: String,
    pub expected: String,
    pub actual: String,
}

impl AssertionError {
    pub fn new(
        kind: AssertionKind,
        location: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            location: location.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

/// Every failed assertion of one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionFailures(pub Vec<AssertionError>);

impl AssertionFailures {
    pub fn errors(&self) -> &[AssertionError] {
        &self.0
    }

    pub fn kinds(&self) -> Vec<AssertionKind> {
        self.0.iter().map(|err| err.kind).collect()
    }
}

impl Display for AssertionFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} assertion(s) failed", self.0.len())?;
        for err in &self.0 {
            write!(f, "\n  - {err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for AssertionFailures {}
