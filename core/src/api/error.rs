//! Public error types for the engine API.
//!
//! This module defines the stable error types exposed to library users.
//! Internal errors are converted to these public types at API boundaries.

use std::fmt;

use crate::evaluator::EvalError;
use crate::parser::{ParseError, Span};

/// Public error type for all engine operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Invalid API usage (e.g., a value where a statement is required).
    Api(String),

    /// Compilation errors (parse errors, malformed calls).
    ///
    /// Contains one or more diagnostics with source locations, and the
    /// source they point into.
    Compilation {
        diagnostics: Vec<Diagnostic>,
        source: String,
    },

    /// A statement failed while running against a scope.
    Runtime(String),

    /// Resource limits exceeded (nesting depth).
    ResourceExceeded(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Api(msg) => write!(f, "API error: {}", msg),
            Error::Compilation { diagnostics, .. } => {
                write!(f, "Compilation failed with {} error(s)", diagnostics.len())
            }
            Error::Runtime(msg) => write!(f, "Runtime error: {}", msg),
            Error::ResourceExceeded(msg) => write!(f, "Resource limit exceeded: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

/// A compilation error with source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Primary diagnostic message.
    pub message: String,

    /// Source location of the primary issue.
    pub span: Span,

    /// Related locations that provide additional context.
    pub related: Vec<RelatedInfo>,

    /// Help text suggesting how to fix the issue.
    pub help: Vec<String>,

    /// Optional error code (e.g., "P001") for documentation lookup.
    pub code: Option<String>,
}

/// Related information for a diagnostic (e.g., "'(' opened here").
#[derive(Debug, Clone, PartialEq)]
pub struct RelatedInfo {
    /// Source location of the related information.
    pub span: Span,

    /// Message explaining the relevance.
    pub message: String,
}

// ============================================================================
// Conversion from internal errors
// ============================================================================

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::Compilation {
            diagnostics: vec![err.to_diagnostic()],
            source: err.source,
        }
    }
}

impl From<EvalError> for Error {
    fn from(err: EvalError) -> Self {
        if err.is_resource_exceeded() {
            Error::ResourceExceeded(err.to_string())
        } else {
            Error::Runtime(err.to_string())
        }
    }
}
