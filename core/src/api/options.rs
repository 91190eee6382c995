//! Configuration options for the engine.

use serde::{Deserialize, Serialize};

use crate::evaluator::EvaluatorOptions;
use crate::parser::DEFAULT_MAX_DEPTH;

/// Configuration options for parsing scripts.
///
/// # Example
///
/// ```
/// use radmath_core::api::ParseOptions;
///
/// let options = ParseOptions { max_depth: 64 };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Maximum parenthesis nesting accepted by the parser.
    ///
    /// Default: 500
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Configuration options for running a script against a scope.
///
/// # Example
///
/// ```
/// use radmath_core::api::ExecutionOptions;
///
/// let options = ExecutionOptions {
///     max_depth: 500,
///     stop_on_error: true,
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOptions {
    /// Maximum evaluation stack depth (for recursion protection).
    ///
    /// Default: 1000
    pub max_depth: usize,

    /// Stop at the first failing statement instead of running the rest.
    ///
    /// Default: false
    pub stop_on_error: bool,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            max_depth: 1000,
            stop_on_error: false,
        }
    }
}

impl From<&ExecutionOptions> for EvaluatorOptions {
    fn from(options: &ExecutionOptions) -> Self {
        EvaluatorOptions {
            max_depth: options.max_depth,
        }
    }
}

/// Configuration options for the engine.
///
/// These options set the defaults for parsing and execution, which can be
/// overridden on a per-call basis.
///
/// # Example
///
/// ```
/// use radmath_core::api::{EngineOptions, ExecutionOptions, ParseOptions};
///
/// let options = EngineOptions {
///     default_parse_options: ParseOptions::default(),
///     default_execution_options: ExecutionOptions {
///         max_depth: 500,
///         stop_on_error: false,
///     },
/// };
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOptions {
    /// Default options for parsing.
    pub default_parse_options: ParseOptions,

    /// Default options for execution.
    pub default_execution_options: ExecutionOptions,
}
