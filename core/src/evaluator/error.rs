//! Evaluation errors.
//!
//! Missing data is not an error: it is a value that flows through every
//! operator. The variants here are the conditions that abort one statement.
//! None of them leave the statement's target partially written, and none
//! of them stop the other statements of a script.
//!
//! # Error Categories
//!
//! - **Unresolved names**: a required input field does not exist. Reported
//!   once, during synchronization, before any point is evaluated.
//! - **Malformed calls**: an unknown user keyword, a user function that
//!   reported failure, or a built-in called with the wrong arguments.
//! - **Misuse**: a request the node cannot honor, such as asking a variable
//!   leaf for a constant value.
//! - **Resource exceeded**: nesting deeper than the configured limit.

use thiserror::Error;

/// Error raised while evaluating one statement against one scope.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// A required input field does not exist in the scope.
    #[error("Field '{name}' does not exist in this scope")]
    UnresolvedName { name: String },

    /// The output field could not be created.
    #[error("Cannot create output field '{name}'")]
    OutputUnavailable { name: String },

    /// No user function with this keyword is known to the scope.
    #[error("Unknown user function '{keyword}'")]
    UnknownUserFunction { keyword: String },

    /// The host's implementation of a user function reported failure.
    #[error("User function '{keyword}' failed: {message}")]
    UserFunctionFailed { keyword: String, message: String },

    /// A built-in was given arguments it cannot use.
    #[error("Bad arguments to '{op}': {message}")]
    BadArguments { op: String, message: String },

    /// A special user data name was bound twice.
    #[error("User data '{name}' is already stored")]
    DuplicateUserData { name: String },

    /// A field index outside `[0, num_data)`.
    #[error("Index {index} out of range for field '{field}' (length {len})")]
    IndexOutOfRange {
        field: String,
        index: usize,
        len: usize,
    },

    /// The caller asked a node for something it cannot provide.
    #[error("Invalid request: {message}")]
    Misuse { message: String },

    /// Evaluation recursion depth exceeded.
    #[error("Evaluation nesting depth {depth} exceeds maximum of {max_depth}")]
    StackOverflow { depth: usize, max_depth: usize },
}

impl EvalError {
    pub fn bad_arguments(op: impl Into<String>, message: impl Into<String>) -> Self {
        EvalError::BadArguments {
            op: op.into(),
            message: message.into(),
        }
    }

    pub fn user_failed(keyword: impl Into<String>, message: impl Into<String>) -> Self {
        EvalError::UserFunctionFailed {
            keyword: keyword.into(),
            message: message.into(),
        }
    }

    /// Resource errors are fatal for a whole script run; everything else
    /// only aborts the current statement.
    pub fn is_resource_exceeded(&self) -> bool {
        matches!(self, EvalError::StackOverflow { .. })
    }
}
