pub mod error;
#[allow(clippy::module_inception)]
pub mod parser;
mod syntax;

// Re-export the parser and rule enum for external use
pub use parser::{DEFAULT_MAX_DEPTH, Rule, ScriptParser, parse, parse_expression, parse_with_max_depth};

pub use error::{ParseError, ParseErrorKind};
pub use syntax::Span;

#[cfg(test)]
mod parse_test;

#[cfg(test)]
mod rule_valid_test;
