use radmath_core::parser::{self, ParseErrorKind};
use reedline::{ValidationResult, Validator};

/// Keeps the REPL reading lines while a call is still open, so a long
/// argument list can be split across lines.
pub struct ScriptValidator;

impl Validator for ScriptValidator {
    fn validate(&self, line: &str) -> ValidationResult {
        if is_incomplete(line) {
            ValidationResult::Incomplete
        } else {
            ValidationResult::Complete
        }
    }
}

fn is_incomplete(buffer: &str) -> bool {
    match parser::parse(buffer) {
        Err(e) => matches!(e.kind, ParseErrorKind::UnclosedDelimiter { .. }),
        Ok(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_call_is_incomplete() {
        assert!(is_incomplete("A = max(B,"));
        assert!(!is_incomplete("A = max(B, C)"));
        // Other errors are reported, not continued.
        assert!(!is_incomplete("A = B +"));
    }
}
