use crate::api::{Diagnostic, RelatedInfo};
use crate::parser::{Rule, Span};

/// Parser error with the source it was raised against
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub source: String,
    pub span: Span,
}

/// Specific kinds of parse errors
#[derive(Debug, Clone, PartialEq)]
pub enum ParseErrorKind {
    /// Unexpected token
    UnexpectedToken { expected: String, found: String },
    /// Unclosed delimiter; `open` is where it was opened
    UnclosedDelimiter { delimiter: char, open: Span },
    /// Invalid number literal
    InvalidNumber { text: String },
    /// Maximum nesting depth exceeded
    MaxDepthExceeded { depth: usize, max_depth: usize },
    /// Syntactically valid but not a usable statement, e.g. a built-in
    /// called with the wrong number of arguments
    InvalidStatement { message: String },
    /// Other parse errors (catch-all for Pest errors we don't specifically handle)
    Other { message: String },
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, source: String, span: Span) -> Self {
        Self { kind, source, span }
    }

    /// Convert to a Diagnostic for API boundary
    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut related = Vec::new();
        let (message, code, help) = match &self.kind {
            ParseErrorKind::UnexpectedToken { expected, found } => (
                format!("Expected {}, found {}", expected, found),
                "P001",
                vec![],
            ),
            ParseErrorKind::UnclosedDelimiter { delimiter, open } => {
                related.push(RelatedInfo {
                    span: open.clone(),
                    message: format!("'{}' opened here", delimiter),
                });
                (
                    format!("Unclosed delimiter '{}'", delimiter),
                    "P002",
                    vec!["Add the missing closing delimiter".to_string()],
                )
            }
            ParseErrorKind::InvalidNumber { text } => (
                format!("Invalid number literal '{}'", text),
                "P003",
                vec!["Check the number format".to_string()],
            ),
            ParseErrorKind::MaxDepthExceeded { depth, max_depth } => (
                format!(
                    "Nesting depth {} exceeds maximum of {} levels",
                    depth, max_depth
                ),
                "P004",
                vec!["Reduce nesting or split the statement".to_string()],
            ),
            ParseErrorKind::InvalidStatement { message } => (
                message.clone(),
                "P005",
                vec!["Run with --list-functions to see built-in signatures".to_string()],
            ),
            ParseErrorKind::Other { message } => (message.clone(), "P999", vec![]),
        };

        Diagnostic {
            message,
            span: self.span.clone(),
            related,
            help,
            code: Some(code.to_string()),
        }
    }
}

impl core::fmt::Display for ParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let diagnostic = self.to_diagnostic();
        write!(f, "error: {}", diagnostic.message)?;

        if let Some(ref code) = diagnostic.code {
            write!(f, " [{}]", code)?;
        }

        for help_msg in &diagnostic.help {
            write!(f, "\nhelp: {}", help_msg)?;
        }

        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// Convert Pest error to human-readable ParseError
pub fn convert_pest_error(err: pest::error::Error<Rule>, source: &str) -> ParseError {
    use pest::error::ErrorVariant;

    let span = match err.location {
        pest::error::InputLocation::Pos(pos) => Span(pos..pos),
        pest::error::InputLocation::Span((start, end)) => Span(start..end),
    };

    let kind = match err.variant {
        ErrorVariant::ParsingError {
            positives,
            negatives,
        } => {
            if let Some(open) = unclosed_paren(source) {
                return ParseError::new(
                    ParseErrorKind::UnclosedDelimiter {
                        delimiter: '(',
                        open,
                    },
                    source.to_string(),
                    span,
                );
            }
            ParseErrorKind::UnexpectedToken {
                expected: format_expected_rules(&positives),
                found: format_found(&negatives, source, span.0.start),
            }
        }
        ErrorVariant::CustomError { message } => ParseErrorKind::Other { message },
    };

    ParseError::new(kind, source.to_string(), span)
}

/// Span of the innermost '(' left open at the end of `source`.
fn unclosed_paren(source: &str) -> Option<Span> {
    let mut open = Vec::new();
    for (pos, c) in source.char_indices() {
        match c {
            '(' => open.push(pos),
            ')' => {
                open.pop();
            }
            _ => {}
        }
    }
    open.pop().map(|pos| Span::new(pos, pos + 1))
}

/// Format expected rules in a human-readable way
fn format_expected_rules(rules: &[Rule]) -> String {
    if rules.is_empty() {
        return "something else".to_string();
    }

    // Group related rules into higher-level concepts
    let mut concepts: Vec<&str> = Vec::new();

    for rule in rules {
        let concept = match rule {
            Rule::number | Rule::missing => "literal",
            Rule::ident => "identifier",
            Rule::add | Rule::sub | Rule::mul | Rule::div => "arithmetic operator",
            Rule::le | Rule::ge | Rule::eq | Rule::ne | Rule::lt | Rule::gt => {
                "comparison operator"
            }
            Rule::and | Rule::or => "'and' or 'or'",
            Rule::kw_then => "'then'",
            Rule::kw_else => "'else'",
            Rule::kw_if => "statement",
            Rule::EOI => "end of input",
            _ => "expression",
        };
        if !concepts.contains(&concept) {
            concepts.push(concept);
        }
    }

    match concepts.split_last() {
        Some((last, [])) => last.to_string(),
        Some((last, rest)) => format!("{} or {}", rest.join(", "), last),
        None => "something else".to_string(),
    }
}

/// Describe what was found at `pos`
fn format_found(rules: &[Rule], source: &str, pos: usize) -> String {
    if let Some(rule) = rules.first() {
        return match rule {
            Rule::ident => "identifier".to_string(),
            Rule::number => "number".to_string(),
            Rule::missing => "'missing'".to_string(),
            Rule::EOI => "end of input".to_string(),
            other => format!("{:?}", other),
        };
    }
    match source.get(pos..).and_then(|rest| rest.chars().next()) {
        Some(c) => format!("'{}'", c),
        None => "end of input".to_string(),
    }
}
