use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;
use tracing::debug;

use crate::leaf::LeafContent;
use crate::node::{
    AssignmentNode, BinaryArgs, BinaryOp, BoolOp, Compare, ConditionalNode, LogicalArgs,
    LogicalTerm, Node, UnaryNode,
};
use crate::parser::Span;
use crate::parser::error::{ParseError, ParseErrorKind, convert_pest_error};

/// Default limit on parenthesis nesting.
pub const DEFAULT_MAX_DEPTH: usize = 500;

#[derive(Parser)]
#[grammar = "parser/grammar.pest"]
pub struct ScriptParser;

/// Parse a script into one tree per statement.
pub fn parse(source: &str) -> Result<Vec<Node>, ParseError> {
    parse_with_max_depth(source, DEFAULT_MAX_DEPTH)
}

/// Parse a script, rejecting parenthesis nesting deeper than `max_depth`
/// before the grammar recurses into it.
pub fn parse_with_max_depth(source: &str, max_depth: usize) -> Result<Vec<Node>, ParseError> {
    check_nesting(source, max_depth)?;
    let mut pairs =
        ScriptParser::parse(Rule::main, source).map_err(|e| convert_pest_error(e, source))?;
    let builder = Builder { source };
    let main = builder.expect(pairs.next(), Span::new(0, source.len()))?;
    let statements = main
        .into_inner()
        .filter(|pair| pair.as_rule() == Rule::statement)
        .map(|pair| builder.statement(pair))
        .collect::<Result<Vec<_>, _>>()?;
    debug!(count = statements.len(), "parsed script");
    Ok(statements)
}

/// Parse a single value-producing expression, such as `DBZ - 5`.
pub fn parse_expression(source: &str) -> Result<Node, ParseError> {
    check_nesting(source, DEFAULT_MAX_DEPTH)?;
    let mut pairs =
        ScriptParser::parse(Rule::expression, source).map_err(|e| convert_pest_error(e, source))?;
    let builder = Builder { source };
    let expression = builder.expect(pairs.next(), Span::new(0, source.len()))?;
    let value = builder.expect(
        expression
            .into_inner()
            .find(|pair| pair.as_rule() != Rule::EOI),
        Span::new(0, source.len()),
    )?;
    builder.value(value)
}

fn check_nesting(source: &str, max_depth: usize) -> Result<(), ParseError> {
    let mut depth = 0usize;
    for (pos, c) in source.char_indices() {
        match c {
            '(' => {
                depth += 1;
                if depth > max_depth {
                    return Err(ParseError::new(
                        ParseErrorKind::MaxDepthExceeded { depth, max_depth },
                        source.to_string(),
                        Span::new(pos, pos + 1),
                    ));
                }
            }
            ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    Ok(())
}

/// Turns pest pairs into nodes, reporting errors against `source`.
struct Builder<'s> {
    source: &'s str,
}

impl<'s> Builder<'s> {
    fn error(&self, kind: ParseErrorKind, span: Span) -> ParseError {
        ParseError::new(kind, self.source.to_string(), span)
    }

    fn expect<'i>(&self, pair: Option<Pair<'i, Rule>>, span: Span) -> Result<Pair<'i, Rule>, ParseError> {
        pair.ok_or_else(|| {
            self.error(
                ParseErrorKind::Other {
                    message: "missing expected pair in rule".to_string(),
                },
                span,
            )
        })
    }

    fn invalid(&self, message: impl Into<String>, span: Span) -> ParseError {
        self.error(
            ParseErrorKind::InvalidStatement {
                message: message.into(),
            },
            span,
        )
    }

    fn statement(&self, pair: Pair<'_, Rule>) -> Result<Node, ParseError> {
        let span = Span::from(pair.as_span());
        let inner = self.expect(pair.into_inner().next(), span.clone())?;
        match inner.as_rule() {
            Rule::assignment => Ok(Node::Assignment(self.assignment(inner)?)),
            Rule::conditional => Ok(Node::Conditional(self.conditional(inner)?)),
            other => Err(self.invalid(format!("unexpected {:?} in statement", other), span)),
        }
    }

    fn assignment(&self, pair: Pair<'_, Rule>) -> Result<AssignmentNode, ParseError> {
        let span = Span::from(pair.as_span());
        let mut inner = pair.into_inner();
        let target = self.expect(inner.next(), span.clone())?;
        let value = self.value(self.expect(inner.next(), span.clone())?)?;
        AssignmentNode::new(target.as_str(), value).map_err(|e| self.invalid(e.to_string(), span))
    }

    fn conditional(&self, pair: Pair<'_, Rule>) -> Result<ConditionalNode, ParseError> {
        let span = Span::from(pair.as_span());
        let mut test = None;
        let mut branches = Vec::new();
        for part in pair.into_inner() {
            match part.as_rule() {
                Rule::logical => test = Some(self.logical(part)?),
                Rule::assignment => branches.push(self.assignment(part)?),
                _ => {}
            }
        }
        let test = test.ok_or_else(|| self.invalid("conditional without a test", span.clone()))?;
        let mut branches = branches.into_iter();
        let then_branch = branches
            .next()
            .ok_or_else(|| self.invalid("conditional without a then branch", span))?;
        Ok(ConditionalNode::new(test, then_branch, branches.next()))
    }

    fn value(&self, pair: Pair<'_, Rule>) -> Result<Node, ParseError> {
        match pair.as_rule() {
            Rule::call => self.call(pair),
            Rule::logical => Ok(Node::Logical(self.logical(pair)?)),
            Rule::binary => Ok(Node::Binary(self.binary(pair)?)),
            _ => Ok(Node::Leaf(self.leaf(pair)?)),
        }
    }

    fn call(&self, pair: Pair<'_, Rule>) -> Result<Node, ParseError> {
        let span = Span::from(pair.as_span());
        let mut inner = pair.into_inner();
        let keyword = self.expect(inner.next(), span.clone())?.as_str();
        let args = inner
            .map(|arg| self.value(arg))
            .collect::<Result<Vec<_>, _>>()?;
        UnaryNode::call(keyword, args)
            .map(Node::Unary)
            .map_err(|e| self.invalid(e.to_string(), span))
    }

    fn binary(&self, pair: Pair<'_, Rule>) -> Result<BinaryArgs, ParseError> {
        let span = Span::from(pair.as_span());
        let mut inner = pair.into_inner();
        let mut args = BinaryArgs::new(self.leaf(self.expect(inner.next(), span.clone())?)?);
        while let Some(op) = inner.next() {
            let op = match op.as_rule() {
                Rule::add => BinaryOp::Add,
                Rule::sub => BinaryOp::Sub,
                Rule::mul => BinaryOp::Mul,
                Rule::div => BinaryOp::Div,
                other => {
                    return Err(self.invalid(format!("unknown operator {:?}", other), op.as_span().into()));
                }
            };
            let operand = self.leaf(self.expect(inner.next(), span.clone())?)?;
            args.push(op, operand);
        }
        Ok(args)
    }

    fn logical(&self, pair: Pair<'_, Rule>) -> Result<LogicalArgs, ParseError> {
        let span = Span::from(pair.as_span());
        let mut inner = pair.into_inner();
        let mut args = LogicalArgs::new(self.term(self.expect(inner.next(), span.clone())?)?);
        while let Some(op) = inner.next() {
            let op = match op.as_rule() {
                Rule::and => BoolOp::And,
                Rule::or => BoolOp::Or,
                other => {
                    return Err(self.invalid(format!("unknown operator {:?}", other), op.as_span().into()));
                }
            };
            let term = self.term(self.expect(inner.next(), span.clone())?)?;
            args.push(op, term);
        }
        Ok(args)
    }

    fn term(&self, pair: Pair<'_, Rule>) -> Result<LogicalTerm, ParseError> {
        let span = Span::from(pair.as_span());
        let mut inner = pair.into_inner();
        let left = self.leaf(self.expect(inner.next(), span.clone())?)?;
        let op = self.expect(inner.next(), span.clone())?;
        let compare = match op.as_rule() {
            Rule::lt => Compare::Lt,
            Rule::le => Compare::Le,
            Rule::gt => Compare::Gt,
            Rule::ge => Compare::Ge,
            Rule::eq => Compare::Eq,
            Rule::ne => Compare::Ne,
            other => {
                return Err(self.invalid(format!("unknown comparison {:?}", other), op.as_span().into()));
            }
        };
        let right = self.leaf(self.expect(inner.next(), span)?)?;
        Ok(LogicalTerm::new(left, compare, right))
    }

    fn leaf(&self, pair: Pair<'_, Rule>) -> Result<LeafContent, ParseError> {
        let text = pair.as_str();
        match pair.as_rule() {
            Rule::ident => Ok(LeafContent::variable(text)),
            Rule::missing => Ok(LeafContent::Missing),
            Rule::number => match text.parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(LeafContent::labeled_number(text, value)),
                _ => Err(self.error(
                    ParseErrorKind::InvalidNumber {
                        text: text.to_string(),
                    },
                    pair.as_span().into(),
                )),
            },
            other => Err(self.invalid(
                format!("expected a field name, number or 'missing', found {:?}", other),
                pair.as_span().into(),
            )),
        }
    }
}
