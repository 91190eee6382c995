use pretty_assertions::assert_eq;

use crate::leaf::LeafContent;
use crate::node::{
    AssignmentNode, BinaryArgs, BinaryOp, BoolOp, Compare, LogicalArgs, LogicalTerm, Node,
    UnaryOp,
};
use crate::parser::{ParseErrorKind, Span, parse, parse_expression, parse_with_max_depth};

fn var(name: &str) -> LeafContent {
    LeafContent::variable(name)
}

fn num(text: &str, value: f64) -> LeafContent {
    LeafContent::labeled_number(text, value)
}

#[test]
fn test_simple_assignment() {
    let parsed = parse("SNR = DBZ - 5").unwrap();
    let expected = AssignmentNode::new(
        "SNR",
        Node::Binary(BinaryArgs::new(var("DBZ")).with(BinaryOp::Sub, num("5", 5.0))),
    )
    .unwrap();
    assert_eq!(parsed, vec![Node::Assignment(expected)]);
}

#[test]
fn test_constant_copy_and_missing_shapes() {
    let parsed = parse("A = 3.2; B = A; C = missing").unwrap();
    assert_eq!(
        parsed,
        vec![
            Node::Assignment(AssignmentNode::new("A", Node::Leaf(num("3.2", 3.2))).unwrap()),
            Node::Assignment(AssignmentNode::new("B", Node::variable("A")).unwrap()),
            Node::Assignment(AssignmentNode::new("C", Node::missing()).unwrap()),
        ]
    );
}

#[test]
fn test_logical_chain_is_flat() {
    let parsed = parse_expression("A > 1 AND B > 2 OR C > 3").unwrap();
    let expected = LogicalArgs::new(LogicalTerm::new(var("A"), Compare::Gt, num("1", 1.0)))
        .with(
            BoolOp::And,
            LogicalTerm::new(var("B"), Compare::Gt, num("2", 2.0)),
        )
        .with(
            BoolOp::Or,
            LogicalTerm::new(var("C"), Compare::Gt, num("3", 3.0)),
        );
    assert_eq!(parsed, Node::Logical(expected));
}

#[test]
fn test_binary_chain_is_flat() {
    let parsed = parse_expression("A + B * 2").unwrap();
    let expected = BinaryArgs::new(var("A"))
        .with(BinaryOp::Add, var("B"))
        .with(BinaryOp::Mul, num("2", 2.0));
    assert_eq!(parsed, Node::Binary(expected));
}

#[test]
fn test_builtin_and_user_calls() {
    let parsed = parse_expression("max(A, B + 1, 3)").unwrap();
    let Node::Unary(call) = parsed else {
        panic!("expected a call, got {:?}", parsed);
    };
    assert_eq!(call.builtin_op(), Some(UnaryOp::Max));
    assert_eq!(call.arg_strings(), vec!["A", "B + 1", "3"]);

    let parsed = parse_expression("clump(DBZ, 10)").unwrap();
    assert!(parsed.is_user_function());
    assert_eq!(parsed.user_unary_keyword(), Some("clump"));
}

#[test]
fn test_conditional() {
    let parsed = parse("if (DBZ > 20) then FLAG = 1 else FLAG = 0").unwrap();
    assert_eq!(parsed.len(), 1);
    let Node::Conditional(cond) = &parsed[0] else {
        panic!("expected a conditional, got {:?}", parsed[0]);
    };
    assert_eq!(cond.test().to_string(), "DBZ > 20");
    assert_eq!(cond.then_branch().to_string(), "FLAG = 1");
    assert_eq!(cond.else_branch().map(|b| b.to_string()), Some("FLAG = 0".to_string()));
    assert_eq!(parsed[0].outputs(), vec!["FLAG"]);
}

#[test]
fn test_printing_round_trips() {
    let source = "SNR = DBZ - 5; FLAG = DBZ > 20 && VEL != missing; \
                  S = smooth(DBZ, 5); if (A >= 1) then B = A * 2 else C = 1e3";
    let first = parse(source).unwrap();
    let printed: Vec<String> = first.iter().map(|n| n.to_string()).collect();
    let second = parse(&printed.join("; ")).unwrap();
    assert_eq!(first, second);
    assert_eq!(printed[0], "SNR = DBZ - 5");
    assert_eq!(printed[3], "if (A >= 1) then B = A * 2 else C = 1e3");
}

#[test]
fn test_empty_script() {
    assert_eq!(parse("").unwrap(), vec![]);
    assert_eq!(parse("  ;; # nothing here\n").unwrap(), vec![]);
}

#[test]
fn test_builtin_arity_is_checked() {
    let err = parse("A = abs(B, C)").unwrap_err();
    assert!(matches!(err.kind, ParseErrorKind::InvalidStatement { .. }));
    assert_eq!(err.to_diagnostic().code.as_deref(), Some("P005"));

    let err = parse("A = smooth(3, 5)").unwrap_err();
    assert!(matches!(err.kind, ParseErrorKind::InvalidStatement { .. }));
}

#[test]
fn test_syntax_error_has_span() {
    let err = parse("A = B +").unwrap_err();
    assert!(matches!(err.kind, ParseErrorKind::UnexpectedToken { .. }));
    assert!(err.span.0.start <= "A = B +".len());
    assert_eq!(err.source, "A = B +");
}

#[test]
fn test_unclosed_call() {
    let err = parse("A = abs(B").unwrap_err();
    assert_eq!(
        err.kind,
        ParseErrorKind::UnclosedDelimiter {
            delimiter: '(',
            open: Span::new(7, 8),
        }
    );
}

#[test]
fn test_max_depth() {
    let nested = format!("A = {}B{}", "abs(".repeat(20), ")".repeat(20));
    assert!(parse_with_max_depth(&nested, 20).is_ok());
    let err = parse_with_max_depth(&nested, 10).unwrap_err();
    assert_eq!(
        err.kind,
        ParseErrorKind::MaxDepthExceeded {
            depth: 11,
            max_depth: 10
        }
    );
}
