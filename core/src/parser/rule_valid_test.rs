// Tests with valid scripts for each rule in the grammar.

use crate::parser::{Rule, ScriptParser};
use pest::Parser;
use pest::iterators::Pair;

fn contains_rule(pair: Pair<Rule>, target: Rule) -> bool {
    if pair.as_rule() == target {
        return true;
    }
    for inner in pair.into_inner() {
        if contains_rule(inner, target) {
            return true;
        }
    }
    false
}

macro_rules! rule_examples {
    ( $($rule:ident => [$($expr:expr),* $(,)?]),* $(,)? ) => {
        $(
            #[test]
            fn $rule() {
                let inputs = vec![$($expr),*];
                for input in inputs {
                    let result = ScriptParser::parse(Rule::main, input)
                        .unwrap_or_else(|e| panic!("Failed to parse '{}': {}", input, e));
                    let root = result.into_iter().next().unwrap();
                    assert!(
                        contains_rule(root.clone(), Rule::$rule),
                        "Expected to find rule {:?} in parse tree for input '{}'",
                        Rule::$rule,
                        input
                    );
                }
            }
        )*
    };
}

rule_examples! {
    statement => ["A = 1", "A = 1;", ";A = 1;;B = 2;"],
    assignment => ["A = B", "SNR = DBZ - 5", "V = missing"],
    conditional => [
        "if (DBZ > 20) then A = 1",
        "if (DBZ > 20 && VEL < 3) then A = 1 else B = 0",
        "if(X==missing)then X = 0",
    ],
    call => ["A = abs(B)", "A = max(B, C, 3)", "A = clump(DBZ, 10)", "A = noargs()"],
    binary => ["A = B + 1", "A = B - -1", "A = B * C / D", "A = 1-2"],
    logical => ["A = B > 1", "A = B > 1 AND C < 2 OR D == missing", "A = B != missing"],
    term => ["A = B >= 1", "A = B <= 1", "A = B == 1", "A = B != 1", "A = B < 1"],
    number => ["A = 42", "A = -3.5", "A = .5", "A = 2.", "A = 6.022e23", "A = 1E-3"],
    missing => ["A = missing", "A = B == missing"],
    ident => ["A = B", "_x1 = y_2", "missingness = 1", "iffy = thenx"],
    and => ["A = B > 1 && C > 2", "A = B > 1 and C > 2", "A = B > 1 AND C > 2"],
    or => ["A = B > 1 || C > 2", "A = B > 1 or C > 2", "A = B > 1 OR C > 2"],
    kw_else => ["if (A > 1) then B = 1 else C = 2"],
}

#[test]
fn comments_are_ignored() {
    let input = "# header\nA = 1; # trailing\nB = 2";
    let result = ScriptParser::parse(Rule::main, input).unwrap();
    let root = result.into_iter().next().unwrap();
    let statements = root
        .into_inner()
        .filter(|p| p.as_rule() == Rule::statement)
        .count();
    assert_eq!(statements, 2);
}

#[test]
fn invalid_scripts_are_rejected() {
    for input in [
        "A = ",
        "A == B",
        "1 = A",
        "A = B +",
        "A = (B + C)",
        "A = abs(B) + 1",
        "if A > 1 then B = 1",
        "A = 1 B = 2",
        "missing = 1",
    ] {
        assert!(
            ScriptParser::parse(Rule::main, input).is_err(),
            "Expected '{}' to be rejected",
            input
        );
    }
}
