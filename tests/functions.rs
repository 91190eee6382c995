mod cases;

use cases::{Count, M};
use radmath::{EvalError, MathData};

test_case!(
    pointwise_builtins,
    script: "A = abs(X); S = sqrt(X); L = log10(Y)",
    fields: {
        "X" => [-4.0, 4.0, M],
        "Y" => [100.0, 0.0, 10.0],
    },
    expect: {
        "A" => [4.0, 4.0, M],
        "S" => [M, 2.0, M],
        "L" => [2.0, M, 1.0],
    },
);

test_case!(
    variadic_builtins,
    script: "LO = min(X, Y, 3); HI = max(X, Y); AVG = average(X, Y)",
    fields: {
        "X" => [1.0, 8.0, M],
        "Y" => [5.0, 2.0, 1.0],
    },
    expect: {
        "LO" => [1.0, 2.0, M],
        "HI" => [5.0, 8.0, M],
        "AVG" => [3.0, 5.0, M],
    },
);

test_case!(
    membership_functions,
    script: "F = fuzzy(X, 0, 0, 10, 1); T = trapezoid(X, 0, 5, 10, 20); S = s_remap(X, 0, 10)",
    fields: { "X" => [5.0, 15.0, M] },
    expect: {
        "F" => [0.5, 1.0, M],
        "T" => [1.0, 0.5, M],
        "S" => [0.5, 1.0, M],
    },
);

test_case!(
    masking,
    script: "MASKED = mask(X, 0, 1, 5, 6); KEPT = mask_missing_to_missing(X, Y)",
    fields: {
        "X" => [0.5, 3.0, 5.5],
        "Y" => [1.0, M, 1.0],
    },
    expect: {
        "MASKED" => [M, 3.0, M],
        "KEPT" => [0.5, M, 5.5],
    },
);

test_case!(
    window_smoothing,
    script: "S = smooth(X, 3); MED = median(X, 3)",
    fields: { "X" => [1.0, 3.0, M, 5.0, 9.0] },
    expect: {
        "S" => [2.0, 2.0, M, 7.0, 7.0],
        "MED" => [2.0, 2.0, M, 7.0, 7.0],
    },
);

test_case!(
    user_field_function,
    script: "HALF = scale(DBZ, 0.5)",
    fields: { "DBZ" => [10.0, M, 40.0] },
    expect: { "HALF" => [5.0, M, 20.0] },
);

#[test]
fn user_data_function() {
    let (scope, report) = cases::run_script("N = count_present(DBZ)", &[("DBZ", &[1.0, M, 3.0])]);
    assert!(report.is_success());
    assert_eq!(report.produced(), vec!["N"]);
    assert!(scope.array("N").is_none());
    assert_eq!(scope.special().get::<Count>("N"), Some(&Count(2)));
    assert_eq!(scope.user_data("N").and_then(|d| d.as_float()), Some(2.0));
}

#[test]
fn user_data_name_is_bound_once() {
    let (_, report) = cases::run_script(
        "N = count_present(DBZ); N = count_present(DBZ)",
        &[("DBZ", &[1.0])],
    );
    let errors: Vec<&EvalError> = report.failures().map(|(_, e)| e).collect();
    assert_eq!(
        errors,
        vec![&EvalError::DuplicateUserData {
            name: "N".to_string()
        }]
    );
}

#[test]
fn user_functions_only_at_statement_level() {
    let (scope, report) = cases::run_script("X = abs(scale(DBZ, 2))", &[("DBZ", &[1.0])]);
    assert!(matches!(
        report.failures().next(),
        Some((_, EvalError::BadArguments { .. }))
    ));
    assert!(scope.array("X").is_none());
}

#[test]
fn user_function_failure_is_reported() {
    let (scope, report) = cases::run_script("X = scale(DBZ)", &[("DBZ", &[1.0])]);
    assert!(matches!(
        report.failures().next(),
        Some((_, EvalError::UserFunctionFailed { .. }))
    ));
    assert!(scope.array("X").is_none());
}

#[test]
fn unknown_user_function() {
    let (_, report) = cases::run_script("X = frobnicate(DBZ)", &[("DBZ", &[1.0])]);
    assert!(matches!(
        report.failures().next(),
        Some((_, EvalError::UnknownUserFunction { keyword })) if keyword == "frobnicate"
    ));
}

#[test]
fn scope_lists_user_functions() {
    let scope = cases::scope(&[]);
    let names: Vec<&str> = scope.user_functions().iter().map(|f| f.name()).collect();
    assert_eq!(names, vec!["count_present", "scale"]);
}
