mod cases;

use cases::M;

test_case!(
    then_only_keeps_other_points,
    script: "OUT = 0; if (DBZ > 20) then OUT = DBZ",
    fields: { "DBZ" => [10.0, M, 40.0] },
    expect: { "OUT" => [0.0, 0.0, 40.0] },
);

test_case!(
    then_else_same_target,
    script: "if (DBZ > 20) then CLASS = 2 else CLASS = 1",
    fields: { "DBZ" => [10.0, M, 40.0] },
    expect: { "CLASS" => [1.0, 1.0, 2.0] },
);

test_case!(
    then_else_different_targets,
    script: "if (DBZ >= 40) then HIGH = DBZ else LOW = DBZ",
    fields: { "DBZ" => [10.0, M, 40.0] },
    expect: {
        "HIGH" => [M, M, 40.0],
        "LOW" => [10.0, M, M],
    },
);

test_case!(
    new_target_is_missing_where_unselected,
    script: "if (DBZ != missing) then CLEAN = DBZ - 1",
    fields: { "DBZ" => [10.0, M, 40.0] },
    expect: { "CLEAN" => [9.0, M, 39.0] },
);

test_case!(
    test_on_missing,
    script: "FILLED = DBZ; if (DBZ == missing) then FILLED = 0",
    fields: { "DBZ" => [10.0, M, 40.0] },
    expect: { "FILLED" => [10.0, 0.0, 40.0] },
);

test_case!(
    compound_test_left_to_right,
    script: "if (DBZ > 0 or VEL > 0 and WIDTH > 0) then HIT = 1 else HIT = 0",
    fields: {
        "DBZ" => [5.0, 5.0, 0.0],
        "VEL" => [0.0, 0.0, 5.0],
        "WIDTH" => [0.0, 1.0, 1.0],
    },
    // ((DBZ > 0) or (VEL > 0)) and (WIDTH > 0)
    expect: { "HIT" => [0.0, 1.0, 1.0] },
);

test_case!(
    branch_with_builtin_call,
    script: "if (DBZ < 0) then POS = abs(DBZ) else POS = DBZ",
    fields: { "DBZ" => [-3.0, M, 4.0] },
    expect: { "POS" => [3.0, M, 4.0] },
);

#[test]
fn conditional_reports_both_targets() {
    let (_, report) = cases::run_script(
        "if (DBZ > 0) then A = 1 else B = 1",
        &[("DBZ", &[1.0, -1.0])],
    );
    assert_eq!(report.produced(), vec!["A", "B"]);
}
