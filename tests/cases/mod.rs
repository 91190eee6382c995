#![allow(dead_code)]

use std::sync::Arc;

use once_cell::sync::Lazy;
use radmath::scope::memory::{ArrayField, MemoryScope, UserFunctions};
use radmath::{Engine, EvalError, FunctionDef, MathData, MathLoopData, Node, RunReport};

/// Sentinel used by every field in these tests.
pub const M: f64 = -9999.0;

/// Host functions available to every test scope.
///
/// - `scale(F, k)` writes `F * k`.
/// - `count_present(F)` stores the number of present points as user data.
pub static FUNCTIONS: Lazy<Arc<UserFunctions>> = Lazy::new(|| {
    let mut functions = UserFunctions::new();
    functions.register_field(
        FunctionDef::new("scale", "Multiply a field by a constant."),
        |data, args, out| {
            let (Some(name), Some(k)) = (
                args.first().and_then(Node::leaf_name),
                args.get(1).map(Node::constant_value),
            ) else {
                return Err(EvalError::user_failed("scale", "expected scale(F, k)"));
            };
            let k = k?;
            let input = data
                .data(name)
                .ok_or_else(|| EvalError::user_failed("scale", format!("no field '{}'", name)))?;
            for i in 0..input.num_data() {
                match input.get_val(i) {
                    Some(v) => out.set_val(i, v * k)?,
                    None => out.set_missing(i)?,
                }
            }
            Ok(())
        },
    );
    functions.register_user_data(
        FunctionDef::new("count_present", "Count the present points of a field."),
        |data, args| {
            let name = args.first().and_then(Node::leaf_name).unwrap_or_default();
            let input = data
                .data(name)
                .ok_or_else(|| EvalError::user_failed("count_present", "expected a field"))?;
            let count = (0..input.num_data())
                .filter(|&i| input.get_val(i).is_some())
                .count();
            Ok(Box::new(Count(count)))
        },
    );
    Arc::new(functions)
});

#[derive(Debug, PartialEq)]
pub struct Count(pub usize);

impl radmath::MathUserData for Count {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
    fn as_float(&self) -> Option<f64> {
        Some(self.0 as f64)
    }
}

/// Build a scope from `(name, raw values)` pairs, all using the sentinel `M`.
pub fn scope(fields: &[(&str, &[f64])]) -> MemoryScope<'static> {
    let mut scope = MemoryScope::new().with_functions(Arc::clone(&FUNCTIONS));
    for (name, values) in fields {
        scope
            .add_field(ArrayField::with_missing(*name, values.to_vec(), M))
            .unwrap();
    }
    scope
}

/// Compile and run `script` against a fresh scope.
pub fn run_script(script: &str, fields: &[(&str, &[f64])]) -> (MemoryScope<'static>, RunReport) {
    let script = Engine::default().compile(script).unwrap();
    let mut scope = scope(fields);
    let report = script.run(&mut scope);
    (scope, report)
}

/// Raw contents of a field, sentinels included.
pub fn raw(scope: &MemoryScope<'_>, name: &str) -> Vec<f64> {
    match scope.array(name) {
        Some(field) => field.values().to_vec(),
        None => panic!("field '{}' was not produced", name),
    }
}

/// A script run against input fields, with the expected contents of some
/// fields afterwards (raw values, `M` for missing).
#[macro_export]
macro_rules! test_case {
    (
        $test_name:ident,
        script: $script:expr,
        fields: { $($field:literal => $values:expr),* $(,)? },
        expect: { $($out:literal => $expected:expr),* $(,)? } $(,)?
    ) => {
        #[test]
        fn $test_name() {
            let (scope, report) = $crate::cases::run_script(
                $script,
                &[$(($field, &$values[..])),*],
            );
            assert!(report.is_success(), "{:?}", report);
            $(
                pretty_assertions::assert_eq!(
                    $crate::cases::raw(&scope, $out),
                    $expected.to_vec(),
                    "field {}",
                    $out
                );
            )*
        }
    };
}
