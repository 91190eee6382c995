//! One compiled script shared by many threads, each with its own scope.

use rayon::prelude::*;

use radmath_core::{
    CompiledScript, Engine,
    scope::memory::{ArrayField, MemoryScope},
};

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn test_compiled_script_is_shareable() {
    assert_send_sync::<CompiledScript>();
    assert_send_sync::<Engine>();
}

#[test]
fn test_parallel_runs_are_independent() {
    let script = Engine::default()
        .compile("SNR = DBZ - 5; FLAG = DBZ > 20; if (FLAG == 1) then SNR = missing")
        .unwrap();

    let results: Vec<Vec<Option<f64>>> = (0..64)
        .into_par_iter()
        .map(|ray| {
            let dbz: Vec<f64> = (0..16).map(|i| (ray + i) as f64).collect();
            let mut scope = MemoryScope::new();
            scope.add_field(ArrayField::new("DBZ", dbz)).unwrap();
            let report = script.run(&mut scope);
            assert!(report.is_success(), "ray {ray}: {report:?}");
            scope.array("SNR").unwrap().to_options()
        })
        .collect();

    for (ray, snr) in results.iter().enumerate() {
        for (i, value) in snr.iter().enumerate() {
            let dbz = (ray + i) as f64;
            let expected = if dbz > 20.0 { None } else { Some(dbz - 5.0) };
            assert_eq!(*value, expected, "ray {ray}, point {i}");
        }
    }
}
