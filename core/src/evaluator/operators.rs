//! Arithmetic, relational, and built-in operator implementations.
//!
//! Every function here works on present values only; the caller has already
//! turned a missing operand into a missing result. A result that is not
//! finite (division by zero, logarithm of zero, square root of a negative
//! number) is reported as missing.

use crate::node::{BinaryOp, BoolOp, Compare, UnaryOp};

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Apply one arithmetic operator.
pub(crate) fn apply_binary(op: BinaryOp, left: f64, right: f64) -> Option<f64> {
    let value = match op {
        BinaryOp::Add => left + right,
        BinaryOp::Sub => left - right,
        BinaryOp::Mul => left * right,
        BinaryOp::Div => {
            if right == 0.0 {
                return None;
            }
            left / right
        }
    };
    finite(value)
}

pub(crate) fn apply_bool(op: BoolOp, left: bool, right: bool) -> bool {
    match op {
        BoolOp::And => left && right,
        BoolOp::Or => left || right,
    }
}

pub(crate) fn compare_values(compare: Compare, left: f64, right: f64) -> bool {
    match compare {
        Compare::Lt => left < right,
        Compare::Le => left <= right,
        Compare::Gt => left > right,
        Compare::Ge => left >= right,
        Compare::Eq => left == right,
        Compare::Ne => left != right,
    }
}

/// Evaluate a pointwise built-in on already-resolved arguments.
///
/// Window operators are not pointwise and are handled by the evaluator.
pub(crate) fn apply_pointwise(op: UnaryOp, args: &[f64]) -> Option<f64> {
    let value = match op {
        UnaryOp::Abs => args[0].abs(),
        UnaryOp::Sqrt => args[0].sqrt(),
        UnaryOp::Log => args[0].ln(),
        UnaryOp::Log10 => args[0].log10(),
        UnaryOp::Exp => args[0].exp(),
        UnaryOp::DbToLinear => 10f64.powf(args[0] / 10.0),
        UnaryOp::LinearToDb => 10.0 * args[0].log10(),
        UnaryOp::Min => args.iter().copied().fold(f64::INFINITY, f64::min),
        UnaryOp::Max => args.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        UnaryOp::Average => args.iter().sum::<f64>() / args.len() as f64,
        UnaryOp::WeightedAverage => weighted_average(args)?,
        UnaryOp::Fuzzy => fuzzy(args[0], &args[1..]),
        UnaryOp::Trapezoid => trapezoid(args[0], args[1], args[2], args[3], args[4]),
        UnaryOp::SRemap => s_remap(args[0], args[1], args[2]),
        UnaryOp::Mask => {
            let x = args[0];
            let masked = args[1..]
                .chunks_exact(2)
                .any(|range| x >= range[0] && x <= range[1]);
            if masked {
                return None;
            }
            x
        }
        UnaryOp::MaskMissingToMissing => args[0],
        UnaryOp::Smooth | UnaryOp::StdDev | UnaryOp::Median => {
            debug_assert!(false, "window operator {} is not pointwise", op);
            return None;
        }
    };
    finite(value)
}

fn weighted_average(args: &[f64]) -> Option<f64> {
    let (sum, weight) = args
        .chunks_exact(2)
        .fold((0.0, 0.0), |(sum, weight), pair| {
            (sum + pair[0] * pair[1], weight + pair[1])
        });
    if weight == 0.0 {
        return None;
    }
    Some(sum / weight)
}

/// Piecewise linear remap through `(x, y)` points, clamped at both ends.
fn fuzzy(x: f64, points: &[f64]) -> f64 {
    let pairs: Vec<(f64, f64)> = points.chunks_exact(2).map(|p| (p[0], p[1])).collect();
    let (first, last) = (pairs[0], pairs[pairs.len() - 1]);
    if x <= first.0 {
        return first.1;
    }
    if x >= last.0 {
        return last.1;
    }
    for window in pairs.windows(2) {
        let ((x0, y0), (x1, y1)) = (window[0], window[1]);
        if x >= x0 && x <= x1 {
            if x1 == x0 {
                return y1;
            }
            return y0 + (x - x0) * (y1 - y0) / (x1 - x0);
        }
    }
    last.1
}

fn trapezoid(x: f64, a: f64, b: f64, c: f64, d: f64) -> f64 {
    if x <= a || x >= d {
        0.0
    } else if x >= b && x <= c {
        1.0
    } else if x < b {
        (x - a) / (b - a)
    } else {
        (d - x) / (d - c)
    }
}

fn s_remap(x: f64, a: f64, b: f64) -> f64 {
    if x <= a {
        return 0.0;
    }
    if x >= b {
        return 1.0;
    }
    let mid = (a + b) / 2.0;
    let scaled = (x - a) / (b - a);
    if x <= mid {
        2.0 * scaled * scaled
    } else {
        let from_top = (x - b) / (b - a);
        1.0 - 2.0 * from_top * from_top
    }
}

/// Statistic of the present values in a window. `None` when there are too
/// few values for the statistic.
pub(crate) fn window_statistic(op: UnaryOp, values: &mut Vec<f64>) -> Option<f64> {
    match op {
        UnaryOp::Smooth => {
            if values.is_empty() {
                return None;
            }
            Some(values.iter().sum::<f64>() / values.len() as f64)
        }
        UnaryOp::StdDev => {
            if values.len() < 2 {
                return None;
            }
            let n = values.len() as f64;
            let mean = values.iter().sum::<f64>() / n;
            let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
            Some(var.sqrt())
        }
        UnaryOp::Median => {
            if values.is_empty() {
                return None;
            }
            values.sort_by(f64::total_cmp);
            let mid = values.len() / 2;
            if values.len() % 2 == 0 {
                Some((values[mid - 1] + values[mid]) / 2.0)
            } else {
                Some(values[mid])
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_arithmetic() {
        assert_eq!(apply_binary(BinaryOp::Add, 2.0, 3.0), Some(5.0));
        assert_eq!(apply_binary(BinaryOp::Sub, 2.0, 3.0), Some(-1.0));
        assert_eq!(apply_binary(BinaryOp::Mul, 2.0, 3.0), Some(6.0));
        assert_eq!(apply_binary(BinaryOp::Div, 3.0, 2.0), Some(1.5));
    }

    #[test]
    fn test_division_by_zero_is_missing() {
        assert_eq!(apply_binary(BinaryOp::Div, 1.0, 0.0), None);
    }

    #[test]
    fn test_overflow_is_missing() {
        assert_eq!(apply_binary(BinaryOp::Mul, f64::MAX, 10.0), None);
    }

    #[test]
    fn test_compare() {
        assert!(compare_values(Compare::Gt, 40.0, 20.0));
        assert!(!compare_values(Compare::Gt, 20.0, 20.0));
        assert!(compare_values(Compare::Ge, 20.0, 20.0));
        assert!(compare_values(Compare::Ne, 1.0, 2.0));
    }

    #[test]
    fn test_math_domain_errors_are_missing() {
        assert_eq!(apply_pointwise(UnaryOp::Sqrt, &[-1.0]), None);
        assert_eq!(apply_pointwise(UnaryOp::Log10, &[0.0]), None);
        assert_eq!(apply_pointwise(UnaryOp::LinearToDb, &[-3.0]), None);
        let log = apply_pointwise(UnaryOp::Log10, &[100.0]).unwrap();
        assert!((log - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_db_conversions() {
        let linear = apply_pointwise(UnaryOp::DbToLinear, &[20.0]).unwrap();
        assert!((linear - 100.0).abs() < 1e-9);
        let db = apply_pointwise(UnaryOp::LinearToDb, &[1000.0]).unwrap();
        assert!((db - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_min_max_average() {
        assert_eq!(apply_pointwise(UnaryOp::Min, &[3.0, -1.0, 2.0]), Some(-1.0));
        assert_eq!(apply_pointwise(UnaryOp::Max, &[3.0, -1.0, 2.0]), Some(3.0));
        assert_eq!(apply_pointwise(UnaryOp::Average, &[1.0, 2.0, 6.0]), Some(3.0));
    }

    #[test]
    fn test_weighted_average() {
        assert_eq!(
            apply_pointwise(UnaryOp::WeightedAverage, &[10.0, 1.0, 20.0, 3.0]),
            Some(17.5)
        );
        assert_eq!(apply_pointwise(UnaryOp::WeightedAverage, &[10.0, 0.0]), None);
    }

    #[test]
    fn test_fuzzy_interpolates_and_clamps() {
        let points = [0.0, 0.0, 10.0, 1.0, 20.0, 0.5];
        assert_eq!(fuzzy(-5.0, &points), 0.0);
        assert_eq!(fuzzy(5.0, &points), 0.5);
        assert_eq!(fuzzy(15.0, &points), 0.75);
        assert_eq!(fuzzy(25.0, &points), 0.5);
    }

    #[test]
    fn test_trapezoid() {
        assert_eq!(trapezoid(0.0, 1.0, 2.0, 3.0, 4.0), 0.0);
        assert_eq!(trapezoid(1.5, 1.0, 2.0, 3.0, 4.0), 0.5);
        assert_eq!(trapezoid(2.5, 1.0, 2.0, 3.0, 4.0), 1.0);
        assert_eq!(trapezoid(3.75, 1.0, 2.0, 3.0, 4.0), 0.25);
        assert_eq!(trapezoid(4.0, 1.0, 2.0, 3.0, 4.0), 0.0);
    }

    #[test]
    fn test_s_remap() {
        assert_eq!(s_remap(0.0, 1.0, 3.0), 0.0);
        assert_eq!(s_remap(2.0, 1.0, 3.0), 0.5);
        assert_eq!(s_remap(3.0, 1.0, 3.0), 1.0);
        assert!(s_remap(1.5, 1.0, 3.0) < 0.5);
        assert!(s_remap(2.5, 1.0, 3.0) > 0.5);
    }

    #[test]
    fn test_mask_ranges() {
        assert_eq!(apply_pointwise(UnaryOp::Mask, &[5.0, 0.0, 10.0]), None);
        assert_eq!(apply_pointwise(UnaryOp::Mask, &[15.0, 0.0, 10.0, 20.0, 30.0]), Some(15.0));
        assert_eq!(apply_pointwise(UnaryOp::Mask, &[25.0, 0.0, 10.0, 20.0, 30.0]), None);
    }

    #[test]
    fn test_window_statistics() {
        assert_eq!(window_statistic(UnaryOp::Smooth, &mut vec![1.0, 2.0, 6.0]), Some(3.0));
        assert_eq!(window_statistic(UnaryOp::Median, &mut vec![9.0, 1.0, 5.0]), Some(5.0));
        assert_eq!(window_statistic(UnaryOp::Median, &mut vec![4.0, 1.0]), Some(2.5));
        assert_eq!(window_statistic(UnaryOp::StdDev, &mut vec![2.0, 4.0]), Some(1.0));
        assert_eq!(window_statistic(UnaryOp::StdDev, &mut vec![2.0]), None);
        assert_eq!(window_statistic(UnaryOp::Smooth, &mut vec![]), None);
    }
}
