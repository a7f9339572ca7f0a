// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Spline evaluation
//!
//! Cox-de Boor basis functions for rational B-spline curves (126) and the
//! cubic segment tables of parametric splines (112).

use iges_model::entities::{ParametricSpline, RationalBSplineCurve};
use nalgebra::Point3;

/// Samples taken in each parametric spline segment
pub const SPLINE_SEGMENT_SAMPLES: usize = 9;

/// Knot span containing `u`
///
/// `n` is the index of the last control point; `u` at or past the end of
/// the domain maps to the last span.
pub fn find_span(n: usize, degree: usize, u: f64, knots: &[f64]) -> usize {
    if u >= knots[n + 1] {
        return n;
    }
    if u <= knots[degree] {
        return degree;
    }
    let mut low = degree;
    let mut high = n + 1;
    let mut mid = (low + high) / 2;
    while u < knots[mid] || u >= knots[mid + 1] {
        if u < knots[mid] {
            high = mid;
        } else {
            low = mid;
        }
        mid = (low + high) / 2;
    }
    mid
}

/// Non-zero basis functions `N[span-degree..=span]` at `u`
pub fn basis_functions(span: usize, u: f64, degree: usize, knots: &[f64]) -> Vec<f64> {
    let mut n = vec![0.0; degree + 1];
    let mut left = vec![0.0; degree + 1];
    let mut right = vec![0.0; degree + 1];
    n[0] = 1.0;
    for j in 1..=degree {
        left[j] = u - knots[span + 1 - j];
        right[j] = knots[span + j] - u;
        let mut saved = 0.0;
        for r in 0..j {
            let denom = right[r + 1] + left[j - r];
            let temp = if denom == 0.0 { 0.0 } else { n[r] / denom };
            n[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        n[j] = saved;
    }
    n
}

/// Point on a rational B-spline curve
///
/// Returns `None` when the weighted basis sums to zero.
pub fn evaluate_rational(curve: &RationalBSplineCurve, u: f64) -> Option<Point3<f64>> {
    let n = curve.k;
    let span = find_span(n, curve.degree, u, &curve.knots);
    let basis = basis_functions(span, u, curve.degree, &curve.knots);

    let mut sum = nalgebra::Vector3::zeros();
    let mut weight = 0.0;
    for (j, b) in basis.iter().enumerate() {
        let i = span - curve.degree + j;
        let w = b * curve.weights[i];
        sum += curve.control_points[i].coords * w;
        weight += w;
    }
    if weight == 0.0 {
        return None;
    }
    Some(Point3::from(sum / weight))
}

/// Sample a rational B-spline at `3 * (K + 1)` evenly spaced parameters over
/// `[V0, V1)`, followed by the last control point
pub fn sample_rational(curve: &RationalBSplineCurve) -> Vec<Point3<f64>> {
    let count = 3 * (curve.k + 1);
    let step = (curve.v1 - curve.v0) / count as f64;
    let mut points: Vec<Point3<f64>> = (0..count)
        .filter_map(|i| evaluate_rational(curve, curve.v0 + i as f64 * step))
        .collect();
    if let Some(last) = curve.control_points.last() {
        points.push(*last);
    }
    points
}

/// Sample each cubic segment at `s = k * delta / 9`, `k = 0..8`, then the
/// terminal point
pub fn sample_parametric(spline: &ParametricSpline) -> Vec<Point3<f64>> {
    let mut points = Vec::with_capacity(spline.segments.len() * SPLINE_SEGMENT_SAMPLES + 1);
    for (i, c) in spline.segments.iter().enumerate() {
        let delta = match (spline.breaks.get(i), spline.breaks.get(i + 1)) {
            (Some(t0), Some(t1)) => t1 - t0,
            _ => break,
        };
        let cubic = |a: f64, b: f64, cc: f64, d: f64, s: f64| a + s * (b + s * (cc + s * d));
        for k in 0..SPLINE_SEGMENT_SAMPLES {
            let s = k as f64 * delta / SPLINE_SEGMENT_SAMPLES as f64;
            points.push(Point3::new(
                cubic(c[0], c[1], c[2], c[3], s),
                cubic(c[4], c[5], c[6], c[7], s),
                cubic(c[8], c[9], c[10], c[11], s),
            ));
        }
    }
    points.push(spline.terminal);
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn quadratic_arc() -> RationalBSplineCurve {
        // quarter circle of radius 1 as a rational quadratic
        let w = std::f64::consts::FRAC_1_SQRT_2;
        RationalBSplineCurve {
            k: 2,
            degree: 2,
            planar: true,
            closed: false,
            polynomial: false,
            periodic: false,
            knots: vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0],
            weights: vec![1.0, w, 1.0],
            control_points: vec![
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            v0: 0.0,
            v1: 1.0,
        }
    }

    #[test]
    fn test_find_span() {
        let knots = [0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 3.0, 3.0];
        assert_eq!(find_span(4, 2, 0.0, &knots), 2);
        assert_eq!(find_span(4, 2, 1.5, &knots), 3);
        assert_eq!(find_span(4, 2, 3.0, &knots), 4);
    }

    #[test]
    fn test_basis_partition_of_unity() {
        let knots = [0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 3.0, 3.0];
        for u in [0.0, 0.5, 1.2, 2.9] {
            let span = find_span(4, 2, u, &knots);
            let sum: f64 = basis_functions(span, u, 2, &knots).iter().sum();
            assert_relative_eq!(sum, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_rational_arc_lies_on_circle() {
        let curve = quadratic_arc();
        let points = sample_rational(&curve);
        assert_eq!(points.len(), 3 * 3 + 1);
        assert_eq!(points[0], Point3::new(1.0, 0.0, 0.0));
        assert_eq!(*points.last().unwrap(), Point3::new(0.0, 1.0, 0.0));
        for p in &points {
            assert_relative_eq!(p.coords.norm(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_parametric_spline_samples() {
        // x = s, y = s^2 over one segment of length 1
        let spline = ParametricSpline {
            spline_type: 3,
            continuity: 2,
            dimension: 2,
            breaks: vec![0.0, 1.0],
            segments: vec![[0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0]],
            terminal: Point3::new(1.0, 1.0, 0.0),
        };
        let points = sample_parametric(&spline);
        assert_eq!(points.len(), SPLINE_SEGMENT_SAMPLES + 1);
        for p in &points {
            assert_relative_eq!(p.y, p.x * p.x, epsilon = 1e-12);
        }
        assert_eq!(points[9], Point3::new(1.0, 1.0, 0.0));
    }
}
