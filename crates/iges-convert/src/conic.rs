// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Conic arc classification and sampling
//!
//! A conic arc (104) is `A x² + B xy + C y² + D x + E y + F = 0` between a
//! start and an end point. The conic is classified from its coefficients,
//! rotated so the cross term vanishes, translated to its centre (ellipse and
//! hyperbola) and sampled in that canonical frame.

use crate::curve::ARCSEGS;
use iges_model::entities::ConicArc;
use log::warn;
use nalgebra::Point2;
use std::fmt;

/// Coefficients smaller than this fraction of the largest are zero
const SNAP_TOLERANCE: f64 = 1.0e-10;

/// Conic class
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConicClass {
    Ellipse,
    Hyperbola,
    Parabola,
}

impl ConicClass {
    /// Class named by a 104 form number
    pub fn from_form(form: i32) -> Option<Self> {
        match form {
            1 => Some(ConicClass::Ellipse),
            2 => Some(ConicClass::Hyperbola),
            3 => Some(ConicClass::Parabola),
            _ => None,
        }
    }
}

impl fmt::Display for ConicClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConicClass::Ellipse => "ellipse",
            ConicClass::Hyperbola => "hyperbola",
            ConicClass::Parabola => "parabola",
        };
        f.write_str(name)
    }
}

/// Coefficients with values negligible against the largest set to zero
pub fn snap_coefficients(coefficients: &[f64; 6]) -> [f64; 6] {
    let scale = coefficients.iter().fold(0.0f64, |m, c| m.max(c.abs()));
    let mut out = *coefficients;
    for c in out.iter_mut() {
        if c.abs() <= SNAP_TOLERANCE * scale {
            *c = 0.0;
        }
    }
    out
}

/// Classify snapped coefficients
///
/// Fails for degenerate conics (zero determinant) and for ellipses with no
/// real points.
pub fn classify(coefficients: &[f64; 6]) -> Result<ConicClass, String> {
    let [a, b, c, d, e, f] = *coefficients;
    let scale = coefficients.iter().fold(0.0f64, |m, v| m.max(v.abs()));
    if scale == 0.0 {
        return Err("all coefficients are zero".into());
    }

    // 3x3 determinant of the conic matrix
    let det = a * (c * f - e * e / 4.0) - b / 2.0 * (b / 2.0 * f - e * d / 4.0)
        + d / 2.0 * (b * e / 4.0 - c * d / 2.0);
    if det.abs() <= SNAP_TOLERANCE * scale.powi(3) {
        return Err("degenerate conic (zero determinant)".into());
    }

    let quadratic = a * c - b * b / 4.0;
    if quadratic.abs() <= SNAP_TOLERANCE * scale * scale {
        Ok(ConicClass::Parabola)
    } else if quadratic > 0.0 {
        if (a + c) * det >= 0.0 {
            return Err("imaginary ellipse".into());
        }
        Ok(ConicClass::Ellipse)
    } else {
        Ok(ConicClass::Hyperbola)
    }
}

/// Rotation that removes the cross term, as `(cos θ, sin θ)`
fn rotation(a: f64, b: f64, c: f64) -> (f64, f64) {
    if b == 0.0 {
        return (1.0, 0.0);
    }
    let theta = 0.5 * b.atan2(a - c);
    (theta.cos(), theta.sin())
}

/// Coefficients `[A', C', D', E', F]` after rotating by θ
fn rotate_coefficients(k: &[f64; 6], cos: f64, sin: f64) -> [f64; 5] {
    let [a, b, c, d, e, f] = *k;
    [
        a * cos * cos + b * cos * sin + c * sin * sin,
        a * sin * sin - b * cos * sin + c * cos * cos,
        d * cos + e * sin,
        -d * sin + e * cos,
        f,
    ]
}

fn to_rotated(p: Point2<f64>, cos: f64, sin: f64) -> Point2<f64> {
    Point2::new(p.x * cos + p.y * sin, -p.x * sin + p.y * cos)
}

fn from_rotated(p: Point2<f64>, cos: f64, sin: f64) -> Point2<f64> {
    Point2::new(p.x * cos - p.y * sin, p.x * sin + p.y * cos)
}

/// Evenly spaced values from `t0` to `t1`, both included
fn parameters(t0: f64, t1: f64, count: usize) -> impl Iterator<Item = f64> {
    let step = (t1 - t0) / (count - 1) as f64;
    (0..count).map(move |i| t0 + i as f64 * step)
}

/// Sample a conic arc in its own plane
///
/// `form` is the 104 form number; a class that disagrees with the computed
/// one is reported and the computed class is used. The first and last
/// points are exactly the arc's start and end points.
pub fn sample_conic(arc: &ConicArc, form: i32) -> Result<(ConicClass, Vec<Point2<f64>>), String> {
    let k = snap_coefficients(&arc.coefficients);
    let class = classify(&k)?;
    if let Some(declared) = ConicClass::from_form(form) {
        if declared != class {
            warn!(
                "Conic arc declared as {} (form {}) but its coefficients describe a {}",
                declared, form, class
            );
        }
    }

    let (cos, sin) = rotation(k[0], k[1], k[2]);
    let [a, c, d, e, f] = rotate_coefficients(&k, cos, sin);
    let start = to_rotated(arc.start, cos, sin);
    let end = to_rotated(arc.end, cos, sin);
    let count = ARCSEGS;

    let canonical: Vec<Point2<f64>> = match class {
        ConicClass::Ellipse | ConicClass::Hyperbola => {
            if a == 0.0 || c == 0.0 {
                return Err(format!("{} without both squared terms", class));
            }
            // translate to the centre
            let center = Point2::new(-d / (2.0 * a), -e / (2.0 * c));
            let g = f - d * d / (4.0 * a) - e * e / (4.0 * c);
            let p2 = -g / a;
            let q2 = -g / c;
            let s = start - center.coords;
            let t = end - center.coords;

            match class {
                ConicClass::Ellipse => {
                    if p2 <= 0.0 || q2 <= 0.0 {
                        return Err("imaginary ellipse".into());
                    }
                    let (p, q) = (p2.sqrt(), q2.sqrt());
                    let t0 = (s.y / q).atan2(s.x / p);
                    let mut t1 = (t.y / q).atan2(t.x / p);
                    if t1 <= t0 {
                        t1 += 2.0 * std::f64::consts::PI;
                    }
                    parameters(t0, t1, count)
                        .map(|u| Point2::new(center.x + p * u.cos(), center.y + q * u.sin()))
                        .collect()
                }
                _ if p2 > 0.0 => {
                    // x²/p² - y²/q² = 1, branch chosen by the start point
                    let (p, q) = (p2.sqrt(), (-q2).sqrt());
                    let branch = if s.x < 0.0 { -1.0 } else { 1.0 };
                    let t0 = (s.y / q).asinh();
                    let t1 = (t.y / q).asinh();
                    parameters(t0, t1, count)
                        .map(|u| {
                            Point2::new(center.x + branch * p * u.cosh(), center.y + q * u.sinh())
                        })
                        .collect()
                }
                _ => {
                    // y²/q² - x²/p² = 1
                    let (p, q) = ((-p2).sqrt(), q2.sqrt());
                    let branch = if s.y < 0.0 { -1.0 } else { 1.0 };
                    let t0 = (s.x / p).asinh();
                    let t1 = (t.x / p).asinh();
                    parameters(t0, t1, count)
                        .map(|u| {
                            Point2::new(center.x + p * u.sinh(), center.y + branch * q * u.cosh())
                        })
                        .collect()
                }
            }
        }
        ConicClass::Parabola => {
            if a.abs() <= c.abs() {
                // C' y² + D' x + E' y + F = 0, free coordinate y
                if d == 0.0 {
                    return Err("parabola without a linear term".into());
                }
                parameters(start.y, end.y, count)
                    .map(|y| Point2::new(-(c * y * y + e * y + f) / d, y))
                    .collect()
            } else {
                // A' x² + D' x + E' y + F = 0, free coordinate x
                if e == 0.0 {
                    return Err("parabola without a linear term".into());
                }
                parameters(start.x, end.x, count)
                    .map(|x| Point2::new(x, -(a * x * x + d * x + f) / e))
                    .collect()
            }
        }
    };

    let mut points: Vec<Point2<f64>> = canonical
        .into_iter()
        .map(|p| from_rotated(p, cos, sin))
        .collect();
    if let Some(first) = points.first_mut() {
        *first = arc.start;
    }
    if let Some(last) = points.last_mut() {
        *last = arc.end;
    }
    Ok((class, points))
}
