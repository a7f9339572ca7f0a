// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Curve extraction
//!
//! Turns any supported curve entity into a point list in millimetres,
//! transformed by the entity's placement.

use crate::conic::sample_conic;
use crate::spline::{sample_parametric, sample_rational};
use crate::{ConversionContext, ConvertError, Result};
use iges_model::entities::CircularArc;
use iges_model::{DeNumber, Entity, Transform};
use log::debug;
use nalgebra::Point3;

/// Segments in a full circle
pub const ARCSEGS: usize = 25;

/// Deepest nesting of composite curves followed
pub const MAX_CURVE_DEPTH: usize = 32;

/// Points along a circular arc, in the arc's local frame
///
/// Intermediate points come from rotating the start vector by a fixed
/// increment; the ends are the arc's own start and end points.
pub fn arc_points(arc: &CircularArc, scale: f64) -> Vec<Point3<f64>> {
    let z = arc.z * scale;
    let (cx, cy) = (arc.center.x * scale, arc.center.y * scale);
    let (sx, sy) = (arc.start.x * scale, arc.start.y * scale);
    let (ex, ey) = (arc.end.x * scale, arc.end.y * scale);

    let two_pi = 2.0 * std::f64::consts::PI;
    let start_angle = (sy - cy).atan2(sx - cx);
    let mut end_angle = (ey - cy).atan2(ex - cx);
    if end_angle <= start_angle {
        end_angle += two_pi;
    }
    let span = end_angle - start_angle;
    let n = ((ARCSEGS as f64 * span / two_pi).ceil() as usize + 1).max(3);
    let delta = span / (n - 1) as f64;
    let (sindel, cosdel) = delta.sin_cos();

    let mut points = Vec::with_capacity(n);
    points.push(Point3::new(sx, sy, z));
    let (mut x, mut y) = (sx - cx, sy - cy);
    for _ in 1..n - 1 {
        let xn = x * cosdel - y * sindel;
        y = x * sindel + y * cosdel;
        x = xn;
        points.push(Point3::new(cx + x, cy + y, z));
    }
    points.push(Point3::new(ex, ey, z));
    points
}

fn transformed(points: Vec<Point3<f64>>, rot: &Transform) -> Vec<Point3<f64>> {
    if rot.is_identity() {
        return points;
    }
    points.iter().map(|p| rot.apply_point(p)).collect()
}

fn scaled(points: impl IntoIterator<Item = Point3<f64>>, scale: f64) -> Vec<Point3<f64>> {
    points.into_iter().map(|p| p * scale).collect()
}

/// Append `next` to `acc`, dropping an exactly repeated junction point
pub fn append_coalesced(acc: &mut Vec<Point3<f64>>, next: Vec<Point3<f64>>) {
    let mut iter = next.into_iter().peekable();
    if let (Some(last), Some(first)) = (acc.last(), iter.peek()) {
        if last == first {
            iter.next();
        }
    }
    acc.extend(iter);
}

/// Evaluate the curve entity at `index`
///
/// Returns points in millimetres in the coordinate system of the entity's
/// parent.
pub fn get_curve(ctx: &ConversionContext, index: usize) -> Result<Vec<Point3<f64>>> {
    let mut visiting = Vec::new();
    curve_points(ctx, index, &mut visiting)
}

fn curve_points(
    ctx: &ConversionContext,
    index: usize,
    visiting: &mut Vec<usize>,
) -> Result<Vec<Point3<f64>>> {
    let de = DeNumber::from_index(index);
    let entry = ctx.entry(index)?;
    if !entry.entity_type.is_curve() {
        return Err(ConvertError::NotACurve {
            de,
            entity_type: entry.entity_type,
        });
    }
    let form = entry.form;
    let scale = ctx.unit_factor();
    let decoded = ctx.decode(index)?;

    let points = match decoded.entity {
        Entity::Line(line) => scaled([line.start, line.end], scale),
        Entity::CircularArc(arc) => arc_points(&arc, scale),
        Entity::CopiousData(data) => scaled(data.points, scale),
        Entity::ParametricSpline(spline) => scaled(sample_parametric(&spline), scale),
        Entity::RationalBSplineCurve(curve) => scaled(sample_rational(&curve), scale),
        Entity::ConicArc(arc) => {
            let (class, points) =
                sample_conic(&arc, form).map_err(|msg| ConvertError::curve(de, msg))?;
            debug!("{} sampled as {} with {} points", de, class, points.len());
            points
                .into_iter()
                .map(|p| Point3::new(p.x * scale, p.y * scale, arc.z * scale))
                .collect()
        }
        Entity::CompositeCurve(composite) => {
            if visiting.contains(&index) || visiting.len() >= MAX_CURVE_DEPTH {
                return Err(ConvertError::curve(
                    de,
                    "composite curve nesting is cyclic or too deep",
                ));
            }
            visiting.push(index);
            let mut points = Vec::new();
            for member in &composite.members {
                let member_index = ctx.lookup(*member)?;
                let member_points = curve_points(ctx, member_index, visiting)?;
                append_coalesced(&mut points, member_points);
            }
            visiting.pop();
            points
        }
        _ => {
            return Err(ConvertError::NotACurve {
                de,
                entity_type: entry.entity_type,
            })
        }
    };

    if points.is_empty() {
        return Err(ConvertError::curve(de, "no points"));
    }
    Ok(transformed(points, &entry.rot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::context;
    use approx::assert_relative_eq;
    use iges_parser::{EntitySpec, IgesBuilder};

    #[test]
    fn test_quarter_arc_end_to_end() {
        let mut builder = IgesBuilder::new();
        let arc = builder.entity(100, 0, "0.,0.,0.,1.,0.,0.,1.");
        let ctx = context(&builder);
        let points = get_curve(&ctx, ctx.lookup(arc).unwrap()).unwrap();

        // span pi/2: ceil(25 / 4) + 1 points
        assert_eq!(points.len(), 8);
        assert_eq!(points[0], Point3::new(1.0, 0.0, 0.0));
        assert_eq!(points[7], Point3::new(0.0, 1.0, 0.0));
        for p in &points {
            assert_relative_eq!(p.coords.norm(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_full_circle_and_minimum_points() {
        let arc = CircularArc {
            z: 2.0,
            center: nalgebra::Point2::new(0.0, 0.0),
            start: nalgebra::Point2::new(1.0, 0.0),
            end: nalgebra::Point2::new(1.0, 0.0),
        };
        let points = arc_points(&arc, 1.0);
        assert_eq!(points.len(), ARCSEGS + 1);
        assert_eq!(points[0], points[ARCSEGS]);
        assert!(points.iter().all(|p| p.z == 2.0));

        let tiny = CircularArc {
            end: nalgebra::Point2::new(0.9999, 0.01414),
            ..arc
        };
        assert!(arc_points(&tiny, 1.0).len() >= 3);
    }

    #[test]
    fn test_arc_endpoints_exact_after_transform() {
        let mut builder = IgesBuilder::new();
        let m = builder.entity(124, 0, "0.,-1.,0.,5.,1.,0.,0.,0.,0.,0.,1.,0.");
        let arc = builder.add(EntitySpec::new(100, 0, "0.,0.,0.,1.,0.,0.,1.").with_trans(m));
        let ctx = context(&builder);
        let index = ctx.lookup(arc).unwrap();
        let rot = ctx.rot(index);
        let points = get_curve(&ctx, index).unwrap();
        assert_eq!(points[0], rot.apply_point(&Point3::new(1.0, 0.0, 0.0)));
        assert_eq!(
            *points.last().unwrap(),
            rot.apply_point(&Point3::new(0.0, 1.0, 0.0))
        );
        assert_relative_eq!(points[0].x, 5.0, epsilon = 1e-12);
        assert_relative_eq!(points[0].y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_line_and_units() {
        let mut builder = IgesBuilder::new().with_units(1, "IN");
        let line = builder.entity(110, 0, "0.,0.,0.,1.,2.,3.");
        let ctx = context(&builder);
        let points = get_curve(&ctx, ctx.lookup(line).unwrap()).unwrap();
        assert_eq!(points.len(), 2);
        assert_relative_eq!(points[1].z, 76.2, epsilon = 1e-9);
    }

    #[test]
    fn test_copious_data_forms() {
        let mut builder = IgesBuilder::new();
        let pairs = builder.entity(106, 1, "1,3,5.,0.,0.,1.,0.,1.,1.");
        let triples = builder.entity(106, 2, "1,2,0.,0.,0.,1.,1.,1.");
        let bad = builder.entity(106, 40, "1,2,0.,0.,0.,1.,1.,1.");
        let ctx = context(&builder);

        let points = get_curve(&ctx, ctx.lookup(pairs).unwrap()).unwrap();
        assert_eq!(points.len(), 3);
        assert!(points.iter().all(|p| p.z == 5.0));
        assert_eq!(get_curve(&ctx, ctx.lookup(triples).unwrap()).unwrap().len(), 2);
        assert!(get_curve(&ctx, ctx.lookup(bad).unwrap()).is_err());
    }

    #[test]
    fn test_composite_coalesces_junctions() {
        let mut builder = IgesBuilder::new();
        let a = builder.entity(110, 0, "0.,0.,0.,1.,0.,0.");
        let b = builder.entity(106, 2, "1,3,1.,0.,0.,1.,1.,0.,0.,1.,0.");
        let c = builder.entity(110, 0, "5.,5.,0.,6.,6.,0.");
        let joined = builder.entity(102, 0, &format!("2,{},{}", a.0, b.0));
        let gap = builder.entity(102, 0, &format!("2,{},{}", a.0, c.0));
        let ctx = context(&builder);

        // 2 + 3 - 1 shared junction
        assert_eq!(get_curve(&ctx, ctx.lookup(joined).unwrap()).unwrap().len(), 4);
        assert_eq!(get_curve(&ctx, ctx.lookup(gap).unwrap()).unwrap().len(), 4);
    }

    #[test]
    fn test_composite_cycle_is_an_error() {
        let mut builder = IgesBuilder::new();
        let first = builder.next_de();
        builder.entity(102, 0, &format!("1,{}", first.0));
        let ctx = context(&builder);
        assert!(matches!(
            get_curve(&ctx, 0),
            Err(ConvertError::Curve { .. })
        ));
    }

    #[test]
    fn test_not_a_curve() {
        let mut builder = IgesBuilder::new();
        let sph = builder.entity(158, 0, "1.");
        let ctx = context(&builder);
        assert!(matches!(
            get_curve(&ctx, ctx.lookup(sph).unwrap()),
            Err(ConvertError::NotACurve { .. })
        ));
    }

    #[test]
    fn test_append_coalesced() {
        let mut acc = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)];
        append_coalesced(
            &mut acc,
            vec![Point3::new(1.0, 0.0, 0.0), Point3::new(1.0, 1.0, 0.0)],
        );
        assert_eq!(acc.len(), 3);
        append_coalesced(
            &mut acc,
            vec![Point3::new(1.0, 1.0 + 1e-12, 0.0), Point3::new(2.0, 2.0, 0.0)],
        );
        assert_eq!(acc.len(), 5);
    }
}
