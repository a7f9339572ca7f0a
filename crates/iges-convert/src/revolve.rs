// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Solid of revolution (162)
//!
//! The generating curve is flattened into an `(h, r)` profile about the
//! axis. Every profile segment with axial extent sweeps a truncated cone;
//! segments running up the axis add material and segments running down
//! remove it. Partial revolutions are clipped by a wedge of sector prisms.

use crate::curve::get_curve;
use crate::solids::{positive, to_vec3, unit, vector_to_vec3, SolidConverter};
use crate::{ConversionContext, ConvertError, Result};
use iges_model::{
    BoolOp, Combination, DeNumber, Entity, EntityType, GeometryWriter, Member, Solid,
};
use log::debug;
use nalgebra::{Point3, Vector3};
use std::f64::consts::{FRAC_PI_2, PI};

/// Axial extents at or below this are treated as flat
const AXIAL_TOLERANCE: f64 = 1.0e-9;

/// Most sector prisms in a partial-revolution wedge
const MAX_SECTORS: usize = 4;

/// Profile point: height along the axis and distance from it
#[derive(Clone, Copy, Debug, PartialEq)]
struct ProfilePoint {
    h: f64,
    r: f64,
}

/// Converter for solids of revolution
pub struct RevolutionConverter;

impl RevolutionConverter {
    /// Create new converter
    pub fn new() -> Self {
        Self
    }
}

impl Default for RevolutionConverter {
    fn default() -> Self {
        Self::new()
    }
}

/// Signed area of a closed profile with `h` as abscissa
fn signed_area(profile: &[ProfilePoint]) -> f64 {
    profile
        .windows(2)
        .map(|w| w[0].h * w[1].r - w[1].h * w[0].r)
        .sum::<f64>()
        / 2.0
}

/// Flatten curve points into a closed, clockwise `(h, r)` profile
fn build_profile(
    points: &[Point3<f64>],
    origin: &Point3<f64>,
    axis: &Vector3<f64>,
    close_to_axis: bool,
) -> Vec<ProfilePoint> {
    let mut profile: Vec<ProfilePoint> = points
        .iter()
        .map(|p| {
            let v = p - origin;
            let h = v.dot(axis);
            ProfilePoint {
                h,
                r: (v - axis * h).norm(),
            }
        })
        .collect();

    if close_to_axis {
        if let (Some(first), Some(last)) = (profile.first().copied(), profile.last().copied()) {
            profile.insert(0, ProfilePoint { h: first.h, r: 0.0 });
            profile.push(ProfilePoint { h: last.h, r: 0.0 });
        }
    }
    if let (Some(first), Some(last)) = (profile.first().copied(), profile.last().copied()) {
        if first != last {
            profile.push(first);
        }
    }
    if signed_area(&profile) > 0.0 {
        profile.reverse();
    }
    profile
}

/// Truncated cone swept by one profile segment
struct Frustum {
    solid: Solid,
    op: BoolOp,
}

fn sweep_segment(
    a: ProfilePoint,
    b: ProfilePoint,
    origin: &Point3<f64>,
    axis: &Vector3<f64>,
) -> Option<Frustum> {
    let dh = b.h - a.h;
    if dh.abs() <= AXIAL_TOLERANCE || (a.r <= AXIAL_TOLERANCE && b.r <= AXIAL_TOLERANCE) {
        return None;
    }
    let (low, high) = if dh > 0.0 { (a, b) } else { (b, a) };
    Some(Frustum {
        solid: Solid::Trc {
            base: to_vec3(&(origin + axis * low.h)),
            height: vector_to_vec3(&(axis * dh.abs())),
            r_base: low.r,
            r_top: high.r,
        },
        op: if dh > 0.0 {
            BoolOp::Union
        } else {
            BoolOp::Subtract
        },
    })
}

/// Sector prisms covering `fraction` of a turn about `axis`
///
/// The sweep starts at `start`, the radial direction of the profile plane,
/// and turns right-handed about the axis.
fn wedge_sectors(
    fraction: f64,
    origin: &Point3<f64>,
    axis: &Vector3<f64>,
    start: &Vector3<f64>,
    profile: &[ProfilePoint],
) -> Vec<[iges_model::Vec3; 8]> {
    let total = 2.0 * PI * fraction;
    let count = ((total / FRAC_PI_2).ceil() as usize).clamp(1, MAX_SECTORS);
    let delta = total / count as f64;

    let r_max = profile.iter().map(|p| p.r).fold(0.0, f64::max);
    let h_min = profile.iter().map(|p| p.h).fold(f64::INFINITY, f64::min);
    let h_max = profile.iter().map(|p| p.h).fold(f64::NEG_INFINITY, f64::max);
    let margin = 0.1 * (h_max - h_min).max(r_max);
    let reach = 1.1 * r_max / (delta / 2.0).cos();

    let side = axis.cross(start);
    let radial = |theta: f64| (start * theta.cos() + side * theta.sin()) * reach;
    let bottom = origin + axis * (h_min - margin);
    let lift = axis * (h_max - h_min + 2.0 * margin);

    (0..count)
        .map(|j| {
            let t0 = j as f64 * delta;
            let base = [
                bottom,
                bottom + radial(t0),
                bottom + radial(t0 + delta / 2.0),
                bottom + radial(t0 + delta),
            ];
            let mut points = [[0.0; 3]; 8];
            for (k, p) in base.iter().enumerate() {
                points[k] = to_vec3(p);
                points[k + 4] = to_vec3(&(p + lift));
            }
            points
        })
        .collect()
}

impl SolidConverter for RevolutionConverter {
    fn convert(
        &self,
        ctx: &mut ConversionContext,
        index: usize,
        db: &mut dyn GeometryWriter,
    ) -> Result<()> {
        let de = DeNumber::from_index(index);
        let k = ctx.unit_factor();
        let form = ctx.entry(index)?.form;
        let rev = match ctx.decode(index)?.entity {
            Entity::SolidOfRevolution(rev) => rev,
            _ => return Err(ConvertError::invalid(de, "not a solid of revolution")),
        };
        let fraction = positive(de, "revolution fraction", rev.fraction)?;
        if fraction > 1.0 {
            return Err(ConvertError::invalid(
                de,
                format!("revolution fraction {} exceeds one turn", fraction),
            ));
        }
        let axis = unit(de, "axis direction", &rev.axis_direction)?;
        let origin = rev.axis_point * k;

        let curve_index = ctx.lookup(rev.curve)?;
        let points = get_curve(ctx, curve_index)?;
        if points.len() < 2 {
            return Err(ConvertError::curve(rev.curve, "fewer than two points"));
        }
        let profile = build_profile(&points, &origin, &axis, form == 1);

        let name = ctx.name(index);
        let frustums: Vec<Frustum> = profile
            .windows(2)
            .filter_map(|w| sweep_segment(w[0], w[1], &origin, &axis))
            .collect();
        if !frustums.iter().any(|f| f.op == BoolOp::Union) {
            return Err(ConvertError::geometry(format!(
                "{}: profile sweeps no volume",
                de
            )));
        }

        let mut unions = Vec::new();
        let mut subtracts = Vec::new();
        for (i, frustum) in frustums.into_iter().enumerate() {
            let solid_name = format!("{}.{}", name, i + 1);
            db.write_solid(&solid_name, frustum.solid)?;
            match frustum.op {
                BoolOp::Union => unions.push(Member::new(solid_name, BoolOp::Union)),
                _ => subtracts.push(Member::new(solid_name, BoolOp::Subtract)),
            }
        }
        debug!(
            "{}: {} frustums added, {} removed",
            de,
            unions.len(),
            subtracts.len()
        );
        unions.extend(subtracts);

        if fraction >= 1.0 {
            db.write_combination(&name, Combination::group(unions))?;
            return Ok(());
        }

        // Radial direction of the profile plane
        let start = points
            .iter()
            .map(|p| {
                let v = p - origin;
                v - axis * v.dot(&axis)
            })
            .find(|v| v.norm() > AXIAL_TOLERANCE)
            .map(|v| v.normalize())
            .ok_or_else(|| ConvertError::curve(rev.curve, "curve lies on the axis"))?;

        let body = format!("{}.body", name);
        db.write_combination(&body, Combination::group(unions))?;

        let mut sectors = Vec::new();
        for (j, points) in wedge_sectors(fraction, &origin, &axis, &start, &profile)
            .into_iter()
            .enumerate()
        {
            let sector = format!("{}.w{}", name, j + 1);
            db.write_solid(&sector, Solid::Arb8 { points })?;
            sectors.push(Member::new(sector, BoolOp::Union));
        }
        let wedge = format!("{}.wedge", name);
        db.write_combination(&wedge, Combination::group(sectors))?;

        db.write_combination(
            &name,
            Combination::group(vec![
                Member::new(body, BoolOp::Union),
                Member::new(wedge, BoolOp::Intersect),
            ]),
        )?;
        Ok(())
    }

    fn supported_types(&self) -> Vec<EntityType> {
        vec![EntityType::SolidOfRevolution]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::context;
    use crate::{MemoryDatabase, SolidRouter};
    use iges_parser::IgesBuilder;

    fn revolve(
        curve_form: i32,
        curve: &str,
        form: i32,
        params: &str,
    ) -> (Result<()>, MemoryDatabase, String) {
        let mut builder = IgesBuilder::new();
        let curve = builder.entity(106, curve_form, curve);
        let rev = builder.entity(162, form, &format!("{},{}", curve.0, params));
        let mut ctx = context(&builder);
        let index = ctx.lookup(rev).unwrap();
        let mut db = MemoryDatabase::new();
        let result = SolidRouter::with_default_converters().convert(&mut ctx, index, &mut db);
        (result, db, ctx.name(index))
    }

    // Rectangle in the xz plane: r from 1 to 2, h from 0 to 1
    const TUBE: &str = "1,5,1.,0.,0.,2.,0.,0.,2.,0.,1.,1.,0.,1.,1.,0.,0.";

    #[test]
    fn test_tube_profile() {
        let (result, db, name) = revolve(2, TUBE, 0, "1.,0.,0.,0.,0.,0.,1.");
        result.unwrap();
        let comb = db.combination(&name).unwrap();
        assert_eq!(comb.members.len(), 2);
        assert_eq!(comb.members[0].op, BoolOp::Union);
        assert_eq!(comb.members[1].op, BoolOp::Subtract);
        match db.solid(&comb.members[0].name) {
            Some(Solid::Trc { r_base, r_top, height, .. }) => {
                assert_eq!((*r_base, *r_top), (2.0, 2.0));
                assert_eq!(*height, [0.0, 0.0, 1.0]);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            db.solid(&comb.members[1].name),
            Some(Solid::Trc { r_base, .. }) if *r_base == 1.0
        ));
    }

    #[test]
    fn test_orientation_independent() {
        // same rectangle traversed the other way
        let reversed = "1,5,1.,0.,0.,1.,0.,1.,2.,0.,1.,2.,0.,0.,1.,0.,0.";
        let (result, db, name) = revolve(2, reversed, 0, "1.,0.,0.,0.,0.,0.,1.");
        result.unwrap();
        let comb = db.combination(&name).unwrap();
        assert_eq!(comb.members[0].op, BoolOp::Union);
        assert!(matches!(
            db.solid(&comb.members[0].name),
            Some(Solid::Trc { r_base, .. }) if *r_base == 2.0
        ));
    }

    #[test]
    fn test_close_to_axis() {
        let (result, db, name) = revolve(2, "1,2,1.,0.,0.,1.,0.,2.", 1, "1.,0.,0.,0.,0.,0.,1.");
        result.unwrap();
        let comb = db.combination(&name).unwrap();
        assert_eq!(comb.members.len(), 1);
        assert!(matches!(
            db.solid(&comb.members[0].name),
            Some(Solid::Trc { height, r_base, r_top, .. })
                if *height == [0.0, 0.0, 2.0] && *r_base == 1.0 && *r_top == 1.0
        ));
    }

    #[test]
    fn test_partial_revolution_wedge() {
        let (result, db, name) = revolve(2, TUBE, 0, "0.25,0.,0.,0.,0.,0.,1.");
        result.unwrap();
        let top = db.combination(&name).unwrap();
        assert_eq!(top.members[1].op, BoolOp::Intersect);
        let wedge = db.combination(&format!("{}.wedge", name)).unwrap();
        assert_eq!(wedge.members.len(), 1);

        let half = revolve(2, TUBE, 0, "0.6,0.,0.,0.,0.,0.,1.");
        half.0.unwrap();
        let wedge = half.1.combination(&format!("{}.wedge", half.2)).unwrap();
        assert_eq!(wedge.members.len(), 3);
    }

    #[test]
    fn test_invalid_fraction() {
        let (result, db, _) = revolve(2, TUBE, 0, "1.5");
        assert!(matches!(result, Err(ConvertError::InvalidParameters { .. })));
        assert!(db.is_empty());
        let (result, _, _) = revolve(2, TUBE, 0, "0.");
        assert!(result.is_err());
    }

    #[test]
    fn test_flat_profile() {
        // every segment perpendicular to the axis
        let (result, _, _) = revolve(2, "1,2,1.,0.,0.,2.,0.,0.", 0, "1.");
        assert!(matches!(result, Err(ConvertError::Geometry(_))));
    }
}
