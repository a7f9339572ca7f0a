// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rational B-spline surfaces (128)
//!
//! Surfaces are converted one at a time and written together as a single
//! NURBS object.

use crate::{ConversionContext, ConvertError, Result};
use iges_model::{DeNumber, Entity, GeometryWriter, NurbsSurface, Solid};
use log::{debug, info};
use nalgebra::Point3;

/// Largest distance of a control point from the fitted plane, in mm
pub const PLANAR_TOLERANCE: f64 = 0.005;

/// Check if all points lie within [`PLANAR_TOLERANCE`] of one plane
///
/// The plane runs through three well-separated points: the first, the one
/// farthest from it, and the one farthest from the line through both.
/// Collinear or coincident point sets count as planar.
pub fn is_planar(points: &[Point3<f64>]) -> bool {
    let Some(p0) = points.first() else {
        return true;
    };
    let far = |f: &dyn Fn(&Point3<f64>) -> f64| {
        points
            .iter()
            .map(|p| (f(p), p))
            .fold((0.0, p0), |best, cur| if cur.0 > best.0 { cur } else { best })
            .1
    };
    let p1 = far(&|p: &Point3<f64>| (p - p0).norm());
    let u = p1 - p0;
    let p2 = far(&|p: &Point3<f64>| u.cross(&(p - p0)).norm());
    let normal = u.cross(&(p2 - p0));
    let norm = normal.norm();
    if norm <= f64::EPSILON * u.norm_squared().max(1.0) {
        return true;
    }
    let normal = normal / norm;
    points
        .iter()
        .all(|p| normal.dot(&(p - p0)).abs() <= PLANAR_TOLERANCE)
}

/// Convert the surface at `index` to a NURBS surface in millimetres
///
/// Control points are placed by the entity transform and stored
/// homogeneously.
pub fn convert_surface(ctx: &ConversionContext, index: usize) -> Result<NurbsSurface> {
    let de = DeNumber::from_index(index);
    let k = ctx.unit_factor();
    let rot = ctx.rot(index);
    let surface = match ctx.decode(index)?.entity {
        Entity::RationalBSplineSurface(s) => s,
        _ => return Err(ConvertError::invalid(de, "not a rational B-spline surface")),
    };
    if let Some(w) = surface.weights.iter().find(|w| **w <= 0.0) {
        return Err(ConvertError::invalid(de, format!("non-positive weight {}", w)));
    }
    let increasing = |knots: &[f64]| knots.windows(2).all(|w| w[0] <= w[1]);
    if !increasing(&surface.u_knots) || !increasing(&surface.v_knots) {
        return Err(ConvertError::invalid(de, "knot sequence decreases"));
    }

    let placed: Vec<Point3<f64>> = surface
        .control_points
        .iter()
        .map(|p| rot.apply_point(&(p * k)))
        .collect();
    let planar = is_planar(&placed);
    let control_points = placed
        .iter()
        .zip(&surface.weights)
        .map(|(p, w)| [p.x * w, p.y * w, p.z * w, *w])
        .collect();

    debug!(
        "{}: {}x{} surface of degree ({}, {}){}",
        de,
        surface.k1 + 1,
        surface.k2 + 1,
        surface.degree_u,
        surface.degree_v,
        if planar { ", planar" } else { "" }
    );
    Ok(NurbsSurface {
        order: [surface.degree_u + 1, surface.degree_v + 1],
        u_knots: surface.u_knots,
        v_knots: surface.v_knots,
        size: [surface.k1 + 1, surface.k2 + 1],
        control_points,
        planar,
    })
}

/// Check whether the surface at `index` is planar
///
/// Planes (108) and plane surfaces (190) always are.
pub fn surface_is_planar(ctx: &ConversionContext, index: usize) -> Result<bool> {
    use iges_model::EntityType;
    match ctx.entry(index)?.entity_type {
        EntityType::Plane | EntityType::PlaneSurface => Ok(true),
        EntityType::RationalBSplineSurface => Ok(convert_surface(ctx, index)?.planar),
        other => Err(ConvertError::Unsupported {
            de: DeNumber::from_index(index),
            entity_type: other,
        }),
    }
}

/// Write converted surfaces as one NURBS object named by the options
///
/// Writes nothing when `surfaces` is empty.
pub fn write_surfaces(
    ctx: &mut ConversionContext,
    db: &mut dyn GeometryWriter,
    surfaces: Vec<NurbsSurface>,
) -> Result<()> {
    if surfaces.is_empty() {
        return Ok(());
    }
    let name = ctx.options().nurbs_name.clone();
    info!("Writing {} surfaces as {}", surfaces.len(), name);
    db.write_solid(&name, Solid::Nurbs(surfaces))?;
    ctx.set_nurbs_object(name);
    Ok(())
}
