// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Solid of linear extrusion (164)
//!
//! A closed planar curve swept along a direction becomes a polyhedron with
//! a base face, a top face and one quad per curve segment.

use crate::curve::get_curve;
use crate::solids::{positive, to_vec3, unit, SolidConverter};
use crate::{ConversionContext, ConvertError, Result};
use iges_model::{
    DeNumber, Entity, EntityType, GeometryWriter, PolyFace, PolyShell, PolyShellSet, Solid,
};
use nalgebra::{Point3, Vector3};

/// Relative gap between curve ends still treated as closed
const CLOSURE_TOLERANCE: f64 = 1.0e-6;

/// Newell normal of a polygon (not normalized)
pub(crate) fn newell_normal(points: &[Point3<f64>]) -> Vector3<f64> {
    let mut normal = Vector3::zeros();
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()];
        normal.x += (p.y - q.y) * (p.z + q.z);
        normal.y += (p.z - q.z) * (p.x + q.x);
        normal.z += (p.x - q.x) * (p.y + q.y);
    }
    normal
}

/// Converter for solids of linear extrusion
pub struct ExtrusionConverter;

impl ExtrusionConverter {
    /// Create new converter
    pub fn new() -> Self {
        Self
    }

    /// Strip the closing point, rejecting open curves
    fn closed_loop(de: DeNumber, mut points: Vec<Point3<f64>>) -> Result<Vec<Point3<f64>>> {
        let extent = points
            .iter()
            .map(|p| (p - points[0]).norm())
            .fold(0.0, f64::max);
        if let (Some(first), Some(last)) = (points.first(), points.last()) {
            if (last - first).norm() > CLOSURE_TOLERANCE * extent.max(1.0) {
                return Err(ConvertError::curve(de, "extrusion curve is not closed"));
            }
        }
        points.pop();
        if points.len() < 3 {
            return Err(ConvertError::curve(de, "extrusion curve has fewer than three points"));
        }
        Ok(points)
    }
}

impl Default for ExtrusionConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl SolidConverter for ExtrusionConverter {
    fn convert(
        &self,
        ctx: &mut ConversionContext,
        index: usize,
        db: &mut dyn GeometryWriter,
    ) -> Result<()> {
        let de = DeNumber::from_index(index);
        let k = ctx.unit_factor();
        let ext = match ctx.decode(index)?.entity {
            Entity::SolidOfExtrusion(ext) => ext,
            _ => return Err(ConvertError::invalid(de, "not a solid of extrusion")),
        };
        let length = positive(de, "extrusion length", ext.length)? * k;
        let direction = unit(de, "extrusion direction", &ext.direction)?;

        let curve_index = ctx.lookup(ext.curve)?;
        let mut base = Self::closed_loop(ext.curve, get_curve(ctx, curve_index)?)?;

        let normal = newell_normal(&base);
        let facing = normal.dot(&direction);
        if facing.abs() <= f64::EPSILON * normal.norm().max(1.0) {
            return Err(ConvertError::invalid(
                de,
                "curve plane contains the extrusion direction",
            ));
        }
        // base loop counter-clockwise seen from the top
        if facing < 0.0 {
            base.reverse();
        }

        let n = base.len();
        let offset = direction * length;
        let mut vertices: Vec<_> = base.iter().map(to_vec3).collect();
        vertices.extend(base.iter().map(|p| to_vec3(&(p + offset))));

        let mut faces = Vec::with_capacity(n + 2);
        faces.push(PolyFace {
            loops: vec![(0..n).rev().collect()],
        });
        faces.push(PolyFace {
            loops: vec![(n..2 * n).collect()],
        });
        for i in 0..n {
            let j = (i + 1) % n;
            faces.push(PolyFace {
                loops: vec![vec![i, j, n + j, n + i]],
            });
        }

        let solid = Solid::Polyhedron(PolyShellSet {
            vertices,
            shells: vec![PolyShell { faces, void: false }],
        });
        db.write_solid(&ctx.name(index), solid)?;
        Ok(())
    }

    fn supported_types(&self) -> Vec<EntityType> {
        vec![EntityType::SolidOfLinearExtrusion]
    }
}
