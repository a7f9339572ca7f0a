// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Solid Router - Dispatch to solid converters
//!
//! Routes CSG primitive, swept solid and B-rep entities to the converter
//! registered for their type. Every converter writes exactly one named
//! object, in the entity's own coordinate system, or fails.

use crate::extrude::ExtrusionConverter;
use crate::revolve::RevolutionConverter;
use crate::shell::BrepConverter;
use crate::{ConversionContext, ConvertError, Result};
use iges_model::entities::{Block, ConeFrustum, Cylinder, Ellipsoid, Sphere, Torus, Wedge};
use iges_model::{DeNumber, Entity, EntityType, GeometryWriter, Solid, Vec3};
use nalgebra::{Point3, Vector3};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Vectors shorter than this are treated as zero
pub(crate) const ZERO_LENGTH: f64 = 1.0e-12;

/// Solid converter trait
///
/// Each converter handles one or more IGES entity types.
pub trait SolidConverter: Send + Sync {
    /// Convert the entity at `index` and write its object to `db`
    fn convert(
        &self,
        ctx: &mut ConversionContext,
        index: usize,
        db: &mut dyn GeometryWriter,
    ) -> Result<()>;

    /// Get supported entity types
    fn supported_types(&self) -> Vec<EntityType>;
}

/// Solid router - routes entities to converters
pub struct SolidRouter {
    converters: FxHashMap<EntityType, Arc<dyn SolidConverter>>,
}

impl SolidRouter {
    /// Create new router without any converters registered
    pub fn new() -> Self {
        Self {
            converters: FxHashMap::default(),
        }
    }

    /// Create router with default converters registered
    ///
    /// Registers the following converters:
    /// - `PrimitiveConverter` (150, 152, 154, 156, 158, 160, 168)
    /// - `RevolutionConverter` (162)
    /// - `ExtrusionConverter` (164)
    /// - `BrepConverter` (186)
    pub fn with_default_converters() -> Self {
        let mut router = Self::new();
        router.register(Arc::new(PrimitiveConverter::new()));
        router.register(Arc::new(RevolutionConverter::new()));
        router.register(Arc::new(ExtrusionConverter::new()));
        router.register(Arc::new(BrepConverter::new()));
        router
    }

    /// Register a solid converter
    pub fn register(&mut self, converter: Arc<dyn SolidConverter>) {
        for entity_type in converter.supported_types() {
            self.converters.insert(entity_type, Arc::clone(&converter));
        }
    }

    /// Check if a type has a registered converter
    pub fn has_converter(&self, entity_type: EntityType) -> bool {
        self.converters.contains_key(&entity_type)
    }

    /// Convert a single entity
    pub fn convert(
        &self,
        ctx: &mut ConversionContext,
        index: usize,
        db: &mut dyn GeometryWriter,
    ) -> Result<()> {
        let entity_type = ctx.entry(index)?.entity_type;
        let converter = self
            .converters
            .get(&entity_type)
            .ok_or(ConvertError::Unsupported {
                de: DeNumber::from_index(index),
                entity_type,
            })?;
        converter.convert(ctx, index, db)
    }
}

impl Default for SolidRouter {
    fn default() -> Self {
        Self::with_default_converters()
    }
}

// ============================================================================
// Validation helpers
// ============================================================================

pub(crate) fn to_vec3(p: &Point3<f64>) -> Vec3 {
    [p.x, p.y, p.z]
}

pub(crate) fn vector_to_vec3(v: &Vector3<f64>) -> Vec3 {
    [v.x, v.y, v.z]
}

/// Require `value > 0`
pub(crate) fn positive(de: DeNumber, what: &str, value: f64) -> Result<f64> {
    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(ConvertError::invalid(
            de,
            format!("{} must be positive, got {}", what, value),
        ))
    }
}

/// Unit vector, rejecting zero-length directions
pub(crate) fn unit(de: DeNumber, what: &str, v: &Vector3<f64>) -> Result<Vector3<f64>> {
    let norm = v.norm();
    if norm <= ZERO_LENGTH || !norm.is_finite() {
        return Err(ConvertError::invalid(de, format!("{} has zero length", what)));
    }
    Ok(v / norm)
}

/// Orthonormal frame from an x direction and a z direction
///
/// `y = z × x`; the x axis is re-orthogonalized against z.
fn frame(
    de: DeNumber,
    x_axis: &Vector3<f64>,
    z_axis: &Vector3<f64>,
) -> Result<(Vector3<f64>, Vector3<f64>, Vector3<f64>)> {
    let z = unit(de, "Z axis", z_axis)?;
    let x = unit(de, "X axis", x_axis)?;
    let y = z.cross(&x);
    let y = unit(de, "Y axis (X and Z axes are parallel)", &y)?;
    let x = y.cross(&z);
    Ok((x, y, z))
}

// ============================================================================
// Primitive converter
// ============================================================================

/// CSG primitive converter
///
/// Handles blocks, wedges, cylinders, cone frustums, spheres, tori and
/// ellipsoids. Values are scaled to millimetres.
pub struct PrimitiveConverter;

impl PrimitiveConverter {
    /// Create new converter
    pub fn new() -> Self {
        Self
    }

    fn block(&self, de: DeNumber, b: &Block, k: f64) -> Result<Solid> {
        let lx = positive(de, "LX", b.size[0])? * k;
        let ly = positive(de, "LY", b.size[1])? * k;
        let lz = positive(de, "LZ", b.size[2])? * k;
        let (x, y, z) = frame(de, &b.x_axis, &b.z_axis)?;
        let c = b.corner * k;

        let base = [c, c + x * lx, c + x * lx + y * ly, c + y * ly];
        let h = z * lz;
        let top = [base[0] + h, base[1] + h, base[2] + h, base[3] + h];
        Ok(Solid::Arb8 {
            points: arb8(base, top),
        })
    }

    fn wedge(&self, de: DeNumber, w: &Wedge, k: f64) -> Result<Solid> {
        let lx = positive(de, "LX", w.size[0])? * k;
        let ly = positive(de, "LY", w.size[1])? * k;
        let lz = positive(de, "LZ", w.size[2])? * k;
        if w.top_x < 0.0 || w.top_x * k > lx {
            return Err(ConvertError::invalid(
                de,
                format!("LTX {} must lie between 0 and LX", w.top_x),
            ));
        }
        let ltx = w.top_x * k;
        let (x, y, z) = frame(de, &w.x_axis, &w.z_axis)?;
        let c = w.corner * k;
        let h = z * lz;

        let base = [c, c + x * lx, c + x * lx + y * ly, c + y * ly];
        let top = [c + h, c + h + x * ltx, c + h + x * ltx + y * ly, c + h + y * ly];
        Ok(Solid::Arb8 {
            points: arb8(base, top),
        })
    }

    fn cylinder(&self, de: DeNumber, cyl: &Cylinder, k: f64) -> Result<Solid> {
        let height = positive(de, "height", cyl.height)? * k;
        let radius = positive(de, "radius", cyl.radius)? * k;
        let axis = unit(de, "axis", &cyl.axis)?;
        Ok(Solid::Rcc {
            base: to_vec3(&(cyl.base * k)),
            height: vector_to_vec3(&(axis * height)),
            radius,
        })
    }

    fn cone(&self, de: DeNumber, cone: &ConeFrustum, k: f64) -> Result<Solid> {
        let height = positive(de, "height", cone.height)? * k;
        let r1 = positive(de, "R1", cone.r1)? * k;
        if cone.r2 < 0.0 || cone.r2 >= cone.r1 {
            return Err(ConvertError::invalid(
                de,
                format!("R2 {} must satisfy 0 <= R2 < R1", cone.r2),
            ));
        }
        let axis = unit(de, "axis", &cone.axis)?;
        Ok(Solid::Trc {
            base: to_vec3(&(cone.base * k)),
            height: vector_to_vec3(&(axis * height)),
            r_base: r1,
            r_top: cone.r2 * k,
        })
    }

    fn sphere(&self, de: DeNumber, s: &Sphere, k: f64) -> Result<Solid> {
        Ok(Solid::Sphere {
            center: to_vec3(&(s.center * k)),
            radius: positive(de, "radius", s.radius)? * k,
        })
    }

    fn torus(&self, de: DeNumber, t: &Torus, k: f64) -> Result<Solid> {
        let r1 = positive(de, "R1", t.r1)?;
        let r2 = positive(de, "R2", t.r2)?;
        if r2 >= r1 {
            return Err(ConvertError::invalid(
                de,
                format!("tube radius {} must be smaller than {}", r2, r1),
            ));
        }
        let normal = unit(de, "axis", &t.axis)?;
        Ok(Solid::Torus {
            center: to_vec3(&(t.center * k)),
            normal: vector_to_vec3(&normal),
            r1: r1 * k,
            r2: r2 * k,
        })
    }

    fn ellipsoid(&self, de: DeNumber, e: &Ellipsoid, k: f64) -> Result<Solid> {
        let lx = positive(de, "LX", e.size[0])? * k;
        let ly = positive(de, "LY", e.size[1])? * k;
        let lz = positive(de, "LZ", e.size[2])? * k;
        let (x, y, z) = frame(de, &e.x_axis, &e.z_axis)?;
        Ok(Solid::Ellipsoid {
            center: to_vec3(&(e.center * k)),
            a: vector_to_vec3(&(x * lx)),
            b: vector_to_vec3(&(y * ly)),
            c: vector_to_vec3(&(z * lz)),
        })
    }
}

/// Eight ARB vertices: the base face then the top face, same winding
fn arb8(base: [Point3<f64>; 4], top: [Point3<f64>; 4]) -> [Vec3; 8] {
    let mut points = [[0.0; 3]; 8];
    for (slot, p) in points.iter_mut().zip(base.iter().chain(top.iter())) {
        *slot = to_vec3(p);
    }
    points
}

impl Default for PrimitiveConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl SolidConverter for PrimitiveConverter {
    fn convert(
        &self,
        ctx: &mut ConversionContext,
        index: usize,
        db: &mut dyn GeometryWriter,
    ) -> Result<()> {
        let de = DeNumber::from_index(index);
        let k = ctx.unit_factor();
        let decoded = ctx.decode(index)?;
        let solid = match &decoded.entity {
            Entity::Block(b) => self.block(de, b, k)?,
            Entity::Wedge(w) => self.wedge(de, w, k)?,
            Entity::Cylinder(c) => self.cylinder(de, c, k)?,
            Entity::ConeFrustum(c) => self.cone(de, c, k)?,
            Entity::Sphere(s) => self.sphere(de, s, k)?,
            Entity::Torus(t) => self.torus(de, t, k)?,
            Entity::Ellipsoid(e) => self.ellipsoid(de, e, k)?,
            _ => {
                return Err(ConvertError::Unsupported {
                    de,
                    entity_type: ctx.entry(index)?.entity_type,
                })
            }
        };
        db.write_solid(&ctx.name(index), solid)?;
        Ok(())
    }

    fn supported_types(&self) -> Vec<EntityType> {
        vec![
            EntityType::Block,
            EntityType::RightAngularWedge,
            EntityType::RightCircularCylinder,
            EntityType::RightCircularConeFrustum,
            EntityType::Sphere,
            EntityType::Torus,
            EntityType::Ellipsoid,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::context;
    use crate::MemoryDatabase;
    use approx::assert_relative_eq;
    use iges_parser::IgesBuilder;

    fn convert_one(type_number: u16, params: &str) -> (Result<()>, MemoryDatabase, String) {
        let mut builder = IgesBuilder::new();
        let de = builder.entity(type_number, 0, params);
        let mut ctx = context(&builder);
        let mut db = MemoryDatabase::new();
        let index = ctx.lookup(de).unwrap();
        let result = SolidRouter::with_default_converters().convert(&mut ctx, index, &mut db);
        (result, db, ctx.name(index))
    }

    #[test]
    fn test_torus() {
        let (result, db, name) = convert_one(160, "5.,2.,0.,0.,0.,0.,0.,1.");
        result.unwrap();
        match db.solid(&name) {
            Some(Solid::Torus { r1, r2, normal, .. }) => {
                assert_eq!(*r1, 5.0);
                assert_eq!(*r2, 2.0);
                assert_eq!(*normal, [0.0, 0.0, 1.0]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_torus_radii_order() {
        let (result, db, _) = convert_one(160, "2.,5.");
        assert!(matches!(result, Err(ConvertError::InvalidParameters { .. })));
        assert!(db.is_empty());
    }

    #[test]
    fn test_non_positive_radius() {
        let (result, _, _) = convert_one(158, "0.,1.,1.,1.");
        match result {
            Err(e) => assert!(e.to_string().contains("DE 1"), "{}", e),
            Ok(()) => panic!("zero radius accepted"),
        }
    }

    #[test]
    fn test_block_unit_cube() {
        let (result, db, name) = convert_one(150, "1.,2.,3.");
        result.unwrap();
        match db.solid(&name) {
            Some(Solid::Arb8 { points }) => {
                assert_eq!(points[0], [0.0, 0.0, 0.0]);
                assert_eq!(points[2], [1.0, 2.0, 0.0]);
                assert_eq!(points[6], [1.0, 2.0, 3.0]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_block_parallel_axes() {
        let (result, _, _) = convert_one(150, "1.,1.,1.,0.,0.,0.,0.,0.,1.,0.,0.,1.");
        assert!(result.is_err());
    }

    #[test]
    fn test_wedge_top_face() {
        let (result, db, name) = convert_one(152, "4.,2.,1.,1.");
        result.unwrap();
        match db.solid(&name) {
            Some(Solid::Arb8 { points }) => {
                assert_eq!(points[5], [1.0, 0.0, 1.0]);
                assert_eq!(points[1], [4.0, 0.0, 0.0]);
            }
            other => panic!("unexpected {:?}", other),
        }
        let (result, _, _) = convert_one(152, "4.,2.,1.,5.");
        assert!(result.is_err());
    }

    #[test]
    fn test_cylinder_and_cone() {
        let (result, db, name) = convert_one(154, "10.,2.,0.,0.,0.,0.,0.,2.");
        result.unwrap();
        match db.solid(&name) {
            Some(Solid::Rcc { height, radius, .. }) => {
                assert_eq!(*height, [0.0, 0.0, 10.0]);
                assert_eq!(*radius, 2.0);
            }
            other => panic!("unexpected {:?}", other),
        }
        let (result, _, _) = convert_one(156, "10.,2.,3.");
        assert!(result.is_err());
        let (result, db, name) = convert_one(156, "10.,3.,0.");
        result.unwrap();
        assert!(matches!(db.solid(&name), Some(Solid::Trc { r_top, .. }) if *r_top == 0.0));
    }

    #[test]
    fn test_ellipsoid_axes() {
        let (result, db, name) = convert_one(168, "3.,2.,1.,0.,0.,0.,0.,1.,0.,0.,0.,1.");
        result.unwrap();
        match db.solid(&name) {
            Some(Solid::Ellipsoid { a, b, c, .. }) => {
                assert_relative_eq!(a[1], 3.0);
                // b = LY * (Z x X) = 2 * (-1, 0, 0)
                assert_relative_eq!(b[0], -2.0);
                assert_relative_eq!(c[2], 1.0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_type() {
        let (result, _, _) = convert_one(110, "0.,0.,0.,1.,1.,1.");
        assert!(matches!(result, Err(ConvertError::Unsupported { .. })));
    }
}
