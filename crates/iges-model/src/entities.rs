// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed entity parameter layouts
//!
//! Each struct mirrors the parameter data of one IGES entity type, in file
//! units and entity-local coordinates. Defaults for omitted fields follow
//! the IGES 5.x entity definitions.

use crate::{DeNumber, EntityType, ParamCursor, ParameterRecord, ParseError, Result};
use nalgebra::{Point2, Point3, Vector3};

const X_AXIS: [f64; 3] = [1.0, 0.0, 0.0];
const Z_AXIS: [f64; 3] = [0.0, 0.0, 1.0];
const ORIGIN: [f64; 3] = [0.0, 0.0, 0.0];

fn point(v: [f64; 3]) -> Point3<f64> {
    Point3::new(v[0], v[1], v[2])
}

fn vector(v: [f64; 3]) -> Vector3<f64> {
    Vector3::new(v[0], v[1], v[2])
}

fn unsupported_form(c: &ParamCursor<'_>, entity_type: EntityType, form: i32) -> ParseError {
    ParseError::UnsupportedForm {
        de: c.de(),
        entity_type: entity_type.number(),
        form,
    }
}

// ============================================================================
// Curves
// ============================================================================

/// Circular arc (100), counter-clockwise from start to end in the plane `z`
#[derive(Clone, Debug, PartialEq)]
pub struct CircularArc {
    pub z: f64,
    pub center: Point2<f64>,
    pub start: Point2<f64>,
    pub end: Point2<f64>,
}

impl CircularArc {
    pub fn read(c: &mut ParamCursor<'_>) -> Result<Self> {
        let z = c.real_or(0.0)?;
        let center = Point2::new(c.real()?, c.real()?);
        let start = Point2::new(c.real()?, c.real()?);
        let end = Point2::new(c.real()?, c.real()?);
        Ok(Self {
            z,
            center,
            start,
            end,
        })
    }
}

/// Composite curve (102)
#[derive(Clone, Debug, PartialEq)]
pub struct CompositeCurve {
    pub members: Vec<DeNumber>,
}

impl CompositeCurve {
    pub fn read(c: &mut ParamCursor<'_>) -> Result<Self> {
        let n = c.count_of(1)?;
        let members = (0..n).map(|_| c.pointer()).collect::<Result<_>>()?;
        Ok(Self { members })
    }
}

/// Conic arc (104): `A x² + B xy + C y² + D x + E y + F = 0` in the plane `z`
#[derive(Clone, Debug, PartialEq)]
pub struct ConicArc {
    pub coefficients: [f64; 6],
    pub z: f64,
    pub start: Point2<f64>,
    pub end: Point2<f64>,
}

impl ConicArc {
    pub fn read(c: &mut ParamCursor<'_>) -> Result<Self> {
        let mut coefficients = [0.0; 6];
        for v in coefficients.iter_mut() {
            *v = c.real_or(0.0)?;
        }
        let z = c.real_or(0.0)?;
        let start = Point2::new(c.real()?, c.real()?);
        let end = Point2::new(c.real()?, c.real()?);
        Ok(Self {
            coefficients,
            z,
            start,
            end,
        })
    }
}

/// Copious data (106), flattened to 3D points
///
/// Forms 1, 11 and 63 hold `(x, y)` pairs sharing one z; forms 2 and 12 hold
/// triples; forms 3 and 13 hold sextuples whose vector half is ignored.
#[derive(Clone, Debug, PartialEq)]
pub struct CopiousData {
    pub points: Vec<Point3<f64>>,
}

impl CopiousData {
    pub fn read(c: &mut ParamCursor<'_>, form: i32) -> Result<Self> {
        let _interpretation = c.int_or(1)?;
        let n = c.count_of(2)?;
        let mut points = Vec::with_capacity(n);
        match form {
            1 | 11 | 63 => {
                let z = c.real_or(0.0)?;
                for _ in 0..n {
                    points.push(Point3::new(c.real()?, c.real()?, z));
                }
            }
            2 | 12 => {
                for _ in 0..n {
                    points.push(point(c.triple()?));
                }
            }
            3 | 13 => {
                for _ in 0..n {
                    points.push(point(c.triple()?));
                    c.skip(3);
                }
            }
            _ => return Err(unsupported_form(c, EntityType::CopiousData, form)),
        }
        Ok(Self { points })
    }
}

/// Line (110)
#[derive(Clone, Debug, PartialEq)]
pub struct Line {
    pub start: Point3<f64>,
    pub end: Point3<f64>,
}

impl Line {
    pub fn read(c: &mut ParamCursor<'_>) -> Result<Self> {
        Ok(Self {
            start: point(c.triple()?),
            end: point(c.triple()?),
        })
    }
}

/// Parametric spline curve (112)
///
/// Segment `i` covers `[breaks[i], breaks[i+1]]`; its coefficients are
/// `AX BX CX DX AY BY CY DY AZ BZ CZ DZ` in the local parameter
/// `s = u - breaks[i]`.
#[derive(Clone, Debug, PartialEq)]
pub struct ParametricSpline {
    pub spline_type: i64,
    pub continuity: i64,
    pub dimension: i64,
    pub breaks: Vec<f64>,
    pub segments: Vec<[f64; 12]>,
    pub terminal: Point3<f64>,
}

impl ParametricSpline {
    pub fn read(c: &mut ParamCursor<'_>) -> Result<Self> {
        let spline_type = c.int_or(3)?;
        let continuity = c.int_or(0)?;
        let dimension = c.int_or(3)?;
        let n = c.count_of(1)?;
        let breaks = c.reals(n + 1)?;
        let mut segments = Vec::with_capacity(n);
        for _ in 0..n {
            let mut coefficients = [0.0; 12];
            for v in coefficients.iter_mut() {
                *v = c.real_or(0.0)?;
            }
            segments.push(coefficients);
        }
        // terminal point values followed by its derivatives
        let x = c.real()?;
        c.skip(3);
        let y = c.real()?;
        c.skip(3);
        let z = c.real_or(0.0)?;
        c.skip(3);
        Ok(Self {
            spline_type,
            continuity,
            dimension,
            breaks,
            segments,
            terminal: Point3::new(x, y, z),
        })
    }
}

/// Transformation matrix (124)
#[derive(Clone, Debug, PartialEq)]
pub struct TransformationMatrix {
    pub rotation: [[f64; 3]; 3],
    pub translation: [f64; 3],
}

impl TransformationMatrix {
    pub fn read(c: &mut ParamCursor<'_>) -> Result<Self> {
        let mut rotation = [[0.0; 3]; 3];
        let mut translation = [0.0; 3];
        for (row, t) in rotation.iter_mut().zip(translation.iter_mut()) {
            for v in row.iter_mut() {
                *v = c.real()?;
            }
            *t = c.real()?;
        }
        Ok(Self {
            rotation,
            translation,
        })
    }

    /// Homogeneous matrix with the translation multiplied by `scale`
    #[rustfmt::skip]
    pub fn to_matrix(&self, scale: f64) -> nalgebra::Matrix4<f64> {
        let r = &self.rotation;
        let t = &self.translation;
        nalgebra::Matrix4::new(
            r[0][0], r[0][1], r[0][2], t[0] * scale,
            r[1][0], r[1][1], r[1][2], t[1] * scale,
            r[2][0], r[2][1], r[2][2], t[2] * scale,
            0.0, 0.0, 0.0, 1.0,
        )
    }
}

/// Rational B-spline curve (126)
#[derive(Clone, Debug, PartialEq)]
pub struct RationalBSplineCurve {
    /// Upper index of the control point sum
    pub k: usize,
    pub degree: usize,
    pub planar: bool,
    pub closed: bool,
    pub polynomial: bool,
    pub periodic: bool,
    pub knots: Vec<f64>,
    pub weights: Vec<f64>,
    pub control_points: Vec<Point3<f64>>,
    pub v0: f64,
    pub v1: f64,
}

impl RationalBSplineCurve {
    pub fn read(c: &mut ParamCursor<'_>) -> Result<Self> {
        let k = c.count_of(1)?;
        let degree = c.count()?;
        if degree == 0 || degree > k {
            return Err(ParseError::entity_parse(
                c.de(),
                format!("degree {} invalid for {} control points", degree, k + 1),
            ));
        }
        let planar = c.int_or(0)? != 0;
        let closed = c.int_or(0)? != 0;
        let polynomial = c.int_or(0)? != 0;
        let periodic = c.int_or(0)? != 0;
        let knots = c.reals(k + degree + 2)?;
        let weights = c.reals(k + 1)?;
        let control_points = (0..=k)
            .map(|_| c.triple().map(point))
            .collect::<Result<_>>()?;
        let v0 = c.real()?;
        let v1 = c.real()?;
        // unit normal of a planar curve
        c.skip(3);
        Ok(Self {
            k,
            degree,
            planar,
            closed,
            polynomial,
            periodic,
            knots,
            weights,
            control_points,
            v0,
            v1,
        })
    }
}

/// Rational B-spline surface (128)
///
/// Control points and weights are stored with the first (u) index varying
/// fastest, as in the file.
#[derive(Clone, Debug, PartialEq)]
pub struct RationalBSplineSurface {
    pub k1: usize,
    pub k2: usize,
    pub degree_u: usize,
    pub degree_v: usize,
    pub properties: [i64; 5],
    pub u_knots: Vec<f64>,
    pub v_knots: Vec<f64>,
    pub weights: Vec<f64>,
    pub control_points: Vec<Point3<f64>>,
    pub u_range: [f64; 2],
    pub v_range: [f64; 2],
}

impl RationalBSplineSurface {
    pub fn read(c: &mut ParamCursor<'_>) -> Result<Self> {
        let k1 = c.count_of(1)?;
        let k2 = c.count_of(1)?;
        let degree_u = c.count()?;
        let degree_v = c.count()?;
        if degree_u == 0 || degree_v == 0 || degree_u > k1 || degree_v > k2 {
            return Err(ParseError::entity_parse(
                c.de(),
                format!(
                    "degrees ({}, {}) invalid for a {}x{} control net",
                    degree_u,
                    degree_v,
                    k1 + 1,
                    k2 + 1
                ),
            ));
        }
        let mut properties = [0i64; 5];
        for p in properties.iter_mut() {
            *p = c.int_or(0)?;
        }
        let u_knots = c.reals(k1 + degree_u + 2)?;
        let v_knots = c.reals(k2 + degree_v + 2)?;
        let count = (k1 + 1) * (k2 + 1);
        let weights = c.reals(count)?;
        let control_points = (0..count)
            .map(|_| c.triple().map(point))
            .collect::<Result<_>>()?;
        let u_range = [c.real()?, c.real()?];
        let v_range = [c.real()?, c.real()?];
        Ok(Self {
            k1,
            k2,
            degree_u,
            degree_v,
            properties,
            u_knots,
            v_knots,
            weights,
            control_points,
            u_range,
            v_range,
        })
    }
}

// ============================================================================
// Solids
// ============================================================================

/// Block (150)
#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    pub size: [f64; 3],
    pub corner: Point3<f64>,
    pub x_axis: Vector3<f64>,
    pub z_axis: Vector3<f64>,
}

impl Block {
    pub fn read(c: &mut ParamCursor<'_>) -> Result<Self> {
        Ok(Self {
            size: c.triple()?,
            corner: point(c.triple_or(ORIGIN)?),
            x_axis: vector(c.triple_or(X_AXIS)?),
            z_axis: vector(c.triple_or(Z_AXIS)?),
        })
    }
}

/// Right angular wedge (152): a block whose top face is `top_x` long in x
#[derive(Clone, Debug, PartialEq)]
pub struct Wedge {
    pub size: [f64; 3],
    pub top_x: f64,
    pub corner: Point3<f64>,
    pub x_axis: Vector3<f64>,
    pub z_axis: Vector3<f64>,
}

impl Wedge {
    pub fn read(c: &mut ParamCursor<'_>) -> Result<Self> {
        let size = c.triple()?;
        let top_x = c.real_or(0.0)?;
        Ok(Self {
            size,
            top_x,
            corner: point(c.triple_or(ORIGIN)?),
            x_axis: vector(c.triple_or(X_AXIS)?),
            z_axis: vector(c.triple_or(Z_AXIS)?),
        })
    }
}

/// Right circular cylinder (154)
#[derive(Clone, Debug, PartialEq)]
pub struct Cylinder {
    pub height: f64,
    pub radius: f64,
    pub base: Point3<f64>,
    pub axis: Vector3<f64>,
}

impl Cylinder {
    pub fn read(c: &mut ParamCursor<'_>) -> Result<Self> {
        Ok(Self {
            height: c.real()?,
            radius: c.real()?,
            base: point(c.triple_or(ORIGIN)?),
            axis: vector(c.triple_or(Z_AXIS)?),
        })
    }
}

/// Right circular cone frustum (156); `r1` at the base is the larger face
#[derive(Clone, Debug, PartialEq)]
pub struct ConeFrustum {
    pub height: f64,
    pub r1: f64,
    pub r2: f64,
    pub base: Point3<f64>,
    pub axis: Vector3<f64>,
}

impl ConeFrustum {
    pub fn read(c: &mut ParamCursor<'_>) -> Result<Self> {
        Ok(Self {
            height: c.real()?,
            r1: c.real()?,
            r2: c.real_or(0.0)?,
            base: point(c.triple_or(ORIGIN)?),
            axis: vector(c.triple_or(Z_AXIS)?),
        })
    }
}

/// Sphere (158)
#[derive(Clone, Debug, PartialEq)]
pub struct Sphere {
    pub radius: f64,
    pub center: Point3<f64>,
}

impl Sphere {
    pub fn read(c: &mut ParamCursor<'_>) -> Result<Self> {
        Ok(Self {
            radius: c.real()?,
            center: point(c.triple_or(ORIGIN)?),
        })
    }
}

/// Torus (160): `r1` to the tube center, `r2` the tube radius
#[derive(Clone, Debug, PartialEq)]
pub struct Torus {
    pub r1: f64,
    pub r2: f64,
    pub center: Point3<f64>,
    pub axis: Vector3<f64>,
}

impl Torus {
    pub fn read(c: &mut ParamCursor<'_>) -> Result<Self> {
        Ok(Self {
            r1: c.real()?,
            r2: c.real()?,
            center: point(c.triple_or(ORIGIN)?),
            axis: vector(c.triple_or(Z_AXIS)?),
        })
    }
}

/// Solid of revolution (162)
#[derive(Clone, Debug, PartialEq)]
pub struct SolidOfRevolution {
    pub curve: DeNumber,
    pub fraction: f64,
    pub axis_point: Point3<f64>,
    pub axis_direction: Vector3<f64>,
}

impl SolidOfRevolution {
    pub fn read(c: &mut ParamCursor<'_>) -> Result<Self> {
        Ok(Self {
            curve: c.pointer()?,
            fraction: c.real_or(1.0)?,
            axis_point: point(c.triple_or(ORIGIN)?),
            axis_direction: vector(c.triple_or(Z_AXIS)?),
        })
    }
}

/// Solid of linear extrusion (164)
#[derive(Clone, Debug, PartialEq)]
pub struct SolidOfExtrusion {
    pub curve: DeNumber,
    pub length: f64,
    pub direction: Vector3<f64>,
}

impl SolidOfExtrusion {
    pub fn read(c: &mut ParamCursor<'_>) -> Result<Self> {
        Ok(Self {
            curve: c.pointer()?,
            length: c.real()?,
            direction: vector(c.triple_or(Z_AXIS)?),
        })
    }
}

/// Ellipsoid (168)
#[derive(Clone, Debug, PartialEq)]
pub struct Ellipsoid {
    pub size: [f64; 3],
    pub center: Point3<f64>,
    pub x_axis: Vector3<f64>,
    pub z_axis: Vector3<f64>,
}

impl Ellipsoid {
    pub fn read(c: &mut ParamCursor<'_>) -> Result<Self> {
        Ok(Self {
            size: c.triple()?,
            center: point(c.triple_or(ORIGIN)?),
            x_axis: vector(c.triple_or(X_AXIS)?),
            z_axis: vector(c.triple_or(Z_AXIS)?),
        })
    }
}

// ============================================================================
// Structure
// ============================================================================

/// Boolean tree (180) in post order
///
/// Negative entries are `-DE` operand pointers; 1, 2 and 3 are union,
/// intersection and difference.
#[derive(Clone, Debug, PartialEq)]
pub struct BooleanTree {
    pub postfix: Vec<i64>,
}

impl BooleanTree {
    pub fn read(c: &mut ParamCursor<'_>) -> Result<Self> {
        let n = c.count_of(1)?;
        let postfix = (0..n).map(|_| c.int()).collect::<Result<_>>()?;
        Ok(Self { postfix })
    }
}

/// Solid assembly (184)
#[derive(Clone, Debug, PartialEq)]
pub struct SolidAssembly {
    pub items: Vec<DeNumber>,
    pub matrices: Vec<Option<DeNumber>>,
}

impl SolidAssembly {
    pub fn read(c: &mut ParamCursor<'_>) -> Result<Self> {
        let n = c.count_of(1)?;
        let items = (0..n).map(|_| c.pointer()).collect::<Result<_>>()?;
        let matrices = (0..n).map(|_| c.pointer_opt()).collect::<Result<_>>()?;
        Ok(Self { items, matrices })
    }
}

/// Manifold solid B-rep object (186)
#[derive(Clone, Debug, PartialEq)]
pub struct ManifoldSolid {
    pub shell: DeNumber,
    pub shell_agrees: bool,
    pub voids: Vec<(DeNumber, bool)>,
}

impl ManifoldSolid {
    pub fn read(c: &mut ParamCursor<'_>) -> Result<Self> {
        let shell = c.pointer()?;
        let shell_agrees = c.int_or(1)? != 0;
        let n = c.count_of(1)?;
        let mut voids = Vec::with_capacity(n);
        for _ in 0..n {
            voids.push((c.pointer()?, c.int_or(1)? != 0));
        }
        Ok(Self {
            shell,
            shell_agrees,
            voids,
        })
    }
}

/// Shell (514)
#[derive(Clone, Debug, PartialEq)]
pub struct Shell {
    pub faces: Vec<(DeNumber, bool)>,
}

impl Shell {
    pub fn read(c: &mut ParamCursor<'_>) -> Result<Self> {
        let n = c.count_of(1)?;
        let mut faces = Vec::with_capacity(n);
        for _ in 0..n {
            faces.push((c.pointer()?, c.int_or(1)? != 0));
        }
        Ok(Self { faces })
    }
}

/// Face (510)
#[derive(Clone, Debug, PartialEq)]
pub struct Face {
    pub surface: DeNumber,
    pub outer_loop: bool,
    pub loops: Vec<DeNumber>,
}

impl Face {
    pub fn read(c: &mut ParamCursor<'_>) -> Result<Self> {
        let surface = c.pointer()?;
        let n = c.count_of(1)?;
        let outer_loop = c.int_or(1)? != 0;
        let loops = (0..n).map(|_| c.pointer()).collect::<Result<_>>()?;
        Ok(Self {
            surface,
            outer_loop,
            loops,
        })
    }
}

/// What a loop entry points into
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopEdgeKind {
    Edge,
    Vertex,
}

/// One entry of a loop (508); `index` is 1-based
#[derive(Clone, Debug, PartialEq)]
pub struct LoopEdge {
    pub kind: LoopEdgeKind,
    pub list: DeNumber,
    pub index: usize,
    pub agrees: bool,
}

/// Loop (508); parameter-space curves are skipped
#[derive(Clone, Debug, PartialEq)]
pub struct Loop {
    pub edges: Vec<LoopEdge>,
}

impl Loop {
    pub fn read(c: &mut ParamCursor<'_>) -> Result<Self> {
        let n = c.count_of(1)?;
        let mut edges = Vec::with_capacity(n);
        for _ in 0..n {
            let kind = if c.int_or(0)? == 1 {
                LoopEdgeKind::Vertex
            } else {
                LoopEdgeKind::Edge
            };
            let list = c.pointer()?;
            let index = c.count()?;
            let agrees = c.int_or(1)? != 0;
            // isoparametric flag and pointer per parameter-space curve
            let curves = c.count_of(2)?;
            c.skip(2 * curves);
            edges.push(LoopEdge {
                kind,
                list,
                index,
                agrees,
            });
        }
        Ok(Self { edges })
    }
}

/// One edge of an edge list (504); vertex indices are 1-based
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeRecord {
    pub curve: DeNumber,
    pub start_list: DeNumber,
    pub start_index: usize,
    pub end_list: DeNumber,
    pub end_index: usize,
}

/// Edge list (504)
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeList {
    pub edges: Vec<EdgeRecord>,
}

impl EdgeList {
    pub fn read(c: &mut ParamCursor<'_>) -> Result<Self> {
        let n = c.count_of(5)?;
        let mut edges = Vec::with_capacity(n);
        for _ in 0..n {
            edges.push(EdgeRecord {
                curve: c.pointer()?,
                start_list: c.pointer()?,
                start_index: c.count()?,
                end_list: c.pointer()?,
                end_index: c.count()?,
            });
        }
        Ok(Self { edges })
    }

    /// Edge by 1-based index
    pub fn edge(&self, index: usize) -> Option<&EdgeRecord> {
        index.checked_sub(1).and_then(|i| self.edges.get(i))
    }
}

/// Vertex list (502)
#[derive(Clone, Debug, PartialEq)]
pub struct VertexList {
    pub vertices: Vec<Point3<f64>>,
}

impl VertexList {
    pub fn read(c: &mut ParamCursor<'_>) -> Result<Self> {
        let n = c.count_of(3)?;
        let vertices = (0..n)
            .map(|_| c.triple().map(point))
            .collect::<Result<_>>()?;
        Ok(Self { vertices })
    }

    /// Vertex by 1-based index
    pub fn vertex(&self, index: usize) -> Option<Point3<f64>> {
        index
            .checked_sub(1)
            .and_then(|i| self.vertices.get(i))
            .copied()
    }
}

/// Color definition (314): components in percent
#[derive(Clone, Debug, PartialEq)]
pub struct ColorDefinition {
    pub percent: [f64; 3],
    pub name: Option<String>,
}

impl ColorDefinition {
    pub fn read(c: &mut ParamCursor<'_>) -> Result<Self> {
        let percent = c.triple_or(ORIGIN)?;
        let name = if c.remaining() > 0 {
            Some(c.string()?).filter(|s| !s.is_empty())
        } else {
            None
        };
        Ok(Self { percent, name })
    }
}

/// Attribute table definition (322), form 0
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeDefinition {
    pub name: String,
    pub attribute_count: usize,
}

impl AttributeDefinition {
    pub fn read(c: &mut ParamCursor<'_>) -> Result<Self> {
        let name = c.string()?;
        let _list_type = c.int_or(0)?;
        let attribute_count = c.count_of(3)?;
        // type, data type and value count per attribute
        c.skip(3 * attribute_count);
        Ok(Self {
            name,
            attribute_count,
        })
    }
}

/// Region and material attributes carried by a BRL-CAD attribute instance
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BrlcadAttributes {
    pub material_name: String,
    pub material_params: String,
    pub region_flag: bool,
    pub ident: i64,
    pub air_code: i64,
    pub material_code: i64,
    pub los_density: i64,
    pub inherit: i64,
    pub color_defined: bool,
}

impl Default for BrlcadAttributes {
    fn default() -> Self {
        Self {
            material_name: String::new(),
            material_params: String::new(),
            region_flag: false,
            ident: 0,
            air_code: 0,
            material_code: 0,
            los_density: 100,
            inherit: 0,
            color_defined: false,
        }
    }
}

impl BrlcadAttributes {
    /// Read the fields of a 422 instance in definition order
    pub fn read(c: &mut ParamCursor<'_>) -> Result<Self> {
        Ok(Self {
            material_name: c.string()?,
            material_params: c.string()?,
            region_flag: c.int_or(0)? != 0,
            ident: c.int_or(0)?,
            air_code: c.int_or(0)?,
            material_code: c.int_or(0)?,
            los_density: c.int_or(100)?,
            inherit: c.int_or(0)?,
            color_defined: c.int_or(0)? != 0,
        })
    }
}

/// Name property (406 form 15)
#[derive(Clone, Debug, PartialEq)]
pub struct NameProperty {
    pub name: String,
}

impl NameProperty {
    pub fn read(c: &mut ParamCursor<'_>) -> Result<Self> {
        let _count = c.int_or(1)?;
        Ok(Self { name: c.string()? })
    }
}

/// Solid instance (430)
#[derive(Clone, Debug, PartialEq)]
pub struct SolidInstance {
    pub target: DeNumber,
}

impl SolidInstance {
    pub fn read(c: &mut ParamCursor<'_>) -> Result<Self> {
        Ok(Self {
            target: c.pointer()?,
        })
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// Any decoded entity
#[derive(Clone, Debug, PartialEq)]
pub enum Entity {
    CircularArc(CircularArc),
    CompositeCurve(CompositeCurve),
    ConicArc(ConicArc),
    CopiousData(CopiousData),
    Line(Line),
    ParametricSpline(ParametricSpline),
    TransformationMatrix(TransformationMatrix),
    RationalBSplineCurve(RationalBSplineCurve),
    RationalBSplineSurface(RationalBSplineSurface),
    Block(Block),
    Wedge(Wedge),
    Cylinder(Cylinder),
    ConeFrustum(ConeFrustum),
    Sphere(Sphere),
    Torus(Torus),
    SolidOfRevolution(SolidOfRevolution),
    SolidOfExtrusion(SolidOfExtrusion),
    Ellipsoid(Ellipsoid),
    BooleanTree(BooleanTree),
    SolidAssembly(SolidAssembly),
    ManifoldSolid(ManifoldSolid),
    Shell(Shell),
    Face(Face),
    Loop(Loop),
    EdgeList(EdgeList),
    VertexList(VertexList),
    ColorDefinition(ColorDefinition),
    AttributeDefinition(AttributeDefinition),
    NameProperty(NameProperty),
    SolidInstance(SolidInstance),
    /// Type without a fixed layout here; trailing pointers are not read
    Opaque(EntityType),
}

/// Decoded entity plus its trailing pointer lists
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedEntity {
    pub de: DeNumber,
    pub form: i32,
    pub entity: Entity,
    /// Associativity and general note pointers
    pub associativities: Vec<DeNumber>,
    /// Property and attribute pointers
    pub properties: Vec<DeNumber>,
}

impl DecodedEntity {
    /// Decode a parameter record according to its directory type and form
    pub fn decode(record: &ParameterRecord, entity_type: EntityType, form: i32) -> Result<Self> {
        let mut c = record.cursor();
        let entity = match entity_type {
            EntityType::CircularArc => Entity::CircularArc(CircularArc::read(&mut c)?),
            EntityType::CompositeCurve => Entity::CompositeCurve(CompositeCurve::read(&mut c)?),
            EntityType::ConicArc => Entity::ConicArc(ConicArc::read(&mut c)?),
            EntityType::CopiousData => Entity::CopiousData(CopiousData::read(&mut c, form)?),
            EntityType::Line => Entity::Line(Line::read(&mut c)?),
            EntityType::ParametricSpline => {
                Entity::ParametricSpline(ParametricSpline::read(&mut c)?)
            }
            EntityType::TransformationMatrix => {
                Entity::TransformationMatrix(TransformationMatrix::read(&mut c)?)
            }
            EntityType::RationalBSplineCurve => {
                Entity::RationalBSplineCurve(RationalBSplineCurve::read(&mut c)?)
            }
            EntityType::RationalBSplineSurface => {
                Entity::RationalBSplineSurface(RationalBSplineSurface::read(&mut c)?)
            }
            EntityType::Block => Entity::Block(Block::read(&mut c)?),
            EntityType::RightAngularWedge => Entity::Wedge(Wedge::read(&mut c)?),
            EntityType::RightCircularCylinder => Entity::Cylinder(Cylinder::read(&mut c)?),
            EntityType::RightCircularConeFrustum => {
                Entity::ConeFrustum(ConeFrustum::read(&mut c)?)
            }
            EntityType::Sphere => Entity::Sphere(Sphere::read(&mut c)?),
            EntityType::Torus => Entity::Torus(Torus::read(&mut c)?),
            EntityType::SolidOfRevolution => {
                Entity::SolidOfRevolution(SolidOfRevolution::read(&mut c)?)
            }
            EntityType::SolidOfLinearExtrusion => {
                Entity::SolidOfExtrusion(SolidOfExtrusion::read(&mut c)?)
            }
            EntityType::Ellipsoid => Entity::Ellipsoid(Ellipsoid::read(&mut c)?),
            EntityType::BooleanTree => Entity::BooleanTree(BooleanTree::read(&mut c)?),
            EntityType::SolidAssembly => Entity::SolidAssembly(SolidAssembly::read(&mut c)?),
            EntityType::ManifoldSolidBrep => Entity::ManifoldSolid(ManifoldSolid::read(&mut c)?),
            EntityType::Shell => Entity::Shell(Shell::read(&mut c)?),
            EntityType::Face => Entity::Face(Face::read(&mut c)?),
            EntityType::Loop => Entity::Loop(Loop::read(&mut c)?),
            EntityType::EdgeList => Entity::EdgeList(EdgeList::read(&mut c)?),
            EntityType::VertexList => Entity::VertexList(VertexList::read(&mut c)?),
            EntityType::ColorDefinition => Entity::ColorDefinition(ColorDefinition::read(&mut c)?),
            EntityType::AttributeTableDefinition if form == 0 => {
                Entity::AttributeDefinition(AttributeDefinition::read(&mut c)?)
            }
            EntityType::Property if form == 15 => {
                Entity::NameProperty(NameProperty::read(&mut c)?)
            }
            EntityType::SolidInstance => Entity::SolidInstance(SolidInstance::read(&mut c)?),
            other => Entity::Opaque(other),
        };

        let (associativities, properties) = match entity {
            // the optional name of a color definition makes the tail ambiguous
            Entity::Opaque(_) | Entity::ColorDefinition(_) => (Vec::new(), Vec::new()),
            _ => c.trailing_pointers().unwrap_or_default(),
        };

        Ok(Self {
            de: record.de,
            form,
            entity,
            associativities,
            properties,
        })
    }
}
