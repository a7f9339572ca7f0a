// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Output database object model
//!
//! Converted entities become named [`Solid`]s and [`Combination`]s handed to
//! a [`GeometryWriter`]. Coordinates are millimetres; matrices are row-major.

use crate::BrlcadAttributes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A point or vector in millimetres
pub type Vec3 = [f64; 3];

/// Errors raised by a database writer
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DbError {
    /// Object names are unique within a database
    #[error("Object '{0}' already exists")]
    Duplicate(String),

    /// Writer-specific failure
    #[error("Database write failed: {0}")]
    Write(String),
}

/// One NURBS surface of a combined NURBS object
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NurbsSurface {
    /// Order (degree + 1) in u and v
    pub order: [usize; 2],
    pub u_knots: Vec<f64>,
    pub v_knots: Vec<f64>,
    /// Control net size in u and v
    pub size: [usize; 2],
    /// Homogeneous control points `[x*w, y*w, z*w, w]`, u varying fastest
    pub control_points: Vec<[f64; 4]>,
    /// Whether all control points lie in one plane
    pub planar: bool,
}

/// A polygonal face: outer loop followed by holes, as vertex indices
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct PolyFace {
    pub loops: Vec<Vec<usize>>,
}

/// A closed shell of faces
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct PolyShell {
    pub faces: Vec<PolyFace>,
    /// Void shells bound empty space inside the outer shell
    pub void: bool,
}

/// Polyhedral B-rep with a vertex table shared by all shells
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct PolyShellSet {
    pub vertices: Vec<Vec3>,
    pub shells: Vec<PolyShell>,
}

impl PolyShellSet {
    /// Total number of faces across shells
    pub fn face_count(&self) -> usize {
        self.shells.iter().map(|s| s.faces.len()).sum()
    }
}

/// Primitive and boundary solids
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Solid {
    Torus {
        center: Vec3,
        normal: Vec3,
        r1: f64,
        r2: f64,
    },
    /// Ellipsoid with semi-axis vectors
    Ellipsoid { center: Vec3, a: Vec3, b: Vec3, c: Vec3 },
    Sphere { center: Vec3, radius: f64 },
    /// Eight-vertex polyhedron; vertices 0-3 bottom face, 4-7 top face
    Arb8 { points: [Vec3; 8] },
    /// Right circular cylinder
    Rcc {
        base: Vec3,
        height: Vec3,
        radius: f64,
    },
    /// Truncated right cone
    Trc {
        base: Vec3,
        height: Vec3,
        r_base: f64,
        r_top: f64,
    },
    Polyhedron(PolyShellSet),
    Nurbs(Vec<NurbsSurface>),
}

impl Solid {
    /// Short kind label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Solid::Torus { .. } => "tor",
            Solid::Ellipsoid { .. } => "ell",
            Solid::Sphere { .. } => "sph",
            Solid::Arb8 { .. } => "arb8",
            Solid::Rcc { .. } => "rcc",
            Solid::Trc { .. } => "trc",
            Solid::Polyhedron(_) => "nmg",
            Solid::Nurbs(_) => "nurb",
        }
    }
}

/// Boolean operation of a combination member
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoolOp {
    Union,
    Intersect,
    Subtract,
}

impl BoolOp {
    /// Operator symbol as used in combination listings
    pub fn symbol(self) -> char {
        match self {
            BoolOp::Union => 'u',
            BoolOp::Intersect => '+',
            BoolOp::Subtract => '-',
        }
    }
}

/// A reference from a combination to another object
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    pub op: BoolOp,
    /// Row-major placement matrix, `None` for identity
    pub matrix: Option<[f64; 16]>,
}

impl Member {
    /// Member without a placement matrix
    pub fn new(name: impl Into<String>, op: BoolOp) -> Self {
        Self {
            name: name.into(),
            op,
            matrix: None,
        }
    }

    /// Set the placement matrix
    pub fn with_matrix(mut self, matrix: Option<[f64; 16]>) -> Self {
        self.matrix = matrix;
        self
    }
}

/// A group or region built from members
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct Combination {
    pub region: bool,
    pub members: Vec<Member>,
    pub attributes: Option<BrlcadAttributes>,
    pub rgb: Option<[u8; 3]>,
}

impl Combination {
    /// Plain group of members
    pub fn group(members: Vec<Member>) -> Self {
        Self {
            members,
            ..Default::default()
        }
    }
}

/// Sink for converted objects
///
/// Implementations must reject a second object with an existing name.
pub trait GeometryWriter {
    /// Database title and length units
    fn write_header(&mut self, title: &str, units: &str) -> Result<(), DbError>;

    /// Store a primitive or boundary solid
    fn write_solid(&mut self, name: &str, solid: Solid) -> Result<(), DbError>;

    /// Store a combination
    fn write_combination(&mut self, name: &str, comb: Combination) -> Result<(), DbError>;

    /// Check if an object with this name was written
    fn contains(&self, name: &str) -> bool;
}
