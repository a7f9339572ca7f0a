// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity transforms
//!
//! Most entities carry no transformation matrix. They all share
//! [`Transform::Identity`]; only entities with a type 124 pointer own a
//! matrix.

use nalgebra::{Matrix4, Point3, Vector3};

/// Placement of an entity in its parent's coordinate system
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Transform {
    /// No transformation
    #[default]
    Identity,
    /// Homogeneous matrix (rotation and translation, translation in mm)
    Matrix(Matrix4<f64>),
}

impl Transform {
    /// Wrap a matrix, collapsing an exact identity
    pub fn from_matrix(m: Matrix4<f64>) -> Self {
        if m == Matrix4::identity() {
            Transform::Identity
        } else {
            Transform::Matrix(m)
        }
    }

    /// Check if this is the identity
    pub fn is_identity(&self) -> bool {
        matches!(self, Transform::Identity)
    }

    /// The homogeneous matrix
    pub fn matrix(&self) -> Matrix4<f64> {
        match self {
            Transform::Identity => Matrix4::identity(),
            Transform::Matrix(m) => *m,
        }
    }

    /// `outer * inner`: apply `inner` first, then `outer`
    pub fn compose(outer: &Transform, inner: &Transform) -> Transform {
        match (outer, inner) {
            (Transform::Identity, Transform::Identity) => Transform::Identity,
            (Transform::Identity, t) | (t, Transform::Identity) => t.clone(),
            (Transform::Matrix(a), Transform::Matrix(b)) => Transform::from_matrix(a * b),
        }
    }

    /// Transform a point
    pub fn apply_point(&self, p: &Point3<f64>) -> Point3<f64> {
        match self {
            Transform::Identity => *p,
            Transform::Matrix(m) => m.transform_point(p),
        }
    }

    /// Transform a direction (rotation part only)
    pub fn apply_vector(&self, v: &Vector3<f64>) -> Vector3<f64> {
        match self {
            Transform::Identity => *v,
            Transform::Matrix(m) => m.transform_vector(v),
        }
    }

    /// Row-major 16 element array, `None` for the identity
    pub fn to_row_major(&self) -> Option<[f64; 16]> {
        match self {
            Transform::Identity => None,
            Transform::Matrix(m) => {
                let mut out = [0.0; 16];
                for row in 0..4 {
                    for col in 0..4 {
                        out[row * 4 + col] = m[(row, col)];
                    }
                }
                Some(out)
            }
        }
    }
}
