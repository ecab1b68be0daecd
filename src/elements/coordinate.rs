//! Local coordinate frames for restraints and loads

use serde::{Deserialize, Serialize};

use crate::math::{Mat3, Vec3};

/// Orthonormal local frame.
///
/// The columns of `matrix` are the local axes expressed in global
/// coordinates, so `global = matrix * local`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinateFrame {
    /// Frame label
    pub label: i64,
    /// Rotation from local to global components
    pub matrix: Mat3,
}

impl CoordinateFrame {
    /// Create a frame from the nine matrix components, row by row
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        label: i64,
        n11: f64, n12: f64, n13: f64,
        n21: f64, n22: f64, n23: f64,
        n31: f64, n32: f64, n33: f64,
    ) -> Self {
        Self {
            label,
            matrix: Mat3::new(n11, n12, n13, n21, n22, n23, n31, n32, n33),
        }
    }

    /// Create a frame from a rotation matrix
    pub fn from_matrix(label: i64, matrix: Mat3) -> Self {
        Self { label, matrix }
    }

    /// Global frame
    pub fn identity(label: i64) -> Self {
        Self::from_matrix(label, Mat3::identity())
    }

    /// Rotation by `angle` radians about the global Z axis
    pub fn rotation_z(label: i64, angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::new(label, c, -s, 0.0, s, c, 0.0, 0.0, 0.0, 1.0)
    }

    /// Convert local vector components to global
    pub fn to_global(&self, v: &Vec3) -> Vec3 {
        self.matrix * v
    }

    /// Convert global vector components to local
    pub fn to_local(&self, v: &Vec3) -> Vec3 {
        self.matrix.transpose() * v
    }

    /// Convert a translation+rotation 6-vector from local to global
    pub fn to_global6(&self, v: &[f64; 6]) -> [f64; 6] {
        let t = self.to_global(&Vec3::new(v[0], v[1], v[2]));
        let r = self.to_global(&Vec3::new(v[3], v[4], v[5]));
        [t[0], t[1], t[2], r[0], r[1], r[2]]
    }

    /// Convert a translation+rotation 6-vector from global to local
    pub fn to_local6(&self, v: &[f64; 6]) -> [f64; 6] {
        let t = self.to_local(&Vec3::new(v[0], v[1], v[2]));
        let r = self.to_local(&Vec3::new(v[3], v[4], v[5]));
        [t[0], t[1], t[2], r[0], r[1], r[2]]
    }

    /// Check orthonormality within a tolerance
    pub fn is_orthonormal(&self, tol: f64) -> bool {
        let p = self.matrix.transpose() * self.matrix;
        (p - Mat3::identity()).abs().max() <= tol
    }
}
