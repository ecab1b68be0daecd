//! Symmetric 3x3 tensors for strain and stress
//!
//! Strain and stress share one value type. The only difference is how
//! engineering vectors are read: strain vectors carry engineering shear
//! (γ = 2ε), which is halved when the tensor is built.

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

/// Maximum number of Jacobi sweeps before giving up on further rotation
const JACOBI_MAX_SWEEPS: usize = 50;

/// Physical meaning of a tensor's engineering vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TensorKind {
    /// Engineering shear components are stored halved
    Strain,
    /// Shear components are stored as given
    Stress,
}

/// Symmetric 3x3 tensor with six independent components
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SymmetricTensor3 {
    pub xx: f64,
    pub yy: f64,
    pub zz: f64,
    pub xy: f64,
    pub yz: f64,
    pub zx: f64,
}

impl SymmetricTensor3 {
    /// Create a tensor from its tensor components
    pub fn new(xx: f64, yy: f64, zz: f64, xy: f64, yz: f64, zx: f64) -> Self {
        Self { xx, yy, zz, xy, yz, zx }
    }

    /// Zero tensor
    pub fn zero() -> Self {
        Self::default()
    }

    /// Build a tensor from an engineering vector [xx, yy, zz, xy, yz, zx]
    pub fn from_vector(kind: TensorKind, v: &[f64; 6]) -> Self {
        let f = match kind {
            TensorKind::Strain => 0.5,
            TensorKind::Stress => 1.0,
        };
        Self::new(v[0], v[1], v[2], f * v[3], f * v[4], f * v[5])
    }

    /// Tensor components as [xx, yy, zz, xy, yz, zx]
    pub fn as_array(&self) -> [f64; 6] {
        [self.xx, self.yy, self.zz, self.xy, self.yz, self.zx]
    }

    /// Build from a (symmetric) 3x3 matrix, averaging off-diagonal pairs
    pub fn from_matrix(m: &Matrix3<f64>) -> Self {
        Self::new(
            m[(0, 0)],
            m[(1, 1)],
            m[(2, 2)],
            0.5 * (m[(0, 1)] + m[(1, 0)]),
            0.5 * (m[(1, 2)] + m[(2, 1)]),
            0.5 * (m[(2, 0)] + m[(0, 2)]),
        )
    }

    pub fn to_matrix(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.xx, self.xy, self.zx,
            self.xy, self.yy, self.yz,
            self.zx, self.yz, self.zz,
        )
    }

    /// Add another tensor component-wise
    pub fn add(&mut self, other: &SymmetricTensor3) {
        self.xx += other.xx;
        self.yy += other.yy;
        self.zz += other.zz;
        self.xy += other.xy;
        self.yz += other.yz;
        self.zx += other.zx;
    }

    /// Multiply every component by a scalar
    pub fn scale(&mut self, a: f64) {
        self.xx *= a;
        self.yy *= a;
        self.zz *= a;
        self.xy *= a;
        self.yz *= a;
        self.zx *= a;
    }

    /// Scaled copy
    pub fn scaled(&self, a: f64) -> Self {
        let mut t = *self;
        t.scale(a);
        t
    }

    /// Express a tensor given in a local frame in the global frame.
    ///
    /// `d` is a direction cosine matrix whose rows are the local axes
    /// in global coordinates, so the result is dᵀ·T·d.
    pub fn rotate(&self, d: &Matrix3<f64>) -> Self {
        let m = d.transpose() * self.to_matrix() * d;
        Self::from_matrix(&m)
    }

    /// Principal values in descending order
    pub fn principal(&self) -> [f64; 3] {
        let (values, _) = eigen_jacobi(&self.to_matrix());
        let mut p = [values[0], values[1], values[2]];
        p.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
        p
    }

    /// Von Mises equivalent value
    pub fn von_mises(&self) -> f64 {
        let dxy = self.xx - self.yy;
        let dyz = self.yy - self.zz;
        let dzx = self.zz - self.xx;
        let ss = 0.5 * (dxy * dxy + dyz * dyz + dzx * dzx);
        let tt = 3.0 * (self.xy * self.xy + self.yz * self.yz + self.zx * self.zx);
        (ss + tt).sqrt()
    }

    /// Maximum shear value (half the principal spread)
    pub fn max_shear(&self) -> f64 {
        let p = self.principal();
        0.5 * (p[0] - p[2])
    }
}

/// Jacobi eigenvalue decomposition of a symmetric 3x3 matrix.
///
/// Returns the eigenvalues and a matrix whose columns are the matching
/// unit eigenvectors. Cyclic sweeps run until the off-diagonal sum
/// vanishes relative to the diagonal.
pub fn eigen_jacobi(m: &Matrix3<f64>) -> (Vector3<f64>, Matrix3<f64>) {
    let mut a = *m;
    let mut v = Matrix3::identity();

    for _sweep in 0..JACOBI_MAX_SWEEPS {
        let off = a[(0, 1)].abs() + a[(1, 2)].abs() + a[(0, 2)].abs();
        let diag = a[(0, 0)].abs() + a[(1, 1)].abs() + a[(2, 2)].abs();
        if off <= f64::EPSILON * diag || off == 0.0 {
            break;
        }

        for (p, q) in [(0, 1), (0, 2), (1, 2)] {
            let apq = a[(p, q)];
            if apq == 0.0 {
                continue;
            }

            // Rotation angle that annihilates a[p][q]
            let theta = 0.5 * (a[(q, q)] - a[(p, p)]) / apq;
            let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
            let c = 1.0 / (t * t + 1.0).sqrt();
            let s = t * c;

            for k in 0..3 {
                let akp = a[(k, p)];
                let akq = a[(k, q)];
                a[(k, p)] = c * akp - s * akq;
                a[(k, q)] = s * akp + c * akq;
            }
            for k in 0..3 {
                let apk = a[(p, k)];
                let aqk = a[(q, k)];
                a[(p, k)] = c * apk - s * aqk;
                a[(q, k)] = s * apk + c * aqk;
            }
            for k in 0..3 {
                let vkp = v[(k, p)];
                let vkq = v[(k, q)];
                v[(k, p)] = c * vkp - s * vkq;
                v[(k, q)] = s * vkp + c * vkq;
            }
        }
    }

    (Vector3::new(a[(0, 0)], a[(1, 1)], a[(2, 2)]), v)
}
