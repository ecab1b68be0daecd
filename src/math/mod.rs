//! Mathematical utilities for FEM calculations

pub mod gauss;
pub mod sparse;
pub mod tensor;

use nalgebra::{DMatrix, DVector, Matrix3, Matrix6, SMatrix, Vector3};

// Re-export sparse utilities
pub use sparse::{solve_pcg, sparse_matvec, FillIn, PcgOutcome, SparseLu, SparseRow, SparseRowMatrix};
pub use tensor::{eigen_jacobi, SymmetricTensor3, TensorKind};

pub type Mat = DMatrix<f64>;
pub type Vec = DVector<f64>;
pub type Mat3 = Matrix3<f64>;
pub type Mat6 = Matrix6<f64>;
pub type Vec3 = Vector3<f64>;

/// 5x5 constitutive matrix for shells (plane stress + transverse shear)
pub type Mat5 = SMatrix<f64, 5, 5>;

/// Congruent rotation of a 3x3 stiffness block: dᵀ·K·d
pub fn rotate_block(k: &Mat3, d: &Mat3) -> Mat3 {
    d.transpose() * k * d
}
