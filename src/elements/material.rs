//! Material properties and constitutive matrices

use serde::{Deserialize, Serialize};

use crate::error::{FemError, FemResult};
use crate::math::{Mat5, Mat6};

/// Shear correction factor for transverse shear in shells
pub const SHEAR_CORRECTION: f64 = 5.0 / 6.0;

/// Constitutive (stress-strain) matrices derived from a material
#[derive(Debug, Clone, PartialEq)]
pub struct ConstitutiveMatrices {
    /// 6x6 isotropic matrix, strain order [xx, yy, zz, xy, yz, zx]
    pub solid: Mat6,
    /// 5x5 shell matrix, strain order [xx, yy, xy, yz, zx]
    pub shell: Mat5,
}

/// Isotropic linear elastic material
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    /// Material label
    pub label: i64,
    /// Modulus of elasticity (Young's modulus)
    pub e: f64,
    /// Poisson's ratio
    pub nu: f64,
    /// Shear modulus, derived as E / (2 (1 + nu))
    pub g: f64,
    /// Density
    pub density: f64,
    /// Thermal conductivity
    pub conductivity: f64,
    /// Specific heat
    pub specific_heat: f64,

    /// Cached constitutive matrices, built once all materials are known
    #[serde(skip)]
    matrices: Option<ConstitutiveMatrices>,
}

impl Material {
    /// Create a new material; the shear modulus is derived from E and nu
    pub fn new(label: i64, e: f64, nu: f64, density: f64, conductivity: f64, specific_heat: f64) -> Self {
        Self {
            label,
            e,
            nu,
            g: 0.5 * e / (1.0 + nu),
            density,
            conductivity,
            specific_heat,
            matrices: None,
        }
    }

    /// Unit material used when a model defines none
    pub fn unit() -> Self {
        Self::new(1, 1.0, 0.0, 1.0, 1.0, 1.0)
    }

    /// Create a standard structural steel (SI units)
    pub fn steel(label: i64) -> Self {
        Self::new(label, 210e9, 0.3, 7850.0, 53.0, 460.0)
    }

    /// 3D isotropic constitutive matrix in Lamé form
    pub fn matrix_3d(&self) -> Mat6 {
        let lambda = self.e * self.nu / ((1.0 + self.nu) * (1.0 - 2.0 * self.nu));
        let mu = self.g;
        let a = lambda + 2.0 * mu;

        let mut d = Mat6::zeros();
        for i in 0..3 {
            for j in 0..3 {
                d[(i, j)] = if i == j { a } else { lambda };
            }
            d[(i + 3, i + 3)] = mu;
        }
        d
    }

    /// Shell constitutive matrix: plane stress plus corrected transverse shear
    pub fn matrix_shell(&self) -> Mat5 {
        let k1 = self.e / (1.0 - self.nu * self.nu);
        let k2 = self.nu * k1;
        let ks = SHEAR_CORRECTION * self.g;

        let mut d = Mat5::zeros();
        d[(0, 0)] = k1;
        d[(0, 1)] = k2;
        d[(1, 0)] = k2;
        d[(1, 1)] = k1;
        d[(2, 2)] = self.g;
        d[(3, 3)] = ks;
        d[(4, 4)] = ks;
        d
    }

    /// Build and cache the constitutive matrices
    pub fn build_matrices(&mut self) {
        self.matrices = Some(ConstitutiveMatrices {
            solid: self.matrix_3d(),
            shell: self.matrix_shell(),
        });
    }

    /// Cached constitutive matrices
    pub fn matrices(&self) -> FemResult<&ConstitutiveMatrices> {
        self.matrices.as_ref().ok_or(FemError::NotInitialized)
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::unit()
    }
}
