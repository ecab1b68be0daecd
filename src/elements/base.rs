//! Shared element utilities: direction cosines, corner angles, B-matrix products

use crate::elements::Material;
use crate::error::{FemError, FemResult};
use crate::math::{rotate_block, Mat, Mat3, SymmetricTensor3, TensorKind, Vec3};

/// Geometry and material handed to an element formulation
#[derive(Debug, Clone, Copy)]
pub struct ElementInput<'a> {
    /// Node positions in element node order
    pub coords: &'a [Vec3],
    /// Resolved material (constitutive matrices must be built)
    pub material: &'a Material,
    /// Shell thickness (ignored by solids)
    pub thickness: f64,
}

/// Strain, stress and strain energy density at one point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointFields {
    pub strain: SymmetricTensor3,
    pub stress: SymmetricTensor3,
    pub energy: f64,
}

impl PointFields {
    pub fn zero() -> Self {
        Self {
            strain: SymmetricTensor3::zero(),
            stress: SymmetricTensor3::zero(),
            energy: 0.0,
        }
    }

    /// Build from engineering strain and stress vectors in [xx, yy, zz, xy, yz, zx] order
    pub fn from_vectors(strain: &[f64; 6], stress: &[f64; 6]) -> Self {
        let energy = 0.5 * strain.iter().zip(stress).map(|(e, s)| e * s).sum::<f64>();
        Self {
            strain: SymmetricTensor3::from_vector(TensorKind::Strain, strain),
            stress: SymmetricTensor3::from_vector(TensorKind::Stress, stress),
            energy,
        }
    }

    pub fn add(&mut self, other: &PointFields) {
        self.strain.add(&other.strain);
        self.stress.add(&other.stress);
        self.energy += other.energy;
    }

    pub fn scale(&mut self, a: f64) {
        self.strain.scale(a);
        self.stress.scale(a);
        self.energy *= a;
    }

    /// Rotate tensors from the frame whose rows are `d` to global
    pub fn rotated(&self, d: &Mat3) -> Self {
        Self {
            strain: self.strain.rotate(d),
            stress: self.stress.rotate(d),
            energy: self.energy,
        }
    }
}

/// Fields on the two result layers.
///
/// Shells carry the top (ζ = +1) surface in `top` and the bottom
/// (ζ = -1) surface in `bottom`; solids carry the same values in both.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerFields {
    pub top: PointFields,
    pub bottom: PointFields,
}

impl LayerFields {
    pub fn zero() -> Self {
        Self {
            top: PointFields::zero(),
            bottom: PointFields::zero(),
        }
    }

    pub fn uniform(fields: PointFields) -> Self {
        Self { top: fields, bottom: fields }
    }

    pub fn add(&mut self, other: &LayerFields) {
        self.top.add(&other.top);
        self.bottom.add(&other.bottom);
    }

    pub fn scale(&mut self, a: f64) {
        self.top.scale(a);
        self.bottom.scale(a);
    }
}

/// Direction cosine matrix of an element surface.
///
/// Rows are the local axes in global coordinates: x along the first
/// edge, z along the surface normal, y = z × x.
pub fn dir_matrix(p0: &Vec3, p1: &Vec3, normal: &Vec3) -> FemResult<Mat3> {
    let ex = p1 - p0;
    let len_x = ex.norm();
    let len_z = normal.norm();
    if len_x <= f64::EPSILON || len_z <= f64::EPSILON {
        return Err(FemError::InvalidGeometry("degenerate element surface".to_string()));
    }
    let ez = normal / len_z;
    // Project the edge into the surface plane for warped quads
    let ex = ex - ez * ex.dot(&ez);
    let ex = ex / ex.norm();
    let ey = ez.cross(&ex);

    Ok(Mat3::new(
        ex[0], ex[1], ex[2],
        ey[0], ey[1], ey[2],
        ez[0], ez[1], ez[2],
    ))
}

/// Unnormalized normal of a polygonal face (Newell's method)
pub fn face_normal(points: &[Vec3]) -> Vec3 {
    let mut n = Vec3::zeros();
    for i in 0..points.len() {
        let a = &points[i];
        let b = &points[(i + 1) % points.len()];
        n += a.cross(b);
    }
    n * 0.5
}

/// Arithmetic mean of a point set
pub fn centroid(points: &[Vec3]) -> Vec3 {
    let sum = points.iter().fold(Vec3::zeros(), |acc, p| acc + p);
    sum / points.len().max(1) as f64
}

/// Planar angle at `at` between the edges towards `prev` and `next`
pub fn planar_angle(prev: &Vec3, at: &Vec3, next: &Vec3) -> f64 {
    let a = prev - at;
    let b = next - at;
    a.cross(&b).norm().atan2(a.dot(&b))
}

/// Solid angle subtended at `at` by the trihedral spanned by three edges
pub fn solid_angle(at: &Vec3, p1: &Vec3, p2: &Vec3, p3: &Vec3) -> f64 {
    let a = p1 - at;
    let b = p2 - at;
    let c = p3 - at;
    let (la, lb, lc) = (a.norm(), b.norm(), c.norm());
    let numer = a.dot(&b.cross(&c)).abs();
    let denom = la * lb * lc + a.dot(&b) * lc + a.dot(&c) * lb + b.dot(&c) * la;
    2.0 * numer.atan2(denom)
}

/// Accumulate `coef · Bᵀ D B` into `k`
pub fn stiff_part(k: &mut Mat, b: &Mat, d: &Mat, coef: f64) {
    let db = d * b;
    k.gemm_tr(coef, b, &db, 1.0);
}

/// Rotate an element matrix from the local frame `d` to global,
/// 3x3 block by block: Kg = dᵀ Kl d
pub fn rotate_to_global(k: &Mat, d: &Mat3) -> Mat {
    let blocks = k.nrows() / 3;
    let mut out = Mat::zeros(k.nrows(), k.ncols());
    for bi in 0..blocks {
        for bj in 0..blocks {
            let block: Mat3 = k.fixed_view::<3, 3>(3 * bi, 3 * bj).into_owned();
            out.fixed_view_mut::<3, 3>(3 * bi, 3 * bj)
                .copy_from(&rotate_block(&block, d));
        }
    }
    out
}

/// Express nodal 6-vectors in the local frame `d` (rows = local axes)
pub fn to_local_displacements(disp: &[[f64; 6]], d: &Mat3) -> Vec<[f64; 6]> {
    disp.iter()
        .map(|u| {
            let t = d * Vec3::new(u[0], u[1], u[2]);
            let r = d * Vec3::new(u[3], u[4], u[5]);
            [t[0], t[1], t[2], r[0], r[1], r[2]]
        })
        .collect()
}
