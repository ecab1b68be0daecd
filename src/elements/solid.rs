//! 8-node hexahedron (trilinear brick) with 3 translational DOF per node
//!
//! Node numbering, natural coordinates in [-1, 1]³:
//! ```text
//!        7-------6
//!       /|      /|
//!      4-------5 |
//!      | 3-----|-2
//!      |/      |/
//!      0-------1
//! ```
//! Strain components are ordered [xx, yy, zz, xy, yz, zx] with
//! engineering shear.

use crate::elements::base::{solid_angle, stiff_part, ElementInput, LayerFields, PointFields};
use crate::elements::ElementFormulation;
use crate::error::{FemError, FemResult};
use crate::math::gauss::hexa_points;
use crate::math::{Mat, Mat3, Vec3};

const XI: [f64; 8] = [-1.0, 1.0, 1.0, -1.0, -1.0, 1.0, 1.0, -1.0];
const ETA: [f64; 8] = [-1.0, -1.0, 1.0, 1.0, -1.0, -1.0, 1.0, 1.0];
const ZETA: [f64; 8] = [-1.0, -1.0, -1.0, -1.0, 1.0, 1.0, 1.0, 1.0];

/// Border faces, wound so that the normal points out of the element
const FACES: [&[usize]; 6] = [
    &[0, 3, 2, 1],
    &[4, 5, 6, 7],
    &[0, 1, 5, 4],
    &[1, 2, 6, 5],
    &[2, 3, 7, 6],
    &[3, 0, 4, 7],
];

/// Edge neighbours of each corner, ordered right-handed around the outward direction
const NEIGHBOURS: [[usize; 3]; 8] = [
    [1, 3, 4],
    [2, 0, 5],
    [3, 1, 6],
    [0, 2, 7],
    [7, 5, 0],
    [4, 6, 1],
    [5, 7, 2],
    [6, 4, 3],
];

/// Node permutation that reverses the winding (bottom and top swapped)
const MIRROR: [usize; 8] = [4, 5, 6, 7, 0, 1, 2, 3];

const MIN_DET: f64 = 1e-300;

/// 8-node hexahedral solid
#[derive(Debug, Clone, Copy, Default)]
pub struct Hexa8;

impl Hexa8 {
    /// Shape function values
    pub fn shape(xi: f64, eta: f64, zeta: f64) -> [f64; 8] {
        let mut n = [0.0; 8];
        for i in 0..8 {
            n[i] = 0.125 * (1.0 + XI[i] * xi) * (1.0 + ETA[i] * eta) * (1.0 + ZETA[i] * zeta);
        }
        n
    }

    /// Shape function derivatives, rows are d/dξ, d/dη, d/dζ
    pub fn shape_derivatives(xi: f64, eta: f64, zeta: f64) -> [[f64; 8]; 3] {
        let mut dn = [[0.0; 8]; 3];
        for i in 0..8 {
            let a = 1.0 + XI[i] * xi;
            let b = 1.0 + ETA[i] * eta;
            let c = 1.0 + ZETA[i] * zeta;
            dn[0][i] = 0.125 * XI[i] * b * c;
            dn[1][i] = 0.125 * a * ETA[i] * c;
            dn[2][i] = 0.125 * a * b * ZETA[i];
        }
        dn
    }

    /// Jacobian, J[r][c] = d(x_c)/d(ξ_r)
    pub fn jacobian(coords: &[Vec3], dn: &[[f64; 8]; 3]) -> Mat3 {
        let mut j = Mat3::zeros();
        for (i, p) in coords.iter().enumerate().take(8) {
            for r in 0..3 {
                for c in 0..3 {
                    j[(r, c)] += dn[r][i] * p[c];
                }
            }
        }
        j
    }

    /// Cartesian shape gradients and Jacobian determinant at a point
    fn gradients(coords: &[Vec3], xi: f64, eta: f64, zeta: f64) -> FemResult<([[f64; 8]; 3], f64)> {
        let dn = Self::shape_derivatives(xi, eta, zeta);
        let j = Self::jacobian(coords, &dn);
        let det = j.determinant();
        if det.abs() < MIN_DET {
            return Err(FemError::InvalidGeometry("zero hexahedron Jacobian".to_string()));
        }
        let j_inv = j
            .try_inverse()
            .ok_or_else(|| FemError::InvalidGeometry("singular hexahedron Jacobian".to_string()))?;

        let mut grad = [[0.0; 8]; 3];
        for i in 0..8 {
            let local = Vec3::new(dn[0][i], dn[1][i], dn[2][i]);
            let g = j_inv * local;
            grad[0][i] = g[0];
            grad[1][i] = g[1];
            grad[2][i] = g[2];
        }
        Ok((grad, det))
    }

    /// 6x24 strain-displacement matrix
    pub fn strain_matrix(grad: &[[f64; 8]; 3]) -> Mat {
        let mut b = Mat::zeros(6, 24);
        for i in 0..8 {
            let c = 3 * i;
            let (dx, dy, dz) = (grad[0][i], grad[1][i], grad[2][i]);
            b[(0, c)] = dx;
            b[(1, c + 1)] = dy;
            b[(2, c + 2)] = dz;
            b[(3, c)] = dy;
            b[(3, c + 1)] = dx;
            b[(4, c + 1)] = dz;
            b[(4, c + 2)] = dy;
            b[(5, c)] = dz;
            b[(5, c + 2)] = dx;
        }
        b
    }

    fn fields_at(input: &ElementInput, disp: &[[f64; 6]], xi: f64, eta: f64, zeta: f64) -> FemResult<PointFields> {
        let d = &input.material.matrices()?.solid;
        let (grad, _) = Self::gradients(input.coords, xi, eta, zeta)?;

        let mut strain = [0.0; 6];
        for i in 0..8 {
            let (u, v, w) = (disp[i][0], disp[i][1], disp[i][2]);
            let (dx, dy, dz) = (grad[0][i], grad[1][i], grad[2][i]);
            strain[0] += dx * u;
            strain[1] += dy * v;
            strain[2] += dz * w;
            strain[3] += dy * u + dx * v;
            strain[4] += dz * v + dy * w;
            strain[5] += dz * u + dx * w;
        }
        let mut stress = [0.0; 6];
        for (r, s) in stress.iter_mut().enumerate() {
            *s = (0..6).map(|c| d[(r, c)] * strain[c]).sum();
        }
        Ok(PointFields::from_vectors(&strain, &stress))
    }
}

impl ElementFormulation for Hexa8 {
    fn node_count(&self) -> usize {
        8
    }

    fn dof_per_node(&self) -> usize {
        3
    }

    fn is_shell(&self) -> bool {
        false
    }

    fn border_faces(&self) -> &'static [&'static [usize]] {
        &FACES
    }

    fn mirror(&self, nodes: &mut [usize]) {
        let original = nodes.to_vec();
        for (i, &m) in MIRROR.iter().enumerate() {
            nodes[i] = original[m];
        }
    }

    fn stiffness(&self, input: &ElementInput) -> FemResult<Mat> {
        let d: Mat = Mat::from_iterator(6, 6, input.material.matrices()?.solid.iter().copied());
        let mut k = Mat::zeros(24, 24);
        for gp in hexa_points() {
            let (grad, det) = Self::gradients(input.coords, gp.xi, gp.eta, gp.zeta)?;
            let b = Self::strain_matrix(&grad);
            stiff_part(&mut k, &b, &d, det.abs() * gp.weight);
        }
        Ok(k)
    }

    fn mass(&self, input: &ElementInput) -> FemResult<Mat> {
        let rho = input.material.density;
        let mut m = Mat::zeros(24, 24);
        for gp in hexa_points() {
            let n = Self::shape(gp.xi, gp.eta, gp.zeta);
            let dn = Self::shape_derivatives(gp.xi, gp.eta, gp.zeta);
            let det = Self::jacobian(input.coords, &dn).determinant().abs();
            let coef = rho * det * gp.weight;
            for i in 0..8 {
                for j in 0..8 {
                    let mij = coef * n[i] * n[j];
                    for c in 0..3 {
                        m[(3 * i + c, 3 * j + c)] += mij;
                    }
                }
            }
        }
        Ok(m)
    }

    fn element_fields(&self, input: &ElementInput, disp: &[[f64; 6]]) -> FemResult<LayerFields> {
        let points = hexa_points();
        let mut sum = PointFields::zero();
        for gp in &points {
            sum.add(&Self::fields_at(input, disp, gp.xi, gp.eta, gp.zeta)?);
        }
        sum.scale(1.0 / points.len() as f64);
        Ok(LayerFields::uniform(sum))
    }

    fn nodal_fields(&self, input: &ElementInput, disp: &[[f64; 6]]) -> FemResult<Vec<LayerFields>> {
        (0..8)
            .map(|i| Self::fields_at(input, disp, XI[i], ETA[i], ZETA[i]).map(LayerFields::uniform))
            .collect()
    }

    fn corner_angles(&self, coords: &[Vec3]) -> Vec<f64> {
        NEIGHBOURS
            .iter()
            .enumerate()
            .map(|(i, nb)| solid_angle(&coords[i], &coords[nb[0]], &coords[nb[1]], &coords[nb[2]]))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::Material;
    use approx::assert_relative_eq;

    fn unit_cube() -> Vec<Vec3> {
        (0..8)
            .map(|i| Vec3::new(0.5 * (XI[i] + 1.0), 0.5 * (ETA[i] + 1.0), 0.5 * (ZETA[i] + 1.0)))
            .collect()
    }

    fn material() -> Material {
        let mut mat = Material::new(1, 1000.0, 0.3, 2.0, 1.0, 1.0);
        mat.build_matrices();
        mat
    }

    #[test]
    fn test_partition_of_unity() {
        let n = Hexa8::shape(0.3, -0.2, 0.7);
        assert_relative_eq!(n.iter().sum::<f64>(), 1.0, epsilon = 1e-14);
    }

    #[test]
    fn test_stiffness_symmetric_with_rigid_modes() {
        let coords = unit_cube();
        let mat = material();
        let input = ElementInput { coords: &coords, material: &mat, thickness: 0.0 };
        let k = Hexa8.stiffness(&input).unwrap();
        assert_relative_eq!(k.clone(), k.transpose(), epsilon = 1e-9);

        // Rigid translation along x produces no forces
        let mut u = crate::math::Vec::zeros(24);
        for i in 0..8 {
            u[3 * i] = 1.0;
        }
        assert!((&k * &u).norm() < 1e-9);
    }

    #[test]
    fn test_mass_sums_to_total() {
        let coords = unit_cube();
        let mat = material();
        let input = ElementInput { coords: &coords, material: &mat, thickness: 0.0 };
        let m = Hexa8.mass(&input).unwrap();
        let mut total = 0.0;
        for i in 0..8 {
            for j in 0..8 {
                total += m[(3 * i, 3 * j)];
            }
        }
        assert_relative_eq!(total, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_uniform_strain_recovered() {
        let coords = unit_cube();
        let mat = material();
        let input = ElementInput { coords: &coords, material: &mat, thickness: 0.0 };
        // u = 0.01 x
        let disp: Vec<[f64; 6]> = coords.iter().map(|p| [0.01 * p[0], 0.0, 0.0, 0.0, 0.0, 0.0]).collect();

        let fields = Hexa8.element_fields(&input, &disp).unwrap();
        assert_relative_eq!(fields.top.strain.xx, 0.01, epsilon = 1e-12);
        assert_eq!(fields.top, fields.bottom);

        let d = mat.matrices().unwrap().solid;
        assert_relative_eq!(fields.top.stress.xx, d[(0, 0)] * 0.01, epsilon = 1e-9);
        assert_relative_eq!(fields.top.energy, 0.5 * d[(0, 0)] * 1e-4, epsilon = 1e-12);

        let nodal = Hexa8.nodal_fields(&input, &disp).unwrap();
        assert_eq!(nodal.len(), 8);
        assert_relative_eq!(nodal[6].top.strain.xx, 0.01, epsilon = 1e-12);
    }

    #[test]
    fn test_corner_angles_and_mirror() {
        let coords = unit_cube();
        for a in Hexa8.corner_angles(&coords) {
            assert_relative_eq!(a, std::f64::consts::FRAC_PI_2, epsilon = 1e-12);
        }
        let mut nodes: Vec<usize> = (10..18).collect();
        Hexa8.mirror(&mut nodes);
        assert_eq!(nodes, vec![14, 15, 16, 17, 10, 11, 12, 13]);
    }
}
