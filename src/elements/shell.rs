//! Degenerated (Mindlin) shell elements: 4-node quad and 3-node triangle
//!
//! Each node carries [u, v, w, θx, θy, θz]. The element is formulated in
//! a local frame whose z axis is the surface normal, with
//!
//! ```text
//! u = Σ N (u + z θy),  v = Σ N (v - z θx),  w = Σ N w,  z = ζ t / 2
//! ```
//!
//! Strain components are ordered [xx, yy, xy, yz, zx]. Membrane and
//! bending terms use the full in-plane rule and two points through the
//! thickness; transverse shear is sampled at reduced points to avoid
//! shear locking. The in-plane rotation θz has no physical stiffness and
//! is stabilized by a small drilling spring.

use crate::elements::base::{
    dir_matrix, planar_angle, rotate_to_global, stiff_part, to_local_displacements, ElementInput,
    LayerFields, PointFields,
};
use crate::elements::ElementFormulation;
use crate::error::{FemError, FemResult};
use crate::math::gauss::{quad_points, quad_shear_points, thickness_points, tri_center_point, tri_points, GaussPoint};
use crate::math::{Mat, Mat3, Vec3};

/// Drilling stiffness per unit E·t·area
pub const DRILLING_COEF: f64 = 1e-4;

const QUAD_XI: [f64; 4] = [-1.0, 1.0, 1.0, -1.0];
const QUAD_ETA: [f64; 4] = [-1.0, -1.0, 1.0, 1.0];
const TRI_XI: [f64; 3] = [0.0, 1.0, 0.0];
const TRI_ETA: [f64; 3] = [0.0, 0.0, 1.0];

const QUAD_FACES: [&[usize]; 1] = [&[0, 1, 2, 3]];
const TRI_FACES: [&[usize]; 1] = [&[0, 1, 2]];

/// Shape definition of a shell surface
trait ShellShape {
    const NODES: usize;

    fn shape(xi: f64, eta: f64) -> Vec<f64>;

    /// Derivatives [dN/dξ, dN/dη] per node
    fn shape_derivatives(xi: f64, eta: f64) -> Vec<[f64; 2]>;

    fn node_natural(i: usize) -> (f64, f64);

    fn membrane_points() -> Vec<GaussPoint>;

    /// Sampling points for γyz and γzx
    fn shear_points() -> (Vec<GaussPoint>, Vec<GaussPoint>);

    fn surface_normal(coords: &[Vec3]) -> Vec3;
}

/// 4-node quadrilateral shell
#[derive(Debug, Clone, Copy, Default)]
pub struct QuadShell4;

/// 3-node triangular shell
#[derive(Debug, Clone, Copy, Default)]
pub struct TriShell3;

impl ShellShape for QuadShell4 {
    const NODES: usize = 4;

    fn shape(xi: f64, eta: f64) -> Vec<f64> {
        (0..4)
            .map(|i| 0.25 * (1.0 + QUAD_XI[i] * xi) * (1.0 + QUAD_ETA[i] * eta))
            .collect()
    }

    fn shape_derivatives(xi: f64, eta: f64) -> Vec<[f64; 2]> {
        (0..4)
            .map(|i| {
                [
                    0.25 * QUAD_XI[i] * (1.0 + QUAD_ETA[i] * eta),
                    0.25 * (1.0 + QUAD_XI[i] * xi) * QUAD_ETA[i],
                ]
            })
            .collect()
    }

    fn node_natural(i: usize) -> (f64, f64) {
        (QUAD_XI[i], QUAD_ETA[i])
    }

    fn membrane_points() -> Vec<GaussPoint> {
        quad_points().to_vec()
    }

    fn shear_points() -> (Vec<GaussPoint>, Vec<GaussPoint>) {
        // γzx is sampled at ξ = 0, γyz at η = 0
        let (zx, yz) = quad_shear_points();
        (yz.to_vec(), zx.to_vec())
    }

    fn surface_normal(coords: &[Vec3]) -> Vec3 {
        (coords[2] - coords[0]).cross(&(coords[3] - coords[1]))
    }
}

impl ShellShape for TriShell3 {
    const NODES: usize = 3;

    fn shape(xi: f64, eta: f64) -> Vec<f64> {
        vec![1.0 - xi - eta, xi, eta]
    }

    fn shape_derivatives(_xi: f64, _eta: f64) -> Vec<[f64; 2]> {
        vec![[-1.0, -1.0], [1.0, 0.0], [0.0, 1.0]]
    }

    fn node_natural(i: usize) -> (f64, f64) {
        (TRI_XI[i], TRI_ETA[i])
    }

    fn membrane_points() -> Vec<GaussPoint> {
        tri_points().to_vec()
    }

    fn shear_points() -> (Vec<GaussPoint>, Vec<GaussPoint>) {
        (vec![tri_center_point()], vec![tri_center_point()])
    }

    fn surface_normal(coords: &[Vec3]) -> Vec3 {
        (coords[1] - coords[0]).cross(&(coords[2] - coords[0]))
    }
}

/// Element surface expressed in its local frame
struct LocalGeometry {
    /// Rows are the local axes
    d: Mat3,
    /// In-plane local node coordinates
    xy: Vec<[f64; 2]>,
}

impl LocalGeometry {
    fn new<S: ShellShape>(coords: &[Vec3]) -> FemResult<Self> {
        let d = dir_matrix(&coords[0], &coords[1], &S::surface_normal(coords))?;
        let xy = coords
            .iter()
            .take(S::NODES)
            .map(|p| {
                let l = d * (p - coords[0]);
                [l[0], l[1]]
            })
            .collect();
        Ok(Self { d, xy })
    }

    /// Shape values, cartesian in-plane gradients and in-plane Jacobian determinant
    fn kinematics<S: ShellShape>(&self, xi: f64, eta: f64) -> FemResult<(Vec<f64>, Vec<[f64; 2]>, f64)> {
        let n = S::shape(xi, eta);
        let dn = S::shape_derivatives(xi, eta);

        let mut j = [[0.0; 2]; 2];
        for (dni, p) in dn.iter().zip(&self.xy) {
            for r in 0..2 {
                for c in 0..2 {
                    j[r][c] += dni[r] * p[c];
                }
            }
        }
        let det = j[0][0] * j[1][1] - j[0][1] * j[1][0];
        if det.abs() <= f64::EPSILON * f64::EPSILON {
            return Err(FemError::InvalidGeometry("zero shell Jacobian".to_string()));
        }
        let inv = [[j[1][1] / det, -j[0][1] / det], [-j[1][0] / det, j[0][0] / det]];
        let grad = dn
            .iter()
            .map(|g| {
                [
                    inv[0][0] * g[0] + inv[0][1] * g[1],
                    inv[1][0] * g[0] + inv[1][1] * g[1],
                ]
            })
            .collect();
        Ok((n, grad, det.abs()))
    }
}

/// Thickness-aware Jacobian determinant: the 3x3 Jacobian has (0, 0, t/2) as its third row
fn volume_det(area_det: f64, thickness: f64) -> f64 {
    area_det * 0.5 * thickness
}

/// 5 x 6n strain-displacement matrix at thickness coordinate `z`
fn strain_matrix(n: &[f64], grad: &[[f64; 2]], z: f64) -> Mat {
    let mut b = Mat::zeros(5, 6 * n.len());
    for (i, (&ni, g)) in n.iter().zip(grad).enumerate() {
        let c = 6 * i;
        let (dx, dy) = (g[0], g[1]);
        b[(0, c)] = dx;
        b[(0, c + 4)] = z * dx;
        b[(1, c + 1)] = dy;
        b[(1, c + 3)] = -z * dy;
        b[(2, c)] = dy;
        b[(2, c + 1)] = dx;
        b[(2, c + 3)] = -z * dx;
        b[(2, c + 4)] = z * dy;
        b[(3, c + 2)] = dy;
        b[(3, c + 3)] = -ni;
        b[(4, c + 2)] = dx;
        b[(4, c + 4)] = ni;
    }
    b
}

fn check_thickness(t: f64) -> FemResult<()> {
    if t > 0.0 && t.is_finite() {
        Ok(())
    } else {
        Err(FemError::InvalidGeometry(format!("shell thickness must be positive, got {t}")))
    }
}

fn shell_stiffness<S: ShellShape>(input: &ElementInput) -> FemResult<Mat> {
    let t = input.thickness;
    check_thickness(t)?;
    let geom = LocalGeometry::new::<S>(input.coords)?;
    let d5 = &input.material.matrices()?.shell;

    let mut d_mb = Mat::zeros(5, 5);
    for r in 0..3 {
        for c in 0..3 {
            d_mb[(r, c)] = d5[(r, c)];
        }
    }
    let mut d_yz = Mat::zeros(5, 5);
    d_yz[(3, 3)] = d5[(3, 3)];
    let mut d_zx = Mat::zeros(5, 5);
    d_zx[(4, 4)] = d5[(4, 4)];

    let size = 6 * S::NODES;
    let mut k = Mat::zeros(size, size);
    let mut area = 0.0;

    // Membrane and bending
    for gp in S::membrane_points() {
        let (n, grad, det) = geom.kinematics::<S>(gp.xi, gp.eta)?;
        area += det * gp.weight;
        for (zeta, wz) in thickness_points() {
            let b = strain_matrix(&n, &grad, 0.5 * zeta * t);
            stiff_part(&mut k, &b, &d_mb, volume_det(det, t) * gp.weight * wz);
        }
    }

    // Transverse shear, constant through the thickness
    let (yz_points, zx_points) = S::shear_points();
    for (points, d) in [(yz_points, &d_yz), (zx_points, &d_zx)] {
        for gp in points {
            let (n, grad, det) = geom.kinematics::<S>(gp.xi, gp.eta)?;
            let b = strain_matrix(&n, &grad, 0.0);
            stiff_part(&mut k, &b, d, volume_det(det, t) * 2.0 * gp.weight);
        }
    }

    let drill = DRILLING_COEF * input.material.e * t * area;
    for i in 0..S::NODES {
        k[(6 * i + 5, 6 * i + 5)] += drill;
    }

    Ok(rotate_to_global(&k, &geom.d))
}

fn shell_mass<S: ShellShape>(input: &ElementInput) -> FemResult<Mat> {
    let t = input.thickness;
    check_thickness(t)?;
    let geom = LocalGeometry::new::<S>(input.coords)?;
    let rho = input.material.density;
    let inertia = t * t / 12.0;

    let size = 6 * S::NODES;
    let mut m = Mat::zeros(size, size);
    for gp in S::membrane_points() {
        let (n, _, det) = geom.kinematics::<S>(gp.xi, gp.eta)?;
        let coef = rho * t * det * gp.weight;
        for i in 0..S::NODES {
            for j in 0..S::NODES {
                let mij = coef * n[i] * n[j];
                for c in 0..3 {
                    m[(6 * i + c, 6 * j + c)] += mij;
                }
                for c in 3..5 {
                    m[(6 * i + c, 6 * j + c)] += mij * inertia;
                }
            }
        }
    }
    Ok(rotate_to_global(&m, &geom.d))
}

fn fields_at<S: ShellShape>(
    input: &ElementInput,
    geom: &LocalGeometry,
    local_disp: &[[f64; 6]],
    xi: f64,
    eta: f64,
    zeta: f64,
) -> FemResult<PointFields> {
    let mat = input.material;
    let d5 = &mat.matrices()?.shell;
    let (n, grad, _) = geom.kinematics::<S>(xi, eta)?;
    let b = strain_matrix(&n, &grad, 0.5 * zeta * input.thickness);

    let mut e5 = [0.0; 5];
    for (r, e) in e5.iter_mut().enumerate() {
        for (i, u) in local_disp.iter().enumerate().take(S::NODES) {
            for c in 0..6 {
                *e += b[(r, 6 * i + c)] * u[c];
            }
        }
    }
    let mut s5 = [0.0; 5];
    for (r, s) in s5.iter_mut().enumerate() {
        *s = (0..5).map(|c| d5[(r, c)] * e5[c]).sum();
    }

    // Plane stress: the thickness strain follows from the in-plane strains
    let ezz = if mat.nu < 1.0 { -mat.nu / (1.0 - mat.nu) * (e5[0] + e5[1]) } else { 0.0 };
    let strain = [e5[0], e5[1], ezz, e5[2], e5[3], e5[4]];
    let stress = [s5[0], s5[1], 0.0, s5[2], s5[3], s5[4]];
    Ok(PointFields::from_vectors(&strain, &stress).rotated(&geom.d))
}

fn shell_layers<S: ShellShape>(
    input: &ElementInput,
    geom: &LocalGeometry,
    local_disp: &[[f64; 6]],
    xi: f64,
    eta: f64,
) -> FemResult<LayerFields> {
    Ok(LayerFields {
        top: fields_at::<S>(input, geom, local_disp, xi, eta, 1.0)?,
        bottom: fields_at::<S>(input, geom, local_disp, xi, eta, -1.0)?,
    })
}

fn shell_element_fields<S: ShellShape>(input: &ElementInput, disp: &[[f64; 6]]) -> FemResult<LayerFields> {
    check_thickness(input.thickness)?;
    let geom = LocalGeometry::new::<S>(input.coords)?;
    let local = to_local_displacements(disp, &geom.d);
    let points = S::membrane_points();

    let mut sum = LayerFields::zero();
    for gp in &points {
        sum.add(&shell_layers::<S>(input, &geom, &local, gp.xi, gp.eta)?);
    }
    sum.scale(1.0 / points.len() as f64);
    Ok(sum)
}

fn shell_nodal_fields<S: ShellShape>(input: &ElementInput, disp: &[[f64; 6]]) -> FemResult<Vec<LayerFields>> {
    check_thickness(input.thickness)?;
    let geom = LocalGeometry::new::<S>(input.coords)?;
    let local = to_local_displacements(disp, &geom.d);
    (0..S::NODES)
        .map(|i| {
            let (xi, eta) = S::node_natural(i);
            shell_layers::<S>(input, &geom, &local, xi, eta)
        })
        .collect()
}

fn polygon_angles(coords: &[Vec3]) -> Vec<f64> {
    let n = coords.len();
    (0..n)
        .map(|i| planar_angle(&coords[(i + n - 1) % n], &coords[i], &coords[(i + 1) % n]))
        .collect()
}

macro_rules! impl_shell_formulation {
    ($ty:ty, $faces:expr) => {
        impl ElementFormulation for $ty {
            fn node_count(&self) -> usize {
                <$ty as ShellShape>::NODES
            }

            fn dof_per_node(&self) -> usize {
                6
            }

            fn is_shell(&self) -> bool {
                true
            }

            fn border_faces(&self) -> &'static [&'static [usize]] {
                &$faces
            }

            // Only reached through `Element::mirror`
            fn mirror(&self, nodes: &mut [usize]) {
                nodes[1..].reverse();
            }

            fn stiffness(&self, input: &ElementInput) -> FemResult<Mat> {
                shell_stiffness::<$ty>(input)
            }

            fn mass(&self, input: &ElementInput) -> FemResult<Mat> {
                shell_mass::<$ty>(input)
            }

            fn element_fields(&self, input: &ElementInput, disp: &[[f64; 6]]) -> FemResult<LayerFields> {
                shell_element_fields::<$ty>(input, disp)
            }

            fn nodal_fields(&self, input: &ElementInput, disp: &[[f64; 6]]) -> FemResult<Vec<LayerFields>> {
                shell_nodal_fields::<$ty>(input, disp)
            }

            fn corner_angles(&self, coords: &[Vec3]) -> Vec<f64> {
                polygon_angles(&coords[..<$ty as ShellShape>::NODES])
            }
        }
    };
}

impl_shell_formulation!(QuadShell4, QUAD_FACES);
impl_shell_formulation!(TriShell3, TRI_FACES);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::Material;
    use approx::assert_relative_eq;

    fn material() -> Material {
        let mut mat = Material::new(1, 1000.0, 0.25, 3.0, 1.0, 1.0);
        mat.build_matrices();
        mat
    }

    fn square(z: f64) -> Vec<Vec3> {
        vec![
            Vec3::new(0.0, 0.0, z),
            Vec3::new(2.0, 0.0, z),
            Vec3::new(2.0, 1.0, z),
            Vec3::new(0.0, 1.0, z),
        ]
    }

    #[test]
    fn test_quad_stiffness_symmetric_and_rigid() {
        let coords = square(0.5);
        let mat = material();
        let input = ElementInput { coords: &coords, material: &mat, thickness: 0.1 };
        let k = QuadShell4.stiffness(&input).unwrap();
        assert_eq!(k.nrows(), 24);
        assert_relative_eq!(k.clone(), k.transpose(), epsilon = 1e-9);

        // Rigid translation along z
        let mut u = crate::math::Vec::zeros(24);
        for i in 0..4 {
            u[6 * i + 2] = 1.0;
        }
        assert!((&k * &u).norm() < 1e-9);
    }

    #[test]
    fn test_drilling_term_present() {
        let coords = square(0.0);
        let mat = material();
        let input = ElementInput { coords: &coords, material: &mat, thickness: 0.1 };
        let k = QuadShell4.stiffness(&input).unwrap();
        let expected = DRILLING_COEF * 1000.0 * 0.1 * 2.0;
        assert_relative_eq!(k[(5, 5)], expected, max_relative = 1e-9);
    }

    #[test]
    fn test_membrane_strain_same_on_both_layers() {
        let coords = square(0.0);
        let mat = material();
        let input = ElementInput { coords: &coords, material: &mat, thickness: 0.1 };
        let disp: Vec<[f64; 6]> = coords.iter().map(|p| [0.001 * p[0], 0.0, 0.0, 0.0, 0.0, 0.0]).collect();
        let f = QuadShell4.element_fields(&input, &disp).unwrap();
        assert_relative_eq!(f.top.strain.xx, 0.001, epsilon = 1e-12);
        assert_relative_eq!(f.bottom.strain.xx, 0.001, epsilon = 1e-12);
        assert_relative_eq!(f.top.stress.xx, 1000.0 / (1.0 - 0.0625) * 0.001, max_relative = 1e-9);
    }

    #[test]
    fn test_bending_strain_changes_sign() {
        let coords = square(0.0);
        let mat = material();
        let input = ElementInput { coords: &coords, material: &mat, thickness: 0.2 };
        // Uniform rotation θy with matching w keeps shear zero: w = -x θy
        let theta = 0.01;
        let disp: Vec<[f64; 6]> = coords.iter().map(|p| [0.0, 0.0, -theta * p[0], 0.0, theta, 0.0]).collect();
        let f = QuadShell4.element_fields(&input, &disp).unwrap();
        assert_relative_eq!(f.top.strain.xx, 0.0, epsilon = 1e-12);
        assert_relative_eq!(f.top.strain.zx, 0.0, epsilon = 1e-12);

        // Curvature: θy varying linearly in x
        let disp: Vec<[f64; 6]> = coords.iter().map(|p| [0.0, 0.0, 0.0, 0.0, theta * p[0], 0.0]).collect();
        let nodal = QuadShell4.nodal_fields(&input, &disp).unwrap();
        assert_relative_eq!(nodal[0].top.strain.xx, theta * 0.1, epsilon = 1e-12);
        assert_relative_eq!(nodal[0].bottom.strain.xx, -theta * 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_triangle_mass_and_angles() {
        let coords = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let mat = material();
        let input = ElementInput { coords: &coords, material: &mat, thickness: 0.1 };
        let m = TriShell3.mass(&input).unwrap();
        let mut total = 0.0;
        for i in 0..3 {
            for j in 0..3 {
                total += m[(6 * i, 6 * j)];
            }
        }
        // density * thickness * area
        assert_relative_eq!(total, 3.0 * 0.1 * 0.5, epsilon = 1e-12);

        let angles = TriShell3.corner_angles(&coords);
        assert_relative_eq!(angles.iter().sum::<f64>(), std::f64::consts::PI, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_thickness_rejected() {
        let coords = square(0.0);
        let mat = material();
        let input = ElementInput { coords: &coords, material: &mat, thickness: 0.0 };
        assert!(matches!(QuadShell4.stiffness(&input), Err(FemError::InvalidGeometry(_))));
    }
}
