//! Gauss quadrature rules for the element formulations
//!
//! Points are in natural coordinates. Hexahedra and quads use the
//! [-1, 1] reference cell, triangles use area coordinates (ξ, η) with
//! the third coordinate implicit.

/// 2-point Gauss-Legendre abscissa, 1/√3
pub const GX2: f64 = 0.577_350_269_189_625_8;

/// A quadrature point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussPoint {
    pub xi: f64,
    pub eta: f64,
    pub zeta: f64,
    pub weight: f64,
}

impl GaussPoint {
    pub const fn new(xi: f64, eta: f64, zeta: f64, weight: f64) -> Self {
        Self { xi, eta, zeta, weight }
    }
}

/// 2x2x2 rule for the 8-node hexahedron
pub fn hexa_points() -> [GaussPoint; 8] {
    let g = GX2;
    [
        GaussPoint::new(-g, -g, -g, 1.0),
        GaussPoint::new(g, -g, -g, 1.0),
        GaussPoint::new(g, g, -g, 1.0),
        GaussPoint::new(-g, g, -g, 1.0),
        GaussPoint::new(-g, -g, g, 1.0),
        GaussPoint::new(g, -g, g, 1.0),
        GaussPoint::new(g, g, g, 1.0),
        GaussPoint::new(-g, g, g, 1.0),
    ]
}

/// 2x2 in-plane rule for the 4-node quad (ζ left at 0)
pub fn quad_points() -> [GaussPoint; 4] {
    let g = GX2;
    [
        GaussPoint::new(-g, -g, 0.0, 1.0),
        GaussPoint::new(g, -g, 0.0, 1.0),
        GaussPoint::new(g, g, 0.0, 1.0),
        GaussPoint::new(-g, g, 0.0, 1.0),
    ]
}

/// Reduced points for the quad's transverse shear terms.
///
/// γxz is sampled along η at ξ = 0 and γyz along ξ at η = 0; each
/// pair integrates exactly in the direction where that strain varies.
pub fn quad_shear_points() -> ([GaussPoint; 2], [GaussPoint; 2]) {
    let g = GX2;
    (
        [GaussPoint::new(0.0, -g, 0.0, 2.0), GaussPoint::new(0.0, g, 0.0, 2.0)],
        [GaussPoint::new(-g, 0.0, 0.0, 2.0), GaussPoint::new(g, 0.0, 0.0, 2.0)],
    )
}

/// 3-point rule for the 3-node triangle (weights sum to the reference area 1/2)
pub fn tri_points() -> [GaussPoint; 3] {
    let w = 1.0 / 6.0;
    [
        GaussPoint::new(1.0 / 6.0, 1.0 / 6.0, 0.0, w),
        GaussPoint::new(2.0 / 3.0, 1.0 / 6.0, 0.0, w),
        GaussPoint::new(1.0 / 6.0, 2.0 / 3.0, 0.0, w),
    ]
}

/// Centroid rule for the triangle's transverse shear terms
pub fn tri_center_point() -> GaussPoint {
    GaussPoint::new(1.0 / 3.0, 1.0 / 3.0, 0.0, 0.5)
}

/// 2-point rule through the shell thickness
pub fn thickness_points() -> [(f64, f64); 2] {
    [(-GX2, 1.0), (GX2, 1.0)]
}
