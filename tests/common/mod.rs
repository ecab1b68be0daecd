//! Model builders shared by the integration tests

#![allow(dead_code)]

use fem_core::prelude::*;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Label of grid node (i, j, k) in a block with `nx * ny` cells per layer
pub fn block_label(nx: usize, ny: usize, i: usize, j: usize, k: usize) -> i64 {
    (1 + i + (nx + 1) * (j + (ny + 1) * k)) as i64
}

/// Block of unit hexahedra with material 1, without boundary conditions
pub fn hex_block(nx: usize, ny: usize, nz: usize, e: f64, nu: f64) -> FemDataModel {
    let mut model = FemDataModel::new();
    model.add_material(Material::new(1, e, nu, 1.0, 1.0, 1.0));

    let label = |i, j, k| block_label(nx, ny, i, j, k);
    for k in 0..=nz {
        for j in 0..=ny {
            for i in 0..=nx {
                model.add_node(Node::new(label(i, j, k), i as f64, j as f64, k as f64));
            }
        }
    }

    let mut element = 1;
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                model.add_element(Element::hexa(
                    element,
                    1,
                    [
                        label(i, j, k), label(i + 1, j, k), label(i + 1, j + 1, k), label(i, j + 1, k),
                        label(i, j, k + 1), label(i + 1, j, k + 1), label(i + 1, j + 1, k + 1), label(i, j + 1, k + 1),
                    ],
                ));
                element += 1;
            }
        }
    }
    model
}

/// Unit hexahedron with the origin fixed and its three neighbours restrained
/// against rigid rotation. Node 8 sits at (1, 1, 1).
pub fn restrained_unit_hex(e: f64, nu: f64) -> FemDataModel {
    let mut model = hex_block(1, 1, 1, e, nu);
    let fix = |label: i64, rest: [bool; 3]| {
        Restraint::new(label, [rest[0], rest[1], rest[2], false, false, false], [0.0; 6])
    };
    for r in [
        fix(1, [true, true, true]),
        fix(2, [false, true, true]),
        fix(3, [false, false, true]),
        fix(5, [true, true, false]),
    ]
    .into_iter()
    .flatten()
    {
        model.add_restraint(r);
    }
    model
}

/// Global displacement components of every node, flattened
pub fn displacement_vector(model: &FemDataModel) -> Vec<f64> {
    model.result.displacement.iter().flat_map(|d| d.as_array()).collect()
}
