//! Benchmarks for the FEM solver

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fem_core::prelude::*;

/// Block of `nx * ny * nz` unit hexahedra clamped at x = 0, pulled at x = nx
fn create_block_model(nx: usize, ny: usize, nz: usize) -> FemDataModel {
    let mut model = FemDataModel::new();
    model.add_material(Material::new(1, 210_000.0, 0.3, 7.85e-9, 45.0, 460.0));

    let label = |i: usize, j: usize, k: usize| (1 + i + (nx + 1) * (j + (ny + 1) * k)) as i64;
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

    for k in 0..=nz {
        for j in 0..=ny {
            model.add_restraint(Restraint::pinned(label(0, j, k)));
            model.add_load(Load::force(label(nx, j, k), 100.0, 0.0, -10.0));
        }
    }

    model.init().unwrap();
    model
}

/// Quad shell plate clamped along one edge
fn create_plate_model(n: usize) -> FemDataModel {
    let mut model = FemDataModel::new();
    model.add_material(Material::new(1, 210_000.0, 0.3, 7.85e-9, 45.0, 460.0));
    model.add_shell_parameter(ShellParameter::new(1, 0.05));

    let label = |i: usize, j: usize| (1 + i + (n + 1) * j) as i64;
    for j in 0..=n {
        for i in 0..=n {
            model.add_node(Node::new(label(i, j), i as f64 / n as f64, j as f64 / n as f64, 0.0));
        }
    }
    let mut element = 1;
    for j in 0..n {
        for i in 0..n {
            model.add_element(Element::quad(
                element,
                1,
                1,
                [label(i, j), label(i + 1, j), label(i + 1, j + 1), label(i, j + 1)],
            ));
            element += 1;
        }
    }
    for j in 0..=n {
        model.add_restraint(Restraint::fixed(label(0, j)));
        model.add_load(Load::force(label(n, j), 0.0, 0.0, -1.0));
    }

    model.init().unwrap();
    model
}

fn benchmark_assembly(c: &mut Criterion) {
    let model = create_block_model(10, 4, 4);
    let input = fem_core::analysis::solver::SolveInput {
        mesh: &model.mesh,
        bc: &model.bc,
        materials: &model.materials,
        params: &model.shell_params,
        frames: &model.coordinates,
    };
    c.bench_function("block_10x4x4_assembly", |b| {
        b.iter(|| {
            let k = Solver::assemble_stiffness(&input, &CancelToken::new()).unwrap();
            black_box(k);
        })
    });
}

fn benchmark_block_direct(c: &mut Criterion) {
    c.bench_function("block_10x4x4_direct", |b| {
        let mut model = create_block_model(10, 4, 4);
        b.iter(|| {
            model.solve(&AnalysisOptions::direct(), &CancelToken::new()).unwrap();
            black_box(&model.result);
        })
    });
}

fn benchmark_block_iterative(c: &mut Criterion) {
    c.bench_function("block_10x4x4_iterative", |b| {
        let mut model = create_block_model(10, 4, 4);
        b.iter(|| {
            model.solve(&AnalysisOptions::iterative(), &CancelToken::new()).unwrap();
            black_box(&model.result);
        })
    });
}

fn benchmark_plate(c: &mut Criterion) {
    c.bench_function("plate_16x16_direct", |b| {
        let mut model = create_plate_model(16);
        b.iter(|| {
            model.solve(&AnalysisOptions::direct(), &CancelToken::new()).unwrap();
            black_box(&model.result);
        })
    });
}

criterion_group!(
    benches,
    benchmark_assembly,
    benchmark_block_direct,
    benchmark_block_iterative,
    benchmark_plate,
);

criterion_main!(benches);
