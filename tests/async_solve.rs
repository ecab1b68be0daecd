//! Background solves through the `async` feature

#![cfg(feature = "async")]

mod common;

use approx::assert_relative_eq;
use common::{init_logging, restrained_unit_hex};
use fem_core::prelude::*;
use fem_core::solve_async;

fn loaded_hex() -> FemDataModel {
    let mut model = restrained_unit_hex(1000.0, 0.3);
    model.add_load(Load::force(8, 1.0, 0.0, 0.0));
    model.init().unwrap();
    model
}

#[tokio::test]
async fn test_solve_async_returns_model() {
    init_logging();

    let mut reference = loaded_hex();
    reference.solve(&AnalysisOptions::direct(), &CancelToken::new()).unwrap();

    let (model, outcome) = solve_async(loaded_hex(), AnalysisOptions::direct(), CancelToken::new()).await;
    outcome.unwrap();
    assert!(model.is_solved());
    let dx = model.result_by_label(Quantity::Displacement, Component::X, 8).unwrap().unwrap();
    let expected = reference.result_by_label(Quantity::Displacement, Component::X, 8).unwrap().unwrap();
    assert_relative_eq!(dx, expected, epsilon = 1e-15);
}

#[tokio::test]
async fn test_cancelled_async_solve_keeps_model() {
    init_logging();

    let cancel = CancelToken::new();
    cancel.cancel();
    let (model, outcome) = solve_async(loaded_hex(), AnalysisOptions::default(), cancel).await;
    assert!(matches!(outcome, Err(FemError::Cancelled)));
    assert_eq!(model.state(), ModelState::Initialized);
    assert_eq!(model.mesh.nodes.len(), 8);
}
