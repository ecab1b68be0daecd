//! Analysis options, solver and cancellation

mod cancel;
pub mod solver;

use serde::{Deserialize, Serialize};

use crate::error::FemResult;

pub use cancel::CancelToken;
pub use solver::{Solver, SolverState};

/// Linear solution method for the reduced system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverMethod {
    /// ILU(0) preconditioned conjugate gradients
    #[default]
    Iterative,
    /// Sparse LU factorization
    Direct,
}

/// Where derived strain/stress/energy fields are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultType {
    /// Angle-weighted averages at mesh nodes
    #[default]
    Node,
    /// Gauss point averages per element
    Element,
}

impl ResultType {
    /// Parse the `resulttype` keyword argument
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "node" => Some(Self::Node),
            "element" => Some(Self::Element),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Element => "element",
        }
    }
}

/// Options for a linear static solve
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    /// Solution method
    pub method: SolverMethod,
    /// Squared residual norm threshold for conjugate gradients (absolute)
    pub tolerance: f64,
    /// Iteration cap (None = number of free DOF)
    pub max_iterations: Option<usize>,
    /// Entries below `prune_ratio` times the largest entry are dropped
    pub prune_ratio: f64,
    /// Override of the model's result storage
    pub result_type: Option<ResultType>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            method: SolverMethod::Iterative,
            tolerance: 1e-10,
            max_iterations: None,
            prune_ratio: 1e-10,
            result_type: None,
        }
    }
}

impl AnalysisOptions {
    /// Options for the iterative solver
    pub fn iterative() -> Self {
        Self::default()
    }

    /// Options for the direct solver
    pub fn direct() -> Self {
        Self {
            method: SolverMethod::Direct,
            ..Self::default()
        }
    }

    /// Load options from a JSON document; missing fields take defaults
    pub fn from_json(json: &str) -> FemResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set convergence tolerance
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    /// Set maximum iterations
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iterations = Some(max_iter);
        self
    }

    /// Set the small-entry pruning ratio
    pub fn with_prune_ratio(mut self, ratio: f64) -> Self {
        self.prune_ratio = ratio;
        self
    }

    /// Store derived fields per node or per element
    pub fn with_result_type(mut self, result_type: ResultType) -> Self {
        self.result_type = Some(result_type);
        self
    }
}

/// Run a solve on a blocking worker thread.
///
/// The model is moved into the task and handed back with the outcome,
/// so it cannot be mutated while the solve is in flight.
#[cfg(feature = "async")]
pub async fn solve_async(
    mut model: crate::model::FemDataModel,
    options: AnalysisOptions,
    cancel: CancelToken,
) -> (crate::model::FemDataModel, FemResult<()>) {
    let joined = tokio::task::spawn_blocking(move || {
        let outcome = model.solve(&options, &cancel);
        (model, outcome)
    })
    .await;

    match joined {
        Ok(pair) => pair,
        // Blocking tasks only fail by panicking; surface it on the caller
        Err(e) => std::panic::resume_unwind(e.into_panic()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = AnalysisOptions::default();
        assert_eq!(opts.method, SolverMethod::Iterative);
        assert_eq!(opts.tolerance, 1e-10);
        assert_eq!(opts.max_iterations, None);
    }

    #[test]
    fn test_from_json_partial() {
        let opts = AnalysisOptions::from_json(r#"{"method": "direct", "result_type": "element"}"#).unwrap();
        assert_eq!(opts.method, SolverMethod::Direct);
        assert_eq!(opts.result_type, Some(ResultType::Element));
        assert_eq!(opts.prune_ratio, 1e-10);
    }

    #[test]
    fn test_builders() {
        let opts = AnalysisOptions::direct()
            .with_max_iter(5)
            .with_tolerance(1e-8)
            .with_prune_ratio(0.0)
            .with_result_type(ResultType::Element);
        assert_eq!(opts.max_iterations, Some(5));
        assert_eq!(opts.tolerance, 1e-8);
        assert_eq!(opts.prune_ratio, 0.0);
        assert_eq!(opts.result_type, Some(ResultType::Element));
        assert_eq!(ResultType::parse("ELEMENT"), Some(ResultType::Element));
    }
}
