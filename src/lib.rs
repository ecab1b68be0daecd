//! FEM Core - linear static finite element analysis of 3D solids and shells
//!
//! This library provides the numerical engine of a structural analysis tool:
//! - 8-node hexahedral solids, 4-node and 3-node Mindlin shells
//! - Restraints and loads in global or local coordinate frames
//! - Sparse assembly with static condensation of prescribed DOF
//! - Direct (sparse LU) and iterative (ILU(0) preconditioned CG) solves
//! - Strain, stress and strain energy per element or averaged at nodes
//!
//! ## Example
//! ```rust
//! use fem_core::prelude::*;
//!
//! let mut model = FemDataModel::new();
//! model.add_material(Material::new(1, 210e9, 0.3, 7850.0, 53.0, 460.0));
//!
//! let corners = [
//!     (0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (1.0, 1.0, 0.0), (0.0, 1.0, 0.0),
//!     (0.0, 0.0, 1.0), (1.0, 0.0, 1.0), (1.0, 1.0, 1.0), (0.0, 1.0, 1.0),
//! ];
//! for (i, (x, y, z)) in corners.into_iter().enumerate() {
//!     model.add_node(Node::new(i as i64 + 1, x, y, z));
//! }
//! model.add_element(Element::hexa(1, 1, [1, 2, 3, 4, 5, 6, 7, 8]));
//!
//! for label in [1, 4, 5, 8] {
//!     model.add_restraint(Restraint::pinned(label));
//! }
//! model.add_load(Load::force(7, 1000.0, 0.0, 0.0));
//!
//! model.init().unwrap();
//! model.solve(&AnalysisOptions::default(), &CancelToken::new()).unwrap();
//!
//! let dx = model.result_by_label(Quantity::Displacement, Component::X, 7).unwrap();
//! assert!(dx.unwrap() > 0.0);
//! ```

pub mod analysis;
pub mod boundary;
pub mod elements;
pub mod error;
pub mod io;
pub mod loads;
pub mod math;
pub mod mesh;
pub mod model;
pub mod results;

// Re-export common types
pub mod prelude {
    pub use crate::analysis::{AnalysisOptions, CancelToken, ResultType, Solver, SolverMethod, SolverState};
    pub use crate::boundary::BoundaryCondition;
    pub use crate::elements::{
        CoordinateFrame, Element, ElementKind, Material, Node, Restraint, ShellParameter,
    };
    pub use crate::error::{FemError, FemResult};
    pub use crate::loads::Load;
    pub use crate::mesh::MeshModel;
    pub use crate::model::{FemDataModel, ModelState};
    pub use crate::results::{AnalysisResult, Component, Displacement, Quantity, ResultRecord};
}

#[cfg(feature = "async")]
pub use analysis::solve_async;
