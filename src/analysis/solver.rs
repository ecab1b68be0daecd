//! Global assembly, static condensation and linear solution

use log::{debug, info, warn};
use nalgebra::DVector;

use crate::analysis::{AnalysisOptions, CancelToken, SolverMethod};
use crate::boundary::{BoundaryCondition, DofSlot};
use crate::elements::{CoordinateFrame, Element, ElementInput, Material, ShellParameter};
use crate::error::{FemError, FemResult};
use crate::math::{solve_pcg, FillIn, SparseLu, SparseRowMatrix};
use crate::mesh::MeshModel;

/// Progress of a solve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolverState {
    #[default]
    Idle,
    Assembling,
    DirectSolve,
    IterativeSolve,
    Solved,
    Failed,
}

/// Read-only view of the model data a solve works on
#[derive(Debug, Clone, Copy)]
pub struct SolveInput<'a> {
    pub mesh: &'a MeshModel,
    pub bc: &'a BoundaryCondition,
    pub materials: &'a [Material],
    pub params: &'a [ShellParameter],
    pub frames: &'a [CoordinateFrame],
}

impl<'a> SolveInput<'a> {
    /// Thickness of a shell element's parameter, 0 for solids
    pub fn thickness(&self, element: &Element) -> f64 {
        element.param().map(|p| self.params[p].thickness).unwrap_or(0.0)
    }
}

/// The reduced (free x free) system
#[derive(Debug, Clone)]
pub struct ReducedSystem {
    pub matrix: SparseRowMatrix,
    pub rhs: DVector<f64>,
}

/// Linear static solver
#[derive(Debug, Clone, Default)]
pub struct Solver {
    state: SolverState,
    iterations: usize,
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SolverState {
        self.state
    }

    /// Conjugate gradient iterations of the last iterative solve
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Assemble the unreduced global stiffness matrix from all elements
    pub fn assemble_stiffness(input: &SolveInput, cancel: &CancelToken) -> FemResult<SparseRowMatrix> {
        let bc = input.bc;
        let mut k_global = SparseRowMatrix::new(bc.total_dofs());

        for element in &input.mesh.elements {
            cancel.check()?;
            let coords = input.mesh.element_coords(element);
            let elem_input = ElementInput {
                coords: &coords,
                material: &input.materials[element.material()],
                thickness: input.thickness(element),
            };
            let f = element.formulation();
            let k = f.stiffness(&elem_input)?;
            let dofs = bc.element_dofs(element.nodes(), f.dof_per_node());
            k_global.add_element_matrix(&dofs, &k);
        }
        Ok(k_global)
    }

    /// Rotate the blocks of nodes restrained in a local frame
    fn rotate_restraint_frames(k: &mut SparseRowMatrix, input: &SolveInput) {
        let bc = input.bc;
        let mut blocks = Vec::new();
        for node in 0..input.mesh.nodes.len() {
            let Some(fi) = bc.node_frame(node) else { continue };
            let m = input.frames[fi].matrix;
            let o = bc.offset(node);
            // Translations, then rotations at shell nodes
            for base in (0..bc.dof_count(node)).step_by(3) {
                blocks.push(([o + base, o + base + 1, o + base + 2], m));
            }
        }
        if !blocks.is_empty() {
            k.rotate_blocks(&blocks);
        }
    }

    /// Global load vector, rotated into restraint frames where present
    pub fn load_vector(input: &SolveInput) -> DVector<f64> {
        let bc = input.bc;
        let mut f = DVector::zeros(bc.total_dofs());

        for load in &bc.loads {
            let values = match load.coords() {
                Some(fi) => input.frames[fi].to_global6(&load.values),
                None => load.values,
            };
            let node = load.node();
            let o = bc.offset(node);
            for (c, v) in values.iter().enumerate().take(bc.dof_count(node)) {
                f[o + c] += v;
            }
        }

        for node in 0..input.mesh.nodes.len() {
            let Some(fi) = bc.node_frame(node) else { continue };
            let o = bc.offset(node);
            let mut block = [0.0; 6];
            let n = bc.dof_count(node);
            for c in 0..n {
                block[c] = f[o + c];
            }
            let local = input.frames[fi].to_local6(&block);
            for c in 0..n {
                f[o + c] = local[c];
            }
        }
        f
    }

    /// Eliminate constrained DOF: prescribed values move to the right-hand side
    pub fn condense(k: &SparseRowMatrix, f: &DVector<f64>, bc: &BoundaryCondition) -> ReducedSystem {
        let mut matrix = SparseRowMatrix::new(bc.free_count());
        let mut rhs = DVector::zeros(bc.free_count());

        for (i, row) in k.rows().iter().enumerate() {
            let DofSlot::Free(fi) = bc.slot(i) else { continue };
            rhs[fi] += f[i];
            for (j, v) in row.iter() {
                match bc.slot(j) {
                    DofSlot::Free(fj) => matrix.add(fi, fj, v),
                    DofSlot::Constrained { .. } => {
                        let u = bc.get_rest_disp(j);
                        if u != 0.0 {
                            rhs[fi] -= v * u;
                        }
                    }
                }
            }
        }
        ReducedSystem { matrix, rhs }
    }

    /// Assemble, condense and solve; returns the free-DOF solution
    pub fn solve(
        &mut self,
        input: &SolveInput,
        options: &AnalysisOptions,
        cancel: &CancelToken,
    ) -> FemResult<DVector<f64>> {
        let outcome = self.run(input, options, cancel);
        self.state = if outcome.is_ok() { SolverState::Solved } else { SolverState::Failed };
        outcome
    }

    fn run(&mut self, input: &SolveInput, options: &AnalysisOptions, cancel: &CancelToken) -> FemResult<DVector<f64>> {
        if input.bc.restraints.is_empty() {
            return Err(FemError::InsufficientConstraints);
        }

        self.state = SolverState::Assembling;
        self.iterations = 0;
        let mut k = Self::assemble_stiffness(input, cancel)?;
        let removed = k.prune(options.prune_ratio);
        Self::rotate_restraint_frames(&mut k, input);
        let f = Self::load_vector(input);

        let system = Self::condense(&k, &f, input.bc);
        let n = system.rhs.len();
        info!(
            "Assembled {} DOF ({} free), {} stored entries, {} pruned",
            input.bc.total_dofs(),
            n,
            k.nnz(),
            removed
        );
        if n == 0 {
            return Ok(DVector::zeros(0));
        }

        let csr = system.matrix.to_csr();
        match options.method {
            SolverMethod::Direct => {
                self.state = SolverState::DirectSolve;
                let lu = SparseLu::factorize(&csr, FillIn::Full, cancel)?;
                Ok(lu.solve(&system.rhs))
            }
            SolverMethod::Iterative => {
                self.state = SolverState::IterativeSolve;
                let ilu = SparseLu::factorize(&csr, FillIn::None, cancel)?;
                let max_iter = options.max_iterations.unwrap_or(n);
                let result = solve_pcg(&csr, &system.rhs, &ilu, options.tolerance, max_iter, cancel)?;
                self.iterations = result.iterations;
                if result.converged {
                    debug!("PCG converged in {} iterations, |r|² = {:e}", result.iterations, result.residual);
                } else {
                    warn!(
                        "PCG stopped after {} iterations without convergence, |r|² = {:e}",
                        result.iterations, result.residual
                    );
                }
                Ok(result.solution)
            }
        }
    }
}
