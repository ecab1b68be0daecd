//! Finite element data model - the main orchestrator

use std::collections::HashMap;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::analysis::solver::SolveInput;
use crate::analysis::{AnalysisOptions, CancelToken, ResultType, Solver, SolverState};
use crate::boundary::BoundaryCondition;
use crate::elements::{CoordinateFrame, Element, ElementInput, Material, Node, Restraint, ShellParameter};
use crate::error::{FemError, FemResult};
use crate::loads::Load;
use crate::math::Vec3;
use crate::mesh::MeshModel;
use crate::results::{AnalysisResult, Quantity, ResultRecord};

/// Largest deviation of RᵀR from the identity accepted for a frame
const FRAME_TOLERANCE: f64 = 1e-4;

/// Lifecycle of a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ModelState {
    #[default]
    Empty,
    Populated,
    Initialized,
    Solved,
}

/// Mesh, materials, boundary conditions and results of one analysis
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FemDataModel {
    pub mesh: MeshModel,
    pub bc: BoundaryCondition,
    pub materials: Vec<Material>,
    pub shell_params: Vec<ShellParameter>,
    pub coordinates: Vec<CoordinateFrame>,
    pub result: AnalysisResult,
    /// Storage of derived fields, from the `resulttype` record
    pub result_type: ResultType,

    /// Result records waiting for initialization
    #[serde(skip)]
    deferred: Vec<ResultRecord>,
    #[serde(skip)]
    state: ModelState,
    #[serde(skip)]
    solver: Solver,
}

impl FemDataModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all data and return to the empty state
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn state(&self) -> ModelState {
        self.state
    }

    pub fn solver_state(&self) -> SolverState {
        self.solver.state()
    }

    pub fn is_solved(&self) -> bool {
        self.state == ModelState::Solved
    }

    fn touch(&mut self) {
        self.state = ModelState::Populated;
    }

    // ========================
    // Model Building Methods
    // ========================

    pub fn add_node(&mut self, node: Node) {
        self.mesh.nodes.push(node);
        self.touch();
    }

    pub fn add_element(&mut self, element: Element) {
        self.mesh.elements.push(element);
        self.touch();
    }

    pub fn add_material(&mut self, material: Material) {
        self.materials.push(material);
        self.touch();
    }

    pub fn add_shell_parameter(&mut self, param: ShellParameter) {
        self.shell_params.push(param);
        self.touch();
    }

    pub fn add_coordinates(&mut self, frame: CoordinateFrame) {
        self.coordinates.push(frame);
        self.touch();
    }

    /// Add a restraint; restraints fixing nothing are dropped (returns false)
    pub fn add_restraint(&mut self, restraint: Restraint) -> bool {
        self.touch();
        self.bc.add_restraint(restraint)
    }

    pub fn add_load(&mut self, load: Load) {
        self.bc.add_load(load);
        self.touch();
    }

    /// Queue a result record, applied by `init`
    pub fn add_result_record(&mut self, record: ResultRecord) {
        self.deferred.push(record);
        self.touch();
    }

    pub fn set_result_type(&mut self, result_type: ResultType) {
        self.result_type = result_type;
    }

    // ========================
    // Initialization
    // ========================

    /// Renumber, resolve references, derive topology and build constitutive matrices
    pub fn init(&mut self) -> FemResult<()> {
        if self.materials.is_empty() {
            debug!("No material defined, using unit material");
            self.materials.push(Material::unit());
        }

        self.materials.sort_by_key(|m| m.label);
        let material_index = label_index(self.materials.iter().map(|m| m.label), "material")?;
        for m in &mut self.materials {
            m.build_matrices();
        }

        self.shell_params.sort_by_key(|p| p.label);
        let param_index = label_index(self.shell_params.iter().map(|p| p.label), "shellparameter")?;

        self.coordinates.sort_by_key(|c| c.label);
        label_index(self.coordinates.iter().map(|c| c.label), "coordinates")?;
        if let Some(frame) = self.coordinates.iter().find(|c| !c.is_orthonormal(FRAME_TOLERANCE)) {
            return Err(FemError::InvalidInput(format!(
                "coordinate frame {} is not orthonormal",
                frame.label
            )));
        }

        self.mesh.renumber()?;
        for element in &mut self.mesh.elements {
            element.material = *material_index
                .get(&element.material_label)
                .ok_or(FemError::UnresolvedReference { kind: "material", label: element.material_label })?;
            element.param = match (element.is_shell(), element.param_label) {
                (true, Some(label)) => Some(
                    *param_index
                        .get(&label)
                        .ok_or(FemError::UnresolvedReference { kind: "shellparameter", label })?,
                ),
                (true, None) => {
                    return Err(FemError::InvalidInput(format!(
                        "shell element {} has no shell parameter",
                        element.label
                    )))
                }
                (false, _) => None,
            };
        }

        self.mesh.check_chirality();
        let faces = self.mesh.get_free_faces().len();
        let edges = self.mesh.get_face_edges().len();

        self.bc.resolve(&self.mesh, &self.coordinates)?;
        self.bc.set_node_dof(&self.mesh);
        let dofs = self.bc.set_pointer_structure(self.mesh.nodes.len());

        self.result.clear();
        self.result.result_type = self.result_type;
        self.apply_deferred_records()?;

        self.solver = Solver::new();
        // Stored displacements make the model count as solved
        self.state = if self.result.has_displacement() {
            ModelState::Solved
        } else {
            ModelState::Initialized
        };
        info!(
            "Initialized model: {} nodes, {} elements, {} materials, {} free faces, {} edges, {} DOF",
            self.mesh.nodes.len(),
            self.mesh.elements.len(),
            self.materials.len(),
            faces,
            edges,
            dofs
        );
        Ok(())
    }

    fn apply_deferred_records(&mut self) -> FemResult<()> {
        if self.deferred.is_empty() {
            return Ok(());
        }
        let element_index: HashMap<i64, usize> =
            self.mesh.elements.iter().enumerate().map(|(i, e)| (e.label, i)).collect();

        for record in std::mem::take(&mut self.deferred) {
            let by_node = record.quantity.is_nodal() || self.result_type == ResultType::Node;
            let index = if by_node {
                self.mesh
                    .node_index(record.label)
                    .ok_or(FemError::UnresolvedReference { kind: "node", label: record.label })?
            } else {
                *element_index
                    .get(&record.label)
                    .ok_or(FemError::UnresolvedReference { kind: "element", label: record.label })?
            };
            self.result.apply_record(&record, index);
        }
        debug!("Applied stored result records");
        Ok(())
    }

    // ========================
    // Analysis
    // ========================

    fn solve_input(&self) -> SolveInput<'_> {
        SolveInput {
            mesh: &self.mesh,
            bc: &self.bc,
            materials: &self.materials,
            params: &self.shell_params,
            frames: &self.coordinates,
        }
    }

    /// Solve the static problem and recover derived fields
    pub fn solve(&mut self, options: &AnalysisOptions, cancel: &CancelToken) -> FemResult<()> {
        if matches!(self.state, ModelState::Empty | ModelState::Populated) {
            return Err(FemError::NotInitialized);
        }
        let result_type = options.result_type.unwrap_or(self.result_type);

        let mut solver = std::mem::take(&mut self.solver);
        let outcome = solver.solve(&self.solve_input(), options, cancel);
        self.solver = solver;
        let free = outcome?;

        self.result.clear();
        self.result.result_type = result_type;
        self.result
            .set_displacement(&self.bc, &self.coordinates, &free, self.mesh.nodes.len());

        match result_type {
            ResultType::Node => self.calculate_node_fields()?,
            ResultType::Element => self.calculate_element_fields()?,
        }

        self.state = ModelState::Solved;
        info!(
            "Solved: max displacement {:.6e}, max rotation {:.6e}",
            self.result.disp_max, self.result.angle_max
        );
        Ok(())
    }

    fn element_input<'a>(&'a self, element: &Element, coords: &'a [Vec3]) -> ElementInput<'a> {
        ElementInput {
            coords,
            material: &self.materials[element.material()],
            thickness: self.solve_input().thickness(element),
        }
    }

    fn element_displacements(&self, element: &Element) -> Vec<[f64; 6]> {
        element
            .nodes()
            .iter()
            .map(|&n| self.result.displacement[n].as_array())
            .collect()
    }

    /// Gauss-averaged strain, stress and energy per element
    pub fn calculate_element_fields(&mut self) -> FemResult<()> {
        let mut fields = Vec::with_capacity(self.mesh.elements.len());
        for element in &self.mesh.elements {
            let coords = self.mesh.element_coords(element);
            let input = self.element_input(element, &coords);
            fields.push(element.formulation().element_fields(&input, &self.element_displacements(element))?);
        }

        self.result.init_structure_data(fields.len());
        for (i, f) in fields.iter().enumerate() {
            self.result.add_structure_data(i, f, 1.0);
        }
        Ok(())
    }

    /// Nodal strain, stress and energy, averaged over incident elements
    /// with the corner angle of each element as weight
    pub fn calculate_node_fields(&mut self) -> FemResult<()> {
        let node_count = self.mesh.nodes.len();
        let mut contributions = Vec::new();
        for element in &self.mesh.elements {
            let coords = self.mesh.element_coords(element);
            let input = self.element_input(element, &coords);
            let f = element.formulation();
            let nodal = f.nodal_fields(&input, &self.element_displacements(element))?;
            let angles = f.corner_angles(&coords);
            for ((&node, fields), angle) in element.nodes().iter().zip(nodal).zip(angles) {
                contributions.push((node, fields, angle));
            }
        }

        self.result.init_structure_data(node_count);
        let mut weights = vec![0.0; node_count];
        for (node, fields, angle) in &contributions {
            self.result.add_structure_data(*node, fields, *angle);
            weights[*node] += angle;
        }
        let factors: Vec<f64> = weights.iter().map(|&w| if w > 0.0 { 1.0 / w } else { 0.0 }).collect();
        self.result.mul_structure_data(&factors);
        Ok(())
    }

    // ========================
    // Query Methods
    // ========================

    /// Total translational mass of all elements
    pub fn structure_mass(&self) -> FemResult<f64> {
        if matches!(self.state, ModelState::Empty | ModelState::Populated) {
            return Err(FemError::NotInitialized);
        }
        let mut total = 0.0;
        for element in &self.mesh.elements {
            let coords = self.mesh.element_coords(element);
            let input = self.element_input(element, &coords);
            let f = element.formulation();
            let m = f.mass(&input)?;
            let dpn = f.dof_per_node();
            for i in 0..f.node_count() {
                for j in 0..f.node_count() {
                    total += m[(dpn * i, dpn * j)];
                }
            }
        }
        Ok(total)
    }

    /// Bounding box of the nodes
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        self.mesh.bounds()
    }

    /// Look up a value of a result field by node or element label
    pub fn result_by_label(
        &self,
        quantity: Quantity,
        component: crate::results::Component,
        label: i64,
    ) -> FemResult<Option<f64>> {
        if !self.result.has_displacement() && self.result.len(quantity) == 0 {
            return Err(FemError::NotAnalyzed);
        }
        let index = if quantity.is_nodal() || self.result.result_type == ResultType::Node {
            self.mesh.node_index(label)
        } else {
            self.mesh.elements.iter().position(|e| e.label == label)
        };
        Ok(index.and_then(|i| self.result.get_data(quantity, component, i)))
    }
}

/// Map labels to positions, rejecting duplicates
fn label_index(labels: impl Iterator<Item = i64>, kind: &'static str) -> FemResult<HashMap<i64, usize>> {
    let mut index = HashMap::new();
    for (i, label) in labels.enumerate() {
        if index.insert(label, i).is_some() {
            return Err(FemError::DuplicateLabel { kind, label });
        }
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::SolverMethod;
    use crate::results::Component;
    use approx::assert_relative_eq;

    fn unit_cube(model: &mut FemDataModel) {
        let pts = [
            (0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (1.0, 1.0, 0.0), (0.0, 1.0, 0.0),
            (0.0, 0.0, 1.0), (1.0, 0.0, 1.0), (1.0, 1.0, 1.0), (0.0, 1.0, 1.0),
        ];
        for (i, p) in pts.iter().enumerate() {
            model.add_node(Node::new(i as i64 + 1, p.0, p.1, p.2));
        }
        model.add_element(Element::hexa(1, 1, [1, 2, 3, 4, 5, 6, 7, 8]));
    }

    /// Cube in uniaxial tension along x, restrained on symmetry planes
    fn tension_model(e: f64, nu: f64) -> FemDataModel {
        let mut model = FemDataModel::new();
        unit_cube(&mut model);
        model.add_material(Material::new(1, e, nu, 1.0, 1.0, 1.0));
        // Symmetry planes x = 0, y = 0 and z = 0
        let fixes = [
            (1, [true, true, true]),
            (2, [false, true, true]),
            (3, [false, false, true]),
            (4, [true, false, true]),
            (5, [true, true, false]),
            (6, [false, true, false]),
            (8, [true, false, false]),
        ];
        for (label, f) in fixes {
            let rest = [f[0], f[1], f[2], false, false, false];
            model.add_restraint(Restraint::new(label, rest, [0.0; 6]).unwrap());
        }
        for label in [2, 3, 6, 7] {
            model.add_load(Load::force(label, 0.25, 0.0, 0.0));
        }
        model
    }

    #[test]
    fn test_solve_requires_init() {
        let mut model = tension_model(100.0, 0.0);
        assert!(matches!(
            model.solve(&AnalysisOptions::default(), &CancelToken::new()),
            Err(FemError::NotInitialized)
        ));
    }

    #[test]
    fn test_uniaxial_tension() {
        // With nu = 0 the restraint pattern above gives a uniform stress state
        let mut model = tension_model(100.0, 0.0);
        model.init().unwrap();
        let options = AnalysisOptions { method: SolverMethod::Direct, ..AnalysisOptions::default() };
        model.solve(&options, &CancelToken::new()).unwrap();
        assert_eq!(model.solver_state(), SolverState::Solved);

        let idx = model.mesh.node_index(7).unwrap();
        assert_relative_eq!(model.result.displacement[idx].dx, 0.01, max_relative = 1e-9);
        let sxx = model.result.get_data(Quantity::Stress1, Component::XX, idx).unwrap();
        assert_relative_eq!(sxx, 1.0, max_relative = 1e-9);
    }

    #[test]
    fn test_default_material_and_mass() {
        let mut model = FemDataModel::new();
        unit_cube(&mut model);
        model.init().unwrap();
        assert_eq!(model.materials.len(), 1);
        assert_eq!(model.mesh.elements[0].material(), 0);
        assert_relative_eq!(model.structure_mass().unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_unresolved_material() {
        let mut model = FemDataModel::new();
        unit_cube(&mut model);
        model.add_material(Material::new(2, 1.0, 0.0, 1.0, 1.0, 1.0));
        assert!(matches!(
            model.init(),
            Err(FemError::UnresolvedReference { kind: "material", label: 1 })
        ));
    }

    #[test]
    fn test_skewed_frame_rejected() {
        let mut model = tension_model(100.0, 0.0);
        model.add_coordinates(CoordinateFrame::new(4, 1.0, 0.2, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0));
        assert!(matches!(model.init(), Err(FemError::InvalidInput(_))));

        // Rounded direction cosines are accepted
        let mut model = tension_model(100.0, 0.0);
        let c = 0.7071;
        model.add_coordinates(CoordinateFrame::new(4, c, -c, 0.0, c, c, 0.0, 0.0, 0.0, 1.0));
        model.init().unwrap();
    }

    #[test]
    fn test_deferred_records_by_element() {
        let mut model = FemDataModel::new();
        unit_cube(&mut model);
        model.set_result_type(ResultType::Element);
        model.add_result_record(ResultRecord { quantity: Quantity::Energy1, label: 1, values: vec![0.5] });
        model.add_result_record(ResultRecord {
            quantity: Quantity::Displacement,
            label: 7,
            values: vec![0.1, 0.0, 0.0],
        });
        model.init().unwrap();
        assert!(model.is_solved());
        assert_eq!(model.result_by_label(Quantity::Energy1, Component::Value, 1).unwrap(), Some(0.5));
        assert_eq!(model.result_by_label(Quantity::Displacement, Component::X, 7).unwrap(), Some(0.1));
    }
}
