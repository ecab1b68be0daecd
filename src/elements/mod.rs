//! Structural elements module

pub mod base;
mod coordinate;
mod material;
mod node;
mod section;
pub mod shell;
pub mod solid;
mod support;

use serde::{Deserialize, Serialize};

use crate::error::FemResult;
use crate::math::{Mat, Vec3};

pub use base::{ElementInput, LayerFields, PointFields};
pub use coordinate::CoordinateFrame;
pub use material::{ConstitutiveMatrices, Material, SHEAR_CORRECTION};
pub use node::Node;
pub use section::ShellParameter;
pub use shell::{QuadShell4, TriShell3, DRILLING_COEF};
pub use solid::Hexa8;
pub use support::Restraint;

/// Behaviour shared by every element formulation.
///
/// Matrices are returned in global coordinates with `dof_per_node`
/// DOF per node, in element node order.
pub trait ElementFormulation: Sync {
    fn node_count(&self) -> usize;

    /// 3 for solids, 6 for shells
    fn dof_per_node(&self) -> usize;

    fn is_shell(&self) -> bool;

    /// Border faces as local node indices, wound outward
    fn border_faces(&self) -> &'static [&'static [usize]];

    /// Reverse the winding of an element's node list in place
    fn mirror(&self, nodes: &mut [usize]);

    /// Stiffness matrix, Σ Bᵀ D B |det J| w
    fn stiffness(&self, input: &ElementInput) -> FemResult<Mat>;

    /// Mass matrix, Σ ρ Nᵀ N |det J| w
    fn mass(&self, input: &ElementInput) -> FemResult<Mat>;

    /// Strain, stress and energy averaged over the Gauss points
    fn element_fields(&self, input: &ElementInput, disp: &[[f64; 6]]) -> FemResult<LayerFields>;

    /// Strain, stress and energy evaluated at each node
    fn nodal_fields(&self, input: &ElementInput, disp: &[[f64; 6]]) -> FemResult<Vec<LayerFields>>;

    /// Angle subtended at each node, used to weight nodal averages
    fn corner_angles(&self, coords: &[Vec3]) -> Vec<f64>;
}

static HEXA8: Hexa8 = Hexa8;
static QUAD_SHELL4: QuadShell4 = QuadShell4;
static TRI_SHELL3: TriShell3 = TriShell3;

/// Element type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    /// 8-node hexahedral solid
    Hexa8,
    /// 4-node quadrilateral shell
    QuadShell4,
    /// 3-node triangular shell
    TriShell3,
}

impl ElementKind {
    pub fn formulation(&self) -> &'static dyn ElementFormulation {
        match self {
            ElementKind::Hexa8 => &HEXA8,
            ElementKind::QuadShell4 => &QUAD_SHELL4,
            ElementKind::TriShell3 => &TRI_SHELL3,
        }
    }

    pub fn node_count(&self) -> usize {
        self.formulation().node_count()
    }

    pub fn is_shell(&self) -> bool {
        self.formulation().is_shell()
    }

    /// Keyword of the element record in model files
    pub fn keyword(&self) -> &'static str {
        match self {
            ElementKind::Hexa8 => "hexaelement1",
            ElementKind::QuadShell4 => "quadelement1",
            ElementKind::TriShell3 => "triaelement1",
        }
    }
}

/// A mesh element
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    /// Element label
    pub label: i64,
    /// Element type
    pub kind: ElementKind,
    /// Label of the material
    pub material_label: i64,
    /// Label of the shell parameter (shells only)
    pub param_label: Option<i64>,
    /// Node labels in element order
    pub node_labels: Vec<i64>,

    /// Resolved material index
    #[serde(skip)]
    pub(crate) material: usize,
    /// Resolved shell parameter index
    #[serde(skip)]
    pub(crate) param: Option<usize>,
    /// Resolved dense node indices
    #[serde(skip)]
    pub(crate) nodes: Vec<usize>,
}

impl Element {
    fn with_kind(label: i64, kind: ElementKind, material_label: i64, param_label: Option<i64>, node_labels: Vec<i64>) -> Self {
        Self {
            label,
            kind,
            material_label,
            param_label,
            node_labels,
            material: 0,
            param: None,
            nodes: Vec::new(),
        }
    }

    /// Create an 8-node hexahedron
    pub fn hexa(label: i64, material_label: i64, nodes: [i64; 8]) -> Self {
        Self::with_kind(label, ElementKind::Hexa8, material_label, None, nodes.to_vec())
    }

    /// Create a 4-node quadrilateral shell
    pub fn quad(label: i64, material_label: i64, param_label: i64, nodes: [i64; 4]) -> Self {
        Self::with_kind(label, ElementKind::QuadShell4, material_label, Some(param_label), nodes.to_vec())
    }

    /// Create a 3-node triangular shell
    pub fn tria(label: i64, material_label: i64, param_label: i64, nodes: [i64; 3]) -> Self {
        Self::with_kind(label, ElementKind::TriShell3, material_label, Some(param_label), nodes.to_vec())
    }

    pub fn formulation(&self) -> &'static dyn ElementFormulation {
        self.kind.formulation()
    }

    pub fn is_shell(&self) -> bool {
        self.kind.is_shell()
    }

    /// Dense node indices (valid after initialization)
    pub fn nodes(&self) -> &[usize] {
        &self.nodes
    }

    /// Material index (valid after initialization)
    pub fn material(&self) -> usize {
        self.material
    }

    /// Shell parameter index (valid after initialization)
    pub fn param(&self) -> Option<usize> {
        self.param
    }

    /// Reverse the node winding, keeping labels and indices in step.
    ///
    /// Initialization only mirrors inverted solids. On a shell this flips
    /// the normal, so the top and bottom result layers swap; it is never
    /// applied implicitly.
    pub fn mirror(&mut self) {
        let f = self.formulation();
        let mut order: Vec<usize> = (0..self.node_labels.len()).collect();
        f.mirror(&mut order);
        self.node_labels = order.iter().map(|&i| self.node_labels[i]).collect();
        if self.nodes.len() == order.len() {
            self.nodes = order.iter().map(|&i| self.nodes[i]).collect();
        }
    }

    /// Border faces as dense node indices
    pub fn border_faces(&self) -> Vec<Vec<usize>> {
        self.formulation()
            .border_faces()
            .iter()
            .map(|face| face.iter().map(|&i| self.nodes[i]).collect())
            .collect()
    }
}
