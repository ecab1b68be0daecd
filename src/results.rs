//! Result types for FEA analysis

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::analysis::ResultType;
use crate::boundary::{BoundaryCondition, DofSlot};
use crate::elements::{CoordinateFrame, LayerFields};
use crate::math::SymmetricTensor3;

/// Displacement results at a node
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Displacement {
    /// Displacement in X direction
    pub dx: f64,
    /// Displacement in Y direction
    pub dy: f64,
    /// Displacement in Z direction
    pub dz: f64,
    /// Rotation about X axis
    pub rx: f64,
    /// Rotation about Y axis
    pub ry: f64,
    /// Rotation about Z axis
    pub rz: f64,
}

impl Displacement {
    /// Create from array [DX, DY, DZ, RX, RY, RZ]
    pub fn from_array(arr: [f64; 6]) -> Self {
        Self {
            dx: arr[0],
            dy: arr[1],
            dz: arr[2],
            rx: arr[3],
            ry: arr[4],
            rz: arr[5],
        }
    }

    pub fn as_array(&self) -> [f64; 6] {
        [self.dx, self.dy, self.dz, self.rx, self.ry, self.rz]
    }

    /// Get translation magnitude
    pub fn translation_magnitude(&self) -> f64 {
        (self.dx.powi(2) + self.dy.powi(2) + self.dz.powi(2)).sqrt()
    }

    /// Get rotation magnitude
    pub fn rotation_magnitude(&self) -> f64 {
        (self.rx.powi(2) + self.ry.powi(2) + self.rz.powi(2)).sqrt()
    }
}

/// Result field selector. Layer 1 is the shell top surface, layer 2 the bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quantity {
    Displacement,
    Strain1,
    Stress1,
    Energy1,
    Strain2,
    Stress2,
    Energy2,
    Temperature,
}

impl Quantity {
    pub const ALL: [Quantity; 8] = [
        Quantity::Displacement,
        Quantity::Strain1,
        Quantity::Stress1,
        Quantity::Energy1,
        Quantity::Strain2,
        Quantity::Stress2,
        Quantity::Energy2,
        Quantity::Temperature,
    ];

    /// Record keyword in model files
    pub fn keyword(&self) -> &'static str {
        match self {
            Quantity::Displacement => "displacement",
            Quantity::Strain1 => "strain1",
            Quantity::Stress1 => "stress1",
            Quantity::Energy1 => "strenergy1",
            Quantity::Strain2 => "strain2",
            Quantity::Stress2 => "stress2",
            Quantity::Energy2 => "strenergy2",
            Quantity::Temperature => "temp",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|q| q.keyword() == keyword)
    }

    /// Whether the field lives at nodes regardless of the result type
    pub fn is_nodal(&self) -> bool {
        matches!(self, Quantity::Displacement | Quantity::Temperature)
    }
}

/// Component of a result field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Component {
    X,
    Y,
    Z,
    Magnitude,
    RotX,
    RotY,
    RotZ,
    RotMagnitude,
    XX,
    YY,
    ZZ,
    XY,
    YZ,
    ZX,
    /// Largest principal value
    Max,
    /// Middle principal value
    Mid,
    /// Smallest principal value
    Min,
    VonMises,
    MaxShear,
    /// Scalar fields (energy, temperature)
    Value,
}

/// A result record read from a model file, applied after initialization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub quantity: Quantity,
    /// Node label, or element label for per-element fields
    pub label: i64,
    pub values: Vec<f64>,
}

/// Results of a linear static analysis
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Storage of strain/stress/energy fields
    pub result_type: ResultType,
    /// Global nodal displacements
    pub displacement: Vec<Displacement>,
    /// Largest translation magnitude
    pub disp_max: f64,
    /// Largest rotation magnitude
    pub angle_max: f64,
    pub strain1: Vec<SymmetricTensor3>,
    pub stress1: Vec<SymmetricTensor3>,
    pub s_energy1: Vec<f64>,
    pub strain2: Vec<SymmetricTensor3>,
    pub stress2: Vec<SymmetricTensor3>,
    pub s_energy2: Vec<f64>,
    pub temperature: Vec<f64>,
}

impl AnalysisResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Expand the free-DOF solution into global nodal displacements.
    ///
    /// Constrained slots take the prescribed value. Nodes restrained in a
    /// local frame are solved in that frame and converted back to global.
    pub fn set_displacement(
        &mut self,
        bc: &BoundaryCondition,
        frames: &[CoordinateFrame],
        free: &DVector<f64>,
        node_count: usize,
    ) {
        self.displacement = Vec::with_capacity(node_count);
        self.disp_max = 0.0;
        self.angle_max = 0.0;

        for node in 0..node_count {
            let o = bc.offset(node);
            let mut values = [0.0; 6];
            for (c, v) in values.iter_mut().enumerate().take(bc.dof_count(node)) {
                *v = match bc.slot(o + c) {
                    DofSlot::Free(k) => free[k],
                    DofSlot::Constrained { .. } => bc.get_rest_disp(o + c),
                };
            }
            if let Some(fi) = bc.node_frame(node) {
                values = frames[fi].to_global6(&values);
            }
            self.push_displacement(Displacement::from_array(values));
        }
    }

    fn push_displacement(&mut self, d: Displacement) {
        self.disp_max = self.disp_max.max(d.translation_magnitude());
        self.angle_max = self.angle_max.max(d.rotation_magnitude());
        self.displacement.push(d);
    }

    /// Reset strain/stress/energy storage to `count` zero entries
    pub fn init_structure_data(&mut self, count: usize) {
        let zero = SymmetricTensor3::zero();
        self.strain1 = vec![zero; count];
        self.stress1 = vec![zero; count];
        self.s_energy1 = vec![0.0; count];
        self.strain2 = vec![zero; count];
        self.stress2 = vec![zero; count];
        self.s_energy2 = vec![0.0; count];
    }

    /// Accumulate `weight` times a contribution at `index`
    pub fn add_structure_data(&mut self, index: usize, fields: &LayerFields, weight: f64) {
        self.strain1[index].add(&fields.top.strain.scaled(weight));
        self.stress1[index].add(&fields.top.stress.scaled(weight));
        self.s_energy1[index] += weight * fields.top.energy;
        self.strain2[index].add(&fields.bottom.strain.scaled(weight));
        self.stress2[index].add(&fields.bottom.stress.scaled(weight));
        self.s_energy2[index] += weight * fields.bottom.energy;
    }

    /// Multiply each accumulated entry by its factor
    pub fn mul_structure_data(&mut self, factors: &[f64]) {
        for (i, &f) in factors.iter().enumerate() {
            self.strain1[i].scale(f);
            self.stress1[i].scale(f);
            self.s_energy1[i] *= f;
            self.strain2[i].scale(f);
            self.stress2[i].scale(f);
            self.s_energy2[i] *= f;
        }
    }

    /// Number of entries of a quantity
    pub fn len(&self, quantity: Quantity) -> usize {
        match quantity {
            Quantity::Displacement => self.displacement.len(),
            Quantity::Strain1 => self.strain1.len(),
            Quantity::Stress1 => self.stress1.len(),
            Quantity::Energy1 => self.s_energy1.len(),
            Quantity::Strain2 => self.strain2.len(),
            Quantity::Stress2 => self.stress2.len(),
            Quantity::Energy2 => self.s_energy2.len(),
            Quantity::Temperature => self.temperature.len(),
        }
    }

    /// Whether a displacement field is present
    pub fn has_displacement(&self) -> bool {
        !self.displacement.is_empty()
    }

    fn tensor(&self, quantity: Quantity, index: usize) -> Option<&SymmetricTensor3> {
        match quantity {
            Quantity::Strain1 => self.strain1.get(index),
            Quantity::Stress1 => self.stress1.get(index),
            Quantity::Strain2 => self.strain2.get(index),
            Quantity::Stress2 => self.stress2.get(index),
            _ => None,
        }
    }

    /// Generic accessor for contour values.
    ///
    /// Returns `None` when the field is absent, the index is out of range
    /// or the component does not apply to the quantity.
    pub fn get_data(&self, quantity: Quantity, component: Component, index: usize) -> Option<f64> {
        match quantity {
            Quantity::Displacement => {
                let d = self.displacement.get(index)?;
                match component {
                    Component::X => Some(d.dx),
                    Component::Y => Some(d.dy),
                    Component::Z => Some(d.dz),
                    Component::Magnitude => Some(d.translation_magnitude()),
                    Component::RotX => Some(d.rx),
                    Component::RotY => Some(d.ry),
                    Component::RotZ => Some(d.rz),
                    Component::RotMagnitude => Some(d.rotation_magnitude()),
                    _ => None,
                }
            }
            Quantity::Energy1 | Quantity::Energy2 | Quantity::Temperature => {
                let values = match quantity {
                    Quantity::Energy1 => &self.s_energy1,
                    Quantity::Energy2 => &self.s_energy2,
                    _ => &self.temperature,
                };
                match component {
                    Component::Value => values.get(index).copied(),
                    _ => None,
                }
            }
            _ => {
                let t = self.tensor(quantity, index)?;
                match component {
                    Component::XX => Some(t.xx),
                    Component::YY => Some(t.yy),
                    Component::ZZ => Some(t.zz),
                    Component::XY => Some(t.xy),
                    Component::YZ => Some(t.yz),
                    Component::ZX => Some(t.zx),
                    Component::Max => Some(t.principal()[0]),
                    Component::Mid => Some(t.principal()[1]),
                    Component::Min => Some(t.principal()[2]),
                    Component::VonMises => Some(t.von_mises()),
                    Component::MaxShear => Some(t.max_shear()),
                    _ => None,
                }
            }
        }
    }

    /// Store a record's values at `index`, growing the field as needed
    pub fn apply_record(&mut self, record: &ResultRecord, index: usize) {
        let v = &record.values;
        let scalar = v.first().copied().unwrap_or(0.0);
        let tensor = || {
            let mut c = [0.0; 6];
            for (dst, src) in c.iter_mut().zip(v) {
                *dst = *src;
            }
            SymmetricTensor3::new(c[0], c[1], c[2], c[3], c[4], c[5])
        };

        fn slot<T: Clone + Default>(field: &mut Vec<T>, index: usize) -> &mut T {
            if field.len() <= index {
                field.resize(index + 1, T::default());
            }
            &mut field[index]
        }

        match record.quantity {
            Quantity::Displacement => {
                let mut c = [0.0; 6];
                for (dst, src) in c.iter_mut().zip(v) {
                    *dst = *src;
                }
                let d = Displacement::from_array(c);
                self.disp_max = self.disp_max.max(d.translation_magnitude());
                self.angle_max = self.angle_max.max(d.rotation_magnitude());
                *slot(&mut self.displacement, index) = d;
            }
            Quantity::Strain1 => *slot(&mut self.strain1, index) = tensor(),
            Quantity::Stress1 => *slot(&mut self.stress1, index) = tensor(),
            Quantity::Energy1 => *slot(&mut self.s_energy1, index) = scalar,
            Quantity::Strain2 => *slot(&mut self.strain2, index) = tensor(),
            Quantity::Stress2 => *slot(&mut self.stress2, index) = tensor(),
            Quantity::Energy2 => *slot(&mut self.s_energy2, index) = scalar,
            Quantity::Temperature => *slot(&mut self.temperature, index) = scalar,
        }
    }
}
