//! Boundary conditions and global DOF numbering

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::elements::{CoordinateFrame, Restraint};
use crate::error::{FemError, FemResult};
use crate::loads::Load;
use crate::mesh::MeshModel;

/// Meaning of one slot of the unified (free + constrained) numbering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DofSlot {
    /// Unknown, position in the reduced system
    Free(usize),
    /// Prescribed by a component of a restraint
    Constrained { restraint: usize, component: usize },
}

/// Restraints, loads and the DOF map built from them
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoundaryCondition {
    pub restraints: Vec<Restraint>,
    pub loads: Vec<Load>,

    /// DOF count per node (3 or 6)
    #[serde(skip)]
    dof: Vec<usize>,
    /// First slot of each node
    #[serde(skip)]
    offsets: Vec<usize>,
    #[serde(skip)]
    slots: Vec<DofSlot>,
    #[serde(skip)]
    free_count: usize,
    /// Restraint index per node, last one wins
    #[serde(skip)]
    node_restraint: Vec<Option<usize>>,
}

impl BoundaryCondition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Append a restraint; returns false when it fixes nothing and was dropped
    pub fn add_restraint(&mut self, restraint: Restraint) -> bool {
        if restraint.num_restrained() == 0 {
            return false;
        }
        self.restraints.push(restraint);
        true
    }

    pub fn add_load(&mut self, load: Load) {
        self.loads.push(load);
    }

    /// Sort records by node label and resolve node and frame references
    pub fn resolve(&mut self, mesh: &MeshModel, frames: &[CoordinateFrame]) -> FemResult<()> {
        self.restraints.sort_by_key(|r| r.node_label);
        self.loads.sort_by_key(|l| l.node_label);

        let frame_index: HashMap<i64, usize> = frames.iter().enumerate().map(|(i, f)| (f.label, i)).collect();
        let find_frame = |label: Option<i64>| -> FemResult<Option<usize>> {
            label
                .map(|l| {
                    frame_index
                        .get(&l)
                        .copied()
                        .ok_or(FemError::UnresolvedReference { kind: "coordinates", label: l })
                })
                .transpose()
        };
        let find_node = |label: i64| {
            mesh.node_index(label)
                .ok_or(FemError::UnresolvedReference { kind: "node", label })
        };

        for r in &mut self.restraints {
            r.node = find_node(r.node_label)?;
            r.coords = find_frame(r.coords_label)?;
        }
        for l in &mut self.loads {
            l.node = find_node(l.node_label)?;
            l.coords = find_frame(l.coords_label)?;
        }
        Ok(())
    }

    /// Assign 3 DOF per node, 6 for nodes touched by a shell element
    pub fn set_node_dof(&mut self, mesh: &MeshModel) {
        self.dof = vec![3; mesh.nodes.len()];
        for element in mesh.elements.iter().filter(|e| e.is_shell()) {
            for &n in element.nodes() {
                self.dof[n] = 6;
            }
        }
    }

    /// Build node offsets and the slot table; returns the total DOF count
    pub fn set_pointer_structure(&mut self, node_count: usize) -> usize {
        if self.dof.len() != node_count {
            self.dof.resize(node_count, 3);
        }
        self.offsets = Vec::with_capacity(node_count);
        let mut total = 0;
        for &d in &self.dof {
            self.offsets.push(total);
            total += d;
        }

        let mut constrained: Vec<Option<(usize, usize)>> = vec![None; total];
        self.node_restraint = vec![None; node_count];
        for (ri, r) in self.restraints.iter().enumerate() {
            let node = r.node;
            self.node_restraint[node] = Some(ri);
            for c in 0..self.dof[node] {
                if r.rest[c] {
                    constrained[self.offsets[node] + c] = Some((ri, c));
                }
            }
        }

        let mut next_free = 0;
        self.slots = constrained
            .into_iter()
            .map(|slot| match slot {
                Some((restraint, component)) => DofSlot::Constrained { restraint, component },
                None => {
                    next_free += 1;
                    DofSlot::Free(next_free - 1)
                }
            })
            .collect();
        self.free_count = next_free;
        total
    }

    /// Prescribed displacement of a constrained slot (0 for free slots)
    pub fn get_rest_disp(&self, slot: usize) -> f64 {
        match self.slots.get(slot) {
            Some(DofSlot::Constrained { restraint, component }) => self.restraints[*restraint].values[*component],
            _ => 0.0,
        }
    }

    pub fn dof_count(&self, node: usize) -> usize {
        self.dof[node]
    }

    pub fn offset(&self, node: usize) -> usize {
        self.offsets[node]
    }

    pub fn slot(&self, index: usize) -> DofSlot {
        self.slots[index]
    }

    pub fn slots(&self) -> &[DofSlot] {
        &self.slots
    }

    pub fn free_count(&self) -> usize {
        self.free_count
    }

    pub fn total_dofs(&self) -> usize {
        self.slots.len()
    }

    /// Local frame of the restraint at a node, if any
    pub fn node_frame(&self, node: usize) -> Option<usize> {
        self.node_restraint
            .get(node)
            .copied()
            .flatten()
            .and_then(|ri| self.restraints[ri].coords)
    }

    /// Global slot indices of each node of an element, `per_node` DOF per node
    pub fn element_dofs(&self, nodes: &[usize], per_node: usize) -> Vec<usize> {
        nodes
            .iter()
            .flat_map(|&n| (0..per_node).map(move |c| self.offsets[n] + c))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{Element, Node};

    fn mesh_with_shell() -> MeshModel {
        let mut mesh = MeshModel::new();
        for (i, p) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (2.0, 0.0)].iter().enumerate() {
            mesh.nodes.push(Node::new(i as i64 + 1, p.0, p.1, 0.0));
        }
        mesh.elements.push(Element::tria(1, 1, 1, [1, 2, 3]));
        mesh.renumber().unwrap();
        mesh
    }

    #[test]
    fn test_dof_promotion_and_offsets() {
        let mesh = mesh_with_shell();
        let mut bc = BoundaryCondition::new();
        bc.resolve(&mesh, &[]).unwrap();
        bc.set_node_dof(&mesh);
        let total = bc.set_pointer_structure(mesh.nodes.len());
        assert_eq!(total, 6 + 6 + 6 + 3 + 3);
        assert_eq!(bc.offset(3), 18);
        assert_eq!(bc.offset(4), 21);
        assert_eq!(bc.free_count(), total);
    }

    #[test]
    fn test_constrained_slots_and_values() {
        let mesh = mesh_with_shell();
        let mut bc = BoundaryCondition::new();
        let r = Restraint::new(4, [true, false, true, true, true, true], [0.5, 0.0, -1.0, 0.0, 0.0, 0.0]).unwrap();
        bc.add_restraint(r);
        assert!(!bc.add_restraint(Restraint {
            rest: [false; 6],
            ..Restraint::fixed(1)
        }));
        bc.resolve(&mesh, &[]).unwrap();
        bc.set_node_dof(&mesh);
        let total = bc.set_pointer_structure(mesh.nodes.len());

        // Node 4 has 3 DOF, rotational flags are ignored
        assert_eq!(bc.free_count(), total - 2);
        assert_eq!(bc.slot(18), DofSlot::Constrained { restraint: 0, component: 0 });
        assert_eq!(bc.slot(19), DofSlot::Free(18));
        assert_eq!(bc.get_rest_disp(18), 0.5);
        assert_eq!(bc.get_rest_disp(20), -1.0);
        assert_eq!(bc.get_rest_disp(0), 0.0);
        assert_eq!(bc.node_frame(3), None);
    }

    #[test]
    fn test_unresolved_frame() {
        let mesh = mesh_with_shell();
        let mut bc = BoundaryCondition::new();
        bc.add_restraint(Restraint::fixed(1).with_coords(9));
        assert!(matches!(
            bc.resolve(&mesh, &[]),
            Err(FemError::UnresolvedReference { kind: "coordinates", label: 9 })
        ));
    }
}
