//! Mesh model: nodes, elements and derived boundary topology

use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::elements::base::{centroid, face_normal};
use crate::elements::{Element, Node};
use crate::error::{FemError, FemResult};
use crate::math::Vec3;

/// Nodes and elements of a model, plus boundary faces and edges
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshModel {
    pub nodes: Vec<Node>,
    pub elements: Vec<Element>,

    /// Boundary faces (dense node indices, original winding)
    #[serde(skip)]
    free_faces: Vec<Vec<usize>>,
    /// Boundary wireframe edges, (low, high) dense node indices
    #[serde(skip)]
    face_edges: Vec<[usize; 2]>,
    /// Node label to dense index
    #[serde(skip)]
    node_index: HashMap<i64, usize>,
}

impl MeshModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove all nodes, elements and derived topology
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.elements.clear();
        self.free_faces.clear();
        self.face_edges.clear();
        self.node_index.clear();
    }

    /// Dense index of a node label (valid after `renumber`)
    pub fn node_index(&self, label: i64) -> Option<usize> {
        self.node_index.get(&label).copied()
    }

    /// Sort nodes by label and re-target element node labels to dense indices
    pub fn renumber(&mut self) -> FemResult<()> {
        self.nodes.sort_by_key(|n| n.label);
        self.node_index.clear();
        for (i, node) in self.nodes.iter().enumerate() {
            if self.node_index.insert(node.label, i).is_some() {
                return Err(FemError::DuplicateLabel { kind: "node", label: node.label });
            }
        }

        self.elements.sort_by_key(|e| e.label);
        for pair in self.elements.windows(2) {
            if pair[0].label == pair[1].label {
                return Err(FemError::DuplicateLabel { kind: "element", label: pair[0].label });
            }
        }

        for element in &mut self.elements {
            element.nodes = element
                .node_labels
                .iter()
                .map(|label| {
                    self.node_index
                        .get(label)
                        .copied()
                        .ok_or(FemError::UnresolvedReference { kind: "node", label: *label })
                })
                .collect::<FemResult<Vec<_>>>()?;
        }
        Ok(())
    }

    /// Positions of an element's nodes
    pub fn element_coords(&self, element: &Element) -> Vec<Vec3> {
        element.nodes().iter().map(|&i| self.nodes[i].position()).collect()
    }

    /// Make every solid element's face normals point outward.
    ///
    /// The first border face normal is compared with the direction from
    /// the face centroid to the element centroid; when both agree the
    /// element is mirrored. Returns the number of mirrored elements.
    pub fn check_chirality(&mut self) -> usize {
        let mut mirrored = 0;
        for i in 0..self.elements.len() {
            let element = &self.elements[i];
            if element.is_shell() {
                continue;
            }
            let coords = self.element_coords(element);
            let face = element.formulation().border_faces()[0];
            let face_pts: Vec<Vec3> = face.iter().map(|&j| coords[j]).collect();

            let normal = face_normal(&face_pts);
            let inward = centroid(&coords) - centroid(&face_pts);
            if normal.dot(&inward) > 0.0 {
                self.elements[i].mirror();
                mirrored += 1;
            }
        }
        if mirrored > 0 {
            debug!("Mirrored {} elements with inverted winding", mirrored);
        }
        mirrored
    }

    /// Derive boundary faces.
    ///
    /// Faces are keyed by their sorted node list and the list is sorted
    /// by key; adjacent equal pairs are interior faces and cancel.
    pub fn get_free_faces(&mut self) -> &[Vec<usize>] {
        let mut faces: Vec<(Vec<usize>, Vec<usize>)> = self
            .elements
            .iter()
            .flat_map(|e| e.border_faces())
            .map(|face| {
                let mut key = face.clone();
                key.sort_unstable();
                (key, face)
            })
            .collect();
        faces.sort_by(|a, b| a.0.cmp(&b.0));

        self.free_faces.clear();
        let mut i = 0;
        while i < faces.len() {
            if i + 1 < faces.len() && faces[i].0 == faces[i + 1].0 {
                i += 2;
            } else {
                self.free_faces.push(std::mem::take(&mut faces[i].1));
                i += 1;
            }
        }
        &self.free_faces
    }

    /// Derive boundary edges from the boundary faces, one entry per edge
    pub fn get_face_edges(&mut self) -> &[[usize; 2]] {
        let mut edges: Vec<[usize; 2]> = self
            .free_faces
            .iter()
            .flat_map(|face| {
                (0..face.len()).map(move |i| {
                    let (a, b) = (face[i], face[(i + 1) % face.len()]);
                    [a.min(b), a.max(b)]
                })
            })
            .collect();
        edges.sort_unstable();
        edges.dedup();
        self.face_edges = edges;
        &self.face_edges
    }

    /// Boundary faces from the last derivation
    pub fn free_faces(&self) -> &[Vec<usize>] {
        &self.free_faces
    }

    /// Boundary edges from the last derivation
    pub fn face_edges(&self) -> &[[usize; 2]] {
        &self.face_edges
    }

    /// Axis-aligned bounding box of the node set
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = self.nodes.first()?.position();
        Some(self.nodes.iter().fold((first, first), |(lo, hi), n| {
            let p = n.position();
            (lo.inf(&p), hi.sup(&p))
        }))
    }

    /// Diagonal length of the bounding box
    pub fn size(&self) -> f64 {
        self.bounds().map(|(lo, hi)| (hi - lo).norm()).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two unit cubes stacked along x, sharing the face at x = 1
    fn two_cubes() -> MeshModel {
        let mut mesh = MeshModel::new();
        let mut label = 1;
        for z in [0.0, 1.0] {
            for y in [0.0, 1.0] {
                for x in [0.0, 1.0, 2.0] {
                    mesh.nodes.push(Node::new(label, x, y, z));
                    label += 1;
                }
            }
        }
        // Labels: z=0: (1,2,3) y=0, (4,5,6) y=1; z=1: (7,8,9), (10,11,12)
        mesh.elements.push(Element::hexa(1, 1, [1, 2, 5, 4, 7, 8, 11, 10]));
        mesh.elements.push(Element::hexa(2, 1, [2, 3, 6, 5, 8, 9, 12, 11]));
        mesh.renumber().unwrap();
        mesh
    }

    #[test]
    fn test_interior_face_cancels() {
        let mut mesh = two_cubes();
        let faces = mesh.get_free_faces().to_vec();
        assert_eq!(faces.len(), 10);
        let shared = {
            let mut k = vec![1, 4, 7, 10];
            k.sort_unstable();
            k
        };
        assert!(faces.iter().all(|f| {
            let mut k = f.clone();
            k.sort_unstable();
            k != shared
        }));
    }

    #[test]
    fn test_face_edges_dedup() {
        let mut mesh = two_cubes();
        mesh.get_free_faces();
        // 12 edges per cube, 4 shared
        assert_eq!(mesh.get_face_edges().len(), 20);
    }

    #[test]
    fn test_chirality_mirrors_inverted_element() {
        let mut mesh = MeshModel::new();
        let pts = [
            (0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (1.0, 1.0, 0.0), (0.0, 1.0, 0.0),
            (0.0, 0.0, 1.0), (1.0, 0.0, 1.0), (1.0, 1.0, 1.0), (0.0, 1.0, 1.0),
        ];
        for (i, p) in pts.iter().enumerate() {
            mesh.nodes.push(Node::new(i as i64 + 1, p.0, p.1, p.2));
        }
        // Top and bottom swapped
        mesh.elements.push(Element::hexa(1, 1, [5, 6, 7, 8, 1, 2, 3, 4]));
        mesh.renumber().unwrap();
        assert_eq!(mesh.check_chirality(), 1);
        assert_eq!(mesh.elements[0].node_labels, vec![1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(mesh.check_chirality(), 0);
    }

    #[test]
    fn test_unresolved_node() {
        let mut mesh = MeshModel::new();
        mesh.nodes.push(Node::new(1, 0.0, 0.0, 0.0));
        mesh.elements.push(Element::tria(1, 1, 1, [1, 2, 3]));
        assert!(matches!(
            mesh.renumber(),
            Err(FemError::UnresolvedReference { kind: "node", label: 2 })
        ));
    }

    #[test]
    fn test_bounds() {
        let mesh = two_cubes();
        let (lo, hi) = mesh.bounds().unwrap();
        assert_eq!(lo, Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(hi, Vec3::new(2.0, 1.0, 1.0));
    }
}
