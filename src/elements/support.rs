//! Restraints - prescribed displacements at nodes

use serde::{Deserialize, Serialize};

/// Restraint conditions at a node, optionally in a local frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restraint {
    /// Label of the restrained node
    pub node_label: i64,
    /// Label of the local coordinate frame (None = global frame)
    pub coords_label: Option<i64>,
    /// Fix flags [X, Y, Z, RX, RY, RZ]
    pub rest: [bool; 6],
    /// Prescribed displacements [X, Y, Z, RX, RY, RZ]
    pub values: [f64; 6],

    /// Dense node index, resolved at initialization
    #[serde(skip)]
    pub(crate) node: usize,
    /// Coordinate frame index, resolved at initialization
    #[serde(skip)]
    pub(crate) coords: Option<usize>,
}

impl Restraint {
    /// Create a restraint. Returns `None` when no component is fixed,
    /// since such a record carries no constraint.
    pub fn new(node_label: i64, rest: [bool; 6], values: [f64; 6]) -> Option<Self> {
        if !rest.iter().any(|&r| r) {
            return None;
        }
        Some(Self {
            node_label,
            coords_label: None,
            rest,
            values,
            node: 0,
            coords: None,
        })
    }

    /// Translations fixed at zero, rotations free
    pub fn pinned(node_label: i64) -> Self {
        Self::fixed_components(node_label, [true, true, true, false, false, false])
    }

    /// All six components fixed at zero
    pub fn fixed(node_label: i64) -> Self {
        Self::fixed_components(node_label, [true; 6])
    }

    fn fixed_components(node_label: i64, rest: [bool; 6]) -> Self {
        Self {
            node_label,
            coords_label: None,
            rest,
            values: [0.0; 6],
            node: 0,
            coords: None,
        }
    }

    /// Express the restraint in a local coordinate frame
    pub fn with_coords(mut self, coords_label: i64) -> Self {
        self.coords_label = Some(coords_label);
        self
    }

    /// Dense node index (valid after initialization)
    pub fn node(&self) -> usize {
        self.node
    }

    /// Coordinate frame index (valid after initialization)
    pub fn coords(&self) -> Option<usize> {
        self.coords
    }

    /// Count number of restrained components
    pub fn num_restrained(&self) -> usize {
        self.rest.iter().filter(|&&r| r).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_void_restraint_is_dropped() {
        assert!(Restraint::new(1, [false; 6], [0.0; 6]).is_none());
    }

    #[test]
    fn test_fixed_restraint() {
        let r = Restraint::fixed(3);
        assert_eq!(r.num_restrained(), 6);
        assert_eq!(r.coords_label, None);
    }

    #[test]
    fn test_pinned_restraint() {
        let r = Restraint::pinned(3);
        assert_eq!(r.rest, [true, true, true, false, false, false]);
        assert_eq!(r.num_restrained(), 3);
    }

    #[test]
    fn test_prescribed_value() {
        let r = Restraint::new(5, [false, true, false, false, false, false], [0.0, -0.01, 0.0, 0.0, 0.0, 0.0])
            .unwrap()
            .with_coords(2);
        assert_eq!(r.values[1], -0.01);
        assert_eq!(r.coords_label, Some(2));
    }
}
