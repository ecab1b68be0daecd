//! Node loads - forces and moments applied directly to nodes

use serde::{Deserialize, Serialize};

/// A force/moment applied at a node, optionally in a local frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Load {
    /// Label of the loaded node
    pub node_label: i64,
    /// Label of the local coordinate frame (None = global frame)
    pub coords_label: Option<i64>,
    /// Components [FX, FY, FZ, MX, MY, MZ]
    pub values: [f64; 6],

    /// Dense node index, resolved at initialization
    #[serde(skip)]
    pub(crate) node: usize,
    /// Coordinate frame index, resolved at initialization
    #[serde(skip)]
    pub(crate) coords: Option<usize>,
}

impl Load {
    /// Create a new node load with all components
    pub fn new(node_label: i64, values: [f64; 6]) -> Self {
        Self {
            node_label,
            coords_label: None,
            values,
            node: 0,
            coords: None,
        }
    }

    /// Create a force-only node load
    pub fn force(node_label: i64, fx: f64, fy: f64, fz: f64) -> Self {
        Self::new(node_label, [fx, fy, fz, 0.0, 0.0, 0.0])
    }

    /// Express the load in a local coordinate frame
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_force_constructor() {
        let load = Load::force(4, 1.0, -2.0, 3.0);
        assert_eq!(load.values, [1.0, -2.0, 3.0, 0.0, 0.0, 0.0]);
        assert_eq!(load.with_coords(2).coords_label, Some(2));
    }
}
