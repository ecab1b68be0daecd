//! Node - a labelled point in 3D space

use serde::{Deserialize, Serialize};

use crate::math::Vec3;

/// A mesh node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// User-facing label (may be sparse or unordered)
    pub label: i64,
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Z coordinate
    pub z: f64,
}

impl Node {
    /// Create a new node at the given coordinates
    pub fn new(label: i64, x: f64, y: f64, z: f64) -> Self {
        Self { label, x, y, z }
    }

    /// Get the coordinates as a vector
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}
