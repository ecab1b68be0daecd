//! Section properties for shell elements

use serde::{Deserialize, Serialize};

/// Shell section parameter, referenced by shell elements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShellParameter {
    /// Parameter label
    pub label: i64,
    /// Shell thickness
    pub thickness: f64,
}

impl ShellParameter {
    pub fn new(label: i64, thickness: f64) -> Self {
        Self { label, thickness }
    }
}
