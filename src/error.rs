//! Error types for the FEM core

use thiserror::Error;

/// Main error type for initialization and solve operations
#[derive(Error, Debug)]
pub enum FemError {
    #[error("{kind} label {label} not found in model")]
    UnresolvedReference { kind: &'static str, label: i64 },

    #[error("Duplicate {kind} label {label}")]
    DuplicateLabel { kind: &'static str, label: i64 },

    #[error("Singular matrix - zero pivot at row {row}")]
    SingularMatrix { row: usize },

    #[error("Cannot compute: no restraints defined, the model has rigid body motion")]
    InsufficientConstraints,

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Model not initialized - run init() first")]
    NotInitialized,

    #[error("Model not analyzed - run solve() first")]
    NotAnalyzed,

    #[error("Solve cancelled")]
    Cancelled,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for FEM operations
pub type FemResult<T> = Result<T, FemError>;
