//! Text model format
//!
//! One record per line, whitespace separated, keyword first:
//!
//! ```text
//! material 1 210000 0.3 0 7.85e-9 45 460
//! node 1 0 0 0
//! hexaelement1 1 1  1 2 3 4 5 6 7 8
//! restraint 1  1 0 1 0 1 0
//! load 7  0 0 -100
//! ```
//!
//! Keywords are case-insensitive. Lines with too few fields or fields that
//! do not parse are skipped.

mod reader;
mod writer;

pub use reader::{parse_into, read_file, read_model, read_from};
pub use writer::{write_file, write_model, write_results, ModelWriter};
