//! Utility functions for phaseflow.
//!
//! This module provides:
//! - CURIE parsing and normalization
//! - Request fingerprinting for the attempt journal
//! - Run identifiers

mod curie;
mod fingerprint;
mod run_id;

pub use curie::{Curie, CurieError};
pub use fingerprint::fingerprint;
pub use run_id::RunId;
