//! Case dataset: historical symptom/diagnosis records held read-only.
//!
//! Loaded once at startup from a CSV table. Symptom cells are normalized to
//! booleans at this boundary so matchers never see raw cell values.

pub mod dataset;
pub mod loader;
pub mod types;

pub use dataset::CaseDataset;
pub use loader::{is_truthy, CaseLoader, REQUIRED_COLUMNS};
pub use types::*;
