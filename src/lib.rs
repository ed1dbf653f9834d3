//! funckit: scaffold, package and containerise function apps.
//!
//! This crate re-exports the workspace members so integration tests and
//! embedders can depend on one crate.

pub use funckit_kubernetes as kubernetes;
pub use funckit_models as models;
pub use funckit_packaging as packaging;
pub use funckit_scaffold as scaffold;
pub use funckit_templates as templates;

pub use funckit_models::{Config, FuncError, Language, WorkerRuntime};
