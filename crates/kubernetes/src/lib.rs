pub mod manifests;

pub use manifests::*;
