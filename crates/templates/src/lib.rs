pub mod assets;
pub mod dockerfile;
pub mod recipe;

pub use dockerfile::{render_dockerfile, DockerfileKind, DockerfileParams, DockerfileRenderer};
pub use recipe::{CopyInstruction, Instruction, Recipe, Stage, Step};
