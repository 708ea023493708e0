pub mod engine;
pub mod provisioner;

pub use engine::DocumentQueryEngine;
pub use provisioner::{Provisioner, VirtualColumnSpec};
