#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod graph;
pub mod registry;
pub mod util;

pub use error::{LineageError, Result};
pub use graph::ancestry::{build_ancestry_graph, AncestryGraph, AncestryNode, AncestryOptions};
pub use graph::dependency::{
    build_dependency_graph, DependencyGraph, DependencyOptions, EdgeDirection,
};
pub use graph::paths::leaf_to_root_paths;
pub use graph::viz::render_as;
