//! Rendering strategies for ancestry graphs.
//!
//! A [`Producer`] is assembled from a pre-order walk of the graph. The walk
//! emits `(key, depth)` pairs; [`render_as`] keeps one open producer per depth
//! and, when the walk comes back up to a shallower depth, closes the deeper
//! producers into their parents before opening the new node. The outermost
//! producer is a synthetic forest root that carries no node of its own.

use crate::error::{LineageError, Result};
use crate::graph::ancestry::{AncestryGraph, AncestryNode};

pub mod dot;
pub mod json;
pub mod tree;

pub use dot::{DependencyDotProducer, DotProducer};
pub use json::{JsonNodeData, JsonProducer};
pub use tree::TreeProducer;

#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    pub key: &'a str,
    pub node: &'a AncestryNode,
    pub depth: usize,
}

pub trait Producer: Sized {
    type Output;

    fn for_node(node: Option<NodeRef<'_>>, options: &RenderOptions) -> Self;

    fn add_node(&mut self, child: Self);

    fn produce(&self) -> Self::Output;
}

pub fn render_as<P: Producer>(
    graph: &AncestryGraph,
    root: Option<&str>,
    options: &RenderOptions,
) -> Result<P> {
    if let Some(key) = root {
        if !graph.has_node(key) {
            return Err(LineageError::VersionNotFound(key.to_string()));
        }
    }

    let mut top = P::for_node(None, options);
    let mut open: Vec<P> = Vec::new();
    for visit in graph.dfs(root) {
        close_to_depth(&mut top, &mut open, visit.depth);
        open.push(P::for_node(
            Some(NodeRef {
                key: visit.key,
                node: visit.attrs,
                depth: visit.depth,
            }),
            options,
        ));
    }
    close_to_depth(&mut top, &mut open, 0);
    Ok(top)
}

fn close_to_depth<P: Producer>(top: &mut P, open: &mut Vec<P>, depth: usize) {
    while open.len() > depth {
        let Some(child) = open.pop() else {
            break;
        };
        match open.last_mut() {
            Some(parent) => parent.add_node(child),
            None => top.add_node(child),
        }
    }
}

pub(crate) fn node_label(node: NodeRef<'_>, options: &RenderOptions) -> String {
    if options.verbose {
        format!("{} ({})", node.node.version, node.key)
    } else {
        node.node.version.to_string()
    }
}
