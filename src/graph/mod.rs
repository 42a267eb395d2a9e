use std::collections::{HashMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

pub mod ancestry;
pub mod dependency;
pub mod paths;
pub mod viz;

#[derive(Debug, Clone)]
pub struct GraphNode<A> {
    pub key: String,
    pub attrs: A,
}

#[derive(Debug, Clone, Copy)]
pub struct Visit<'a, A> {
    pub key: &'a str,
    pub attrs: &'a A,
    pub depth: usize,
}

/// Directed graph keyed by a stable string id.
///
/// Node and edge insertion are idempotent: a second insert of the same key or
/// of the same `(from, to)` pair leaves the graph unchanged. Acyclicity is not
/// enforced; callers building ancestry or dependency graphs never introduce
/// cycles, and the walks below visit each node at most once regardless.
#[derive(Debug, Clone)]
pub struct RelationshipGraph<A> {
    graph: DiGraph<GraphNode<A>, ()>,
    index: HashMap<String, NodeIndex>,
}

impl<A> Default for RelationshipGraph<A> {
    fn default() -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
        }
    }
}

impl<A> RelationshipGraph<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, key: impl Into<String>, attrs: A) -> bool {
        let key = key.into();
        if self.index.contains_key(&key) {
            return false;
        }
        let idx = self.graph.add_node(GraphNode {
            key: key.clone(),
            attrs,
        });
        self.index.insert(key, idx);
        true
    }

    pub fn add_edge(&mut self, from: &str, to: &str) -> bool {
        let (Some(&a), Some(&b)) = (self.index.get(from), self.index.get(to)) else {
            return false;
        };
        if self.graph.contains_edge(a, b) {
            return false;
        }
        self.graph.add_edge(a, b, ());
        true
    }

    pub fn has_node(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        match (self.index.get(from), self.index.get(to)) {
            (Some(&a), Some(&b)) => self.graph.contains_edge(a, b),
            _ => false,
        }
    }

    pub fn get(&self, key: &str) -> Option<&A> {
        self.index
            .get(key)
            .and_then(|idx| self.graph.node_weight(*idx))
            .map(|node| &node.attrs)
    }

    pub fn find_node<P>(&self, predicate: P) -> Option<(&str, &A)>
    where
        P: Fn(&str, &A) -> bool,
    {
        self.graph
            .node_weights()
            .find(|node| predicate(&node.key, &node.attrs))
            .map(|node| (node.key.as_str(), &node.attrs))
    }

    pub fn in_degree(&self, key: &str) -> usize {
        self.index
            .get(key)
            .map(|idx| {
                self.graph
                    .neighbors_directed(*idx, Direction::Incoming)
                    .count()
            })
            .unwrap_or(0)
    }

    pub fn out_degree(&self, key: &str) -> usize {
        self.index
            .get(key)
            .map(|idx| {
                self.graph
                    .neighbors_directed(*idx, Direction::Outgoing)
                    .count()
            })
            .unwrap_or(0)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&str, &A)> {
        self.graph
            .node_weights()
            .map(|node| (node.key.as_str(), &node.attrs))
    }

    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.graph.edge_references().map(|edge| {
            (
                self.graph[edge.source()].key.as_str(),
                self.graph[edge.target()].key.as_str(),
            )
        })
    }

    pub fn roots(&self) -> Vec<&str> {
        self.graph
            .node_indices()
            .filter(|idx| {
                self.graph
                    .neighbors_directed(*idx, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .map(|idx| self.graph[idx].key.as_str())
            .collect()
    }

    pub fn children(&self, key: &str) -> Vec<&str> {
        match self.index.get(key) {
            Some(idx) => self
                .ordered_successors(*idx)
                .into_iter()
                .map(|child| self.graph[child].key.as_str())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Pre-order depth-first walk from `root`, or from every root in turn when
    /// `root` is `None`. Roots sit at depth 0. An unknown root yields nothing.
    pub fn dfs(&self, root: Option<&str>) -> Vec<Visit<'_, A>> {
        let starts: Vec<NodeIndex> = match root {
            Some(key) => self.index.get(key).copied().into_iter().collect(),
            None => self
                .roots()
                .into_iter()
                .filter_map(|key| self.index.get(key).copied())
                .collect(),
        };

        let mut visits = Vec::new();
        let mut seen: HashSet<NodeIndex> = HashSet::new();
        for start in starts {
            let mut stack = vec![(start, 0usize)];
            while let Some((idx, depth)) = stack.pop() {
                if !seen.insert(idx) {
                    continue;
                }
                let node = &self.graph[idx];
                visits.push(Visit {
                    key: node.key.as_str(),
                    attrs: &node.attrs,
                    depth,
                });
                for child in self.ordered_successors(idx).into_iter().rev() {
                    if !seen.contains(&child) {
                        stack.push((child, depth + 1));
                    }
                }
            }
        }
        visits
    }

    fn ordered_successors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|edge| (edge.id(), edge.target()))
            .collect();
        edges.sort_by_key(|(id, _)| id.index());
        edges.into_iter().map(|(_, target)| target).collect()
    }
}
