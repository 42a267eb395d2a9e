use std::collections::HashSet;

use anyhow::anyhow;
use tracing::debug;

use crate::core::ids::{Anchor, VersionId};
use crate::core::version::VersionNumber;
use crate::error::{LineageError, Result};
use crate::graph::RelationshipGraph;
use crate::registry::traits::Registry;
use crate::registry::{AncestryFact, ContainerType};
use crate::util::parallel::map_in_order;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AncestryNode {
    pub package_name: String,
    pub version: VersionNumber,
    pub fact: AncestryFact,
}

impl From<AncestryFact> for AncestryNode {
    fn from(fact: AncestryFact) -> Self {
        Self {
            package_name: fact.package_name.clone(),
            version: fact.version,
            fact,
        }
    }
}

pub type AncestryGraph = RelationshipGraph<AncestryNode>;

#[derive(Debug, Clone, Default)]
pub struct AncestryOptions {
    pub jobs: Option<usize>,
}

pub fn build_ancestry_graph<R>(
    registry: &R,
    anchor: &str,
    options: &AncestryOptions,
) -> Result<AncestryGraph>
where
    R: Registry + ?Sized,
{
    let anchor = Anchor::classify(anchor)?;
    debug!(anchor = anchor.as_str(), "building ancestry graph");
    let mut graph = AncestryGraph::new();

    let roots = match &anchor {
        Anchor::Package(package) => {
            ensure_managed(registry, package.as_str())?;
            let facts = registry.fetch_roots_of_package(package)?;
            if facts.is_empty() {
                return Err(LineageError::NoVersions(package.to_string()));
            }
            let mut roots = Vec::with_capacity(facts.len());
            for fact in facts {
                let id = fact.id.clone();
                if graph.add_node(id.as_str(), AncestryNode::from(fact)) {
                    roots.push(id);
                }
            }
            roots
        }
        Anchor::Version(version) => {
            ensure_managed(registry, version.as_str())?;
            vec![walk_to_root(registry, &mut graph, version)?]
        }
        Anchor::Request(_) => {
            return Err(LineageError::UnsupportedIdentifier(
                anchor.as_str().to_string(),
            ))
        }
    };

    expand_descendants(registry, &mut graph, roots, options.jobs)?;
    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "ancestry graph complete"
    );
    Ok(graph)
}

fn ensure_managed<R>(registry: &R, id: &str) -> Result<()>
where
    R: Registry + ?Sized,
{
    match registry.fetch_container_type(id)? {
        ContainerType::Managed => Ok(()),
        ContainerType::Unlocked => Err(LineageError::UnlockedPackage(id.to_string())),
    }
}

fn walk_to_root<R>(registry: &R, graph: &mut AncestryGraph, start: &VersionId) -> Result<VersionId>
where
    R: Registry + ?Sized,
{
    let mut current = fetch_existing(registry, start)?;
    graph.add_node(current.id.as_str(), AncestryNode::from(current.clone()));

    while let Some(ancestor_id) = current.ancestor_id.clone() {
        debug!(version = %current.id, ancestor = %ancestor_id, "walking to ancestor");
        let ancestor = fetch_existing(registry, &ancestor_id)?;
        if !graph.add_node(ancestor.id.as_str(), AncestryNode::from(ancestor.clone())) {
            return Err(LineageError::Other(anyhow!(
                "ancestry of {} loops back to {}",
                start,
                ancestor.id
            )));
        }
        graph.add_edge(ancestor.id.as_str(), current.id.as_str());
        current = ancestor;
    }

    Ok(current.id)
}

fn fetch_existing<R>(registry: &R, id: &VersionId) -> Result<AncestryFact>
where
    R: Registry + ?Sized,
{
    registry
        .fetch_version(id)?
        .ok_or_else(|| LineageError::VersionNotFound(id.to_string()))
}

fn expand_descendants<R>(
    registry: &R,
    graph: &mut AncestryGraph,
    roots: Vec<VersionId>,
    jobs: Option<usize>,
) -> Result<()>
where
    R: Registry + ?Sized,
{
    let mut queued: HashSet<VersionId> = roots.iter().cloned().collect();
    let mut frontier = roots;

    while !frontier.is_empty() {
        debug!(size = frontier.len(), "expanding ancestry frontier");
        let fetched = map_in_order(frontier, jobs, |parent| {
            let children = registry.fetch_children_of(&parent);
            (parent, children)
        });

        let mut next = Vec::new();
        for (parent, children) in fetched {
            for child in children? {
                let child_id = child.id.clone();
                graph.add_node(child_id.as_str(), AncestryNode::from(child));
                graph.add_edge(parent.as_str(), child_id.as_str());
                if queued.insert(child_id.clone()) {
                    next.push(child_id);
                }
            }
        }
        frontier = next;
    }

    Ok(())
}
