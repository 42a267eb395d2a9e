use std::collections::BTreeSet;

use serde::Deserialize;
use tracing::debug;

use crate::core::ids::{is_sentinel, Anchor, RequestId, VersionId, VERSION_BEING_BUILT};
use crate::core::version::VersionNumber;
use crate::error::{LineageError, Result};
use crate::graph::viz::dot::package_label;
use crate::graph::viz::DependencyDotProducer;
use crate::graph::RelationshipGraph;
use crate::registry::traits::Registry;
use crate::registry::{BuildIdentity, NodeRecord};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeDirection {
    /// Dependents point at what they depend on; the version being built
    /// appears first.
    #[default]
    RootFirst,
    /// Edges are emitted as stored, dependency to dependent.
    RootLast,
}

pub fn parse_edge_direction(input: &str) -> Option<EdgeDirection> {
    match input.to_ascii_lowercase().as_str() {
        "root-first" => Some(EdgeDirection::RootFirst),
        "root-last" => Some(EdgeDirection::RootLast),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DependencyOptions {
    pub verbose: bool,
    pub edge_direction: EdgeDirection,
    pub allow_flat: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyMode {
    Transitive,
    Flat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyNode {
    pub package_name: String,
    pub version: VersionNumber,
}

#[derive(Debug, Deserialize)]
struct GraphDescription {
    nodes: Vec<DescribedNode>,
    edges: Vec<DescribedEdge>,
}

#[derive(Debug, Deserialize)]
struct DescribedNode {
    id: String,
}

#[derive(Debug, Deserialize)]
struct DescribedEdge {
    source: String,
    target: String,
}

#[derive(Debug, Clone)]
pub struct DependencyGraph {
    graph: RelationshipGraph<DependencyNode>,
    selected: BTreeSet<String>,
    build_key: String,
    mode: DependencyMode,
    options: DependencyOptions,
}

impl DependencyGraph {
    pub fn graph(&self) -> &RelationshipGraph<DependencyNode> {
        &self.graph
    }

    pub fn selected(&self) -> &BTreeSet<String> {
        &self.selected
    }

    pub fn build_key(&self) -> &str {
        &self.build_key
    }

    pub fn mode(&self) -> DependencyMode {
        self.mode
    }

    pub fn dot_producer(&self) -> DependencyDotProducer {
        let mut producer = DependencyDotProducer::new();
        for (key, node) in self.graph.nodes() {
            let label = package_label(
                &node.package_name,
                &node.version.to_string(),
                key,
                self.options.verbose,
            );
            producer.add_node(key, label, self.selected.contains(key));
        }
        for (source, target) in self.graph.edges() {
            match self.options.edge_direction {
                EdgeDirection::RootLast => producer.add_edge(source, target),
                EdgeDirection::RootFirst => producer.add_edge(target, source),
            }
        }
        producer
    }

    pub fn to_dot(&self) -> String {
        self.dot_producer().produce()
    }
}

pub fn build_dependency_graph<R>(
    registry: &R,
    anchor: &str,
    options: DependencyOptions,
) -> Result<DependencyGraph>
where
    R: Registry + ?Sized,
{
    let (request, anchor_version) = match Anchor::classify(anchor)? {
        Anchor::Request(request) => (request, None),
        Anchor::Version(version) => {
            let request = registry
                .fetch_request_for_version(&version)?
                .ok_or_else(|| LineageError::VersionNotFound(version.to_string()))?;
            (request, Some(version))
        }
        Anchor::Package(package) => {
            return Err(LineageError::UnsupportedIdentifier(package.to_string()))
        }
    };
    debug!(%request, "building dependency graph");

    let identity = registry.fetch_version_being_built(&request)?.ok_or_else(|| {
        LineageError::InvalidDependencyGraph(format!(
            "no record of the version being built by {request}"
        ))
    })?;

    let (mode, mut description) = describe(registry, &request, &identity, options)?;
    validate_node_ids(&description)?;

    let build_key = match &identity.real_id {
        Some(real_id) => {
            debug!(%real_id, "replacing build placeholder with its version id");
            substitute_sentinel(&mut description, real_id.as_str());
            real_id.to_string()
        }
        None => VERSION_BEING_BUILT.to_string(),
    };

    let mut graph = RelationshipGraph::new();
    for node in &description.nodes {
        let attrs = if node.id == build_key {
            DependencyNode {
                package_name: identity.package_name.clone(),
                version: identity.version,
            }
        } else {
            let id = VersionId::new(node.id.clone());
            node_from_record(&id, registry.fetch_node_record(&id)?)?
        };
        graph.add_node(node.id.clone(), attrs);
    }
    for edge in &description.edges {
        if !graph.has_node(&edge.source) || !graph.has_node(&edge.target) {
            return Err(LineageError::InvalidDependencyGraph(format!(
                "edge {} -> {} references an unknown node",
                edge.source, edge.target
            )));
        }
        graph.add_edge(&edge.source, &edge.target);
    }

    let mut selected = BTreeSet::from([build_key.clone()]);
    if let Some(version) = anchor_version {
        for dependency in registry.fetch_flat_dependencies(&version)? {
            selected.insert(dependency.to_string());
        }
        selected.insert(version.to_string());
    }

    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        ?mode,
        "dependency graph complete"
    );
    Ok(DependencyGraph {
        graph,
        selected,
        build_key,
        mode,
        options,
    })
}

fn describe<R>(
    registry: &R,
    request: &RequestId,
    identity: &BuildIdentity,
    options: DependencyOptions,
) -> Result<(DependencyMode, GraphDescription)>
where
    R: Registry + ?Sized,
{
    let state = registry.fetch_dependency_calculation_state(request)?;
    if state.is_complete {
        let text = state.graph_description.ok_or_else(|| {
            LineageError::InvalidDependencyGraph(format!(
                "transitive dependencies of {request} are marked complete but no graph was recorded"
            ))
        })?;
        let description = serde_json::from_str(&text).map_err(|err| {
            LineageError::InvalidDependencyGraph(format!(
                "unreadable graph description for {request}: {err}"
            ))
        })?;
        return Ok((DependencyMode::Transitive, description));
    }

    if !options.allow_flat {
        return Err(LineageError::TransitiveDependenciesRequired(
            request.to_string(),
        ));
    }

    let version = identity.real_id.as_ref().ok_or_else(|| {
        LineageError::InvalidDependencyGraph(format!(
            "version being built by {request} has no id yet; its direct dependencies are unknown"
        ))
    })?;
    let dependencies = registry.fetch_flat_dependencies(version)?;
    let mut nodes: Vec<DescribedNode> = dependencies
        .iter()
        .map(|dependency| DescribedNode {
            id: dependency.to_string(),
        })
        .collect();
    nodes.push(DescribedNode {
        id: VERSION_BEING_BUILT.to_string(),
    });
    let edges = dependencies
        .iter()
        .map(|dependency| DescribedEdge {
            source: dependency.to_string(),
            target: VERSION_BEING_BUILT.to_string(),
        })
        .collect();
    Ok((DependencyMode::Flat, GraphDescription { nodes, edges }))
}

fn validate_node_ids(description: &GraphDescription) -> Result<()> {
    for node in &description.nodes {
        if !is_sentinel(&node.id) && VersionId::parse(&node.id).is_none() {
            return Err(LineageError::InvalidDependencyGraph(format!(
                "unexpected node id '{}'",
                node.id
            )));
        }
    }
    Ok(())
}

fn substitute_sentinel(description: &mut GraphDescription, real_id: &str) {
    for node in &mut description.nodes {
        if is_sentinel(&node.id) {
            node.id = real_id.to_string();
        }
    }
    for edge in &mut description.edges {
        if is_sentinel(&edge.source) {
            edge.source = real_id.to_string();
        }
        if is_sentinel(&edge.target) {
            edge.target = real_id.to_string();
        }
    }
}

fn node_from_record(id: &VersionId, record: NodeRecord) -> Result<DependencyNode> {
    let missing = |field: &str| {
        LineageError::InvalidDependencyGraph(format!("record for {id} is missing {field}"))
    };
    let package_name = record.package_name.ok_or_else(|| missing("PackageName"))?;
    let major = record.major.ok_or_else(|| missing("MajorVersion"))?;
    let minor = record.minor.ok_or_else(|| missing("MinorVersion"))?;
    let patch = record.patch.ok_or_else(|| missing("PatchVersion"))?;
    let build = record.build.ok_or_else(|| missing("BuildNumber"))?;
    let version = VersionNumber::parse(&format!("{major}.{minor}.{patch}.{build}")).map_err(|err| {
        LineageError::InvalidDependencyGraph(format!(
            "record for {id} has an invalid BuildNumber '{build}': {err}"
        ))
    })?;
    Ok(DependencyNode {
        package_name,
        version,
    })
}

#[cfg(test)]
mod tests {
    use crate::core::ids::{VersionId, VERSION_BEING_BUILT};
    use crate::core::version::VersionNumber;
    use crate::error::LineageError;
    use crate::graph::ancestry::tests::FakeRegistry;
    use crate::graph::dependency::{
        build_dependency_graph, parse_edge_direction, DependencyMode, DependencyOptions,
        EdgeDirection,
    };
    use crate::registry::{BuildIdentity, CalculationState, NodeRecord};

    fn record(name: &str, version: (u32, u32, u32, &str)) -> NodeRecord {
        NodeRecord {
            package_name: Some(name.to_string()),
            major: Some(version.0),
            minor: Some(version.1),
            patch: Some(version.2),
            build: Some(version.3.to_string()),
        }
    }

    fn registry(real_id: Option<&str>, description: &str) -> FakeRegistry {
        let mut registry = FakeRegistry::default();
        registry.states.insert(
            "08cREQ".to_string(),
            CalculationState {
                is_complete: true,
                graph_description: Some(description.to_string()),
            },
        );
        registry.identities.insert(
            "08cREQ".to_string(),
            BuildIdentity {
                real_id: real_id.map(VersionId::new),
                package_name: "app".to_string(),
                version: VersionNumber::parse("2.0.0.NEXT").expect("version"),
            },
        );
        registry
            .records
            .insert("04tAAA".to_string(), record("base", (1, 0, 0, "4")));
        registry
            .records
            .insert("04tCCC".to_string(), record("util", (1, 2, 0, "1")));
        registry
    }

    fn scenario_description() -> String {
        format!(
            r#"{{"nodes":[{{"id":"{VERSION_BEING_BUILT}"}},{{"id":"04tAAA"}}],"edges":[{{"source":"04tAAA","target":"{VERSION_BEING_BUILT}"}}]}}"#
        )
    }

    #[test]
    fn sentinel_is_rewritten_before_rendering() {
        let registry = registry(Some("04tBBB"), &scenario_description());
        let graph = build_dependency_graph(&registry, "08cREQ", DependencyOptions::default())
            .expect("build graph");
        assert_eq!(graph.mode(), DependencyMode::Transitive);
        assert_eq!(graph.build_key(), "04tBBB");

        let dot = graph.to_dot();
        assert!(dot.starts_with("strict digraph G {\n"));
        assert!(dot.contains("node_04tBBB -> node_04tAAA"));
        assert!(dot.contains("node_04tBBB [label=\"app@2.0.0.NEXT\" color=\"green\"]"));
        assert!(dot.contains("node_04tAAA [label=\"base@1.0.0.4\"]"));
        assert!(!dot.contains(VERSION_BEING_BUILT));
    }

    #[test]
    fn root_last_keeps_stored_direction() {
        let registry = registry(Some("04tBBB"), &scenario_description());
        let options = DependencyOptions {
            edge_direction: EdgeDirection::RootLast,
            verbose: true,
            ..DependencyOptions::default()
        };
        let dot = build_dependency_graph(&registry, "08cREQ", options)
            .expect("build graph")
            .to_dot();
        assert!(dot.contains("node_04tAAA -> node_04tBBB"));
        assert!(dot.contains("[label=\"base@1.0.0.4 (04tAAA)\"]"));
    }

    #[test]
    fn unresolved_sentinel_keeps_placeholder_key() {
        let registry = registry(None, &scenario_description());
        let graph = build_dependency_graph(&registry, "08cREQ", DependencyOptions::default())
            .expect("build graph");
        assert_eq!(graph.build_key(), VERSION_BEING_BUILT);
        assert!(graph.graph().has_edge("04tAAA", VERSION_BEING_BUILT));
    }

    #[test]
    fn incomplete_records_are_rejected() {
        let mut registry = registry(Some("04tBBB"), &scenario_description());
        if let Some(record) = registry.records.get_mut("04tAAA") {
            record.major = None;
        }
        let err = build_dependency_graph(&registry, "08cREQ", DependencyOptions::default())
            .expect_err("missing major version");
        assert!(
            matches!(&err, LineageError::InvalidDependencyGraph(msg) if msg.contains("MajorVersion")),
            "{err}"
        );
    }

    #[test]
    fn unparsable_build_numbers_are_rejected() {
        for bad in ["garbage", "1.2"] {
            let mut registry = registry(Some("04tBBB"), &scenario_description());
            if let Some(record) = registry.records.get_mut("04tAAA") {
                record.build = Some(bad.to_string());
            }
            let err = build_dependency_graph(&registry, "08cREQ", DependencyOptions::default())
                .expect_err("bad build number");
            assert!(
                matches!(&err, LineageError::InvalidDependencyGraph(msg) if msg.contains("BuildNumber")),
                "{err}"
            );
        }
    }

    #[test]
    fn malformed_descriptions_are_rejected() {
        let bad_id = r#"{"nodes":[{"id":"not-a-version"}],"edges":[]}"#;
        let err = build_dependency_graph(
            &registry(Some("04tBBB"), bad_id),
            "08cREQ",
            DependencyOptions::default(),
        )
        .expect_err("bad node id");
        assert!(matches!(err, LineageError::InvalidDependencyGraph(_)));

        let dangling = r#"{"nodes":[{"id":"04tAAA"}],"edges":[{"source":"04tAAA","target":"04tZZZ"}]}"#;
        let err = build_dependency_graph(
            &registry(Some("04tBBB"), dangling),
            "08cREQ",
            DependencyOptions::default(),
        )
        .expect_err("dangling edge");
        assert!(matches!(err, LineageError::InvalidDependencyGraph(_)));

        let err = build_dependency_graph(
            &registry(Some("04tBBB"), "{ not json"),
            "08cREQ",
            DependencyOptions::default(),
        )
        .expect_err("unparsable");
        assert!(matches!(err, LineageError::InvalidDependencyGraph(_)));
    }

    #[test]
    fn complete_flag_without_description_is_invalid() {
        let mut registry = registry(Some("04tBBB"), "");
        registry.states.insert(
            "08cREQ".to_string(),
            CalculationState {
                is_complete: true,
                graph_description: None,
            },
        );
        let err = build_dependency_graph(&registry, "08cREQ", DependencyOptions::default())
            .expect_err("no description");
        assert!(matches!(err, LineageError::InvalidDependencyGraph(_)));
    }

    #[test]
    fn pending_calculation_requires_flat_opt_in() {
        let mut registry = registry(Some("04tBBB"), "");
        registry
            .states
            .insert("08cREQ".to_string(), CalculationState::default());
        registry.flat.insert(
            "04tBBB".to_string(),
            vec!["04tAAA".to_string(), "04tCCC".to_string()],
        );

        let err = build_dependency_graph(&registry, "08cREQ", DependencyOptions::default())
            .expect_err("transitive required");
        assert!(matches!(err, LineageError::TransitiveDependenciesRequired(_)));

        let options = DependencyOptions {
            allow_flat: true,
            ..DependencyOptions::default()
        };
        let graph = build_dependency_graph(&registry, "08cREQ", options).expect("flat graph");
        assert_eq!(graph.mode(), DependencyMode::Flat);
        assert_eq!(graph.graph().node_count(), 3);
        assert!(graph.graph().has_edge("04tAAA", "04tBBB"));
        assert!(graph.graph().has_edge("04tCCC", "04tBBB"));
        assert_eq!(graph.graph().roots(), vec!["04tAAA", "04tCCC"]);
    }

    #[test]
    fn version_anchor_selects_itself_and_direct_dependencies() {
        let mut registry = registry(Some("04tBBB"), &scenario_description());
        registry
            .requests
            .insert("04tBBB".to_string(), "08cREQ".to_string());
        registry
            .flat
            .insert("04tBBB".to_string(), vec!["04tAAA".to_string()]);

        let graph = build_dependency_graph(&registry, "04tBBB", DependencyOptions::default())
            .expect("build graph");
        let selected: Vec<&str> = graph.selected().iter().map(String::as_str).collect();
        assert_eq!(selected, vec!["04tAAA", "04tBBB"]);
        assert!(graph
            .to_dot()
            .contains("node_04tAAA [label=\"base@1.0.0.4\" color=\"green\"]"));
    }

    #[test]
    fn unknown_version_and_package_anchors_fail() {
        let registry = registry(Some("04tBBB"), &scenario_description());
        let err = build_dependency_graph(&registry, "04tNOPE", DependencyOptions::default())
            .expect_err("no request for version");
        assert!(matches!(err, LineageError::VersionNotFound(_)));

        let err = build_dependency_graph(&registry, "0HoPKG", DependencyOptions::default())
            .expect_err("package anchor");
        assert!(matches!(err, LineageError::UnsupportedIdentifier(_)));
    }

    #[test]
    fn edge_direction_parses_both_spellings() {
        assert_eq!(parse_edge_direction("root-first"), Some(EdgeDirection::RootFirst));
        assert_eq!(parse_edge_direction("ROOT-LAST"), Some(EdgeDirection::RootLast));
        assert_eq!(parse_edge_direction("sideways"), None);
    }
}
