use crate::graph::viz::{NodeRef, Producer, RenderOptions};

const SELECTED_COLOR: &str = "green";

#[derive(Debug, Clone, PartialEq, Eq)]
struct DotNode {
    id: String,
    label: String,
}

#[derive(Debug, Clone, Default)]
pub struct DotProducer {
    node: Option<DotNode>,
    children: Vec<DotProducer>,
}

impl DotProducer {
    fn collect<'a>(&'a self, nodes: &mut Vec<&'a DotNode>, edges: &mut Vec<(&'a str, &'a str)>) {
        if let Some(node) = &self.node {
            nodes.push(node);
        }
        for child in &self.children {
            if let (Some(parent), Some(node)) = (&self.node, &child.node) {
                edges.push((parent.id.as_str(), node.id.as_str()));
            }
            child.collect(nodes, edges);
        }
    }
}

impl Producer for DotProducer {
    type Output = String;

    fn for_node(node: Option<NodeRef<'_>>, options: &RenderOptions) -> Self {
        let node = node.map(|node| DotNode {
            id: node.key.to_string(),
            label: package_label(
                &node.node.package_name,
                &node.node.version.to_string(),
                node.key,
                options.verbose,
            ),
        });
        Self {
            node,
            children: Vec::new(),
        }
    }

    fn add_node(&mut self, child: Self) {
        self.children.push(child);
    }

    fn produce(&self) -> String {
        let mut nodes = Vec::new();
        let mut edges = Vec::new();
        self.collect(&mut nodes, &mut edges);

        let mut out = String::from("strict graph G {\n");
        for node in nodes {
            out.push_str(&node_line(&node.id, &node.label, false));
        }
        for (from, to) in edges {
            out.push_str(&edge_line(from, to, "--"));
        }
        out.push_str("}\n");
        out
    }
}

#[derive(Debug, Clone, Default)]
pub struct DependencyDotProducer {
    nodes: Vec<(DotNode, bool)>,
    edges: Vec<(String, String)>,
}

impl DependencyDotProducer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, id: &str, label: String, selected: bool) {
        self.nodes.push((
            DotNode {
                id: id.to_string(),
                label,
            },
            selected,
        ));
    }

    pub fn add_edge(&mut self, from: &str, to: &str) {
        self.edges.push((from.to_string(), to.to_string()));
    }

    pub fn produce(&self) -> String {
        let mut out = String::from("strict digraph G {\n");
        for (node, selected) in &self.nodes {
            out.push_str(&node_line(&node.id, &node.label, *selected));
        }
        for (from, to) in &self.edges {
            out.push_str(&edge_line(from, to, "->"));
        }
        out.push_str("}\n");
        out
    }
}

pub(crate) fn package_label(package_name: &str, version: &str, id: &str, verbose: bool) -> String {
    if verbose {
        format!("{package_name}@{version} ({id})")
    } else {
        format!("{package_name}@{version}")
    }
}

fn node_line(id: &str, label: &str, selected: bool) -> String {
    let color = if selected {
        format!(" color=\"{SELECTED_COLOR}\"")
    } else {
        String::new()
    };
    format!(
        "  node_{} [label=\"{}\"{}]\n",
        id,
        escape_dot_label(label),
        color
    )
}

fn edge_line(from: &str, to: &str, op: &str) -> String {
    format!("  node_{from} {op} node_{to}\n")
}

fn escape_dot_label(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}
