use crate::graph::ancestry::AncestryGraph;

pub type AncestryPath = Vec<String>;

pub fn leaf_to_root_paths(graph: &AncestryGraph, target: Option<&str>) -> Vec<AncestryPath> {
    let mut paths: Vec<AncestryPath> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut previous_depth: Option<usize> = None;

    for visit in graph.dfs(None) {
        match previous_depth {
            // First node of the walk: nothing buffered yet.
            None => {}
            // Back at the same or a shallower depth, so the buffer ended at a leaf.
            Some(previous) if visit.depth <= previous => {
                paths.push(leaf_first(&current));
            }
            Some(_) => {}
        }
        current.truncate(visit.depth);
        current.push(visit.key);
        previous_depth = Some(visit.depth);
    }
    if !current.is_empty() {
        paths.push(leaf_first(&current));
    }

    paths
        .into_iter()
        .filter(|path| !path.is_empty())
        .filter_map(|path| match target {
            Some(target) => path
                .iter()
                .position(|id| id == target)
                .map(|start| path[start..].to_vec()),
            None => Some(path),
        })
        .collect()
}

pub fn describe_path(graph: &AncestryGraph, path: &[String]) -> String {
    path.iter()
        .map(|id| match graph.get(id) {
            Some(node) => node.version.to_string(),
            None => id.clone(),
        })
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn leaf_first(root_first: &[&str]) -> AncestryPath {
    root_first.iter().rev().map(|id| id.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use crate::graph::ancestry::tests::{branching_registry, FakeRegistry};
    use crate::graph::ancestry::{build_ancestry_graph, AncestryGraph, AncestryOptions};
    use crate::graph::paths::{describe_path, leaf_to_root_paths};

    fn branching_graph() -> AncestryGraph {
        build_ancestry_graph(&branching_registry(), "0HoPKG", &AncestryOptions::default())
            .expect("build graph")
    }

    #[test]
    fn one_path_per_leaf_ending_at_the_root() {
        let graph = branching_graph();
        let paths = leaf_to_root_paths(&graph, None);
        assert_eq!(
            paths,
            vec![
                vec!["04tV3", "04tV2", "04tV1"],
                vec!["04tV3B", "04tV2", "04tV1"],
                vec!["04tV2B", "04tV1"],
            ]
        );
        let root = graph.roots()[0];
        for path in &paths {
            assert_eq!(path.last().map(String::as_str), Some(root));
            assert_eq!(graph.out_degree(&path[0]), 0);
        }
    }

    #[test]
    fn single_child_chain_yields_one_path() {
        let registry = FakeRegistry::managed(&[
            ("04tV1", "1.0.0.0", None),
            ("04tV2", "2.0.0.0", Some("04tV1")),
        ]);
        let graph = build_ancestry_graph(&registry, "0HoPKG", &AncestryOptions::default())
            .expect("build graph");
        assert_eq!(leaf_to_root_paths(&graph, None), vec![vec!["04tV2", "04tV1"]]);
    }

    #[test]
    fn target_filters_and_slices_paths() {
        let graph = branching_graph();
        let paths = leaf_to_root_paths(&graph, Some("04tV2"));
        assert_eq!(
            paths,
            vec![vec!["04tV2", "04tV1"], vec!["04tV2", "04tV1"]]
        );
        for path in &paths {
            assert_eq!(path[0], "04tV2");
        }

        assert!(leaf_to_root_paths(&graph, Some("04tMISSING")).is_empty());
    }

    #[test]
    fn paths_render_as_version_chains() {
        let graph = branching_graph();
        let paths = leaf_to_root_paths(&graph, Some("04tV3"));
        assert_eq!(describe_path(&graph, &paths[0]), "3.0.0.0 -> 2.0.0.0 -> 1.0.0.0");
    }
}
