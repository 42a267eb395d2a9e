use crate::core::version::{sort_by_version, VersionNumber};
use crate::graph::viz::{node_label, NodeRef, Producer, RenderOptions};

const BRANCH: &str = "├─ ";
const LAST_BRANCH: &str = "└─ ";
const PIPE: &str = "│  ";
const SPACE: &str = "   ";

#[derive(Debug, Clone, Default)]
pub struct TreeProducer {
    label: Option<String>,
    version: Option<VersionNumber>,
    children: Vec<TreeProducer>,
}

impl TreeProducer {
    fn sorted_children(&self) -> Vec<&TreeProducer> {
        let mut children: Vec<&TreeProducer> = self.children.iter().collect();
        sort_by_version(&mut children, |child| child.version);
        children
    }

    fn render_children(&self, prefix: &str, out: &mut String) {
        let children = self.sorted_children();
        for (idx, child) in children.iter().enumerate() {
            let is_last = idx + 1 == children.len();
            out.push_str(prefix);
            out.push_str(if is_last { LAST_BRANCH } else { BRANCH });
            out.push_str(child.label.as_deref().unwrap_or_default());
            out.push('\n');

            let mut next_prefix = prefix.to_string();
            next_prefix.push_str(if is_last { SPACE } else { PIPE });
            child.render_children(&next_prefix, out);
        }
    }
}

impl Producer for TreeProducer {
    type Output = String;

    fn for_node(node: Option<NodeRef<'_>>, options: &RenderOptions) -> Self {
        Self {
            label: node.map(|node| node_label(node, options)),
            version: node.map(|node| node.node.version),
            children: Vec::new(),
        }
    }

    fn add_node(&mut self, child: Self) {
        self.children.push(child);
    }

    fn produce(&self) -> String {
        let mut out = String::new();
        match &self.label {
            Some(label) => {
                out.push_str(label);
                out.push('\n');
                self.render_children("", &mut out);
            }
            None => {
                for root in self.sorted_children() {
                    out.push_str(root.label.as_deref().unwrap_or_default());
                    out.push('\n');
                    root.render_children("", &mut out);
                }
            }
        }
        out
    }
}
