use std::collections::VecDeque;

use serde_json::{json, Value};

use crate::graph::viz::{node_label, NodeRef, Producer, RenderOptions};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonNodeData {
    pub id: String,
    pub major: String,
    pub minor: String,
    pub patch: String,
    pub build: String,
    pub depth: usize,
    label: String,
}

impl JsonNodeData {
    fn to_value(&self) -> Value {
        json!({
            "SubscriberPackageVersionId": self.id,
            "MajorVersion": self.major,
            "MinorVersion": self.minor,
            "PatchVersion": self.patch,
            "BuildNumber": self.build,
            "depthCounter": self.depth,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct JsonProducer {
    pub data: Option<JsonNodeData>,
    pub children: Vec<JsonProducer>,
}

impl JsonProducer {
    pub fn label(&self) -> Option<&str> {
        self.data.as_ref().map(|data| data.label.as_str())
    }

    pub fn search(&self, label: &str) -> Option<&JsonProducer> {
        let mut queue: VecDeque<&JsonProducer> = VecDeque::from([self]);
        while let Some(current) = queue.pop_front() {
            if let Some(data) = &current.data {
                if data.label == label || data.id == label {
                    return Some(current);
                }
            }
            queue.extend(current.children.iter());
        }
        None
    }
}

impl Producer for JsonProducer {
    type Output = Value;

    fn for_node(node: Option<NodeRef<'_>>, options: &RenderOptions) -> Self {
        let data = node.map(|node| {
            let version = node.node.version;
            JsonNodeData {
                id: node.key.to_string(),
                major: version.major.to_string(),
                minor: version.minor.to_string(),
                patch: version.patch.to_string(),
                build: version.build.to_string(),
                depth: node.depth,
                label: node_label(node, options),
            }
        });
        Self {
            data,
            children: Vec::new(),
        }
    }

    fn add_node(&mut self, child: Self) {
        self.children.push(child);
    }

    fn produce(&self) -> Value {
        let children: Vec<Value> = self.children.iter().map(|child| child.produce()).collect();
        json!({
            "data": self.data.as_ref().map_or(Value::Null, JsonNodeData::to_value),
            "children": children,
        })
    }
}
