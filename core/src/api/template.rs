use crate::parser::Node;

/// A parsed template, renderable any number of times by the engine that
/// parsed it.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    source: String,
    nodes: Vec<Node>,
}

impl Template {
    pub(super) fn new(source: &str, nodes: Vec<Node>) -> Self {
        Self {
            source: source.to_string(),
            nodes,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }
}
