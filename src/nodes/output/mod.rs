//! Output nodes for displaying results

use crate::nodes::{Node, NodeCategory, NodeFactory, NodeKind, NodeMetadata, PortDefinition};

/// Indicator lamp: lit while its input is high
#[derive(Default)]
pub struct LedNodeFactory;

impl NodeFactory for LedNodeFactory {
    fn metadata() -> NodeMetadata {
        NodeMetadata::for_kind(&NodeKind::Led { lit: false }, "LED", NodeCategory::output(), "Lights up while its input is high")
            .with_inputs(vec![PortDefinition::new("in").with_description("Signal to display")])
            .with_tags(vec!["output", "display", "lamp"])
    }

    fn create() -> Node {
        Node::led()
    }
}
