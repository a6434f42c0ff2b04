//! Source nodes: constants, random bits and manual buttons

pub mod button;
pub mod random;

use crate::nodes::{Node, NodeCategory, NodeFactory, NodeKind, NodeMetadata};

/// Constant high source
#[derive(Default)]
pub struct TrueNodeFactory;

impl NodeFactory for TrueNodeFactory {
    fn metadata() -> NodeMetadata {
        NodeMetadata::for_kind(&NodeKind::True, "TRUE", NodeCategory::source(), "Always emits high")
            .with_tags(vec!["source", "constant"])
    }

    fn create() -> Node {
        Node::new(NodeKind::True)
    }
}

/// Constant low source
#[derive(Default)]
pub struct FalseNodeFactory;

impl NodeFactory for FalseNodeFactory {
    fn metadata() -> NodeMetadata {
        NodeMetadata::for_kind(&NodeKind::False, "FALSE", NodeCategory::source(), "Always emits low")
            .with_tags(vec!["source", "constant"])
    }

    fn create() -> Node {
        Node::new(NodeKind::False)
    }
}

/// Seeded random bit source; draws a new bit each time it is scheduled
#[derive(Default)]
pub struct RandomNodeFactory;

impl NodeFactory for RandomNodeFactory {
    fn metadata() -> NodeMetadata {
        NodeMetadata::for_kind(
            &NodeKind::Random { seed: 0, draws: 0 },
            "Random",
            NodeCategory::source(),
            "Emits a reproducible pseudo-random bit",
        )
        .with_tags(vec!["source", "random", "noise"])
    }

    fn create() -> Node {
        Node::random(rand::random())
    }
}

/// Manual toggle
#[derive(Default)]
pub struct ButtonNodeFactory;

impl NodeFactory for ButtonNodeFactory {
    fn metadata() -> NodeMetadata {
        NodeMetadata::for_kind(
            &NodeKind::Button { pressed: false },
            "Button",
            NodeCategory::source(),
            "Toggles between low and high when clicked",
        )
        .with_tags(vec!["source", "input", "switch"])
    }

    fn create() -> Node {
        Node::button()
    }
}
