//! Logic gate nodes

pub mod gates;

use crate::nodes::{Node, NodeCategory, NodeFactory, NodeKind, NodeMetadata, PortDefinition};

/// AND gate
#[derive(Default)]
pub struct AndNodeFactory;

impl NodeFactory for AndNodeFactory {
    fn metadata() -> NodeMetadata {
        NodeMetadata::for_kind(&NodeKind::And, "AND", NodeCategory::logic(), "High when both inputs are high")
            .with_inputs(vec![
                PortDefinition::new("a").with_description("First boolean input"),
                PortDefinition::new("b").with_description("Second boolean input"),
            ])
            .with_tags(vec!["logic", "and", "gate"])
    }

    fn create() -> Node {
        Node::new(NodeKind::And)
    }
}

/// Three-input AND gate
#[derive(Default)]
pub struct And3NodeFactory;

impl NodeFactory for And3NodeFactory {
    fn metadata() -> NodeMetadata {
        NodeMetadata::for_kind(&NodeKind::And3, "AND (3)", NodeCategory::logic(), "High when all three inputs are high")
            .with_tags(vec!["logic", "and", "gate"])
    }

    fn create() -> Node {
        Node::new(NodeKind::And3)
    }
}

/// OR gate
#[derive(Default)]
pub struct OrNodeFactory;

impl NodeFactory for OrNodeFactory {
    fn metadata() -> NodeMetadata {
        NodeMetadata::for_kind(&NodeKind::Or, "OR", NodeCategory::logic(), "High when either input is high")
            .with_tags(vec!["logic", "or", "gate"])
    }

    fn create() -> Node {
        Node::new(NodeKind::Or)
    }
}

/// Three-input OR gate
#[derive(Default)]
pub struct Or3NodeFactory;

impl NodeFactory for Or3NodeFactory {
    fn metadata() -> NodeMetadata {
        NodeMetadata::for_kind(&NodeKind::Or3, "OR (3)", NodeCategory::logic(), "High when any of three inputs is high")
            .with_tags(vec!["logic", "or", "gate"])
    }

    fn create() -> Node {
        Node::new(NodeKind::Or3)
    }
}

/// Inverter
#[derive(Default)]
pub struct NotNodeFactory;

impl NodeFactory for NotNodeFactory {
    fn metadata() -> NodeMetadata {
        NodeMetadata::for_kind(&NodeKind::Not, "NOT", NodeCategory::logic(), "Inverts its input")
            .with_tags(vec!["logic", "not", "inverter"])
    }

    fn create() -> Node {
        Node::new(NodeKind::Not)
    }
}

#[derive(Default)]
pub struct NandNodeFactory;

impl NodeFactory for NandNodeFactory {
    fn metadata() -> NodeMetadata {
        NodeMetadata::for_kind(&NodeKind::Nand, "NAND", NodeCategory::logic(), "Low only when both inputs are high")
            .with_tags(vec!["logic", "nand", "gate"])
    }

    fn create() -> Node {
        Node::new(NodeKind::Nand)
    }
}

#[derive(Default)]
pub struct NorNodeFactory;

impl NodeFactory for NorNodeFactory {
    fn metadata() -> NodeMetadata {
        NodeMetadata::for_kind(&NodeKind::Nor, "NOR", NodeCategory::logic(), "High only when both inputs are low")
            .with_tags(vec!["logic", "nor", "gate"])
    }

    fn create() -> Node {
        Node::new(NodeKind::Nor)
    }
}

#[derive(Default)]
pub struct XorNodeFactory;

impl NodeFactory for XorNodeFactory {
    fn metadata() -> NodeMetadata {
        NodeMetadata::for_kind(&NodeKind::Xor, "XOR", NodeCategory::logic(), "High when exactly one input is high")
            .with_tags(vec!["logic", "xor", "gate"])
    }

    fn create() -> Node {
        Node::new(NodeKind::Xor)
    }
}

/// Buffer: one tick of delay, value unchanged
#[derive(Default)]
pub struct NopNodeFactory;

impl NodeFactory for NopNodeFactory {
    fn metadata() -> NodeMetadata {
        NodeMetadata::for_kind(&NodeKind::Nop, "NOP", NodeCategory::logic(), "Passes its input through unchanged")
            .with_tags(vec!["logic", "buffer", "delay"])
    }

    fn create() -> Node {
        Node::new(NodeKind::Nop)
    }
}
