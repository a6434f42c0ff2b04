//! Node factory system with a static catalogue and rich metadata

use crate::nodes::{data, logic, output, Node, NodeKind};
use log::debug;
use once_cell::sync::Lazy;

/// Hierarchical category system for organizing nodes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeCategory {
    path: Vec<String>,
}

impl NodeCategory {
    /// Create a new category from path components
    pub fn new(path: &[&str]) -> Self {
        Self {
            path: path.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Category name (last component)
    pub fn name(&self) -> &str {
        self.path.last().map(|s| s.as_str()).unwrap_or("")
    }

    /// Display string for listings
    pub fn display_string(&self) -> String {
        self.path.join(" > ")
    }

    pub fn logic() -> Self { Self::new(&["Logic"]) }
    pub fn source() -> Self { Self::new(&["Source"]) }
    pub fn output() -> Self { Self::new(&["Output"]) }
}

/// Port definition used by listings
#[derive(Debug, Clone)]
pub struct PortDefinition {
    pub name: String,
    pub description: Option<String>,
}

impl PortDefinition {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

/// Metadata for a node kind, derived from the kind's own port layout
#[derive(Debug, Clone)]
pub struct NodeMetadata {
    pub node_type: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub category: NodeCategory,
    pub inputs: Vec<PortDefinition>,
    pub outputs: Vec<PortDefinition>,
    pub force_update: bool,
    pub tags: Vec<&'static str>,
}

impl NodeMetadata {
    /// Metadata for a fixed-layout kind
    pub fn for_kind(
        kind: &NodeKind,
        display_name: &'static str,
        category: NodeCategory,
        description: &'static str,
    ) -> Self {
        let (inputs, outputs) = kind.port_layout();
        Self {
            node_type: kind.name(),
            display_name,
            description,
            category,
            inputs: inputs.iter().map(|p| PortDefinition::new(p)).collect(),
            outputs: outputs.iter().map(|p| PortDefinition::new(p)).collect(),
            force_update: kind.force_update(),
            tags: vec![],
        }
    }

    pub fn with_tags(mut self, tags: Vec<&'static str>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_inputs(mut self, inputs: Vec<PortDefinition>) -> Self {
        self.inputs = inputs;
        self
    }
}

/// Node factory trait: metadata plus construction
pub trait NodeFactory {
    fn metadata() -> NodeMetadata
    where
        Self: Sized;

    fn create() -> Node
    where
        Self: Sized;
}

/// A catalogue entry: metadata and the constructor for that kind
pub struct CatalogEntry {
    pub metadata: NodeMetadata,
    pub create: fn() -> Node,
}

impl CatalogEntry {
    fn of<F: NodeFactory>() -> Self {
        Self {
            metadata: F::metadata(),
            create: F::create,
        }
    }
}

/// Every creatable node kind. Packages and their boundaries are built through
/// [`crate::nodes::Package`] and are not listed.
pub static CATALOG: Lazy<Vec<CatalogEntry>> = Lazy::new(|| {
    vec![
        CatalogEntry::of::<logic::AndNodeFactory>(),
        CatalogEntry::of::<logic::And3NodeFactory>(),
        CatalogEntry::of::<logic::OrNodeFactory>(),
        CatalogEntry::of::<logic::Or3NodeFactory>(),
        CatalogEntry::of::<logic::NotNodeFactory>(),
        CatalogEntry::of::<logic::NandNodeFactory>(),
        CatalogEntry::of::<logic::NorNodeFactory>(),
        CatalogEntry::of::<logic::XorNodeFactory>(),
        CatalogEntry::of::<logic::NopNodeFactory>(),
        CatalogEntry::of::<data::TrueNodeFactory>(),
        CatalogEntry::of::<data::FalseNodeFactory>(),
        CatalogEntry::of::<data::RandomNodeFactory>(),
        CatalogEntry::of::<data::ButtonNodeFactory>(),
        CatalogEntry::of::<output::LedNodeFactory>(),
    ]
});

/// Create a node by its kind tag (case-insensitive), e.g. `"and"` or `"LED"`
pub fn create_node(node_type: &str) -> Option<Node> {
    let entry = CATALOG
        .iter()
        .find(|e| e.metadata.node_type.eq_ignore_ascii_case(node_type))?;
    debug!("Creating {} node from catalogue", entry.metadata.node_type);
    Some((entry.create)())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_tags_are_unique() {
        let mut tags: Vec<_> = CATALOG.iter().map(|e| e.metadata.node_type).collect();
        tags.sort();
        tags.dedup();
        assert_eq!(tags.len(), CATALOG.len());
    }

    #[test]
    fn test_created_nodes_match_metadata() {
        for entry in CATALOG.iter() {
            let node = (entry.create)();
            assert_eq!(node.kind().name(), entry.metadata.node_type);
            assert_eq!(node.inputs().len(), entry.metadata.inputs.len());
            assert_eq!(node.outputs().len(), entry.metadata.outputs.len());
            assert_eq!(node.force_update(), entry.metadata.force_update);
        }
    }

    #[test]
    fn test_create_node_by_name() {
        let node = create_node("xor").unwrap();
        assert!(matches!(node.kind(), NodeKind::Xor));
        assert!(create_node("PACKAGE").is_none());
        assert!(create_node("flux-capacitor").is_none());
    }
}
