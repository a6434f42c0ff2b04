//! Port types and functionality for node connections

use super::node::NodeId;
use crate::constants;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Identifier of a port, unique among a node's inputs (or outputs)
pub type PortId = String;

/// One end of a connection: a port on a specific node
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub node: NodeId,
    pub port: PortId,
}

impl Endpoint {
    pub fn new(node: NodeId, port: impl Into<PortId>) -> Self {
        Self {
            node,
            port: port.into(),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.node, self.port)
    }
}

/// An input port: at most one driver, plus the level read while undriven
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputPort {
    pub id: PortId,
    /// The output driving this port (fan-in of 1)
    pub source: Option<Endpoint>,
    /// Value read when `source` is absent or no longer live
    pub level: bool,
}

impl InputPort {
    pub fn new(id: impl Into<PortId>) -> Self {
        Self {
            id: id.into(),
            source: None,
            level: constants::sim::UNDRIVEN,
        }
    }
}

/// An output port: its current value and every input it drives
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputPort {
    pub id: PortId,
    pub state: bool,
    pub targets: BTreeSet<Endpoint>,
}

impl OutputPort {
    pub fn new(id: impl Into<PortId>) -> Self {
        Self {
            id: id.into(),
            state: false,
            targets: BTreeSet::new(),
        }
    }
}

/// Presentation metadata for a declared package port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortInfo {
    pub id: PortId,
    pub name: String,
    pub description: String,
}

impl PortInfo {
    pub fn new(id: impl Into<PortId>, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
        }
    }

    /// Port info whose display name is its id
    pub fn named(id: impl Into<PortId>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            description: String::new(),
        }
    }
}
