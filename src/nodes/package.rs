//! Packages: composite nodes wrapping a nested sub-circuit
//!
//! A package exposes each declared port through a boundary node inside it.
//! PACKAGE-INPUT boundaries hand the outer value to inner consumers and
//! PACKAGE-OUTPUT boundaries hand inner values to the package's own outputs.
//! While a package is not live its inner nodes are held in `interior`; once
//! added to a circuit they move into the circuit's arena and only `members`
//! remains.

use super::graph::{Connection, NodeGraph};
use super::node::{Node, NodeId, NodeKind};
use super::port::{PortId, PortInfo};
use crate::error::{CircuitError, CircuitResult};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Presentation metadata for a package
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    pub name: String,
    pub description: String,
    pub author: String,
}

impl PackageInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }
}

/// Payload of a boundary node: the port it stands for and its ordinal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Boundary {
    pub info: PortInfo,
    pub index: usize,
}

/// A declared package port and the boundary node implementing it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackagePort {
    pub info: PortInfo,
    pub boundary: NodeId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    pub info: PackageInfo,
    inputs: Vec<PackagePort>,
    outputs: Vec<PackagePort>,
    members: Vec<NodeId>,
    #[serde(default)]
    interior: Vec<Node>,
}

impl Package {
    /// Builds a package node from its inner nodes (boundaries included),
    /// the inner connections and the ordered lists of declared ports.
    ///
    /// Every declared port needs exactly one boundary node of matching
    /// direction, and every boundary node must be declared.
    pub fn new(
        info: PackageInfo,
        nodes: Vec<Node>,
        connections: Vec<Connection>,
        inputs: Vec<PortInfo>,
        outputs: Vec<PortInfo>,
    ) -> CircuitResult<Node> {
        check_unique(&inputs)?;
        check_unique(&outputs)?;

        let members: Vec<NodeId> = nodes.iter().map(|n| n.id()).collect();
        let mut graph = NodeGraph::new();
        for node in nodes {
            graph.add_node(node)?;
        }
        for connection in connections {
            graph.connect(connection)?;
        }

        let mut input_boundaries: HashMap<PortId, NodeId> = HashMap::new();
        let mut output_boundaries: HashMap<PortId, NodeId> = HashMap::new();
        for node in graph.nodes() {
            let (declared, found, boundary) = match node.kind() {
                NodeKind::PackageInput(b) => (&inputs, &mut input_boundaries, b),
                NodeKind::PackageOutput(b) => (&outputs, &mut output_boundaries, b),
                _ => continue,
            };
            let port = &boundary.info.id;
            if !declared.iter().any(|p| &p.id == port) {
                return Err(CircuitError::UndeclaredBoundary(port.clone()));
            }
            if found.insert(port.clone(), node.id()).is_some() {
                return Err(CircuitError::DuplicatePort(port.clone()));
            }
        }

        let inputs = bind_ports(inputs, &input_boundaries)?;
        let outputs = bind_ports(outputs, &output_boundaries)?;

        let mut by_id = graph.into_nodes();
        let interior = members
            .iter()
            .filter_map(|id| by_id.remove(id))
            .collect();

        info!(
            "Packaged {} nodes as `{}` ({} inputs, {} outputs)",
            members.len(),
            info.name,
            inputs.len(),
            outputs.len()
        );

        let mut node = Node::composite(Package {
            info,
            inputs,
            outputs,
            members,
            interior,
        });
        let parent = node.id();
        if let Some(package) = node.package_mut() {
            for inner in &mut package.interior {
                inner.set_parent(Some(parent));
            }
        }
        Ok(node)
    }

    /// Packages a selection of nodes, declaring one port per boundary node
    /// in boundary index order. The selection must contain at least one
    /// PACKAGE-INPUT and one PACKAGE-OUTPUT.
    pub fn from_boundaries(
        info: PackageInfo,
        nodes: Vec<Node>,
        connections: Vec<Connection>,
    ) -> CircuitResult<Node> {
        let mut inputs: Vec<&Boundary> = Vec::new();
        let mut outputs: Vec<&Boundary> = Vec::new();
        for node in &nodes {
            match node.kind() {
                NodeKind::PackageInput(b) => inputs.push(b),
                NodeKind::PackageOutput(b) => outputs.push(b),
                _ => {}
            }
        }
        if inputs.is_empty() || outputs.is_empty() {
            return Err(CircuitError::IncompletePackage);
        }

        let declare = |mut boundaries: Vec<&Boundary>| -> Vec<PortInfo> {
            boundaries.sort_by_key(|b| b.index);
            boundaries.into_iter().map(|b| b.info.clone()).collect()
        };
        let inputs = declare(inputs);
        let outputs = declare(outputs);

        Self::new(info, nodes, connections, inputs, outputs)
    }

    pub fn inputs(&self) -> &[PackagePort] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[PackagePort] {
        &self.outputs
    }

    /// Ids of the inner nodes, in construction order
    pub fn members(&self) -> &[NodeId] {
        &self.members
    }

    /// Calls `f` on every direct inner node id
    pub fn for_each_inner_node(&self, mut f: impl FnMut(NodeId)) {
        for id in &self.members {
            f(*id);
        }
    }

    /// Inner nodes held while the package is not live; empty once live
    pub fn interior(&self) -> &[Node] {
        &self.interior
    }

    pub fn input_boundary(&self, port: &str) -> Option<NodeId> {
        self.inputs
            .iter()
            .find(|p| p.info.id == port)
            .map(|p| p.boundary)
    }

    pub fn output_boundary(&self, port: &str) -> Option<NodeId> {
        self.outputs
            .iter()
            .find(|p| p.info.id == port)
            .map(|p| p.boundary)
    }

    pub(crate) fn take_interior(&mut self) -> Vec<Node> {
        std::mem::take(&mut self.interior)
    }

    pub(crate) fn restore_interior(&mut self, interior: Vec<Node>) {
        self.interior = interior;
    }
}

fn check_unique(ports: &[PortInfo]) -> CircuitResult<()> {
    let mut seen = HashSet::new();
    for port in ports {
        if !seen.insert(&port.id) {
            return Err(CircuitError::DuplicatePort(port.id.clone()));
        }
    }
    Ok(())
}

fn bind_ports(declared: Vec<PortInfo>, found: &HashMap<PortId, NodeId>) -> CircuitResult<Vec<PackagePort>> {
    declared
        .into_iter()
        .map(|info| match found.get(&info.id) {
            Some(boundary) => Ok(PackagePort {
                boundary: *boundary,
                info,
            }),
            None => Err(CircuitError::MissingBoundary(info.id)),
        })
        .collect()
}
