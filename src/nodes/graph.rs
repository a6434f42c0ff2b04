//! Node graph data structures and connection bookkeeping

use super::node::{Node, NodeId, NodeKind};
use super::port::{Endpoint, PortId};
use crate::constants::port;
use crate::error::{CircuitError, CircuitResult};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Represents a connection between an output port and an input port
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Connection {
    pub from_node: NodeId,
    pub from_port: PortId,
    pub to_node: NodeId,
    pub to_port: PortId,
}

impl Connection {
    /// Creates a new connection
    pub fn new(
        from_node: NodeId,
        from_port: impl Into<PortId>,
        to_node: NodeId,
        to_port: impl Into<PortId>,
    ) -> Self {
        Self {
            from_node,
            from_port: from_port.into(),
            to_node,
            to_port: to_port.into(),
        }
    }

    pub fn source(&self) -> Endpoint {
        Endpoint::new(self.from_node, self.from_port.clone())
    }

    pub fn target(&self) -> Endpoint {
        Endpoint::new(self.to_node, self.to_port.clone())
    }
}

/// Result of walking downstream from an output port
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Downstream {
    /// Real consumers that must be re-evaluated
    pub targets: BTreeSet<NodeId>,
    /// Boundary outputs the value passed through on the way
    pub crossed: Vec<Endpoint>,
}

/// Flat arena of nodes; edges live on the nodes themselves
#[derive(Debug, Default)]
pub struct NodeGraph {
    nodes: HashMap<NodeId, Node>,
}

impl NodeGraph {
    /// Creates a new empty node graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node to the graph and returns its ID
    pub fn add_node(&mut self, node: Node) -> CircuitResult<NodeId> {
        let id = node.id();
        if self.nodes.contains_key(&id) {
            return Err(CircuitError::AlreadyLive(id));
        }
        self.nodes.insert(id, node);
        Ok(id)
    }

    /// Removes a node. Connections held by other nodes are left dangling.
    pub fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        self.nodes.remove(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> CircuitResult<&Node> {
        self.nodes.get(&id).ok_or(CircuitError::UnknownNode(id))
    }

    pub fn node_mut(&mut self, id: NodeId) -> CircuitResult<&mut Node> {
        self.nodes.get_mut(&id).ok_or(CircuitError::UnknownNode(id))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Connects an output to an input, silently replacing the input's
    /// previous driver. Returns the replaced connection, if any.
    pub fn connect(&mut self, connection: Connection) -> CircuitResult<Option<Connection>> {
        // Validate both ends before touching anything
        self.node(connection.from_node)?
            .output_port(&connection.from_port)?;
        self.node(connection.to_node)?
            .input_port(&connection.to_port)?;

        let replaced = self.disconnect(connection.to_node, &connection.to_port)?;

        self.node_mut(connection.to_node)?
            .input_port_mut(&connection.to_port)?
            .source = Some(connection.source());
        self.node_mut(connection.from_node)?
            .output_port_mut(&connection.from_port)?
            .targets
            .insert(connection.target());

        debug!(
            "Connected {} -> {}",
            connection.source(),
            connection.target()
        );
        Ok(replaced)
    }

    /// Removes the driver of an input port; the port falls back to its
    /// undriven level
    pub fn disconnect(&mut self, to_node: NodeId, to_port: &str) -> CircuitResult<Option<Connection>> {
        let source = self.node_mut(to_node)?.input_port_mut(to_port)?.source.take();
        let Some(source) = source else {
            return Ok(None);
        };

        let target = Endpoint::new(to_node, to_port);
        // The old driver may already be gone; nothing to clean up then
        if let Some(driver) = self.nodes.get_mut(&source.node) {
            if let Ok(out) = driver.output_port_mut(&source.port) {
                out.targets.remove(&target);
            }
        }

        Ok(Some(Connection::new(source.node, source.port, to_node, to_port)))
    }

    /// Every edge recorded on an input port in this graph, sorted
    pub fn connections(&self) -> Vec<Connection> {
        let mut connections: Vec<Connection> = self
            .nodes
            .values()
            .flat_map(|node| {
                node.inputs().iter().filter_map(move |input| {
                    input.source.as_ref().map(|source| {
                        Connection::new(source.node, source.port.clone(), node.id(), input.id.clone())
                    })
                })
            })
            .collect();
        connections.sort();
        connections
    }

    /// Value currently present at an input port: the driver's output if the
    /// driver is live, the port's undriven level otherwise
    pub fn input_value(&self, node: NodeId, port: &str) -> CircuitResult<bool> {
        let input = self.node(node)?.input_port(port)?;
        let Some(source) = &input.source else {
            return Ok(input.level);
        };
        match self.nodes.get(&source.node).map(|n| n.get_state(&source.port)) {
            Some(Ok(value)) => Ok(value),
            _ => {
                warn!("Input {}.{} reads from dangling driver {}", node, port, source);
                Ok(input.level)
            }
        }
    }

    /// Nodes that must be re-evaluated when `port` of `node` changes.
    ///
    /// Walks into packages through their PACKAGE-INPUT boundaries and out of
    /// them through PACKAGE-OUTPUT boundaries; boundary nodes themselves are
    /// never returned.
    pub fn resolve_downstream(&self, node: NodeId, port: &str) -> CircuitResult<BTreeSet<NodeId>> {
        Ok(self.walk_downstream(node, port)?.targets)
    }

    /// Like [`Self::resolve_downstream`], and also records which boundary
    /// outputs the walk passed through
    pub fn walk_downstream(&self, node: NodeId, port: &str) -> CircuitResult<Downstream> {
        let start = self.node(node)?.output_port(port)?;

        let mut result = Downstream::default();
        let mut visited: HashSet<Endpoint> = HashSet::new();
        let mut stack: Vec<Endpoint> = start.targets.iter().rev().cloned().collect();

        while let Some(endpoint) = stack.pop() {
            if !visited.insert(endpoint.clone()) {
                continue;
            }
            let Some(target) = self.nodes.get(&endpoint.node) else {
                debug!("Skipping dangling target {}", endpoint);
                continue;
            };

            let next = match target.kind() {
                NodeKind::Package(package) => package
                    .input_boundary(&endpoint.port)
                    .map(|boundary| Endpoint::new(boundary, port::OUT)),
                NodeKind::PackageOutput(boundary) => target
                    .parent()
                    .map(|parent| Endpoint::new(parent, boundary.info.id.clone())),
                _ => {
                    result.targets.insert(endpoint.node);
                    None
                }
            };

            // Unconnected boundaries simply end the walk
            let Some(next) = next else { continue };
            let Some(out) = self
                .nodes
                .get(&next.node)
                .and_then(|n| n.output_port(&next.port).ok())
            else {
                continue;
            };
            stack.extend(out.targets.iter().rev().cloned());
            result.crossed.push(next);
        }

        Ok(result)
    }

    /// Walks downstream and stores `value` in every boundary output crossed
    pub fn forward(&mut self, node: NodeId, port: &str, value: bool) -> CircuitResult<Downstream> {
        let downstream = self.walk_downstream(node, port)?;
        for endpoint in &downstream.crossed {
            self.node_mut(endpoint.node)?
                .set_output_state(&endpoint.port, value)?;
        }
        Ok(downstream)
    }

    pub(crate) fn into_nodes(self) -> HashMap<NodeId, Node> {
        self.nodes
    }
}
