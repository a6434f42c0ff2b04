//! Node system: nodes, ports, connections, packages and the circuit driver

pub mod circuit;
pub mod factory;
pub mod graph;
pub mod hooks;
pub mod node;
pub mod package;
pub mod port;
pub mod schedule;

// Node kind families
pub mod data;
pub mod logic;
pub mod output;

pub use circuit::{Circuit, CircuitStats, EmittedValues};
pub use factory::{create_node, CatalogEntry, NodeCategory, NodeFactory, NodeMetadata, PortDefinition, CATALOG};
pub use graph::{Connection, Downstream, NodeGraph};
pub use hooks::{FnHooks, NodeHooks};
pub use node::{Capabilities, InputSnapshot, Node, NodeId, NodeKind};
pub use package::{Boundary, Package, PackageInfo, PackagePort};
pub use port::{Endpoint, InputPort, OutputPort, PortId, PortInfo};
pub use schedule::{PendingSet, UpdateHandle};
