//! Node types and core node functionality

use super::data::{button, random};
use super::logic::gates;
use super::package::{Boundary, Package};
use super::port::{InputPort, OutputPort, PortId, PortInfo};
use super::schedule::UpdateHandle;
use crate::constants::{port, sim};
use crate::error::{CircuitError, CircuitResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a node, assigned at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(Uuid);

impl NodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Input values captured before a tick starts, keyed by input port
pub type InputSnapshot = BTreeMap<PortId, bool>;

/// What a node kind can do, so the driver never dispatches on kind names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub has_input_ports: bool,
    pub has_output_ports: bool,
    pub is_composite: bool,
}

/// Closed set of node kinds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NodeKind {
    And,
    And3,
    Or,
    Or3,
    Not,
    Nand,
    Nor,
    Xor,
    /// Buffer: passes its input through
    Nop,
    True,
    False,
    Random { seed: u64, draws: u64 },
    Button { pressed: bool },
    Led { lit: bool },
    PackageInput(Boundary),
    PackageOutput(Boundary),
    Package(Box<Package>),
}

const NO_PORTS: &[&str] = &[];
const ONE_IN: &[&str] = &[port::IN];
const ONE_OUT: &[&str] = &[port::OUT];
const TWO_IN: &[&str] = &[port::A, port::B];
const THREE_IN: &[&str] = &[port::A, port::B, port::C];

impl NodeKind {
    /// Tag used in logs and by the catalogue
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::And => "AND",
            NodeKind::And3 => "AND3",
            NodeKind::Or => "OR",
            NodeKind::Or3 => "OR3",
            NodeKind::Not => "NOT",
            NodeKind::Nand => "NAND",
            NodeKind::Nor => "NOR",
            NodeKind::Xor => "XOR",
            NodeKind::Nop => "NOP",
            NodeKind::True => "TRUE",
            NodeKind::False => "FALSE",
            NodeKind::Random { .. } => "RANDOM",
            NodeKind::Button { .. } => "BUTTON",
            NodeKind::Led { .. } => "LED",
            NodeKind::PackageInput(_) => "PACKAGE-INPUT",
            NodeKind::PackageOutput(_) => "PACKAGE-OUTPUT",
            NodeKind::Package(_) => "PACKAGE",
        }
    }

    /// Fixed input/output port ids. Packages declare theirs at construction
    /// and report none here.
    pub fn port_layout(&self) -> (&'static [&'static str], &'static [&'static str]) {
        match self {
            NodeKind::And | NodeKind::Or | NodeKind::Nand | NodeKind::Nor | NodeKind::Xor => {
                (TWO_IN, ONE_OUT)
            }
            NodeKind::And3 | NodeKind::Or3 => (THREE_IN, ONE_OUT),
            NodeKind::Not | NodeKind::Nop => (ONE_IN, ONE_OUT),
            NodeKind::True
            | NodeKind::False
            | NodeKind::Random { .. }
            | NodeKind::Button { .. }
            | NodeKind::PackageInput(_) => (NO_PORTS, ONE_OUT),
            NodeKind::Led { .. } | NodeKind::PackageOutput(_) => (ONE_IN, NO_PORTS),
            NodeKind::Package(_) => (NO_PORTS, NO_PORTS),
        }
    }

    /// Whether this kind's output may change without any input change
    pub fn force_update(&self) -> bool {
        matches!(
            self,
            NodeKind::True | NodeKind::False | NodeKind::Random { .. } | NodeKind::Button { .. }
        )
    }

    fn evaluate(&mut self, read: impl Fn(&str) -> bool) -> Option<bool> {
        let value = match self {
            NodeKind::And => gates::and(&[read(port::A), read(port::B)]),
            NodeKind::And3 => gates::and(&[read(port::A), read(port::B), read(port::C)]),
            NodeKind::Or => gates::or(&[read(port::A), read(port::B)]),
            NodeKind::Or3 => gates::or(&[read(port::A), read(port::B), read(port::C)]),
            NodeKind::Not => gates::not(read(port::IN)),
            NodeKind::Nand => gates::nand(&[read(port::A), read(port::B)]),
            NodeKind::Nor => gates::nor(&[read(port::A), read(port::B)]),
            NodeKind::Xor => gates::xor(&[read(port::A), read(port::B)]),
            NodeKind::Nop => read(port::IN),
            NodeKind::True => true,
            NodeKind::False => false,
            NodeKind::Random { seed, draws } => random::draw(*seed, draws),
            NodeKind::Button { pressed } => *pressed,
            NodeKind::Led { lit } => {
                *lit = read(port::IN);
                return None;
            }
            NodeKind::PackageInput(_) | NodeKind::PackageOutput(_) | NodeKind::Package(_) => {
                return None
            }
        };
        Some(value)
    }

    fn init(&mut self) {
        match self {
            NodeKind::Random { draws, .. } => *draws = 0,
            NodeKind::Button { pressed } => *pressed = false,
            NodeKind::Led { lit } => *lit = false,
            _ => {}
        }
    }
}

/// Core node structure: a typed unit with named ports, state and an update rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    id: NodeId,
    #[serde(default)]
    name: Option<String>,
    kind: NodeKind,
    inputs: Vec<InputPort>,
    outputs: Vec<OutputPort>,
    force_update: bool,
    /// Enclosing package, if any
    #[serde(default)]
    parent: Option<NodeId>,
    #[serde(skip)]
    handle: Option<UpdateHandle>,
}

impl Node {
    /// Creates a node of a fixed-layout kind
    pub fn new(kind: NodeKind) -> Self {
        let (inputs, outputs) = kind.port_layout();
        Self {
            id: NodeId::new(),
            name: None,
            force_update: kind.force_update(),
            inputs: inputs.iter().map(|id| InputPort::new(*id)).collect(),
            outputs: outputs.iter().map(|id| OutputPort::new(*id)).collect(),
            kind,
            parent: None,
            handle: None,
        }
    }

    pub fn button() -> Self {
        Self::new(NodeKind::Button { pressed: false })
    }

    pub fn led() -> Self {
        Self::new(NodeKind::Led { lit: false })
    }

    pub fn random(seed: u64) -> Self {
        Self::new(NodeKind::Random { seed, draws: 0 })
    }

    /// PACKAGE-INPUT boundary for a declared package input
    pub fn package_input(info: PortInfo, index: usize) -> Self {
        Self::new(NodeKind::PackageInput(Boundary { info, index }))
    }

    /// PACKAGE-OUTPUT boundary for a declared package output
    pub fn package_output(info: PortInfo, index: usize) -> Self {
        Self::new(NodeKind::PackageOutput(Boundary { info, index }))
    }

    /// Wraps a package; its port lists are exactly its declared boundaries
    pub(crate) fn composite(package: Package) -> Self {
        let inputs = package
            .inputs()
            .iter()
            .map(|p| InputPort::new(p.info.id.clone()))
            .collect();
        let outputs = package
            .outputs()
            .iter()
            .map(|p| OutputPort::new(p.info.id.clone()))
            .collect();
        Self {
            id: NodeId::new(),
            name: Some(package.info.name.clone()).filter(|n| !n.is_empty()),
            kind: NodeKind::Package(Box::new(package)),
            inputs,
            outputs,
            force_update: false,
            parent: None,
            handle: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Display label: the human name if set, the kind tag otherwise
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.kind.name())
    }

    pub fn inputs(&self) -> &[InputPort] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[OutputPort] {
        &self.outputs
    }

    pub fn input_ids(&self) -> impl Iterator<Item = &PortId> {
        self.inputs.iter().map(|p| &p.id)
    }

    pub fn output_ids(&self) -> impl Iterator<Item = &PortId> {
        self.outputs.iter().map(|p| &p.id)
    }

    pub fn force_update(&self) -> bool {
        self.force_update
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            has_input_ports: !self.inputs.is_empty(),
            has_output_ports: !self.outputs.is_empty(),
            is_composite: matches!(self.kind, NodeKind::Package(_)),
        }
    }

    pub fn package(&self) -> Option<&Package> {
        match &self.kind {
            NodeKind::Package(package) => Some(package),
            _ => None,
        }
    }

    pub(crate) fn package_mut(&mut self) -> Option<&mut Package> {
        match &mut self.kind {
            NodeKind::Package(package) => Some(package),
            _ => None,
        }
    }

    /// Boundary info if this is a PACKAGE-INPUT or PACKAGE-OUTPUT node
    pub fn boundary(&self) -> Option<&Boundary> {
        match &self.kind {
            NodeKind::PackageInput(b) | NodeKind::PackageOutput(b) => Some(b),
            _ => None,
        }
    }

    /// Current value of an output port
    pub fn get_state(&self, port: &str) -> CircuitResult<bool> {
        self.output_port(port).map(|p| p.state)
    }

    /// Whether an LED is lit; `None` for every other kind
    pub fn is_lit(&self) -> Option<bool> {
        match self.kind {
            NodeKind::Led { lit } => Some(lit),
            _ => None,
        }
    }

    pub fn input_port(&self, port: &str) -> CircuitResult<&InputPort> {
        self.inputs
            .iter()
            .find(|p| p.id == port)
            .ok_or_else(|| CircuitError::UnknownInputPort {
                node: self.id,
                port: port.to_string(),
            })
    }

    pub fn output_port(&self, port: &str) -> CircuitResult<&OutputPort> {
        self.outputs
            .iter()
            .find(|p| p.id == port)
            .ok_or_else(|| CircuitError::UnknownOutputPort {
                node: self.id,
                port: port.to_string(),
            })
    }

    pub(crate) fn input_port_mut(&mut self, port: &str) -> CircuitResult<&mut InputPort> {
        let node = self.id;
        self.inputs
            .iter_mut()
            .find(|p| p.id == port)
            .ok_or_else(|| CircuitError::UnknownInputPort {
                node,
                port: port.to_string(),
            })
    }

    pub(crate) fn output_port_mut(&mut self, port: &str) -> CircuitResult<&mut OutputPort> {
        let node = self.id;
        self.outputs
            .iter_mut()
            .find(|p| p.id == port)
            .ok_or_else(|| CircuitError::UnknownOutputPort {
                node,
                port: port.to_string(),
            })
    }

    /// Sets the level an input reads while undriven and schedules the node
    pub fn set_input(&mut self, port: &str, value: bool) -> CircuitResult<()> {
        self.input_port_mut(port)?.level = value;
        self.request_update();
        Ok(())
    }

    /// Recomputes outputs from a pre-tick snapshot. Reads nothing else.
    pub fn update(&mut self, inputs: &InputSnapshot) {
        let read = |port: &str| inputs.get(port).copied().unwrap_or(sim::UNDRIVEN);
        if let Some(value) = self.kind.evaluate(read) {
            if let Some(out) = self.outputs.first_mut() {
                out.state = value;
            }
        }
    }

    /// Resets outputs to `false` and clears internal memory
    pub fn init(&mut self) {
        for out in &mut self.outputs {
            out.state = false;
        }
        self.kind.init();
    }

    /// Asks the owning circuit to evaluate this node at the next tick.
    /// Returns false when the node is not live.
    pub fn request_update(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| h.schedule())
    }

    /// Toggles a button and schedules it
    pub fn click(&mut self) -> CircuitResult<()> {
        match &mut self.kind {
            NodeKind::Button { pressed } => {
                button::toggle(pressed);
                self.request_update();
                Ok(())
            }
            _ => Err(CircuitError::NotAButton(self.id)),
        }
    }

    pub(crate) fn set_output_state(&mut self, port: &str, value: bool) -> CircuitResult<()> {
        self.output_port_mut(port)?.state = value;
        Ok(())
    }

    pub(crate) fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    pub(crate) fn attach(&mut self, handle: UpdateHandle) {
        self.handle = Some(handle);
    }

    pub(crate) fn detach(&mut self) {
        self.handle = None;
    }

    pub fn is_live(&self) -> bool {
        self.handle.is_some()
    }
}
