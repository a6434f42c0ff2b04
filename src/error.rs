use thiserror::Error;

use crate::nodes::{NodeId, PortId};

////////////////////////////////////////////////////////////////////////////////

#[derive(Error, Debug)]
pub enum CircuitError {
    #[error("node {0} is not live in this circuit")]
    UnknownNode(NodeId),
    #[error("node {node} has no input port `{port}`")]
    UnknownInputPort { node: NodeId, port: PortId },
    #[error("node {node} has no output port `{port}`")]
    UnknownOutputPort { node: NodeId, port: PortId },
    #[error("node {0} is already live")]
    AlreadyLive(NodeId),
    #[error("node {0} lives inside a package and cannot be removed on its own")]
    NotRootNode(NodeId),
    #[error("node {0} is not a button")]
    NotAButton(NodeId),
    #[error("package declares port `{0}` more than once")]
    DuplicatePort(PortId),
    #[error("package declares port `{0}` but contains no boundary node for it")]
    MissingBoundary(PortId),
    #[error("boundary node for port `{0}` is not declared by the package")]
    UndeclaredBoundary(PortId),
    #[error("a package needs at least one input and one output boundary")]
    IncompletePackage,
    #[error("no fixed point reached after {ticks} ticks")]
    NoFixedPoint { ticks: usize },
    #[error("unsupported save file version `{0}`")]
    UnsupportedVersion(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

////////////////////////////////////////////////////////////////////////////////

pub type CircuitResult<T> = Result<T, CircuitError>;
