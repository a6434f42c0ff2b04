//! Circuitry core library
//!
//! Tick-based digital logic simulation: nodes with boolean ports, a
//! connection graph, nestable packages and the circuit driver.

pub mod constants;
pub mod error;
pub mod file_manager;
pub mod nodes;

// Re-export commonly used types
pub use error::{CircuitError, CircuitResult};
pub use file_manager::{FileManager, SaveData, SaveMetadata};
pub use nodes::{Circuit, Connection, Node, NodeId, NodeKind, Package, PackageInfo, PortInfo};
