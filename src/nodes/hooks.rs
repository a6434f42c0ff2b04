//! Node observer hooks
//!
//! Presentation code registers hooks per node to repaint when a node's
//! outputs or inputs change. The simulation never depends on them.

use crate::nodes::Node;

/// Trait for node-specific change notifications
pub trait NodeHooks {
    /// Called after one of the node's outputs changed, and on reset
    fn on_state_updated(&mut self, _node: &Node) {
        // Default: no special handling
    }

    /// Called when a value arriving at one of the node's inputs changed, and
    /// on reset
    fn on_input_updated(&mut self, _node: &Node) {
        // Default: no special handling
    }

    /// Called when the node leaves the circuit
    fn on_node_removed(&mut self, _node: &Node) {
        // Default: no special handling
    }
}

/// Hooks backed by closures, handy for tests and small frontends
pub struct FnHooks<S, I>
where
    S: FnMut(&Node),
    I: FnMut(&Node),
{
    state: S,
    input: I,
}

impl<S, I> FnHooks<S, I>
where
    S: FnMut(&Node),
    I: FnMut(&Node),
{
    pub fn new(state: S, input: I) -> Self {
        Self { state, input }
    }
}

impl<S, I> NodeHooks for FnHooks<S, I>
where
    S: FnMut(&Node),
    I: FnMut(&Node),
{
    fn on_state_updated(&mut self, node: &Node) {
        (self.state)(node)
    }

    fn on_input_updated(&mut self, node: &Node) {
        (self.input)(node)
    }
}
