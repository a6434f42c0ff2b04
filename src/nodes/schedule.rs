//! Pending-update set and the capability nodes use to enqueue themselves

use super::node::NodeId;
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::{Rc, Weak};

/// Nodes awaiting evaluation in the next tick.
///
/// Owned by a `Circuit`; nodes only ever see it through an [`UpdateHandle`].
#[derive(Debug, Default)]
pub struct PendingSet {
    inner: Rc<RefCell<BTreeSet<NodeId>>>,
}

impl PendingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the handle a live node uses to schedule itself
    pub fn handle_for(&self, node: NodeId) -> UpdateHandle {
        UpdateHandle {
            node,
            pending: Rc::downgrade(&self.inner),
        }
    }

    pub fn insert(&self, node: NodeId) -> bool {
        self.inner.borrow_mut().insert(node)
    }

    pub fn remove(&self, node: NodeId) -> bool {
        self.inner.borrow_mut().remove(&node)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.inner.borrow().contains(&node)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn clear(&self) {
        self.inner.borrow_mut().clear();
    }

    /// Take the current batch, leaving the set empty for the next tick
    pub fn take(&self) -> Vec<NodeId> {
        std::mem::take(&mut *self.inner.borrow_mut())
            .into_iter()
            .collect()
    }

    /// Sorted copy of the current contents
    pub fn to_vec(&self) -> Vec<NodeId> {
        self.inner.borrow().iter().copied().collect()
    }
}

/// Capability handed to a node at registration, letting it request evaluation
/// at the next tick.
///
/// Holds only a weak reference: once the owning circuit is gone, scheduling
/// is a no-op.
#[derive(Debug, Clone)]
pub struct UpdateHandle {
    node: NodeId,
    pending: Weak<RefCell<BTreeSet<NodeId>>>,
}

impl UpdateHandle {
    /// Enqueue the node; returns false if the circuit no longer exists
    pub fn schedule(&self) -> bool {
        match self.pending.upgrade() {
            Some(pending) => {
                pending.borrow_mut().insert(self.node);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_schedules_into_owner() {
        let pending = PendingSet::new();
        let id = NodeId::new();
        let handle = pending.handle_for(id);

        assert!(handle.schedule());
        assert!(pending.contains(id));
        assert_eq!(pending.take(), vec![id]);
        assert!(pending.is_empty());
    }

    #[test]
    fn test_handle_outliving_owner_is_noop() {
        let handle = {
            let pending = PendingSet::new();
            pending.handle_for(NodeId::new())
        };
        assert!(!handle.schedule());
    }
}
