use crate::types::NodeId;

/// Table from the handles of one scene to the handles of another, produced
/// when nodes are copied or dropped. Anything holding `NodeId`s from the
/// old scene is rebound by looking its handles up here.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeRemap {
    table: Vec<Option<NodeId>>,
}

impl NodeRemap {
    /// A table for `len` old nodes where nothing is mapped yet
    #[must_use]
    pub fn unmapped(len: usize) -> Self {
        Self {
            table: vec![None; len],
        }
    }

    pub fn set(&mut self, old: NodeId, new: NodeId) {
        if let Some(slot) = self.table.get_mut(old.index()) {
            *slot = Some(new);
        }
    }

    /// New handle for `old`, or `None` if that node did not survive
    #[must_use]
    pub fn get(&self, old: NodeId) -> Option<NodeId> {
        self.table.get(old.index()).copied().flatten()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
