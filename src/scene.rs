mod node;
mod remap;

// Re-exports
pub use {
    node::{
        euler_to_quat, trs_matrix, BindTransform, BoneNode, Node, NodeKind,
        RotationOrder, SkinnedMeshNode,
    },
    remap::NodeRemap,
};

use crate::{
    animation::ClipInput,
    bake_error::{BakeError, InputError},
    types::NodeId,
};
use log::debug;
use nalgebra_glm as glm;

/// Node arena. Nodes are addressed by `NodeId` and link to each other only
/// through parent and child handles, so the tree can be walked without
/// recursion and copied without fixing up pointers.
///
/// Nodes may be added without a parent. Such nodes are kept but are not
/// reachable from the root and are skipped by `traverse`.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    nodes: Vec<Node>,
    root: Option<NodeId>,
    pub clips: Vec<ClipInput>,
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the root node. Calling this again replaces which node is the
    /// root but does not remove the old one.
    ///
    /// # Errors
    /// May return `BakeError` if the arena is full
    pub fn add_root(
        &mut self,
        name: &str,
        bind: BindTransform,
        kind: NodeKind,
    ) -> Result<NodeId, BakeError> {
        let id = self.add_node(None, name, bind, kind)?;
        self.root = Some(id);
        Ok(id)
    }

    /// Adds a node as the last child of `parent`
    ///
    /// # Errors
    /// May return `BakeError` if the parent is not in this scene or the
    /// arena is full
    pub fn add_node(
        &mut self,
        parent: Option<NodeId>,
        name: &str,
        bind: BindTransform,
        kind: NodeKind,
    ) -> Result<NodeId, BakeError> {
        let id = NodeId(
            u32::try_from(self.nodes.len())
                .map_err(|_| BakeError::IndexTooLarge)?,
        );
        if let Some(p) = parent {
            let parent_node = self
                .nodes
                .get_mut(p.index())
                .ok_or(InputError::DanglingParent(p.0))?;
            parent_node.children.push(id);
        }
        self.nodes.push(Node {
            name: name.to_string(),
            parent,
            children: Vec::new(),
            bind,
            kind,
        });
        Ok(id)
    }

    #[must_use]
    pub const fn root(&self) -> Option<NodeId> {
        self.root
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Name for messages. Unknown handles get a placeholder.
    #[must_use]
    pub fn name(&self, id: NodeId) -> String {
        self.node(id)
            .map_or_else(|| format!("node.{id}"), |n| n.name.clone())
    }

    /// Every node handle in arena order
    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        // The arena never grows past u32::MAX so this cannot truncate
        #[allow(clippy::cast_possible_truncation)]
        (0..self.nodes.len()).map(|i| NodeId(i as u32))
    }

    /// Pre-order walk from the root. Children are visited in the order they
    /// were added. Uses an explicit stack so deep hierarchies are fine.
    #[must_use]
    pub fn traverse(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let Some(root) = self.root else {
            return order;
        };
        let mut visited = vec![false; self.nodes.len()];
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.node(id) else {
                continue;
            };
            // Guards against a malformed tree that links a node twice
            if std::mem::replace(&mut visited[id.index()], true) {
                continue;
            }
            order.push(id);
            stack.extend(node.children.iter().rev());
        }
        order
    }

    /// Nodes that `traverse` does not reach, in arena order
    #[must_use]
    pub fn unreachable(&self) -> Vec<NodeId> {
        let mut reached = vec![false; self.nodes.len()];
        for id in self.traverse() {
            reached[id.index()] = true;
        }
        self.ids().filter(|id| !reached[id.index()]).collect()
    }

    /// The chain from the topmost ancestor down to `id` itself
    #[must_use]
    pub fn ancestry(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(c) = current {
            // A parent cycle would otherwise never end
            if chain.len() > self.nodes.len() || !self.contains(c) {
                break;
            }
            chain.push(c);
            current = self.node(c).and_then(|n| n.parent);
        }
        chain.reverse();
        chain
    }

    #[must_use]
    pub fn local_bind_matrix(&self, id: NodeId) -> Option<glm::Mat4> {
        self.node(id).map(|n| n.bind.matrix())
    }

    /// Bind pose of `id` relative to the top of its hierarchy
    #[must_use]
    pub fn global_bind_matrix(&self, id: NodeId) -> Option<glm::Mat4> {
        if !self.contains(id) {
            return None;
        }
        Some(self.ancestry(id).iter().fold(glm::Mat4::identity(), |m, a| {
            self.node(*a).map_or(m, |n| m * n.bind.matrix())
        }))
    }

    /// Copies the nodes reachable from the root into a new scene, in
    /// traversal order, and returns the table that rebinds old handles.
    /// Skin clusters and animation curves are rebound through the same
    /// table. A cluster bound to a dropped node loses its bind node and
    /// curves for dropped nodes are removed.
    #[must_use]
    pub fn compact(&self) -> (Self, NodeRemap) {
        let order = self.traverse();
        let mut remap = NodeRemap::unmapped(self.nodes.len());
        for (new_index, old) in order.iter().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            remap.set(*old, NodeId(new_index as u32));
        }

        let mut nodes = Vec::with_capacity(order.len());
        for old in &order {
            let Some(node) = self.node(*old) else {
                continue;
            };
            let mut node = node.clone();
            node.parent = node.parent.and_then(|p| remap.get(p));
            node.children = node
                .children
                .iter()
                .filter_map(|c| remap.get(*c))
                .collect();
            if let NodeKind::SkinnedMesh(s) = &mut node.kind {
                for cluster in &mut s.skin.clusters {
                    cluster.bone = cluster.bone.and_then(|b| remap.get(b));
                }
            }
            nodes.push(node);
        }

        let clips = self
            .clips
            .iter()
            .map(|clip| {
                let mut clip = clip.clone();
                clip.curves.retain_mut(|c| {
                    remap.get(c.node).map_or(false, |n| {
                        c.node = n;
                        true
                    })
                });
                clip
            })
            .collect();

        debug!(
            "compacted scene from {} to {} nodes",
            self.nodes.len(),
            nodes.len()
        );
        let root = self.root.and_then(|r| remap.get(r));
        (Self { nodes, root, clips }, remap)
    }
}
