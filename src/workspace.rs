use crate::types::NodeId;
use ahash::{HashMap, HashMapExt};
use smallvec::SmallVec;

/// Scratch storage reused across conversion passes. Owned by the caller and
/// handed to each entry point, so two passes with two workspaces never share
/// anything. Every pass clears what it uses before starting, which means
/// results never depend on what a previous pass left behind; only the
/// allocations are kept.
#[derive(Debug, Default)]
pub struct Workspace {
    /// Canonicalizer buckets, keyed by vertex hash, holding canonical indices
    pub(crate) vertex_table: HashMap<u64, SmallVec<[u32; 1]>>,
    /// Per control point (bone, summed weight) in order of first encounter
    pub(crate) skin_accum: Vec<SmallVec<[(NodeId, f32); 8]>>,
    /// Bones of the polygon currently being partitioned
    pub(crate) polygon_bones: Vec<NodeId>,
    /// Canonical vertex to output vertex for the partition being emitted
    pub(crate) vertex_map: HashMap<u32, u32>,
    /// Union of curve sample times for the channel being merged
    pub(crate) times: Vec<f32>,
}

impl Workspace {
    #[must_use]
    pub fn new() -> Self {
        Self {
            vertex_table: HashMap::new(),
            skin_accum: Vec::new(),
            polygon_bones: Vec::new(),
            vertex_map: HashMap::new(),
            times: Vec::new(),
        }
    }

    /// Empties every buffer but keeps the capacity
    pub fn clear(&mut self) {
        self.vertex_table.clear();
        for point in &mut self.skin_accum {
            point.clear();
        }
        self.polygon_bones.clear();
        self.vertex_map.clear();
        self.times.clear();
    }
}
