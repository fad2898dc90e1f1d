use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle to a node in a `Scene`. Skin clusters, baked bone combinations and
/// animation tracks refer to nodes only through this handle. It is a plain
/// index into the scene's node arena so it is only meaningful together with
/// the scene that issued it.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
pub struct NodeId(pub u32);

impl NodeId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Default for the maximum number of bones a vertex may be influenced by
pub const DEFAULT_MAX_INFLUENCES: usize = 4;

/// Default for the maximum number of distinct bones in one partition. Most
/// skinning shaders size their bone palette with a constant like this.
pub const DEFAULT_MAX_BONES: usize = 32;
