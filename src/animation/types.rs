use crate::types::NodeId;
use ahash::{HashMap, HashMapExt};
use nalgebra_glm as glm;
use serde::{Deserialize, Serialize};

#[derive(
    Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize,
)]
pub enum Interpolation {
    #[default]
    Step,
    Linear,
}

/// One key of a single axis curve as a scene reader delivers it
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CurveSample {
    pub time: f32,
    pub interpolation: Interpolation,
    pub value: f32,
}

impl CurveSample {
    #[must_use]
    pub const fn step(time: f32, value: f32) -> Self {
        Self {
            time,
            interpolation: Interpolation::Step,
            value,
        }
    }

    #[must_use]
    pub const fn linear(time: f32, value: f32) -> Self {
        Self {
            time,
            interpolation: Interpolation::Linear,
            value,
        }
    }
}

/// Samples of one axis, ordered by time
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AxisCurve {
    pub samples: Vec<CurveSample>,
}

impl AxisCurve {
    #[must_use]
    pub fn new(samples: Vec<CurveSample>) -> Self {
        Self { samples }
    }
}

/// X, Y and Z curves of a channel. Any of them may be missing.
pub type AxisCurves = [Option<AxisCurve>; 3];

/// Raw curves for one node. Rotation values are Euler degrees applied in
/// the node's rotation order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeCurves {
    pub node: NodeId,
    pub translation: AxisCurves,
    pub rotation: AxisCurves,
    pub scaling: AxisCurves,
}

impl NodeCurves {
    #[must_use]
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            ..Default::default()
        }
    }

    /// All axis curves of the node, translation first
    pub fn axes(&self) -> impl Iterator<Item = &AxisCurve> {
        self.translation
            .iter()
            .chain(&self.rotation)
            .chain(&self.scaling)
            .flatten()
    }
}

/// Unmerged animation as a scene reader delivers it
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClipInput {
    pub name: String,
    pub curves: Vec<NodeCurves>,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Keyframe<T> {
    pub time: f32,
    pub interpolation: Interpolation,
    pub value: T,
}

/// Time ordered keyframes of one channel. A track always holds at least one
/// keyframe.
#[derive(Clone, Debug, PartialEq)]
pub struct Track<T> {
    keys: Vec<Keyframe<T>>,
}

impl<T: Copy> Track<T> {
    /// Single stepped key at time 0
    #[must_use]
    pub fn constant(value: T) -> Self {
        Self {
            keys: vec![Keyframe {
                time: 0.0_f32,
                interpolation: Interpolation::Step,
                value,
            }],
        }
    }

    /// Returns `None` if `keys` is empty or not ordered by time
    #[must_use]
    pub fn from_keys(keys: Vec<Keyframe<T>>) -> Option<Self> {
        if keys.is_empty() || !keys.windows(2).all(|w| w[0].time <= w[1].time)
        {
            return None;
        }
        Some(Self { keys })
    }

    #[must_use]
    pub fn keys(&self) -> &[Keyframe<T>] {
        &self.keys
    }

    #[must_use]
    pub fn start_time(&self) -> f32 {
        self.keys[0].time
    }

    #[must_use]
    pub fn end_time(&self) -> f32 {
        self.keys[self.keys.len() - 1].time
    }

    /// Replaces every value, keeping times and interpolation
    #[must_use]
    pub fn map<U: Copy, F: Fn(&T) -> U>(&self, f: F) -> Track<U> {
        Track {
            keys: self
                .keys
                .iter()
                .map(|k| Keyframe {
                    time: k.time,
                    interpolation: k.interpolation,
                    value: f(&k.value),
                })
                .collect(),
        }
    }
}

/// How a query time outside a track is treated
#[derive(
    Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize,
)]
pub enum ClampPolicy {
    /// Clamp into [first key time, last key time]
    #[default]
    Range,
    /// Hold the last value past the end of the track. Used when scrubbing
    /// past the end of a clip.
    ToLast,
}

/// Merged tracks of one node
#[derive(Clone, Debug, PartialEq)]
pub struct NodeAnimation {
    pub node: NodeId,
    pub translation: Track<glm::Vec3>,
    pub rotation: Track<glm::Quat>,
    pub scale: Track<glm::Vec3>,
}

impl NodeAnimation {
    #[must_use]
    pub fn end_time(&self) -> f32 {
        self.translation
            .end_time()
            .max(self.rotation.end_time())
            .max(self.scale.end_time())
    }
}

#[derive(Clone, Debug, Default)]
pub struct AnimationClip {
    pub name: String,
    pub duration: f32,
    nodes: Vec<NodeAnimation>,
    index: HashMap<NodeId, usize>,
}

impl AnimationClip {
    /// Builds a clip from merged nodes. Each node may appear once; a later
    /// entry for a node that is already present is ignored.
    #[must_use]
    pub fn new(name: &str, nodes: Vec<NodeAnimation>) -> Self {
        let mut index = HashMap::with_capacity(nodes.len());
        let mut kept = Vec::with_capacity(nodes.len());
        for n in nodes {
            if index.contains_key(&n.node) {
                continue;
            }
            index.insert(n.node, kept.len());
            kept.push(n);
        }
        let duration = kept
            .iter()
            .map(NodeAnimation::end_time)
            .fold(0.0_f32, f32::max);
        Self {
            name: name.to_string(),
            duration,
            nodes: kept,
            index,
        }
    }

    #[must_use]
    pub fn nodes(&self) -> &[NodeAnimation] {
        &self.nodes
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&NodeAnimation> {
        self.index.get(&id).and_then(|i| self.nodes.get(*i))
    }

    /// Rewrites node handles through `f`. Nodes for which `f` returns `None`
    /// are dropped.
    pub fn retarget<F: Fn(NodeId) -> Option<NodeId>>(&mut self, f: F) {
        let nodes = std::mem::take(&mut self.nodes);
        let nodes = nodes
            .into_iter()
            .filter_map(|mut n| {
                f(n.node).map(|id| {
                    n.node = id;
                    n
                })
            })
            .collect();
        *self = Self::new(&self.name, nodes);
    }
}

impl PartialEq for AnimationClip {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.duration.to_bits() == other.duration.to_bits()
            && self.nodes == other.nodes
    }
}

#[cfg(test)]
mod tests {
    use super::{
        AnimationClip, Interpolation, Keyframe, NodeAnimation, Track,
    };
    use crate::types::NodeId;
    use nalgebra_glm as glm;

    fn key(time: f32) -> Keyframe<f32> {
        Keyframe {
            time,
            interpolation: Interpolation::Linear,
            value: time,
        }
    }

    #[test]
    fn track_must_be_ordered_and_non_empty() {
        assert!(Track::<f32>::from_keys(Vec::new()).is_none());
        assert!(Track::from_keys(vec![key(1.0), key(0.0)]).is_none());
        assert!(Track::from_keys(vec![key(0.0), key(f32::NAN)]).is_none());
        let t = Track::from_keys(vec![key(0.0), key(0.0), key(2.0)]).unwrap();
        assert_eq!(t.start_time(), 0.0);
        assert_eq!(t.end_time(), 2.0);
    }

    #[test]
    fn clip_index_and_duration() {
        let node = |id: u32, end: f32| NodeAnimation {
            node: NodeId(id),
            translation: Track::from_keys(vec![
                Keyframe {
                    time: 0.0,
                    interpolation: Interpolation::Step,
                    value: glm::Vec3::zeros(),
                },
                Keyframe {
                    time: end,
                    interpolation: Interpolation::Step,
                    value: glm::Vec3::zeros(),
                },
            ])
            .unwrap(),
            rotation: Track::constant(glm::Quat::identity()),
            scale: Track::constant(glm::vec3(1.0, 1.0, 1.0)),
        };
        let mut clip = AnimationClip::new(
            "walk",
            vec![node(3, 1.5), node(1, 2.5), node(3, 9.0)],
        );
        assert_eq!(clip.nodes().len(), 2);
        assert_eq!(clip.duration, 2.5);
        assert!(clip.node(NodeId(1)).is_some());
        assert!(clip.node(NodeId(2)).is_none());

        clip.retarget(|id| (id.0 == 1).then_some(NodeId(0)));
        assert_eq!(clip.nodes().len(), 1);
        assert!(clip.node(NodeId(0)).is_some());
        assert_eq!(clip.duration, 2.5);
    }
}
