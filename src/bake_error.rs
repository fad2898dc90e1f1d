use std::{error, fmt};

/// Unified error type
///
/// Input problems that make a conversion pass impossible are wrapped in
/// `InputError` which carries enough context to find the offending node.
/// Soft violations are never returned as errors; they are recorded as
/// warnings in `Diagnostics` and the pass continues.
#[derive(Debug)]
pub enum BakeError {
    InvalidOptions(String),
    IndexTooLarge,
    VertexCountTooLarge,
    IndexCountTooLarge,
    SerdeYamlError(Box<serde_yaml::Error>),
    StdIoError(std::io::Error),
    Input(InputError),
}

impl error::Error for BakeError {}

impl fmt::Display for BakeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidOptions(s) => write!(f, "invalid options: {s}"),
            Self::IndexTooLarge => write!(f, "index does not fit in 32 bits"),
            Self::IndexCountTooLarge => {
                write!(f, "index count does not fit in 32 bits")
            }
            Self::VertexCountTooLarge => {
                write!(f, "vertex count does not fit in 32 bits")
            }
            Self::SerdeYamlError(e) => {
                write!(f, "serde_yaml::Error: {e}")
            }
            Self::StdIoError(e) => write!(f, "std::io::Error: {}", e.kind()),
            Self::Input(e) => write!(f, "input error: {e}"),
        }
    }
}

impl From<serde_yaml::Error> for BakeError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::SerdeYamlError(Box::new(e))
    }
}

impl From<std::io::Error> for BakeError {
    fn from(e: std::io::Error) -> Self {
        Self::StdIoError(e)
    }
}

impl From<InputError> for BakeError {
    fn from(e: InputError) -> Self {
        Self::Input(e)
    }
}

/// Errors in the scene data handed to a conversion pass. `BakeError` has a
/// `From` trait to handle these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    NoRootNode,
    DanglingParent(u32),
    UnmappedNode(u32),
    NotAMesh(String),
    NotTriangulated {
        node: String,
        polygon: usize,
        corners: usize,
    },
    ControlPointOutOfRange {
        node: String,
        index: u32,
        count: usize,
    },
    MissingBindNode {
        node: String,
        cluster: usize,
    },
    DanglingBindNode {
        node: String,
        cluster: usize,
        bind_node: u32,
    },
    DanglingAnimationNode {
        clip: String,
        node: u32,
    },
    UnsortedCurve {
        clip: String,
        node: String,
    },
    NonFiniteCurveTime {
        clip: String,
        node: String,
    },
    MixedLinkModes(String),
    WeightCountMismatch {
        node: String,
        cluster: usize,
    },
    ShortLayer {
        node: String,
        layer: &'static str,
    },
    MaterialLayerMismatch {
        node: String,
        polygon: usize,
    },
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::NoRootNode => write!(f, "scene has no root node"),
            Self::DanglingParent(p) => {
                write!(f, "parent node {p} is not in the scene")
            }
            Self::UnmappedNode(n) => {
                write!(f, "node {n} has no counterpart after remapping")
            }
            Self::NotAMesh(node) => write!(f, "node {node} is not a mesh"),
            Self::NotTriangulated {
                node,
                polygon,
                corners,
            } => {
                write!(
                    f,
                    "node {node} polygon {polygon} has {corners} corners, \
                     only triangulated meshes are supported"
                )
            }
            Self::ControlPointOutOfRange { node, index, count } => {
                write!(
                    f,
                    "node {node} references control point {index} \
                     but only {count} exist"
                )
            }
            Self::MissingBindNode { node, cluster } => {
                write!(f, "node {node} cluster {cluster} has no bind node")
            }
            Self::DanglingBindNode {
                node,
                cluster,
                bind_node,
            } => {
                write!(
                    f,
                    "node {node} cluster {cluster} binds to node {bind_node} \
                     which is not in the scene"
                )
            }
            Self::DanglingAnimationNode { clip, node } => {
                write!(
                    f,
                    "clip {clip} animates node {node} which is not in the scene"
                )
            }
            Self::UnsortedCurve { clip, node } => {
                write!(
                    f,
                    "clip {clip} node {node} has a curve that is not \
                     ordered by time"
                )
            }
            Self::NonFiniteCurveTime { clip, node } => {
                write!(
                    f,
                    "clip {clip} node {node} has a curve sample at a time \
                     that is not a finite number"
                )
            }
            Self::MixedLinkModes(node) => {
                write!(f, "node {node} mixes skin link modes")
            }
            Self::WeightCountMismatch { node, cluster } => {
                write!(
                    f,
                    "node {node} cluster {cluster} has a mismatch in the \
                     count of indices and weights"
                )
            }
            Self::ShortLayer { node, layer } => {
                write!(f, "node {node} {layer} layer is too short")
            }
            Self::MaterialLayerMismatch { node, polygon } => {
                write!(
                    f,
                    "node {node} material layer has no entry for polygon \
                     {polygon}"
                )
            }
        }
    }
}
