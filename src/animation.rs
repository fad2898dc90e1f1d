pub mod evaluate;
pub mod merge;
mod types;

// Re-exports
pub use {
    evaluate::{slerp, Interpolate},
    merge::{merge_channel, merge_clip, merge_node},
    types::{
        AnimationClip, AxisCurve, AxisCurves, ClampPolicy, ClipInput,
        CurveSample, Interpolation, Keyframe, NodeAnimation, NodeCurves, Track,
    },
};
