use super::{
    evaluate::{weight, Interpolate},
    types::{
        AnimationClip, AxisCurve, AxisCurves, ClipInput, CurveSample,
        Interpolation, Keyframe, NodeAnimation, NodeCurves, Track,
    },
};
use crate::{
    bake_error::{BakeError, InputError},
    diagnostics::Diagnostics,
    scene::{euler_to_quat, BindTransform, Scene},
    types::NodeId,
    workspace::Workspace,
};
use ahash::{HashSet, HashSetExt};
use itertools::Itertools;
use log::{debug, info, trace};
use nalgebra_glm as glm;

/// Resolves one axis at time `t`, moving `cursor` forward to the sample at
/// or before `t`. Times must be visited in increasing order. Returns the
/// value and whether it came from a linear segment.
fn resolve_axis(
    samples: &[CurveSample],
    cursor: &mut usize,
    t: f32,
) -> Option<(f32, bool)> {
    let first = samples.first()?;
    if t < first.time {
        return Some((first.value, false));
    }
    while *cursor + 1 < samples.len() && samples[*cursor + 1].time <= t {
        *cursor += 1;
    }
    let left = &samples[*cursor];
    let Some(right) = samples.get(*cursor + 1) else {
        // At or past the last sample
        return Some((left.value, false));
    };
    Some(match left.interpolation {
        Interpolation::Step => (left.value, false),
        Interpolation::Linear => (
            left.value
                .interpolate(&right.value, weight(left.time, right.time, t)),
            true,
        ),
    })
}

/// Merges up to three axis curves into one vector track.
///
/// Keys are placed at the union of every axis's sample times. At each time
/// every axis is resolved on its own: before its first sample it holds the
/// first value, past its last it holds the last, in between the left
/// sample's interpolation decides. A missing axis uses the matching
/// component of `bind`. A merged key is linear if any axis was resolved
/// through a linear segment. With no samples at all the track is a single
/// stepped key at time 0 holding `bind`.
///
/// Curves must be ordered by time and every time must be finite.
#[must_use]
pub fn merge_channel(
    axes: &AxisCurves,
    bind: &glm::Vec3,
    workspace: &mut Workspace,
) -> Track<glm::Vec3> {
    let times = &mut workspace.times;
    times.clear();
    for axis in axes.iter().flatten() {
        times.extend(axis.samples.iter().map(|s| s.time));
    }
    if times.is_empty() {
        return Track::constant(*bind);
    }
    times.sort_by(|a, b| {
        a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal)
    });
    times.dedup();

    let mut cursors = [0_usize; 3];
    let keys: Vec<Keyframe<glm::Vec3>> = times
        .iter()
        .map(|t| {
            let mut value = *bind;
            let mut linear = false;
            for (k, axis) in axes.iter().enumerate() {
                let resolved = axis.as_ref().and_then(|a| {
                    resolve_axis(&a.samples, &mut cursors[k], *t)
                });
                if let Some((v, lin)) = resolved {
                    value[k] = v;
                    linear |= lin;
                }
            }
            Keyframe {
                time: *t,
                interpolation: if linear {
                    Interpolation::Linear
                } else {
                    Interpolation::Step
                },
                value,
            }
        })
        .collect();
    trace!("merged {} keys", keys.len());

    // Times are sorted and the list is not empty
    Track::from_keys(keys).unwrap_or_else(|| Track::constant(*bind))
}

/// Merges every channel of one node. Rotation curves are resolved as Euler
/// degrees and then turned into quaternions with the node's rotation order.
#[must_use]
pub fn merge_node(
    curves: &NodeCurves,
    scene: &Scene,
    workspace: &mut Workspace,
) -> NodeAnimation {
    let bind = scene
        .node(curves.node)
        .map_or_else(BindTransform::default, |n| n.bind);
    let translation =
        merge_channel(&curves.translation, &bind.translation, workspace);
    let rotation = merge_channel(&curves.rotation, &bind.rotation, workspace)
        .map(|euler| euler_to_quat(euler, bind.rotation_order));
    let scale = merge_channel(&curves.scaling, &bind.scale, workspace);
    NodeAnimation {
        node: curves.node,
        translation,
        rotation,
        scale,
    }
}

fn is_sorted(curve: &AxisCurve) -> bool {
    curve
        .samples
        .iter()
        .tuple_windows()
        .all(|(a, b)| a.time <= b.time)
}

/// Merges all curves of a clip into per node tracks.
///
/// # Errors
/// Returns `InputError::DanglingAnimationNode` if curves address a node
/// that is not in `scene`, `InputError::NonFiniteCurveTime` if a sample
/// time is NaN or infinite, or `InputError::UnsortedCurve` if a curve is not
/// ordered by time. A node with more than one set of curves keeps the first
/// and a warning is recorded.
pub fn merge_clip(
    clip: &ClipInput,
    scene: &Scene,
    workspace: &mut Workspace,
    diagnostics: &mut Diagnostics,
) -> Result<AnimationClip, BakeError> {
    let mut seen: HashSet<NodeId> = HashSet::new();
    let mut nodes = Vec::with_capacity(clip.curves.len());
    for curves in &clip.curves {
        if !scene.contains(curves.node) {
            return Err(InputError::DanglingAnimationNode {
                clip: clip.name.clone(),
                node: curves.node.0,
            }
            .into());
        }
        if !curves
            .axes()
            .all(|a| a.samples.iter().all(|s| s.time.is_finite()))
        {
            return Err(InputError::NonFiniteCurveTime {
                clip: clip.name.clone(),
                node: scene.name(curves.node),
            }
            .into());
        }
        if !curves.axes().all(is_sorted) {
            return Err(InputError::UnsortedCurve {
                clip: clip.name.clone(),
                node: scene.name(curves.node),
            }
            .into());
        }
        if !seen.insert(curves.node) {
            diagnostics.warn(format!(
                "clip {} has more than one set of curves for node {}, \
                 only the first is used",
                clip.name,
                scene.name(curves.node)
            ));
            continue;
        }
        let animation = merge_node(curves, scene, workspace);
        debug!(
            "{}: {} translation, {} rotation, {} scale keys",
            scene.name(curves.node),
            animation.translation.keys().len(),
            animation.rotation.keys().len(),
            animation.scale.keys().len()
        );
        nodes.push(animation);
    }

    let clip = AnimationClip::new(&clip.name, nodes);
    info!(
        "Merged clip {}: {} nodes, duration {}",
        clip.name,
        clip.nodes().len(),
        clip.duration
    );
    Ok(clip)
}
