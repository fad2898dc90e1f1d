use super::types::{Influence, InfluenceList, SkinInput};
use crate::{
    bake_error::{BakeError, InputError},
    scene::Scene,
    types::NodeId,
    workspace::Workspace,
};
use log::{debug, error, trace};
use smallvec::SmallVec;

/// Checks the clusters of a skin before any weights are read. Every cluster
/// must be bound to a node of `scene`, have one weight per index, address
/// existing control points, and use the same link mode as the others.
fn validate(
    node_name: &str,
    skin: &SkinInput,
    control_point_count: usize,
    scene: &Scene,
) -> Result<(), InputError> {
    let mut link_mode = None;
    for (cluster_index, cluster) in skin.clusters.iter().enumerate() {
        let Some(bone) = cluster.bone else {
            error!("{} cluster {} has no bind node", node_name, cluster_index);
            return Err(InputError::MissingBindNode {
                node: node_name.to_string(),
                cluster: cluster_index,
            });
        };
        if !scene.contains(bone) {
            error!(
                "{} cluster {} binds to missing node {}",
                node_name, cluster_index, bone
            );
            return Err(InputError::DanglingBindNode {
                node: node_name.to_string(),
                cluster: cluster_index,
                bind_node: bone.0,
            });
        }
        if *link_mode.get_or_insert(cluster.link_mode) != cluster.link_mode {
            error!("{} mixes skin link modes", node_name);
            return Err(InputError::MixedLinkModes(node_name.to_string()));
        }
        if cluster.indices.len() != cluster.weights.len() {
            error!(
                "{} cluster {} has {} indices but {} weights",
                node_name,
                cluster_index,
                cluster.indices.len(),
                cluster.weights.len()
            );
            return Err(InputError::WeightCountMismatch {
                node: node_name.to_string(),
                cluster: cluster_index,
            });
        }
        if let Some(bad) = cluster
            .indices
            .iter()
            .find(|i| **i as usize >= control_point_count)
        {
            error!(
                "{} cluster {} addresses control point {}",
                node_name, cluster_index, bad
            );
            return Err(InputError::ControlPointOutOfRange {
                node: node_name.to_string(),
                index: *bad,
                count: control_point_count,
            });
        }
    }
    Ok(())
}

/// Reduces one control point's (bone, weight) pairs to at most
/// `max_influences` entries summing to 1. Entries are in order of first
/// encounter. The smallest weight is dropped first and among equal weights
/// the one encountered first goes. The result is sorted by descending
/// weight, keeping encounter order for equal weights.
fn reduce(
    entries: &mut SmallVec<[(NodeId, f32); 8]>,
    max_influences: usize,
) -> InfluenceList {
    entries.retain(|(_, w)| *w > 0.0_f32);
    while entries.len() > max_influences {
        let mut smallest = 0;
        for (i, (_, w)) in entries.iter().enumerate().skip(1) {
            if *w < entries[smallest].1 {
                smallest = i;
            }
        }
        entries.remove(smallest);
    }

    let total: f32 = entries.iter().map(|(_, w)| w).sum();
    if total <= 0.0_f32 {
        return InfluenceList::new();
    }
    let mut list: InfluenceList = entries
        .iter()
        .map(|(bone, w)| Influence {
            bone: *bone,
            weight: w / total,
        })
        .collect();
    // Stable sort so equal weights keep their encounter order
    list.sort_by(|a, b| {
        b.weight
            .partial_cmp(&a.weight)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    list
}

/// Builds the final influence list of every control point of a mesh.
///
/// Contributions from the same bone to the same point are summed, so
/// overlapping clusters that target one bone add up rather than replace
/// each other. Points with no positive weight get an empty list.
///
/// # Errors
/// Returns `BakeError::Input` if the skin fails validation
pub fn normalize_skin(
    node_name: &str,
    skin: &SkinInput,
    control_point_count: usize,
    scene: &Scene,
    max_influences: usize,
    workspace: &mut Workspace,
) -> Result<Vec<InfluenceList>, BakeError> {
    validate(node_name, skin, control_point_count, scene)?;

    let accum = &mut workspace.skin_accum;
    for point in accum.iter_mut() {
        point.clear();
    }
    if accum.len() < control_point_count {
        accum.resize_with(control_point_count, SmallVec::new);
    }

    for cluster in &skin.clusters {
        // Validation guarantees the bone is present
        let Some(bone) = cluster.bone else {
            continue;
        };
        for (index, weight) in cluster.indices.iter().zip(&cluster.weights) {
            let point = &mut accum[*index as usize];
            if let Some(entry) = point.iter_mut().find(|(b, _)| *b == bone) {
                entry.1 += weight;
            } else {
                point.push((bone, *weight));
            }
        }
    }

    let mut trimmed = 0_usize;
    let influences: Vec<InfluenceList> = accum
        .iter_mut()
        .take(control_point_count)
        .map(|entries| {
            let before = entries.len();
            let list = reduce(entries, max_influences);
            if before > max_influences {
                trimmed += 1;
            }
            list
        })
        .collect();

    trace!("influences={:?}", influences);
    debug!(
        "{}: {} clusters, {} control points, {} trimmed to {} influences",
        node_name,
        skin.clusters.len(),
        control_point_count,
        trimmed,
        max_influences
    );
    Ok(influences)
}

#[cfg(test)]
mod tests {
    use super::normalize_skin;
    use crate::{
        bake_error::{BakeError, InputError},
        mesh_bake::{Cluster, LinkMode, SkinInput},
        scene::{BindTransform, BoneNode, NodeKind, Scene},
        types::NodeId,
        workspace::Workspace,
    };

    const EPSILON: f32 = 0.0001_f32;

    fn scene_with_bones(count: usize) -> (Scene, Vec<NodeId>) {
        let mut scene = Scene::new();
        let root = scene
            .add_root("root", BindTransform::default(), NodeKind::Plain)
            .unwrap();
        let bones = (0..count)
            .map(|i| {
                scene
                    .add_node(
                        Some(root),
                        &format!("bone{i}"),
                        BindTransform::default(),
                        NodeKind::Bone(BoneNode::default()),
                    )
                    .unwrap()
            })
            .collect();
        (scene, bones)
    }

    fn cluster(bone: NodeId, indices: Vec<u32>, weights: Vec<f32>) -> Cluster {
        Cluster {
            bone: Some(bone),
            link_mode: LinkMode::Normalize,
            indices,
            weights,
        }
    }

    #[test]
    fn cap_drops_first_encountered_smallest() {
        let (scene, b) = scene_with_bones(4);
        let skin = SkinInput {
            clusters: vec![
                cluster(b[0], vec![0], vec![0.1]),
                cluster(b[1], vec![0], vec![0.5]),
                cluster(b[2], vec![0], vec![0.3]),
                cluster(b[3], vec![0], vec![0.1]),
            ],
        };
        let mut ws = Workspace::new();
        let out = normalize_skin("m", &skin, 1, &scene, 3, &mut ws).unwrap();
        let list = &out[0];
        assert_eq!(list.len(), 3);
        assert!(list.iter().all(|i| i.bone != b[0]));
        let sum: f32 = list.iter().map(|i| i.weight).sum();
        assert!((sum - 1.0).abs() < EPSILON);
        assert_eq!(list[0].bone, b[1]);
        assert!((list[0].weight - 0.5 / 0.9).abs() < EPSILON);
        assert_eq!(list[2].bone, b[3]);
    }

    #[test]
    fn duplicate_contributions_are_summed() {
        let (scene, b) = scene_with_bones(2);
        let skin = SkinInput {
            clusters: vec![
                cluster(b[0], vec![0, 1], vec![0.25, 1.0]),
                cluster(b[1], vec![0], vec![0.5]),
                cluster(b[0], vec![0], vec![0.25]),
            ],
        };
        let mut ws = Workspace::new();
        let out = normalize_skin("m", &skin, 2, &scene, 4, &mut ws).unwrap();
        assert_eq!(out[0].len(), 2);
        assert!((out[0][0].weight - 0.5).abs() < EPSILON);
        assert!((out[0][1].weight - 0.5).abs() < EPSILON);
        assert_eq!(out[1].len(), 1);
        assert!((out[1][0].weight - 1.0).abs() < EPSILON);
    }

    #[test]
    fn zero_weight_point_is_empty() {
        let (scene, b) = scene_with_bones(1);
        let skin = SkinInput {
            clusters: vec![cluster(b[0], vec![0], vec![0.0])],
        };
        let mut ws = Workspace::new();
        let out = normalize_skin("m", &skin, 3, &scene, 4, &mut ws).unwrap();
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|l| l.is_empty()));
    }

    #[test]
    fn mixed_link_modes_rejected() {
        let (scene, b) = scene_with_bones(2);
        let mut second = cluster(b[1], vec![0], vec![1.0]);
        second.link_mode = LinkMode::Additive;
        let skin = SkinInput {
            clusters: vec![cluster(b[0], vec![0], vec![1.0]), second],
        };
        let mut ws = Workspace::new();
        let r = normalize_skin("m", &skin, 1, &scene, 4, &mut ws);
        assert!(matches!(
            r,
            Err(BakeError::Input(InputError::MixedLinkModes(_)))
        ));
    }

    #[test]
    fn bad_bind_nodes_rejected() {
        let (scene, _) = scene_with_bones(1);
        let mut ws = Workspace::new();
        let skin = SkinInput {
            clusters: vec![cluster(NodeId(40), vec![0], vec![1.0])],
        };
        let r = normalize_skin("m", &skin, 1, &scene, 4, &mut ws);
        assert!(matches!(
            r,
            Err(BakeError::Input(InputError::DanglingBindNode { .. }))
        ));

        let skin = SkinInput {
            clusters: vec![Cluster::default()],
        };
        let r = normalize_skin("m", &skin, 1, &scene, 4, &mut ws);
        assert!(matches!(
            r,
            Err(BakeError::Input(InputError::MissingBindNode { .. }))
        ));
    }

    #[test]
    fn workspace_reuse_is_clean() {
        let (scene, b) = scene_with_bones(1);
        let skin = SkinInput {
            clusters: vec![cluster(b[0], vec![0, 1], vec![1.0, 1.0])],
        };
        let mut ws = Workspace::new();
        let first = normalize_skin("m", &skin, 2, &scene, 4, &mut ws).unwrap();
        let second = normalize_skin("m", &skin, 2, &scene, 4, &mut ws).unwrap();
        assert_eq!(first, second);
        assert!((second[0][0].weight - 1.0).abs() < EPSILON);
    }
}
