use super::types::{MaterialKey, Vertex};
use crate::{diagnostics::Diagnostics, types::NodeId, workspace::Workspace};
use ahash::{HashMap, HashMapExt};
use log::{debug, trace};

/// Polygons that will become one partition, before rearrangement. Polygon
/// numbers refer to the input polygon order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PolygonGroup {
    pub materials: MaterialKey,
    pub polygons: Vec<usize>,
    pub bones: Vec<NodeId>,
    pub over_budget: bool,
}

/// Collects the distinct bones of a polygon's corners in order of first use
fn polygon_bones(
    corners: &[u32; 3],
    vertices: &[Vertex],
    out: &mut Vec<NodeId>,
) {
    out.clear();
    for c in corners {
        if let Some(v) = vertices.get(*c as usize) {
            for i in &v.influences {
                if !out.contains(&i.bone) {
                    out.push(i.bone);
                }
            }
        }
    }
}

/// Groups polygons by material key, keeping the order in which each key was
/// first seen and the input order of polygons within a key
fn bucket_by_material(
    materials: &[MaterialKey],
) -> Vec<(MaterialKey, Vec<usize>)> {
    let mut lookup: HashMap<&MaterialKey, usize> = HashMap::new();
    let mut buckets: Vec<(MaterialKey, Vec<usize>)> = Vec::new();
    for (polygon, key) in materials.iter().enumerate() {
        let slot = *lookup.entry(key).or_insert_with(|| {
            buckets.push((key.clone(), Vec::new()));
            buckets.len() - 1
        });
        buckets[slot].1.push(polygon);
    }
    buckets
}

/// Splits polygons into groups that share one material key and, for a
/// skinned mesh, reference at most `max_bones` distinct bones.
///
/// Within a material bucket polygons are taken in order. A polygon joins the
/// open group if the group's bones plus its own still fit, otherwise the
/// group is closed and a new one starts from this polygon's bones. A
/// polygon that alone needs more than `max_bones` bones is put in a group
/// of its own, marked `over_budget`, and a warning is recorded.
///
/// `materials` and `corners` are indexed by polygon. `corners` holds
/// canonical vertex indices into `vertices`.
#[must_use]
#[allow(clippy::too_many_arguments)]
pub fn partition(
    node_name: &str,
    materials: &[MaterialKey],
    corners: &[[u32; 3]],
    vertices: &[Vertex],
    skinned: bool,
    max_bones: usize,
    workspace: &mut Workspace,
    diagnostics: &mut Diagnostics,
) -> Vec<PolygonGroup> {
    let buckets = bucket_by_material(materials);
    let mut groups = Vec::new();

    for (key, polygons) in buckets {
        if !skinned {
            groups.push(PolygonGroup {
                materials: key,
                polygons,
                bones: Vec::new(),
                over_budget: false,
            });
            continue;
        }

        let mut open: Option<PolygonGroup> = None;
        for polygon in polygons {
            let Some(c) = corners.get(polygon) else {
                continue;
            };
            let bones = &mut workspace.polygon_bones;
            polygon_bones(c, vertices, bones);

            if bones.len() > max_bones {
                if let Some(g) = open.take() {
                    groups.push(g);
                }
                diagnostics.warn(format!(
                    "{node_name}: polygon {polygon} uses {} bones, more than \
                     the partition maximum of {max_bones}",
                    bones.len()
                ));
                groups.push(PolygonGroup {
                    materials: key.clone(),
                    polygons: vec![polygon],
                    bones: bones.clone(),
                    over_budget: true,
                });
                continue;
            }

            if let Some(g) = open.as_mut() {
                let new_bones =
                    bones.iter().filter(|b| !g.bones.contains(*b)).count();
                if g.bones.len() + new_bones <= max_bones {
                    for b in bones.iter() {
                        if !g.bones.contains(b) {
                            g.bones.push(*b);
                        }
                    }
                    g.polygons.push(polygon);
                    continue;
                }
                trace!(
                    "{}: closing partition of {} polygons at polygon {}",
                    node_name,
                    g.polygons.len(),
                    polygon
                );
            }
            if let Some(g) = open.take() {
                groups.push(g);
            }
            open = Some(PolygonGroup {
                materials: key.clone(),
                polygons: vec![polygon],
                bones: bones.clone(),
                over_budget: false,
            });
        }
        if let Some(g) = open {
            groups.push(g);
        }
    }

    debug!(
        "{}: {} polygons in {} partitions",
        node_name,
        corners.len(),
        groups.len()
    );
    groups
}
