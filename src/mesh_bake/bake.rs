use super::{
    baked::{BakedMesh, BoneBinding},
    canonical::canonicalize,
    partition::partition,
    rearrange::rearrange,
    skin::normalize_skin,
    types::{
        InfluenceList, LayerElement, MaterialKey, MeshInput, Vertex,
        VertexLayout,
    },
};
use crate::{
    bake_error::{BakeError, InputError},
    diagnostics::Diagnostics,
    options::{BakeOptions, LayerOptions},
    scene::Scene,
    types::NodeId,
    workspace::Workspace,
};
use log::{debug, info};
use nalgebra_glm as glm;
use smallvec::SmallVec;

/// Decides which layers the vertices of `mesh` carry
#[must_use]
pub fn vertex_layout(
    mesh: &MeshInput,
    layers: &LayerOptions,
    skinned: bool,
) -> VertexLayout {
    VertexLayout {
        colors: if layers.colors { mesh.colors.len() } else { 0 },
        normals: layers.normals && mesh.normals.is_some(),
        binormals: layers.binormals && mesh.binormals.is_some(),
        tangents: layers.tangents && mesh.tangents.is_some(),
        uv_names: if layers.uvs {
            mesh.uvs.iter().map(|uv| uv.name.clone()).collect()
        } else {
            Vec::new()
        },
        skinned,
    }
}

/// Location of one polygon corner
#[derive(Copy, Clone, Debug)]
pub struct Corner {
    pub control_point: usize,
    pub polygon: usize,
    /// Running corner number across the whole mesh
    pub polygon_vertex: usize,
}

/// Gathers the full attribute bundle of one polygon corner. Only layers in
/// `layout` are read. `influences` is indexed by control point and may be
/// empty for a mesh without skin.
///
/// # Errors
/// Returns `InputError::ShortLayer` if an enabled layer has no value for
/// the corner
pub fn corner_bundle(
    node_name: &str,
    mesh: &MeshInput,
    layout: &VertexLayout,
    influences: &[InfluenceList],
    corner: Corner,
) -> Result<Vertex, InputError> {
    let short = |layer: &'static str| InputError::ShortLayer {
        node: node_name.to_string(),
        layer,
    };
    let Corner {
        control_point,
        polygon,
        polygon_vertex,
    } = corner;

    let position = *mesh
        .control_points
        .get(control_point)
        .ok_or_else(|| short("position"))?;

    let mut colors = SmallVec::new();
    for layer in mesh.colors.iter().take(layout.colors) {
        colors.push(
            layer
                .get(control_point, polygon, polygon_vertex)
                .ok_or_else(|| short("color"))?,
        );
    }

    let vector = |enabled: bool,
                  layer: Option<&LayerElement<[f32; 3]>>,
                  name: &'static str|
     -> Result<Option<glm::Vec3>, InputError> {
        match layer {
            Some(l) if enabled => l
                .get(control_point, polygon, polygon_vertex)
                .map(|v| Some(glm::vec3(v[0], v[1], v[2])))
                .ok_or_else(|| short(name)),
            _ => Ok(None),
        }
    };
    let normal = vector(layout.normals, mesh.normals.as_ref(), "normal")?;
    let binormal =
        vector(layout.binormals, mesh.binormals.as_ref(), "binormal")?;
    let tangent = vector(layout.tangents, mesh.tangents.as_ref(), "tangent")?;

    let mut uvs = SmallVec::new();
    for layer in mesh.uvs.iter().take(layout.uv_names.len()) {
        uvs.push(
            layer
                .element
                .get(control_point, polygon, polygon_vertex)
                .ok_or_else(|| short("uv"))?,
        );
    }

    let influences = if layout.skinned {
        influences.get(control_point).cloned().unwrap_or_default()
    } else {
        InfluenceList::new()
    };

    Ok(Vertex {
        position,
        colors,
        normal,
        binormal,
        tangent,
        uvs,
        influences,
    })
}

/// Checks that every polygon is a triangle over existing control points
fn validate_polygons(
    node_name: &str,
    mesh: &MeshInput,
) -> Result<Vec<[u32; 3]>, InputError> {
    let count = mesh.control_points.len();
    mesh.polygons
        .iter()
        .enumerate()
        .map(|(polygon, p)| {
            let &[a, b, c] = p.corners.as_slice() else {
                return Err(InputError::NotTriangulated {
                    node: node_name.to_string(),
                    polygon,
                    corners: p.corners.len(),
                });
            };
            if let Some(bad) =
                [a, b, c].into_iter().find(|i| *i as usize >= count)
            {
                return Err(InputError::ControlPointOutOfRange {
                    node: node_name.to_string(),
                    index: bad,
                    count,
                });
            }
            Ok([a, b, c])
        })
        .collect()
}

fn material_keys(
    node_name: &str,
    mesh: &MeshInput,
) -> Result<Vec<MaterialKey>, InputError> {
    (0..mesh.polygons.len())
        .map(|polygon| {
            mesh.materials
                .iter()
                .map(|layer| {
                    layer.get(polygon).ok_or_else(|| {
                        InputError::MaterialLayerMismatch {
                            node: node_name.to_string(),
                            polygon,
                        }
                    })
                })
                .collect::<Result<MaterialKey, InputError>>()
        })
        .collect()
}

/// Bind offsets for every bone used by the partitions, in order of first
/// use across partitions
fn bone_bindings(
    scene: &Scene,
    mesh_node: NodeId,
    mesh: &BakedMesh,
) -> Vec<BoneBinding> {
    let mesh_bind = scene
        .global_bind_matrix(mesh_node)
        .unwrap_or_else(glm::Mat4::identity);
    let mut bindings: Vec<BoneBinding> = Vec::new();
    for bone in mesh.partitions.iter().flat_map(|p| p.bones.iter()) {
        if bindings.iter().any(|b| b.node == *bone) {
            continue;
        }
        let bone_bind = scene
            .global_bind_matrix(*bone)
            .unwrap_or_else(glm::Mat4::identity);
        bindings.push(BoneBinding {
            node: *bone,
            offset: glm::inverse(&bone_bind) * mesh_bind,
        });
    }
    bindings
}

/// Bakes the mesh carried by `node` into render ready buffers.
///
/// Runs the whole mesh pipeline: skin normalization, vertex
/// canonicalization, partitioning by material and bone budget, and
/// rearrangement into per partition vertex ranges. Soft problems are
/// recorded in `diagnostics`.
///
/// # Errors
/// Returns `BakeError::Input` if the node or its mesh data is malformed,
/// or a count error if the result cannot be indexed with 32 bits
pub fn bake_mesh(
    scene: &Scene,
    node_id: NodeId,
    options: &BakeOptions,
    workspace: &mut Workspace,
    diagnostics: &mut Diagnostics,
) -> Result<BakedMesh, BakeError> {
    let node = scene
        .node(node_id)
        .ok_or_else(|| InputError::NotAMesh(scene.name(node_id)))?;
    let Some((mesh, skin)) = node.mesh() else {
        return Err(InputError::NotAMesh(node.name.clone()).into());
    };
    let name = node.name.as_str();

    let corners = validate_polygons(name, mesh)?;
    let layout = vertex_layout(mesh, &options.layers, skin.is_some());
    debug!("{}: layout={:?}", name, layout);

    let influences = match skin {
        Some(skin) => normalize_skin(
            name,
            skin,
            mesh.control_points.len(),
            scene,
            options.max_influences_per_vertex,
            workspace,
        )?,
        None => Vec::new(),
    };

    let mut bundles = Vec::with_capacity(corners.len() * 3);
    for (polygon, c) in corners.iter().enumerate() {
        for (k, control_point) in c.iter().enumerate() {
            bundles.push(corner_bundle(
                name,
                mesh,
                &layout,
                &influences,
                Corner {
                    control_point: *control_point as usize,
                    polygon,
                    polygon_vertex: polygon * 3 + k,
                },
            )?);
        }
    }
    let materials = material_keys(name, mesh)?;

    let canonical = canonicalize(bundles, &layout.uv_names, workspace)?;
    let canonical_corners: Vec<[u32; 3]> = canonical
        .remap
        .chunks_exact(3)
        .map(|c| [c[0], c[1], c[2]])
        .collect();

    let groups = partition(
        name,
        &materials,
        &canonical_corners,
        &canonical.vertices,
        layout.skinned,
        options.max_bones_per_partition,
        workspace,
        diagnostics,
    );

    let mut baked = rearrange(
        name,
        node_id,
        &canonical,
        &canonical_corners,
        &groups,
        &layout,
        workspace,
    )?;
    if layout.skinned {
        baked.bones = bone_bindings(scene, node_id, &baked);
    }

    info!(
        "Baked mesh {}: {} polygons, {} vertices, {} partitions, {} bones",
        name,
        corners.len(),
        baked.vertex_count(),
        baked.partitions.len(),
        baked.bones.len()
    );
    Ok(baked)
}
