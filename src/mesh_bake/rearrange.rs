use super::{
    baked::{BakedMesh, BakedUvLayer, Partition},
    canonical::Canonical,
    partition::PolygonGroup,
    types::{InfluenceList, Vertex, VertexLayout},
};
use crate::{bake_error::BakeError, types::NodeId, workspace::Workspace};
use log::debug;
use nalgebra_glm as glm;

fn to_u32(x: usize, err: BakeError) -> Result<u32, BakeError> {
    u32::try_from(x).map_err(|_| err)
}

fn to_array(v: &glm::Vec3) -> [f32; 3] {
    [v.x, v.y, v.z]
}

/// Output buffers with one slot per enabled layer
struct Buffers {
    positions: Vec<[f32; 3]>,
    colors: Vec<Vec<[f32; 4]>>,
    normals: Option<Vec<[f32; 3]>>,
    binormals: Option<Vec<[f32; 3]>>,
    tangents: Option<Vec<[f32; 3]>>,
    uvs: Vec<Vec<[f32; 2]>>,
    influences: Vec<InfluenceList>,
}

impl Buffers {
    fn new(layout: &VertexLayout) -> Self {
        Self {
            positions: Vec::new(),
            colors: vec![Vec::new(); layout.colors],
            normals: layout.normals.then(Vec::new),
            binormals: layout.binormals.then(Vec::new),
            tangents: layout.tangents.then(Vec::new),
            uvs: vec![Vec::new(); layout.uv_names.len()],
            influences: Vec::new(),
        }
    }

    /// Appends one vertex, projecting only the layers in the layout. Every
    /// enabled layer gets a value, zero where the vertex lacks one, so all
    /// arrays stay as long as `positions`.
    fn push(&mut self, v: &Vertex, skinned: bool) {
        self.positions.push(to_array(&v.position));
        for (k, out) in self.colors.iter_mut().enumerate() {
            out.push(v.colors.get(k).copied().unwrap_or_default());
        }
        for (out, value) in [
            (&mut self.normals, &v.normal),
            (&mut self.binormals, &v.binormal),
            (&mut self.tangents, &v.tangent),
        ] {
            if let Some(out) = out {
                out.push(value.as_ref().map_or([0.0; 3], to_array));
            }
        }
        for (k, out) in self.uvs.iter_mut().enumerate() {
            out.push(v.uvs.get(k).copied().unwrap_or_default());
        }
        if skinned {
            self.influences.push(v.influences.clone());
        }
    }
}

/// Lays out the canonical vertices partition by partition.
///
/// Each partition receives its own contiguous vertex range holding exactly
/// the canonical vertices its polygons use, in order of first use. A vertex
/// shared by two partitions is therefore emitted once per partition. Index
/// values are absolute positions in the mesh's vertex buffer.
///
/// # Errors
/// Returns `BakeError::VertexCountTooLarge` or
/// `BakeError::IndexCountTooLarge` if a buffer outgrows 32 bit indexing
pub fn rearrange(
    name: &str,
    node: NodeId,
    canonical: &Canonical,
    corners: &[[u32; 3]],
    groups: &[PolygonGroup],
    layout: &VertexLayout,
    workspace: &mut Workspace,
) -> Result<BakedMesh, BakeError> {
    let mut buffers = Buffers::new(layout);
    let mut indices: Vec<u32> = Vec::with_capacity(corners.len() * 3);
    let mut partitions = Vec::with_capacity(groups.len());

    for group in groups {
        let vertex_map = &mut workspace.vertex_map;
        vertex_map.clear();
        let first_vertex =
            to_u32(buffers.positions.len(), BakeError::VertexCountTooLarge)?;
        let first_index =
            to_u32(indices.len(), BakeError::IndexCountTooLarge)?;

        for polygon in &group.polygons {
            let Some(c) = corners.get(*polygon) else {
                continue;
            };
            for canonical_index in c {
                let out = if let Some(out) = vertex_map.get(canonical_index) {
                    *out
                } else {
                    let out = to_u32(
                        buffers.positions.len(),
                        BakeError::VertexCountTooLarge,
                    )?;
                    let Some(v) =
                        canonical.vertices.get(*canonical_index as usize)
                    else {
                        return Err(BakeError::IndexTooLarge);
                    };
                    buffers.push(v, layout.skinned);
                    vertex_map.insert(*canonical_index, out);
                    out
                };
                indices.push(out);
            }
        }

        let vertex_count = to_u32(
            buffers.positions.len() - first_vertex as usize,
            BakeError::VertexCountTooLarge,
        )?;
        let index_count = to_u32(
            indices.len() - first_index as usize,
            BakeError::IndexCountTooLarge,
        )?;
        partitions.push(Partition {
            materials: group.materials.clone(),
            bones: group.bones.clone(),
            over_budget: group.over_budget,
            first_vertex,
            vertex_count,
            first_index,
            index_count,
        });
    }

    debug!(
        "{}: {} canonical vertices laid out as {} vertices, {} indices",
        name,
        canonical.vertices.len(),
        buffers.positions.len(),
        indices.len()
    );

    Ok(BakedMesh {
        name: name.to_string(),
        node,
        skinned: layout.skinned,
        positions: buffers.positions,
        colors: buffers.colors,
        normals: buffers.normals,
        binormals: buffers.binormals,
        tangents: buffers.tangents,
        uvs: layout
            .uv_names
            .iter()
            .cloned()
            .zip(buffers.uvs)
            .map(|(name, data)| BakedUvLayer { name, data })
            .collect(),
        influences: buffers.influences,
        indices,
        partitions,
        bones: Vec::new(),
    })
}
