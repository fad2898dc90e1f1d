use super::types::{InfluenceList, MaterialKey};
use crate::{
    bake_error::{BakeError, InputError},
    scene::NodeRemap,
    types::NodeId,
};
use nalgebra_glm as glm;
use std::ops::Range;

/// Properties of one partition (mesh attribute group)
///
/// The vertex and index ranges are absolute positions in the owning
/// `BakedMesh` buffers. Indices are absolute too, so an index inside a
/// partition always lies inside that partition's vertex range.
///
/// `bones` is the bone combination for the partition in order of first
/// use. A skinning shader can upload exactly these bones as its palette and
/// find a vertex's slot with `palette_index`. `over_budget` is set when a
/// single polygon needed more bones than the configured maximum.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Partition {
    pub materials: MaterialKey,
    pub bones: Vec<NodeId>,
    pub over_budget: bool,
    pub first_vertex: u32,
    pub vertex_count: u32,
    pub first_index: u32,
    pub index_count: u32,
}

impl Partition {
    #[must_use]
    pub const fn vertex_range(&self) -> Range<usize> {
        self.first_vertex as usize
            ..(self.first_vertex + self.vertex_count) as usize
    }

    #[must_use]
    pub const fn index_range(&self) -> Range<usize> {
        self.first_index as usize
            ..(self.first_index + self.index_count) as usize
    }

    #[must_use]
    pub fn palette_index(&self, bone: NodeId) -> Option<usize> {
        self.bones.iter().position(|b| *b == bone)
    }
}

/// A bone used anywhere in a mesh with its bind offset, the transform from
/// mesh space into the bone's space in the bind pose
#[derive(Clone, Debug, PartialEq)]
pub struct BoneBinding {
    pub node: NodeId,
    pub offset: glm::Mat4,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BakedUvLayer {
    pub name: String,
    pub data: Vec<[f32; 2]>,
}

/// Render ready mesh. All per-vertex arrays have the same length as
/// `positions`. Layers that were disabled or absent in the input are `None`
/// or empty. `influences` is empty for a mesh without skin.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BakedMesh {
    pub name: String,
    pub node: NodeId,
    pub skinned: bool,
    pub positions: Vec<[f32; 3]>,
    pub colors: Vec<Vec<[f32; 4]>>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub binormals: Option<Vec<[f32; 3]>>,
    pub tangents: Option<Vec<[f32; 3]>>,
    pub uvs: Vec<BakedUvLayer>,
    pub influences: Vec<InfluenceList>,
    pub indices: Vec<u32>,
    pub partitions: Vec<Partition>,
    pub bones: Vec<BoneBinding>,
}

impl BakedMesh {
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub const fn is_skinned(&self) -> bool {
        self.skinned
    }

    /// Raw bytes of the position buffer for a scene writer
    #[must_use]
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Raw bytes of the index buffer for a scene writer
    #[must_use]
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Checks that every node handle this mesh holds has a counterpart in
    /// `remap`, without changing anything
    ///
    /// # Errors
    /// Returns `InputError::UnmappedNode` for the first handle that did not
    /// survive
    pub fn check_rebind(&self, remap: &NodeRemap) -> Result<(), BakeError> {
        let map = |id: NodeId| {
            remap.get(id).ok_or(InputError::UnmappedNode(id.0))
        };
        map(self.node)?;
        for b in &self.bones {
            map(b.node)?;
        }
        for p in &self.partitions {
            for b in &p.bones {
                map(*b)?;
            }
        }
        for list in &self.influences {
            for i in list {
                map(i.bone)?;
            }
        }
        Ok(())
    }

    /// Rebinds every node handle through `remap`, for use after the scene
    /// this mesh was baked from has been compacted or copied.
    ///
    /// # Errors
    /// Returns `InputError::UnmappedNode` if a referenced node did not
    /// survive. The mesh is left unchanged in that case.
    pub fn rebind(&mut self, remap: &NodeRemap) -> Result<(), BakeError> {
        self.check_rebind(remap)?;
        let map = |id: NodeId| {
            remap.get(id).ok_or(InputError::UnmappedNode(id.0))
        };
        self.node = map(self.node)?;
        for b in &mut self.bones {
            b.node = map(b.node)?;
        }
        for p in &mut self.partitions {
            for b in &mut p.bones {
                *b = map(*b)?;
            }
        }
        for list in &mut self.influences {
            for i in list {
                i.bone = map(i.bone)?;
            }
        }
        Ok(())
    }
}
