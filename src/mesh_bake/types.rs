use crate::types::NodeId;
use nalgebra_glm as glm;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Which element of a layer applies to a polygon corner
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mapping {
    ByControlPoint,
    #[default]
    ByPolygonVertex,
    ByPolygon,
    AllSame,
}

/// Whether the mapped slot addresses `direct` itself or goes through `index`
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reference {
    #[default]
    Direct,
    IndexToDirect,
}

/// One per-vertex attribute layer as a scene reader delivers it
#[derive(Clone, Debug, Default)]
pub struct LayerElement<T> {
    pub mapping: Mapping,
    pub reference: Reference,
    pub direct: Vec<T>,
    pub index: Vec<u32>,
}

impl<T: Copy> LayerElement<T> {
    /// Layer addressed per polygon corner with no indirection
    #[must_use]
    pub fn by_polygon_vertex(direct: Vec<T>) -> Self {
        Self {
            mapping: Mapping::ByPolygonVertex,
            reference: Reference::Direct,
            direct,
            index: Vec::new(),
        }
    }

    /// Layer addressed per control point with no indirection
    #[must_use]
    pub fn by_control_point(direct: Vec<T>) -> Self {
        Self {
            mapping: Mapping::ByControlPoint,
            reference: Reference::Direct,
            direct,
            index: Vec::new(),
        }
    }

    /// Value for a corner. `polygon_vertex` is the running corner number
    /// across the whole mesh. Returns `None` if the layer is too short.
    #[must_use]
    pub fn get(
        &self,
        control_point: usize,
        polygon: usize,
        polygon_vertex: usize,
    ) -> Option<T> {
        let slot = match self.mapping {
            Mapping::ByControlPoint => control_point,
            Mapping::ByPolygonVertex => polygon_vertex,
            Mapping::ByPolygon => polygon,
            Mapping::AllSame => 0,
        };
        let direct_index = match self.reference {
            Reference::Direct => slot,
            Reference::IndexToDirect => *self.index.get(slot)? as usize,
        };
        self.direct.get(direct_index).copied()
    }
}

#[derive(Clone, Debug, Default)]
pub struct UvLayer {
    pub name: String,
    pub element: LayerElement<[f32; 2]>,
}

/// Material assignment for one material layer
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MaterialLayer {
    AllSame(u32),
    ByPolygon(Vec<u32>),
}

impl MaterialLayer {
    #[must_use]
    pub fn get(&self, polygon: usize) -> Option<u32> {
        match self {
            Self::AllSame(m) => Some(*m),
            Self::ByPolygon(v) => v.get(polygon).copied(),
        }
    }
}

/// Polygon as control point indices. Only three corners are accepted but
/// the input may hold more so that the mistake can be reported.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PolygonInput {
    pub corners: SmallVec<[u32; 4]>,
}

impl PolygonInput {
    #[must_use]
    pub fn triangle(a: u32, b: u32, c: u32) -> Self {
        Self {
            corners: SmallVec::from_slice(&[a, b, c]),
        }
    }
}

/// Mesh data delivered by a scene reader
#[derive(Clone, Debug, Default)]
pub struct MeshInput {
    pub control_points: Vec<glm::Vec3>,
    pub polygons: Vec<PolygonInput>,
    pub colors: Vec<LayerElement<[f32; 4]>>,
    pub normals: Option<LayerElement<[f32; 3]>>,
    pub binormals: Option<LayerElement<[f32; 3]>>,
    pub tangents: Option<LayerElement<[f32; 3]>>,
    pub uvs: Vec<UvLayer>,
    pub materials: Vec<MaterialLayer>,
}

/// How a cluster's weights are meant to be combined
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkMode {
    #[default]
    Normalize,
    Additive,
    TotalOne,
}

/// Region of control points influenced by one bone
#[derive(Clone, Debug, Default)]
pub struct Cluster {
    pub bone: Option<NodeId>,
    pub link_mode: LinkMode,
    pub indices: Vec<u32>,
    pub weights: Vec<f32>,
}

#[derive(Clone, Debug, Default)]
pub struct SkinInput {
    pub clusters: Vec<Cluster>,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Influence {
    pub bone: NodeId,
    pub weight: f32,
}

pub type InfluenceList = SmallVec<[Influence; 4]>;

/// Ordered material indices of a polygon, one per material layer
pub type MaterialKey = SmallVec<[u32; 2]>;

/// Which layers a mesh's vertices carry. Decided once per mesh from the
/// input and the enabled layers, so every vertex of a mesh has the same
/// shape.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct VertexLayout {
    pub colors: usize,
    pub normals: bool,
    pub binormals: bool,
    pub tangents: bool,
    pub uv_names: Vec<String>,
    pub skinned: bool,
}

/// Full attribute bundle of one polygon corner. Two vertices are the same
/// vertex only if every field matches bit for bit, except that positive and
/// negative zero are treated as equal.
#[derive(Clone, Debug, Default)]
pub struct Vertex {
    pub position: glm::Vec3,
    pub colors: SmallVec<[[f32; 4]; 1]>,
    pub normal: Option<glm::Vec3>,
    pub binormal: Option<glm::Vec3>,
    pub tangent: Option<glm::Vec3>,
    pub uvs: SmallVec<[[f32; 2]; 2]>,
    pub influences: InfluenceList,
}

/// Float bits with negative zero folded into positive zero
#[must_use]
pub fn canonical_bits(x: f32) -> u32 {
    if x == 0.0_f32 {
        0
    } else {
        x.to_bits()
    }
}

fn same_floats<'a, I>(a: I, b: I) -> bool
where
    I: IntoIterator<Item = &'a f32>,
{
    let mut a = a.into_iter();
    let mut b = b.into_iter();
    loop {
        match (a.next(), b.next()) {
            (None, None) => return true,
            (Some(x), Some(y)) if canonical_bits(*x) == canonical_bits(*y) => {}
            _ => return false,
        }
    }
}

fn same_opt_vec3(a: Option<&glm::Vec3>, b: Option<&glm::Vec3>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(x), Some(y)) => same_floats(x.iter(), y.iter()),
        _ => false,
    }
}

impl PartialEq for Vertex {
    fn eq(&self, other: &Self) -> bool {
        same_floats(self.position.iter(), other.position.iter())
            && self.influences.len() == other.influences.len()
            && self.influences.iter().zip(&other.influences).all(|(a, b)| {
                a.bone == b.bone
                    && canonical_bits(a.weight) == canonical_bits(b.weight)
            })
            && self.colors.len() == other.colors.len()
            && self
                .colors
                .iter()
                .zip(&other.colors)
                .all(|(a, b)| same_floats(a, b))
            && same_opt_vec3(self.normal.as_ref(), other.normal.as_ref())
            && same_opt_vec3(self.binormal.as_ref(), other.binormal.as_ref())
            && same_opt_vec3(self.tangent.as_ref(), other.tangent.as_ref())
            && self.uvs.len() == other.uvs.len()
            && self
                .uvs
                .iter()
                .zip(&other.uvs)
                .all(|(a, b)| same_floats(a, b))
    }
}

impl Eq for Vertex {}
