pub mod bake;
mod baked;
pub mod canonical;
pub mod partition;
pub mod rearrange;
pub mod skin;
mod types;

// Re-exports
pub use {
    bake::{bake_mesh, corner_bundle, vertex_layout, Corner},
    baked::{BakedMesh, BakedUvLayer, BoneBinding, Partition},
    canonical::{canonicalize, Canonical},
    partition::{partition, PolygonGroup},
    rearrange::rearrange,
    skin::normalize_skin,
    types::{
        canonical_bits, Cluster, Influence, InfluenceList, LayerElement,
        LinkMode, Mapping, MaterialKey, MaterialLayer, MeshInput,
        PolygonInput, Reference, SkinInput, UvLayer, Vertex, VertexLayout,
    },
};
