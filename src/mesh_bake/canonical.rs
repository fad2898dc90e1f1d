use super::types::{canonical_bits, Vertex};
use crate::{bake_error::BakeError, workspace::Workspace};
use ahash::HashMap;
use log::debug;
use smallvec::SmallVec;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1 accumulator. Order dependent: the same values written in a
/// different order give a different hash.
struct Fnv1(u64);

impl Fnv1 {
    const fn new() -> Self {
        Self(FNV_OFFSET_BASIS)
    }

    fn write_bytes(&mut self, bytes: &[u8]) {
        for b in bytes {
            self.0 = self.0.wrapping_mul(FNV_PRIME);
            self.0 ^= u64::from(*b);
        }
    }

    fn write_u32(&mut self, x: u32) {
        self.write_bytes(&x.to_le_bytes());
    }

    fn write_u64(&mut self, x: u64) {
        self.write_bytes(&x.to_le_bytes());
    }

    fn write_floats<'a, I: IntoIterator<Item = &'a f32>>(&mut self, it: I) {
        for x in it {
            self.write_u32(canonical_bits(*x));
        }
    }

    const fn finish(&self) -> u64 {
        self.0
    }
}

fn hash_name(name: &str) -> u64 {
    let mut h = Fnv1::new();
    h.write_bytes(name.as_bytes());
    h.finish()
}

/// Hashes every attribute of a vertex: position, influences, colors,
/// normal, binormal, tangent and then each UV layer's name and value.
/// `uv_name_hashes` are the precomputed hashes of the UV layer names.
fn hash_vertex(v: &Vertex, uv_name_hashes: &[u64]) -> u64 {
    let mut h = Fnv1::new();
    h.write_floats(v.position.iter());
    for i in &v.influences {
        h.write_u32(i.bone.0);
        h.write_u32(canonical_bits(i.weight));
    }
    for c in &v.colors {
        h.write_floats(c);
    }
    for layer in [&v.normal, &v.binormal, &v.tangent] {
        match layer {
            Some(n) => {
                h.write_bytes(&[1]);
                h.write_floats(n.iter());
            }
            None => h.write_bytes(&[0]),
        }
    }
    for (k, uv) in v.uvs.iter().enumerate() {
        if let Some(name) = uv_name_hashes.get(k) {
            h.write_u64(*name);
        }
        h.write_floats(uv);
    }
    h.finish()
}

/// Deduplicated vertices in first-seen order plus, for every input bundle,
/// the index of its canonical vertex
#[derive(Clone, Debug, Default)]
pub struct Canonical {
    pub vertices: Vec<Vertex>,
    pub remap: Vec<u32>,
}

/// Index of `bundle` among `vertices`, appending it if no equal vertex is
/// in the bucket for `hash`. Equal hashes alone never merge two bundles.
fn intern(
    bundle: Vertex,
    hash: u64,
    vertices: &mut Vec<Vertex>,
    table: &mut HashMap<u64, SmallVec<[u32; 1]>>,
) -> Result<u32, BakeError> {
    let bucket = table.entry(hash).or_default();
    if let Some(i) = bucket
        .iter()
        .copied()
        .find(|i| vertices.get(*i as usize) == Some(&bundle))
    {
        return Ok(i);
    }
    let i = u32::try_from(vertices.len())
        .map_err(|_| BakeError::VertexCountTooLarge)?;
    bucket.push(i);
    vertices.push(bundle);
    Ok(i)
}

/// Merges structurally equal vertex bundles. Hash buckets only narrow the
/// search: a bundle joins an existing vertex only after a full comparison,
/// so colliding hashes never merge different vertices.
///
/// # Errors
/// May return `BakeError::VertexCountTooLarge`
pub fn canonicalize(
    bundles: Vec<Vertex>,
    uv_names: &[String],
    workspace: &mut Workspace,
) -> Result<Canonical, BakeError> {
    workspace.vertex_table.clear();
    let uv_name_hashes: SmallVec<[u64; 2]> =
        uv_names.iter().map(|n| hash_name(n)).collect();

    let bundle_count = bundles.len();
    let mut vertices: Vec<Vertex> = Vec::new();
    let mut remap = Vec::with_capacity(bundle_count);
    for bundle in bundles {
        let hash = hash_vertex(&bundle, &uv_name_hashes);
        let index =
            intern(bundle, hash, &mut vertices, &mut workspace.vertex_table)?;
        remap.push(index);
    }

    debug!(
        "canonicalized {} bundles into {} vertices, {} hash buckets",
        bundle_count,
        vertices.len(),
        workspace.vertex_table.len()
    );
    Ok(Canonical { vertices, remap })
}
