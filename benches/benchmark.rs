//! Recommend using with
//! `RUSTFLAGS="-C target-cpu=x86-64-v2" cargo bench`
//!
//! Covers the two inner loops of a conversion pass: merging equal vertex
//! bundles and merging axis curves into tracks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nalgebra_glm as glm;
use scenebake::{
    animation::{merge_channel, AxisCurve, ClampPolicy, CurveSample},
    mesh_bake::{canonicalize, Influence, Vertex},
    NodeId, Workspace,
};
use smallvec::smallvec;

const COUNT: usize = 100;
const MUL: f32 = 1.0_f32 / (COUNT as f32);

/// A grid of corners where every vertex is shared by six triangles, the
/// usual case for a closed mesh
fn use_these_bundles() -> Vec<Vertex> {
    let mut bundles = Vec::with_capacity(COUNT * COUNT * 6);
    for y in 0..COUNT {
        for x in 0..COUNT {
            for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 0), (1, 1), (0, 1)] {
                let px = (x + dx) as f32 * MUL;
                let py = (y + dy) as f32 * MUL;
                bundles.push(Vertex {
                    position: glm::vec3(px, py, 0.0_f32),
                    normal: Some(glm::vec3(0.0_f32, 0.0_f32, 1.0_f32)),
                    uvs: smallvec![[px, py]],
                    influences: smallvec![Influence {
                        bone: NodeId(((x + dx) % 8) as u32),
                        weight: 1.0_f32,
                    }],
                    ..Default::default()
                });
            }
        }
    }
    bundles
}

fn canonicalize_grid(c: &mut Criterion) {
    let bundles = black_box(use_these_bundles());
    let uv_names = vec!["map1".to_string()];
    let mut workspace = Workspace::new();
    c.bench_function(
        "canonicalize grid", //
        |b| {
            b.iter(|| {
                canonicalize(bundles.clone(), &uv_names, &mut workspace)
            })
        },
    );
}

fn use_these_axes() -> [Option<AxisCurve>; 3] {
    // Three axes sampled at different rates so the time union is larger
    // than any one axis
    let axis = |step: usize| {
        Some(AxisCurve::new(
            (0..COUNT)
                .step_by(step)
                .map(|i| {
                    let t = i as f32 * MUL;
                    CurveSample::linear(t, (t * 6.0_f32).sin())
                })
                .collect(),
        ))
    };
    [axis(1), axis(3), axis(7)]
}

fn merge_axes(c: &mut Criterion) {
    let axes = black_box(use_these_axes());
    let bind = glm::vec3(0.0_f32, 1.0_f32, 0.0_f32);
    let mut workspace = Workspace::new();
    c.bench_function(
        "merge channel", //
        |b| b.iter(|| merge_channel(&axes, &bind, &mut workspace)),
    );
}

fn sample_track(c: &mut Criterion) {
    let axes = use_these_axes();
    let mut workspace = Workspace::new();
    let track = black_box(merge_channel(
        &axes,
        &glm::Vec3::zeros(),
        &mut workspace,
    ));
    c.bench_function(
        "sample track", //
        |b| {
            b.iter(|| {
                for i in 0..=COUNT {
                    let _ = track.sample((i as f32) * MUL, ClampPolicy::Range);
                }
            })
        },
    );
}

criterion_group!(benches, canonicalize_grid, merge_axes, sample_track);
criterion_main!(benches);
