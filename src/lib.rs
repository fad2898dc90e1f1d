//! Offline baking of scene geometry and animation into render ready form.
//!
//! Meshes are deduplicated into canonical vertices, split into partitions
//! that share one material signature and fit a bone palette budget, and laid
//! out so each partition owns a contiguous vertex and index range. Skin
//! weights are capped and normalized per control point. Animation curves
//! keyed per axis are merged into per channel tracks that can be sampled at
//! any time, locally or composed up the node hierarchy.
//!
//! Scene reading and writing are left to the caller: a `Scene` is built
//! from a reader's output and the `BakedScene` a `Converter` returns is
//! handed to a writer.

pub mod animation;
pub mod bake_error;
pub mod converter;
pub mod diagnostics;
pub mod mesh_bake;
pub mod options;
pub mod scene;
pub mod types;
pub mod workspace;

// Re-exports
pub use {
    bake_error::{BakeError, InputError},
    converter::{BakedScene, Converter},
    diagnostics::{Diagnostic, Diagnostics, Severity},
    options::{BakeOptions, LayerOptions},
    scene::Scene,
    types::NodeId,
    workspace::Workspace,
};
