use crate::{
    animation::{merge_clip, AnimationClip, ClipInput},
    bake_error::{BakeError, InputError},
    diagnostics::{Diagnostic, Diagnostics},
    mesh_bake::{bake_mesh, BakedMesh},
    options::BakeOptions,
    scene::{NodeRemap, Scene},
    types::NodeId,
    workspace::Workspace,
};
use log::info;

/// Everything a conversion pass produced for one scene
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BakedScene {
    pub meshes: Vec<BakedMesh>,
    pub clips: Vec<AnimationClip>,
}

impl BakedScene {
    /// Rebinds all node handles through `remap`, for use after the source
    /// scene has been compacted. Clip tracks for nodes that did not survive
    /// are dropped.
    ///
    /// # Errors
    /// Returns `InputError::UnmappedNode` if a mesh refers to a node that
    /// did not survive. Nothing is changed in that case.
    pub fn rebind(&mut self, remap: &NodeRemap) -> Result<(), BakeError> {
        for mesh in &self.meshes {
            mesh.check_rebind(remap)?;
        }
        for mesh in &mut self.meshes {
            mesh.rebind(remap)?;
        }
        for clip in &mut self.clips {
            clip.retarget(|id| remap.get(id));
        }
        Ok(())
    }
}

/// Runs conversion passes with one set of options. Scratch buffers are kept
/// between passes and messages queue up until drained.
///
/// Errors are returned to the caller and also recorded in the diagnostics
/// queue so that a caller collecting messages sees them in order with the
/// warnings.
#[derive(Debug)]
pub struct Converter {
    options: BakeOptions,
    workspace: Workspace,
    diagnostics: Diagnostics,
}

impl Converter {
    /// # Errors
    /// Returns `BakeError::InvalidOptions` if the options are inconsistent
    pub fn new(options: BakeOptions) -> Result<Self, BakeError> {
        options.validate()?;
        Ok(Self {
            options,
            workspace: Workspace::new(),
            diagnostics: Diagnostics::new(),
        })
    }

    #[must_use]
    pub const fn options(&self) -> &BakeOptions {
        &self.options
    }

    #[must_use]
    pub const fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Removes and returns all queued messages, oldest first
    pub fn drain_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.diagnostics.drain()
    }

    fn record<T>(
        &mut self,
        result: Result<T, BakeError>,
    ) -> Result<T, BakeError> {
        if let Err(e) = &result {
            self.diagnostics.error(e.to_string());
        }
        result
    }

    /// Bakes the mesh carried by one node
    ///
    /// # Errors
    /// May return `BakeError`
    pub fn bake_mesh(
        &mut self,
        scene: &Scene,
        node: NodeId,
    ) -> Result<BakedMesh, BakeError> {
        self.workspace.clear();
        let result = bake_mesh(
            scene,
            node,
            &self.options,
            &mut self.workspace,
            &mut self.diagnostics,
        );
        self.record(result)
    }

    /// Merges the curves of one clip into tracks
    ///
    /// # Errors
    /// May return `BakeError`
    pub fn bake_animation(
        &mut self,
        scene: &Scene,
        clip: &ClipInput,
    ) -> Result<AnimationClip, BakeError> {
        self.workspace.clear();
        let result = merge_clip(
            clip,
            scene,
            &mut self.workspace,
            &mut self.diagnostics,
        );
        self.record(result)
    }

    /// Converts a whole scene. Every mesh reachable from the root is baked
    /// in traversal order, then every clip is merged if animation is
    /// enabled. Nodes that cannot be reached from the root are reported as
    /// warnings and skipped. The first error ends the pass.
    ///
    /// # Errors
    /// May return `BakeError`
    pub fn convert(&mut self, scene: &Scene) -> Result<BakedScene, BakeError> {
        if scene.root().is_none() && !scene.is_empty() {
            return self.record(Err(InputError::NoRootNode.into()));
        }

        let unreachable = scene.unreachable();
        for id in &unreachable {
            self.diagnostics.warn(format!(
                "node {} is not reachable from the root and is skipped",
                scene.name(*id)
            ));
        }

        let mut baked = BakedScene::default();
        for id in scene.traverse() {
            let is_mesh = scene.node(id).is_some_and(|n| n.mesh().is_some());
            if is_mesh {
                baked.meshes.push(self.bake_mesh(scene, id)?);
            }
        }
        if self.options.animation {
            for clip in &scene.clips {
                baked.clips.push(self.bake_animation(scene, clip)?);
            }
        }

        info!(
            "Converted scene: {} meshes, {} clips, {} unreachable nodes",
            baked.meshes.len(),
            baked.clips.len(),
            unreachable.len()
        );
        Ok(baked)
    }
}
