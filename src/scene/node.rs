use crate::{
    mesh_bake::{MeshInput, SkinInput},
    types::NodeId,
};
use nalgebra_glm as glm;
use serde::{Deserialize, Serialize};

/// Order in which Euler rotations are applied. `Xyz` rotates about X first,
/// then Y, then Z, so the combined rotation is `Rz * Ry * Rx`.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum RotationOrder {
    #[default]
    Xyz,
    Xzy,
    Yzx,
    Yxz,
    Zxy,
    Zyx,
}

/// Builds a quaternion from Euler angles in degrees
#[must_use]
pub fn euler_to_quat(degrees: &glm::Vec3, order: RotationOrder) -> glm::Quat {
    let x = glm::quat_angle_axis(
        degrees.x.to_radians(),
        &glm::vec3(1.0_f32, 0.0_f32, 0.0_f32),
    );
    let y = glm::quat_angle_axis(
        degrees.y.to_radians(),
        &glm::vec3(0.0_f32, 1.0_f32, 0.0_f32),
    );
    let z = glm::quat_angle_axis(
        degrees.z.to_radians(),
        &glm::vec3(0.0_f32, 0.0_f32, 1.0_f32),
    );
    // Quaternion products apply the right hand side first
    match order {
        RotationOrder::Xyz => z * y * x,
        RotationOrder::Xzy => y * z * x,
        RotationOrder::Yzx => x * z * y,
        RotationOrder::Yxz => z * x * y,
        RotationOrder::Zxy => y * x * z,
        RotationOrder::Zyx => x * y * z,
    }
}

/// Local bind pose of a node. Rotation is kept in the Euler form the
/// animation curves use so that a curve missing one axis can fall back to
/// the matching bind component.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BindTransform {
    pub translation: glm::Vec3,
    pub rotation: glm::Vec3, // Euler degrees
    pub rotation_order: RotationOrder,
    pub scale: glm::Vec3,
}

impl Default for BindTransform {
    fn default() -> Self {
        Self {
            translation: glm::Vec3::zeros(),
            rotation: glm::Vec3::zeros(),
            rotation_order: RotationOrder::Xyz,
            scale: glm::vec3(1.0_f32, 1.0_f32, 1.0_f32),
        }
    }
}

impl BindTransform {
    #[must_use]
    pub fn from_translation(translation: glm::Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn quat(&self) -> glm::Quat {
        euler_to_quat(&self.rotation, self.rotation_order)
    }

    /// Translation * rotation * scale
    #[must_use]
    pub fn matrix(&self) -> glm::Mat4 {
        trs_matrix(&self.translation, &self.quat(), &self.scale)
    }
}

#[must_use]
pub fn trs_matrix(
    translation: &glm::Vec3,
    rotation: &glm::Quat,
    scale: &glm::Vec3,
) -> glm::Mat4 {
    let m = glm::translate(&glm::Mat4::identity(), translation);
    let m = m * glm::quat_to_mat4(rotation);
    glm::scale(&m, scale)
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BoneNode {
    pub length: f32,
}

#[derive(Clone, Debug, Default)]
pub struct SkinnedMeshNode {
    pub mesh: MeshInput,
    pub skin: SkinInput,
}

/// What a node is. Data shared by every kind lives in `Node`.
#[derive(Clone, Debug, Default)]
pub enum NodeKind {
    #[default]
    Plain,
    Bone(BoneNode),
    Mesh(MeshInput),
    SkinnedMesh(SkinnedMeshNode),
}

#[derive(Clone, Debug)]
pub struct Node {
    pub name: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub bind: BindTransform,
    pub kind: NodeKind,
}

impl Node {
    /// Mesh data and skin data if this node carries geometry
    #[must_use]
    pub const fn mesh(&self) -> Option<(&MeshInput, Option<&SkinInput>)> {
        match &self.kind {
            NodeKind::Plain | NodeKind::Bone(_) => None,
            NodeKind::Mesh(mesh) => Some((mesh, None)),
            NodeKind::SkinnedMesh(s) => Some((&s.mesh, Some(&s.skin))),
        }
    }

    #[must_use]
    pub const fn is_bone(&self) -> bool {
        matches!(self.kind, NodeKind::Bone(_))
    }
}

#[cfg(test)]
mod tests {
    use super::{euler_to_quat, BindTransform, RotationOrder};
    use nalgebra_glm as glm;

    const EPSILON: f32 = 0.0001_f32;

    fn rotate(q: &glm::Quat, v: &glm::Vec3) -> glm::Vec3 {
        glm::quat_rotate_vec3(q, v)
    }

    #[test]
    fn single_axis() {
        let q = euler_to_quat(&glm::vec3(0.0, 0.0, 90.0), RotationOrder::Xyz);
        let r = rotate(&q, &glm::vec3(1.0, 0.0, 0.0));
        let c = glm::equal_eps(&r, &glm::vec3(0.0, 1.0, 0.0), EPSILON);
        assert!(c.x && c.y && c.z);
    }

    #[test]
    fn order_matters() {
        // X then Z versus Z then X give different results for the Y axis
        let e = glm::vec3(90.0_f32, 0.0_f32, 90.0_f32);
        let v = glm::vec3(0.0_f32, 1.0_f32, 0.0_f32);
        let xyz = rotate(&euler_to_quat(&e, RotationOrder::Xyz), &v);
        let zyx = rotate(&euler_to_quat(&e, RotationOrder::Zyx), &v);
        // Xyz: X takes +Y to +Z, Z leaves +Z alone
        let c = glm::equal_eps(&xyz, &glm::vec3(0.0, 0.0, 1.0), EPSILON);
        assert!(c.x && c.y && c.z);
        // Zyx: Z takes +Y to -X, X leaves -X alone
        let c = glm::equal_eps(&zyx, &glm::vec3(-1.0, 0.0, 0.0), EPSILON);
        assert!(c.x && c.y && c.z);
    }

    #[test]
    fn bind_matrix_applies_scale_first() {
        let bind = BindTransform {
            translation: glm::vec3(1.0, 2.0, 3.0),
            rotation: glm::vec3(0.0, 0.0, 90.0),
            scale: glm::vec3(2.0, 2.0, 2.0),
            ..Default::default()
        };
        let p = bind.matrix() * glm::vec4(1.0, 0.0, 0.0, 1.0);
        let c = glm::equal_eps(&p.xyz(), &glm::vec3(1.0, 4.0, 3.0), EPSILON);
        assert!(c.x && c.y && c.z);
    }
}
