use super::types::{
    AnimationClip, ClampPolicy, Interpolation, NodeAnimation, Track,
};
use crate::{
    scene::{trs_matrix, Scene},
    types::NodeId,
};
use nalgebra_glm as glm;

/// Helper to calculate the parameter used for interpolation
pub(crate) fn weight(start: f32, end: f32, current: f32) -> f32 {
    const EPSILON: f32 = 0.0005;
    ((current - start) / (end - start).max(EPSILON)).clamp(0.0f32, 1.0f32)
}

/// Values that can be blended between two keyframes
pub trait Interpolate: Copy {
    #[must_use]
    fn interpolate(&self, other: &Self, t: f32) -> Self;
}

impl Interpolate for glm::Vec3 {
    fn interpolate(&self, other: &Self, t: f32) -> Self {
        glm::lerp(self, other, t)
    }
}

impl Interpolate for glm::Quat {
    fn interpolate(&self, other: &Self, t: f32) -> Self {
        slerp(self, other, t)
    }
}

impl Interpolate for f32 {
    fn interpolate(&self, other: &Self, t: f32) -> Self {
        (other - self).mul_add(t, *self)
    }
}

/// Spherical interpolation along the shorter arc. Close rotations fall back
/// to a normalized linear blend. The result is always normalized.
#[must_use]
pub fn slerp(a: &glm::Quat, b: &glm::Quat, t: f32) -> glm::Quat {
    const NLERP_THRESHOLD: f32 = 0.9995;
    let mut b = *b;
    let mut dot = glm::quat_dot(a, &b);
    if dot < 0.0_f32 {
        b = -b;
        dot = -dot;
    }
    let q = if dot > NLERP_THRESHOLD {
        *a * (1.0_f32 - t) + b * t
    } else {
        let theta = dot.acos();
        let sin_theta = theta.sin();
        *a * (((1.0_f32 - t) * theta).sin() / sin_theta)
            + b * ((t * theta).sin() / sin_theta)
    };
    if glm::quat_length(&q) < f32::EPSILON {
        glm::Quat::identity()
    } else {
        glm::quat_normalize(&q)
    }
}

impl<T: Interpolate> Track<T> {
    /// Value at time `t`. Stepped keys hold their value until the next key
    /// and linear keys blend towards it.
    #[must_use]
    pub fn sample(&self, t: f32, policy: ClampPolicy) -> T {
        let keys = self.keys();
        let first = &keys[0];
        let last = &keys[keys.len() - 1];
        let t = match policy {
            ClampPolicy::Range => t.max(first.time).min(last.time),
            ClampPolicy::ToLast => t.min(last.time),
        };

        // Count of keys at or before t
        let after = keys.partition_point(|k| k.time <= t);
        if after == 0 {
            return first.value;
        }
        let left = &keys[after - 1];
        match (keys.get(after), left.interpolation) {
            (Some(right), Interpolation::Linear) => left
                .value
                .interpolate(&right.value, weight(left.time, right.time, t)),
            _ => left.value,
        }
    }
}

impl NodeAnimation {
    #[must_use]
    pub fn scale_at(&self, t: f32) -> glm::Vec3 {
        self.scale.sample(t, ClampPolicy::Range)
    }

    #[must_use]
    pub fn rotation_at(&self, t: f32) -> glm::Quat {
        self.rotation.sample(t, ClampPolicy::Range)
    }

    #[must_use]
    pub fn translation_at(&self, t: f32, policy: ClampPolicy) -> glm::Vec3 {
        self.translation.sample(t, policy)
    }

    /// Translation * rotation * scale at time `t`. `policy` applies to the
    /// translation; scale and rotation are always clamped to their range.
    #[must_use]
    pub fn local_matrix(&self, t: f32, policy: ClampPolicy) -> glm::Mat4 {
        trs_matrix(
            &self.translation_at(t, policy),
            &self.rotation_at(t),
            &self.scale_at(t),
        )
    }
}

impl AnimationClip {
    /// Transform of `node` relative to the top of its hierarchy at time `t`.
    /// Ancestors are composed root first. Nodes without tracks in this clip
    /// contribute their bind pose.
    #[must_use]
    pub fn world_matrix(
        &self,
        scene: &Scene,
        node: NodeId,
        t: f32,
        policy: ClampPolicy,
    ) -> glm::Mat4 {
        scene
            .ancestry(node)
            .iter()
            .fold(glm::Mat4::identity(), |m, id| {
                let local = self.node(*id).map_or_else(
                    || {
                        scene
                            .local_bind_matrix(*id)
                            .unwrap_or_else(glm::Mat4::identity)
                    },
                    |n| n.local_matrix(t, policy),
                );
                m * local
            })
    }
}

#[cfg(test)]
mod tests {
    use super::{slerp, weight};
    use crate::{
        animation::{
            AnimationClip, ClampPolicy, Interpolation, Keyframe, NodeAnimation,
            Track,
        },
        scene::{BindTransform, NodeKind, Scene},
        types::NodeId,
    };
    use nalgebra_glm as glm;

    const EPSILON: f32 = 0.0005_f32;

    fn approx_eq(a: f32, b: f32) {
        assert!((b - a).abs() < EPSILON, "{a} != {b}");
    }

    fn vec_eq(a: &glm::Vec3, b: &glm::Vec3) {
        let c = glm::equal_eps(a, b, EPSILON);
        assert!(c.x && c.y && c.z, "{a:?} != {b:?}");
    }

    fn key(
        time: f32,
        interpolation: Interpolation,
        x: f32,
    ) -> Keyframe<glm::Vec3> {
        Keyframe {
            time,
            interpolation,
            value: glm::vec3(x, 0.0, 0.0),
        }
    }

    #[test]
    fn weights() {
        approx_eq(weight(0.0, 10.0, 7.0), 0.7);
        approx_eq(weight(0.0, 10.0, 12.0), 1.0);
        approx_eq(weight(-2.0, 8.0, 3.0), 0.5);
        let x = weight(1.0, 1.0, 1.0);
        assert!((0.0..=1.0).contains(&x));
    }

    #[test]
    fn single_stepped_key_holds_everywhere() {
        let value = glm::vec3(1.0, -2.0, 3.5);
        let track = Track::constant(value);
        for t in [-100.0, -0.5, 0.0, 0.25, 7.0, 1.0e9] {
            for policy in [ClampPolicy::Range, ClampPolicy::ToLast] {
                assert_eq!(track.sample(t, policy), value);
            }
        }
    }

    #[test]
    fn step_and_linear_segments() {
        let track = Track::from_keys(vec![
            key(0.0, Interpolation::Step, 1.0),
            key(1.0, Interpolation::Linear, 2.0),
            key(3.0, Interpolation::Step, 6.0),
        ])
        .unwrap();
        let x = |t: f32| track.sample(t, ClampPolicy::Range).x;
        approx_eq(x(0.5), 1.0);
        approx_eq(x(1.0), 2.0);
        approx_eq(x(2.0), 4.0);
        approx_eq(x(3.0), 6.0);
        approx_eq(x(10.0), 6.0);
        approx_eq(x(-1.0), 1.0);
    }

    #[test]
    fn policies_differ_only_outside_range() {
        let track = Track::from_keys(vec![
            key(1.0, Interpolation::Linear, 1.0),
            key(2.0, Interpolation::Linear, 3.0),
        ])
        .unwrap();
        for t in [1.0, 1.25, 1.5, 2.0] {
            assert_eq!(
                track.sample(t, ClampPolicy::Range),
                track.sample(t, ClampPolicy::ToLast)
            );
        }
        approx_eq(track.sample(5.0, ClampPolicy::ToLast).x, 3.0);
        approx_eq(track.sample(0.0, ClampPolicy::ToLast).x, 1.0);
        approx_eq(track.sample(0.0, ClampPolicy::Range).x, 1.0);
    }

    #[test]
    fn slerp_takes_shortest_path() {
        let axis = glm::vec3(0.0, 0.0, 1.0);
        let a = glm::quat_angle_axis(0.0, &axis);
        // Same rotation as +90 degrees but on the other hemisphere
        let b = -glm::quat_angle_axis(std::f32::consts::FRAC_PI_2, &axis);
        let mid = slerp(&a, &b, 0.5);
        approx_eq(glm::quat_length(&mid), 1.0);
        let v = glm::quat_rotate_vec3(&mid, &glm::vec3(1.0, 0.0, 0.0));
        let s = std::f32::consts::FRAC_1_SQRT_2;
        vec_eq(&v, &glm::vec3(s, s, 0.0));
    }

    #[test]
    fn slerp_of_identical_is_normalized() {
        let q = glm::quat_angle_axis(0.3, &glm::vec3(0.0, 1.0, 0.0));
        let r = slerp(&q, &q, 0.7);
        approx_eq(glm::quat_length(&r), 1.0);
        approx_eq(glm::quat_dot(&q, &r), 1.0);
    }

    #[test]
    fn world_matrix_composes_root_first() {
        let mut scene = Scene::new();
        let root = scene
            .add_root(
                "root",
                BindTransform::from_translation(glm::vec3(0.0, 5.0, 0.0)),
                NodeKind::Plain,
            )
            .unwrap();
        let child = scene
            .add_node(
                Some(root),
                "child",
                BindTransform::default(),
                NodeKind::Plain,
            )
            .unwrap();
        let animation = NodeAnimation {
            node: child,
            translation: Track::from_keys(vec![
                key(0.0, Interpolation::Linear, 0.0),
                key(1.0, Interpolation::Linear, 10.0),
            ])
            .unwrap(),
            rotation: Track::constant(glm::Quat::identity()),
            scale: Track::constant(glm::vec3(1.0, 1.0, 1.0)),
        };
        let clip = AnimationClip::new("move", vec![animation]);

        let m = clip.world_matrix(&scene, child, 0.5, ClampPolicy::Range);
        let p = m * glm::vec4(0.0, 0.0, 0.0, 1.0);
        vec_eq(&p.xyz(), &glm::vec3(5.0, 5.0, 0.0));

        let m = clip.world_matrix(&scene, child, 4.0, ClampPolicy::ToLast);
        let p = m * glm::vec4(0.0, 0.0, 0.0, 1.0);
        vec_eq(&p.xyz(), &glm::vec3(10.0, 5.0, 0.0));

        // The root has no tracks so its bind pose is used
        let m = clip.world_matrix(&scene, root, 0.5, ClampPolicy::Range);
        let p = m * glm::vec4(0.0, 0.0, 0.0, 1.0);
        vec_eq(&p.xyz(), &glm::vec3(0.0, 5.0, 0.0));
        assert_eq!(
            clip.world_matrix(&scene, NodeId(9), 0.0, ClampPolicy::Range),
            glm::Mat4::identity()
        );
    }
}
