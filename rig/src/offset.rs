use crate::pose::BonePoses;
use crate::rest_pose::RestPoseCache;
use bevy::math::{EulerRot, Quat, Vec3};
use std::hash::Hash;

/// Rotation for an XYZ Euler offset given in radians.
pub fn euler_xyz(offset: Vec3) -> Quat {
    Quat::from_euler(EulerRot::XYZ, offset.x, offset.y, offset.z)
}

/// Applies additive offsets relative to the cached rest pose.
///
/// Each call moves the bone a `blend` fraction of the way toward
/// `rest ∘ offset`, so targets that change discretely still ease in over
/// several frames. Interpolation state lives in the bone transform itself.
pub struct BoneOffsetApplier<'a, B, P: ?Sized> {
    rest: &'a mut RestPoseCache<B>,
    poses: &'a mut P,
}

impl<'a, B, P> BoneOffsetApplier<'a, B, P>
where
    B: Copy + Eq + Hash,
    P: BonePoses<B> + ?Sized,
{
    pub fn new(rest: &'a mut RestPoseCache<B>, poses: &'a mut P) -> Self {
        Self { rest, poses }
    }

    /// Ease `bone` toward its rest rotation composed with `euler_offset`
    /// (bone-local, XYZ order). Absent bones are skipped.
    pub fn rotate(&mut self, bone: Option<B>, euler_offset: Vec3, blend: f32) {
        let Some(bone) = bone else {
            return;
        };
        let Some(rest) = self.rest.capture(bone, &*self.poses) else {
            return;
        };
        let Some(current) = self.poses.rotation(bone) else {
            return;
        };

        let target = rest.rotation * euler_xyz(euler_offset);
        let next = current.slerp(target, blend.clamp(0.0, 1.0));
        self.poses.set_rotation(bone, next);
    }

    /// Ease `bone` toward its rest translation plus `offset`.
    pub fn translate(&mut self, bone: Option<B>, offset: Vec3, blend: f32) {
        let Some(bone) = bone else {
            return;
        };
        let Some(rest) = self.rest.capture(bone, &*self.poses) else {
            return;
        };
        let Some(current) = self.poses.translation(bone) else {
            return;
        };

        let target = rest.translation + offset;
        let next = current.lerp(target, blend.clamp(0.0, 1.0));
        self.poses.set_translation(bone, next);
    }

    pub fn poses(&self) -> &P {
        &*self.poses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::LocalPose;
    use std::collections::HashMap;

    const EPS: f32 = 1e-5;

    fn skeleton() -> HashMap<u8, LocalPose> {
        HashMap::from([(
            0,
            LocalPose::new(Quat::from_rotation_y(0.4), Vec3::new(0.0, 0.9, 0.0)),
        )])
    }

    #[test]
    fn zero_offset_keeps_rest_rotation() {
        let mut poses = skeleton();
        let mut rest = RestPoseCache::new();
        let before = poses.rotation(0).unwrap();

        let mut applier = BoneOffsetApplier::new(&mut rest, &mut poses);
        applier.rotate(Some(0), Vec3::ZERO, 0.35);

        assert!(poses.rotation(0).unwrap().angle_between(before) < EPS);
    }

    #[test]
    fn full_blend_reaches_target_and_is_stable() {
        let mut poses = skeleton();
        let mut rest = RestPoseCache::new();
        let offset = Vec3::new(0.5, 0.0, -0.2);
        let target = Quat::from_rotation_y(0.4) * euler_xyz(offset);

        let mut applier = BoneOffsetApplier::new(&mut rest, &mut poses);
        applier.rotate(Some(0), offset, 1.0);
        applier.rotate(Some(0), offset, 1.0);

        assert!(poses.rotation(0).unwrap().angle_between(target) < 1e-4);
    }

    #[test]
    fn partial_blend_eases_toward_target() {
        let mut poses = skeleton();
        let mut rest = RestPoseCache::new();
        let offset = Vec3::new(1.0, 0.0, 0.0);
        let target = Quat::from_rotation_y(0.4) * euler_xyz(offset);

        let mut applier = BoneOffsetApplier::new(&mut rest, &mut poses);
        applier.rotate(Some(0), offset, 0.2);
        let first = applier.poses().rotation(0).unwrap().angle_between(target);
        applier.rotate(Some(0), offset, 0.2);
        let second = applier.poses().rotation(0).unwrap().angle_between(target);

        assert!(first > 0.0);
        assert!(second < first);
    }

    #[test]
    fn offsets_compose_against_rest_not_current() {
        let mut poses = skeleton();
        let mut rest = RestPoseCache::new();

        let mut applier = BoneOffsetApplier::new(&mut rest, &mut poses);
        applier.translate(Some(0), Vec3::new(0.0, 0.1, 0.0), 1.0);
        applier.translate(Some(0), Vec3::new(0.0, 0.1, 0.0), 1.0);

        let translation = poses.translation(0).unwrap();
        assert!((translation.y - 1.0).abs() < EPS);
    }

    #[test]
    fn missing_bones_are_ignored() {
        let mut poses = skeleton();
        let mut rest = RestPoseCache::new();

        let mut applier = BoneOffsetApplier::new(&mut rest, &mut poses);
        applier.rotate(None, Vec3::X, 1.0);
        applier.rotate(Some(7), Vec3::X, 1.0);
        applier.translate(Some(7), Vec3::X, 1.0);

        assert_eq!(rest.len(), 0);
        assert_eq!(poses.len(), 1);
    }
}
