use crate::humanoid::Humanoid;
use crate::locomotion::Kinematics;
use crate::motion::{BoundClip, MotionPlayer};
use crate::pose::BonePoses;
use crate::procedural::{GaitSample, MotionState, MountPose, ProceduralAnimator};
use crate::rest_pose::RestPoseCache;
use std::hash::Hash;

pub const DEFAULT_MAX_FRAME_DT: f32 = 0.05;

/// Clamp a frame delta to `[0, max]` so stalls do not destabilize integration.
pub fn clamp_frame_dt(dt: f32, max: f32) -> f32 {
    if dt.is_nan() {
        return 0.0;
    }
    dt.clamp(0.0, max.max(0.0))
}

/// Animation state for exactly one avatar instance.
///
/// Build a new context whenever the skeleton is replaced; nothing in here is
/// valid for another skeleton.
#[derive(Debug, Clone)]
pub struct AnimationContext<B> {
    rest: RestPoseCache<B>,
    rest_captured: bool,
    animator: ProceduralAnimator,
    motion: MotionPlayer<B>,
}

impl<B: Copy + Eq + Hash> Default for AnimationContext<B> {
    fn default() -> Self {
        Self::new(MotionPlayer::new())
    }
}

impl<B: Copy + Eq + Hash> AnimationContext<B> {
    pub fn new(motion: MotionPlayer<B>) -> Self {
        Self {
            rest: RestPoseCache::new(),
            rest_captured: false,
            animator: ProceduralAnimator::new(),
            motion,
        }
    }

    pub fn rest(&self) -> &RestPoseCache<B> {
        &self.rest
    }

    pub fn animator(&self) -> &ProceduralAnimator {
        &self.animator
    }

    pub fn motion(&self) -> &MotionPlayer<B> {
        &self.motion
    }

    pub fn play(&mut self, clip: BoundClip<B>) {
        self.motion.play(clip);
    }

    pub fn stop(&mut self) {
        self.motion.stop();
    }

    /// State reported for the last procedural frame; `None` while a clip plays.
    pub fn motion_state(&self) -> Option<MotionState> {
        if self.motion.is_running() {
            return None;
        }
        self.animator.last_sample().map(|gait: &GaitSample| gait.state)
    }

    /// Pose the skeleton for one frame and return the mount offset.
    ///
    /// The first call snapshots the rest pose of every rig bone before any
    /// layer writes to the skeleton. A running clip suppresses the procedural
    /// layer and zeroes the mount.
    pub fn update<H, P>(&mut self, dt: f32, kinematics: &Kinematics, humanoid: &H, poses: &mut P) -> MountPose
    where
        H: Humanoid<Bone = B>,
        P: BonePoses<B> + ?Sized,
    {
        if !self.rest_captured {
            self.rest.capture_rig(humanoid, poses);
            self.rest_captured = true;
        }
        let mount = if self.motion.is_running() {
            MountPose::REST
        } else {
            self.animator
                .animate(dt, kinematics, humanoid, &mut self.rest, poses)
        };
        self.motion.advance(dt, poses);
        mount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::{Clip, Track};
    use crate::humanoid::{HumanoidBone, HumanoidRig};
    use crate::pose::LocalPose;
    use bevy::math::Quat;
    use std::collections::HashMap;

    fn avatar() -> (HumanoidRig<u8>, HashMap<u8, LocalPose>) {
        let rig = HumanoidRig::new()
            .with(HumanoidBone::Hips, 0, "Hips")
            .with(HumanoidBone::Spine, 1, "Spine")
            .with(HumanoidBone::LeftUpperArm, 2, "LeftArm");
        let poses = HashMap::from([
            (0, LocalPose::IDENTITY),
            (1, LocalPose::IDENTITY),
            (2, LocalPose::IDENTITY),
        ]);
        (rig, poses)
    }

    #[test]
    fn clamp_frame_dt_bounds() {
        assert_eq!(clamp_frame_dt(0.2, DEFAULT_MAX_FRAME_DT), 0.05);
        assert_eq!(clamp_frame_dt(-1.0, DEFAULT_MAX_FRAME_DT), 0.0);
        assert_eq!(clamp_frame_dt(0.016, DEFAULT_MAX_FRAME_DT), 0.016);
        assert_eq!(clamp_frame_dt(f32::NAN, DEFAULT_MAX_FRAME_DT), 0.0);
    }

    #[test]
    fn procedural_branch_fills_rest_cache() {
        let (rig, mut poses) = avatar();
        let mut context = AnimationContext::default();
        context.update(0.016, &Kinematics::AT_REST, &rig, &mut poses);

        assert_eq!(context.rest().len(), 3);
        assert_eq!(context.motion_state(), Some(MotionState::Idle));
    }

    #[test]
    fn running_clip_suppresses_procedural_layer() {
        let (rig, mut poses) = avatar();
        let mut context = AnimationContext::new(MotionPlayer::with_fades(0.0, 0.0));
        let track = Track::rotations("Spine.quaternion", vec![0.0], vec![Quat::from_rotation_z(0.4)]).unwrap();
        let clip = Clip::new("lean", 1.0, vec![track]);
        context.play(BoundClip::bind(&clip, |name| rig.handle_by_node_name(name)).unwrap());

        let moving = Kinematics {
            speed: 2.0,
            stride: 1.0,
            moving: true,
            ..Kinematics::AT_REST
        };
        let mount = context.update(0.016, &moving, &rig, &mut poses);

        assert_eq!(mount, MountPose::REST);
        assert_eq!(context.rest().get(1), Some(LocalPose::IDENTITY));
        assert_eq!(context.motion_state(), None);
        assert_eq!(poses[&2].rotation, Quat::IDENTITY);
        assert!(poses[&1].rotation.angle_between(Quat::from_rotation_z(0.4)) < 1e-5);
    }
}
