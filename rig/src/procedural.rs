//! Gait, idle and jump pose synthesis.
//!
//! Every pose target is a pure function of a [`GaitSample`]; the animator only
//! advances the phase accumulators and pushes those targets through a
//! [`BoneOffsetApplier`].

use crate::humanoid::{CURLED_FINGERS, Humanoid, HumanoidBone};
use crate::locomotion::Kinematics;
use crate::offset::BoneOffsetApplier;
use crate::pose::BonePoses;
use crate::rest_pose::RestPoseCache;
use bevy::math::Vec3;
use std::f32::consts::{FRAC_PI_2, PI};

const SWING_FREQUENCY: f32 = 1.6;
const WALK_RATE: f32 = 4.0;
const WALK_STRIDE_RATE: f32 = 0.5;
const WALK_DECAY: f32 = 4.5;

const BLEND_MOVING: f32 = 0.35;
const BLEND_IDLE: f32 = 0.15;
const BACK_TO_REST: f32 = 0.2;

pub const FINGER_CURL: Vec3 = Vec3::new(-0.35, 0.0, 0.0);
pub const NECK_LEAN: Vec3 = Vec3::new(-0.08, 0.0, 0.0);
pub const HEAD_LEAN: Vec3 = Vec3::new(0.1, 0.0, 0.0);

const SPINE_CHAIN: [HumanoidBone; 4] = [
    HumanoidBone::Spine,
    HumanoidBone::Chest,
    HumanoidBone::UpperChest,
    HumanoidBone::Hips,
];
const NECK_CHAIN: [HumanoidBone; 2] = [HumanoidBone::Neck, HumanoidBone::Head];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotionState {
    Idle,
    Moving,
    Jumping,
}

impl MotionState {
    /// Airborne wins over moving.
    pub fn classify(moving: bool, grounded: bool) -> Self {
        if !grounded {
            MotionState::Jumping
        } else if moving {
            MotionState::Moving
        } else {
            MotionState::Idle
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MotionState::Idle => "idle",
            MotionState::Moving => "moving",
            MotionState::Jumping => "jumping",
        }
    }
}

/// Phase accumulators carried from frame to frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GaitPhase {
    walk_time: f32,
    idle_time: f32,
}

impl GaitPhase {
    pub fn walk_time(&self) -> f32 {
        self.walk_time
    }

    pub fn idle_time(&self) -> f32 {
        self.idle_time
    }

    /// Advance one frame and return the values the pose targets read.
    ///
    /// The swing phase is taken before `walk_time` advances, idle time after.
    pub fn advance(&mut self, dt: f32, kinematics: &Kinematics) -> GaitSample {
        let dt = dt.max(0.0);
        let state = MotionState::classify(kinematics.moving, kinematics.grounded);
        let stride = kinematics.stride.clamp(0.0, 1.0);
        let swing = self.walk_time * SWING_FREQUENCY;

        if state == MotionState::Idle {
            self.idle_time += dt;
        } else {
            self.idle_time = 0.0;
        }

        if kinematics.moving {
            self.walk_time += dt * (WALK_RATE + WALK_STRIDE_RATE * stride);
        } else {
            self.walk_time = (self.walk_time - dt * WALK_DECAY).max(0.0);
        }

        GaitSample {
            state,
            moving: kinematics.moving,
            stride,
            swing,
            idle_time: self.idle_time,
        }
    }
}

/// Per-frame inputs of the pose target functions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaitSample {
    pub state: MotionState,
    /// Planar speed above epsilon; may be set while airborne.
    pub moving: bool,
    pub stride: f32,
    /// Limb swing phase in radians.
    pub swing: f32,
    pub idle_time: f32,
}

impl GaitSample {
    pub const REST: Self = Self {
        state: MotionState::Idle,
        moving: false,
        stride: 0.0,
        swing: 0.0,
        idle_time: 0.0,
    };

    /// Blend rate for arms, torso and head.
    pub fn blend(&self) -> f32 {
        if self.moving { BLEND_MOVING } else { BLEND_IDLE }
    }

    pub fn finger_blend(&self) -> f32 {
        if self.state == MotionState::Idle {
            BLEND_MOVING
        } else {
            BACK_TO_REST
        }
    }

    fn gait_amplitude(&self) -> f32 {
        match self.state {
            MotionState::Moving => self.stride,
            MotionState::Idle | MotionState::Jumping => 0.0,
        }
    }
}

/// Offset for the node carrying the avatar under the player root.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MountPose {
    /// Pitch in radians.
    pub lean: f32,
    /// Vertical offset in meters.
    pub bob: f32,
}

impl MountPose {
    pub const REST: Self = Self { lean: 0.0, bob: 0.0 };
}

impl Default for MountPose {
    fn default() -> Self {
        Self::REST
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArmPose {
    pub upper_left: Vec3,
    pub upper_right: Vec3,
    pub forearm: Vec3,
    pub hand_left: Vec3,
    pub hand_right: Vec3,
}

pub fn arm_pose(gait: &GaitSample) -> ArmPose {
    let (down, raise, bend, swing) = match gait.state {
        MotionState::Jumping => (1.0, 0.3, 0.0, 0.0),
        MotionState::Moving => (0.95, 0.25, 0.9, gait.swing.sin() * gait.stride * 0.35 * 1.2),
        MotionState::Idle => (1.0, 0.0, 0.0, gait.swing.sin() * gait.stride * 0.35),
    };

    ArmPose {
        upper_left: Vec3::new(raise + swing * 0.6, 0.0, down),
        upper_right: Vec3::new(raise - swing * 0.6, 0.0, -down),
        forearm: Vec3::new(bend, 0.0, 0.0),
        hand_left: Vec3::new(0.1, 0.2, 0.0),
        hand_right: Vec3::new(0.1, -0.2, 0.0),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeetPose {
    pub left: Vec3,
    pub right: Vec3,
    /// Vertical lift of the left foot above rest, in meters.
    pub lift_left: f32,
    pub lift_right: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegPose {
    pub blend: f32,
    pub upper_left: Vec3,
    pub upper_right: Vec3,
    pub knee: Vec3,
    /// Feet keep their current pose while airborne.
    pub feet: Option<FeetPose>,
}

pub fn leg_pose(gait: &GaitSample) -> LegPose {
    if gait.state == MotionState::Jumping {
        return LegPose {
            blend: gait.blend(),
            upper_left: Vec3::new(-0.1, 0.0, 0.0),
            upper_right: Vec3::new(-0.3, 0.0, 0.0),
            knee: Vec3::new(-0.6, 0.0, 0.0),
            feet: None,
        };
    }

    let moving = gait.state == MotionState::Moving;
    let knee = if moving { -1.2 } else { -0.12 };
    let tilt = if moving { 0.03 } else { 0.0 };
    let spread = if moving { 0.1 } else { 0.08 };
    let amplitude = gait.gait_amplitude();
    let swing = (gait.swing + PI).sin() * 0.25 * amplitude;

    LegPose {
        blend: BACK_TO_REST,
        upper_left: Vec3::new(tilt + swing, spread, 0.0),
        upper_right: Vec3::new(tilt - swing, -spread, 0.0),
        knee: Vec3::new(knee, 0.0, 0.0),
        feet: Some(FeetPose {
            left: Vec3::new(0.05, 0.08, 0.0),
            right: Vec3::new(0.05, -0.08, 0.0),
            lift_left: (gait.swing + PI).sin().max(0.0) * 0.02 * amplitude,
            lift_right: gait.swing.sin().max(0.0) * 0.02 * amplitude,
        }),
    }
}

/// Torso lean with idle sway and breathing, or a phase-synced roll while moving.
pub fn spine_offset(gait: &GaitSample) -> Vec3 {
    let lean = match gait.state {
        MotionState::Jumping => -0.25,
        MotionState::Idle | MotionState::Moving => -0.18,
    };
    let (sway, breath) = match gait.state {
        MotionState::Idle => (
            (gait.idle_time * 1.6).sin() * 0.05,
            (gait.idle_time * 2.0).sin() * 0.03,
        ),
        MotionState::Moving | MotionState::Jumping => (0.0, 0.0),
    };
    let roll = gait.swing.sin() * 0.025 * gait.gait_amplitude();

    Vec3::new(lean + breath, sway, roll)
}

pub fn hips_offset(gait: &GaitSample) -> Vec3 {
    let pitch = match gait.state {
        MotionState::Jumping => 0.15,
        MotionState::Idle | MotionState::Moving => 0.12,
    };
    let amplitude = gait.gait_amplitude();
    let yaw = (gait.swing + FRAC_PI_2).sin() * 0.03 * amplitude;
    let roll = gait.swing.sin() * -0.03 * amplitude;

    Vec3::new(pitch, yaw, roll)
}

/// Vertical head offset in meters.
pub fn head_bob(gait: &GaitSample) -> f32 {
    (gait.swing * 2.0).sin() * 0.008 * gait.gait_amplitude()
}

pub fn mount_pose(gait: &GaitSample) -> MountPose {
    MountPose {
        lean: 0.0,
        bob: (gait.swing * 2.0).sin() * 0.02 * gait.gait_amplitude(),
    }
}

/// Drives the humanoid's joints while no authored motion is playing.
#[derive(Debug, Clone, Default)]
pub struct ProceduralAnimator {
    phase: GaitPhase,
    last: Option<GaitSample>,
}

impl ProceduralAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &GaitPhase {
        &self.phase
    }

    /// Sample used on the most recent frame.
    pub fn last_sample(&self) -> Option<&GaitSample> {
        self.last.as_ref()
    }

    /// Advance the gait and pose every resolvable joint for this frame.
    pub fn animate<H, P>(
        &mut self,
        dt: f32,
        kinematics: &Kinematics,
        humanoid: &H,
        rest: &mut RestPoseCache<H::Bone>,
        poses: &mut P,
    ) -> MountPose
    where
        H: Humanoid,
        P: BonePoses<H::Bone> + ?Sized,
    {
        let gait = self.phase.advance(dt, kinematics);
        self.last = Some(gait);

        let bone = |b: HumanoidBone| humanoid.resolve_bone(b);
        let mut applier = BoneOffsetApplier::new(rest, poses);
        let blend = gait.blend();

        let arms = arm_pose(&gait);
        applier.rotate(bone(HumanoidBone::LeftUpperArm), arms.upper_left, blend);
        applier.rotate(bone(HumanoidBone::RightUpperArm), arms.upper_right, blend);
        applier.rotate(bone(HumanoidBone::LeftLowerArm), arms.forearm, blend);
        applier.rotate(bone(HumanoidBone::RightLowerArm), arms.forearm, blend);
        applier.rotate(bone(HumanoidBone::LeftHand), arms.hand_left, blend);
        applier.rotate(bone(HumanoidBone::RightHand), arms.hand_right, blend);

        let legs = leg_pose(&gait);
        applier.rotate(bone(HumanoidBone::LeftUpperLeg), legs.upper_left, legs.blend);
        applier.rotate(bone(HumanoidBone::RightUpperLeg), legs.upper_right, legs.blend);
        applier.rotate(bone(HumanoidBone::LeftLowerLeg), legs.knee, legs.blend);
        applier.rotate(bone(HumanoidBone::RightLowerLeg), legs.knee, legs.blend);
        if let Some(feet) = legs.feet {
            let left = bone(HumanoidBone::LeftFoot);
            let right = bone(HumanoidBone::RightFoot);
            applier.rotate(left, feet.left, legs.blend);
            applier.rotate(right, feet.right, legs.blend);
            applier.translate(left, Vec3::new(0.0, feet.lift_left, 0.0), legs.blend);
            applier.translate(right, Vec3::new(0.0, feet.lift_right, 0.0), legs.blend);
        }

        applier.rotate(humanoid.resolve_first(&SPINE_CHAIN), spine_offset(&gait), blend);
        applier.rotate(bone(HumanoidBone::Hips), hips_offset(&gait), blend);

        let finger_blend = gait.finger_blend();
        for finger in CURLED_FINGERS {
            applier.rotate(bone(finger), FINGER_CURL, finger_blend);
        }

        applier.rotate(humanoid.resolve_first(&NECK_CHAIN), NECK_LEAN, blend);
        let head = bone(HumanoidBone::Head);
        applier.rotate(head, HEAD_LEAN, blend);
        applier.translate(head, Vec3::new(0.0, head_bob(&gait), 0.0), blend);

        mount_pose(&gait)
    }
}
