//! Renderer-independent humanoid animation: rest-pose bookkeeping, additive
//! bone offsets, locomotion, procedural gait and clip retargeting.
//!
//! Bones are opaque handles (`B: Copy + Eq + Hash`); the host application
//! supplies lookup through [`Humanoid`] and transform access through
//! [`BonePoses`].

pub mod clip;
pub mod context;
pub mod humanoid;
pub mod locomotion;
pub mod motion;
pub mod offset;
pub mod pose;
pub mod procedural;
pub mod rest_pose;
pub mod retarget;

pub use clip::{Clip, ClipError, Keyframes, Track};
pub use context::{AnimationContext, DEFAULT_MAX_FRAME_DT, clamp_frame_dt};
pub use humanoid::{Humanoid, HumanoidBone, HumanoidRig};
pub use locomotion::{Kinematics, LocomotionController, LocomotionState, LocomotionTuning, MoveIntent};
pub use motion::{BoundClip, MotionPlayer};
pub use offset::{BoneOffsetApplier, euler_xyz};
pub use pose::{BonePoses, LocalPose};
pub use procedural::{GaitPhase, GaitSample, MotionState, MountPose, ProceduralAnimator};
pub use rest_pose::RestPoseCache;
pub use retarget::{ClipRetargeter, RetargetMap, RetargetProfile, RetargetReport, sanitize_node_name};
