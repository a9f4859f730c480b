use bevy::math::{Quat, Vec3};
use std::collections::HashMap;
use std::hash::Hash;

/// Local (parent-relative) rotation and translation of one bone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalPose {
    pub rotation: Quat,
    pub translation: Vec3,
}

impl LocalPose {
    pub const IDENTITY: Self = Self {
        rotation: Quat::IDENTITY,
        translation: Vec3::ZERO,
    };

    pub fn new(rotation: Quat, translation: Vec3) -> Self {
        Self {
            rotation,
            translation,
        }
    }
}

impl Default for LocalPose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Read/write access to the local transforms of a skeleton's bones.
///
/// The skeleton owns its bones; implementors only expose their local pose.
/// Reads of unknown handles return `None` and writes to them are ignored.
pub trait BonePoses<B> {
    fn local_pose(&self, bone: B) -> Option<LocalPose>;

    fn set_rotation(&mut self, bone: B, rotation: Quat);

    fn set_translation(&mut self, bone: B, translation: Vec3);

    fn rotation(&self, bone: B) -> Option<Quat> {
        self.local_pose(bone).map(|pose| pose.rotation)
    }

    fn translation(&self, bone: B) -> Option<Vec3> {
        self.local_pose(bone).map(|pose| pose.translation)
    }
}

impl<B: Copy + Eq + Hash> BonePoses<B> for HashMap<B, LocalPose> {
    fn local_pose(&self, bone: B) -> Option<LocalPose> {
        self.get(&bone).copied()
    }

    fn set_rotation(&mut self, bone: B, rotation: Quat) {
        if let Some(pose) = self.get_mut(&bone) {
            pose.rotation = rotation;
        }
    }

    fn set_translation(&mut self, bone: B, translation: Vec3) {
        if let Some(pose) = self.get_mut(&bone) {
            pose.translation = translation;
        }
    }
}
