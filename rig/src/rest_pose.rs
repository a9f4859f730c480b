use crate::humanoid::{Humanoid, HumanoidBone};
use crate::pose::{BonePoses, LocalPose};
use std::collections::HashMap;
use std::hash::Hash;

/// Baseline transforms that additive offsets compose against.
///
/// An entry is captured the first time a bone is touched and never updated
/// afterwards. The cache is only valid for the skeleton instance it was
/// filled from; `reset` must run whenever that skeleton is replaced.
#[derive(Debug, Clone)]
pub struct RestPoseCache<B> {
    entries: HashMap<B, LocalPose>,
}

impl<B> Default for RestPoseCache<B> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<B: Copy + Eq + Hash> RestPoseCache<B> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rest entry for `bone`, snapshotting its current local pose on first use.
    ///
    /// Returns `None` only when `poses` has no such bone.
    pub fn capture<P: BonePoses<B> + ?Sized>(&mut self, bone: B, poses: &P) -> Option<LocalPose> {
        if let Some(entry) = self.entries.get(&bone) {
            return Some(*entry);
        }
        let snapshot = poses.local_pose(bone)?;
        self.entries.insert(bone, snapshot);
        Some(snapshot)
    }

    /// Snapshot every bone `humanoid` resolves that is not cached yet.
    ///
    /// Returns the number of bones cached afterwards.
    pub fn capture_rig<H, P>(&mut self, humanoid: &H, poses: &P) -> usize
    where
        H: Humanoid<Bone = B>,
        P: BonePoses<B> + ?Sized,
    {
        for &bone in HumanoidBone::ALL {
            if let Some(handle) = humanoid.resolve_bone(bone) {
                self.capture(handle, poses);
            }
        }
        self.entries.len()
    }

    pub fn get(&self, bone: B) -> Option<LocalPose> {
        self.entries.get(&bone).copied()
    }

    /// Drop every entry at once.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::humanoid::HumanoidRig;
    use bevy::math::{Quat, Vec3};

    fn skeleton() -> HashMap<u32, LocalPose> {
        HashMap::from([
            (1, LocalPose::new(Quat::from_rotation_x(0.3), Vec3::Y)),
            (2, LocalPose::IDENTITY),
        ])
    }

    #[test]
    fn capture_snapshots_once() {
        let mut poses = skeleton();
        let mut cache = RestPoseCache::new();

        let first = cache.capture(1, &poses).unwrap();
        poses.set_rotation(1, Quat::from_rotation_z(1.0));
        let second = cache.capture(1, &poses).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.rotation, Quat::from_rotation_x(0.3));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn capture_of_missing_bone_is_none() {
        let poses = skeleton();
        let mut cache = RestPoseCache::new();

        assert!(cache.capture(9, &poses).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn capture_rig_snapshots_every_resolved_bone() {
        let mut poses = skeleton();
        let rig = HumanoidRig::new()
            .with(HumanoidBone::Hips, 1, "Hips")
            .with(HumanoidBone::Spine, 2, "Spine")
            .with(HumanoidBone::Head, 7, "Head");
        let mut cache = RestPoseCache::new();

        assert_eq!(cache.capture_rig(&rig, &poses), 2);
        poses.set_rotation(1, Quat::from_rotation_z(1.0));
        assert_eq!(cache.capture_rig(&rig, &poses), 2);
        assert_eq!(cache.get(1).unwrap().rotation, Quat::from_rotation_x(0.3));
    }

    #[test]
    fn reset_drops_all_entries() {
        let mut poses = skeleton();
        let mut cache = RestPoseCache::new();
        cache.capture(1, &poses);
        cache.capture(2, &poses);

        cache.reset();
        assert!(cache.is_empty());

        poses.set_translation(1, Vec3::X);
        assert_eq!(cache.capture(1, &poses).unwrap().translation, Vec3::X);
    }
}
