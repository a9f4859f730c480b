use super::controller::PlayerController;
use super::types::{AvatarMount, PlayerRoot};
use bevy::ecs::query::QueryFilter;
use bevy::prelude::*;
use rig::{AnimationContext, BonePoses, HumanoidRig, LocalPose, MountPose};

/// Per-avatar animation state, attached to the player root once the avatar's
/// bones are resolved. Replaced wholesale when the avatar is swapped.
#[derive(Component, Debug)]
pub struct AvatarAnimation {
    pub context: AnimationContext<Entity>,
    pub rig: HumanoidRig<Entity>,
    pub mount: MountPose,
    /// Set once the configured motion has been tried against this rig.
    pub motion_resolved: bool,
}

impl AvatarAnimation {
    pub fn new(context: AnimationContext<Entity>, rig: HumanoidRig<Entity>) -> Self {
        Self {
            context,
            rig,
            mount: MountPose::REST,
            motion_resolved: false,
        }
    }
}

/// Bone transforms of the spawned avatar hierarchy addressed by entity.
pub struct BoneTransforms<'q, 'w, 's, F: QueryFilter + 'static> {
    query: &'q mut Query<'w, 's, &'static mut Transform, F>,
}

impl<'q, 'w, 's, F: QueryFilter + 'static> BoneTransforms<'q, 'w, 's, F> {
    pub fn new(query: &'q mut Query<'w, 's, &'static mut Transform, F>) -> Self {
        Self { query }
    }
}

impl<F: QueryFilter + 'static> BonePoses<Entity> for BoneTransforms<'_, '_, '_, F> {
    fn local_pose(&self, bone: Entity) -> Option<LocalPose> {
        self.query
            .get(bone)
            .ok()
            .map(|transform| LocalPose::new(transform.rotation, transform.translation))
    }

    fn set_rotation(&mut self, bone: Entity, rotation: Quat) {
        if let Ok(mut transform) = self.query.get_mut(bone) {
            transform.rotation = rotation;
        }
    }

    fn set_translation(&mut self, bone: Entity, translation: Vec3) {
        if let Ok(mut transform) = self.query.get_mut(bone) {
            transform.translation = translation;
        }
    }
}

type BoneFilter = (Without<PlayerRoot>, Without<AvatarMount>);

/// Run one animation frame for every player with a bound avatar.
pub fn drive_avatar_animation(
    mut players: Query<(&PlayerController, &mut AvatarAnimation), With<PlayerRoot>>,
    mut bones: Query<&'static mut Transform, BoneFilter>,
) {
    for (controller, mut animation) in &mut players {
        let animation = &mut *animation;
        let mut poses = BoneTransforms::new(&mut bones);
        animation.mount = animation.context.update(
            controller.frame_dt,
            &controller.kinematics,
            &animation.rig,
            &mut poses,
        );
    }
}

/// Write the mount lean and bob; mounts without a bound avatar sit at rest.
pub fn apply_mount_pose(
    players: Query<Option<&AvatarAnimation>, With<PlayerRoot>>,
    mut mounts: Query<(&mut Transform, &ChildOf), With<AvatarMount>>,
) {
    for (mut transform, child_of) in &mut mounts {
        let mount = players
            .get(child_of.parent())
            .ok()
            .flatten()
            .map_or(MountPose::REST, |animation| animation.mount);
        transform.translation = Vec3::new(0.0, mount.bob, 0.0);
        transform.rotation = Quat::from_rotation_x(mount.lean);
    }
}
