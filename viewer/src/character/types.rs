use bevy::prelude::*;

/// Entity moved by the locomotion controller.
#[derive(Component)]
pub struct PlayerRoot;

/// Child of the player root carrying the mount lean and bob; the avatar
/// scene and the placeholder hang under it.
#[derive(Component)]
pub struct AvatarMount;

#[derive(Component)]
pub struct PlaceholderBody;

/// Marks the forward direction of the placeholder.
#[derive(Component)]
pub struct NoseMarker;
