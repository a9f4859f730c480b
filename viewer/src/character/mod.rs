pub mod animation;
pub mod controller;
pub mod movement;
pub mod types;

pub use animation::{AvatarAnimation, BoneTransforms, apply_mount_pose, drive_avatar_animation};
pub use controller::PlayerController;
pub use movement::{advance_player_locomotion, intent_from_keys, sample_move_intent};
pub use types::{AvatarMount, NoseMarker, PlaceholderBody, PlayerRoot};

use crate::settings::SettingsResource;
use bevy::prelude::*;

/// Systems that move the player and pose its avatar; the camera runs after.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct CharacterFrameSet;

const PLACEHOLDER_RADIUS: f32 = 0.3;
const PLACEHOLDER_LENGTH: f32 = 1.1;

pub struct CharacterPlugin;

impl Plugin for CharacterPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_player).add_systems(
            Update,
            (
                sample_move_intent,
                advance_player_locomotion,
                drive_avatar_animation,
                apply_mount_pose,
            )
                .chain()
                .in_set(CharacterFrameSet),
        );
    }
}

/// Spawn the player root, its avatar mount and the placeholder body shown
/// until an avatar is bound.
pub fn spawn_player(
    mut commands: Commands,
    settings: Res<SettingsResource>,
    mut meshes: Option<ResMut<Assets<Mesh>>>,
    mut materials: Option<ResMut<Assets<StandardMaterial>>>,
) {
    let player = commands
        .spawn((
            PlayerRoot,
            PlayerController::new(settings.current.locomotion),
            Name::new("Player"),
            Transform::default(),
            Visibility::default(),
        ))
        .id();

    let mount = commands
        .spawn((
            AvatarMount,
            Name::new("AvatarMount"),
            Transform::default(),
            Visibility::default(),
            ChildOf(player),
        ))
        .id();

    let (Some(meshes), Some(materials)) = (meshes.as_deref_mut(), materials.as_deref_mut()) else {
        return;
    };

    commands.spawn((
        PlaceholderBody,
        Name::new("PlaceholderBody"),
        Mesh3d(meshes.add(Capsule3d::new(PLACEHOLDER_RADIUS, PLACEHOLDER_LENGTH))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.42, 0.55, 0.85),
            perceptual_roughness: 0.8,
            ..default()
        })),
        Transform::from_xyz(0.0, PLACEHOLDER_RADIUS + PLACEHOLDER_LENGTH * 0.5, 0.0),
        ChildOf(mount),
    ));

    commands.spawn((
        NoseMarker,
        Name::new("NoseMarker"),
        Mesh3d(meshes.add(Sphere::new(0.08))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.9, 0.15, 0.15),
            ..default()
        })),
        Transform::from_xyz(0.0, 1.2, -0.35),
        ChildOf(mount),
    ));
}
