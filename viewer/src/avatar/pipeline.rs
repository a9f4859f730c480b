use super::vrm::VrmHumanoid;
use crate::character::{AvatarAnimation, AvatarMount, NoseMarker, PlaceholderBody, PlayerRoot};
use crate::settings::SettingsResource;
use bevy::asset::{LoadState, RecursiveDependencyLoadState};
use bevy::gltf::Gltf;
use bevy::prelude::*;
use rig::{AnimationContext, HumanoidBone, HumanoidRig, MotionPlayer};
use std::collections::HashMap;
use std::f32::consts::PI;

/// Ask the pipeline to (re)load an avatar. The last request of a frame wins.
#[derive(Message, Debug, Clone)]
pub struct AvatarRequest {
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum AvatarStatus {
    #[default]
    Placeholder,
    Loading,
    /// Scene spawned, humanoid bones not resolved yet.
    Binding,
    Ready {
        bones: usize,
    },
    /// Plain glTF scene without a humanoid; shown without animation.
    Static,
    Failed(String),
}

impl AvatarStatus {
    pub fn label(&self) -> String {
        match self {
            Self::Placeholder => "placeholder".to_string(),
            Self::Loading => "loading".to_string(),
            Self::Binding => "binding".to_string(),
            Self::Ready { bones } => format!("ready ({bones} bones)"),
            Self::Static => "static scene".to_string(),
            Self::Failed(reason) => format!("failed: {reason}"),
        }
    }
}

#[derive(Resource, Debug, Default)]
pub struct AvatarState {
    pub path: Option<String>,
    pub status: AvatarStatus,
    scene: Option<Handle<Gltf>>,
    humanoid: Option<Handle<VrmHumanoid>>,
}

impl AvatarState {
    pub fn is_loading(&self) -> bool {
        self.status == AvatarStatus::Loading
    }
}

/// Root of the spawned avatar scene under the mount.
#[derive(Component)]
pub struct AvatarScene;

/// Humanoid table waiting for the scene hierarchy to spawn.
#[derive(Component, Debug, Clone)]
pub struct PendingRig {
    pub humanoid: VrmHumanoid,
}

pub fn request_configured_avatar(settings: Res<SettingsResource>, mut requests: MessageWriter<AvatarRequest>) {
    requests.write(AvatarRequest {
        path: settings.current.assets.avatar_path.clone(),
    });
}

pub fn request_avatar_reload_on_key(
    keys: Option<Res<ButtonInput<KeyCode>>>,
    state: Res<AvatarState>,
    settings: Res<SettingsResource>,
    mut requests: MessageWriter<AvatarRequest>,
) {
    let Some(keys) = keys else {
        return;
    };
    if !keys.just_pressed(KeyCode::F5) {
        return;
    }
    let path = state
        .path
        .clone()
        .unwrap_or_else(|| settings.current.assets.avatar_path.clone());
    requests.write(AvatarRequest { path });
}

/// Start loading the most recent request.
pub fn start_avatar_load(
    mut requests: MessageReader<AvatarRequest>,
    asset_server: Res<AssetServer>,
    mut state: ResMut<AvatarState>,
) {
    let Some(request) = requests.read().last().cloned() else {
        return;
    };

    info!("Loading avatar '{}'", request.path);
    state.scene = Some(asset_server.load::<Gltf>(request.path.clone()));
    state.humanoid = Some(asset_server.load::<VrmHumanoid>(request.path.clone()));
    state.path = Some(request.path);
    state.status = AvatarStatus::Loading;
}

/// Swap the loaded scene in under the mount once both loads settle.
pub fn finish_avatar_load(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    gltfs: Res<Assets<Gltf>>,
    humanoids: Res<Assets<VrmHumanoid>>,
    settings: Res<SettingsResource>,
    mut state: ResMut<AvatarState>,
    mounts: Query<Entity, With<AvatarMount>>,
    players: Query<Entity, With<PlayerRoot>>,
    old_scenes: Query<Entity, With<AvatarScene>>,
    mut placeholders: Query<&mut Visibility, Or<(With<PlaceholderBody>, With<NoseMarker>)>>,
) {
    if !state.is_loading() {
        return;
    }
    let (Some(scene_handle), Some(humanoid_handle)) = (state.scene.clone(), state.humanoid.clone()) else {
        return;
    };
    let path = state.path.clone().unwrap_or_default();

    match asset_server.recursive_dependency_load_state(&scene_handle) {
        RecursiveDependencyLoadState::Loaded => {}
        RecursiveDependencyLoadState::Failed(error) => {
            error!("Avatar '{}' failed to load: {}", path, error);
            state.status = AvatarStatus::Failed(error.to_string());
            return;
        }
        _ => return,
    }

    let humanoid = match asset_server.load_state(&humanoid_handle) {
        LoadState::Loaded => humanoids.get(&humanoid_handle).cloned(),
        LoadState::Failed(error) => {
            info!("Avatar '{}' has no humanoid ({}); showing it as a static scene", path, error);
            None
        }
        _ => return,
    };

    let Some(scene) = gltfs
        .get(&scene_handle)
        .and_then(|gltf| gltf.default_scene.clone().or_else(|| gltf.scenes.first().cloned()))
    else {
        error!("Avatar '{}' contains no scene", path);
        state.status = AvatarStatus::Failed("no scene".to_string());
        return;
    };

    let Ok(mount) = mounts.single() else {
        return;
    };

    for entity in &old_scenes {
        commands.entity(entity).despawn();
    }
    for player in &players {
        commands.entity(player).remove::<AvatarAnimation>();
    }

    let correction = humanoid
        .as_ref()
        .map_or(Quat::from_rotation_y(PI), |humanoid| humanoid.version.forward_correction());
    let mut scene_entity = commands.spawn((
        AvatarScene,
        Name::new("AvatarScene"),
        SceneRoot(scene),
        Transform::from_xyz(0.0, settings.current.assets.avatar_offset_y, 0.0).with_rotation(correction),
        ChildOf(mount),
    ));

    state.status = match humanoid {
        Some(humanoid) => {
            info!(
                "Avatar '{}' is {} with {} humanoid bones",
                path,
                humanoid.version.label(),
                humanoid.bones.len()
            );
            scene_entity.insert(PendingRig { humanoid });
            AvatarStatus::Binding
        }
        None => AvatarStatus::Static,
    };

    for mut visibility in &mut placeholders {
        *visibility = Visibility::Hidden;
    }
}

/// Resolve humanoid bones in the spawned hierarchy and attach a fresh
/// animation context to the player.
pub fn bind_avatar_rig(
    mut commands: Commands,
    settings: Res<SettingsResource>,
    mut state: ResMut<AvatarState>,
    pending: Query<(Entity, &PendingRig)>,
    children: Query<&Children>,
    names: Query<&Name>,
    players: Query<Entity, With<PlayerRoot>>,
) {
    for (scene_entity, pending_rig) in &pending {
        let Some(rig) = resolve_rig(scene_entity, &pending_rig.humanoid, &children, &names) else {
            continue;
        };
        commands.entity(scene_entity).remove::<PendingRig>();

        let Ok(player) = players.single() else {
            continue;
        };

        let animation = &settings.current.animation;
        let context = AnimationContext::new(MotionPlayer::with_fades(
            animation.motion_fade_in,
            animation.motion_fade_out,
        ));
        info!("Bound {} humanoid bones", rig.len());
        state.status = AvatarStatus::Ready { bones: rig.len() };
        commands.entity(player).insert(AvatarAnimation::new(context, rig));
    }
}

/// Map the humanoid table onto entities below `root` by node name.
///
/// `None` until the hierarchy containing the hips has spawned.
pub fn resolve_rig(
    root: Entity,
    humanoid: &VrmHumanoid,
    children: &Query<&Children>,
    names: &Query<&Name>,
) -> Option<HumanoidRig<Entity>> {
    let by_name: HashMap<&str, Entity> = children
        .iter_descendants(root)
        .filter_map(|entity| names.get(entity).ok().map(|name| (name.as_str(), entity)))
        .collect();

    let hips = humanoid.node_name(HumanoidBone::Hips)?;
    by_name.get(hips)?;

    let mut rig = HumanoidRig::new();
    for entry in &humanoid.bones {
        if let Some(&entity) = by_name.get(entry.node_name.as_str()) {
            rig.insert(entry.bone, entity, entry.node_name.clone());
        }
    }
    Some(rig)
}
