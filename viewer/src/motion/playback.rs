use super::loader::MotionClip;
use crate::character::AvatarAnimation;
use crate::settings::SettingsResource;
use bevy::asset::LoadState;
use bevy::prelude::*;
use rig::{BoundClip, ClipRetargeter};

#[derive(Debug, Clone, Default, PartialEq)]
pub enum MotionStatus {
    /// No motion configured.
    #[default]
    Disabled,
    Loading,
    Playing(String),
    /// Nothing in the clip maps onto the avatar.
    Unmapped,
    Failed(String),
}

impl MotionStatus {
    pub fn label(&self) -> String {
        match self {
            Self::Disabled => "none".to_string(),
            Self::Loading => "loading".to_string(),
            Self::Playing(name) => format!("playing '{name}'"),
            Self::Unmapped => "unmapped, procedural".to_string(),
            Self::Failed(reason) => format!("failed: {reason}"),
        }
    }
}

#[derive(Resource, Debug, Default)]
pub struct MotionLibrary {
    pub path: Option<String>,
    pub status: MotionStatus,
    pub retargeter: ClipRetargeter,
    handle: Option<Handle<MotionClip>>,
    reported: bool,
}

impl MotionLibrary {
    /// Whether a clip has been played at least once and can be replayed.
    pub fn is_available(&self) -> bool {
        matches!(self.status, MotionStatus::Playing(_))
    }
}

pub fn load_configured_motion(
    settings: Res<SettingsResource>,
    asset_server: Res<AssetServer>,
    mut library: ResMut<MotionLibrary>,
) {
    let Some(path) = settings.current.assets.motion_path.clone() else {
        return;
    };
    info!("Loading motion '{}'", path);
    library.handle = Some(asset_server.load::<MotionClip>(path.clone()));
    library.path = Some(path);
    library.status = MotionStatus::Loading;
}

/// Retarget the loaded clip onto every freshly bound avatar and play it.
///
/// Avatars whose rig yields no tracks stay under procedural control.
pub fn attach_motion_to_avatar(
    asset_server: Res<AssetServer>,
    clips: Res<Assets<MotionClip>>,
    mut library: ResMut<MotionLibrary>,
    mut avatars: Query<&mut AvatarAnimation>,
) {
    let Some(handle) = library.handle.clone() else {
        return;
    };

    match asset_server.load_state(&handle) {
        LoadState::Loaded => {}
        LoadState::Failed(error) => {
            if library.status == MotionStatus::Loading {
                error!(
                    "Motion '{}' failed to load: {}. Keeping procedural animation.",
                    library.path.as_deref().unwrap_or_default(),
                    error
                );
                library.status = MotionStatus::Failed(error.to_string());
            }
            return;
        }
        _ => return,
    }
    let Some(MotionClip(clip)) = clips.get(&handle) else {
        return;
    };

    let library = &mut *library;
    for mut animation in &mut avatars {
        if animation.motion_resolved {
            continue;
        }
        let animation = &mut *animation;
        animation.motion_resolved = true;

        let retargeted = if library.reported {
            library.retargeter.retarget(clip, &animation.rig)
        } else {
            let (retargeted, report) = library.retargeter.retarget_with_report(clip, &animation.rig);
            info!(
                "Retarget '{}': {} source bones, {} mapped: {:?}",
                clip.name,
                report.source_bones.len(),
                report.mapped_bones.len(),
                report.mapped_bones
            );
            library.reported = true;
            retargeted
        };

        let rig = &animation.rig;
        let bound = retargeted
            .as_ref()
            .and_then(|clip| BoundClip::bind(clip, |name| rig.handle_by_node_name(name)));
        match bound {
            Some(bound) => {
                info!("Playing motion '{}' on {} bones", bound.name(), bound.channels().len());
                library.status = MotionStatus::Playing(bound.name().to_string());
                animation.context.play(bound);
            }
            None => {
                warn!("Motion '{}' has no tracks for this avatar; keeping procedural animation", clip.name);
                library.status = MotionStatus::Unmapped;
            }
        }
    }
}
