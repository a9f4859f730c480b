pub mod pipeline;
pub mod vrm;

pub use pipeline::{AvatarRequest, AvatarScene, AvatarState, AvatarStatus, PendingRig, resolve_rig};
pub use vrm::{VrmHumanBone, VrmHumanoid, VrmHumanoidLoader, VrmVersion, parse_vrm_humanoid};

use crate::character::CharacterFrameSet;
use bevy::prelude::*;

pub struct AvatarPlugin;

impl Plugin for AvatarPlugin {
    fn build(&self, app: &mut App) {
        app.init_asset::<VrmHumanoid>()
            .init_asset_loader::<VrmHumanoidLoader>()
            .add_message::<AvatarRequest>()
            .init_resource::<AvatarState>()
            .add_systems(Startup, pipeline::request_configured_avatar)
            .add_systems(
                Update,
                (
                    pipeline::request_avatar_reload_on_key,
                    pipeline::start_avatar_load,
                    pipeline::finish_avatar_load,
                    pipeline::bind_avatar_rig,
                )
                    .chain()
                    .before(CharacterFrameSet),
            );
    }
}
