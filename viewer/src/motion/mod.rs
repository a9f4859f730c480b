pub mod loader;
pub mod playback;

pub use loader::{MotionClip, MotionClipLoader, MotionLoaderError, parse_motion_glb};
pub use playback::{MotionLibrary, MotionStatus};

use crate::avatar::pipeline::bind_avatar_rig;
use crate::character::CharacterFrameSet;
use bevy::prelude::*;

pub struct MotionPlugin;

impl Plugin for MotionPlugin {
    fn build(&self, app: &mut App) {
        app.init_asset::<MotionClip>()
            .init_asset_loader::<MotionClipLoader>()
            .init_resource::<MotionLibrary>()
            .add_systems(Startup, playback::load_configured_motion)
            .add_systems(
                Update,
                playback::attach_motion_to_avatar
                    .after(bind_avatar_rig)
                    .before(CharacterFrameSet),
            );
    }
}
