use bevy::prelude::*;
use bevy_egui::EguiPlugin;

use crate::app::plugins::{build_bevy_plugins, create_winit_settings};
use crate::avatar::AvatarPlugin;
use crate::camera::OrbitCameraPlugin;
use crate::character::CharacterPlugin;
use crate::motion::MotionPlugin;
use crate::settings::{SettingsPlugin, SettingsResource, ViewerSettings};
use crate::ui::HudPlugin;
use crate::world::StagePlugin;

pub fn configure_viewer_app(app: &mut App, startup_settings: &ViewerSettings) {
    app.insert_resource(SettingsResource::new(startup_settings.clone()))
        .add_plugins(build_bevy_plugins(startup_settings))
        .insert_resource(create_winit_settings(startup_settings))
        .add_plugins(bevy::diagnostic::FrameTimeDiagnosticsPlugin::default())
        .add_plugins(EguiPlugin::default());

    register_viewer_runtime(app);
}

/// Everything except windowing and rendering; headless tests call this on
/// top of `MinimalPlugins`.
pub fn register_viewer_runtime(app: &mut App) {
    app.add_plugins(SettingsPlugin)
        .add_plugins(StagePlugin)
        .add_plugins(CharacterPlugin)
        .add_plugins(AvatarPlugin)
        .add_plugins(MotionPlugin)
        .add_plugins(OrbitCameraPlugin)
        .add_plugins(HudPlugin);
}
