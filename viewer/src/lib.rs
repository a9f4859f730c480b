#![allow(clippy::too_many_arguments, clippy::type_complexity)]

pub mod app;
pub mod avatar;
pub mod camera;
pub mod character;
pub mod composition;
pub mod infra;
pub mod motion;
pub mod settings;
pub mod ui;
pub mod world;

use bevy::prelude::*;

/// Build and run the viewer with settings from `./settings.yaml`.
pub fn run_viewer_app() {
    let startup_settings = infra::persistence::settings_store::load();
    if let Err(error) = infra::persistence::settings_store::ensure_exists(&startup_settings) {
        eprintln!(
            "Failed to ensure startup settings file '{}': {}",
            settings::SETTINGS_FILE_PATH,
            error
        );
    }

    let mut app = App::new();
    composition::viewer_runtime::configure_viewer_app(&mut app, &startup_settings);
    app.run();
}
