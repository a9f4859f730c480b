use crate::world::StageSun;
use bevy::light::{
    CascadeShadowConfig, CascadeShadowConfigBuilder, DirectionalLightShadowMap,
    ShadowFilteringMethod,
};
use bevy::prelude::*;
use bevy::window::{MonitorSelection, PresentMode, PrimaryWindow, WindowMode, WindowResolution};
use bevy::winit::{UpdateMode, WinitSettings};
use rig::{DEFAULT_MAX_FRAME_DT, LocomotionTuning};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const SETTINGS_FILE_PATH: &str = "./settings.yaml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowModeSetting {
    #[default]
    Windowed,
    Fullscreen,
}

impl WindowModeSetting {
    pub fn to_bevy(self) -> WindowMode {
        match self {
            Self::Windowed => WindowMode::Windowed,
            Self::Fullscreen => WindowMode::BorderlessFullscreen(MonitorSelection::Current),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadowQualitySetting {
    Off,
    Low,
    #[default]
    Medium,
    High,
}

impl ShadowQualitySetting {
    pub fn shadow_map_size(self) -> Option<usize> {
        match self {
            Self::Off => None,
            Self::Low => Some(1024),
            Self::Medium => Some(2048),
            Self::High => Some(4096),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FpsLimitSetting {
    #[default]
    Default60,
    Monitor,
    Unlimited,
}

impl FpsLimitSetting {
    pub fn to_update_mode(self) -> UpdateMode {
        match self {
            Self::Default60 => UpdateMode::reactive(Duration::from_secs_f64(1.0 / 60.0)),
            Self::Monitor | Self::Unlimited => UpdateMode::Continuous,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionSetting {
    pub width: u32,
    pub height: u32,
}

impl Default for ResolutionSetting {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphicsSettings {
    pub window_mode: WindowModeSetting,
    pub resolution: ResolutionSetting,
    pub shadow_quality: ShadowQualitySetting,
    pub vsync: bool,
    pub fps_limit: FpsLimitSetting,
}

impl Default for GraphicsSettings {
    fn default() -> Self {
        Self {
            window_mode: WindowModeSetting::Windowed,
            resolution: ResolutionSetting::default(),
            shadow_quality: ShadowQualitySetting::Medium,
            vsync: true,
            fps_limit: FpsLimitSetting::Default60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetSettings {
    /// Asset directory; relative paths resolve against the working directory.
    pub asset_root: Option<String>,
    pub avatar_path: String,
    pub motion_path: Option<String>,
    /// Height of the avatar scene above its mount.
    pub avatar_offset_y: f32,
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self {
            asset_root: None,
            avatar_path: "avatar.vrm".to_string(),
            motion_path: None,
            avatar_offset_y: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationSettings {
    pub max_frame_dt: f32,
    pub motion_fade_in: f32,
    pub motion_fade_out: f32,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            max_frame_dt: DEFAULT_MAX_FRAME_DT,
            motion_fade_in: rig::motion::DEFAULT_FADE_IN,
            motion_fade_out: rig::motion::DEFAULT_FADE_OUT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub fov_degrees: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Upper bound of the polar angle measured from straight up.
    pub max_polar_angle: f32,
    pub damping: f32,
    /// Radians of orbit per pixel of drag.
    pub orbit_sensitivity: f32,
    /// Distance multiplier per wheel line.
    pub zoom_step: f32,
    pub target_height: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov_degrees: 60.0,
            min_distance: 2.5,
            max_distance: 10.0,
            max_polar_angle: std::f32::consts::PI * 0.49,
            damping: 0.08,
            orbit_sensitivity: 0.005,
            zoom_step: 0.95,
            target_height: 1.2,
        }
    }
}

/// Spring-bone parameters handed through to the avatar's secondary motion.
/// The viewer stores and reports them; it does not simulate springs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecondaryMotionSettings {
    pub gravity_dir: [f32; 3],
    pub gravity_power: f32,
    pub drag_force: f32,
}

impl Default for SecondaryMotionSettings {
    fn default() -> Self {
        Self {
            gravity_dir: [0.0, -1.0, 0.0],
            gravity_power: 1.0,
            drag_force: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    pub graphics: GraphicsSettings,
    pub assets: AssetSettings,
    pub locomotion: LocomotionTuning,
    pub animation: AnimationSettings,
    pub camera: CameraSettings,
    pub secondary_motion: SecondaryMotionSettings,
}

#[derive(Debug, Error)]
pub enum SettingsIoError {
    #[error("failed to read settings file: {0}")]
    Read(std::io::Error),
    #[error("failed to write settings file: {0}")]
    Write(std::io::Error),
    #[error("failed to decode YAML settings: {0}")]
    Deserialize(serde_yaml::Error),
    #[error("failed to encode YAML settings: {0}")]
    Serialize(serde_yaml::Error),
}

#[derive(Resource, Clone)]
pub struct SettingsResource {
    pub current: ViewerSettings,
}

impl SettingsResource {
    pub fn new(current: ViewerSettings) -> Self {
        Self { current }
    }
}

pub struct SettingsPlugin;

impl Plugin for SettingsPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, log_secondary_motion_settings)
            .add_systems(Update, apply_runtime_settings);
    }
}

pub fn load_settings_or_default() -> ViewerSettings {
    load_settings_or_default_at(Path::new(SETTINGS_FILE_PATH))
}

pub fn load_settings_or_default_at(path: &Path) -> ViewerSettings {
    if !path.exists() {
        return ViewerSettings::default();
    }

    match load_settings_from_path(path) {
        Ok(settings) => settings,
        Err(error) => {
            // Called before the app installs a log subscriber.
            eprintln!("{}", settings_fallback_message(path, &error));
            ViewerSettings::default()
        }
    }
}

pub fn settings_fallback_message(path: &Path, error: &SettingsIoError) -> String {
    format!(
        "Failed to load settings from '{}': {}. Falling back to defaults.",
        path.display(),
        error
    )
}

pub fn ensure_settings_file_exists(settings: &ViewerSettings) -> Result<(), SettingsIoError> {
    ensure_settings_file_at(settings, Path::new(SETTINGS_FILE_PATH))
}

pub fn ensure_settings_file_at(settings: &ViewerSettings, path: &Path) -> Result<(), SettingsIoError> {
    if path.exists() {
        return Ok(());
    }

    write_settings_to_path(settings, path)
}

pub fn present_mode_for(graphics: &GraphicsSettings) -> PresentMode {
    if matches!(graphics.fps_limit, FpsLimitSetting::Unlimited) || !graphics.vsync {
        PresentMode::AutoNoVsync
    } else {
        PresentMode::AutoVsync
    }
}

pub fn load_settings_from_path(path: &Path) -> Result<ViewerSettings, SettingsIoError> {
    let raw = fs::read_to_string(path).map_err(SettingsIoError::Read)?;
    serde_yaml::from_str::<ViewerSettings>(&raw).map_err(SettingsIoError::Deserialize)
}

pub fn write_settings_to_path(settings: &ViewerSettings, path: &Path) -> Result<(), SettingsIoError> {
    let encoded = serde_yaml::to_string(settings).map_err(SettingsIoError::Serialize)?;
    fs::write(path, encoded).map_err(SettingsIoError::Write)
}

fn log_secondary_motion_settings(settings: Res<SettingsResource>) {
    let secondary = &settings.current.secondary_motion;
    info!(
        "Secondary motion: gravity_dir={:?} gravity_power={} drag_force={}",
        secondary.gravity_dir, secondary.gravity_power, secondary.drag_force
    );
}

fn apply_runtime_settings(
    settings: Res<SettingsResource>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
    winit_settings: Option<ResMut<WinitSettings>>,
    mut sun_query: Query<(&mut DirectionalLight, &mut CascadeShadowConfig), With<StageSun>>,
    mut shadow_map: Option<ResMut<DirectionalLightShadowMap>>,
    camera_query: Query<Entity, With<Camera3d>>,
    added_sun_query: Query<(), Added<StageSun>>,
    mut commands: Commands,
    mut last_applied: Local<Option<GraphicsSettings>>,
) {
    let graphics = &settings.current.graphics;
    if last_applied.as_ref() == Some(graphics) && added_sun_query.is_empty() {
        return;
    }

    if let Ok(mut window) = windows.single_mut() {
        let target_mode = graphics.window_mode.to_bevy();
        window.mode = target_mode;
        if matches!(target_mode, WindowMode::Windowed) {
            window.resolution = WindowResolution::new(graphics.resolution.width, graphics.resolution.height);
        }
        window.present_mode = present_mode_for(graphics);
    }

    if let Some(mut winit_settings) = winit_settings {
        let update_mode = graphics.fps_limit.to_update_mode();
        winit_settings.focused_mode = update_mode;
        winit_settings.unfocused_mode = update_mode;
    }

    apply_shadow_quality(
        graphics.shadow_quality,
        &mut sun_query,
        shadow_map.as_deref_mut(),
        &camera_query,
        &mut commands,
    );

    *last_applied = Some(graphics.clone());
}

fn apply_shadow_quality(
    mode: ShadowQualitySetting,
    sun_query: &mut Query<(&mut DirectionalLight, &mut CascadeShadowConfig), With<StageSun>>,
    mut shadow_map: Option<&mut DirectionalLightShadowMap>,
    camera_query: &Query<Entity, With<Camera3d>>,
    commands: &mut Commands,
) {
    let Some(size) = mode.shadow_map_size() else {
        for (mut light, _) in sun_query.iter_mut() {
            light.shadows_enabled = false;
        }
        return;
    };

    if let Some(map) = shadow_map.as_deref_mut() {
        map.size = size;
    }

    let (num_cascades, first_cascade_far_bound) = match mode {
        ShadowQualitySetting::High => (3, 8.0),
        ShadowQualitySetting::Medium => (2, 12.0),
        _ => (1, 60.0),
    };
    for (mut light, mut cascade_config) in sun_query.iter_mut() {
        light.shadows_enabled = true;
        *cascade_config = CascadeShadowConfigBuilder {
            num_cascades,
            minimum_distance: 0.1,
            maximum_distance: 60.0,
            first_cascade_far_bound,
            overlap_proportion: 0.15,
        }
        .into();
    }

    let filtering = match mode {
        ShadowQualitySetting::Low => ShadowFilteringMethod::Hardware2x2,
        _ => ShadowFilteringMethod::Gaussian,
    };
    for entity in camera_query.iter() {
        commands.entity(entity).insert(filtering);
    }
}
