use crate::character::{CharacterFrameSet, PlayerRoot};
use crate::settings::{CameraSettings, SettingsResource};
use bevy::camera::{PerspectiveProjection, Projection};
use bevy::core_pipeline::tonemapping::Tonemapping;
use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::pbr::{DistanceFog, FogFalloff};
use bevy::prelude::*;

const INITIAL_OFFSET: Vec3 = Vec3::new(0.0, 1.0, 4.2);
const FOG_COLOR: Color = Color::srgb(0.933, 0.933, 0.933);
const PIXELS_PER_LINE: f32 = 100.0;

/// Pointer input claimed by the HUD this frame.
#[derive(Resource, Debug, Default)]
pub struct PointerCapture {
    pub captured: bool,
}

/// Orbit around the player in spherical coordinates; `polar` is measured
/// from straight up.
#[derive(Component, Debug, Clone)]
pub struct OrbitCamera {
    pub azimuth: f32,
    pub polar: f32,
    pub distance: f32,
    pending_azimuth: f32,
    pending_polar: f32,
}

impl OrbitCamera {
    pub fn from_offset(offset: Vec3, settings: &CameraSettings) -> Self {
        let distance = offset.length().max(f32::EPSILON);
        let mut camera = Self {
            azimuth: offset.x.atan2(offset.z),
            polar: (offset.y / distance).clamp(-1.0, 1.0).acos(),
            distance,
            pending_azimuth: 0.0,
            pending_polar: 0.0,
        };
        camera.clamp(settings);
        camera
    }

    pub fn orbit(&mut self, delta_azimuth: f32, delta_polar: f32) {
        self.pending_azimuth += delta_azimuth;
        self.pending_polar += delta_polar;
    }

    pub fn zoom(&mut self, lines: f32, settings: &CameraSettings) {
        self.distance *= settings.zoom_step.powf(lines);
        self.clamp(settings);
    }

    /// Apply a damped share of the pending orbit and decay the rest.
    pub fn settle(&mut self, settings: &CameraSettings) {
        let damping = settings.damping.clamp(0.0, 1.0);
        self.azimuth += self.pending_azimuth * damping;
        self.polar += self.pending_polar * damping;
        self.pending_azimuth *= 1.0 - damping;
        self.pending_polar *= 1.0 - damping;
        self.clamp(settings);
    }

    pub fn offset(&self) -> Vec3 {
        orbit_offset(self.azimuth, self.polar, self.distance)
    }

    fn clamp(&mut self, settings: &CameraSettings) {
        self.polar = self.polar.clamp(0.0, settings.max_polar_angle);
        self.distance = self
            .distance
            .clamp(settings.min_distance, settings.max_distance.max(settings.min_distance));
    }
}

pub fn orbit_offset(azimuth: f32, polar: f32, distance: f32) -> Vec3 {
    let planar = distance * polar.sin();
    Vec3::new(planar * azimuth.sin(), distance * polar.cos(), planar * azimuth.cos())
}

pub struct OrbitCameraPlugin;

impl Plugin for OrbitCameraPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PointerCapture>()
            .add_systems(Startup, spawn_orbit_camera)
            .add_systems(
                Update,
                (orbit_camera_input, follow_player)
                    .chain()
                    .after(CharacterFrameSet),
            );
    }
}

pub fn spawn_orbit_camera(mut commands: Commands, settings: Res<SettingsResource>) {
    let camera_settings = &settings.current.camera;
    let orbit = OrbitCamera::from_offset(INITIAL_OFFSET, camera_settings);
    let target = Vec3::Y * camera_settings.target_height;

    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: camera_settings.fov_degrees.to_radians(),
            near: 0.1,
            far: 200.0,
            ..default()
        }),
        Tonemapping::ReinhardLuminance,
        DistanceFog {
            color: FOG_COLOR,
            falloff: FogFalloff::Linear {
                start: 8.0,
                end: 60.0,
            },
            ..default()
        },
        Transform::from_translation(target + orbit.offset()).looking_at(target, Vec3::Y),
        orbit,
    ));
}

pub fn orbit_camera_input(
    settings: Res<SettingsResource>,
    capture: Res<PointerCapture>,
    mouse_buttons: Option<Res<ButtonInput<MouseButton>>>,
    mut mouse_motion: MessageReader<MouseMotion>,
    mut mouse_wheel: MessageReader<MouseWheel>,
    mut cameras: Query<&mut OrbitCamera>,
) {
    let mut drag = Vec2::ZERO;
    for motion in mouse_motion.read() {
        drag += motion.delta;
    }
    let mut lines = 0.0;
    for wheel in mouse_wheel.read() {
        lines += match wheel.unit {
            MouseScrollUnit::Line => wheel.y,
            MouseScrollUnit::Pixel => wheel.y / PIXELS_PER_LINE,
        };
    }
    if capture.captured {
        return;
    }

    let dragging = mouse_buttons.is_some_and(|buttons| buttons.pressed(MouseButton::Left));
    let camera_settings = &settings.current.camera;
    for mut camera in &mut cameras {
        if dragging {
            camera.orbit(
                -drag.x * camera_settings.orbit_sensitivity,
                -drag.y * camera_settings.orbit_sensitivity,
            );
        }
        if lines != 0.0 {
            camera.zoom(lines, camera_settings);
        }
    }
}

/// Keep the camera on its orbit around the player's head height.
pub fn follow_player(
    settings: Res<SettingsResource>,
    players: Query<&Transform, (With<PlayerRoot>, Without<OrbitCamera>)>,
    mut cameras: Query<(&mut Transform, &mut OrbitCamera)>,
) {
    let Ok(player) = players.single() else {
        return;
    };
    let camera_settings = &settings.current.camera;
    let target = player.translation + Vec3::Y * camera_settings.target_height;

    for (mut transform, mut camera) in &mut cameras {
        camera.settle(camera_settings);
        *transform = Transform::from_translation(target + camera.offset()).looking_at(target, Vec3::Y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_offset_round_trips() {
        let camera = OrbitCamera::from_offset(INITIAL_OFFSET, &CameraSettings::default());
        assert!((camera.offset() - INITIAL_OFFSET).length() < 1e-4);
        assert!(camera.azimuth.abs() < 1e-6);
    }

    #[test]
    fn zoom_and_pitch_are_limited() {
        let settings = CameraSettings::default();
        let mut camera = OrbitCamera::from_offset(INITIAL_OFFSET, &settings);

        camera.zoom(-200.0, &settings);
        assert_eq!(camera.distance, settings.max_distance);
        camera.zoom(200.0, &settings);
        assert_eq!(camera.distance, settings.min_distance);

        camera.orbit(0.0, 10.0);
        for _ in 0..500 {
            camera.settle(&settings);
        }
        assert!(camera.polar <= settings.max_polar_angle + 1e-6);
        assert!(camera.offset().y > 0.0);
    }

    #[test]
    fn damping_spreads_orbit_over_frames() {
        let settings = CameraSettings::default();
        let mut camera = OrbitCamera::from_offset(INITIAL_OFFSET, &settings);
        camera.orbit(1.0, 0.0);

        camera.settle(&settings);
        assert!((camera.azimuth - settings.damping).abs() < 1e-6);

        for _ in 0..400 {
            camera.settle(&settings);
        }
        assert!((camera.azimuth - 1.0).abs() < 1e-3);
    }
}
