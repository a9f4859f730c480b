use super::controller::PlayerController;
use super::types::PlayerRoot;
use crate::camera::OrbitCamera;
use crate::settings::SettingsResource;
use bevy::prelude::*;
use rig::{MoveIntent, clamp_frame_dt};

pub fn intent_from_keys(keys: &ButtonInput<KeyCode>) -> MoveIntent {
    MoveIntent {
        forward: keys.any_pressed([KeyCode::KeyW, KeyCode::ArrowUp]),
        back: keys.any_pressed([KeyCode::KeyS, KeyCode::ArrowDown]),
        left: keys.any_pressed([KeyCode::KeyA, KeyCode::ArrowLeft]),
        right: keys.any_pressed([KeyCode::KeyD, KeyCode::ArrowRight]),
        jump: keys.pressed(KeyCode::Space),
    }
}

/// Copy the currently held movement keys into every player controller.
pub fn sample_move_intent(
    keys: Option<Res<ButtonInput<KeyCode>>>,
    mut players: Query<&mut PlayerController, With<PlayerRoot>>,
) {
    let intent = keys.map_or(MoveIntent::NONE, |keys| intent_from_keys(&keys));
    for mut controller in &mut players {
        controller.intent = intent;
    }
}

/// Step locomotion relative to the orbit camera and write the root transform.
pub fn advance_player_locomotion(
    time: Res<Time>,
    settings: Res<SettingsResource>,
    cameras: Query<&GlobalTransform, With<OrbitCamera>>,
    mut players: Query<(&mut Transform, &mut PlayerController), With<PlayerRoot>>,
) {
    let dt = clamp_frame_dt(time.delta_secs(), settings.current.animation.max_frame_dt);
    let camera_forward = cameras
        .single()
        .map(|camera| camera.forward().as_vec3())
        .unwrap_or(Vec3::NEG_Z);

    for (mut transform, mut controller) in &mut players {
        let controller = &mut *controller;
        if controller.locomotion.tuning() != &settings.current.locomotion {
            controller.locomotion.set_tuning(settings.current.locomotion);
        }

        controller.kinematics = controller.locomotion.step(dt, controller.intent, camera_forward);
        controller.frame_dt = dt;

        transform.translation = controller.kinematics.position;
        transform.rotation = Quat::from_rotation_y(controller.kinematics.facing_yaw);
    }
}
