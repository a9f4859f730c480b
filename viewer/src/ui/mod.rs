use crate::avatar::{AvatarRequest, AvatarState};
use crate::camera::PointerCapture;
use crate::character::{AvatarAnimation, PlayerController, PlayerRoot};
use crate::motion::MotionLibrary;
use crate::settings::SettingsResource;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_egui::{EguiContexts, EguiPrimaryContextPass, egui};

pub struct HudPlugin;

impl Plugin for HudPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, update_window_title)
            .add_systems(EguiPrimaryContextPass, draw_debug_panel);
    }
}

pub fn position_title(position: Vec3) -> String {
    format!("x:{:.2} z:{:.2}", position.x, position.z)
}

fn update_window_title(
    players: Query<&Transform, (With<PlayerRoot>, Changed<Transform>)>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
) {
    let (Ok(player), Ok(mut window)) = (players.single(), windows.single_mut()) else {
        return;
    };
    window.title = position_title(player.translation);
}

fn draw_debug_panel(
    mut contexts: EguiContexts,
    settings: Res<SettingsResource>,
    avatar: Res<AvatarState>,
    motion: Res<MotionLibrary>,
    mut capture: ResMut<PointerCapture>,
    mut requests: MessageWriter<AvatarRequest>,
    mut players: Query<(&PlayerController, Option<&mut AvatarAnimation>), With<PlayerRoot>>,
) {
    let Ok(ctx) = contexts.ctx_mut() else {
        return;
    };
    let Ok((controller, mut animation)) = players.single_mut() else {
        return;
    };

    egui::Window::new("Avatar")
        .anchor(egui::Align2::LEFT_TOP, egui::vec2(12.0, 12.0))
        .collapsible(true)
        .resizable(false)
        .default_width(240.0)
        .show(ctx, |ui| {
            ui.label(format!(
                "Avatar: {}",
                avatar.path.as_deref().unwrap_or("none")
            ));
            ui.label(format!("Status: {}", avatar.status.label()));
            ui.label(format!("Motion: {}", motion.status.label()));
            ui.separator();

            let state = animation
                .as_deref()
                .map_or("placeholder", |animation| {
                    animation
                        .context
                        .motion_state()
                        .map_or("clip", |state| state.label())
                });
            ui.label(format!("State: {state}"));
            ui.label(format!("Speed: {:.2} m/s", controller.kinematics.speed));
            ui.label(format!("Stride: {:.2}", controller.kinematics.stride));
            ui.separator();

            ui.horizontal(|ui| {
                if ui.button("Reload avatar").clicked() {
                    let path = avatar
                        .path
                        .clone()
                        .unwrap_or_else(|| settings.current.assets.avatar_path.clone());
                    requests.write(AvatarRequest { path });
                }

                let Some(animation) = animation.as_deref_mut() else {
                    return;
                };
                if animation.context.motion().is_running() {
                    if ui.button("Stop motion").clicked() {
                        animation.context.stop();
                    }
                } else if motion.is_available() && ui.button("Play motion").clicked() {
                    animation.motion_resolved = false;
                }
            });
        });

    capture.captured = ctx.wants_pointer_input() || ctx.is_pointer_over_area();
}
