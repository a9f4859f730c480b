use bevy::prelude::*;
use rig::{Kinematics, LocomotionController, LocomotionTuning, MoveIntent};

#[derive(Component, Debug, Clone)]
pub struct PlayerController {
    pub locomotion: LocomotionController,
    pub intent: MoveIntent,
    /// Output of the last locomotion step.
    pub kinematics: Kinematics,
    /// Clamped delta the last step ran with; animation reuses it.
    pub frame_dt: f32,
}

impl PlayerController {
    pub fn new(tuning: LocomotionTuning) -> Self {
        Self {
            locomotion: LocomotionController::new(tuning),
            intent: MoveIntent::NONE,
            kinematics: Kinematics::AT_REST,
            frame_dt: 0.0,
        }
    }
}
