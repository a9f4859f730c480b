use bevy::math::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

/// Held movement keys for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveIntent {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub jump: bool,
}

impl MoveIntent {
    pub const NONE: Self = Self {
        forward: false,
        back: false,
        left: false,
        right: false,
        jump: false,
    };

    pub const FORWARD: Self = Self {
        forward: true,
        ..Self::NONE
    };

    /// Local-space input: `x` strafes right, `y` moves forward.
    pub fn axis(&self) -> Vec2 {
        let x = (self.right as i8 - self.left as i8) as f32;
        let y = (self.forward as i8 - self.back as i8) as f32;
        Vec2::new(x, y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionTuning {
    /// Planar top speed in m/s.
    pub top_speed: f32,
    /// Velocity smoothing rate (1/s) while input is held.
    pub acceleration_rate: f32,
    /// Velocity smoothing rate (1/s) once input is released.
    pub deceleration_rate: f32,
    /// Facing interpolation rate (1/s).
    pub turn_rate: f32,
    pub gravity: f32,
    pub jump_speed: f32,
    /// Fraction of top speed that maps to a full stride.
    pub stride_reference: f32,
    pub moving_epsilon: f32,
    pub ground_threshold: f32,
}

impl Default for LocomotionTuning {
    fn default() -> Self {
        Self {
            top_speed: 2.2,
            acceleration_rate: 12.0 * 0.6,
            deceleration_rate: 10.0 * 0.5,
            turn_rate: 4.0,
            gravity: -12.0,
            jump_speed: 6.0,
            stride_reference: 0.7,
            moving_epsilon: 1e-3,
            ground_threshold: 1e-4,
        }
    }
}

impl LocomotionTuning {
    /// Normalized locomotion intensity for `speed`, always within `[0, 1]`.
    pub fn stride(&self, speed: f32) -> f32 {
        let reference = self.top_speed * self.stride_reference;
        if reference <= 0.0 {
            return 0.0;
        }
        (speed.max(0.0) / reference).min(1.0)
    }
}

/// Root transform state owned by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LocomotionState {
    pub position: Vec3,
    /// Planar velocity; `y` is always zero.
    pub velocity: Vec3,
    pub vertical_velocity: f32,
    pub facing_yaw: f32,
}

/// Per-frame output consumed by the animation layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kinematics {
    pub position: Vec3,
    pub facing_yaw: f32,
    pub speed: f32,
    pub stride: f32,
    pub moving: bool,
    pub grounded: bool,
}

impl Kinematics {
    pub const AT_REST: Self = Self {
        position: Vec3::ZERO,
        facing_yaw: 0.0,
        speed: 0.0,
        stride: 0.0,
        moving: false,
        grounded: true,
    };
}

impl Default for Kinematics {
    fn default() -> Self {
        Self::AT_REST
    }
}

/// Camera-relative planar movement with inertia, facing and a jump arc.
#[derive(Debug, Clone, Default)]
pub struct LocomotionController {
    tuning: LocomotionTuning,
    state: LocomotionState,
}

impl LocomotionController {
    pub fn new(tuning: LocomotionTuning) -> Self {
        Self {
            tuning,
            state: LocomotionState::default(),
        }
    }

    pub fn tuning(&self) -> &LocomotionTuning {
        &self.tuning
    }

    pub fn set_tuning(&mut self, tuning: LocomotionTuning) {
        self.tuning = tuning;
    }

    pub fn state(&self) -> &LocomotionState {
        &self.state
    }

    pub fn speed(&self) -> f32 {
        self.state.velocity.length()
    }

    /// Advance one frame.
    pub fn step(&mut self, dt: f32, intent: MoveIntent, camera_forward: Vec3) -> Kinematics {
        let dt = dt.max(0.0);
        let tuning = self.tuning;

        let direction = planar_direction(intent.axis(), camera_forward);
        let target_velocity = direction * tuning.top_speed;
        let rate = if direction != Vec3::ZERO {
            tuning.acceleration_rate
        } else {
            tuning.deceleration_rate
        };
        let factor = (dt * rate).min(1.0);
        self.state.velocity = self.state.velocity.lerp(target_velocity, factor);
        self.state.position += self.state.velocity * dt;

        let speed = self.state.velocity.length();
        let moving = speed > tuning.moving_epsilon;
        if moving {
            let velocity = self.state.velocity;
            let target_yaw = velocity.x.atan2(velocity.z) + PI;
            self.state.facing_yaw = lerp_angle(
                self.state.facing_yaw,
                target_yaw,
                (dt * tuning.turn_rate).min(1.0),
            );
        }

        let grounded = self.state.position.y <= tuning.ground_threshold;
        if grounded {
            self.state.position.y = 0.0;
            self.state.vertical_velocity = 0.0;
            if intent.jump {
                self.state.vertical_velocity = tuning.jump_speed;
            }
        }
        self.state.vertical_velocity += tuning.gravity * dt;
        self.state.position.y = (self.state.position.y + self.state.vertical_velocity * dt).max(0.0);

        Kinematics {
            position: self.state.position,
            facing_yaw: self.state.facing_yaw,
            speed,
            stride: tuning.stride(speed),
            moving,
            grounded,
        }
    }
}

/// World-space movement direction on the XZ plane for a local input axis.
pub fn planar_direction(axis: Vec2, camera_forward: Vec3) -> Vec3 {
    if axis == Vec2::ZERO {
        return Vec3::ZERO;
    }
    let mut forward = Vec3::new(camera_forward.x, 0.0, camera_forward.z).normalize_or_zero();
    if forward == Vec3::ZERO {
        forward = Vec3::NEG_Z;
    }
    let right = forward.cross(Vec3::Y).normalize();
    (right * axis.x + forward * axis.y).normalize_or_zero()
}

/// Interpolate between two angles along the shortest arc.
pub fn lerp_angle(from: f32, to: f32, t: f32) -> f32 {
    let delta = (to - from + PI).rem_euclid(TAU) - PI;
    from + delta * t
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn stride_is_clamped() {
        let tuning = LocomotionTuning::default();
        assert_eq!(tuning.stride(0.0), 0.0);
        assert_eq!(tuning.stride(100.0), 1.0);
        assert!((tuning.stride(0.77) - 0.5).abs() < 1e-5);
    }

    #[test]
    fn tuning_fills_missing_fields_from_defaults() {
        let tuning: LocomotionTuning = serde_yaml::from_str("top_speed: 3.0\njump_speed: 4.5\n").unwrap();
        assert_eq!(tuning.top_speed, 3.0);
        assert_eq!(tuning.jump_speed, 4.5);
        assert_eq!(tuning.gravity, -12.0);
        assert_eq!(tuning.turn_rate, 4.0);
    }

    #[test]
    fn lerp_angle_takes_shortest_path() {
        let halfway = lerp_angle(PI - 0.1, -PI + 0.1, 0.5);
        assert!((halfway.sin()).abs() < 1e-4);
        assert!(halfway.cos() < 0.0);

        let backward = lerp_angle(0.1, -0.1, 1.0);
        assert!((backward + 0.1).abs() < 1e-5);

        let wrapped = lerp_angle(0.0, TAU, 0.5);
        assert!(wrapped.abs() < 1e-5);
    }

    #[test]
    fn strafe_is_relative_to_camera() {
        let right = planar_direction(Vec2::new(1.0, 0.0), Vec3::NEG_Z);
        assert!((right - Vec3::X).length() < 1e-5);

        let forward = planar_direction(Vec2::new(0.0, 1.0), Vec3::new(1.0, -0.5, 0.0));
        assert!((forward - Vec3::X).length() < 1e-5);

        let diagonal = planar_direction(Vec2::new(1.0, 1.0), Vec3::NEG_Z);
        assert!((diagonal.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn vertical_camera_falls_back_to_negative_z() {
        let forward = planar_direction(Vec2::new(0.0, 1.0), Vec3::NEG_Y);
        assert!((forward - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn velocity_does_not_overshoot_on_long_frames() {
        let mut controller = LocomotionController::default();
        let kin = controller.step(1.0, MoveIntent::FORWARD, Vec3::NEG_Z);
        assert!(kin.speed <= controller.tuning().top_speed + 1e-5);
    }

    #[test]
    fn deceleration_is_slower_than_acceleration() {
        let mut accel = LocomotionController::default();
        let first = accel.step(DT, MoveIntent::FORWARD, Vec3::NEG_Z).speed;

        let mut decel = LocomotionController::default();
        for _ in 0..240 {
            decel.step(DT, MoveIntent::FORWARD, Vec3::NEG_Z);
        }
        let top = decel.speed();
        let after = decel.step(DT, MoveIntent::NONE, Vec3::NEG_Z).speed;

        assert!(top - after < first);
    }

    #[test]
    fn facing_holds_when_stationary() {
        let mut controller = LocomotionController::default();
        for _ in 0..60 {
            controller.step(DT, MoveIntent { right: true, ..MoveIntent::NONE }, Vec3::NEG_Z);
        }
        for _ in 0..600 {
            controller.step(DT, MoveIntent::NONE, Vec3::NEG_Z);
        }
        let held = controller.state().facing_yaw;
        let kin = controller.step(DT, MoveIntent::NONE, Vec3::NEG_Z);
        assert!(!kin.moving);
        assert_eq!(kin.facing_yaw, held);
    }

    #[test]
    fn jump_leaves_and_returns_to_ground() {
        let mut controller = LocomotionController::default();
        let jump = MoveIntent {
            jump: true,
            ..MoveIntent::NONE
        };

        let takeoff = controller.step(DT, jump, Vec3::NEG_Z);
        assert!(takeoff.grounded);
        assert!(controller.state().position.y > 0.0);

        let airborne = controller.step(DT, MoveIntent::NONE, Vec3::NEG_Z);
        assert!(!airborne.grounded);

        let mut landed = false;
        for _ in 0..200 {
            let kin = controller.step(DT, MoveIntent::NONE, Vec3::NEG_Z);
            assert!(kin.position.y >= 0.0);
            if kin.grounded {
                landed = true;
                break;
            }
        }
        assert!(landed);
    }
}
