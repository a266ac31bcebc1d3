//! First-person look and move controller
//!
//! Runs once per tick: pointer delta turns the body (yaw) and tilts the
//! camera (pitch), directional input moves the body in its own basis, and a
//! vertical velocity handles gravity. Collision is the body's business.

use cgmath::{Deg, Euler, Quaternion, Vector2, Vector3};

use super::body::CharacterBody;

/// Camera pitch limit in either direction
pub const PITCH_LIMIT: Deg<f32> = Deg(90.0);

/// Vertical velocity while standing on the ground; keeps the body pressed
/// down so the grounded check stays true
pub const GROUNDED_VELOCITY: f32 = -2.0;

/// Input sampled for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInput {
    /// Pointer movement since the last tick
    pub look_delta: Vector2<f32>,
    /// x = strafe (right positive), y = forward/back (forward positive)
    pub move_axis: Vector2<f32>,
}

impl Default for FrameInput {
    fn default() -> Self {
        Self {
            look_delta: Vector2::new(0.0, 0.0),
            move_axis: Vector2::new(0.0, 0.0),
        }
    }
}

/// Tunables, defaults match a 1:1 scale human-sized player
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerSettings {
    pub mouse_sensitivity: f32,
    /// Horizontal speed in units per second
    pub move_speed: f32,
    /// Downward acceleration in units per second squared (negative)
    pub gravity: f32,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            mouse_sensitivity: 100.0,
            move_speed: 12.0,
            gravity: -19.62,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LookAndMoveController {
    settings: ControllerSettings,
    pitch: Deg<f32>,
    velocity: Vector3<f32>,
}

impl LookAndMoveController {
    pub fn new(settings: ControllerSettings) -> Self {
        Self {
            settings,
            pitch: Deg(0.0),
            velocity: Vector3::new(0.0, 0.0, 0.0),
        }
    }

    /// Current camera pitch, always within [-90°, 90°]
    pub fn pitch(&self) -> Deg<f32> {
        self.pitch
    }

    pub fn vertical_velocity(&self) -> f32 {
        self.velocity.y
    }

    /// Local rotation for the camera attached to the body
    pub fn camera_rotation(&self) -> Quaternion<f32> {
        Quaternion::from(Euler::new(self.pitch, Deg(0.0), Deg(0.0)))
    }

    /// Advance one tick of `dt` seconds
    pub fn tick<B: CharacterBody>(&mut self, body: &mut B, input: FrameInput, dt: f32) {
        self.look(body, input.look_delta, dt);
        self.walk(body, input.move_axis, dt);
        self.fall(body, dt);
    }

    fn look<B: CharacterBody>(&mut self, body: &mut B, delta: Vector2<f32>, dt: f32) {
        let scale = self.settings.mouse_sensitivity * dt;

        let pitch = self.pitch.0 - delta.y * scale;
        self.pitch = Deg(pitch.clamp(-PITCH_LIMIT.0, PITCH_LIMIT.0));

        body.rotate_yaw(Deg(delta.x * scale));
    }

    fn walk<B: CharacterBody>(&mut self, body: &mut B, axis: Vector2<f32>, dt: f32) {
        let direction = body.right() * axis.x + body.forward() * axis.y;
        body.move_by(direction * (self.settings.move_speed * dt));
    }

    fn fall<B: CharacterBody>(&mut self, body: &mut B, dt: f32) {
        if body.is_grounded() && self.velocity.y <= 0.0 {
            self.velocity.y = GROUNDED_VELOCITY;
        }

        self.velocity.y += self.settings.gravity * dt;
        body.move_by(self.velocity * dt);
    }
}

impl Default for LookAndMoveController {
    fn default() -> Self {
        Self::new(ControllerSettings::default())
    }
}
