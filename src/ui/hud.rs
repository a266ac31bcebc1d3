//! Keyboard/pointer sampling for the first-person controller, and the
//! one-line pose readout under the wall

use cgmath::{Deg, Quaternion, Rotation, Rotation3, Vector2, Vector3, Zero};
use iced::keyboard::Key;
use iced::Point;

use crate::player::{FlatGroundBody, FrameInput, LookAndMoveController};

/// Pointer pixels to look units (a mouse axis reports ~0.1 per pixel)
const POINTER_SCALE: f32 = 0.1;

/// Input accumulated between two ticks
#[derive(Debug, Clone)]
pub struct InputState {
    forward: bool,
    back: bool,
    left: bool,
    right: bool,
    last_cursor: Option<Point>,
    look: Vector2<f32>,
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            forward: false,
            back: false,
            left: false,
            right: false,
            last_cursor: None,
            look: Vector2::zero(),
        }
    }
}

impl InputState {
    /// Track WASD / arrow keys; other keys are ignored
    pub fn key_changed(&mut self, key: &Key, pressed: bool) {
        use iced::keyboard::key::Named;

        let slot = match key.as_ref() {
            Key::Character("w") | Key::Character("W") | Key::Named(Named::ArrowUp) => {
                &mut self.forward
            }
            Key::Character("s") | Key::Character("S") | Key::Named(Named::ArrowDown) => {
                &mut self.back
            }
            Key::Character("a") | Key::Character("A") | Key::Named(Named::ArrowLeft) => {
                &mut self.left
            }
            Key::Character("d") | Key::Character("D") | Key::Named(Named::ArrowRight) => {
                &mut self.right
            }
            _ => return,
        };
        *slot = pressed;
    }

    /// Accumulate pointer movement; screen y grows downward, look y grows up
    pub fn cursor_moved(&mut self, position: Point) {
        if let Some(last) = self.last_cursor {
            self.look.x += (position.x - last.x) * POINTER_SCALE;
            self.look.y -= (position.y - last.y) * POINTER_SCALE;
        }
        self.last_cursor = Some(position);
    }

    /// Input for the next tick; pointer movement is consumed, keys stay held
    pub fn take_frame(&mut self) -> FrameInput {
        let axis = |positive: bool, negative: bool| match (positive, negative) {
            (true, false) => 1.0,
            (false, true) => -1.0,
            _ => 0.0,
        };

        let frame = FrameInput {
            look_delta: self.look,
            move_axis: Vector2::new(axis(self.right, self.left), axis(self.forward, self.back)),
        };
        self.look = Vector2::zero();
        frame
    }
}

/// World-space view direction: body yaw, then the camera's pitch
///
/// Yaw turns clockwise seen from above, so it is a negative turn about +y.
pub fn gaze(controller: &LookAndMoveController, body: &FlatGroundBody) -> Vector3<f32> {
    let yaw = Quaternion::from_angle_y(Deg(-body.yaw().0));
    (yaw * controller.camera_rotation()).rotate_vector(-Vector3::unit_z())
}

/// Pose readout, e.g. "pos (0.0, 0.0, -3.2)  yaw 45°  pitch -10°  vy -2.33  gaze (...)"
pub fn describe(controller: &LookAndMoveController, body: &FlatGroundBody) -> String {
    let position = body.position();
    // + 0.0 turns -0.0 into 0.0 for display
    let gaze = gaze(controller, body).map(|c| c + 0.0);
    format!(
        "pos ({:.1}, {:.1}, {:.1})  yaw {:.0}°  pitch {:.0}°  vy {:.2}  gaze ({:.2}, {:.2}, {:.2})",
        position.x,
        position.y,
        position.z,
        body.yaw().0.rem_euclid(360.0),
        controller.pitch().0,
        controller.vertical_velocity(),
        gaze.x,
        gaze.y,
        gaze.z
    )
}
