use cgmath::{Angle, Deg, Vector3};

/// The physically simulated body a controller drives
///
/// The host owns collision: `move_by` is the collision-aware displacement
/// primitive and `is_grounded` reports what the last moves ran into.
pub trait CharacterBody {
    fn is_grounded(&self) -> bool;
    fn move_by(&mut self, displacement: Vector3<f32>);
    /// Rotate about the vertical axis; positive turns right
    fn rotate_yaw(&mut self, delta: Deg<f32>);
    /// Unit right vector in world space
    fn right(&self) -> Vector3<f32>;
    /// Unit forward vector in world space
    fn forward(&self) -> Vector3<f32>;
}

/// A body on an infinite flat floor at y = 0
///
/// Y is up and yaw 0 faces -Z. Anything pushed below the floor is put back
/// on it.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatGroundBody {
    position: Vector3<f32>,
    yaw: Deg<f32>,
}

impl FlatGroundBody {
    pub fn at(position: Vector3<f32>) -> Self {
        Self {
            position,
            yaw: Deg(0.0),
        }
    }

    pub fn position(&self) -> Vector3<f32> {
        self.position
    }

    /// Accumulated yaw; not wrapped
    pub fn yaw(&self) -> Deg<f32> {
        self.yaw
    }
}

impl Default for FlatGroundBody {
    fn default() -> Self {
        Self::at(Vector3::new(0.0, 0.0, 0.0))
    }
}

impl CharacterBody for FlatGroundBody {
    fn is_grounded(&self) -> bool {
        self.position.y <= 0.0
    }

    fn move_by(&mut self, displacement: Vector3<f32>) {
        self.position += displacement;
        if self.position.y < 0.0 {
            self.position.y = 0.0;
        }
    }

    fn rotate_yaw(&mut self, delta: Deg<f32>) {
        self.yaw += delta;
    }

    fn right(&self) -> Vector3<f32> {
        let (sin, cos) = self.yaw.sin_cos();
        Vector3::new(cos, 0.0, sin)
    }

    fn forward(&self) -> Vector3<f32> {
        let (sin, cos) = self.yaw.sin_cos();
        Vector3::new(sin, 0.0, -cos)
    }
}
