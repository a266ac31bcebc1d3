/// First-person player module
///
/// This module handles:
/// - The body abstraction the host provides (body.rs)
/// - Per-tick look and movement with gravity (controller.rs)

pub mod body;
pub mod controller;

pub use body::FlatGroundBody;
pub use controller::{FrameInput, LookAndMoveController};
