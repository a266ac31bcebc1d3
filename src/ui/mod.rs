/// User interface module
///
/// This module handles:
/// - Photo tiles and the surfaces the fetch pipeline paints onto (tile.rs)
/// - Controller input sampling and the pose readout (hud.rs)

pub mod hud;
pub mod tile;
