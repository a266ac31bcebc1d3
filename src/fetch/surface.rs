//! Target surfaces: anything whose displayed image can be swapped at runtime

use image::RgbaImage;

/// A decoded photo ready to be shown on a surface
#[derive(Debug, Clone)]
pub struct SurfaceImage {
    /// Provider id of the photo this came from
    pub photo_id: String,
    /// Description / photographer credit
    pub caption: String,
    pub image: RgbaImage,
}

/// A renderable surface owned by the host scene
///
/// The pipeline holds these only weakly and writes each one from exactly
/// one download task, so implementations need interior mutability but no
/// cross-task coordination.
pub trait TargetSurface: Send + Sync {
    /// Human-readable name for log lines
    fn name(&self) -> String;

    /// Replace whatever the surface is currently showing
    fn replace_image(&self, image: SurfaceImage);
}
