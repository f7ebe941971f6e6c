//! Render configuration.

use crate::lighting;
use glam::Vec3;

/// Default output width and height in pixels (previews are square by default).
pub const DEFAULT_RESOLUTION: u32 = 600;

/// Parameters controlling output size, framing, and shading.
///
/// `Default` yields the service defaults: a 600x600 image from a 45-degree
/// orbit, 30 degrees above the horizon.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Output image width in pixels.
    pub width: u32,
    /// Output image height in pixels.
    pub height: u32,
    /// Vertical field of view in radians.
    pub vfov: f32,
    /// Camera orbit angle around the vertical axis, in radians.
    pub azimuth: f32,
    /// Camera elevation above the horizontal plane, in radians.
    pub elevation: f32,
    /// Headroom multiplier on the fitted camera distance (1.0 = exact fit).
    pub fit_margin: f32,
    /// Directional light, normalized.
    pub light_dir: Vec3,
    /// Ambient lighting term.
    pub ambient: f32,
    /// Diffuse lighting strength.
    pub diffuse: f32,
    /// Untextured surface color before shading.
    pub surface_color: Vec3,
    /// Background color for pixels no triangle covers.
    pub background: Vec3,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_RESOLUTION,
            height: DEFAULT_RESOLUTION,
            vfov: 45.0_f32.to_radians(),
            azimuth: 45.0_f32.to_radians(),
            elevation: 30.0_f32.to_radians(),
            fit_margin: 1.1,
            light_dir: lighting::LIGHT_DIR,
            ambient: lighting::AMBIENT,
            diffuse: lighting::DIFFUSE_STRENGTH,
            surface_color: lighting::SURFACE_COLOR,
            background: lighting::BACKGROUND_COLOR,
        }
    }
}

impl RenderConfig {
    /// Default configuration with an explicit output size.
    pub fn with_resolution(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Width over height.
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}
