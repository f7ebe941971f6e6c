//! Default shading values for preview rendering.
//!
//! One directional light plus an ambient floor. Every preview is shaded
//! with the same defaults so output looks consistent across requests and
//! formats; [`crate::RenderConfig`] carries them and callers may override.

use glam::Vec3;

/// Light direction, normalized(0.5, 1.0, 0.3): above, right, and slightly
/// toward the camera.
pub const LIGHT_DIR: Vec3 = Vec3::new(0.431934, 0.863868, 0.259161);

/// Ambient floor so faces turned away from the light stay visible.
pub const AMBIENT: f32 = 0.3;

/// Diffuse strength, applied to the Lambert term before adding ambient.
pub const DIFFUSE_STRENGTH: f32 = 0.7;

/// Surface color before shading; STL and OBJ inputs carry no usable
/// material color, so everything renders in this neutral gray.
pub const SURFACE_COLOR: Vec3 = Vec3::new(0.78, 0.80, 0.84);

/// Bluish-gray fill for pixels no triangle covers.
pub const BACKGROUND_COLOR: Vec3 = Vec3::new(0.4, 0.5, 0.6);
