//! Camera fitting for arbitrary meshes.
//!
//! The preview camera sits on a fixed orbit (azimuth + elevation) and backs
//! away from the mesh until its whole bounding sphere fits inside both the
//! vertical and horizontal field of view, so framing never clips a mesh
//! regardless of its extent or position in model space.

use crate::config::RenderConfig;
use crate::mesh::Bounds;
use glam::{Mat4, Vec3};

/// Fallback bounding radius for degenerate (zero extent) meshes.
const MIN_RADIUS: f32 = 0.5;

/// A camera fitted around a bounding volume.
#[derive(Debug, Clone, Copy)]
pub struct CameraFit {
    /// Camera position in model space.
    pub eye: Vec3,
    /// Look-at target (the bounds center).
    pub target: Vec3,
    /// Near clip plane distance.
    pub near: f32,
    /// Far clip plane distance.
    pub far: f32,
}

impl CameraFit {
    /// Combined projection * view matrix for this fit.
    pub fn view_projection(&self, config: &RenderConfig) -> Mat4 {
        let view = Mat4::look_at_rh(self.eye, self.target, Vec3::Y);
        let proj = Mat4::perspective_rh(config.vfov, config.aspect(), self.near, self.far);
        proj * view
    }
}

/// Place the camera so the bounding sphere of `bounds` fills the frame.
///
/// The sphere fits once the eye distance reaches `radius / sin(fov / 2)` for
/// the tighter of the two view angles; `fit_margin` backs off a little
/// further so silhouettes do not touch the image border. Zero-extent bounds
/// get a fallback radius instead of a degenerate camera.
pub fn frame_bounds(bounds: &Bounds, config: &RenderConfig) -> CameraFit {
    let target = bounds.center();
    let radius = bounds.half_diagonal().max(MIN_RADIUS);

    // Horizontal FOV from the vertical one and the aspect ratio.
    let hfov = 2.0 * ((config.vfov * 0.5).tan() * config.aspect()).atan();
    let half_fit = config.vfov.min(hfov) * 0.5;
    let distance = radius * config.fit_margin.max(1.0) / half_fit.sin();

    // Keep the orbit away from the poles so Vec3::Y stays a valid up vector.
    let elevation = config.elevation.clamp(-1.4, 1.4);
    let dir = Vec3::new(
        elevation.cos() * config.azimuth.cos(),
        elevation.sin(),
        elevation.cos() * config.azimuth.sin(),
    );

    CameraFit {
        eye: target + dir * distance,
        target,
        near: (distance - radius * 1.05).max(distance * 1e-3),
        far: distance + radius * 1.05,
    }
}
