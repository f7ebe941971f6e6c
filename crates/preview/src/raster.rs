//! Z-buffered software rasterizer.
//!
//! Projects the mesh through a camera fitted to its bounds, then fills
//! triangles with an edge-function coverage test at pixel centers,
//! interpolating depth barycentrically. Shading is flat two-sided Lambert:
//! uploads arrive with either winding convention, so back faces take the
//! same light as front faces.

use crate::config::RenderConfig;
use crate::framing::frame_bounds;
use crate::mesh::TriMesh;
use glam::{Vec2, Vec3};
use image::{Rgba, RgbaImage};

/// Screen-space vertex: pixel position plus normalized depth.
#[derive(Debug, Clone, Copy)]
struct ScreenVertex {
    pos: Vec2,
    depth: f32,
    visible: bool,
}

/// Render the mesh into a fresh RGBA buffer.
///
/// A mesh without geometry (or one whose faces are all degenerate) produces
/// the plain background image rather than an error.
pub fn rasterize(mesh: &TriMesh, config: &RenderConfig) -> RgbaImage {
    let background = to_rgba(config.background);
    let mut image = RgbaImage::from_pixel(config.width, config.height, background);

    let bounds = match mesh.bounds() {
        Some(b) => b,
        None => return image,
    };
    if mesh.faces.is_empty() {
        return image;
    }

    let fit = frame_bounds(&bounds, config);
    let mvp = fit.view_projection(config);

    let half_w = config.width as f32 * 0.5;
    let half_h = config.height as f32 * 0.5;
    let screen: Vec<ScreenVertex> = mesh
        .positions
        .iter()
        .map(|p| {
            let clip = mvp * p.extend(1.0);
            if clip.w <= 0.0 {
                return ScreenVertex {
                    pos: Vec2::ZERO,
                    depth: 0.0,
                    visible: false,
                };
            }
            let ndc = clip.truncate() / clip.w;
            ScreenVertex {
                // NDC y points up, pixel y points down.
                pos: Vec2::new((ndc.x + 1.0) * half_w, (1.0 - ndc.y) * half_h),
                depth: ndc.z,
                visible: true,
            }
        })
        .collect();

    let light = config.light_dir.normalize_or_zero();
    let mut depth_buffer = vec![f32::INFINITY; (config.width * config.height) as usize];

    for face in &mesh.faces {
        let idx = [face[0] as usize, face[1] as usize, face[2] as usize];
        if idx.iter().any(|&i| i >= screen.len()) {
            continue;
        }
        let verts = [screen[idx[0]], screen[idx[1]], screen[idx[2]]];
        if verts.iter().any(|v| !v.visible) {
            continue;
        }

        let (a, b, c) = (
            mesh.positions[idx[0]],
            mesh.positions[idx[1]],
            mesh.positions[idx[2]],
        );
        let normal = (b - a).cross(c - a);
        if normal.length_squared() < 1e-12 {
            continue;
        }

        // Two-sided shading, indifferent to winding.
        let lambert = normal.normalize().dot(light).abs();
        let intensity = (config.ambient + config.diffuse * lambert).clamp(0.0, 1.0);
        let color = to_rgba(config.surface_color * intensity);

        fill_triangle(&mut image, &mut depth_buffer, verts, color);
    }

    image
}

fn fill_triangle(
    image: &mut RgbaImage,
    depth_buffer: &mut [f32],
    verts: [ScreenVertex; 3],
    color: Rgba<u8>,
) {
    let width = image.width() as i32;
    let height = image.height() as i32;
    let pts = [verts[0].pos, verts[1].pos, verts[2].pos];

    let min_x = pts
        .iter()
        .fold(f32::INFINITY, |acc, p| acc.min(p.x))
        .floor()
        .max(0.0) as i32;
    let max_x = pts
        .iter()
        .fold(f32::NEG_INFINITY, |acc, p| acc.max(p.x))
        .ceil()
        .min((width - 1) as f32) as i32;
    let min_y = pts
        .iter()
        .fold(f32::INFINITY, |acc, p| acc.min(p.y))
        .floor()
        .max(0.0) as i32;
    let max_y = pts
        .iter()
        .fold(f32::NEG_INFINITY, |acc, p| acc.max(p.y))
        .ceil()
        .min((height - 1) as f32) as i32;

    if min_x > max_x || min_y > max_y {
        return;
    }

    let area = edge(pts[0], pts[1], pts[2]);
    if area.abs() < 1e-6 {
        return;
    }
    let inv_area = 1.0 / area;

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let w0 = edge(pts[1], pts[2], p);
            let w1 = edge(pts[2], pts[0], p);
            let w2 = edge(pts[0], pts[1], p);

            // Inside for either winding: all weights share a sign.
            let same_sign = (w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0)
                || (w0 <= 0.0 && w1 <= 0.0 && w2 <= 0.0);
            if !same_sign {
                continue;
            }

            let depth =
                (w0 * verts[0].depth + w1 * verts[1].depth + w2 * verts[2].depth) * inv_area;
            let buf_idx = (y * width + x) as usize;
            if depth < depth_buffer[buf_idx] {
                depth_buffer[buf_idx] = depth;
                image.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}

/// Signed doubled area of the triangle (a, b, p).
fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (p.x - a.x) * (b.y - a.y) - (p.y - a.y) * (b.x - a.x)
}

/// Linear color to bytes with gamma 2.2, fully opaque.
fn to_rgba(linear: Vec3) -> Rgba<u8> {
    let c = linear.clamp(Vec3::ZERO, Vec3::ONE);
    Rgba([
        (c.x.powf(1.0 / 2.2) * 255.0) as u8,
        (c.y.powf(1.0 / 2.2) * 255.0) as u8,
        (c.z.powf(1.0 / 2.2) * 255.0) as u8,
        255,
    ])
}
