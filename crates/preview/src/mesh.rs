//! Indexed triangle mesh shared by the decoders and the rasterizer.

use glam::Vec3;

/// Triangle mesh in model space.
///
/// Both decoders normalize into this shape so the rest of the pipeline never
/// touches parser-specific types.
#[derive(Debug, Clone, Default)]
pub struct TriMesh {
    /// Vertex positions.
    pub positions: Vec<Vec3>,
    /// Triangles as index triples into `positions`.
    pub faces: Vec<[u32; 3]>,
}

impl TriMesh {
    /// True when there is nothing to draw: no vertices or no faces.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.faces.is_empty()
    }

    /// Axis-aligned bounds over all vertex positions.
    ///
    /// `None` for a mesh with no vertices.
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(&self.positions)
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    /// Bounds over a point set. `None` when the set is empty.
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let first = *points.first()?;
        let mut bounds = Bounds {
            min: first,
            max: first,
        };
        for p in &points[1..] {
            bounds.min = bounds.min.min(*p);
            bounds.max = bounds.max.max(*p);
        }
        Some(bounds)
    }

    /// Geometric center of the box.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Radius of the sphere through the box corners, centered on `center()`.
    pub fn half_diagonal(&self) -> f32 {
        (self.max - self.min).length() * 0.5
    }

    /// The eight corner points of the box.
    pub fn corners(&self) -> [Vec3; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Vec3::new(lo.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, lo.z),
            Vec3::new(lo.x, hi.y, lo.z),
            Vec3::new(hi.x, hi.y, lo.z),
            Vec3::new(lo.x, lo.y, hi.z),
            Vec3::new(hi.x, lo.y, hi.z),
            Vec3::new(lo.x, hi.y, hi.z),
            Vec3::new(hi.x, hi.y, hi.z),
        ]
    }
}
