use bevy::prelude::*;
use bevy::render::mesh::{Indices, Mesh, PrimitiveTopology};
use bevy::render::render_asset::RenderAssetUsages;

/// Stable arena key for every solid in the level. Display names are labels
/// only; all runtime resolution goes through this key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolidKey {
    GalleryA,
    GalleryB,
    Tunnel,
    Door,
}

impl SolidKey {
    pub const COUNT: usize = 4;

    pub fn index(self) -> usize {
        self as usize
    }
}

/// An axis-aligned box volume with a pose and a display label.
///
/// Geometry (size, tessellation) is fixed at construction; only the pose
/// moves (the door panel slides up when opened).
#[derive(Debug, Clone)]
pub struct Solid {
    pub key: SolidKey,
    pub label: &'static str,
    size: Vec3,
    segments: u32,
    pub position: Vec3,
}

/// A world-space quad face cell with its outward normal, the unit the
/// composer consumes.
#[derive(Debug, Clone, Copy)]
pub struct Quad {
    pub corners: [Vec3; 4],
    pub normal: Vec3,
}

impl Solid {
    pub fn new(key: SolidKey, label: &'static str, size: Vec3, segments: u32, position: Vec3) -> Self {
        Self {
            key,
            label,
            size,
            segments: segments.max(1),
            position,
        }
    }

    pub fn height(&self) -> f32 {
        self.size.y
    }

    pub fn min_dimension(&self) -> f32 {
        self.size.x.min(self.size.y).min(self.size.z)
    }

    /// All tessellated face cells in world space, wound counter-clockwise
    /// as seen from outside the box.
    pub fn quads(&self) -> Vec<Quad> {
        let h = self.size * 0.5;
        let p = self.position;
        // Per face: origin corner, full edge vectors u and v with u × v
        // pointing along the outward normal.
        let faces = [
            // +X
            (
                p + Vec3::new(h.x, -h.y, h.z),
                Vec3::new(0.0, 0.0, -self.size.z),
                Vec3::new(0.0, self.size.y, 0.0),
                Vec3::X,
            ),
            // -X
            (
                p + Vec3::new(-h.x, -h.y, -h.z),
                Vec3::new(0.0, 0.0, self.size.z),
                Vec3::new(0.0, self.size.y, 0.0),
                Vec3::NEG_X,
            ),
            // +Y
            (
                p + Vec3::new(-h.x, h.y, -h.z),
                Vec3::new(0.0, 0.0, self.size.z),
                Vec3::new(self.size.x, 0.0, 0.0),
                Vec3::Y,
            ),
            // -Y
            (
                p + Vec3::new(-h.x, -h.y, -h.z),
                Vec3::new(self.size.x, 0.0, 0.0),
                Vec3::new(0.0, 0.0, self.size.z),
                Vec3::NEG_Y,
            ),
            // +Z
            (
                p + Vec3::new(-h.x, -h.y, h.z),
                Vec3::new(self.size.x, 0.0, 0.0),
                Vec3::new(0.0, self.size.y, 0.0),
                Vec3::Z,
            ),
            // -Z
            (
                p + Vec3::new(-h.x, -h.y, -h.z),
                Vec3::new(0.0, self.size.y, 0.0),
                Vec3::new(self.size.x, 0.0, 0.0),
                Vec3::NEG_Z,
            ),
        ];

        let s = self.segments;
        let inv = 1.0 / s as f32;
        let mut quads = Vec::with_capacity(6 * (s * s) as usize);
        for (origin, u, v, normal) in faces {
            let du = u * inv;
            let dv = v * inv;
            for i in 0..s {
                for j in 0..s {
                    let c0 = origin + du * i as f32 + dv * j as f32;
                    quads.push(Quad {
                        corners: [c0, c0 + du, c0 + du + dv, c0 + dv],
                        normal,
                    });
                }
            }
        }
        quads
    }

    /// Triangulated world-space surface of this solid alone.
    pub fn mesh_data(&self) -> MeshData {
        let mut mesh = MeshData::default();
        for quad in self.quads() {
            let [a, b, c, d] = quad.corners;
            mesh.push_triangle(a, b, c, quad.normal);
            mesh.push_triangle(a, c, d, quad.normal);
        }
        mesh
    }
}

/// Derived triangle-soup output of a composition (or of a lone solid).
/// Never edited in place; always replaced wholesale by recomposition.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn push_triangle(&mut self, a: Vec3, b: Vec3, c: Vec3, normal: Vec3) {
        let base = self.positions.len() as u32;
        self.positions
            .extend([a.to_array(), b.to_array(), c.to_array()]);
        self.normals.extend([normal.to_array(); 3]);
        self.indices.extend([base, base + 1, base + 2]);
    }

    pub fn push_vertex(&mut self, position: Vec3, normal: Vec3) -> u32 {
        let index = self.positions.len() as u32;
        self.positions.push(position.to_array());
        self.normals.push(normal.to_array());
        index
    }

    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                Vec3::from_array(self.positions[tri[0] as usize]),
                Vec3::from_array(self.positions[tri[1] as usize]),
                Vec3::from_array(self.positions[tri[2] as usize]),
            ]
        })
    }

    pub fn to_render_mesh(&self) -> Mesh {
        Mesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::default(),
        )
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, self.positions.clone())
        .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, self.normals.clone())
        .with_inserted_indices(Indices::U32(self.indices.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box(segments: u32) -> Solid {
        Solid::new(
            SolidKey::GalleryA,
            "box",
            Vec3::splat(2.0),
            segments,
            Vec3::ZERO,
        )
    }

    #[test]
    fn box_tessellation_counts() {
        let solid = unit_box(4);
        assert_eq!(solid.quads().len(), 6 * 16);
        let mesh = solid.mesh_data();
        assert_eq!(mesh.triangle_count(), 12 * 16);
        assert_eq!(mesh.vertex_count(), mesh.triangle_count() * 3);
    }

    #[test]
    fn quads_wind_outward() {
        for quad in unit_box(1).quads() {
            let [a, b, c, _] = quad.corners;
            let face_normal = (b - a).cross(c - a).normalize();
            assert!(face_normal.dot(quad.normal) > 0.99);
        }
    }

    #[test]
    fn mesh_is_offset_by_pose() {
        let solid = Solid::new(
            SolidKey::Tunnel,
            "offset",
            Vec3::splat(2.0),
            1,
            Vec3::new(0.0, 0.0, -10.0),
        );
        for [a, b, c] in solid.mesh_data().triangles() {
            for v in [a, b, c] {
                assert!(v.z <= -9.0 && v.z >= -11.0, "vertex {v} outside box");
            }
        }
    }

    #[test]
    fn segments_are_clamped_to_at_least_one() {
        let solid = Solid::new(SolidKey::Door, "flat", Vec3::splat(1.0), 0, Vec3::ZERO);
        assert_eq!(solid.quads().len(), 6);
    }
}
