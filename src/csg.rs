//! Boolean union of box solids via BSP clipping.
//!
//! Port of the classic csg.js scheme: each solid becomes a list of convex
//! polygons, polygons are clipped against the other solid's BSP tree, and
//! the surviving faces form the union surface. Coplanar polygons classify
//! by normal agreement, so two boxes that share a face open into each
//! other instead of keeping a double wall between them.

use bevy::prelude::*;

use crate::level::LevelError;
use crate::solid::{MeshData, Solid};

/// Tolerance for point-vs-plane classification.
const CSG_EPSILON: f32 = 1e-5;

/// Solids thinner than this in any dimension are excluded from
/// composition (explicit degenerate-geometry policy).
pub const MIN_THICKNESS: f32 = 1e-3;

#[derive(Debug, Clone, Copy)]
struct PolyVertex {
    position: Vec3,
    normal: Vec3,
}

impl PolyVertex {
    fn flipped(self) -> Self {
        Self {
            position: self.position,
            normal: -self.normal,
        }
    }

    fn lerp(self, other: Self, t: f32) -> Self {
        Self {
            position: self.position.lerp(other.position, t),
            normal: self.normal.lerp(other.normal, t),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Plane {
    normal: Vec3,
    w: f32,
}

const COPLANAR: u8 = 0;
const FRONT: u8 = 1;
const BACK: u8 = 2;
const SPANNING: u8 = 3;

impl Plane {
    fn from_points(a: Vec3, b: Vec3, c: Vec3) -> Self {
        let normal = (b - a).cross(c - a).normalize();
        Self {
            normal,
            w: normal.dot(a),
        }
    }

    fn flip(&mut self) {
        self.normal = -self.normal;
        self.w = -self.w;
    }

    /// Split `polygon` by this plane, distributing the pieces into the
    /// four output lists (csg.js `splitPolygon`).
    fn split_polygon(
        &self,
        polygon: &Polygon,
        coplanar_front: &mut Vec<Polygon>,
        coplanar_back: &mut Vec<Polygon>,
        front: &mut Vec<Polygon>,
        back: &mut Vec<Polygon>,
    ) {
        let mut polygon_type = COPLANAR;
        let mut types = Vec::with_capacity(polygon.vertices.len());
        for vertex in &polygon.vertices {
            let t = self.normal.dot(vertex.position) - self.w;
            let vertex_type = if t < -CSG_EPSILON {
                BACK
            } else if t > CSG_EPSILON {
                FRONT
            } else {
                COPLANAR
            };
            polygon_type |= vertex_type;
            types.push(vertex_type);
        }

        match polygon_type {
            COPLANAR => {
                if self.normal.dot(polygon.plane.normal) > 0.0 {
                    coplanar_front.push(polygon.clone());
                } else {
                    coplanar_back.push(polygon.clone());
                }
            }
            FRONT => front.push(polygon.clone()),
            BACK => back.push(polygon.clone()),
            _ => {
                let mut f = Vec::new();
                let mut b = Vec::new();
                let count = polygon.vertices.len();
                for i in 0..count {
                    let j = (i + 1) % count;
                    let ti = types[i];
                    let tj = types[j];
                    let vi = polygon.vertices[i];
                    let vj = polygon.vertices[j];
                    if ti != BACK {
                        f.push(vi);
                    }
                    if ti != FRONT {
                        b.push(vi);
                    }
                    if (ti | tj) == SPANNING {
                        let denom = self.normal.dot(vj.position - vi.position);
                        let t = (self.w - self.normal.dot(vi.position)) / denom;
                        let v = vi.lerp(vj, t);
                        f.push(v);
                        b.push(v);
                    }
                }
                if f.len() >= 3 {
                    front.push(Polygon::with_plane(f, polygon.plane));
                }
                if b.len() >= 3 {
                    back.push(Polygon::with_plane(b, polygon.plane));
                }
            }
        }
    }
}

/// A convex world-space polygon lying on a shared plane.
#[derive(Debug, Clone)]
struct Polygon {
    vertices: Vec<PolyVertex>,
    plane: Plane,
}

impl Polygon {
    fn new(vertices: Vec<PolyVertex>) -> Self {
        let plane = Plane::from_points(
            vertices[0].position,
            vertices[1].position,
            vertices[2].position,
        );
        Self { vertices, plane }
    }

    /// Pieces of a split keep their parent's plane instead of rederiving
    /// it from possibly near-collinear corners.
    fn with_plane(vertices: Vec<PolyVertex>, plane: Plane) -> Self {
        Self { vertices, plane }
    }

    fn flip(&mut self) {
        self.vertices.reverse();
        for vertex in &mut self.vertices {
            *vertex = vertex.flipped();
        }
        self.plane.flip();
    }
}

/// One node of a BSP tree holding the polygons coplanar with its plane.
#[derive(Default)]
struct BspNode {
    plane: Option<Plane>,
    front: Option<Box<BspNode>>,
    back: Option<Box<BspNode>>,
    polygons: Vec<Polygon>,
}

impl BspNode {
    fn new(polygons: Vec<Polygon>) -> Self {
        let mut node = Self::default();
        node.build(polygons);
        node
    }

    /// Convert solid space to empty space and vice versa.
    fn invert(&mut self) {
        for polygon in &mut self.polygons {
            polygon.flip();
        }
        if let Some(plane) = &mut self.plane {
            plane.flip();
        }
        if let Some(front) = &mut self.front {
            front.invert();
        }
        if let Some(back) = &mut self.back {
            back.invert();
        }
        std::mem::swap(&mut self.front, &mut self.back);
    }

    /// Remove all parts of `polygons` inside this tree's solid volume.
    fn clip_polygons(&self, polygons: Vec<Polygon>) -> Vec<Polygon> {
        let Some(plane) = self.plane else {
            return polygons;
        };
        let mut coplanar_front = Vec::new();
        let mut coplanar_back = Vec::new();
        let mut front = Vec::new();
        let mut back = Vec::new();
        for polygon in &polygons {
            plane.split_polygon(
                polygon,
                &mut coplanar_front,
                &mut coplanar_back,
                &mut front,
                &mut back,
            );
        }
        front.append(&mut coplanar_front);
        back.append(&mut coplanar_back);
        let mut front = match &self.front {
            Some(node) => node.clip_polygons(front),
            None => front,
        };
        let back = match &self.back {
            Some(node) => node.clip_polygons(back),
            // No back subtree: back side is solid, polygons there vanish.
            None => Vec::new(),
        };
        front.extend(back);
        front
    }

    /// Remove all polygons of this tree inside `bsp`'s solid volume.
    fn clip_to(&mut self, bsp: &BspNode) {
        self.polygons = bsp.clip_polygons(std::mem::take(&mut self.polygons));
        if let Some(front) = &mut self.front {
            front.clip_to(bsp);
        }
        if let Some(back) = &mut self.back {
            back.clip_to(bsp);
        }
    }

    fn all_polygons(&self) -> Vec<Polygon> {
        let mut polygons = self.polygons.clone();
        if let Some(front) = &self.front {
            polygons.extend(front.all_polygons());
        }
        if let Some(back) = &self.back {
            polygons.extend(back.all_polygons());
        }
        polygons
    }

    fn build(&mut self, polygons: Vec<Polygon>) {
        if polygons.is_empty() {
            return;
        }
        if self.plane.is_none() {
            self.plane = Some(polygons[0].plane);
        }
        let Some(plane) = self.plane else {
            return;
        };
        let mut coplanar_front = Vec::new();
        let mut coplanar_back = Vec::new();
        let mut front = Vec::new();
        let mut back = Vec::new();
        for polygon in &polygons {
            plane.split_polygon(
                polygon,
                &mut coplanar_front,
                &mut coplanar_back,
                &mut front,
                &mut back,
            );
        }
        self.polygons.append(&mut coplanar_front);
        self.polygons.append(&mut coplanar_back);
        if !front.is_empty() {
            self.front
                .get_or_insert_with(Default::default)
                .build(front);
        }
        if !back.is_empty() {
            self.back.get_or_insert_with(Default::default).build(back);
        }
    }
}

fn solid_polygons(solid: &Solid) -> Vec<Polygon> {
    solid
        .quads()
        .into_iter()
        .map(|quad| {
            Polygon::new(
                quad.corners
                    .iter()
                    .map(|&position| PolyVertex {
                        position,
                        normal: quad.normal,
                    })
                    .collect(),
            )
        })
        .collect()
}

/// `A ∪ B` on polygon soups (csg.js `union`).
fn union(a: Vec<Polygon>, b: Vec<Polygon>) -> Vec<Polygon> {
    let mut a = BspNode::new(a);
    let mut b = BspNode::new(b);
    a.clip_to(&b);
    b.clip_to(&a);
    b.invert();
    b.clip_to(&a);
    b.invert();
    a.build(b.all_polygons());
    a.all_polygons()
}

fn polygons_to_mesh(polygons: &[Polygon]) -> MeshData {
    let mut mesh = MeshData::default();
    for polygon in polygons {
        // Fan triangulation; polygons stay convex through clipping.
        let indices: Vec<u32> = polygon
            .vertices
            .iter()
            .map(|v| mesh.push_vertex(v.position, v.normal))
            .collect();
        for i in 1..indices.len() - 1 {
            mesh.indices
                .extend([indices[0], indices[i], indices[i + 1]]);
        }
    }
    mesh
}

/// Compose the union of `solids` as a fixed left-to-right fold:
/// `(A ∪ B) ∪ C …`. The fold order is part of the contract — union is
/// commutative in volume but not in triangulation, and downstream tests
/// rely on a stable result.
///
/// Solids thinner than [`MIN_THICKNESS`] are skipped with a warning; if
/// nothing remains the composition fails with `DegenerateGeometry`.
pub fn compose(solids: &[&Solid]) -> Result<MeshData, LevelError> {
    let mut inputs = solids.iter().filter(|solid| {
        if solid.min_dimension() < MIN_THICKNESS {
            warn!(
                "[Spacewalk] skipping degenerate solid '{}' ({} thick)",
                solid.label,
                solid.min_dimension()
            );
            false
        } else {
            true
        }
    });

    let Some(first) = inputs.next() else {
        return Err(LevelError::DegenerateGeometry(
            "composition has no usable input solids".into(),
        ));
    };

    let mut result = solid_polygons(first);
    for solid in inputs {
        result = union(result, solid_polygons(solid));
    }
    Ok(polygons_to_mesh(&result))
}
