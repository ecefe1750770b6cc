//! Probe-ray collision test. A point probe, not a swept volume: per-tick
//! displacement is bounded to one unit, so checking the nearest surface
//! along the movement ray against a fixed clearance is enough.

use bevy::prelude::*;

/// Hits closer than the ray origin by this much are the surface the
/// viewer is already touching; ignore them.
const RAY_EPSILON: f32 = 1e-4;

/// Minimum distance to the nearest surface before a move is refused.
pub const PROBE_CLEARANCE: f32 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    pub distance: f32,
    pub point: Vec3,
}

/// Möller–Trumbore ray/triangle intersection; returns the hit distance
/// along the (unit) ray direction.
pub fn ray_triangle_distance(origin: Vec3, dir: Vec3, v0: Vec3, v1: Vec3, v2: Vec3) -> Option<f32> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = dir.cross(edge2);
    let a = edge1.dot(h);

    // Ray parallel to the triangle plane.
    if a.abs() < 1e-7 {
        return None;
    }

    let f = 1.0 / a;
    let s = origin - v0;
    let u = f * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = f * dir.dot(q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(q);
    (t > RAY_EPSILON).then_some(t)
}

/// Nearest intersection of the ray with any triangle in the soup.
pub fn nearest_hit(
    origin: Vec3,
    direction: Vec3,
    triangles: impl IntoIterator<Item = [Vec3; 3]>,
) -> Option<RayHit> {
    let len = direction.length();
    if len <= 1e-4 {
        return None;
    }
    let dir = direction / len;
    let mut nearest: Option<f32> = None;
    for [v0, v1, v2] in triangles {
        if let Some(distance) = ray_triangle_distance(origin, dir, v0, v1, v2) {
            if nearest.map_or(true, |best| distance < best) {
                nearest = Some(distance);
            }
        }
    }
    nearest.map(|distance| RayHit {
        distance,
        point: origin + dir * distance,
    })
}

/// Would moving from `from` toward `to` run into level geometry? Blocked
/// when the nearest surface along the movement ray sits within
/// `clearance`; an unobstructed ray is free.
pub fn would_collide(
    from: Vec3,
    to: Vec3,
    triangles: impl IntoIterator<Item = [Vec3; 3]>,
    clearance: f32,
) -> bool {
    match nearest_hit(from, to - from, triangles) {
        Some(hit) => hit.distance <= clearance,
        None => false,
    }
}
