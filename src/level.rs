//! Level registry: the arena of solids plus the renderable set the scene
//! sync draws from. At most one composite mesh exists at a time; swapping
//! it in is a single registry mutation, so the renderer only ever observes
//! the level before or after a recomposition, never in between.

use bevy::prelude::*;
use thiserror::Error;

use crate::solid::{MeshData, Solid, SolidKey};

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("solid '{0}' is already registered")]
    DuplicateName(&'static str),
    #[error("no solid registered for '{0:?}'")]
    NotFound(SolidKey),
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),
}

/// Fixed level constants (see `build_level`).
pub const GALLERY_SIZE: f32 = 30.0;
pub const TESSELLATION: u32 = 8;
pub const GALLERY_B_DEPTH: f32 = -65.0;
pub const TUNNEL_DEPTH: f32 = -35.0;
pub const DOOR_PANEL_DEPTH: f32 = -14.95;
/// The step-grid coordinate the closed door refuses to let the viewer
/// land on. Kept as an explicit rule alongside the ray probe.
pub const DOOR_BLOCKING_DEPTH: f32 = -15.0;

pub struct LevelRegistry {
    solids: Vec<Option<Solid>>,
    renderable: Vec<SolidKey>,
    composite: Option<MeshData>,
    /// Quarter turns of the composite about the vertical axis.
    composite_yaw: i32,
    revision: u64,
}

impl Default for LevelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl LevelRegistry {
    pub fn new() -> Self {
        Self {
            solids: (0..SolidKey::COUNT).map(|_| None).collect(),
            renderable: Vec::new(),
            composite: None,
            composite_yaw: 0,
            revision: 0,
        }
    }

    /// Register a solid under its key. `renderable` controls whether the
    /// scene draws its individual mesh.
    pub fn register(&mut self, solid: Solid, renderable: bool) -> Result<(), LevelError> {
        let slot = &mut self.solids[solid.key.index()];
        if slot.is_some() {
            return Err(LevelError::DuplicateName(solid.label));
        }
        if renderable {
            self.renderable.push(solid.key);
        }
        *slot = Some(solid);
        self.revision += 1;
        Ok(())
    }

    pub fn lookup(&self, key: SolidKey) -> Result<&Solid, LevelError> {
        self.solids[key.index()]
            .as_ref()
            .ok_or(LevelError::NotFound(key))
    }

    pub fn lookup_mut(&mut self, key: SolidKey) -> Result<&mut Solid, LevelError> {
        self.solids[key.index()]
            .as_mut()
            .ok_or(LevelError::NotFound(key))
    }

    /// Detach a solid from the renderable set. Its data stays in the
    /// arena so later compositions can still consume it.
    pub fn remove(&mut self, key: SolidKey) {
        if let Some(at) = self.renderable.iter().position(|&k| k == key) {
            self.renderable.remove(at);
            self.revision += 1;
        }
    }

    /// Atomically swap the rendered composite: the solo mesh it subsumes
    /// leaves the renderable set and the new composite takes its place in
    /// the same revision.
    pub fn replace_composite(&mut self, subsumed: SolidKey, mesh: MeshData) {
        if let Some(at) = self.renderable.iter().position(|&k| k == subsumed) {
            self.renderable.remove(at);
        }
        self.composite = Some(mesh);
        self.revision += 1;
        info!(
            "[Spacewalk] composite mesh installed (revision {})",
            self.revision
        );
    }

    /// Rotate the composite about the vertical axis by `quarter_turns`
    /// (positive is counterclockwise seen from above). A no-op until a
    /// composite exists.
    pub fn rotate_composite(&mut self, quarter_turns: i8) {
        if self.composite.is_none() {
            debug!("[Spacewalk] no composite to rotate yet");
            return;
        }
        self.composite_yaw = (self.composite_yaw + quarter_turns as i32).rem_euclid(4);
        self.revision += 1;
    }

    pub fn composite(&self) -> Option<&MeshData> {
        self.composite.as_ref()
    }

    pub fn composite_yaw_radians(&self) -> f32 {
        self.composite_yaw as f32 * std::f32::consts::FRAC_PI_2
    }

    /// Monotonic change counter; bumped on every mutation the renderer
    /// must react to.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn renderable_solids(&self) -> impl Iterator<Item = &Solid> {
        self.renderable
            .iter()
            .filter_map(|&key| self.solids[key.index()].as_ref())
    }

    pub fn is_renderable(&self, key: SolidKey) -> bool {
        self.renderable.contains(&key)
    }

    /// Every triangle the renderer currently draws, in world space. This
    /// is what the collision probe casts against.
    pub fn world_triangles(&self) -> Vec<[Vec3; 3]> {
        let mut triangles = Vec::new();
        for solid in self.renderable_solids() {
            triangles.extend(solid.mesh_data().triangles());
        }
        if let Some(composite) = &self.composite {
            let rotation = Quat::from_rotation_y(self.composite_yaw_radians());
            triangles.extend(
                composite
                    .triangles()
                    .map(|[a, b, c]| [rotation * a, rotation * b, rotation * c]),
            );
        }
        triangles
    }
}

/// Build the fixed two-room level: gallery A at the origin, gallery B
/// further down the depth axis, a connecting tunnel, and the door panel
/// sealing the tunnel mouth. Only gallery A and the door render
/// initially; the rest joins the scene as part of the opened composite.
pub fn build_level() -> Result<LevelRegistry, LevelError> {
    let mut registry = LevelRegistry::new();
    registry.register(
        Solid::new(
            SolidKey::GalleryA,
            "gallery-a",
            Vec3::splat(GALLERY_SIZE),
            TESSELLATION,
            Vec3::ZERO,
        ),
        true,
    )?;
    registry.register(
        Solid::new(
            SolidKey::GalleryB,
            "gallery-b",
            Vec3::splat(GALLERY_SIZE),
            TESSELLATION,
            Vec3::new(0.0, 0.0, GALLERY_B_DEPTH),
        ),
        false,
    )?;
    registry.register(
        Solid::new(
            SolidKey::Tunnel,
            "tunnel",
            Vec3::new(4.0, 4.0, 40.0),
            TESSELLATION,
            Vec3::new(0.0, 0.0, TUNNEL_DEPTH),
        ),
        false,
    )?;
    registry.register(
        Solid::new(
            SolidKey::Door,
            "door",
            Vec3::new(4.0, 4.0, 0.1),
            TESSELLATION,
            Vec3::new(0.0, 0.0, DOOR_PANEL_DEPTH),
        ),
        true,
    )?;
    info!("[Spacewalk] level built: two galleries, tunnel, sealed door");
    Ok(registry)
}
