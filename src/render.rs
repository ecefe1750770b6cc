//! Scene sync: the external-collaborator side of the core. Reads the
//! level registry and viewer state every frame and mirrors them into
//! Bevy's scene graph; nothing here flows back into the core.

use bevy::prelude::*;

use crate::controller::{LevelState, ViewerState};
use crate::solid::SolidKey;

pub struct RenderPlugin;

impl Plugin for RenderPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_camera_and_light)
            .add_systems(Update, (sync_level_meshes, sync_viewer_pose).chain());
    }
}

// Dim gray viewer light with a short range; it follows the camera.
const LIGHT_RANGE: f32 = 55.0;
const LIGHT_INTENSITY: f32 = 2_000_000.0;

#[derive(Component)]
pub struct MainCamera;

#[derive(Component)]
pub struct ViewerLight;

/// Tag for everything spawned from the level registry, so a revision
/// change can despawn and respawn the whole set in one pass.
#[derive(Component)]
struct LevelMesh;

fn spawn_camera_and_light(mut commands: Commands, viewer: Res<ViewerState>) {
    commands.spawn((
        MainCamera,
        Camera3d::default(),
        Transform::from_translation(viewer.position).looking_at(viewer.target, Vec3::Y),
    ));
    commands.spawn((
        ViewerLight,
        PointLight {
            color: Color::srgb_u8(0x77, 0x77, 0x77),
            intensity: LIGHT_INTENSITY,
            range: LIGHT_RANGE,
            shadows_enabled: false,
            ..default()
        },
        Transform::from_translation(viewer.position),
    ));
}

fn structure_material() -> StandardMaterial {
    StandardMaterial {
        base_color: Color::srgb_u8(0xBA, 0xBA, 0xBA),
        // The viewer walks around inside these volumes.
        double_sided: true,
        cull_mode: None,
        ..default()
    }
}

fn door_material() -> StandardMaterial {
    StandardMaterial {
        base_color: Color::srgb_u8(0xFF, 0x00, 0x00),
        double_sided: true,
        cull_mode: None,
        ..default()
    }
}

/// Rebuild the drawn level whenever the registry revision moves. Despawn
/// and respawn happen in the same system run, so the renderer only ever
/// draws a complete before or after state.
fn sync_level_meshes(
    mut commands: Commands,
    level: Res<LevelState>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut synced_revision: Local<Option<u64>>,
    existing: Query<Entity, With<LevelMesh>>,
) {
    let revision = level.registry.revision();
    if *synced_revision == Some(revision) {
        return;
    }
    *synced_revision = Some(revision);

    for entity in &existing {
        commands.entity(entity).despawn();
    }

    for solid in level.registry.renderable_solids() {
        let material = if solid.key == SolidKey::Door {
            door_material()
        } else {
            structure_material()
        };
        commands.spawn((
            LevelMesh,
            Mesh3d(meshes.add(solid.mesh_data().to_render_mesh())),
            MeshMaterial3d(materials.add(material)),
            Transform::IDENTITY,
        ));
    }

    if let Some(composite) = level.registry.composite() {
        commands.spawn((
            LevelMesh,
            Mesh3d(meshes.add(composite.to_render_mesh())),
            MeshMaterial3d(materials.add(structure_material())),
            Transform::from_rotation(Quat::from_rotation_y(
                level.registry.composite_yaw_radians(),
            )),
        ));
    }
}

/// Keep the camera on the viewer pose and mirror the light to the viewer
/// position, every frame.
fn sync_viewer_pose(
    viewer: Res<ViewerState>,
    mut camera: Query<&mut Transform, (With<MainCamera>, Without<ViewerLight>)>,
    mut light: Query<&mut Transform, (With<ViewerLight>, Without<MainCamera>)>,
) {
    for mut transform in &mut camera {
        *transform =
            Transform::from_translation(viewer.position).looking_at(viewer.target, Vec3::Y);
    }
    for mut transform in &mut light {
        transform.translation = viewer.position;
    }
}
