//! Per-tick orchestration: take the single pending command, resolve it
//! against the current facing and door state, probe positional candidates
//! against the level geometry, and commit or silently reject. The
//! controller owns the viewer state and the level state; rendering and
//! input only ever read or feed them.

use bevy::prelude::*;

use crate::csg::compose;
use crate::door::Door;
use crate::level::{build_level, LevelError, LevelRegistry};
use crate::movement::{resolve, Command, Resolution};
use crate::raycast::{would_collide, PROBE_CLEARANCE};
use crate::solid::{MeshData, SolidKey};

/// The viewer's pose. The point light mirrors `position` every frame
/// (render side), and `target` is re-derived on every move so it never
/// goes stale.
#[derive(Resource, Debug, Clone, Copy)]
pub struct ViewerState {
    pub position: Vec3,
    pub target: Vec3,
}

impl Default for ViewerState {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            target: Vec3::new(0.0, 0.0, -200.0),
        }
    }
}

/// The level registry and door state, owned by the controller as one
/// unit. Everything else reads it through this resource.
#[derive(Resource)]
pub struct LevelState {
    pub registry: LevelRegistry,
    pub door: Door,
}

impl LevelState {
    pub fn build(door_clearance: f32) -> Result<Self, LevelError> {
        Ok(Self {
            registry: build_level()?,
            door: Door::new(SolidKey::Door, door_clearance),
        })
    }
}

/// Gameplay constants, overridable from the startup config.
#[derive(Resource, Debug, Clone, Copy)]
pub struct GameTuning {
    pub step_length: f32,
    pub turn_throw: f32,
    pub probe_clearance: f32,
}

impl Default for GameTuning {
    fn default() -> Self {
        Self {
            step_length: 1.0,
            turn_throw: 200.0,
            probe_clearance: PROBE_CLEARANCE,
        }
    }
}

/// At most one command is processed per tick. Writers overwrite, so the
/// last command to arrive between ticks wins; nothing is queued.
#[derive(Resource, Default)]
pub struct PendingCommand(pub Option<Command>);

pub struct ControllerPlugin;

impl Plugin for ControllerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PendingCommand>()
            .add_systems(Update, run_controller_tick);
    }
}

fn run_controller_tick(
    mut pending: ResMut<PendingCommand>,
    mut viewer: ResMut<ViewerState>,
    mut level: ResMut<LevelState>,
    tuning: Res<GameTuning>,
) {
    let Some(command) = pending.0.take() else {
        return;
    };
    apply_command(command, &mut viewer, &mut level, &tuning);
}

/// Run one command through resolve → probe → commit. Blocked moves and
/// out-of-range interactions are normal outcomes, not errors.
pub fn apply_command(
    command: Command,
    viewer: &mut ViewerState,
    level: &mut LevelState,
    tuning: &GameTuning,
) {
    match resolve(
        command,
        viewer.position,
        viewer.target,
        &level.door,
        tuning.step_length,
        tuning.turn_throw,
    ) {
        Resolution::Displace(delta) => {
            let candidate = viewer.position + delta;
            if would_collide(
                viewer.position,
                candidate,
                level.registry.world_triangles(),
                tuning.probe_clearance,
            ) {
                debug!("[Spacewalk] move to {candidate} blocked by geometry");
            } else {
                viewer.position = candidate;
                viewer.target += delta;
            }
        }
        Resolution::LookAt(target) => viewer.target = target,
        Resolution::OpenDoor => open_door(viewer.position.z, level),
        Resolution::RotateLevel(quarter_turns) => level.registry.rotate_composite(quarter_turns),
        Resolution::Blocked => {}
    }
}

/// Try the one-shot door transition; on success, recompose the two
/// galleries and the tunnel and swap the composite in. Both happen
/// inside the same tick, so the renderer never sees a half-open level.
fn open_door(viewer_depth: f32, level: &mut LevelState) {
    let LevelState { registry, door } = level;
    let opened = match registry.lookup_mut(door.key) {
        Ok(panel) => door.try_open(viewer_depth, panel),
        Err(err) => {
            warn!("[Spacewalk] interact skipped, door geometry missing: {err}");
            false
        }
    };
    if !opened {
        return;
    }
    match compose_level(registry) {
        Ok(mesh) => registry.replace_composite(SolidKey::GalleryA, mesh),
        Err(err) => warn!("[Spacewalk] recomposition failed: {err}"),
    }
}

/// Union of the walkable volumes in the fixed fold order the golden
/// counts depend on: gallery B ∪ tunnel ∪ gallery A.
fn compose_level(registry: &LevelRegistry) -> Result<MeshData, LevelError> {
    let gallery_b = registry.lookup(SolidKey::GalleryB)?;
    let tunnel = registry.lookup(SolidKey::Tunnel)?;
    let gallery_a = registry.lookup(SolidKey::GalleryA)?;
    compose(&[gallery_b, tunnel, gallery_a])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::door::DoorState;

    fn setup() -> (ViewerState, LevelState, GameTuning) {
        (
            ViewerState::default(),
            LevelState::build(4.0).unwrap(),
            GameTuning::default(),
        )
    }

    fn step_forward(viewer: &mut ViewerState, level: &mut LevelState, tuning: &GameTuning) {
        apply_command(Command::StepForward, viewer, level, tuning);
    }

    #[test]
    fn walkthrough_scenario() {
        let (mut viewer, mut level, tuning) = setup();

        // Walk from the gallery center up to the door.
        for _ in 0..14 {
            step_forward(&mut viewer, &mut level, &tuning);
        }
        assert_eq!(viewer.position.z, -14.0);

        // The closed door seals its depth coordinate.
        step_forward(&mut viewer, &mut level, &tuning);
        assert_eq!(viewer.position.z, -14.0);

        // Open it from inside the clearance band.
        let revision_before = level.registry.revision();
        apply_command(Command::Interact, &mut viewer, &mut level, &tuning);
        assert_eq!(level.door.state(), DoorState::Open);
        assert!(level.registry.composite().is_some());
        assert!(level.registry.revision() > revision_before);
        // Gallery A's solo mesh was subsumed by the composite.
        assert!(!level.registry.is_renderable(SolidKey::GalleryA));
        assert!(level.registry.is_renderable(SolidKey::Door));

        // The formerly sealed coordinate is now walkable: the movement
        // rule lifted and the probe sees the opened passage.
        step_forward(&mut viewer, &mut level, &tuning);
        assert_eq!(viewer.position.z, -15.0);
    }

    #[test]
    fn open_door_is_idempotent() {
        let (mut viewer, mut level, tuning) = setup();
        viewer.position.z = -13.0;
        viewer.target.z = -213.0;

        apply_command(Command::Interact, &mut viewer, &mut level, &tuning);
        let revision = level.registry.revision();
        let mesh_counts = {
            let composite = level.registry.composite().unwrap();
            (composite.vertex_count(), composite.triangle_count())
        };
        let panel_y = level.registry.lookup(SolidKey::Door).unwrap().position.y;

        apply_command(Command::Interact, &mut viewer, &mut level, &tuning);
        assert_eq!(level.registry.revision(), revision);
        let composite = level.registry.composite().unwrap();
        assert_eq!(
            (composite.vertex_count(), composite.triangle_count()),
            mesh_counts
        );
        assert_eq!(
            level.registry.lookup(SolidKey::Door).unwrap().position.y,
            panel_y
        );
    }

    #[test]
    fn interact_out_of_range_is_a_no_op() {
        let (mut viewer, mut level, tuning) = setup();
        apply_command(Command::Interact, &mut viewer, &mut level, &tuning);
        assert_eq!(level.door.state(), DoorState::Closed);
        assert!(level.registry.composite().is_none());
    }

    #[test]
    fn blocked_moves_leave_viewer_and_target_alone() {
        let (mut viewer, mut level, tuning) = setup();
        // Stand one unit from the gallery wall; the probe refuses the
        // step that would close the gap to within clearance.
        viewer.position = Vec3::new(14.1, 0.0, 0.0);
        viewer.target = Vec3::new(214.1, 0.0, 0.0);
        let before = viewer.position;
        let target_before = viewer.target;
        apply_command(Command::StepForward, &mut viewer, &mut level, &tuning);
        assert_eq!(viewer.position, before);
        assert_eq!(viewer.target, target_before);
    }

    #[test]
    fn committed_moves_carry_the_view_target() {
        let (mut viewer, mut level, tuning) = setup();
        apply_command(Command::MoveUp, &mut viewer, &mut level, &tuning);
        assert_eq!(viewer.position, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(viewer.target, Vec3::new(0.0, 1.0, -200.0));
    }

    #[test]
    fn turns_re_aim_without_moving() {
        let (mut viewer, mut level, tuning) = setup();
        apply_command(Command::TurnLeft, &mut viewer, &mut level, &tuning);
        assert_eq!(viewer.position, Vec3::ZERO);
        assert_eq!(viewer.target, Vec3::new(-200.0, 0.0, 0.0));
        apply_command(Command::TurnRight, &mut viewer, &mut level, &tuning);
        assert_eq!(viewer.target, Vec3::new(0.0, 0.0, -200.0));
    }

    #[test]
    fn rotate_level_spins_the_composite_only() {
        let (mut viewer, mut level, tuning) = setup();
        viewer.position.z = -13.0;
        viewer.target.z = -213.0;
        apply_command(Command::Interact, &mut viewer, &mut level, &tuning);

        let pos = viewer.position;
        apply_command(Command::RotateLevelLeft, &mut viewer, &mut level, &tuning);
        assert_eq!(viewer.position, pos);
        assert!(
            (level.registry.composite_yaw_radians() - std::f32::consts::FRAC_PI_2).abs() < 1e-6
        );
        assert_eq!(level.door.state(), DoorState::Open);
        apply_command(Command::RotateLevelRight, &mut viewer, &mut level, &tuning);
        assert_eq!(level.registry.composite_yaw_radians(), 0.0);
    }
}
