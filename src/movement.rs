//! Discrete command resolution. Commands arrive pre-decoded (one symbol
//! per tick); this module turns them into a candidate displacement, a new
//! view target, or a door/level action, honoring the facing-relative
//! mapping and the closed-door depth restriction.

use bevy::prelude::*;

use crate::door::Door;
use crate::facing::Facing;

/// The full command vocabulary the controller accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    MoveUp,
    MoveDown,
    StrafeLeft,
    StrafeRight,
    StepForward,
    StepBackward,
    TurnLeft,
    TurnRight,
    Interact,
    RotateLevelLeft,
    RotateLevelRight,
}

/// Outcome of resolving one command. `Displace` still has to pass the
/// collision probe; everything else commits directly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    /// Move viewer and view target by this vector.
    Displace(Vec3),
    /// Re-aim the view target without moving.
    LookAt(Vec3),
    OpenDoor,
    /// Quarter turns of the composite, counterclockwise positive.
    RotateLevel(i8),
    /// Suppressed by the closed-door depth rule.
    Blocked,
}

/// Resolve `command` against the current pose and door state.
///
/// Horizontal moves are facing-relative: facing ahead or behind, forward
/// and backward run along the depth axis (sign flipped when behind) and
/// strafing runs laterally; facing lateral, the axes swap so "forward"
/// keeps meaning "deeper into the level" from the viewer's perspective,
/// with direction picked by which side the target sits on.
pub fn resolve(
    command: Command,
    position: Vec3,
    target: Vec3,
    door: &Door,
    step: f32,
    turn_throw: f32,
) -> Resolution {
    let facing = Facing::classify(position, target);
    // Lateral disambiguation: which way along x the viewer is looking.
    let looking_positive_x = target.x > position.x;

    let displacement = match command {
        Command::MoveUp => Some(Vec3::Y * step),
        Command::MoveDown => Some(Vec3::NEG_Y * step),
        Command::StepForward => Some(match facing {
            Facing::Ahead => Vec3::NEG_Z * step,
            Facing::Behind => Vec3::Z * step,
            Facing::Lateral if looking_positive_x => Vec3::X * step,
            Facing::Lateral => Vec3::NEG_X * step,
        }),
        Command::StepBackward => Some(match facing {
            Facing::Ahead => Vec3::Z * step,
            Facing::Behind => Vec3::NEG_Z * step,
            Facing::Lateral if looking_positive_x => Vec3::NEG_X * step,
            Facing::Lateral => Vec3::X * step,
        }),
        Command::StrafeLeft => Some(match facing {
            Facing::Ahead => Vec3::NEG_X * step,
            Facing::Behind => Vec3::X * step,
            Facing::Lateral if looking_positive_x => Vec3::NEG_Z * step,
            Facing::Lateral => Vec3::Z * step,
        }),
        Command::StrafeRight => Some(match facing {
            Facing::Ahead => Vec3::X * step,
            Facing::Behind => Vec3::NEG_X * step,
            Facing::Lateral if looking_positive_x => Vec3::Z * step,
            Facing::Lateral => Vec3::NEG_Z * step,
        }),
        _ => None,
    };

    if let Some(delta) = displacement {
        // The closed door seals its depth coordinate outright, before any
        // ray geometry gets a say.
        if delta.z != 0.0 && door.blocks_depth(position.z + delta.z) {
            return Resolution::Blocked;
        }
        return Resolution::Displace(delta);
    }

    match command {
        Command::TurnLeft => Resolution::LookAt(match facing {
            Facing::Ahead => Vec3::new(position.x - turn_throw, target.y, position.z),
            Facing::Behind => Vec3::new(position.x + turn_throw, target.y, position.z),
            Facing::Lateral if looking_positive_x => {
                Vec3::new(position.x, target.y, position.z - turn_throw)
            }
            Facing::Lateral => Vec3::new(position.x, target.y, position.z + turn_throw),
        }),
        Command::TurnRight => Resolution::LookAt(match facing {
            Facing::Ahead => Vec3::new(position.x + turn_throw, target.y, position.z),
            Facing::Behind => Vec3::new(position.x - turn_throw, target.y, position.z),
            Facing::Lateral if looking_positive_x => {
                Vec3::new(position.x, target.y, position.z + turn_throw)
            }
            Facing::Lateral => Vec3::new(position.x, target.y, position.z - turn_throw),
        }),
        Command::Interact => Resolution::OpenDoor,
        Command::RotateLevelLeft => Resolution::RotateLevel(1),
        Command::RotateLevelRight => Resolution::RotateLevel(-1),
        // Displacement commands were handled above.
        _ => Resolution::Blocked,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solid::{Solid, SolidKey};

    const STEP: f32 = 1.0;
    const THROW: f32 = 200.0;

    fn closed_door() -> Door {
        Door::new(SolidKey::Door, 4.0)
    }

    fn resolve_at(command: Command, position: Vec3, target: Vec3) -> Resolution {
        resolve(command, position, target, &closed_door(), STEP, THROW)
    }

    #[test]
    fn facing_ahead_moves_along_depth() {
        let pos = Vec3::ZERO;
        let target = Vec3::new(0.0, 0.0, -200.0);
        assert_eq!(
            resolve_at(Command::StepForward, pos, target),
            Resolution::Displace(Vec3::new(0.0, 0.0, -1.0))
        );
        assert_eq!(
            resolve_at(Command::StepBackward, pos, target),
            Resolution::Displace(Vec3::new(0.0, 0.0, 1.0))
        );
        assert_eq!(
            resolve_at(Command::StrafeLeft, pos, target),
            Resolution::Displace(Vec3::new(-1.0, 0.0, 0.0))
        );
        assert_eq!(
            resolve_at(Command::StrafeRight, pos, target),
            Resolution::Displace(Vec3::new(1.0, 0.0, 0.0))
        );
    }

    #[test]
    fn facing_behind_flips_signs() {
        let pos = Vec3::ZERO;
        let target = Vec3::new(0.0, 0.0, 200.0);
        assert_eq!(
            resolve_at(Command::StepForward, pos, target),
            Resolution::Displace(Vec3::new(0.0, 0.0, 1.0))
        );
        assert_eq!(
            resolve_at(Command::StrafeLeft, pos, target),
            Resolution::Displace(Vec3::new(1.0, 0.0, 0.0))
        );
    }

    #[test]
    fn facing_lateral_swaps_axes() {
        let pos = Vec3::ZERO;
        // Looking toward positive x.
        let target = Vec3::new(200.0, 0.0, 0.0);
        assert_eq!(
            resolve_at(Command::StepForward, pos, target),
            Resolution::Displace(Vec3::new(1.0, 0.0, 0.0))
        );
        assert_eq!(
            resolve_at(Command::StrafeLeft, pos, target),
            Resolution::Displace(Vec3::new(0.0, 0.0, -1.0))
        );
        // Looking toward negative x.
        let target = Vec3::new(-200.0, 0.0, 0.0);
        assert_eq!(
            resolve_at(Command::StepForward, pos, target),
            Resolution::Displace(Vec3::new(-1.0, 0.0, 0.0))
        );
        assert_eq!(
            resolve_at(Command::StrafeLeft, pos, target),
            Resolution::Displace(Vec3::new(0.0, 0.0, 1.0))
        );
    }

    #[test]
    fn vertical_moves_ignore_facing() {
        for target in [
            Vec3::new(0.0, 0.0, -200.0),
            Vec3::new(0.0, 0.0, 200.0),
            Vec3::new(200.0, 0.0, 0.0),
        ] {
            assert_eq!(
                resolve_at(Command::MoveUp, Vec3::ZERO, target),
                Resolution::Displace(Vec3::Y)
            );
            assert_eq!(
                resolve_at(Command::MoveDown, Vec3::ZERO, target),
                Resolution::Displace(Vec3::NEG_Y)
            );
        }
    }

    #[test]
    fn closed_door_suppresses_landing_on_its_depth() {
        let pos = Vec3::new(0.0, 0.0, -14.0);
        let target = Vec3::new(0.0, 0.0, -200.0);
        assert_eq!(
            resolve_at(Command::StepForward, pos, target),
            Resolution::Blocked
        );

        let mut door = closed_door();
        let mut panel = Solid::new(
            SolidKey::Door,
            "door",
            Vec3::new(4.0, 4.0, 0.1),
            1,
            Vec3::new(0.0, 0.0, crate::level::DOOR_PANEL_DEPTH),
        );
        assert!(door.try_open(-14.0, &mut panel));
        assert_eq!(
            resolve(Command::StepForward, pos, target, &door, STEP, THROW),
            Resolution::Displace(Vec3::new(0.0, 0.0, -1.0))
        );
    }

    #[test]
    fn turn_round_trip_restores_target() {
        let pos = Vec3::ZERO;
        let original = Vec3::new(0.0, 0.0, -200.0);
        let Resolution::LookAt(turned) = resolve_at(Command::TurnLeft, pos, original) else {
            panic!("turn should re-aim");
        };
        assert_eq!(turned, Vec3::new(-200.0, 0.0, 0.0));
        let Resolution::LookAt(restored) = resolve_at(Command::TurnRight, pos, turned) else {
            panic!("turn should re-aim");
        };
        assert!((restored - original).length() < 1e-4);
    }

    #[test]
    fn interact_and_rotate_produce_no_displacement() {
        let target = Vec3::new(0.0, 0.0, -200.0);
        assert_eq!(
            resolve_at(Command::Interact, Vec3::ZERO, target),
            Resolution::OpenDoor
        );
        assert_eq!(
            resolve_at(Command::RotateLevelLeft, Vec3::ZERO, target),
            Resolution::RotateLevel(1)
        );
        assert_eq!(
            resolve_at(Command::RotateLevelRight, Vec3::ZERO, target),
            Resolution::RotateLevel(-1)
        );
    }
}
