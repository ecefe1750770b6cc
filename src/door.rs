//! The one-shot door. Geometry lives in the level registry as an ordinary
//! solid; this module owns only the state and the guarded transition.
//! The contract: exactly one closed-to-open transition, idempotent
//! thereafter.

use bevy::prelude::*;

use crate::level::{DOOR_BLOCKING_DEPTH, DOOR_PANEL_DEPTH};
use crate::solid::{Solid, SolidKey};

const DEPTH_EPSILON: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorState {
    Closed,
    Open,
}

#[derive(Debug, Clone)]
pub struct Door {
    pub key: SolidKey,
    state: DoorState,
    /// Half-width of the band around the panel's depth within which the
    /// viewer counts as standing at the door.
    clearance: f32,
    /// Step-grid depth the closed panel refuses to let the viewer occupy.
    blocking_depth: f32,
    panel_depth: f32,
}

impl Door {
    pub fn new(key: SolidKey, clearance: f32) -> Self {
        Self {
            key,
            state: DoorState::Closed,
            clearance,
            blocking_depth: DOOR_BLOCKING_DEPTH,
            panel_depth: DOOR_PANEL_DEPTH,
        }
    }

    pub fn state(&self) -> DoorState {
        self.state
    }

    /// True while the closed panel forbids landing on `depth`.
    pub fn blocks_depth(&self, depth: f32) -> bool {
        self.state == DoorState::Closed && (depth - self.blocking_depth).abs() < DEPTH_EPSILON
    }

    pub fn in_clearance_band(&self, viewer_depth: f32) -> bool {
        (viewer_depth - self.panel_depth).abs() < self.clearance
    }

    /// Attempt the one-shot open. Returns true only on the tick the door
    /// actually transitions; the caller owes a recomposition then. Out of
    /// range or already open are silent no-ops.
    pub fn try_open(&mut self, viewer_depth: f32, panel: &mut Solid) -> bool {
        if self.state == DoorState::Open {
            return false;
        }
        if !self.in_clearance_band(viewer_depth) {
            debug!("[Spacewalk] door out of reach at depth {viewer_depth}");
            return false;
        }
        // Slide the panel up out of the passage by its own height.
        panel.position.y += panel.height();
        self.state = DoorState::Open;
        info!("[Spacewalk] door opened, panel raised to y = {}", panel.position.y);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel() -> Solid {
        Solid::new(
            SolidKey::Door,
            "door",
            Vec3::new(4.0, 4.0, 0.1),
            1,
            Vec3::new(0.0, 0.0, DOOR_PANEL_DEPTH),
        )
    }

    #[test]
    fn opens_only_inside_clearance_band() {
        let mut door = Door::new(SolidKey::Door, 4.0);
        let mut solid = panel();
        assert!(!door.try_open(0.0, &mut solid));
        assert_eq!(door.state(), DoorState::Closed);
        assert_eq!(solid.position.y, 0.0);

        assert!(door.try_open(-12.0, &mut solid));
        assert_eq!(door.state(), DoorState::Open);
        assert_eq!(solid.position.y, 4.0);
    }

    #[test]
    fn second_open_is_a_no_op() {
        let mut door = Door::new(SolidKey::Door, 4.0);
        let mut solid = panel();
        assert!(door.try_open(-14.0, &mut solid));
        assert!(!door.try_open(-14.0, &mut solid));
        // Panel did not climb a second time.
        assert_eq!(solid.position.y, 4.0);
        assert_eq!(door.state(), DoorState::Open);
    }

    #[test]
    fn blocking_depth_lifts_once_open() {
        let mut door = Door::new(SolidKey::Door, 4.0);
        assert!(door.blocks_depth(-15.0));
        assert!(!door.blocks_depth(-14.0));
        let mut solid = panel();
        door.try_open(-14.0, &mut solid);
        assert!(!door.blocks_depth(-15.0));
    }
}
