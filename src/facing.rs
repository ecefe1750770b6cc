use bevy::prelude::*;

/// Coarse heading of the viewer along the depth axis, derived fresh each
/// tick from the view-target offset. The sign convention follows the
/// level layout: the level extends toward negative z, so looking at a
/// more-negative target means looking ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Ahead,
    Behind,
    Lateral,
}

impl Facing {
    pub fn classify(viewer: Vec3, target: Vec3) -> Self {
        if target.z > viewer.z {
            Facing::Behind
        } else if target.z < viewer.z {
            Facing::Ahead
        } else {
            Facing::Lateral
        }
    }
}
