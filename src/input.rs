//! Translation layer between raw keyboard input and the controller's
//! command vocabulary. The controller never sees key codes, only decoded
//! `Command` symbols; headless runs write `PendingCommand` directly.

use bevy::prelude::*;

use crate::controller::PendingCommand;
use crate::movement::Command;

pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            PreUpdate,
            keyboard_to_command.run_if(resource_exists::<ButtonInput<KeyCode>>),
        );
    }
}

/// Arrows strafe and fly, `A`/`Z` step forward and back, `Q`/`W` turn,
/// `Shift` interacts, `O`/`P` rotate the composed level.
fn decode(key: KeyCode) -> Option<Command> {
    match key {
        KeyCode::ArrowUp => Some(Command::MoveUp),
        KeyCode::ArrowDown => Some(Command::MoveDown),
        KeyCode::ArrowLeft => Some(Command::StrafeLeft),
        KeyCode::ArrowRight => Some(Command::StrafeRight),
        KeyCode::KeyA => Some(Command::StepForward),
        KeyCode::KeyZ => Some(Command::StepBackward),
        KeyCode::KeyQ => Some(Command::TurnLeft),
        KeyCode::KeyW => Some(Command::TurnRight),
        KeyCode::ShiftLeft | KeyCode::ShiftRight => Some(Command::Interact),
        KeyCode::KeyO => Some(Command::RotateLevelLeft),
        KeyCode::KeyP => Some(Command::RotateLevelRight),
        _ => None,
    }
}

fn keyboard_to_command(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut pending: ResMut<PendingCommand>,
) {
    for key in keyboard.get_just_pressed() {
        match decode(*key) {
            // Last writer wins; the controller drains one per tick.
            Some(command) => pending.0 = Some(command),
            None => debug!("[Spacewalk] unbound key {key:?}"),
        }
    }
}
