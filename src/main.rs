mod controller;
mod csg;
mod door;
mod facing;
mod input;
mod level;
mod movement;
mod raycast;
mod render;
mod solid;

use bevy::prelude::*;

use controller::{ControllerPlugin, GameTuning, LevelState, ViewerState};

const DEFAULT_DOOR_CLEARANCE: f32 = 4.0;

#[derive(serde::Deserialize, Default)]
struct StartupConfig {
    window_title: Option<String>,
    window_width: Option<f32>,
    window_height: Option<f32>,
    background_color: Option<[f32; 3]>,
    step_length: Option<f32>,
    turn_throw: Option<f32>,
    probe_clearance: Option<f32>,
    door_clearance: Option<f32>,
}

fn load_startup_config() -> StartupConfig {
    let path = std::env::var("SPACEWALK_CONFIG")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "game.json".to_string());
    match std::fs::read_to_string(&path) {
        Ok(contents) => match serde_json::from_str::<StartupConfig>(&contents) {
            Ok(config) => {
                println!("[Spacewalk] loaded startup config from {}", path);
                config
            }
            Err(e) => {
                eprintln!("[Spacewalk] failed to parse {}: {}", path, e);
                StartupConfig::default()
            }
        },
        Err(_) => StartupConfig::default(),
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let headless = args.iter().any(|a| a == "--headless");
    let config = load_startup_config();

    let mut tuning = GameTuning::default();
    if let Some(step) = config.step_length {
        tuning.step_length = step;
    }
    if let Some(throw) = config.turn_throw {
        tuning.turn_throw = throw;
    }
    if let Some(clearance) = config.probe_clearance {
        tuning.probe_clearance = clearance;
    }

    // Structural level errors are fatal at startup; everything after
    // this point recovers locally.
    let level = LevelState::build(config.door_clearance.unwrap_or(DEFAULT_DOOR_CLEARANCE))
        .unwrap_or_else(|e| {
            eprintln!("[Spacewalk] failed to build level: {e}");
            std::process::exit(2);
        });

    let mut app = App::new();

    if headless {
        // No window, no rendering: the controller still ticks, which is
        // all the tests and sim runs need.
        app.add_plugins(MinimalPlugins);
        println!("[Spacewalk] starting in HEADLESS mode");
    } else {
        app.add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: config
                    .window_title
                    .unwrap_or_else(|| "Spacewalk".to_string()),
                resolution: (
                    config.window_width.unwrap_or(1280.0),
                    config.window_height.unwrap_or(720.0),
                )
                    .into(),
                ..default()
            }),
            ..default()
        }));
        let [r, g, b] = config.background_color.unwrap_or([0.0, 0.0, 0.0]);
        app.insert_resource(ClearColor(Color::srgb(r, g, b)));
        app.add_plugins(render::RenderPlugin);
    }

    app.insert_resource(level)
        .insert_resource(ViewerState::default())
        .insert_resource(tuning)
        .add_plugins((input::InputPlugin, ControllerPlugin))
        .run();
}
