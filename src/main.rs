//! Scenesync headless demo.
//!
//! Runs the full producer/consumer pipeline in one process:
//!
//! 1. Build a scene from a JSON description (a built-in patrol scene by
//!    default), register demo scripts, and load it into a [`Context`]
//! 2. Step the simulation at the configured tick rate
//! 3. Snapshot each tick and ship either full states or diffs into an
//!    [`Interpolator`]
//! 4. Read the interpolated view back, the way a renderer would
//!
//! # Running
//!
//! ```sh
//! RUST_LOG=info cargo run --release -- --ticks 300
//! ```

use std::path::PathBuf;

use clap::Parser;
use futures::executor::block_on;
use glam::Vec3;
use log::{info, warn};
use serde_json::json;

use scenesync::collision::CollisionHit;
use scenesync::config::SimConfig;
use scenesync::context::registry::ScriptRegistry;
use scenesync::context::script::{Script, ScriptCtx};
use scenesync::context::{Command, Context};
use scenesync::interp::Interpolator;
use scenesync::scene::{ObjectData, ObjectId};

#[derive(Parser, Debug)]
#[command(about = "Headless producer/consumer demo of the scenesync core")]
struct Args {
    /// Scene description JSON file; a built-in scene is used when absent.
    #[arg(long)]
    scene: Option<PathBuf>,
    /// Number of simulation ticks to run.
    #[arg(long, default_value_t = 300)]
    ticks: u32,
    /// Path to the INI configuration file.
    #[arg(long, default_value = "./config.ini")]
    config: PathBuf,
    /// Ship full snapshots instead of diffs.
    #[arg(long)]
    full_snapshots: bool,
}

/// Demo script: walks its node back and forth along the x axis, turning
/// around at `range` or on a `reverse` command.
struct Patrol {
    speed: f32,
    range: f32,
    direction: f32,
    origin: Vec3,
}

impl Patrol {
    fn from_variables(variables: &serde_json::Value) -> Self {
        let get = |key: &str, fallback: f64| {
            variables.get(key).and_then(|v| v.as_f64()).unwrap_or(fallback) as f32
        };
        Self {
            speed: get("speed", 2.0),
            range: get("range", 6.0),
            direction: 1.0,
            origin: Vec3::ZERO,
        }
    }
}

impl Script for Patrol {
    fn init(&mut self, ctx: &mut ScriptCtx<'_>) {
        self.origin = ctx.object().transform().position();
    }

    fn tick(&mut self, ctx: &mut ScriptCtx<'_>) {
        if ctx.commands().iter().any(|c| c.kind == "reverse") {
            self.direction = -self.direction;
        }
        let step = self.speed * self.direction * ctx.dt();
        let origin_x = self.origin.x;
        let range = self.range;
        let object = ctx.object();
        let mut position = object.transform().position();
        position.x += step;
        if (position.x - origin_x).abs() > range {
            position.x = position.x.clamp(origin_x - range, origin_x + range);
            self.direction = -self.direction;
        }
        object.set_position(position);
    }

    fn on_enter_collision(&mut self, ctx: &mut ScriptCtx<'_>, hit: &CollisionHit) {
        info!("{} ran into {}", ctx.object_id(), hit.partner);
    }

    fn on_leave_collision(&mut self, ctx: &mut ScriptCtx<'_>, partner: ObjectId) {
        info!("{} cleared {}", ctx.object_id(), partner);
    }
}

fn builtin_scene() -> ObjectData {
    ObjectData::from_json(json!({
        "name": "demo",
        "children": [
            {
                "name": "pillar",
                "static": true,
                "transform": {
                    "position": [4.0, 0.0, 0.0],
                    "rotation": [0.0, 0.0, 0.0, 1.0],
                    "scale": [1.0, 1.0, 1.0],
                },
                "components": {
                    "collider": {"shapes": [
                        {"type": "circle", "center": [0.0, 0.0], "radius": 1.0},
                    ]},
                    "render": {"idRenderData": "pillar", "color": [0.6, 0.6, 0.7]},
                },
            },
            {
                "name": "probe",
                "transform": {
                    "position": [-4.0, 0.0, 0.0],
                    "rotation": [0.0, 0.0, 0.0, 1.0],
                    "scale": [1.0, 1.0, 1.0],
                },
                "components": {
                    "collider": {"shapes": [
                        {"type": "circle", "center": [0.0, 0.0], "radius": 0.5},
                    ]},
                    "gameScript": {"scripts": ["patrol"], "variables": {"speed": 3.0, "range": 8.0}},
                    "render": {"idRenderData": "probe"},
                    "audio": {"idSound": "engine_hum", "loop": true},
                },
            },
        ],
    }))
    .expect("built-in scene description is valid")
}

fn load_scene(args: &Args) -> ObjectData {
    match &args.scene {
        Some(path) => {
            let text = std::fs::read_to_string(path).expect("failed to read scene file");
            let value = serde_json::from_str(&text).expect("scene file is not valid JSON");
            ObjectData::from_json(value).expect("scene file is not a valid description")
        }
        None => builtin_scene(),
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let mut config = SimConfig::with_path(&args.config);
    if config.load_from_file().is_err() {
        info!("no config file at {:?}, using defaults", args.config);
    }

    let registry =
        ScriptRegistry::new().with("patrol", |_, variables| {
            Box::new(Patrol::from_variables(variables))
        });

    let mut context = Context::with_config(registry, &config);
    let scene = load_scene(&args);
    let scene_id = block_on(context.add_object(&scene, None)).expect("scene failed to load");
    info!("scene {} loaded, {} nodes", scene_id, context.scene().len());

    let mut interp = Interpolator::new(config.interp_delay_ms);
    let mut last_state = context.to_state(true);
    interp.on_first_state(last_state.clone());

    let dt = config.tick_dt();
    let probe = context.scene().find_by_name("probe");
    for tick in 1..=args.ticks {
        // A command roughly every two seconds keeps the patrol lively.
        if tick % (config.tick_rate * 2) == 0 {
            context.on_command([Command {
                kind: "reverse".to_string(),
                data: serde_json::Value::Null,
            }]);
        }

        context.step(dt);
        let state = context.to_state(true);
        if args.full_snapshots {
            interp.on_new_state(state.clone());
        } else {
            let diff = state.sub(&last_state);
            interp.on_new_diff(&diff);
        }
        last_state = state;

        if tick % config.tick_rate == 0 {
            match (interp.current_state(), probe) {
                (Some(view), Some(probe_id)) => {
                    if let Some(node) = view.root().find(probe_id) {
                        info!(
                            "tick {:4}: interpolated probe at x = {:.2} (ping {:.1} ms)",
                            tick, node.transform.position[0], interp.ping_ms()
                        );
                    }
                }
                _ => warn!("tick {:4}: no interpolated state yet", tick),
            }
        }

        std::thread::sleep(std::time::Duration::from_secs_f32(dt));
    }

    info!(
        "done: {} ticks, {:.1} ms simulated, {} nodes",
        args.ticks,
        context.elapsed_ms(),
        context.scene().len()
    );
}
