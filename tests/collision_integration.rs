//! Integration tests for collision detection: the enter/sustain/leave
//! edge cycle, mover/static asymmetry, and buffer purging on removal.
//!
//! # Usage
//!
//! ```sh
//! cargo test --test collision_integration
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use futures::executor::block_on;
use glam::Vec3;
use serde_json::json;

use scenesync::collision::CollisionHit;
use scenesync::context::registry::ScriptRegistry;
use scenesync::context::script::{Script, ScriptCtx};
use scenesync::context::Context;
use scenesync::scene::{ObjectData, ObjectId};

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Enter(ObjectId),
    Sustain(ObjectId),
    Leave(ObjectId),
}

type Log = Rc<RefCell<Vec<Event>>>;

/// Walks its node along -x by `speed` units per tick and records every
/// collision event.
struct Walker {
    speed: f32,
    log: Log,
}

impl Script for Walker {
    fn tick(&mut self, ctx: &mut ScriptCtx<'_>) {
        let step = self.speed;
        let object = ctx.object();
        let mut position = object.transform().position();
        position.x -= step;
        object.set_position(position);
    }

    fn on_enter_collision(&mut self, _ctx: &mut ScriptCtx<'_>, hit: &CollisionHit) {
        self.log.borrow_mut().push(Event::Enter(hit.partner));
    }

    fn is_colliding(&mut self, _ctx: &mut ScriptCtx<'_>, hit: &CollisionHit) {
        self.log.borrow_mut().push(Event::Sustain(hit.partner));
    }

    fn on_leave_collision(&mut self, _ctx: &mut ScriptCtx<'_>, partner: ObjectId) {
        self.log.borrow_mut().push(Event::Leave(partner));
    }
}

fn walker_registry(log: &Log, speed: f32) -> ScriptRegistry {
    let log = Rc::clone(log);
    ScriptRegistry::new().with("walker", move |_, _| {
        Box::new(Walker {
            speed,
            log: Rc::clone(&log),
        })
    })
}

fn circle_node(id: u64, name: &str, x: f32, radius: f32, is_static: bool) -> serde_json::Value {
    let mut components = json!({
        "collider": {"shapes": [
            {"type": "circle", "center": [0.0, 0.0], "radius": radius},
        ]},
    });
    if !is_static {
        components["gameScript"] = json!({"scripts": ["walker"]});
    }
    json!({
        "id": id, "name": name, "static": is_static,
        "transform": {
            "position": [x, 0.0, 0.0],
            "rotation": [0.0, 0.0, 0.0, 1.0],
            "scale": [1.0, 1.0, 1.0],
        },
        "components": components,
    })
}

const PILLAR: ObjectId = ObjectId(1);
const PROBE: ObjectId = ObjectId(2);

/// Static unit circle at the origin, unit-circle mover starting at
/// (5, 0) walking toward it one unit per tick.
fn approach_context(log: &Log) -> Context {
    let mut context = Context::new(walker_registry(log, 1.0));
    let data = ObjectData::from_json(json!({
        "id": 10, "name": "range",
        "children": [
            circle_node(1, "pillar", 0.0, 1.0, true),
            circle_node(2, "probe", 5.0, 1.0, false),
        ],
    }))
    .unwrap();
    block_on(context.add_object(&data, None)).unwrap();
    context
}

#[test]
fn approach_fires_enter_sustain_leave_exactly_once_each_edge() {
    let log: Log = Log::default();
    let mut context = approach_context(&log);

    // Probe x after step k is 5 - k; circles of radius 1 touch at
    // center distance 2.
    for _ in 0..10 {
        context.step(1.0);
    }

    let events = log.borrow();
    // Steps 1-2 (x = 4, 3): nothing. Step 3 (x = 2): enter. Steps 4-7
    // (x = 1, 0, -1, -2): sustain. Step 8 (x = -3): leave.
    let expected = vec![
        Event::Enter(PILLAR),
        Event::Sustain(PILLAR),
        Event::Sustain(PILLAR),
        Event::Sustain(PILLAR),
        Event::Sustain(PILLAR),
        Event::Leave(PILLAR),
    ];
    assert_eq!(*events, expected);
}

#[test]
fn movers_do_not_collide_with_each_other() {
    let log: Log = Log::default();
    let mut context = Context::new(walker_registry(&log, 0.0));
    // Two overlapping non-static circles.
    let data = ObjectData::from_json(json!({
        "id": 10, "name": "pair",
        "children": [
            circle_node(1, "a", 0.0, 1.0, false),
            circle_node(2, "b", 0.5, 1.0, false),
        ],
    }))
    .unwrap();
    block_on(context.add_object(&data, None)).unwrap();

    context.step(1.0);
    context.step(1.0);
    assert!(log.borrow().is_empty());
}

#[test]
fn removing_partner_suppresses_leave_event() {
    let log: Log = Log::default();
    let mut context = approach_context(&log);

    // Walk into overlap.
    for _ in 0..4 {
        context.step(1.0);
    }
    assert!(log.borrow().contains(&Event::Enter(PILLAR)));

    // Remove the partner while overlapping; its id must be purged from
    // the probe's buffer, so the grace tick raises no leave event.
    context.remove_object(PILLAR).unwrap();
    log.borrow_mut().clear();
    context.step(1.0);
    context.step(1.0);

    assert!(!log.borrow().iter().any(|e| matches!(e, Event::Leave(_))));
}

#[test]
fn removed_mover_raises_no_further_events() {
    let log: Log = Log::default();
    let mut context = approach_context(&log);
    for _ in 0..4 {
        context.step(1.0);
    }
    log.borrow_mut().clear();

    context.remove_object(PROBE).unwrap();
    context.step(1.0);
    assert!(log.borrow().is_empty());
}

#[test]
fn polygon_partner_detects_circle_mover() {
    let log: Log = Log::default();
    let mut context = Context::new(walker_registry(&log, 1.0));
    let data = ObjectData::from_json(json!({
        "id": 10, "name": "yard",
        "children": [
            {
                "id": 1, "name": "wall", "static": true,
                "components": {"collider": {"shapes": [
                    {"type": "polygon", "points": [
                        [-1.0, -2.0], [1.0, -2.0], [1.0, 2.0], [-1.0, 2.0],
                    ]},
                ]}},
            },
            circle_node(2, "probe", 4.0, 0.5, false),
        ],
    }))
    .unwrap();
    block_on(context.add_object(&data, None)).unwrap();

    // Probe reaches x = 1 after step 3, where its radius-0.5 circle
    // touches the wall edge at x = 1.
    for _ in 0..3 {
        context.step(1.0);
    }
    assert_eq!(*log.borrow(), vec![Event::Enter(ObjectId(1))]);
}

#[test]
fn scaled_parent_grows_collider() {
    let log: Log = Log::default();
    let mut context = Context::new(walker_registry(&log, 0.0));
    // The mover's circle is nested under a parent scaled 3x, so its
    // effective world radius is 1.5 and it overlaps the pillar 2.5
    // units away.
    let data = ObjectData::from_json(json!({
        "id": 10, "name": "scaled",
        "transform": {
            "position": [0.0, 0.0, 0.0],
            "rotation": [0.0, 0.0, 0.0, 1.0],
            "scale": [3.0, 3.0, 3.0],
        },
        "children": [
            circle_node(2, "probe", 0.0, 0.5, false),
        ],
    }))
    .unwrap();
    block_on(context.add_object(&data, None)).unwrap();
    let pillar = ObjectData::from_json(circle_node(1, "pillar", 2.5, 1.0, true)).unwrap();
    block_on(context.add_object(&pillar, None)).unwrap();

    context.step(1.0);
    assert_eq!(*log.borrow(), vec![Event::Enter(ObjectId(1))]);
}

#[test]
fn mover_can_read_its_position_during_events() {
    // Collision hooks receive the same script context as tick.
    struct Checker {
        seen_x: Rc<RefCell<Vec<f32>>>,
    }
    impl Script for Checker {
        fn on_enter_collision(&mut self, ctx: &mut ScriptCtx<'_>, _hit: &CollisionHit) {
            self.seen_x
                .borrow_mut()
                .push(ctx.object().transform().position().x);
        }
    }

    let seen = Rc::new(RefCell::new(Vec::new()));
    let handle = Rc::clone(&seen);
    let registry = ScriptRegistry::new().with("checker", move |_, _| {
        Box::new(Checker {
            seen_x: Rc::clone(&handle),
        })
    });
    let mut context = Context::new(registry);
    let data = ObjectData::from_json(json!({
        "id": 10, "name": "spot",
        "children": [
            circle_node(1, "pillar", 0.0, 1.0, true),
            {
                "id": 2, "name": "probe",
                "transform": {
                    "position": [1.5, 0.0, 0.0],
                    "rotation": [0.0, 0.0, 0.0, 1.0],
                    "scale": [1.0, 1.0, 1.0],
                },
                "components": {
                    "collider": {"shapes": [
                        {"type": "circle", "center": [0.0, 0.0], "radius": 1.0},
                    ]},
                    "gameScript": {"scripts": ["checker"]},
                },
            },
        ],
    }))
    .unwrap();
    block_on(context.add_object(&data, None)).unwrap();

    context.step(1.0);
    assert_eq!(seen.borrow().as_slice(), &[1.5]);

    // And the node is still mutable afterwards.
    context
        .scene_mut()
        .get_mut(ObjectId(2))
        .unwrap()
        .set_position(Vec3::new(9.0, 0.0, 0.0));
    context.step(1.0);
}
