//! Integration tests for the context lifecycle: load, tick dispatch,
//! commands, removals, and snapshots.
//!
//! # Usage
//!
//! ```sh
//! cargo test --test context_integration
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::executor::block_on;
use serde_json::json;

use scenesync::context::registry::ScriptRegistry;
use scenesync::context::script::{LoadFuture, Script, ScriptCtx};
use scenesync::context::{Command, Context, ScriptVenue};
use scenesync::error::SceneError;
use scenesync::scene::{ObjectData, ObjectId};

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Init,
    Tick,
}

type Log = Rc<RefCell<Vec<(ObjectId, Event)>>>;

/// Test double recording every lifecycle event it receives.
struct Recorder {
    log: Log,
}

impl Script for Recorder {
    fn init(&mut self, ctx: &mut ScriptCtx<'_>) {
        self.log.borrow_mut().push((ctx.object_id(), Event::Init));
    }

    fn tick(&mut self, ctx: &mut ScriptCtx<'_>) {
        self.log.borrow_mut().push((ctx.object_id(), Event::Tick));
    }
}

fn recorder_registry(log: &Log) -> ScriptRegistry {
    let log = Rc::clone(log);
    ScriptRegistry::new().with("recorder", move |_, _| {
        Box::new(Recorder {
            log: Rc::clone(&log),
        })
    })
}

fn scripted_node(id: u64, name: &str) -> serde_json::Value {
    json!({
        "id": id, "name": name,
        "components": {"gameScript": {"scripts": ["recorder"]}},
    })
}

#[test]
fn load_dispatches_init_once_per_script() {
    let log: Log = Log::default();
    let mut context = Context::new(recorder_registry(&log));
    let data = ObjectData::from_json(json!({
        "id": 1, "name": "top",
        "components": {"gameScript": {"scripts": ["recorder"]}},
        "children": [scripted_node(2, "inner")],
    }))
    .unwrap();

    block_on(context.add_object(&data, None)).unwrap();

    let events = log.borrow();
    assert_eq!(
        *events,
        vec![(ObjectId(1), Event::Init), (ObjectId(2), Event::Init)]
    );
}

#[test]
fn tick_dispatch_is_preorder() {
    let log: Log = Log::default();
    let mut context = Context::new(recorder_registry(&log));
    let data = ObjectData::from_json(json!({
        "id": 1, "name": "top",
        "components": {"gameScript": {"scripts": ["recorder"]}},
        "children": [scripted_node(2, "first"), scripted_node(3, "second")],
    }))
    .unwrap();
    block_on(context.add_object(&data, None)).unwrap();
    log.borrow_mut().clear();

    context.step(1.0 / 60.0);

    let events = log.borrow();
    assert_eq!(
        *events,
        vec![
            (ObjectId(1), Event::Tick),
            (ObjectId(2), Event::Tick),
            (ObjectId(3), Event::Tick),
        ]
    );
}

#[test]
fn loading_twice_is_fatal() {
    let log: Log = Log::default();
    let mut context = Context::new(recorder_registry(&log));
    let data = ObjectData::from_json(scripted_node(1, "solo")).unwrap();
    block_on(context.add_object(&data, None)).unwrap();

    assert!(matches!(
        block_on(context.load()),
        Err(SceneError::ControllerAlreadyInitialized(id)) if id == ObjectId(1)
    ));
}

#[test]
fn unknown_script_id_fails_load() {
    let mut context = Context::new(ScriptRegistry::new());
    let data = ObjectData::from_json(json!({
        "id": 1, "name": "broken",
        "components": {"gameScript": {"scripts": ["ghost"]}},
    }))
    .unwrap();

    assert!(matches!(
        block_on(context.add_object(&data, None)),
        Err(SceneError::UnknownScriptId(id)) if id == "ghost"
    ));
}

#[test]
fn load_futures_resolve_before_init() {
    // A script whose load hook completes asynchronously; init must only
    // run after the future resolved.
    struct SlowLoader {
        loaded: Rc<Cell<bool>>,
        init_saw_loaded: Rc<Cell<bool>>,
    }
    impl Script for SlowLoader {
        fn load(&mut self, _ctx: &mut ScriptCtx<'_>) -> Option<LoadFuture> {
            let loaded = Rc::clone(&self.loaded);
            Some(Box::pin(async move {
                loaded.set(true);
                Ok(())
            }))
        }
        fn init(&mut self, _ctx: &mut ScriptCtx<'_>) {
            self.init_saw_loaded.set(self.loaded.get());
        }
    }

    let loaded = Rc::new(Cell::new(false));
    let init_saw_loaded = Rc::new(Cell::new(false));
    let (l, i) = (Rc::clone(&loaded), Rc::clone(&init_saw_loaded));
    let registry = ScriptRegistry::new().with("slow", move |_, _| {
        Box::new(SlowLoader {
            loaded: Rc::clone(&l),
            init_saw_loaded: Rc::clone(&i),
        })
    });

    let mut context = Context::new(registry);
    let data = ObjectData::from_json(json!({
        "id": 1, "name": "asset_user",
        "components": {"gameScript": {"scripts": ["slow"]}},
    }))
    .unwrap();
    block_on(context.add_object(&data, None)).unwrap();

    assert!(loaded.get());
    assert!(init_saw_loaded.get());
}

#[test]
fn failing_load_future_surfaces_to_caller() {
    struct Doomed;
    impl Script for Doomed {
        fn load(&mut self, _ctx: &mut ScriptCtx<'_>) -> Option<LoadFuture> {
            Some(Box::pin(async {
                Err(SceneError::ScriptLoad("asset server unreachable".into()))
            }))
        }
    }

    let registry = ScriptRegistry::new().with("doomed", |_, _| Box::new(Doomed));
    let mut context = Context::new(registry);
    let data = ObjectData::from_json(json!({
        "id": 1, "name": "unlucky",
        "components": {"gameScript": {"scripts": ["doomed"]}},
    }))
    .unwrap();

    assert!(matches!(
        block_on(context.add_object(&data, None)),
        Err(SceneError::ScriptLoad(_))
    ));
}

#[test]
fn commands_reach_scripts_and_clear_after_step() {
    struct CommandCounter {
        seen: Rc<Cell<usize>>,
    }
    impl Script for CommandCounter {
        fn tick(&mut self, ctx: &mut ScriptCtx<'_>) {
            self.seen.set(self.seen.get() + ctx.commands().len());
        }
    }

    let seen = Rc::new(Cell::new(0));
    let handle = Rc::clone(&seen);
    let registry = ScriptRegistry::new().with("counter", move |_, _| {
        Box::new(CommandCounter {
            seen: Rc::clone(&handle),
        })
    });
    let mut context = Context::new(registry);
    let data = ObjectData::from_json(json!({
        "id": 1, "name": "listener",
        "components": {"gameScript": {"scripts": ["counter"]}},
    }))
    .unwrap();
    block_on(context.add_object(&data, None)).unwrap();

    context.on_command([
        Command {
            kind: "ping".into(),
            data: serde_json::Value::Null,
        },
        Command {
            kind: "pong".into(),
            data: json!({"n": 1}),
        },
    ]);
    context.step(0.016);
    assert_eq!(seen.get(), 2);

    // The queue was cleared at the end of the step.
    context.step(0.016);
    assert_eq!(seen.get(), 2);
}

#[test]
fn script_queued_removal_takes_effect_within_step() {
    struct SelfDestruct;
    impl Script for SelfDestruct {
        fn tick(&mut self, ctx: &mut ScriptCtx<'_>) {
            let id = ctx.object_id();
            ctx.queue_removal(id);
        }
    }

    let registry = ScriptRegistry::new().with("boom", |_, _| Box::new(SelfDestruct));
    let mut context = Context::new(registry);
    let data = ObjectData::from_json(json!({
        "id": 9, "name": "ephemeral",
        "components": {"gameScript": {"scripts": ["boom"]}},
    }))
    .unwrap();
    block_on(context.add_object(&data, None)).unwrap();

    context.step(0.016);
    assert!(!context.scene().contains(ObjectId(9)));
    assert!(!context.to_state(true).includes(ObjectId(9)));
}

#[test]
fn venue_selects_which_script_kind_runs() {
    let log: Log = Log::default();
    let data = ObjectData::from_json(json!({
        "id": 1, "name": "mirrored",
        "components": {
            "gameScript": {"scripts": ["recorder"]},
            "externalScript": {"scripts": ["recorder"]},
        },
    }))
    .unwrap();

    // Game venue: exactly one controller (the game one) runs.
    let mut game = Context::new(recorder_registry(&log));
    block_on(game.add_object(&data, None)).unwrap();
    game.step(0.016);
    assert_eq!(log.borrow().len(), 2); // one init + one tick

    // External venue over the same description.
    log.borrow_mut().clear();
    let mut external =
        Context::new(recorder_registry(&log)).with_venue(ScriptVenue::External);
    block_on(external.add_object(&data, None)).unwrap();
    external.step(0.016);
    assert_eq!(log.borrow().len(), 2);
}

#[test]
fn to_state_clears_outdated_flags() {
    let mut context = Context::new(ScriptRegistry::new());
    let data = ObjectData::from_json(json!({"id": 5, "name": "thing"})).unwrap();
    block_on(context.add_object(&data, None)).unwrap();
    context
        .scene_mut()
        .get_mut(ObjectId(5))
        .unwrap()
        .set_outdated(true);

    let state = context.to_state(true);
    // The snapshot captured the flag as it was...
    assert!(state.root().find(ObjectId(5)).unwrap().outdated);
    // ...and snapshotting reset the live tree.
    let next = context.to_state(true);
    assert!(!next.root().find(ObjectId(5)).unwrap().outdated);
}

#[test]
fn add_object_under_named_parent() {
    let mut context = Context::new(ScriptRegistry::new());
    let base = ObjectData::from_json(json!({"id": 1, "name": "anchor"})).unwrap();
    block_on(context.add_object(&base, None)).unwrap();

    let child = ObjectData::from_json(json!({"id": 2, "name": "attachment"})).unwrap();
    block_on(context.add_object(&child, Some(ObjectId(1)))).unwrap();

    assert_eq!(
        context.scene().get(ObjectId(2)).unwrap().parent(),
        Some(ObjectId(1))
    );
    // The parent re-serializes because its child list changed.
    assert!(context.scene().get(ObjectId(1)).unwrap().outdated());
}

#[test]
fn add_object_under_missing_parent_fails() {
    let mut context = Context::new(ScriptRegistry::new());
    let child = ObjectData::from_json(json!({"id": 2, "name": "orphan"})).unwrap();
    assert!(matches!(
        block_on(context.add_object(&child, Some(ObjectId(77)))),
        Err(SceneError::UnknownObject(id)) if id == ObjectId(77)
    ));
}
