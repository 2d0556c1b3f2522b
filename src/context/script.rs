//! Script lifecycle: the trait collaborators implement and the view of
//! the world a running script gets.
//!
//! Lifecycle events form a closed set ([`ScriptEvent`]); each maps to one
//! trait method and every method defaults to a no-op, so a script only
//! writes the hooks it cares about. The `load` hook may hand back a
//! future (asset fetches, warmups); the context joins all of them before
//! a subtree becomes active.

use futures::future::LocalBoxFuture;

use crate::collision::CollisionHit;
use crate::context::Command;
use crate::error::SceneError;
use crate::scene::{Object3D, ObjectId, SceneGraph};

/// Future returned by a script's `load` hook.
///
/// The whole core is single-threaded and cooperative, so load futures
/// need not be `Send`.
pub type LoadFuture = LocalBoxFuture<'static, Result<(), SceneError>>;

/// The closed set of lifecycle events dispatched to scripts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScriptEvent<'a> {
    Init,
    Tick,
    EnterCollision(&'a CollisionHit),
    IsColliding(&'a CollisionHit),
    LeaveCollision(ObjectId),
}

/// Behavior attached to a node through a script component.
///
/// Implementations are built by a [`ScriptRegistry`]
/// (crate::context::registry::ScriptRegistry) factory from the owning
/// object's id and the model's variables blob.
pub trait Script {
    /// Called once before the subtree becomes active; return a future to
    /// delay activation until it resolves.
    fn load(&mut self, ctx: &mut ScriptCtx<'_>) -> Option<LoadFuture> {
        let _ = ctx;
        None
    }

    /// Called once after every `load` future in the subtree resolved.
    fn init(&mut self, ctx: &mut ScriptCtx<'_>) {
        let _ = ctx;
    }

    /// Called every simulation step.
    fn tick(&mut self, ctx: &mut ScriptCtx<'_>) {
        let _ = ctx;
    }

    /// The owning node started overlapping a static partner.
    fn on_enter_collision(&mut self, ctx: &mut ScriptCtx<'_>, hit: &CollisionHit) {
        let _ = (ctx, hit);
    }

    /// The overlap from a previous tick is still there.
    fn is_colliding(&mut self, ctx: &mut ScriptCtx<'_>, hit: &CollisionHit) {
        let _ = (ctx, hit);
    }

    /// A previously overlapping partner is no longer overlapping.
    fn on_leave_collision(&mut self, ctx: &mut ScriptCtx<'_>, partner: ObjectId) {
        let _ = (ctx, partner);
    }

    /// Dispatch one event to the matching hook.
    fn handle(&mut self, ctx: &mut ScriptCtx<'_>, event: ScriptEvent<'_>) {
        match event {
            ScriptEvent::Init => self.init(ctx),
            ScriptEvent::Tick => self.tick(ctx),
            ScriptEvent::EnterCollision(hit) => self.on_enter_collision(ctx, hit),
            ScriptEvent::IsColliding(hit) => self.is_colliding(ctx, hit),
            ScriptEvent::LeaveCollision(partner) => self.on_leave_collision(ctx, partner),
        }
    }
}

/// What a script sees while one of its hooks runs.
pub struct ScriptCtx<'a> {
    scene: &'a mut SceneGraph,
    object: ObjectId,
    dt: f32,
    commands: &'a [Command],
    removals: &'a mut Vec<ObjectId>,
}

impl<'a> ScriptCtx<'a> {
    pub(crate) fn new(
        scene: &'a mut SceneGraph,
        object: ObjectId,
        dt: f32,
        commands: &'a [Command],
        removals: &'a mut Vec<ObjectId>,
    ) -> Self {
        Self {
            scene,
            object,
            dt,
            commands,
            removals,
        }
    }

    /// Id of the node this script is attached to.
    pub fn object_id(&self) -> ObjectId {
        self.object
    }

    /// The node this script is attached to.
    pub fn object(&mut self) -> &mut Object3D {
        self.scene
            .get_mut(self.object)
            .expect("script dispatched for a node that is not in the tree")
    }

    /// The whole tree, for reading or mutating collaborator nodes.
    pub fn scene(&mut self) -> &mut SceneGraph {
        self.scene
    }

    /// Seconds of simulated time this step advances.
    pub fn dt(&self) -> f32 {
        self.dt
    }

    /// Commands queued for the current tick.
    pub fn commands(&self) -> &[Command] {
        self.commands
    }

    /// Ask the context to remove a subtree once the current dispatch pass
    /// finishes. Removal mid-dispatch would pull nodes out from under
    /// scripts that have not run yet.
    pub fn queue_removal(&mut self, id: ObjectId) {
        self.removals.push(id);
    }
}
