//! The simulation context: tick loop, lifecycle, collision dispatch.
//!
//! A [`Context`] owns the scene graph, the script registry, the
//! broad-phase collision index, and the per-tick command queue. Scripts
//! never hold references into the tree; while a node's scripts run, their
//! controllers are temporarily moved out of the node so the scripts can
//! borrow the rest of the scene mutably.
//!
//! Subtree lifecycle: Unloaded → Loading → Active → Removed. A node is
//! "loaded" exactly when its controllers exist, so calling `load` twice
//! on the same subtree is detectable and fatal.
//!
//! Submodules overview:
//! - [`script`] – the `Script` trait, lifecycle events, script context
//! - [`registry`] – script id → factory mapping

pub mod registry;
pub mod script;

use log::{debug, trace, warn};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::collision::grid::ShapeRef;
use crate::collision::{shape, CollisionHit, CollisionIndex};
use crate::components::collider::ColliderController;
use crate::components::script::ScriptController;
use crate::components::{Component, ComponentKind};
use crate::config::SimConfig;
use crate::context::registry::ScriptRegistry;
use crate::context::script::{LoadFuture, ScriptCtx, ScriptEvent};
use crate::error::SceneError;
use crate::scene::{Object3D, ObjectData, ObjectId, SceneGraph};
use crate::state::State;

/// Externally produced instruction consumed by scripts during a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Which script component kind this context instantiates and runs.
///
/// The same description serves both sides of a connection: the producer
/// runs the `gameScript` components, a consumer mirroring the scene runs
/// the `externalScript` ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScriptVenue {
    #[default]
    Game,
    External,
}

impl ScriptVenue {
    fn component_kind(self) -> ComponentKind {
        match self {
            ScriptVenue::Game => ComponentKind::GameScript,
            ScriptVenue::External => ComponentKind::ExternalScript,
        }
    }
}

/// Owner of the simulated world and its per-tick logic.
pub struct Context {
    scene: SceneGraph,
    registry: ScriptRegistry,
    venue: ScriptVenue,
    collision: CollisionIndex,
    commands: Vec<Command>,
    pending_removals: Vec<ObjectId>,
    elapsed_ms: f64,
    current_dt: f32,
}

impl Context {
    pub fn new(registry: ScriptRegistry) -> Self {
        Self::with_config(registry, &SimConfig::new())
    }

    pub fn with_config(registry: ScriptRegistry, config: &SimConfig) -> Self {
        Self {
            scene: SceneGraph::new(),
            registry,
            venue: ScriptVenue::default(),
            collision: CollisionIndex::new(config.collision_cell_size),
            commands: Vec::new(),
            pending_removals: Vec::new(),
            elapsed_ms: 0.0,
            current_dt: 0.0,
        }
    }

    /// Select which script component kind this context runs.
    pub fn with_venue(mut self, venue: ScriptVenue) -> Self {
        self.venue = venue;
        self
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut SceneGraph {
        &mut self.scene
    }

    /// Simulated time since construction, in milliseconds.
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    /// Run the load sequence on the whole tree.
    pub async fn load(&mut self) -> Result<(), SceneError> {
        let root = self.scene.root();
        self.load_subtree(root).await
    }

    /// Attach a description under `parent` (the root when `None`) and run
    /// the load sequence on the new subtree.
    pub async fn add_object(
        &mut self,
        data: &ObjectData,
        parent: Option<ObjectId>,
    ) -> Result<ObjectId, SceneError> {
        let parent = parent.unwrap_or_else(|| self.scene.root());
        let id = self.scene.instantiate(data, parent)?;
        self.load_subtree(id).await?;
        if let Some(parent_node) = self.scene.get_mut(parent) {
            parent_node.set_outdated(true);
        }
        debug!("added subtree {} under {}", id, parent);
        Ok(id)
    }

    /// Detach the subtree at `id`, unregister its collider shapes, and
    /// purge its ids from every other node's touching buffer.
    pub fn remove_object(&mut self, id: ObjectId) -> Result<(), SceneError> {
        let parent = self.scene.get(id).and_then(Object3D::parent);
        let removed = self.scene.remove(id)?;
        let mut removed_ids = FxHashSet::default();
        for node in &removed {
            self.collision.unregister(node.id());
            removed_ids.insert(node.id());
        }
        self.scene.purge_touching(&removed_ids);
        if let Some(parent) = parent {
            if let Some(parent_node) = self.scene.get_mut(parent) {
                parent_node.set_outdated(true);
            }
        }
        Ok(())
    }

    /// Append externally produced commands for the next tick's scripts.
    pub fn on_command(&mut self, commands: impl IntoIterator<Item = Command>) {
        self.commands.extend(commands);
    }

    /// Advance simulated time: dispatch `tick` pre-order, run collision
    /// detection, apply script-queued removals, clear the command queue.
    pub fn step(&mut self, dt: f32) {
        self.elapsed_ms += f64::from(dt) * 1000.0;
        self.current_dt = dt;
        let ids = self.scene.collect_ids(self.scene.root());
        for id in ids {
            self.dispatch(id, ScriptEvent::Tick);
        }
        self.apply_queued_removals();
        self.run_collision();
        self.apply_queued_removals();
        self.commands.clear();
        self.current_dt = 0.0;
    }

    /// Snapshot the whole tree, then clear every node's dirty flag: the
    /// snapshot is the moment everything has been accounted for.
    pub fn to_state(&mut self, full: bool) -> State {
        let root = self.scene.root();
        let data = self.scene.serialize(root, full);
        self.scene.clear_outdated();
        State::new(data, self.elapsed_ms)
    }

    async fn load_subtree(&mut self, start: ObjectId) -> Result<(), SceneError> {
        let ids = self.scene.collect_ids(start);
        for &id in &ids {
            self.init_controllers(id)?;
        }
        let mut futures: Vec<LoadFuture> = Vec::new();
        for &id in &ids {
            futures.extend(self.collect_load_futures(id));
        }
        let pending = futures.len();
        futures::future::try_join_all(futures).await?;
        for &id in &ids {
            self.prepare_collider(id);
        }
        for &id in &ids {
            self.dispatch(id, ScriptEvent::Init);
        }
        debug!(
            "loaded subtree {} ({} nodes, {} load futures)",
            start,
            ids.len(),
            pending
        );
        Ok(())
    }

    fn init_controllers(&mut self, id: ObjectId) -> Result<(), SceneError> {
        let registry = &self.registry;
        let venue_kind = self.venue.component_kind();
        let Some(node) = self.scene.get_mut(id) else {
            return Err(SceneError::UnknownObject(id));
        };
        for component in node.components_mut().iter_mut() {
            let kind = component.kind();
            match component {
                Component::GameScript(c) | Component::ExternalScript(c) => {
                    if kind != venue_kind {
                        continue;
                    }
                    if c.controller.is_some() {
                        return Err(SceneError::ControllerAlreadyInitialized(id));
                    }
                    let mut scripts = Vec::with_capacity(c.model.scripts.len());
                    for script_id in &c.model.scripts {
                        scripts.push(registry.create(script_id, id, &c.model.variables)?);
                    }
                    c.controller = Some(ScriptController { scripts });
                }
                Component::Collider(c) => {
                    if c.controller.is_some() {
                        return Err(SceneError::ControllerAlreadyInitialized(id));
                    }
                    c.controller = Some(ColliderController::build(&c.model)?);
                }
                Component::Render(_) | Component::Audio(_) => {}
            }
        }
        Ok(())
    }

    fn collect_load_futures(&mut self, id: ObjectId) -> Vec<LoadFuture> {
        let Some(node) = self.scene.get_mut(id) else {
            return Vec::new();
        };
        let mut taken = node.components_mut().take_script_controllers();
        if taken.is_empty() {
            return Vec::new();
        }
        let mut futures = Vec::new();
        {
            let mut ctx = ScriptCtx::new(
                &mut self.scene,
                id,
                0.0,
                &self.commands,
                &mut self.pending_removals,
            );
            for (_, controller) in taken.iter_mut() {
                for script in controller.scripts.iter_mut() {
                    if let Some(future) = script.load(&mut ctx) {
                        futures.push(future);
                    }
                }
            }
        }
        if let Some(node) = self.scene.get_mut(id) {
            node.components_mut().restore_script_controllers(taken);
        }
        futures
    }

    /// Update a collider's world shapes after load; static shapes also go
    /// into the broad-phase index.
    fn prepare_collider(&mut self, id: ObjectId) {
        let has_controller = self
            .scene
            .get(id)
            .and_then(|n| n.components().collider())
            .map(|c| c.controller.is_some())
            .unwrap_or(false);
        if !has_controller {
            return;
        }
        let world = self.scene.world_matrix(id);
        let is_static = self.scene.get(id).map(Object3D::is_static).unwrap_or(false);
        let Some(controller) = self
            .scene
            .get_mut(id)
            .and_then(|n| n.components_mut().collider_mut())
            .and_then(|c| c.controller.as_mut())
        else {
            return;
        };
        controller.update_shapes(&world);
        if is_static {
            for (index, wrapper) in controller.wrappers.iter().enumerate() {
                self.collision
                    .register(&wrapper.aabb(), ShapeRef { object: id, shape: index });
            }
        }
    }

    /// Run one event through every script on `id`, with the controllers
    /// moved out so scripts can mutate the scene.
    fn dispatch(&mut self, id: ObjectId, event: ScriptEvent<'_>) {
        let Some(node) = self.scene.get_mut(id) else {
            return;
        };
        let mut taken = node.components_mut().take_script_controllers();
        if taken.is_empty() {
            return;
        }
        {
            let mut ctx = ScriptCtx::new(
                &mut self.scene,
                id,
                self.current_dt,
                &self.commands,
                &mut self.pending_removals,
            );
            for (_, controller) in taken.iter_mut() {
                for script in controller.scripts.iter_mut() {
                    script.handle(&mut ctx, event);
                }
            }
        }
        if let Some(node) = self.scene.get_mut(id) {
            node.components_mut().restore_script_controllers(taken);
        }
    }

    fn apply_queued_removals(&mut self) {
        if self.pending_removals.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut self.pending_removals);
        for id in pending {
            if !self.scene.contains(id) {
                continue;
            }
            if let Err(err) = self.remove_object(id) {
                warn!("queued removal of {} failed: {}", id, err);
            }
        }
    }

    fn run_collision(&mut self) {
        let ids = self.scene.collect_ids(self.scene.root());

        // Refresh mover shapes from their current world transforms.
        // Static shapes were fixed at load time.
        for &id in &ids {
            let is_mover = self
                .scene
                .get(id)
                .map(|n| {
                    !n.is_static()
                        && n.components()
                            .collider()
                            .map(|c| c.controller.is_some())
                            .unwrap_or(false)
                })
                .unwrap_or(false);
            if !is_mover {
                continue;
            }
            let world = self.scene.world_matrix(id);
            if let Some(controller) = self
                .scene
                .get_mut(id)
                .and_then(|n| n.components_mut().collider_mut())
                .and_then(|c| c.controller.as_mut())
            {
                controller.update_shapes(&world);
            }
        }

        struct MoverEvents {
            mover: ObjectId,
            enters: Vec<CollisionHit>,
            sustains: Vec<CollisionHit>,
            leaves: Vec<ObjectId>,
            now_touching: FxHashSet<ObjectId>,
        }

        let mut all_events: Vec<MoverEvents> = Vec::new();
        for &id in &ids {
            let Some(node) = self.scene.get(id) else {
                continue;
            };
            if node.is_static() {
                continue;
            }
            let Some(controller) = node
                .components()
                .collider()
                .and_then(|c| c.controller.as_ref())
            else {
                continue;
            };

            let mut overlaps: FxHashMap<ObjectId, CollisionHit> = FxHashMap::default();
            for (mover_shape, wrapper) in controller.wrappers.iter().enumerate() {
                for candidate in self.collision.query(&wrapper.aabb()) {
                    if candidate.object == id || overlaps.contains_key(&candidate.object) {
                        continue;
                    }
                    let Some(partner_wrapper) = self
                        .scene
                        .get(candidate.object)
                        .and_then(|n| n.components().collider())
                        .and_then(|c| c.controller.as_ref())
                        .and_then(|c| c.wrappers.get(candidate.shape))
                    else {
                        continue;
                    };
                    if shape::overlap(wrapper.world(), partner_wrapper.world()) {
                        overlaps.insert(
                            candidate.object,
                            CollisionHit {
                                partner: candidate.object,
                                mover_shape,
                                partner_shape: candidate.shape,
                            },
                        );
                    }
                }
            }

            let previous = &controller.touching;
            if overlaps.is_empty() && previous.is_empty() {
                continue;
            }
            let mut events = MoverEvents {
                mover: id,
                enters: Vec::new(),
                sustains: Vec::new(),
                leaves: Vec::new(),
                now_touching: overlaps.keys().copied().collect(),
            };
            for (partner, hit) in &overlaps {
                if previous.contains(partner) {
                    events.sustains.push(*hit);
                } else {
                    events.enters.push(*hit);
                }
            }
            for partner in previous {
                if !overlaps.contains_key(partner) {
                    events.leaves.push(*partner);
                }
            }
            // Stable order across ticks regardless of hash iteration.
            events.enters.sort_by_key(|h| h.partner);
            events.sustains.sort_by_key(|h| h.partner);
            events.leaves.sort();
            all_events.push(events);
        }

        // Commit the new touching sets before any script runs, so every
        // script observes this tick's buffers.
        for events in &all_events {
            if let Some(controller) = self
                .scene
                .get_mut(events.mover)
                .and_then(|n| n.components_mut().collider_mut())
                .and_then(|c| c.controller.as_mut())
            {
                controller.touching = events.now_touching.clone();
            }
        }

        for events in &all_events {
            trace!(
                "collision events for {}: {} enter, {} sustain, {} leave",
                events.mover,
                events.enters.len(),
                events.sustains.len(),
                events.leaves.len()
            );
            for hit in &events.enters {
                self.dispatch(events.mover, ScriptEvent::EnterCollision(hit));
            }
            for hit in &events.sustains {
                self.dispatch(events.mover, ScriptEvent::IsColliding(hit));
            }
            for &partner in &events.leaves {
                self.dispatch(events.mover, ScriptEvent::LeaveCollision(partner));
            }
        }
    }
}
