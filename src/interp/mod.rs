//! Consumer-side state buffer with delayed interpolation.
//!
//! The interpolator reconstructs "what the producer's world looked like
//! `delay` milliseconds ago", smoothed between the two received
//! snapshots bracketing that instant, so irregular arrival intervals do
//! not show up as stutter. It performs no I/O and never blocks; reading
//! the current state is a pure function of wall-clock time and the
//! ingested snapshots, safe to call from a render loop at any cadence.
//!
//! Positions and scales interpolate linearly, rotations spherically.
//! Static nodes, and nodes missing from the newer bracket, keep the base
//! snapshot's values.

use std::time::Instant;

use glam::Vec3;
use log::warn;
use rustc_hash::FxHashMap;

use crate::scene::{ObjectData, ObjectId, RotationData};
use crate::state::{Diff, State};

struct Buffered {
    state: State,
    /// Whether this state was ever handed to the caller (directly or as
    /// an interpolation base).
    consumed: bool,
}

/// Delayed, smoothing view over a stream of received states and diffs.
pub struct Interpolator {
    delay_ms: f64,
    clock: Box<dyn Fn() -> f64>,
    /// Received states, ascending by timestamp.
    buffer: Vec<Buffered>,
    /// States pruned from the buffer before the caller ever saw them;
    /// drained by [`Self::current_states`] so no received state is
    /// silently discarded.
    unconsumed: Vec<State>,
    first_timestamp: f64,
    local_origin_ms: f64,
    last_arrival_ms: f64,
    ping_ms: f64,
    started: bool,
}

impl Interpolator {
    /// An interpolator reading the process monotonic clock.
    pub fn new(delay_ms: f64) -> Self {
        let epoch = Instant::now();
        Self::with_clock(
            delay_ms,
            Box::new(move || epoch.elapsed().as_secs_f64() * 1000.0),
        )
    }

    /// An interpolator with an injected millisecond clock, for
    /// deterministic consumers and tests.
    pub fn with_clock(delay_ms: f64, clock: Box<dyn Fn() -> f64>) -> Self {
        Self {
            delay_ms,
            clock,
            buffer: Vec::new(),
            unconsumed: Vec::new(),
            first_timestamp: 0.0,
            local_origin_ms: 0.0,
            last_arrival_ms: 0.0,
            ping_ms: 0.0,
            started: false,
        }
    }

    pub fn delay_ms(&self) -> f64 {
        self.delay_ms
    }

    /// Wall-clock gap between the two most recent arrivals.
    pub fn ping_ms(&self) -> f64 {
        self.ping_ms
    }

    fn now_ms(&self) -> f64 {
        (self.clock)()
    }

    fn virtual_time(&self, local_now_ms: f64) -> f64 {
        self.first_timestamp + (local_now_ms - self.local_origin_ms) - self.delay_ms
    }

    /// Reset all bookkeeping around a first received state.
    pub fn on_first_state(&mut self, state: State) {
        let now = self.now_ms();
        self.buffer.clear();
        self.unconsumed.clear();
        self.first_timestamp = state.timestamp;
        self.local_origin_ms = now;
        self.last_arrival_ms = now;
        self.ping_ms = 0.0;
        self.buffer.push(Buffered {
            state,
            consumed: false,
        });
        self.started = true;
    }

    /// Ingest a full state.
    pub fn on_new_state(&mut self, state: State) {
        if !self.started {
            self.on_first_state(state);
            return;
        }
        let now = self.now_ms();
        self.ping_ms = now - self.last_arrival_ms;
        self.last_arrival_ms = now;

        // Keep the buffer ordered by producer timestamp even if arrivals
        // come out of order.
        let position = self
            .buffer
            .iter()
            .position(|b| b.state.timestamp > state.timestamp)
            .unwrap_or(self.buffer.len());
        self.buffer.insert(
            position,
            Buffered {
                state,
                consumed: false,
            },
        );
        self.prune(now);
    }

    /// Ingest a diff by applying it to the newest received state.
    pub fn on_new_diff(&mut self, diff: &Diff) {
        let Some(last) = self.buffer.last() else {
            warn!("diff received before any state; dropping it");
            return;
        };
        let state = last.state.add(diff);
        self.on_new_state(state);
    }

    /// Drop all but one state older than the current virtual time; the
    /// ones never returned to the caller are kept aside for
    /// [`Self::current_states`].
    fn prune(&mut self, local_now_ms: f64) {
        let virtual_time = self.virtual_time(local_now_ms);
        while self
            .buffer
            .iter()
            .filter(|b| b.state.timestamp < virtual_time)
            .count()
            > 1
        {
            let oldest = self.buffer.remove(0);
            if !oldest.consumed {
                self.unconsumed.push(oldest.state);
            }
        }
    }

    /// The delayed, smoothed state for the current wall-clock instant.
    pub fn current_state(&mut self) -> Option<State> {
        let now = self.now_ms();
        self.state_at(now)
    }

    /// Deterministic twin of [`Self::current_state`] for an explicit
    /// local time in milliseconds.
    pub fn state_at(&mut self, local_now_ms: f64) -> Option<State> {
        if self.buffer.is_empty() {
            return None;
        }
        let virtual_time = self.virtual_time(local_now_ms);

        let base_index = self
            .buffer
            .iter()
            .rposition(|b| b.state.timestamp <= virtual_time);
        let Some(base_index) = base_index else {
            // The delay has not elapsed yet; hold the earliest state.
            self.buffer[0].consumed = true;
            return Some(self.buffer[0].state.clone());
        };

        if base_index == self.buffer.len() - 1 {
            self.buffer[base_index].consumed = true;
            return Some(self.buffer[base_index].state.clone());
        }

        let base = &self.buffer[base_index].state;
        let next = &self.buffer[base_index + 1].state;
        let span = next.timestamp - base.timestamp;
        let ratio = if span > 0.0 {
            ((virtual_time - base.timestamp) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let state = interpolate(base, next, ratio as f32, virtual_time);
        self.buffer[base_index].consumed = true;
        Some(state)
    }

    /// Every state pruned before the caller saw it (in arrival order),
    /// followed by the current state, so a consumer polling slower than
    /// the producer still observes every discrete transition.
    pub fn current_states(&mut self) -> Vec<State> {
        let now = self.now_ms();
        self.states_at(now)
    }

    /// Deterministic twin of [`Self::current_states`].
    pub fn states_at(&mut self, local_now_ms: f64) -> Vec<State> {
        let mut out = std::mem::take(&mut self.unconsumed);
        if let Some(state) = self.state_at(local_now_ms) {
            out.push(state);
        }
        out
    }
}

/// Blend two snapshots at `ratio` ∈ [0, 1].
fn interpolate(base: &State, next: &State, ratio: f32, timestamp: f64) -> State {
    let mut next_nodes: FxHashMap<ObjectId, &ObjectData> = FxHashMap::default();
    next.root().for_each(&mut |node| {
        next_nodes.insert(node.id, node);
    });

    let mut root = base.root().clone();
    root.for_each_mut(&mut |node| {
        if node.is_static {
            return;
        }
        let Some(target) = next_nodes.get(&node.id) else {
            return;
        };
        let from = &node.transform;
        let to = &target.transform;
        let position = Vec3::from_array(from.position).lerp(Vec3::from_array(to.position), ratio);
        let scale = Vec3::from_array(from.scale).lerp(Vec3::from_array(to.scale), ratio);
        let rotation = from.rotation.to_quat().slerp(to.rotation.to_quat(), ratio);
        node.transform.position = position.to_array();
        node.transform.scale = scale.to_array();
        node.transform.rotation = RotationData::Quaternion(rotation.to_array());
    });

    State::new(root, timestamp)
}
