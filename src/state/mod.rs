//! Scene snapshots and the diff/apply pair.
//!
//! A [`State`] is the full serialized tree at one instant, immutable by
//! convention. [`State::sub`] produces the [`Diff`] against an earlier
//! snapshot and [`State::add`] applies one, with the round-trip
//! guarantee that for states `a` then `b` of the same context,
//! `a.add(&b.sub(&a)) == b`.
//!
//! Submodules overview:
//! - [`diff`] – the delta payload itself

pub mod diff;

pub use diff::Diff;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::error::SceneError;
use crate::scene::{ObjectData, ObjectId};

/// Immutable-by-convention snapshot of the whole tree plus a timestamp
/// in producer milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub timestamp: f64,
    root: ObjectData,
}

impl State {
    pub fn new(root: ObjectData, timestamp: f64) -> Self {
        Self { timestamp, root }
    }

    pub fn root(&self) -> &ObjectData {
        &self.root
    }

    /// Whether an entity with `id` exists in this snapshot.
    pub fn includes(&self, id: ObjectId) -> bool {
        self.root.contains(id)
    }

    /// Every id in this snapshot.
    pub fn ids(&self) -> FxHashSet<ObjectId> {
        let mut ids = FxHashSet::default();
        self.root.for_each(&mut |node| {
            ids.insert(node.id);
        });
        ids
    }

    /// Structural equality, field by field.
    pub fn equals(&self, other: &State) -> bool {
        self == other
    }

    /// Delta from `previous` to `self` (`self` is the later state).
    ///
    /// Records every id encountered; records a serialized form only for
    /// subtree roots that are new or flagged outdated. Their descendants
    /// are already inside the recursive form, so recording them again
    /// would blow up the diff on deep outdated subtrees. A node also
    /// re-emits on the snapshot where its flag cleared, since its
    /// serialized form (the flag included) differs from what the
    /// consumer holds.
    pub fn sub(&self, previous: &State) -> Diff {
        let mut previous_nodes: FxHashMap<ObjectId, &ObjectData> = FxHashMap::default();
        previous.root.for_each(&mut |node| {
            previous_nodes.insert(node.id, node);
        });
        let mut diff = Diff {
            timestamp: self.timestamp,
            ids: FxHashSet::default(),
            changed: FxHashMap::default(),
        };
        fn walk(
            node: &ObjectData,
            previous_nodes: &FxHashMap<ObjectId, &ObjectData>,
            diff: &mut Diff,
            ancestor_recorded: bool,
        ) {
            diff.ids.insert(node.id);
            let record = !ancestor_recorded
                && match previous_nodes.get(&node.id) {
                    None => true,
                    Some(prev) => node.outdated || prev.outdated,
                };
            if record {
                diff.changed.insert(node.id, node.clone());
            }
            for child in &node.children {
                walk(child, previous_nodes, diff, ancestor_recorded || record);
            }
        }
        walk(&self.root, &previous_nodes, &mut diff, false);
        diff
    }

    /// Apply a diff to this snapshot, producing the later state.
    ///
    /// Entities absent from the diff's id set are dropped; changed forms
    /// replace their subtree in place; an unknown id attaches as a new
    /// node under the parent its serialized form names.
    ///
    /// # Panics
    ///
    /// Panics if the id count after application does not match the
    /// diff's id set: that is a logic bug, and aborting loudly beats
    /// silently desyncing producer and consumer.
    pub fn add(&self, diff: &Diff) -> State {
        fn prune(node: &mut ObjectData, keep: &FxHashSet<ObjectId>) {
            node.children.retain(|child| keep.contains(&child.id));
            for child in &mut node.children {
                prune(child, keep);
            }
        }

        let mut root = self.root.clone();
        prune(&mut root, &diff.ids);

        for (id, data) in &diff.changed {
            if *id == root.id {
                root = data.clone();
                continue;
            }
            if let Some(node) = root.find_mut(*id) {
                *node = data.clone();
            } else {
                let parent = data
                    .parent
                    .unwrap_or_else(|| panic!("diff entry {} names no parent to attach under", id));
                let Some(parent_node) = root.find_mut(parent) else {
                    panic!("diff entry {} names unknown parent {}", id, parent);
                };
                parent_node.children.push(data.clone());
            }
        }

        let applied = State::new(root, diff.timestamp);
        let count = applied.root.count();
        assert_eq!(
            count,
            diff.ids.len(),
            "id count after applying diff ({count}) does not match the diff's id set ({})",
            diff.ids.len()
        );
        applied
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    pub fn from_json(value: serde_json::Value) -> Result<Self, SceneError> {
        Ok(serde_json::from_value(value)?)
    }
}
