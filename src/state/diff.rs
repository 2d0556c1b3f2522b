//! Delta between two snapshots.
//!
//! A diff is the transport payload: the authoritative set of ids that
//! exist in the later state, plus the full serialized form of every
//! subtree root that is new or was flagged outdated. Descendants of a
//! recorded subtree ride along inside its recursive form and are never
//! recorded again individually.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::error::SceneError;
use crate::scene::{ObjectData, ObjectId};

/// Compact delta sufficient to rebuild a later state from an earlier one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diff {
    /// Timestamp of the later state.
    pub timestamp: f64,
    /// Every id present in the later state, changed or not.
    pub ids: FxHashSet<ObjectId>,
    /// Serialized subtree roots that are new or outdated.
    pub changed: FxHashMap<ObjectId, ObjectData>,
}

impl Diff {
    pub fn includes(&self, id: ObjectId) -> bool {
        self.ids.contains(&id)
    }

    /// True when no entity's serialized form changed.
    pub fn is_clean(&self) -> bool {
        self.changed.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    pub fn from_json(value: serde_json::Value) -> Result<Self, SceneError> {
        Ok(serde_json::from_value(value)?)
    }
}
