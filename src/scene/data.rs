//! Serialized form of an object subtree.
//!
//! [`ObjectData`] is the JSON-facing shape that descriptions, snapshots,
//! and diffs all share:
//!
//! ```json
//! {
//!   "id": 7, "name": "probe", "static": false, "outdated": false,
//!   "transform": {"position": [0,0,0], "rotation": [0,0,0,1], "scale": [1,1,1]},
//!   "components": {"collider": {"shapes": [{"type": "circle", "center": [0,0], "radius": 1}]}},
//!   "children": []
//! }
//! ```
//!
//! Construction also accepts a column-major `matrix` array in place of
//! `transform`. Serialization emits the decomposed transform and, for
//! non-root nodes, a `parent` back-reference so a diff entry knows where
//! a brand-new node attaches.

use serde::{Deserialize, Serialize};

use crate::error::SceneError;
use crate::scene::id::ObjectId;
use crate::scene::transform::{Transform, TransformData};

/// Serialized object subtree; the unit both states and diffs carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectData {
    #[serde(default = "ObjectId::generate")]
    pub id: ObjectId,
    pub name: String,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    #[serde(default)]
    pub outdated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ObjectId>,
    /// Column-major local matrix; alternative input form for `transform`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matrix: Option<[f32; 16]>,
    #[serde(default)]
    pub transform: TransformData,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub components: serde_json::Map<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ObjectData>,
}

impl ObjectData {
    /// A minimal description with a fresh id and identity transform.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ObjectId::generate(),
            name: name.into(),
            is_static: false,
            outdated: false,
            parent: None,
            matrix: None,
            transform: TransformData::default(),
            components: serde_json::Map::new(),
            children: Vec::new(),
        }
    }

    pub fn from_json(value: serde_json::Value) -> Result<Self, SceneError> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// The local transform this description encodes; an explicit matrix
    /// wins over the decomposed form.
    pub fn effective_transform(&self) -> Transform {
        match self.matrix {
            Some(m) => Transform::from_matrix(glam::Mat4::from_cols_array(&m)),
            None => self.transform.to_transform(),
        }
    }

    /// Deep copy with every id regenerated, for spawning a new instance
    /// from a template (as opposed to `clone()`, which keeps ids).
    pub fn with_fresh_ids(&self) -> Self {
        fn rebuild(data: &ObjectData, parent: Option<ObjectId>) -> ObjectData {
            let id = ObjectId::generate();
            ObjectData {
                id,
                name: data.name.clone(),
                is_static: data.is_static,
                outdated: data.outdated,
                parent,
                matrix: data.matrix,
                transform: data.transform.clone(),
                components: data.components.clone(),
                children: data
                    .children
                    .iter()
                    .map(|child| rebuild(child, Some(id)))
                    .collect(),
            }
        }
        rebuild(self, None)
    }

    /// Pre-order search for `id` in this subtree.
    pub fn find(&self, id: ObjectId) -> Option<&ObjectData> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    pub fn find_mut(&mut self, id: ObjectId) -> Option<&mut ObjectData> {
        if self.id == id {
            return Some(self);
        }
        self.children
            .iter_mut()
            .find_map(|child| child.find_mut(id))
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.find(id).is_some()
    }

    /// Number of nodes in this subtree, self included.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(ObjectData::count).sum::<usize>()
    }

    /// Visit every node pre-order, children in insertion order. The
    /// callback may keep the references (index building).
    pub fn for_each<'a>(&'a self, f: &mut impl FnMut(&'a ObjectData)) {
        f(self);
        for child in &self.children {
            child.for_each(f);
        }
    }

    pub fn for_each_mut(&mut self, f: &mut impl FnMut(&mut ObjectData)) {
        f(self);
        for child in &mut self.children {
            child.for_each_mut(f);
        }
    }
}
