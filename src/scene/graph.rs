//! Arena-backed scene tree.
//!
//! Nodes are stored in an id-keyed map and reference each other by
//! [`ObjectId`] only, so removing a subtree during iteration invalidates
//! nothing but the removed ids. Traversal is pre-order with children in
//! insertion order, which makes serialization and dispatch deterministic.

use glam::Mat4;
use log::debug;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::SceneError;
use crate::scene::data::ObjectData;
use crate::scene::id::ObjectId;
use crate::scene::object3d::Object3D;

/// Visitor verdict for [`SceneGraph::traverse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Continue,
    Stop,
}

/// The tree of live nodes owned by a context.
#[derive(Debug)]
pub struct SceneGraph {
    nodes: FxHashMap<ObjectId, Object3D>,
    root: ObjectId,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// An empty tree holding only the root node.
    pub fn new() -> Self {
        let root = Object3D::new_root();
        let mut nodes = FxHashMap::default();
        let root_id = root.id();
        nodes.insert(root_id, root);
        Self {
            nodes,
            root: root_id,
        }
    }

    pub fn root(&self) -> ObjectId {
        self.root
    }

    pub fn get(&self, id: ObjectId) -> Option<&Object3D> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut Object3D> {
        self.nodes.get_mut(&id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Recursively build a description's subtree under `parent`.
    ///
    /// Fails without side effects if the parent is missing, any id in the
    /// description already exists, or any component fails to parse.
    pub fn instantiate(
        &mut self,
        data: &ObjectData,
        parent: ObjectId,
    ) -> Result<ObjectId, SceneError> {
        if !self.contains(parent) {
            return Err(SceneError::UnknownObject(parent));
        }
        let mut incoming = FxHashSet::default();
        let mut duplicate = None;
        data.for_each(&mut |node| {
            if self.contains(node.id) || !incoming.insert(node.id) {
                duplicate.get_or_insert(node.id);
            }
        });
        if let Some(id) = duplicate {
            return Err(SceneError::DuplicateObjectId(id));
        }
        match self.instantiate_inner(data, parent) {
            Ok(id) => Ok(id),
            Err(err) => {
                // Unwind the partially attached subtree.
                if self.contains(data.id) {
                    let _ = self.remove(data.id);
                }
                Err(err)
            }
        }
    }

    fn instantiate_inner(
        &mut self,
        data: &ObjectData,
        parent: ObjectId,
    ) -> Result<ObjectId, SceneError> {
        let node = Object3D::from_data(data, Some(parent))?;
        let id = node.id();
        self.nodes.insert(id, node);
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.push_child(id);
        }
        for child in &data.children {
            self.instantiate_inner(child, id)?;
        }
        Ok(id)
    }

    /// Detach and return the subtree rooted at `id`, pre-order.
    ///
    /// The root itself has no parent to detach from and cannot be removed.
    pub fn remove(&mut self, id: ObjectId) -> Result<Vec<Object3D>, SceneError> {
        if id == self.root || !self.contains(id) {
            return Err(SceneError::UnknownObject(id));
        }
        let ids = self.collect_ids(id);
        if let Some(parent) = self.nodes.get(&id).and_then(Object3D::parent) {
            if let Some(parent_node) = self.nodes.get_mut(&parent) {
                parent_node.remove_child(id);
            }
        }
        let removed: Vec<Object3D> = ids
            .iter()
            .filter_map(|node_id| self.nodes.remove(node_id))
            .collect();
        debug!("removed subtree {} ({} nodes)", id, removed.len());
        Ok(removed)
    }

    /// Ids of the subtree rooted at `from`, pre-order.
    pub fn collect_ids(&self, from: ObjectId) -> Vec<ObjectId> {
        let mut out = Vec::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            out.push(id);
            for child in node.children().iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    /// Pre-order walk from `from`; returns `false` if the visitor stopped
    /// early.
    pub fn traverse(&self, from: ObjectId, mut visitor: impl FnMut(&Object3D) -> Visit) -> bool {
        for id in self.collect_ids(from) {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            if visitor(node) == Visit::Stop {
                return false;
            }
        }
        true
    }

    /// First node (pre-order) with the given name.
    pub fn find_by_name(&self, name: &str) -> Option<ObjectId> {
        let mut found = None;
        self.traverse(self.root, |node| {
            if node.name() == name {
                found = Some(node.id());
                Visit::Stop
            } else {
                Visit::Continue
            }
        });
        found
    }

    /// Serialized form of the subtree at `id`, recomputing local matrices.
    pub fn serialize(&mut self, id: ObjectId, include_controller_backed: bool) -> ObjectData {
        let children: Vec<ObjectId> = self
            .nodes
            .get(&id)
            .map(|n| n.children().to_vec())
            .unwrap_or_default();
        let mut data = self
            .nodes
            .get_mut(&id)
            .map(|n| n.to_data(include_controller_backed))
            .unwrap_or_else(|| ObjectData::new("missing"));
        data.children = children
            .into_iter()
            .map(|child| self.serialize(child, include_controller_backed))
            .collect();
        data
    }

    /// World matrix of `id`: the product of local matrices root-first.
    pub fn world_matrix(&mut self, id: ObjectId) -> Mat4 {
        let mut chain = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            chain.push(current);
            cursor = self.nodes.get(&current).and_then(Object3D::parent);
        }
        let mut acc = Mat4::IDENTITY;
        for node_id in chain.into_iter().rev() {
            if let Some(node) = self.nodes.get_mut(&node_id) {
                acc *= node.local_matrix();
            }
        }
        acc
    }

    /// Clear every node's dirty flag (after a snapshot accounted for it).
    pub fn clear_outdated(&mut self) {
        for node in self.nodes.values_mut() {
            node.set_outdated(false);
        }
    }

    /// Drop removed partner ids from every collider's touching buffer so
    /// no spurious leave event fires against a node that no longer exists.
    pub fn purge_touching(&mut self, removed: &FxHashSet<ObjectId>) {
        for node in self.nodes.values_mut() {
            if let Some(collider) = node.components_mut().collider_mut() {
                if let Some(controller) = collider.controller.as_mut() {
                    controller.touching.retain(|id| !removed.contains(id));
                }
            }
        }
    }
}
