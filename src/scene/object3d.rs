//! A single node of the simulated scene tree.
//!
//! Nodes own their components and know their parent and children by id;
//! the containing [`SceneGraph`](crate::scene::SceneGraph) owns the nodes
//! themselves. Mutating the transform marks the node `outdated` so the
//! next snapshot re-emits its serialized form.

use glam::{Quat, Vec3};

use crate::components::Components;
use crate::error::SceneError;
use crate::scene::data::ObjectData;
use crate::scene::id::ObjectId;
use crate::scene::transform::Transform;

/// A scene node: transform, flags, components, tree links.
#[derive(Debug)]
pub struct Object3D {
    id: ObjectId,
    name: String,
    transform: Transform,
    is_static: bool,
    outdated: bool,
    parent: Option<ObjectId>,
    children: Vec<ObjectId>,
    components: Components,
}

impl Object3D {
    /// Build a node (without children) from its serialized form.
    pub fn from_data(data: &ObjectData, parent: Option<ObjectId>) -> Result<Self, SceneError> {
        Ok(Self {
            id: data.id,
            name: data.name.clone(),
            transform: data.effective_transform(),
            is_static: data.is_static,
            outdated: data.outdated,
            parent,
            children: Vec::new(),
            components: Components::from_map(&data.components)?,
        })
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn outdated(&self) -> bool {
        self.outdated
    }

    /// Mark or clear the dirty flag; never cascades to parent or children.
    pub fn set_outdated(&mut self, outdated: bool) {
        self.outdated = outdated;
    }

    pub fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    pub fn children(&self) -> &[ObjectId] {
        &self.children
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Mutable transform access; marks the node outdated.
    pub fn transform_mut(&mut self) -> &mut Transform {
        self.outdated = true;
        &mut self.transform
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.transform_mut().set_position(position);
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.transform_mut().set_rotation(rotation);
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.transform_mut().set_scale(scale);
    }

    /// Synced local matrix; does not touch the dirty flag, since reading
    /// the matrix is not a change a consumer needs to hear about.
    pub(crate) fn local_matrix(&mut self) -> glam::Mat4 {
        self.transform.local_matrix()
    }

    pub fn components(&self) -> &Components {
        &self.components
    }

    pub fn components_mut(&mut self) -> &mut Components {
        &mut self.components
    }

    /// Serialized form of this node alone; the graph attaches children.
    pub(crate) fn to_data(&mut self, include_controller_backed: bool) -> ObjectData {
        ObjectData {
            id: self.id,
            name: self.name.clone(),
            is_static: self.is_static,
            outdated: self.outdated,
            parent: self.parent,
            matrix: None,
            transform: self.transform.to_data(),
            components: self.components.to_map(include_controller_backed),
            children: Vec::new(),
        }
    }

    pub(crate) fn new_root() -> Self {
        Self {
            id: ObjectId::ROOT,
            name: "root".to_string(),
            transform: Transform::default(),
            is_static: false,
            outdated: false,
            parent: None,
            children: Vec::new(),
            components: Components::default(),
        }
    }

    pub(crate) fn push_child(&mut self, child: ObjectId) {
        self.children.push(child);
    }

    pub(crate) fn remove_child(&mut self, child: ObjectId) {
        self.children.retain(|c| *c != child);
    }
}
