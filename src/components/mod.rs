//! Typed components attachable to scene nodes.
//!
//! The component set is closed: game script, external script, collider,
//! render, audio. Each component pairs a serializable Model with an
//! optional runtime Controller; controllers are created by the context at
//! load time and never serialized. A node holds at most one component per
//! kind.
//!
//! Submodules overview:
//! - [`script`] – script ids + variables model, instantiated script objects
//! - [`collider`] – declared shapes model, world-space shape wrappers
//! - [`render`] – mesh/material key + tint, pure data
//! - [`audio`] – sound key + volume, pure data

pub mod audio;
pub mod collider;
pub mod render;
pub mod script;

use log::warn;
use smallvec::SmallVec;

use crate::components::audio::AudioModel;
use crate::components::collider::{ColliderController, ColliderModel};
use crate::components::render::RenderModel;
use crate::components::script::{ScriptController, ScriptModel};
use crate::error::SceneError;

/// The fixed set of component kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    GameScript,
    ExternalScript,
    Collider,
    Render,
    Audio,
}

impl ComponentKind {
    /// The JSON key naming this kind inside an object description.
    pub fn key(&self) -> &'static str {
        match self {
            ComponentKind::GameScript => "gameScript",
            ComponentKind::ExternalScript => "externalScript",
            ComponentKind::Collider => "collider",
            ComponentKind::Render => "render",
            ComponentKind::Audio => "audio",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "gameScript" => Some(ComponentKind::GameScript),
            "externalScript" => Some(ComponentKind::ExternalScript),
            "collider" => Some(ComponentKind::Collider),
            "render" => Some(ComponentKind::Render),
            "audio" => Some(ComponentKind::Audio),
            _ => None,
        }
    }
}

/// A script component: model plus the controller slot filled at load.
#[derive(Debug)]
pub struct ScriptComponent {
    pub model: ScriptModel,
    pub controller: Option<ScriptController>,
}

/// A collider component: model plus the controller slot filled at load.
#[derive(Debug)]
pub struct ColliderComponent {
    pub model: ColliderModel,
    pub controller: Option<ColliderController>,
}

/// One component of a node.
#[derive(Debug)]
pub enum Component {
    GameScript(ScriptComponent),
    ExternalScript(ScriptComponent),
    Collider(ColliderComponent),
    Render(RenderModel),
    Audio(AudioModel),
}

impl Component {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::GameScript(_) => ComponentKind::GameScript,
            Component::ExternalScript(_) => ComponentKind::ExternalScript,
            Component::Collider(_) => ComponentKind::Collider,
            Component::Render(_) => ComponentKind::Render,
            Component::Audio(_) => ComponentKind::Audio,
        }
    }

    /// Whether a live controller currently backs this component.
    pub fn controller_live(&self) -> bool {
        match self {
            Component::GameScript(c) | Component::ExternalScript(c) => c.controller.is_some(),
            Component::Collider(c) => c.controller.is_some(),
            Component::Render(_) | Component::Audio(_) => false,
        }
    }

    fn model_value(&self) -> serde_json::Value {
        // Models are plain serde structs; serialization cannot fail.
        match self {
            Component::GameScript(c) | Component::ExternalScript(c) => {
                serde_json::to_value(&c.model).unwrap_or(serde_json::Value::Null)
            }
            Component::Collider(c) => {
                serde_json::to_value(&c.model).unwrap_or(serde_json::Value::Null)
            }
            Component::Render(m) => serde_json::to_value(m).unwrap_or(serde_json::Value::Null),
            Component::Audio(m) => serde_json::to_value(m).unwrap_or(serde_json::Value::Null),
        }
    }
}

/// The components of one node, at most one per kind.
#[derive(Debug, Default)]
pub struct Components {
    entries: SmallVec<[Component; 4]>,
}

impl Components {
    /// Parse a description's component map.
    ///
    /// An unknown key is fatal; duplicate kinds cannot occur here because
    /// JSON object keys are unique.
    pub fn from_map(map: &serde_json::Map<String, serde_json::Value>) -> Result<Self, SceneError> {
        let mut components = Components::default();
        for (key, value) in map {
            let kind = ComponentKind::from_key(key)
                .ok_or_else(|| SceneError::UnknownComponentType(key.clone()))?;
            let component = match kind {
                ComponentKind::GameScript => Component::GameScript(ScriptComponent {
                    model: serde_json::from_value(value.clone())?,
                    controller: None,
                }),
                ComponentKind::ExternalScript => Component::ExternalScript(ScriptComponent {
                    model: serde_json::from_value(value.clone())?,
                    controller: None,
                }),
                ComponentKind::Collider => Component::Collider(ColliderComponent {
                    model: serde_json::from_value(value.clone())?,
                    controller: None,
                }),
                ComponentKind::Render => Component::Render(serde_json::from_value(value.clone())?),
                ComponentKind::Audio => Component::Audio(serde_json::from_value(value.clone())?),
            };
            components.insert(component);
        }
        Ok(components)
    }

    /// Attach a component; a second component of an existing kind is
    /// dropped with a warning (first wins).
    pub fn insert(&mut self, component: Component) {
        let kind = component.kind();
        if self.get(kind).is_some() {
            warn!("dropping duplicate {:?} component", kind);
            return;
        }
        self.entries.push(component);
    }

    pub fn get(&self, kind: ComponentKind) -> Option<&Component> {
        self.entries.iter().find(|c| c.kind() == kind)
    }

    pub fn get_mut(&mut self, kind: ComponentKind) -> Option<&mut Component> {
        self.entries.iter_mut().find(|c| c.kind() == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Component> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Component> {
        self.entries.iter_mut()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The collider component, if any.
    pub fn collider(&self) -> Option<&ColliderComponent> {
        match self.get(ComponentKind::Collider) {
            Some(Component::Collider(c)) => Some(c),
            _ => None,
        }
    }

    pub fn collider_mut(&mut self) -> Option<&mut ColliderComponent> {
        match self.get_mut(ComponentKind::Collider) {
            Some(Component::Collider(c)) => Some(c),
            _ => None,
        }
    }

    /// Move the live script controllers out for dispatch, so scripts can
    /// borrow the scene mutably while they run.
    pub fn take_script_controllers(&mut self) -> SmallVec<[(ComponentKind, ScriptController); 2]> {
        let mut taken = SmallVec::new();
        for entry in self.entries.iter_mut() {
            let kind = entry.kind();
            if let Component::GameScript(c) | Component::ExternalScript(c) = entry {
                if let Some(controller) = c.controller.take() {
                    taken.push((kind, controller));
                }
            }
        }
        taken
    }

    /// Put controllers taken by [`Self::take_script_controllers`] back.
    pub fn restore_script_controllers(
        &mut self,
        controllers: SmallVec<[(ComponentKind, ScriptController); 2]>,
    ) {
        for (kind, controller) in controllers {
            if let Some(Component::GameScript(c) | Component::ExternalScript(c)) =
                self.get_mut(kind)
            {
                c.controller = Some(controller);
            }
        }
    }

    /// Serialize models back into a description component map.
    ///
    /// With `include_controller_backed == false`, components whose
    /// controller is live are omitted (the "thin" form).
    pub fn to_map(
        &self,
        include_controller_backed: bool,
    ) -> serde_json::Map<String, serde_json::Value> {
        let mut map = serde_json::Map::new();
        for component in &self.entries {
            if !include_controller_backed && component.controller_live() {
                continue;
            }
            map.insert(component.kind().key().to_string(), component.model_value());
        }
        map
    }
}
