//! Script factories keyed by id.
//!
//! The registry is handed to the context at construction; there is no
//! module-level registration. A factory gets the owning object's id and
//! the script model's variables blob and returns a boxed script.

use rustc_hash::FxHashMap;

use crate::context::script::Script;
use crate::error::SceneError;
use crate::scene::ObjectId;

/// Builds one script instance for one node.
pub type ScriptFactory = Box<dyn Fn(ObjectId, &serde_json::Value) -> Box<dyn Script>>;

/// Mapping from script id to factory, owned by the context.
#[derive(Default)]
pub struct ScriptRegistry {
    factories: FxHashMap<String, ScriptFactory>,
}

impl ScriptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory; replaces any previous entry for `id`.
    pub fn register(
        &mut self,
        id: impl Into<String>,
        factory: impl Fn(ObjectId, &serde_json::Value) -> Box<dyn Script> + 'static,
    ) {
        self.factories.insert(id.into(), Box::new(factory));
    }

    /// Builder-style [`Self::register`].
    pub fn with(
        mut self,
        id: impl Into<String>,
        factory: impl Fn(ObjectId, &serde_json::Value) -> Box<dyn Script> + 'static,
    ) -> Self {
        self.register(id, factory);
        self
    }

    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// Instantiate the script registered under `id`.
    pub fn create(
        &self,
        id: &str,
        object: ObjectId,
        variables: &serde_json::Value,
    ) -> Result<Box<dyn Script>, SceneError> {
        let factory = self
            .factories
            .get(id)
            .ok_or_else(|| SceneError::UnknownScriptId(id.to_string()))?;
        Ok(factory(object, variables))
    }
}

impl std::fmt::Debug for ScriptRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptRegistry")
            .field("ids", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}
