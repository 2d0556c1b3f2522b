//! Script component: model and runtime controller.
//!
//! The model names the script ids to instantiate plus an arbitrary
//! variables blob handed to each factory. The same model shape backs both
//! script component kinds; which one gets a live controller depends on
//! the owning context's [`ScriptVenue`](crate::context::ScriptVenue).

use serde::{Deserialize, Serialize};

use crate::context::script::Script;

/// Serializable configuration of a script component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptModel {
    /// Registry ids of the scripts to attach, in execution order.
    pub scripts: Vec<String>,
    /// Free-form variables passed to every factory.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub variables: serde_json::Value,
}

/// Runtime side of a script component: the instantiated script objects.
///
/// Built by the context at load time, never serialized.
pub struct ScriptController {
    pub scripts: Vec<Box<dyn Script>>,
}

impl std::fmt::Debug for ScriptController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptController")
            .field("scripts", &self.scripts.len())
            .finish()
    }
}
