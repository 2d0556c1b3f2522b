//! Error types for scene construction and lifecycle.
//!
//! Fatal conditions surface as [`SceneError`] values; recoverable input
//! problems (a duplicate component on one node, an unrecognized collider
//! shape) are logged and skipped where they occur instead of failing the
//! whole operation.

use thiserror::Error;

use crate::scene::ObjectId;

/// Errors produced while constructing, loading, or mutating a scene.
#[derive(Debug, Error)]
pub enum SceneError {
    /// A serialized object description is missing required fields or is
    /// not valid JSON for the expected shape.
    #[error("malformed object description: {0}")]
    MalformedDescription(#[from] serde_json::Error),

    /// A component entry uses a key outside the fixed component set.
    #[error("unknown component type `{0}`")]
    UnknownComponentType(String),

    /// A script component names an id the registry has no factory for.
    #[error("unknown script id `{0}`")]
    UnknownScriptId(String),

    /// `load` was called on a subtree whose controllers already exist.
    #[error("controllers already initialized for object {0}")]
    ControllerAlreadyInitialized(ObjectId),

    /// An operation referenced an object id that is not in the tree.
    #[error("object {0} not found")]
    UnknownObject(ObjectId),

    /// A description would introduce an id the tree already contains.
    #[error("object id {0} already present in tree")]
    DuplicateObjectId(ObjectId),

    /// A script `load` hook failed.
    #[error("script load failed: {0}")]
    ScriptLoad(String),
}
