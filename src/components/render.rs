//! Render component model.
//!
//! Pure data for a rendering collaborator: the core never touches a GPU.

use serde::{Deserialize, Serialize};

/// Serializable configuration of a render component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderModel {
    /// Key of the mesh/material bundle the renderer should use.
    #[serde(rename = "idRenderData")]
    pub id_render_data: String,
    /// Optional RGB tint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<[f32; 3]>,
}
