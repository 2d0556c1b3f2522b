//! Audio component model.
//!
//! Pure data for an audio collaborator; playback happens elsewhere.

use serde::{Deserialize, Serialize};

fn default_volume() -> f32 {
    1.0
}

/// Serializable configuration of an audio component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioModel {
    /// Key of the sound the audio collaborator should play.
    #[serde(rename = "idSound")]
    pub id_sound: String,
    #[serde(default = "default_volume")]
    pub volume: f32,
    #[serde(default, rename = "loop")]
    pub looped: bool,
}
