//! Stable object identifiers.
//!
//! Ids are unique within one tree, immutable after creation, and survive
//! serialization round trips so producer and consumer always talk about
//! the same entity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of an [`Object3D`](crate::scene::Object3D) within a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub u64);

impl ObjectId {
    /// Generate a fresh random id.
    ///
    /// Zero is reserved so a generated id never collides with
    /// [`ObjectId::ROOT`].
    pub fn generate() -> Self {
        ObjectId(fastrand::u64(1..))
    }

    /// The conventional id of a tree's root node.
    pub const ROOT: ObjectId = ObjectId(0);
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_nonzero() {
        for _ in 0..64 {
            assert_ne!(ObjectId::generate(), ObjectId::ROOT);
        }
    }

    #[test]
    fn display_is_hex() {
        assert_eq!(ObjectId(255).to_string(), "#ff");
    }
}
