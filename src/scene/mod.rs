//! The simulated entity tree.
//!
//! Submodules overview:
//! - [`id`] – stable object identifiers
//! - [`transform`] – local position/rotation/scale with a synced matrix
//! - [`object3d`] – a single node: transform, flags, components, links
//! - [`graph`] – the arena holding the nodes, keyed by id
//! - [`data`] – the serialized subtree form shared by descriptions,
//!   snapshots, and diffs

pub mod data;
pub mod graph;
pub mod id;
pub mod object3d;
pub mod transform;

pub use data::ObjectData;
pub use graph::{SceneGraph, Visit};
pub use id::ObjectId;
pub use object3d::Object3D;
pub use transform::{RotationData, Transform, TransformData};
