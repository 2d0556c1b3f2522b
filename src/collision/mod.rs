//! Collision detection layer.
//!
//! Detection is asymmetric: non-static nodes ("movers") test their
//! collider shapes against static geometry only; movers never collide
//! with each other. Each tick the [`Context`](crate::context::Context)
//! recomputes mover shapes in world space, asks the broad phase for
//! candidates, runs the exact tests, and compares the resulting overlap
//! set with the previous tick's to raise enter/sustain/leave events on
//! the mover's scripts.
//!
//! Submodules overview:
//! - [`shape`] – 2D primitives, world projection, exact overlap tests
//! - [`grid`] – uniform spatial-hash broad phase over static shapes

pub mod grid;
pub mod shape;

use crate::collision::grid::{ShapeRef, SpatialGrid};
use crate::collision::shape::Aabb;
use crate::scene::ObjectId;

/// Outcome of one mover shape overlapping one static partner shape,
/// handed to the mover's scripts on enter and while the contact lasts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionHit {
    /// The static partner node.
    pub partner: ObjectId,
    /// Index of the overlapping shape on the mover's collider.
    pub mover_shape: usize,
    /// Index of the overlapping shape on the partner's collider.
    pub partner_shape: usize,
}

/// Broad-phase index over the static collider shapes of a scene.
#[derive(Debug)]
pub struct CollisionIndex {
    grid: SpatialGrid,
}

impl CollisionIndex {
    pub fn new(cell_size: f32) -> Self {
        Self {
            grid: SpatialGrid::new(cell_size),
        }
    }

    /// Index one static shape by its world AABB.
    pub fn register(&mut self, aabb: &Aabb, shape: ShapeRef) {
        self.grid.insert(aabb, shape);
    }

    /// Drop every indexed shape of `object`.
    pub fn unregister(&mut self, object: ObjectId) {
        self.grid.remove_object(object);
    }

    /// Candidate static shapes for a mover shape's AABB.
    pub fn query(&self, aabb: &Aabb) -> Vec<ShapeRef> {
        self.grid.query(aabb)
    }
}
