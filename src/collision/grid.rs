//! Uniform spatial-hash broad phase.
//!
//! Static collider shapes are bucketed into fixed-size grid cells by
//! their world AABB; movers query the cells their own AABB covers and
//! get back candidate shapes for the narrow phase. Cell size comes from
//! [`SimConfig`](crate::config::SimConfig).

use rustc_hash::{FxHashMap, FxHashSet};

use crate::collision::shape::Aabb;
use crate::scene::ObjectId;

/// Reference to one shape of one object's collider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeRef {
    pub object: ObjectId,
    pub shape: usize,
}

/// Grid of cells mapping to the static shapes whose AABB covers them.
#[derive(Debug)]
pub struct SpatialGrid {
    cell_size: f32,
    cells: FxHashMap<(i32, i32), Vec<ShapeRef>>,
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(f32::EPSILON),
            cells: FxHashMap::default(),
        }
    }

    fn cell_range(&self, aabb: &Aabb) -> (i32, i32, i32, i32) {
        let min_x = (aabb.min.x / self.cell_size).floor() as i32;
        let min_y = (aabb.min.y / self.cell_size).floor() as i32;
        let max_x = (aabb.max.x / self.cell_size).floor() as i32;
        let max_y = (aabb.max.y / self.cell_size).floor() as i32;
        (min_x, min_y, max_x, max_y)
    }

    /// Insert a shape into every cell its AABB covers.
    pub fn insert(&mut self, aabb: &Aabb, shape: ShapeRef) {
        let (min_x, min_y, max_x, max_y) = self.cell_range(aabb);
        for cx in min_x..=max_x {
            for cy in min_y..=max_y {
                self.cells.entry((cx, cy)).or_default().push(shape);
            }
        }
    }

    /// Drop every shape belonging to `object`.
    pub fn remove_object(&mut self, object: ObjectId) {
        self.cells.retain(|_, shapes| {
            shapes.retain(|s| s.object != object);
            !shapes.is_empty()
        });
    }

    /// Candidate shapes whose cells intersect `aabb`, deduplicated.
    pub fn query(&self, aabb: &Aabb) -> Vec<ShapeRef> {
        let (min_x, min_y, max_x, max_y) = self.cell_range(aabb);
        let mut seen = FxHashSet::default();
        let mut out = Vec::new();
        for cx in min_x..=max_x {
            for cy in min_y..=max_y {
                if let Some(shapes) = self.cells.get(&(cx, cy)) {
                    for s in shapes {
                        if seen.insert(*s) {
                            out.push(*s);
                        }
                    }
                }
            }
        }
        out
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
