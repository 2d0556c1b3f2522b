//! Collider component: declared shapes and their world-space wrappers.
//!
//! The model keeps its shape entries as raw JSON so a description round
//! trips unchanged even when it declares shapes this build does not
//! recognize; the controller only wraps the entries it can parse, so a
//! collider may have fewer active shapes than declared.

use glam::{Mat4, Vec2};
use log::warn;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::collision::shape::{Aabb, Shape2D};
use crate::error::SceneError;
use crate::scene::ObjectId;

/// Serializable configuration of a collider component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColliderModel {
    /// Shape entries as declared; see [`ShapeData`] for the known forms.
    pub shapes: Vec<serde_json::Value>,
}

/// A recognized shape entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ShapeData {
    Circle { center: [f32; 2], radius: f32 },
    Polygon { points: Vec<[f32; 2]> },
}

impl ShapeData {
    fn to_shape(&self) -> Shape2D {
        match self {
            ShapeData::Circle { center, radius } => Shape2D::Circle {
                center: Vec2::from_array(*center),
                radius: *radius,
            },
            ShapeData::Polygon { points } => Shape2D::Polygon {
                points: points.iter().map(|p| Vec2::from_array(*p)).collect(),
            },
        }
    }
}

/// One local-space primitive plus its current world-space projection.
#[derive(Debug, Clone)]
pub struct ShapeWrapper {
    local: Shape2D,
    world: Shape2D,
}

impl ShapeWrapper {
    pub fn new(local: Shape2D) -> Self {
        let world = local.clone();
        Self { local, world }
    }

    /// Recompute the world form from the owner's world matrix.
    pub fn update(&mut self, world_matrix: &Mat4) {
        self.world = self.local.transformed(world_matrix);
    }

    pub fn world(&self) -> &Shape2D {
        &self.world
    }

    pub fn aabb(&self) -> Aabb {
        self.world.aabb()
    }
}

/// Runtime side of a collider: active shape wrappers plus the set of
/// partner ids this node was overlapping on the previous tick.
#[derive(Debug)]
pub struct ColliderController {
    pub wrappers: Vec<ShapeWrapper>,
    pub touching: FxHashSet<ObjectId>,
}

impl ColliderController {
    /// Build wrappers from the model's shape entries.
    ///
    /// Entries whose `type` discriminator is unrecognized are skipped
    /// with a warning; a recognized entry with bad fields is a
    /// description error and fails the load.
    pub fn build(model: &ColliderModel) -> Result<Self, SceneError> {
        let mut wrappers = Vec::with_capacity(model.shapes.len());
        for entry in &model.shapes {
            let kind = entry.get("type").and_then(|v| v.as_str());
            match kind {
                Some("circle") | Some("polygon") => {
                    let data: ShapeData = serde_json::from_value(entry.clone())?;
                    wrappers.push(ShapeWrapper::new(data.to_shape()));
                }
                other => {
                    warn!(
                        "skipping collider shape with unsupported type {:?}",
                        other.unwrap_or("<missing>")
                    );
                }
            }
        }
        Ok(Self {
            wrappers,
            touching: FxHashSet::default(),
        })
    }

    /// Recompute every wrapper's world form.
    pub fn update_shapes(&mut self, world_matrix: &Mat4) {
        for wrapper in &mut self.wrappers {
            wrapper.update(world_matrix);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn build_parses_circle_and_polygon() {
        let model = ColliderModel {
            shapes: vec![
                json!({"type": "circle", "center": [0.0, 0.0], "radius": 1.0}),
                json!({"type": "polygon", "points": [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]}),
            ],
        };
        let ctrl = ColliderController::build(&model).unwrap();
        assert_eq!(ctrl.wrappers.len(), 2);
    }

    #[test]
    fn build_skips_unsupported_shape_type() {
        let model = ColliderModel {
            shapes: vec![
                json!({"type": "capsule", "radius": 1.0}),
                json!({"type": "circle", "center": [0.0, 0.0], "radius": 1.0}),
            ],
        };
        let ctrl = ColliderController::build(&model).unwrap();
        // Fewer active shapes than declared.
        assert_eq!(ctrl.wrappers.len(), 1);
        assert_eq!(model.shapes.len(), 2);
    }

    #[test]
    fn build_fails_on_malformed_known_shape() {
        let model = ColliderModel {
            shapes: vec![json!({"type": "circle", "center": [0.0, 0.0]})],
        };
        assert!(matches!(
            ColliderController::build(&model),
            Err(SceneError::MalformedDescription(_))
        ));
    }

    #[test]
    fn wrapper_tracks_world_matrix() {
        let mut wrapper = ShapeWrapper::new(Shape2D::Circle {
            center: Vec2::ZERO,
            radius: 1.0,
        });
        wrapper.update(&Mat4::from_translation(glam::Vec3::new(5.0, 0.0, 3.0)));
        match wrapper.world() {
            Shape2D::Circle { center, .. } => {
                assert!((*center - Vec2::new(5.0, 3.0)).length() < 1e-5);
            }
            _ => panic!("expected circle"),
        }
    }
}
