//! 2D collision primitives and exact overlap tests.
//!
//! The scene is three-dimensional but collision runs on the XZ ground
//! plane: a shape's world form is its local form pushed through the
//! owner's world matrix and projected back to 2D. Supported primitives
//! are circles and convex polygons; polygon/polygon uses a separating
//! axis test.
//!
//! Touching counts as overlapping: two circles whose center distance
//! equals the sum of their radii are in contact.

use glam::{Mat4, Vec2, Vec3};

/// A world- or local-space 2D collision primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape2D {
    Circle { center: Vec2, radius: f32 },
    Polygon { points: Vec<Vec2> },
}

impl Shape2D {
    /// Apply a 3D world matrix, projecting onto the XZ plane.
    ///
    /// Local 2D coordinates are interpreted as (x, z). A circle's radius
    /// is scaled by the average of the matrix's x/z basis lengths, so
    /// mildly non-uniform scales stay approximately right.
    pub fn transformed(&self, matrix: &Mat4) -> Shape2D {
        let map = |p: Vec2| {
            let world = matrix.transform_point3(Vec3::new(p.x, 0.0, p.y));
            Vec2::new(world.x, world.z)
        };
        match self {
            Shape2D::Circle { center, radius } => {
                let sx = Vec2::new(matrix.x_axis.x, matrix.x_axis.z).length();
                let sz = Vec2::new(matrix.z_axis.x, matrix.z_axis.z).length();
                Shape2D::Circle {
                    center: map(*center),
                    radius: radius * (sx + sz) * 0.5,
                }
            }
            Shape2D::Polygon { points } => Shape2D::Polygon {
                points: points.iter().copied().map(map).collect(),
            },
        }
    }

    /// Axis-aligned bounding box of this shape.
    pub fn aabb(&self) -> Aabb {
        match self {
            Shape2D::Circle { center, radius } => Aabb {
                min: *center - Vec2::splat(*radius),
                max: *center + Vec2::splat(*radius),
            },
            Shape2D::Polygon { points } => {
                let mut min = Vec2::splat(f32::INFINITY);
                let mut max = Vec2::splat(f32::NEG_INFINITY);
                for p in points {
                    min = min.min(*p);
                    max = max.max(*p);
                }
                Aabb { min, max }
            }
        }
    }
}

/// Axis-aligned bounding box used by the broad phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }
}

/// Exact overlap test between two world-space shapes.
pub fn overlap(a: &Shape2D, b: &Shape2D) -> bool {
    match (a, b) {
        (
            Shape2D::Circle {
                center: ca,
                radius: ra,
            },
            Shape2D::Circle {
                center: cb,
                radius: rb,
            },
        ) => circle_circle(*ca, *ra, *cb, *rb),
        (Shape2D::Circle { center, radius }, Shape2D::Polygon { points })
        | (Shape2D::Polygon { points }, Shape2D::Circle { center, radius }) => {
            circle_polygon(*center, *radius, points)
        }
        (Shape2D::Polygon { points: pa }, Shape2D::Polygon { points: pb }) => {
            polygon_polygon(pa, pb)
        }
    }
}

fn circle_circle(ca: Vec2, ra: f32, cb: Vec2, rb: f32) -> bool {
    let r = ra + rb;
    ca.distance_squared(cb) <= r * r
}

fn circle_polygon(center: Vec2, radius: f32, points: &[Vec2]) -> bool {
    if points.is_empty() {
        return false;
    }
    if point_in_polygon(center, points) {
        return true;
    }
    let r2 = radius * radius;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        if distance_squared_to_segment(center, a, b) <= r2 {
            return true;
        }
    }
    false
}

/// Separating axis test over the edge normals of both convex polygons.
fn polygon_polygon(pa: &[Vec2], pb: &[Vec2]) -> bool {
    if pa.is_empty() || pb.is_empty() {
        return false;
    }
    for points in [pa, pb] {
        for i in 0..points.len() {
            let edge = points[(i + 1) % points.len()] - points[i];
            let axis = Vec2::new(-edge.y, edge.x);
            let (min_a, max_a) = project(pa, axis);
            let (min_b, max_b) = project(pb, axis);
            if max_a < min_b || max_b < min_a {
                return false;
            }
        }
    }
    true
}

fn project(points: &[Vec2], axis: Vec2) -> (f32, f32) {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for p in points {
        let d = p.dot(axis);
        min = min.min(d);
        max = max.max(d);
    }
    (min, max)
}

fn point_in_polygon(point: Vec2, points: &[Vec2]) -> bool {
    // Ray cast along +x, counting edge crossings.
    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[j];
        if (a.y > point.y) != (b.y > point.y)
            && point.x < (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn distance_squared_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 <= f32::EPSILON {
        return p.distance_squared(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance_squared(a + ab * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circle(x: f32, y: f32, r: f32) -> Shape2D {
        Shape2D::Circle {
            center: Vec2::new(x, y),
            radius: r,
        }
    }

    fn square(cx: f32, cy: f32, half: f32) -> Shape2D {
        Shape2D::Polygon {
            points: vec![
                Vec2::new(cx - half, cy - half),
                Vec2::new(cx + half, cy - half),
                Vec2::new(cx + half, cy + half),
                Vec2::new(cx - half, cy + half),
            ],
        }
    }

    // ==================== CIRCLE / CIRCLE ====================

    #[test]
    fn circles_apart_do_not_overlap() {
        assert!(!overlap(&circle(0.0, 0.0, 1.0), &circle(3.0, 0.0, 1.0)));
    }

    #[test]
    fn circles_touching_overlap() {
        // Contact at exactly the sum of radii counts.
        assert!(overlap(&circle(0.0, 0.0, 1.0), &circle(2.0, 0.0, 1.0)));
    }

    #[test]
    fn circles_intersecting_overlap() {
        assert!(overlap(&circle(0.0, 0.0, 1.0), &circle(1.5, 0.0, 1.0)));
    }

    // ==================== CIRCLE / POLYGON ====================

    #[test]
    fn circle_inside_polygon_overlaps() {
        assert!(overlap(&circle(0.0, 0.0, 0.1), &square(0.0, 0.0, 2.0)));
    }

    #[test]
    fn circle_against_polygon_edge_overlaps() {
        assert!(overlap(&circle(2.5, 0.0, 0.6), &square(0.0, 0.0, 2.0)));
    }

    #[test]
    fn circle_clear_of_polygon_does_not_overlap() {
        assert!(!overlap(&circle(4.0, 0.0, 0.5), &square(0.0, 0.0, 2.0)));
    }

    // ==================== POLYGON / POLYGON ====================

    #[test]
    fn separated_squares_do_not_overlap() {
        assert!(!overlap(&square(0.0, 0.0, 1.0), &square(5.0, 0.0, 1.0)));
    }

    #[test]
    fn overlapping_squares_overlap() {
        assert!(overlap(&square(0.0, 0.0, 1.0), &square(1.5, 0.0, 1.0)));
    }

    #[test]
    fn diagonal_offset_squares_do_not_overlap() {
        assert!(!overlap(&square(0.0, 0.0, 1.0), &square(2.5, 2.5, 1.0)));
    }

    // ==================== TRANSFORM / AABB ====================

    #[test]
    fn transform_translates_circle_on_ground_plane() {
        let m = Mat4::from_translation(Vec3::new(3.0, 7.0, -2.0));
        let moved = circle(1.0, 1.0, 0.5).transformed(&m);
        match moved {
            Shape2D::Circle { center, radius } => {
                assert!((center - Vec2::new(4.0, -1.0)).length() < 1e-5);
                assert!((radius - 0.5).abs() < 1e-5);
            }
            _ => panic!("expected circle"),
        }
    }

    #[test]
    fn transform_scales_circle_radius() {
        let m = Mat4::from_scale(Vec3::new(2.0, 1.0, 2.0));
        match circle(0.0, 0.0, 1.0).transformed(&m) {
            Shape2D::Circle { radius, .. } => assert!((radius - 2.0).abs() < 1e-5),
            _ => panic!("expected circle"),
        }
    }

    #[test]
    fn aabb_covers_polygon_extent() {
        let b = square(1.0, 2.0, 0.5).aabb();
        assert_eq!(b.min, Vec2::new(0.5, 1.5));
        assert_eq!(b.max, Vec2::new(1.5, 2.5));
    }

    #[test]
    fn aabb_touching_edges_intersect() {
        let a = circle(0.0, 0.0, 1.0).aabb();
        let b = circle(2.0, 0.0, 1.0).aabb();
        assert!(a.intersects(&b));
    }
}
