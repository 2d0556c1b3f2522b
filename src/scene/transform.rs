//! Local transform of a scene node.
//!
//! Position, rotation, and scale are the source of truth; the local matrix
//! is a cache recomputed on demand through a dirty bit. Serialization
//! always emits the decomposed form with a quaternion rotation, while
//! construction also accepts a raw column-major `matrix` array or Euler
//! angles, since descriptions come from collaborators that may store
//! either.

use glam::{EulerRot, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Local transform with a lazily synced matrix cache.
#[derive(Debug, Clone)]
pub struct Transform {
    position: Vec3,
    rotation: Quat,
    scale: Vec3,
    local_matrix: Mat4,
    matrix_dirty: bool,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            local_matrix: Mat4::IDENTITY,
            matrix_dirty: false,
        }
    }
}

impl Transform {
    pub fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
            local_matrix: Mat4::IDENTITY,
            matrix_dirty: true,
        }
    }

    /// Build a transform by decomposing a column-major matrix.
    pub fn from_matrix(matrix: Mat4) -> Self {
        let (scale, rotation, position) = matrix.to_scale_rotation_translation();
        Self {
            position,
            rotation,
            scale,
            local_matrix: matrix,
            matrix_dirty: false,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.matrix_dirty = true;
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
        self.matrix_dirty = true;
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
        self.matrix_dirty = true;
    }

    /// Translate by a delta vector.
    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
        self.matrix_dirty = true;
    }

    /// The local matrix, recomputed from position/rotation/scale if stale.
    pub fn local_matrix(&mut self) -> Mat4 {
        if self.matrix_dirty {
            self.local_matrix =
                Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position);
            self.matrix_dirty = false;
        }
        self.local_matrix
    }

    /// Serialized form, syncing the matrix cache first.
    pub fn to_data(&mut self) -> TransformData {
        self.local_matrix();
        TransformData {
            position: self.position.to_array(),
            rotation: RotationData::Quaternion(self.rotation.to_array()),
            scale: self.scale.to_array(),
        }
    }
}

/// Serialized transform: `{position: [3], rotation: [3|4], scale: [3]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformData {
    pub position: [f32; 3],
    pub rotation: RotationData,
    pub scale: [f32; 3],
}

impl Default for TransformData {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            rotation: RotationData::Quaternion([0.0, 0.0, 0.0, 1.0]),
            scale: [1.0; 3],
        }
    }
}

impl TransformData {
    pub fn to_transform(&self) -> Transform {
        Transform::new(
            Vec3::from_array(self.position),
            self.rotation.to_quat(),
            Vec3::from_array(self.scale),
        )
    }
}

/// Rotation as either Euler angles (XYZ order, radians) or a quaternion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RotationData {
    Euler([f32; 3]),
    Quaternion([f32; 4]),
}

impl RotationData {
    pub fn to_quat(&self) -> Quat {
        match *self {
            RotationData::Euler([x, y, z]) => Quat::from_euler(EulerRot::XYZ, x, y, z),
            RotationData::Quaternion(q) => Quat::from_array(q),
        }
    }
}
