//! # Transform Module
//!
//! Rigid-body transforms and their Euler-angle encoding in STAR rows.
//!
//! ## Design Principles
//!
//! 1. **One Matrix Type**: Every alignment is a 4×4 homogeneous matrix
//!    (3×3 rotation, 3-vector translation in pixels) backed by nalgebra.
//!
//! 2. **Fixed Convention**: Angles use the static Z-Y-Z axis sequence. The
//!    in-plane and projection encodings each apply their own sign and
//!    inversion pattern, and both are reproduced exactly.
//!
//! 3. **Mode Decided Once**: [`AlignmentCodec`] picks its mode from the
//!    requested [`AlignType`] and the block's columns before the first row,
//!    then dispatches per row by plain matching.

mod codec;
mod error;
mod euler;


pub use codec::{AlignType, AlignmentCodec};
pub use error::TransformError;
pub use euler::{euler_degrees_from_matrix, euler_from_matrix, euler_matrix, euler_matrix_degrees};

use nalgebra::{Matrix3, Matrix4, Vector3};

/// Rigid transform as a 4×4 homogeneous matrix
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    matrix: Matrix4<f64>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    /// Identity transform: no rotation, no shift
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Wrap an existing homogeneous matrix
    pub fn from_matrix(matrix: Matrix4<f64>) -> Self {
        Self { matrix }
    }

    /// Assemble from a rotation block and a translation in pixels
    pub fn from_parts(rotation: Matrix3<f64>, translation: Vector3<f64>) -> Self {
        let mut matrix = Matrix4::identity();
        matrix.fixed_view_mut::<3, 3>(0, 0).copy_from(&rotation);
        matrix.fixed_view_mut::<3, 1>(0, 3).copy_from(&translation);
        Self { matrix }
    }

    /// In-plane rotation by `angle` degrees about Z plus a shift in pixels
    pub fn in_plane(angle: f64, shift_x: f64, shift_y: f64) -> Self {
        Self::from_parts(
            euler_matrix_degrees([0.0, 0.0, angle]),
            Vector3::new(shift_x, shift_y, 0.0),
        )
    }

    /// Rotation from Z-Y-Z Euler angles in degrees plus a shift in pixels
    pub fn from_euler(angles: [f64; 3], shift: Vector3<f64>) -> Self {
        Self::from_parts(euler_matrix_degrees(angles), shift)
    }

    /// Underlying homogeneous matrix
    pub fn matrix(&self) -> &Matrix4<f64> {
        &self.matrix
    }

    /// 3×3 rotation block
    pub fn rotation(&self) -> Matrix3<f64> {
        self.matrix.fixed_view::<3, 3>(0, 0).into_owned()
    }

    /// Translation column in pixels
    pub fn translation(&self) -> Vector3<f64> {
        self.matrix.fixed_view::<3, 1>(0, 3).into_owned()
    }

    /// Inverse transform, or `None` when the matrix is singular
    pub fn inverse(&self) -> Option<Self> {
        self.matrix.try_inverse().map(Self::from_matrix)
    }

    /// Element-wise comparison within `tolerance`
    pub fn approx_eq(&self, other: &Transform, tolerance: f64) -> bool {
        self.matrix
            .iter()
            .zip(other.matrix.iter())
            .all(|(a, b)| (a - b).abs() <= tolerance)
    }
}

impl From<Matrix4<f64>> for Transform {
    fn from(matrix: Matrix4<f64>) -> Self {
        Self::from_matrix(matrix)
    }
}
