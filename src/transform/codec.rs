use std::fmt;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use super::error::TransformError;
use super::euler::{euler_degrees_from_matrix, euler_matrix_degrees};
use super::Transform;
use crate::labels::{
    ALIGNMENT_LABELS, ANGLE_PSI, ANGLE_ROT, ANGLE_TILT, ORIGIN_X_ANGST, ORIGIN_Y_ANGST,
    ORIGIN_Z_ANGST,
};
use crate::star::{ColumnSet, Row, TableRow};

/// Kind of alignment carried by a record set
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum AlignType {
    /// No alignment
    #[default]
    #[serde(rename = "none")]
    #[value(name = "none")]
    None,
    /// In-plane rotation plus 2-D shift
    #[serde(rename = "2d")]
    #[value(name = "2d")]
    TwoD,
    /// Projection orientation: three Euler angles plus 3-D shift
    #[serde(rename = "projection")]
    #[value(name = "projection")]
    Projection,
    /// Volume alignment
    #[serde(rename = "3d")]
    #[value(name = "3d")]
    ThreeD,
}

impl fmt::Display for AlignType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AlignType::None => "none",
            AlignType::TwoD => "2d",
            AlignType::Projection => "projection",
            AlignType::ThreeD => "3d",
        };
        f.write_str(name)
    }
}

/// Encoder/decoder between [`Transform`]s and alignment columns
///
/// The mode is fixed at construction. `ThreeD` has no codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignmentCodec {
    mode: AlignType,
}

impl AlignmentCodec {
    /// Codec for the requested mode
    pub fn new(mode: AlignType) -> Result<Self, TransformError> {
        match mode {
            AlignType::ThreeD => Err(TransformError::UnsupportedAlignment(mode)),
            mode => Ok(Self { mode }),
        }
    }

    /// Codec for the requested mode, collapsed to `None` when the block
    /// carries none of the alignment columns
    pub fn for_columns(mode: AlignType, columns: &ColumnSet) -> Result<Self, TransformError> {
        let codec = Self::new(mode)?;
        if codec.is_aligned() && !columns.has_any_column_of(ALIGNMENT_LABELS) {
            log::debug!("No alignment columns present, ignoring {} alignment", mode);
            return Ok(Self {
                mode: AlignType::None,
            });
        }
        Ok(codec)
    }

    /// Effective mode
    pub fn mode(&self) -> AlignType {
        self.mode
    }

    /// Whether rows carry alignment columns in this mode
    pub fn is_aligned(&self) -> bool {
        self.mode != AlignType::None
    }

    /// Write the alignment columns for `transform` into `row`.
    ///
    /// A missing transform is written as the identity. Shifts are converted
    /// from pixels to Å with `pixel_size`.
    pub fn encode(
        &self,
        transform: Option<&Transform>,
        pixel_size: f64,
        row: &mut Row,
    ) -> Result<(), TransformError> {
        let transform = transform.copied().unwrap_or_default();
        match self.mode {
            AlignType::None => {}
            AlignType::TwoD => {
                let angles = euler_degrees_from_matrix(&transform.rotation());
                let shift = transform.translation() * pixel_size;
                row.set(ANGLE_PSI, positive_zero(-(angles[0] + angles[2])));
                row.set(ORIGIN_X_ANGST, positive_zero(shift.x));
                row.set(ORIGIN_Y_ANGST, positive_zero(shift.y));
            }
            AlignType::Projection => {
                let inverse = transform.inverse().ok_or(TransformError::Singular)?;
                let shift = -inverse.translation() * pixel_size;
                let angles = euler_degrees_from_matrix(&inverse.rotation()).map(|a| -a);
                row.set(ANGLE_ROT, positive_zero(angles[0]));
                row.set(ANGLE_TILT, positive_zero(angles[1]));
                row.set(ANGLE_PSI, positive_zero(angles[2]));
                row.set(ORIGIN_X_ANGST, positive_zero(shift.x));
                row.set(ORIGIN_Y_ANGST, positive_zero(shift.y));
                row.set(ORIGIN_Z_ANGST, positive_zero(shift.z));
            }
            AlignType::ThreeD => return Err(TransformError::UnsupportedAlignment(self.mode)),
        }
        Ok(())
    }

    /// Rebuild the transform stored in `row`.
    ///
    /// Absent angle and shift columns read as zero. Returns `None` when the
    /// codec is not aligned.
    pub fn decode(
        &self,
        row: &TableRow,
        pixel_size: f64,
    ) -> Result<Option<Transform>, TransformError> {
        match self.mode {
            AlignType::None => Ok(None),
            AlignType::TwoD => {
                check_pixel_size(pixel_size)?;
                let psi = -row.get_f64_or(ANGLE_PSI, 0.0)?;
                let rotation = euler_matrix_degrees([0.0, 0.0, psi]);
                let shift = Vector3::new(
                    row.get_f64_or(ORIGIN_X_ANGST, 0.0)? / pixel_size,
                    row.get_f64_or(ORIGIN_Y_ANGST, 0.0)? / pixel_size,
                    0.0,
                );
                Ok(Some(Transform::from_parts(rotation, shift)))
            }
            AlignType::Projection => {
                check_pixel_size(pixel_size)?;
                let angles = [
                    -row.get_f64_or(ANGLE_ROT, 0.0)?,
                    -row.get_f64_or(ANGLE_TILT, 0.0)?,
                    -row.get_f64_or(ANGLE_PSI, 0.0)?,
                ];
                let origin = Vector3::new(
                    row.get_f64_or(ORIGIN_X_ANGST, 0.0)?,
                    row.get_f64_or(ORIGIN_Y_ANGST, 0.0)?,
                    row.get_f64_or(ORIGIN_Z_ANGST, 0.0)?,
                );
                let stored = Transform::from_parts(
                    euler_matrix_degrees(angles),
                    -origin / pixel_size,
                );
                stored
                    .inverse()
                    .map(Some)
                    .ok_or(TransformError::Singular)
            }
            AlignType::ThreeD => Err(TransformError::UnsupportedAlignment(self.mode)),
        }
    }
}

fn check_pixel_size(pixel_size: f64) -> Result<(), TransformError> {
    if pixel_size.is_finite() && pixel_size > 0.0 {
        Ok(())
    } else {
        Err(TransformError::InvalidPixelSize(pixel_size))
    }
}

/// Map `-0.0` to `0.0` so zero angles are written without a sign
fn positive_zero(value: f64) -> f64 {
    value + 0.0
}
