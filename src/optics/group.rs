use crate::labels::{
    AMPLITUDE_CONTRAST, BEAM_TILT_X, BEAM_TILT_Y, IMAGE_DIMENSIONALITY, IMAGE_PIXEL_SIZE,
    IMAGE_SIZE, MICROGRAPH_DEFECT_FILE, MICROGRAPH_ORIGINAL_PIXEL_SIZE, MICROGRAPH_PIXEL_SIZE,
    MTF_FILE_NAME, OPTICS_GROUP, OPTICS_GROUP_NAME, SPHERICAL_ABERRATION, VOLTAGE,
};
use crate::model::{Acquisition, SetKind};
use crate::star::{Row, SchemaError, TableRow};

/// Record-derived values captured when a group is first seen
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GroupSnapshot {
    /// Pixel size in Å
    pub pixel_size: f64,
    /// Box size in pixels (particles only)
    pub image_size: Option<usize>,
    /// Image dimensionality (particles only)
    pub dimensionality: Option<u8>,
}

impl GroupSnapshot {
    /// Snapshot with a pixel size only
    pub fn new(pixel_size: f64) -> Self {
        Self {
            pixel_size,
            image_size: None,
            dimensionality: None,
        }
    }

    /// Add box size and dimensionality
    pub fn with_image_size(mut self, size: Option<usize>, dimensionality: Option<u8>) -> Self {
        self.image_size = size;
        self.dimensionality = dimensionality;
        self
    }
}

/// One row of the `optics` block
///
/// Immutable once created; later records sharing the group never update it.
#[derive(Debug, Clone, PartialEq)]
pub struct OpticsGroup {
    /// 1-based id in first-seen order
    pub id: u32,
    /// Group name
    pub name: String,
    /// Acceleration voltage in kV
    pub voltage: f64,
    /// Spherical aberration in mm
    pub spherical_aberration: f64,
    /// Amplitude contrast fraction
    pub amplitude_contrast: f64,
    /// Pixel size at first sight in Å
    pub pixel_size: f64,
    /// Original movie pixel size in Å
    pub original_pixel_size: f64,
    /// Box size in pixels
    pub image_size: Option<usize>,
    /// Image dimensionality
    pub dimensionality: Option<u8>,
    /// Detector MTF file
    pub mtf_file: Option<String>,
    /// Detector defect file
    pub defect_file: Option<String>,
    /// Beam tilt X in mrad
    pub beam_tilt_x: Option<f64>,
    /// Beam tilt Y in mrad
    pub beam_tilt_y: Option<f64>,
}

/// Which optional optics columns a table carries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct OptionalColumns {
    pub mtf_file: bool,
    pub defect_file: bool,
    pub beam_tilt: bool,
    pub image_size: bool,
}

impl OptionalColumns {
    pub(crate) fn union(groups: &[OpticsGroup]) -> Self {
        groups.iter().fold(Self::default(), |acc, g| Self {
            mtf_file: acc.mtf_file || g.mtf_file.is_some(),
            defect_file: acc.defect_file || g.defect_file.is_some(),
            beam_tilt: acc.beam_tilt || g.beam_tilt_x.is_some() || g.beam_tilt_y.is_some(),
            image_size: acc.image_size || g.image_size.is_some() || g.dimensionality.is_some(),
        })
    }
}

impl OpticsGroup {
    /// Create a group from the first record that carries it
    pub fn new(id: u32, name: String, acquisition: &Acquisition, snapshot: &GroupSnapshot) -> Self {
        Self {
            id,
            name,
            voltage: acquisition.voltage,
            spherical_aberration: acquisition.spherical_aberration,
            amplitude_contrast: acquisition.amplitude_contrast,
            pixel_size: snapshot.pixel_size,
            original_pixel_size: acquisition
                .original_pixel_size
                .unwrap_or(snapshot.pixel_size),
            image_size: snapshot.image_size,
            dimensionality: snapshot.dimensionality,
            mtf_file: acquisition.mtf_file.clone(),
            defect_file: acquisition.defect_file.clone(),
            beam_tilt_x: acquisition.beam_tilt_x,
            beam_tilt_y: acquisition.beam_tilt_y,
        }
    }

    /// Acquisition parameters carried by this group
    pub fn acquisition(&self) -> Acquisition {
        Acquisition {
            voltage: self.voltage,
            spherical_aberration: self.spherical_aberration,
            amplitude_contrast: self.amplitude_contrast,
            optics_group_name: Some(self.name.clone()),
            mtf_file: self.mtf_file.clone(),
            defect_file: self.defect_file.clone(),
            beam_tilt_x: self.beam_tilt_x,
            beam_tilt_y: self.beam_tilt_y,
            original_pixel_size: Some(self.original_pixel_size),
        }
    }

    pub(crate) fn to_row(&self, kind: SetKind, optional: OptionalColumns) -> Row {
        let mut row = Row::new()
            .with(OPTICS_GROUP_NAME, self.name.as_str())
            .with(OPTICS_GROUP, self.id);
        if optional.mtf_file {
            row.set(MTF_FILE_NAME, self.mtf_file.as_deref().unwrap_or_default());
        }
        row.set(MICROGRAPH_ORIGINAL_PIXEL_SIZE, self.original_pixel_size);
        row.set(VOLTAGE, self.voltage);
        row.set(SPHERICAL_ABERRATION, self.spherical_aberration);
        row.set(AMPLITUDE_CONTRAST, self.amplitude_contrast);
        if kind != SetKind::Movies {
            row.set(kind.pixel_size_label(), self.pixel_size);
        }
        if kind == SetKind::Particles && optional.image_size {
            row.set(IMAGE_SIZE, self.image_size.unwrap_or_default());
            row.set(IMAGE_DIMENSIONALITY, self.dimensionality.map_or(2, i64::from));
        }
        if optional.defect_file {
            row.set(
                MICROGRAPH_DEFECT_FILE,
                self.defect_file.as_deref().unwrap_or_default(),
            );
        }
        if optional.beam_tilt {
            row.set(BEAM_TILT_X, self.beam_tilt_x.unwrap_or_default());
            row.set(BEAM_TILT_Y, self.beam_tilt_y.unwrap_or_default());
        }
        row
    }

    /// Parse one row of an `optics` block
    pub fn from_row(row: &TableRow) -> Result<Self, SchemaError> {
        let id = row
            .get_i64(OPTICS_GROUP)?
            .ok_or_else(|| SchemaError::MissingColumn {
                label: OPTICS_GROUP.to_string(),
                block: crate::labels::BLOCK_OPTICS.to_string(),
            })?;
        let id = u32::try_from(id).map_err(|_| SchemaError::InvalidValue {
            label: OPTICS_GROUP.to_string(),
            value: id.to_string(),
            expected: "positive group id",
        })?;

        let pixel_size = match [IMAGE_PIXEL_SIZE, MICROGRAPH_PIXEL_SIZE, MICROGRAPH_ORIGINAL_PIXEL_SIZE]
            .into_iter()
            .find(|label| row.has_column(label))
        {
            Some(label) => row.get_f64_or(label, 0.0)?,
            None => 0.0,
        };
        let image_size = row
            .get_i64(IMAGE_SIZE)?
            .and_then(|size| usize::try_from(size).ok());
        let dimensionality = row
            .get_i64(IMAGE_DIMENSIONALITY)?
            .and_then(|dim| u8::try_from(dim).ok());

        Ok(Self {
            id,
            name: row
                .get_str(OPTICS_GROUP_NAME)
                .map(str::to_string)
                .unwrap_or_else(|| default_group_name(id)),
            voltage: row.get_f64_or(VOLTAGE, 0.0)?,
            spherical_aberration: row.get_f64_or(SPHERICAL_ABERRATION, 0.0)?,
            amplitude_contrast: row.get_f64_or(AMPLITUDE_CONTRAST, 0.0)?,
            pixel_size,
            original_pixel_size: row.get_f64_or(MICROGRAPH_ORIGINAL_PIXEL_SIZE, pixel_size)?,
            image_size,
            dimensionality,
            mtf_file: non_empty(row.get_str(MTF_FILE_NAME)),
            defect_file: non_empty(row.get_str(MICROGRAPH_DEFECT_FILE)),
            beam_tilt_x: row.get_f64(BEAM_TILT_X)?,
            beam_tilt_y: row.get_f64(BEAM_TILT_Y)?,
        })
    }
}

/// Name given to groups whose records carry no explicit name
pub fn default_group_name(id: u32) -> String {
    format!("opticsGroup{}", id)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}
