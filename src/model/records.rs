use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::labels;
use crate::star::{Location, Value};
use crate::transform::Transform;

/// Kind of record set, selecting block names and optics columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetKind {
    /// Raw movie stacks
    Movies,
    /// Motion-corrected micrographs
    Micrographs,
    /// Extracted particle images
    Particles,
}

impl SetKind {
    /// Default name of the main block
    pub fn block_name(self) -> &'static str {
        match self {
            SetKind::Movies => labels::BLOCK_MOVIES,
            SetKind::Micrographs => labels::BLOCK_MICROGRAPHS,
            SetKind::Particles => labels::BLOCK_PARTICLES,
        }
    }

    /// Optics column holding the pixel size of this set's images
    pub fn pixel_size_label(self) -> &'static str {
        match self {
            SetKind::Movies => labels::MICROGRAPH_ORIGINAL_PIXEL_SIZE,
            SetKind::Micrographs => labels::MICROGRAPH_PIXEL_SIZE,
            SetKind::Particles => labels::IMAGE_PIXEL_SIZE,
        }
    }
}

impl fmt::Display for SetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.block_name())
    }
}

/// Microscope acquisition parameters shared by an optics group
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Acquisition {
    /// Acceleration voltage in kV
    pub voltage: f64,
    /// Spherical aberration in mm
    pub spherical_aberration: f64,
    /// Amplitude contrast fraction
    pub amplitude_contrast: f64,
    /// Explicit optics group name
    pub optics_group_name: Option<String>,
    /// Detector MTF file
    pub mtf_file: Option<String>,
    /// Detector defect file
    pub defect_file: Option<String>,
    /// Beam tilt X in mrad
    pub beam_tilt_x: Option<f64>,
    /// Beam tilt Y in mrad
    pub beam_tilt_y: Option<f64>,
    /// Pixel size of the original movies in Å
    pub original_pixel_size: Option<f64>,
}

impl Acquisition {
    /// Acquisition with the three fingerprint parameters
    pub fn new(voltage: f64, spherical_aberration: f64, amplitude_contrast: f64) -> Self {
        Self {
            voltage,
            spherical_aberration,
            amplitude_contrast,
            ..Default::default()
        }
    }

    /// Set the optics group name
    pub fn with_group_name(mut self, name: impl Into<String>) -> Self {
        self.optics_group_name = Some(name.into());
        self
    }

    /// Set the MTF file
    pub fn with_mtf_file(mut self, path: impl Into<String>) -> Self {
        self.mtf_file = Some(path.into());
        self
    }

    /// Set the detector defect file
    pub fn with_defect_file(mut self, path: impl Into<String>) -> Self {
        self.defect_file = Some(path.into());
        self
    }

    /// Set the beam tilt
    pub fn with_beam_tilt(mut self, x: f64, y: f64) -> Self {
        self.beam_tilt_x = Some(x);
        self.beam_tilt_y = Some(y);
        self
    }

    /// Set the original movie pixel size
    pub fn with_original_pixel_size(mut self, pixel_size: f64) -> Self {
        self.original_pixel_size = Some(pixel_size);
        self
    }
}

/// Contrast transfer function estimate
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CtfModel {
    /// Defocus U in Å
    pub defocus_u: f64,
    /// Defocus V in Å
    pub defocus_v: f64,
    /// Astigmatism angle in degrees
    pub defocus_angle: f64,
    /// Fit quality
    pub figure_of_merit: f64,
    /// Maximum fit resolution in Å
    pub max_resolution: f64,
    /// Phase shift in degrees, for phase-plate data
    pub phase_shift: Option<f64>,
    /// Power spectrum image of the fit
    pub psd_file: Option<String>,
}

impl CtfModel {
    /// CTF with defocus values only
    pub fn new(defocus_u: f64, defocus_v: f64, defocus_angle: f64) -> Self {
        Self {
            defocus_u,
            defocus_v,
            defocus_angle,
            ..Default::default()
        }
    }

    /// Absolute defocus difference in Å
    pub fn astigmatism(&self) -> f64 {
        (self.defocus_u - self.defocus_v).abs()
    }

    /// Set fit quality and resolution
    pub fn with_fit(mut self, figure_of_merit: f64, max_resolution: f64) -> Self {
        self.figure_of_merit = figure_of_merit;
        self.max_resolution = max_resolution;
        self
    }

    /// Set the phase shift
    pub fn with_phase_shift(mut self, phase_shift: f64) -> Self {
        self.phase_shift = Some(phase_shift);
        self
    }

    /// Set the power spectrum image
    pub fn with_psd_file(mut self, path: impl Into<String>) -> Self {
        self.psd_file = Some(path.into());
        self
    }
}

/// Picked position of a particle on its micrograph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Micrograph the particle was picked from
    pub micrograph_name: String,
    /// X in micrograph pixels
    pub x: f64,
    /// Y in micrograph pixels
    pub y: f64,
}

impl Coordinate {
    /// New coordinate
    pub fn new(micrograph_name: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            micrograph_name: micrograph_name.into(),
            x,
            y,
        }
    }
}

/// One extracted particle image
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Image location inside its stack
    pub location: Location,
    /// Pixel size in Å
    pub pixel_size: f64,
    /// Box size in pixels
    pub image_size: Option<usize>,
    /// 2 for images, 3 for volumes
    pub dimensionality: Option<u8>,
    /// Acquisition parameters
    pub acquisition: Acquisition,
    /// CTF estimate
    pub ctf: Option<CtfModel>,
    /// Alignment, shifts in pixels
    pub transform: Option<Transform>,
    /// Picked coordinate
    pub coordinate: Option<Coordinate>,
    /// Class assignment
    pub class_id: Option<i64>,
    /// Half-set assignment
    pub random_subset: Option<i64>,
    /// Optics group id, set on read
    pub optics_group: Option<u32>,
    /// Additional labeled values copied verbatim
    pub extra: BTreeMap<String, Value>,
}

impl Particle {
    /// Particle with the mandatory fields
    pub fn new(location: Location, pixel_size: f64, acquisition: Acquisition) -> Self {
        Self {
            location,
            pixel_size,
            image_size: None,
            dimensionality: None,
            acquisition,
            ctf: None,
            transform: None,
            coordinate: None,
            class_id: None,
            random_subset: None,
            optics_group: None,
            extra: BTreeMap::new(),
        }
    }

    /// Set box size and dimensionality
    pub fn with_image_size(mut self, size: usize, dimensionality: u8) -> Self {
        self.image_size = Some(size);
        self.dimensionality = Some(dimensionality);
        self
    }

    /// Set the CTF estimate
    pub fn with_ctf(mut self, ctf: CtfModel) -> Self {
        self.ctf = Some(ctf);
        self
    }

    /// Set the alignment
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Set the picked coordinate
    pub fn with_coordinate(mut self, coordinate: Coordinate) -> Self {
        self.coordinate = Some(coordinate);
        self
    }

    /// Set the class assignment
    pub fn with_class_id(mut self, class_id: i64) -> Self {
        self.class_id = Some(class_id);
        self
    }

    /// Set the half-set assignment
    pub fn with_random_subset(mut self, subset: i64) -> Self {
        self.random_subset = Some(subset);
        self
    }

    /// Attach an additional labeled value
    pub fn with_extra(mut self, label: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(label.into(), value.into());
        self
    }
}

/// One motion-corrected micrograph
#[derive(Debug, Clone, PartialEq)]
pub struct Micrograph {
    /// Micrograph file
    pub path: PathBuf,
    /// Pixel size in Å
    pub pixel_size: f64,
    /// Acquisition parameters
    pub acquisition: Acquisition,
    /// CTF estimate
    pub ctf: Option<CtfModel>,
    /// Optics group id, set on read
    pub optics_group: Option<u32>,
    /// Additional labeled values copied verbatim
    pub extra: BTreeMap<String, Value>,
}

impl Micrograph {
    /// Micrograph with the mandatory fields
    pub fn new(path: impl Into<PathBuf>, pixel_size: f64, acquisition: Acquisition) -> Self {
        Self {
            path: path.into(),
            pixel_size,
            acquisition,
            ctf: None,
            optics_group: None,
            extra: BTreeMap::new(),
        }
    }

    /// Set the CTF estimate
    pub fn with_ctf(mut self, ctf: CtfModel) -> Self {
        self.ctf = Some(ctf);
        self
    }

    /// Attach an additional labeled value
    pub fn with_extra(mut self, label: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(label.into(), value.into());
        self
    }
}

/// One raw movie stack
#[derive(Debug, Clone, PartialEq)]
pub struct Movie {
    /// Movie file
    pub path: PathBuf,
    /// Pixel size in Å
    pub pixel_size: f64,
    /// Number of frames
    pub frames: Option<usize>,
    /// Acquisition parameters
    pub acquisition: Acquisition,
    /// Optics group id, set on read
    pub optics_group: Option<u32>,
    /// Additional labeled values copied verbatim
    pub extra: BTreeMap<String, Value>,
}

impl Movie {
    /// Movie with the mandatory fields
    pub fn new(path: impl Into<PathBuf>, pixel_size: f64, acquisition: Acquisition) -> Self {
        Self {
            path: path.into(),
            pixel_size,
            frames: None,
            acquisition,
            optics_group: None,
            extra: BTreeMap::new(),
        }
    }

    /// Set the frame count
    pub fn with_frames(mut self, frames: usize) -> Self {
        self.frames = Some(frames);
        self
    }

    /// Attach an additional labeled value
    pub fn with_extra(mut self, label: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(label.into(), value.into());
        self
    }
}
