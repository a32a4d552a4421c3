//! Column labels understood by the downstream toolchain
//!
//! Labels are written without the leading underscore; the STAR writer adds it.

// Block names
/// Optics group block
pub const BLOCK_OPTICS: &str = "optics";
/// Particle block
pub const BLOCK_PARTICLES: &str = "particles";
/// Micrograph block
pub const BLOCK_MICROGRAPHS: &str = "micrographs";
/// Movie block
pub const BLOCK_MOVIES: &str = "movies";

// Image and location columns
/// Particle image location (`index@stack`)
pub const IMAGE_NAME: &str = "rlnImageName";
/// Micrograph file, or the micrograph a particle was picked from
pub const MICROGRAPH_NAME: &str = "rlnMicrographName";
/// Movie file of a micrograph
pub const MICROGRAPH_MOVIE_NAME: &str = "rlnMicrographMovieName";
/// Number of frames in a movie
pub const NR_OF_FRAMES: &str = "rlnNrOfFrames";
/// Picked X coordinate in micrograph pixels
pub const COORDINATE_X: &str = "rlnCoordinateX";
/// Picked Y coordinate in micrograph pixels
pub const COORDINATE_Y: &str = "rlnCoordinateY";
/// Class assignment
pub const CLASS_NUMBER: &str = "rlnClassNumber";
/// Half-set assignment (1 or 2)
pub const RANDOM_SUBSET: &str = "rlnRandomSubset";

// Optics columns
/// Optics group id referenced from every row
pub const OPTICS_GROUP: &str = "rlnOpticsGroup";
/// Optics group name
pub const OPTICS_GROUP_NAME: &str = "rlnOpticsGroupName";
/// Acceleration voltage in kV
pub const VOLTAGE: &str = "rlnVoltage";
/// Spherical aberration in mm
pub const SPHERICAL_ABERRATION: &str = "rlnSphericalAberration";
/// Amplitude contrast fraction
pub const AMPLITUDE_CONTRAST: &str = "rlnAmplitudeContrast";
/// Pixel size of particle images in Å
pub const IMAGE_PIXEL_SIZE: &str = "rlnImagePixelSize";
/// Pixel size of micrographs in Å
pub const MICROGRAPH_PIXEL_SIZE: &str = "rlnMicrographPixelSize";
/// Pixel size of the original movies in Å
pub const MICROGRAPH_ORIGINAL_PIXEL_SIZE: &str = "rlnMicrographOriginalPixelSize";
/// Box size of particle images in pixels
pub const IMAGE_SIZE: &str = "rlnImageSize";
/// 2 for images, 3 for volumes
pub const IMAGE_DIMENSIONALITY: &str = "rlnImageDimensionality";
/// Detector MTF file
pub const MTF_FILE_NAME: &str = "rlnMtfFileName";
/// Detector defect file
pub const MICROGRAPH_DEFECT_FILE: &str = "rlnMicrographDefectFile";
/// Beam tilt X in mrad
pub const BEAM_TILT_X: &str = "rlnBeamTiltX";
/// Beam tilt Y in mrad
pub const BEAM_TILT_Y: &str = "rlnBeamTiltY";

// CTF columns
/// Power spectrum image of the CTF fit
pub const CTF_IMAGE: &str = "rlnCtfImage";
/// Defocus U in Å
pub const DEFOCUS_U: &str = "rlnDefocusU";
/// Defocus V in Å
pub const DEFOCUS_V: &str = "rlnDefocusV";
/// Astigmatism angle in degrees
pub const DEFOCUS_ANGLE: &str = "rlnDefocusAngle";
/// Absolute defocus difference in Å
pub const CTF_ASTIGMATISM: &str = "rlnCtfAstigmatism";
/// CTF fit quality
pub const CTF_FIGURE_OF_MERIT: &str = "rlnCtfFigureOfMerit";
/// Maximum resolution of the CTF fit in Å
pub const CTF_MAX_RESOLUTION: &str = "rlnCtfMaxResolution";
/// Phase shift in degrees
pub const CTF_PHASE_SHIFT: &str = "rlnCtfPhaseShift";

// Alignment columns
/// First Euler angle (rot) in degrees
pub const ANGLE_ROT: &str = "rlnAngleRot";
/// Second Euler angle (tilt) in degrees
pub const ANGLE_TILT: &str = "rlnAngleTilt";
/// Third Euler angle (psi, in-plane) in degrees
pub const ANGLE_PSI: &str = "rlnAnglePsi";
/// X shift in Å
pub const ORIGIN_X_ANGST: &str = "rlnOriginXAngst";
/// Y shift in Å
pub const ORIGIN_Y_ANGST: &str = "rlnOriginYAngst";
/// Z shift in Å
pub const ORIGIN_Z_ANGST: &str = "rlnOriginZAngst";

/// Columns whose presence marks a block as carrying alignment
pub const ALIGNMENT_LABELS: &[&str] = &[
    ANGLE_ROT,
    ANGLE_TILT,
    ANGLE_PSI,
    ORIGIN_X_ANGST,
    ORIGIN_Y_ANGST,
    ORIGIN_Z_ANGST,
];

/// Columns whose presence marks a block as carrying CTF estimates
pub const CTF_LABELS: &[&str] = &[DEFOCUS_U, DEFOCUS_V, DEFOCUS_ANGLE];
