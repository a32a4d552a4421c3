use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::config::ReaderConfig;
use super::error::ConvertError;
use crate::labels::{
    BLOCK_OPTICS, CLASS_NUMBER, COORDINATE_X, COORDINATE_Y, CTF_FIGURE_OF_MERIT, CTF_IMAGE,
    CTF_LABELS, CTF_MAX_RESOLUTION, CTF_PHASE_SHIFT, DEFOCUS_ANGLE, DEFOCUS_U, DEFOCUS_V,
    IMAGE_NAME, MICROGRAPH_MOVIE_NAME, MICROGRAPH_NAME, NR_OF_FRAMES, RANDOM_SUBSET,
};
use crate::model::{Coordinate, CtfModel, Micrograph, Movie, Particle, SetKind};
use crate::optics::{OpticsGroup, OpticsTable};
use crate::star::{BlockReader, ColumnSet, Location, StarReader, TableRow, Value};
use crate::transform::AlignmentCodec;

type FileBlock = BlockReader<BufReader<File>>;

/// Reader turning STAR files back into records
///
/// The `optics` block is loaded first, then the file is re-opened and the
/// main block streamed row by row. Which optional fields are read is
/// decided once from the main block's columns.
pub struct SetReader {
    config: ReaderConfig,
}

impl SetReader {
    /// Create a reader; fails for alignment modes without a codec
    pub fn new(config: ReaderConfig) -> Result<Self, ConvertError> {
        AlignmentCodec::new(config.align)?;
        Ok(Self { config })
    }

    /// Reader configuration
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Stream the particles of a file
    pub fn read_particles<P: AsRef<Path>>(&self, path: P) -> Result<ParticleIter, ConvertError> {
        let (optics, block) = self.open(path.as_ref(), SetKind::Particles)?;
        let decoder = ParticleDecoder::from_columns(block.columns(), &self.config)?;
        Ok(ParticleIter {
            inner: Rows::new(block, optics),
            decoder,
        })
    }

    /// Stream the micrographs of a file
    pub fn read_micrographs<P: AsRef<Path>>(&self, path: P) -> Result<MicrographIter, ConvertError> {
        let (optics, block) = self.open(path.as_ref(), SetKind::Micrographs)?;
        let decoder = MicrographDecoder::from_columns(block.columns(), &self.config);
        Ok(MicrographIter {
            inner: Rows::new(block, optics),
            decoder,
        })
    }

    /// Stream the movies of a file
    pub fn read_movies<P: AsRef<Path>>(&self, path: P) -> Result<MovieIter, ConvertError> {
        let (optics, block) = self.open(path.as_ref(), SetKind::Movies)?;
        let decoder = MovieDecoder::from_columns(block.columns(), &self.config);
        Ok(MovieIter {
            inner: Rows::new(block, optics),
            decoder,
        })
    }

    fn open(&self, path: &Path, kind: SetKind) -> Result<(OpticsTable, FileBlock), ConvertError> {
        let optics = StarReader::open(path)?.read_table(BLOCK_OPTICS)?;
        let optics = OpticsTable::from_table(&optics)?;

        let name = self.config.block_name.as_deref().unwrap_or(kind.block_name());
        let block = StarReader::open(path)?.read_block(name)?;
        log::info!(
            "Reading {} from {} ({} optics groups, {} columns)",
            kind,
            path.display(),
            optics.len(),
            block.columns().len()
        );
        Ok((optics, block))
    }
}

/// Row cursor shared by the record iterators; stops after the first error
struct Rows {
    block: FileBlock,
    optics: OpticsTable,
    failed: bool,
}

impl Rows {
    fn new(block: FileBlock, optics: OpticsTable) -> Self {
        Self {
            block,
            optics,
            failed: false,
        }
    }

    fn next_with<T>(
        &mut self,
        decode: impl FnOnce(&TableRow, &OpticsGroup, &str) -> Result<T, ConvertError>,
    ) -> Option<Result<T, ConvertError>> {
        if self.failed {
            return None;
        }
        let result = match self.block.next()? {
            Ok(row) => self
                .optics
                .lookup_row(&row)
                .map_err(ConvertError::from)
                .and_then(|group| decode(&row, group, self.block.name())),
            Err(e) => Err(e.into()),
        };
        self.failed = result.is_err();
        Some(result)
    }
}

/// Extra labels declared in the config and present in the block
fn present_extra_labels(declared: &[String], columns: &ColumnSet) -> Vec<String> {
    declared
        .iter()
        .filter(|label| {
            let present = columns.has_column(label);
            if !present {
                log::warn!("Extra label {} not in block, ignoring", label);
            }
            present
        })
        .cloned()
        .collect()
}

fn copy_extra_labels(
    labels: &[String],
    row: &TableRow,
    extra: &mut BTreeMap<String, Value>,
) {
    for label in labels {
        if let Some(token) = row.get_str(label) {
            extra.insert(label.clone(), Value::parse_exact(token));
        }
    }
}

/// Which optional CTF columns a block carries
#[derive(Debug, Clone, Copy, Default)]
struct CtfColumns {
    present: bool,
    psd_file: bool,
    phase_shift: bool,
}

impl CtfColumns {
    fn of(columns: &ColumnSet) -> Self {
        Self {
            present: columns.has_any_column_of(CTF_LABELS),
            psd_file: columns.has_column(CTF_IMAGE),
            phase_shift: columns.has_column(CTF_PHASE_SHIFT),
        }
    }

    fn decode(&self, row: &TableRow) -> Result<Option<CtfModel>, ConvertError> {
        if !self.present {
            return Ok(None);
        }
        let mut ctf = CtfModel::new(
            row.get_f64_or(DEFOCUS_U, 0.0)?,
            row.get_f64_or(DEFOCUS_V, 0.0)?,
            row.get_f64_or(DEFOCUS_ANGLE, 0.0)?,
        )
        .with_fit(
            row.get_f64_or(CTF_FIGURE_OF_MERIT, 0.0)?,
            row.get_f64_or(CTF_MAX_RESOLUTION, 0.0)?,
        );
        if self.phase_shift {
            ctf.phase_shift = row.get_f64(CTF_PHASE_SHIFT)?;
        }
        if self.psd_file {
            ctf.psd_file = row.get_str(CTF_IMAGE).map(str::to_string);
        }
        Ok(Some(ctf))
    }
}

struct ParticleDecoder {
    codec: AlignmentCodec,
    ctf: CtfColumns,
    coordinate: bool,
    class_id: bool,
    random_subset: bool,
    extra_labels: Vec<String>,
}

impl ParticleDecoder {
    fn from_columns(columns: &ColumnSet, config: &ReaderConfig) -> Result<Self, ConvertError> {
        Ok(Self {
            codec: AlignmentCodec::for_columns(config.align, columns)?,
            ctf: CtfColumns::of(columns),
            coordinate: columns.has_all_columns(&[COORDINATE_X, COORDINATE_Y]),
            class_id: columns.has_column(CLASS_NUMBER),
            random_subset: columns.has_column(RANDOM_SUBSET),
            extra_labels: present_extra_labels(&config.extra_labels, columns),
        })
    }

    fn decode(
        &self,
        row: &TableRow,
        group: &OpticsGroup,
        block: &str,
    ) -> Result<Particle, ConvertError> {
        let location = Location::from_star(row.require_str(IMAGE_NAME, block)?);
        let mut particle = Particle::new(location, group.pixel_size, group.acquisition());
        particle.image_size = group.image_size;
        particle.dimensionality = group.dimensionality;
        particle.optics_group = Some(group.id);
        particle.ctf = self.ctf.decode(row)?;
        particle.transform = self.codec.decode(row, group.pixel_size)?;

        if self.coordinate {
            particle.coordinate = Some(Coordinate::new(
                row.get_str_or(MICROGRAPH_NAME, ""),
                row.get_f64_or(COORDINATE_X, 0.0)?,
                row.get_f64_or(COORDINATE_Y, 0.0)?,
            ));
        }
        if self.class_id {
            particle.class_id = row.get_i64(CLASS_NUMBER)?;
        }
        if self.random_subset {
            particle.random_subset = row.get_i64(RANDOM_SUBSET)?;
        }
        copy_extra_labels(&self.extra_labels, row, &mut particle.extra);
        Ok(particle)
    }
}

struct MicrographDecoder {
    ctf: CtfColumns,
    extra_labels: Vec<String>,
}

impl MicrographDecoder {
    fn from_columns(columns: &ColumnSet, config: &ReaderConfig) -> Self {
        Self {
            ctf: CtfColumns::of(columns),
            extra_labels: present_extra_labels(&config.extra_labels, columns),
        }
    }

    fn decode(
        &self,
        row: &TableRow,
        group: &OpticsGroup,
        block: &str,
    ) -> Result<Micrograph, ConvertError> {
        let path = row.require_str(MICROGRAPH_NAME, block)?;
        let mut micrograph = Micrograph::new(path, group.pixel_size, group.acquisition());
        micrograph.optics_group = Some(group.id);
        micrograph.ctf = self.ctf.decode(row)?;
        copy_extra_labels(&self.extra_labels, row, &mut micrograph.extra);
        Ok(micrograph)
    }
}

struct MovieDecoder {
    frames: bool,
    extra_labels: Vec<String>,
}

impl MovieDecoder {
    fn from_columns(columns: &ColumnSet, config: &ReaderConfig) -> Self {
        Self {
            frames: columns.has_column(NR_OF_FRAMES),
            extra_labels: present_extra_labels(&config.extra_labels, columns),
        }
    }

    fn decode(&self, row: &TableRow, group: &OpticsGroup, block: &str) -> Result<Movie, ConvertError> {
        let path = row.require_str(MICROGRAPH_MOVIE_NAME, block)?;
        let mut movie = Movie::new(path, group.original_pixel_size, group.acquisition());
        movie.optics_group = Some(group.id);
        if self.frames {
            movie.frames = row
                .get_i64(NR_OF_FRAMES)?
                .and_then(|n| usize::try_from(n).ok());
        }
        copy_extra_labels(&self.extra_labels, row, &mut movie.extra);
        Ok(movie)
    }
}

/// Lazy iterator over the particles of a STAR file
pub struct ParticleIter {
    inner: Rows,
    decoder: ParticleDecoder,
}

impl ParticleIter {
    /// Columns of the particle block
    pub fn columns(&self) -> &ColumnSet {
        self.inner.block.columns()
    }

    /// Effective alignment codec for this block
    pub fn codec(&self) -> AlignmentCodec {
        self.decoder.codec
    }
}

impl Iterator for ParticleIter {
    type Item = Result<Particle, ConvertError>;

    fn next(&mut self) -> Option<Self::Item> {
        let decoder = &self.decoder;
        self.inner
            .next_with(|row, group, block| decoder.decode(row, group, block))
    }
}

/// Lazy iterator over the micrographs of a STAR file
pub struct MicrographIter {
    inner: Rows,
    decoder: MicrographDecoder,
}

impl MicrographIter {
    /// Columns of the micrograph block
    pub fn columns(&self) -> &ColumnSet {
        self.inner.block.columns()
    }
}

impl Iterator for MicrographIter {
    type Item = Result<Micrograph, ConvertError>;

    fn next(&mut self) -> Option<Self::Item> {
        let decoder = &self.decoder;
        self.inner
            .next_with(|row, group, block| decoder.decode(row, group, block))
    }
}

/// Lazy iterator over the movies of a STAR file
pub struct MovieIter {
    inner: Rows,
    decoder: MovieDecoder,
}

impl Iterator for MovieIter {
    type Item = Result<Movie, ConvertError>;

    fn next(&mut self) -> Option<Self::Item> {
        let decoder = &self.decoder;
        self.inner
            .next_with(|row, group, block| decoder.decode(row, group, block))
    }
}
