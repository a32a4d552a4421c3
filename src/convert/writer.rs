use std::borrow::Borrow;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;

use super::config::WriterConfig;
use super::error::ConvertError;
use super::stats::ConversionStats;
use crate::assets::{AssetMap, AssetPlanner, AssetStats, JobRunner};
use crate::labels::{
    CLASS_NUMBER, COORDINATE_X, COORDINATE_Y, CTF_ASTIGMATISM, CTF_FIGURE_OF_MERIT, CTF_IMAGE,
    CTF_MAX_RESOLUTION, CTF_PHASE_SHIFT, DEFOCUS_ANGLE, DEFOCUS_U, DEFOCUS_V, IMAGE_NAME,
    MICROGRAPH_MOVIE_NAME, MICROGRAPH_NAME, NR_OF_FRAMES, OPTICS_GROUP, RANDOM_SUBSET,
};
use crate::model::{CtfModel, Micrograph, Movie, Particle, SetKind};
use crate::optics::{GroupSnapshot, OpticsGroups};
use crate::star::{Row, StarWriter, Value};
use crate::transform::AlignmentCodec;

/// Writer turning record sets into STAR files
///
/// Each `write_*` call is one pass: the first record fixes the column
/// schema, every record is streamed as one row, and the optics groups seen
/// during the pass are appended as the `optics` block.
///
/// The `write_*_with` variants hand each encoded row to a caller hook
/// before it is written. Labels the hook adds to the first row join the
/// schema; labels it adds only to later rows are rejected.
///
/// # Example
///
/// ```rust,no_run
/// use emstar::convert::{SetWriter, WriterConfig};
/// use emstar::model::{Acquisition, Particle};
/// use emstar::star::Location;
/// use emstar::transform::{AlignType, Transform};
///
/// let writer = SetWriter::new(WriterConfig::default().with_align(AlignType::TwoD))?;
/// let particles = vec![Particle::new(
///     Location::indexed(1, "stack.mrcs"),
///     1.0,
///     Acquisition::new(300.0, 2.7, 0.1),
/// )
/// .with_transform(Transform::in_plane(30.0, 2.0, 3.0))];
///
/// let stats = writer.write_particles(&particles, "particles.star")?;
/// println!("{}", stats);
/// # Ok::<(), emstar::convert::ConvertError>(())
/// ```
pub struct SetWriter {
    config: WriterConfig,
    files_mapping: AssetMap,
}

impl SetWriter {
    /// Create a writer; fails for alignment modes without a codec
    pub fn new(config: WriterConfig) -> Result<Self, ConvertError> {
        AlignmentCodec::new(config.align)?;
        Ok(Self {
            config,
            files_mapping: AssetMap::new(),
        })
    }

    /// Writer configuration
    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// Plan and materialize the binary files referenced by the records.
    ///
    /// Later writes substitute the materialized paths. Without this call
    /// paths are written as they are.
    pub fn prepare_assets(
        &mut self,
        files: &BTreeSet<PathBuf>,
        runner: &dyn JobRunner,
    ) -> Result<AssetStats, ConvertError> {
        let plan = AssetPlanner::new(self.config.assets.clone()).plan(files)?;
        let stats = plan.materialize(runner)?;
        self.files_mapping = plan.mapping;
        Ok(stats)
    }

    /// Original → materialized paths from [`prepare_assets`](Self::prepare_assets)
    pub fn files_mapping(&self) -> &AssetMap {
        &self.files_mapping
    }

    /// Write a particle set to a file
    pub fn write_particles<I, P>(&self, particles: I, path: P) -> Result<ConversionStats, ConvertError>
    where
        I: IntoIterator,
        I::Item: Borrow<Particle>,
        P: AsRef<Path>,
    {
        self.write_particles_to(particles, create(path.as_ref())?)
    }

    /// Write a particle set to any Write implementation
    pub fn write_particles_to<I, W>(&self, particles: I, writer: W) -> Result<ConversionStats, ConvertError>
    where
        I: IntoIterator,
        I::Item: Borrow<Particle>,
        W: Write,
    {
        self.write_particles_with(particles, writer, |_: &Particle, _: &mut Row| {})
    }

    /// Write a particle set, passing every encoded row through `hook` before
    /// it is written
    pub fn write_particles_with<I, W, H>(
        &self,
        particles: I,
        writer: W,
        hook: H,
    ) -> Result<ConversionStats, ConvertError>
    where
        I: IntoIterator,
        I::Item: Borrow<Particle>,
        W: Write,
        H: FnMut(&Particle, &mut Row),
    {
        self.write_set(SetKind::Particles, particles, writer, hook, |first: &Particle| {
            ParticleEncoder::from_first(first, &self.config, &self.files_mapping)
        })
    }

    /// Write a micrograph set to a file
    pub fn write_micrographs<I, P>(&self, micrographs: I, path: P) -> Result<ConversionStats, ConvertError>
    where
        I: IntoIterator,
        I::Item: Borrow<Micrograph>,
        P: AsRef<Path>,
    {
        self.write_micrographs_to(micrographs, create(path.as_ref())?)
    }

    /// Write a micrograph set to any Write implementation
    pub fn write_micrographs_to<I, W>(&self, micrographs: I, writer: W) -> Result<ConversionStats, ConvertError>
    where
        I: IntoIterator,
        I::Item: Borrow<Micrograph>,
        W: Write,
    {
        self.write_micrographs_with(micrographs, writer, |_: &Micrograph, _: &mut Row| {})
    }

    /// Write a micrograph set, passing every encoded row through `hook` before
    /// it is written
    pub fn write_micrographs_with<I, W, H>(
        &self,
        micrographs: I,
        writer: W,
        hook: H,
    ) -> Result<ConversionStats, ConvertError>
    where
        I: IntoIterator,
        I::Item: Borrow<Micrograph>,
        W: Write,
        H: FnMut(&Micrograph, &mut Row),
    {
        self.write_set(SetKind::Micrographs, micrographs, writer, hook, |first: &Micrograph| {
            Ok(MicrographEncoder::from_first(first, &self.config, &self.files_mapping))
        })
    }

    /// Write a movie set to a file
    pub fn write_movies<I, P>(&self, movies: I, path: P) -> Result<ConversionStats, ConvertError>
    where
        I: IntoIterator,
        I::Item: Borrow<Movie>,
        P: AsRef<Path>,
    {
        self.write_movies_to(movies, create(path.as_ref())?)
    }

    /// Write a movie set to any Write implementation
    pub fn write_movies_to<I, W>(&self, movies: I, writer: W) -> Result<ConversionStats, ConvertError>
    where
        I: IntoIterator,
        I::Item: Borrow<Movie>,
        W: Write,
    {
        self.write_movies_with(movies, writer, |_: &Movie, _: &mut Row| {})
    }

    /// Write a movie set, passing every encoded row through `hook` before
    /// it is written
    pub fn write_movies_with<I, W, H>(
        &self,
        movies: I,
        writer: W,
        hook: H,
    ) -> Result<ConversionStats, ConvertError>
    where
        I: IntoIterator,
        I::Item: Borrow<Movie>,
        W: Write,
        H: FnMut(&Movie, &mut Row),
    {
        self.write_set(SetKind::Movies, movies, writer, hook, |first: &Movie| {
            Ok(MovieEncoder::from_first(first, &self.config, &self.files_mapping))
        })
    }

    fn write_set<E, I, W, H, F>(
        &self,
        kind: SetKind,
        records: I,
        writer: W,
        mut hook: H,
        make_encoder: F,
    ) -> Result<ConversionStats, ConvertError>
    where
        E: RowEncoder,
        I: IntoIterator,
        I::Item: Borrow<E::Record>,
        W: Write,
        H: FnMut(&E::Record, &mut Row),
        F: FnOnce(&E::Record) -> Result<E, ConvertError>,
    {
        let mut records = records.into_iter();
        let first = records.next().ok_or(ConvertError::EmptyInput(kind))?;
        let mut encoder = make_encoder(first.borrow())?;
        let mut optics = OpticsGroups::new();

        let mut row = Row::new();
        encoder.encode(first.borrow(), &mut optics, &mut row)?;
        hook(first.borrow(), &mut row);

        let block_name = self.config.block_name.as_deref().unwrap_or(kind.block_name());
        let mut out = StarWriter::new(writer).with_version(self.config.star_version);
        out.write_comment(&self.provenance())?;
        let mut block = out.begin_block(block_name, &row)?;
        block.write_row(&row)?;
        for record in records {
            let record: &E::Record = record.borrow();
            row.clear();
            encoder.encode(record, &mut optics, &mut row)?;
            hook(record, &mut row);
            block.write_row(&row)?;
        }
        let records_written = block.finish()?;

        out.write_table(&optics.to_table(kind)?)?;
        let star = out.finish()?;

        let stats = ConversionStats {
            kind,
            records_written,
            optics_groups: optics.len(),
            blocks_written: star.blocks_written,
        };
        info!("{}", stats);
        Ok(stats)
    }

    fn provenance(&self) -> String {
        match &self.config.comment {
            Some(comment) => comment.clone(),
            None => format!(
                "Generated by emstar {} on {}",
                env!("CARGO_PKG_VERSION"),
                chrono::Utc::now().to_rfc3339()
            ),
        }
    }
}

fn create(path: &Path) -> Result<BufWriter<File>, ConvertError> {
    let file = File::create(path).map_err(crate::star::StarError::from)?;
    Ok(BufWriter::new(file))
}

/// Converts one record kind to rows, with optional columns fixed up front
trait RowEncoder {
    type Record;

    fn encode(
        &mut self,
        record: &Self::Record,
        optics: &mut OpticsGroups,
        row: &mut Row,
    ) -> Result<(), ConvertError>;
}

/// Extra labels declared in the config and present on the first record
fn present_extra_labels(
    declared: &[String],
    first: &BTreeMap<String, Value>,
) -> Vec<String> {
    declared
        .iter()
        .filter(|label| {
            let present = first.contains_key(label.as_str());
            if !present {
                log::warn!("Extra label {} missing on the first record, ignoring", label);
            }
            present
        })
        .cloned()
        .collect()
}

fn copy_extra_labels(
    labels: &[String],
    extra: &BTreeMap<String, Value>,
    row: &mut Row,
) {
    for label in labels {
        if let Some(value) = extra.get(label) {
            row.set(label, value.clone());
        }
    }
}

/// Which optional CTF columns a set carries
#[derive(Debug, Clone, Copy, Default)]
struct CtfColumns {
    present: bool,
    psd_file: bool,
    phase_shift: bool,
}

impl CtfColumns {
    fn of(first: Option<&CtfModel>) -> Self {
        match first {
            Some(ctf) => Self {
                present: true,
                psd_file: ctf.psd_file.is_some(),
                phase_shift: ctf.phase_shift.is_some(),
            },
            None => Self::default(),
        }
    }

    fn encode(&self, ctf: Option<&CtfModel>, row: &mut Row) {
        let Some(ctf) = ctf.filter(|_| self.present) else {
            return;
        };
        if self.psd_file {
            row.set(CTF_IMAGE, ctf.psd_file.as_deref().unwrap_or_default());
        }
        row.set(DEFOCUS_U, ctf.defocus_u);
        row.set(DEFOCUS_V, ctf.defocus_v);
        row.set(CTF_ASTIGMATISM, ctf.astigmatism());
        row.set(DEFOCUS_ANGLE, ctf.defocus_angle);
        row.set(CTF_FIGURE_OF_MERIT, ctf.figure_of_merit);
        row.set(CTF_MAX_RESOLUTION, ctf.max_resolution);
        if self.phase_shift {
            row.set(CTF_PHASE_SHIFT, ctf.phase_shift.unwrap_or_default());
        }
    }
}

/// Half-set column handling
#[derive(Debug, Clone, Copy)]
enum RandomSubset {
    Absent,
    FromRecord,
    Fill { written: usize },
}

impl RandomSubset {
    fn next(&mut self, value: Option<i64>) -> Option<i64> {
        match self {
            RandomSubset::Absent => None,
            RandomSubset::FromRecord => Some(value.unwrap_or_default()),
            RandomSubset::Fill { written } => {
                let alternate = (*written % 2) as i64 + 1;
                *written += 1;
                Some(value.unwrap_or(alternate))
            }
        }
    }
}

struct ParticleEncoder<'a> {
    mapping: &'a AssetMap,
    codec: AlignmentCodec,
    ctf: CtfColumns,
    coordinate: bool,
    class_id: bool,
    random_subset: RandomSubset,
    extra_labels: Vec<String>,
}

impl<'a> ParticleEncoder<'a> {
    fn from_first(
        first: &Particle,
        config: &WriterConfig,
        mapping: &'a AssetMap,
    ) -> Result<Self, ConvertError> {
        let random_subset = if config.fill_random_subset {
            RandomSubset::Fill { written: 0 }
        } else if first.random_subset.is_some() {
            RandomSubset::FromRecord
        } else {
            RandomSubset::Absent
        };
        Ok(Self {
            mapping,
            codec: AlignmentCodec::new(config.align)?,
            ctf: CtfColumns::of(first.ctf.as_ref()),
            coordinate: first.coordinate.is_some(),
            class_id: first.class_id.is_some(),
            random_subset,
            extra_labels: present_extra_labels(&config.extra_labels, &first.extra),
        })
    }
}

impl RowEncoder for ParticleEncoder<'_> {
    type Record = Particle;

    fn encode(
        &mut self,
        particle: &Particle,
        optics: &mut OpticsGroups,
        row: &mut Row,
    ) -> Result<(), ConvertError> {
        let location = particle
            .location
            .with_path(self.mapping.map_path(particle.location.path()));
        let snapshot = GroupSnapshot::new(particle.pixel_size)
            .with_image_size(particle.image_size, particle.dimensionality);

        row.set(IMAGE_NAME, location.to_star());
        row.set(OPTICS_GROUP, optics.resolve(&particle.acquisition, &snapshot));
        if self.coordinate {
            if let Some(coordinate) = &particle.coordinate {
                row.set(MICROGRAPH_NAME, coordinate.micrograph_name.as_str());
                row.set(COORDINATE_X, coordinate.x);
                row.set(COORDINATE_Y, coordinate.y);
            }
        }
        if self.class_id {
            row.set(CLASS_NUMBER, particle.class_id.unwrap_or_default());
        }
        self.ctf.encode(particle.ctf.as_ref(), row);
        self.codec
            .encode(particle.transform.as_ref(), particle.pixel_size, row)?;
        if let Some(subset) = self.random_subset.next(particle.random_subset) {
            row.set(RANDOM_SUBSET, subset);
        }
        copy_extra_labels(&self.extra_labels, &particle.extra, row);
        Ok(())
    }
}

struct MicrographEncoder<'a> {
    mapping: &'a AssetMap,
    ctf: CtfColumns,
    extra_labels: Vec<String>,
}

impl<'a> MicrographEncoder<'a> {
    fn from_first(first: &Micrograph, config: &WriterConfig, mapping: &'a AssetMap) -> Self {
        Self {
            mapping,
            ctf: CtfColumns::of(first.ctf.as_ref()),
            extra_labels: present_extra_labels(&config.extra_labels, &first.extra),
        }
    }
}

impl RowEncoder for MicrographEncoder<'_> {
    type Record = Micrograph;

    fn encode(
        &mut self,
        micrograph: &Micrograph,
        optics: &mut OpticsGroups,
        row: &mut Row,
    ) -> Result<(), ConvertError> {
        let path = self.mapping.map_path(&micrograph.path);
        row.set(MICROGRAPH_NAME, path.display().to_string());
        row.set(
            OPTICS_GROUP,
            optics.resolve(
                &micrograph.acquisition,
                &GroupSnapshot::new(micrograph.pixel_size),
            ),
        );
        self.ctf.encode(micrograph.ctf.as_ref(), row);
        copy_extra_labels(&self.extra_labels, &micrograph.extra, row);
        Ok(())
    }
}

struct MovieEncoder<'a> {
    mapping: &'a AssetMap,
    frames: bool,
    extra_labels: Vec<String>,
}

impl<'a> MovieEncoder<'a> {
    fn from_first(first: &Movie, config: &WriterConfig, mapping: &'a AssetMap) -> Self {
        Self {
            mapping,
            frames: first.frames.is_some(),
            extra_labels: present_extra_labels(&config.extra_labels, &first.extra),
        }
    }
}

impl RowEncoder for MovieEncoder<'_> {
    type Record = Movie;

    fn encode(
        &mut self,
        movie: &Movie,
        optics: &mut OpticsGroups,
        row: &mut Row,
    ) -> Result<(), ConvertError> {
        let path = self.mapping.map_path(&movie.path);
        row.set(MICROGRAPH_MOVIE_NAME, path.display().to_string());
        row.set(
            OPTICS_GROUP,
            optics.resolve(&movie.acquisition, &GroupSnapshot::new(movie.pixel_size)),
        );
        if self.frames {
            row.set(NR_OF_FRAMES, movie.frames.unwrap_or_default());
        }
        copy_extra_labels(&self.extra_labels, &movie.extra, row);
        Ok(())
    }
}
