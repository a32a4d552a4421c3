//! Integration tests for emstar
//!
//! These tests run full write-read passes through files on disk.

use emstar::assets::{AssetConfig, JobRunner, ProcessRunner};
use emstar::convert::{ReaderConfig, SetReader, SetWriter, WriterConfig};
use emstar::model::{Acquisition, CtfModel, Particle};
use emstar::star::{Location, StarReader};
use emstar::transform::{AlignType, Transform};
use nalgebra::Vector3;
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn krios() -> Acquisition {
    Acquisition::new(300.0, 2.7, 0.1)
}

fn particles(count: usize, transform: impl Fn(usize) -> Transform) -> Vec<Particle> {
    (1..=count)
        .map(|i| {
            Particle::new(Location::indexed(i, "Extract/stack.mrcs"), 1.35, krios())
                .with_image_size(180, 2)
                .with_transform(transform(i))
                .with_ctf(CtfModel::new(15000.0 + i as f64, 14000.0, 20.0))
        })
        .collect()
}

fn round_trip(align: AlignType, originals: &[Particle]) -> Vec<Particle> {
    let dir = tempdir().unwrap();
    let path = dir.path().join("particles.star");

    let stats = SetWriter::new(WriterConfig::default().with_align(align))
        .unwrap()
        .write_particles(originals, &path)
        .unwrap();
    assert_eq!(stats.records_written, originals.len());

    SetReader::new(ReaderConfig::default().with_align(align))
        .unwrap()
        .read_particles(&path)
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

/// Test 2-D alignments through a file
#[test]
fn test_two_d_round_trip() {
    let originals = particles(50, |i| {
        Transform::in_plane(i as f64 * 7.3 - 180.0, i as f64 * 0.25 - 6.0, 3.0 - i as f64 * 0.1)
    });
    let read = round_trip(AlignType::TwoD, &originals);

    assert_eq!(read.len(), originals.len());
    for (before, after) in originals.iter().zip(&read) {
        assert!(after
            .transform
            .unwrap()
            .approx_eq(&before.transform.unwrap(), 1e-5));
        assert_eq!(after.location, before.location);
        assert_eq!(after.ctf, before.ctf);
    }
}

/// Test projection alignments through a file, including half turns
#[test]
fn test_projection_round_trip() {
    let originals = particles(60, |i| {
        let tilt = if i % 10 == 0 { 180.0 } else { i as f64 * 2.9 };
        Transform::from_euler(
            [i as f64 * 11.0 - 170.0, tilt, 45.0 - i as f64 * 3.1],
            Vector3::new(i as f64 * 0.1, -2.5, 1.0),
        )
    });
    let read = round_trip(AlignType::Projection, &originals);

    for (before, after) in originals.iter().zip(&read) {
        assert!(
            after
                .transform
                .unwrap()
                .approx_eq(&before.transform.unwrap(), 1e-5),
            "{} did not survive",
            before.location
        );
    }
}

/// A thousand particles with one acquisition share one optics group
#[test]
fn test_optics_groups_collapse() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("particles.star");
    let originals = particles(1000, |_| Transform::identity());

    let stats = SetWriter::new(WriterConfig::default())
        .unwrap()
        .write_particles(&originals, &path)
        .unwrap();
    assert_eq!(stats.optics_groups, 1);

    let optics = StarReader::open(&path).unwrap().read_table("optics").unwrap();
    assert_eq!(optics.len(), 1);
    assert_eq!(optics.get_row(0).unwrap().get_i64("rlnImageSize").unwrap(), Some(180));
    assert_eq!(
        optics.get_row(0).unwrap().get_f64("rlnImagePixelSize").unwrap(),
        Some(1.35)
    );

    let names = StarReader::open(&path).unwrap().block_names().unwrap();
    assert_eq!(names, vec!["particles", "optics"]);
}

/// Repeated asset preparation converges on the same links
#[cfg(unix)]
#[test]
fn test_asset_preparation_is_idempotent() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    fs::create_dir_all(&data).unwrap();
    let files: BTreeSet<PathBuf> = ["a/stack.mrc", "b/stack.mrc", "c.mrc"]
        .iter()
        .map(|name| {
            let path = data.join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, b"mrc").unwrap();
            path
        })
        .collect();

    let out = dir.path().join("Job007");
    let config = WriterConfig::default().with_assets(AssetConfig::new(&out));

    let mut first = SetWriter::new(config.clone()).unwrap();
    let stats = first.prepare_assets(&files, &ProcessRunner).unwrap();
    assert_eq!(stats.links_created, 3);

    let mut second = SetWriter::new(config).unwrap();
    let stats = second.prepare_assets(&files, &ProcessRunner).unwrap();
    assert_eq!(stats.links_created, 0);
    assert_eq!(stats.links_skipped, 3);
    assert_eq!(first.files_mapping(), second.files_mapping());

    let targets: BTreeSet<PathBuf> = second
        .files_mapping()
        .iter()
        .map(|(_, target)| target.clone())
        .collect();
    assert_eq!(targets.len(), 3);
    assert!(targets.contains(&out.join("input/stack_00002.mrcs")));
    assert_eq!(fs::read_dir(out.join("input")).unwrap().count(), 3);
}

/// The convert action invokes the runner once per file
#[test]
fn test_hdf_sources_are_converted() {
    struct CountingRunner(std::cell::Cell<usize>);

    impl JobRunner for CountingRunner {
        fn run(&self, _program: &str, _args: &[String]) -> Result<(), emstar::assets::AssetError> {
            self.0.set(self.0.get() + 1);
            Ok(())
        }
    }

    let dir = tempdir().unwrap();
    let files: BTreeSet<PathBuf> = ["x.hdf", "y.hdf"]
        .iter()
        .map(|name| dir.path().join(name))
        .collect();
    let runner = CountingRunner(std::cell::Cell::new(0));

    let mut writer = SetWriter::new(
        WriterConfig::default().with_assets(AssetConfig::new(dir.path().join("job"))),
    )
    .unwrap();
    let stats = writer.prepare_assets(&files, &runner).unwrap();

    assert_eq!(stats.files_converted, 2);
    assert_eq!(runner.0.get(), 2);
    assert_eq!(
        writer.files_mapping().map_path(&dir.path().join("x.hdf")),
        dir.path().join("job/input/x.mrcs")
    );
}
