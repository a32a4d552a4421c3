use super::*;
use crate::assets::{AssetConfig, ProcessRunner};
use crate::model::{Acquisition, Coordinate, CtfModel, Micrograph, Movie, Particle, SetKind};
use crate::star::{Location, Row, SchemaError, StarError, StarReader, Table, Value};
use crate::transform::{AlignType, Transform};
use nalgebra::Vector3;
use std::collections::BTreeSet;
use std::fs;
use std::io::Cursor;
use std::path::PathBuf;
use tempfile::tempdir;

fn krios() -> Acquisition {
    Acquisition::new(300.0, 2.7, 0.1)
}

fn particle(index: usize) -> Particle {
    Particle::new(Location::indexed(index, "Extract/stack.mrcs"), 1.0, krios())
}

fn writer(align: AlignType) -> SetWriter {
    SetWriter::new(
        WriterConfig::default()
            .with_align(align)
            .with_comment("test output"),
    )
    .unwrap()
}

fn parse(buf: Vec<u8>, main: &str) -> (Table, Table) {
    let mut reader = StarReader::new(Cursor::new(buf));
    let table = reader.read_table(main).unwrap();
    let optics = reader.read_table("optics").unwrap();
    (table, optics)
}

#[test]
fn test_two_particle_example() {
    let particles = vec![
        particle(1).with_transform(Transform::in_plane(30.0, 2.0, 3.0)),
        particle(2).with_transform(Transform::in_plane(0.0, 0.0, 0.0)),
    ];

    let mut buf = Vec::new();
    let stats = writer(AlignType::TwoD)
        .write_particles_to(&particles, &mut buf)
        .unwrap();
    assert_eq!(stats.records_written, 2);
    assert_eq!(stats.optics_groups, 1);
    assert_eq!(stats.blocks_written, 2);

    let text = String::from_utf8(buf.clone()).unwrap();
    assert!(text.starts_with("# test output\n# version 30001\ndata_particles\n"));

    let (table, optics) = parse(buf, "particles");
    assert_eq!(table.len(), 2);
    for row in table.iter() {
        assert_eq!(row.get_i64("rlnOpticsGroup").unwrap(), Some(1));
    }
    let first = table.get_row(0).unwrap();
    assert_eq!(first.get_str("rlnImageName"), Some("000001@Extract/stack.mrcs"));
    assert!((first.get_f64("rlnAnglePsi").unwrap().unwrap() + 30.0).abs() < 1e-9);
    assert_eq!(first.get_f64("rlnOriginXAngst").unwrap(), Some(2.0));
    assert_eq!(first.get_f64("rlnOriginYAngst").unwrap(), Some(3.0));
    let second = table.get_row(1).unwrap();
    assert_eq!(second.get_str("rlnAnglePsi"), Some("0.0"));

    assert_eq!(optics.len(), 1);
    let group = optics.get_row(0).unwrap();
    assert_eq!(group.get_i64("rlnOpticsGroup").unwrap(), Some(1));
    assert_eq!(group.get_str("rlnOpticsGroupName"), Some("opticsGroup1"));
    assert_eq!(group.get_f64("rlnVoltage").unwrap(), Some(300.0));
    assert_eq!(group.get_f64("rlnSphericalAberration").unwrap(), Some(2.7));
    assert_eq!(group.get_f64("rlnAmplitudeContrast").unwrap(), Some(0.1));
    assert_eq!(group.get_f64("rlnImagePixelSize").unwrap(), Some(1.0));
}

#[test]
fn test_changed_fingerprint_adds_second_group() {
    let particles = vec![
        particle(1),
        particle(2),
        Particle::new(
            Location::indexed(3, "Extract/stack.mrcs"),
            1.0,
            Acquisition::new(200.0, 2.7, 0.1),
        ),
        particle(4),
    ];
    let mut buf = Vec::new();
    let stats = writer(AlignType::None)
        .write_particles_to(&particles, &mut buf)
        .unwrap();
    assert_eq!(stats.optics_groups, 2);

    let (table, optics) = parse(buf, "particles");
    let ids: Vec<i64> = table
        .iter()
        .map(|r| r.get_i64("rlnOpticsGroup").unwrap().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 1, 2, 1]);
    assert_eq!(optics.get_row(1).unwrap().get_f64("rlnVoltage").unwrap(), Some(200.0));
    assert!(!table.columns().has_column("rlnAnglePsi"));
}

#[test]
fn test_empty_input_is_an_error() {
    let mut buf = Vec::new();
    let err = writer(AlignType::None)
        .write_particles_to(Vec::<Particle>::new(), &mut buf)
        .unwrap_err();
    assert!(matches!(err, ConvertError::EmptyInput(SetKind::Particles)));
    assert!(buf.is_empty());
}

#[test]
fn test_three_d_alignment_rejected() {
    let err = SetWriter::new(WriterConfig::default().with_align(AlignType::ThreeD))
        .err()
        .unwrap();
    assert!(matches!(err, ConvertError::TransformError(_)));
    assert!(SetReader::new(ReaderConfig::default().with_align(AlignType::ThreeD)).is_err());
}

#[test]
fn test_optional_columns_follow_first_record() {
    let particles = vec![
        particle(1).with_ctf(CtfModel::new(12000.0, 11500.0, 45.0).with_fit(0.12, 3.5)),
        particle(2).with_class_id(3),
    ];
    let mut buf = Vec::new();
    writer(AlignType::None)
        .write_particles_to(&particles, &mut buf)
        .unwrap();

    let (table, _) = parse(buf, "particles");
    let columns = table.columns();
    assert!(columns.has_all_columns(&["rlnDefocusU", "rlnCtfAstigmatism", "rlnCtfMaxResolution"]));
    assert!(!columns.has_column("rlnClassNumber"));
    assert!(!columns.has_column("rlnCtfPhaseShift"));

    let first = table.get_row(0).unwrap();
    assert_eq!(first.get_f64("rlnCtfAstigmatism").unwrap(), Some(500.0));
    let second = table.get_row(1).unwrap();
    assert_eq!(second.get_f64("rlnDefocusU").unwrap(), Some(0.0));
}

#[test]
fn test_fill_random_subset_alternates() {
    let particles: Vec<_> = (1..=4)
        .map(particle)
        .enumerate()
        .map(|(i, p)| if i == 2 { p.with_random_subset(1) } else { p })
        .collect();
    let writer = SetWriter::new(
        WriterConfig::default()
            .with_fill_random_subset(true)
            .with_comment("test output"),
    )
    .unwrap();
    let mut buf = Vec::new();
    writer.write_particles_to(&particles, &mut buf).unwrap();

    let (table, _) = parse(buf, "particles");
    let subsets: Vec<i64> = table
        .iter()
        .map(|r| r.get_i64("rlnRandomSubset").unwrap().unwrap())
        .collect();
    assert_eq!(subsets, vec![1, 2, 1, 2]);
}

#[test]
fn test_extra_labels_copied_verbatim() {
    let particles = vec![
        particle(1)
            .with_extra("rlnAutopickFigureOfMerit", 1.25)
            .with_extra("rlnHelicalTubeID", 7i64),
        particle(2).with_extra("rlnAutopickFigureOfMerit", 0.5),
    ];
    let writer = SetWriter::new(
        WriterConfig::default()
            .with_extra_labels(["rlnAutopickFigureOfMerit", "rlnGroupName"])
            .with_comment("test output"),
    )
    .unwrap();
    let mut buf = Vec::new();
    writer.write_particles_to(&particles, &mut buf).unwrap();

    let (table, _) = parse(buf, "particles");
    assert!(table.columns().has_column("rlnAutopickFigureOfMerit"));
    assert!(!table.columns().has_column("rlnHelicalTubeID"));
    assert!(!table.columns().has_column("rlnGroupName"));
    assert_eq!(
        table.get_row(1).unwrap().get_f64("rlnAutopickFigureOfMerit").unwrap(),
        Some(0.5)
    );
}

#[test]
fn test_particles_read_back() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("particles.star");
    let original = vec![
        particle(1)
            .with_image_size(200, 2)
            .with_transform(Transform::from_euler([30.0, 60.0, -45.0], Vector3::new(1.5, -2.0, 0.5)))
            .with_ctf(CtfModel::new(10000.0, 9500.0, 12.0).with_phase_shift(90.0))
            .with_coordinate(Coordinate::new("mics/mic_001.mrc", 512.0, 640.0))
            .with_class_id(2)
            .with_extra("rlnAutopickFigureOfMerit", 0.8),
        particle(2)
            .with_image_size(200, 2)
            .with_transform(Transform::from_euler([0.0, 180.0, 0.0], Vector3::zeros()))
            .with_ctf(CtfModel::new(8000.0, 8200.0, 100.0).with_phase_shift(45.0))
            .with_coordinate(Coordinate::new("mics/mic_002.mrc", 10.0, 20.0))
            .with_class_id(5)
            .with_extra("rlnAutopickFigureOfMerit", 0.3),
    ];

    let config = WriterConfig::default()
        .with_align(AlignType::Projection)
        .with_extra_labels(["rlnAutopickFigureOfMerit"]);
    SetWriter::new(config)
        .unwrap()
        .write_particles(&original, &path)
        .unwrap();

    let reader = SetReader::new(
        ReaderConfig::default()
            .with_align(AlignType::Projection)
            .with_extra_labels(["rlnAutopickFigureOfMerit"]),
    )
    .unwrap();
    let iter = reader.read_particles(&path).unwrap();
    assert_eq!(iter.codec().mode(), AlignType::Projection);
    let read: Vec<Particle> = iter.collect::<Result<_, _>>().unwrap();

    assert_eq!(read.len(), 2);
    for (before, after) in original.iter().zip(&read) {
        assert_eq!(after.location, before.location);
        assert_eq!(after.optics_group, Some(1));
        assert_eq!(after.pixel_size, 1.0);
        assert_eq!(after.image_size, Some(200));
        assert_eq!(after.class_id, before.class_id);
        assert_eq!(after.coordinate, before.coordinate);
        assert_eq!(after.acquisition.voltage, 300.0);
        assert_eq!(after.extra, before.extra);

        let (ctf_before, ctf_after) = (before.ctf.as_ref().unwrap(), after.ctf.as_ref().unwrap());
        assert_eq!(ctf_after.defocus_u, ctf_before.defocus_u);
        assert_eq!(ctf_after.defocus_angle, ctf_before.defocus_angle);
        assert_eq!(ctf_after.phase_shift, ctf_before.phase_shift);

        let t_after = after.transform.unwrap();
        assert!(t_after.approx_eq(&before.transform.unwrap(), 1e-5));
    }
}

#[test]
fn test_reader_without_alignment_ignores_angles() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("particles.star");
    writer(AlignType::TwoD)
        .write_particles(vec![particle(1).with_transform(Transform::in_plane(10.0, 1.0, 1.0))], &path)
        .unwrap();

    let reader = SetReader::new(ReaderConfig::default()).unwrap();
    let read: Vec<_> = reader
        .read_particles(&path)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert!(read[0].transform.is_none());
}

#[test]
fn test_micrographs_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("micrographs.star");
    let original = vec![
        Micrograph::new("MotionCorr/job002/mic_021.mrc", 0.885, krios().with_mtf_file("mtf_k3.star"))
            .with_ctf(
                CtfModel::new(10863.857422, 10575.72168, 77.967194)
                    .with_fit(0.131144, 4.809192)
                    .with_psd_file("CtfFind/job003/mic_021_PS.ctf:mrc"),
            ),
        Micrograph::new("MotionCorr/job002/mic_022.mrc", 0.885, krios().with_mtf_file("mtf_k3.star"))
            .with_ctf(CtfModel::new(9836.475586, 9586.71875, 70.29129).with_psd_file("p.ctf")),
    ];
    let stats = writer(AlignType::None)
        .write_micrographs(&original, &path)
        .unwrap();
    assert_eq!(stats.kind, SetKind::Micrographs);

    let read: Vec<Micrograph> = SetReader::new(ReaderConfig::default())
        .unwrap()
        .read_micrographs(&path)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(read.len(), 2);
    assert_eq!(read[0].path, PathBuf::from("MotionCorr/job002/mic_021.mrc"));
    assert_eq!(read[0].pixel_size, 0.885);
    assert_eq!(read[0].acquisition.mtf_file.as_deref(), Some("mtf_k3.star"));
    assert_eq!(read[0].ctf, original[0].ctf);
    assert_eq!(
        read[1].ctf.as_ref().and_then(|c| c.psd_file.as_deref()),
        Some("p.ctf")
    );
}

#[test]
fn test_movies_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("movies.star");
    let original = vec![
        Movie::new("Movies/m1.tiff", 0.5, krios().with_group_name("session1")).with_frames(40),
        Movie::new("Movies/m2.tiff", 0.5, krios().with_group_name("session2")).with_frames(38),
    ];
    writer(AlignType::None).write_movies(&original, &path).unwrap();

    let read: Vec<Movie> = SetReader::new(ReaderConfig::default())
        .unwrap()
        .read_movies(&path)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(read[1].frames, Some(38));
    assert_eq!(read[1].optics_group, Some(2));
    assert_eq!(
        read[1].acquisition.optics_group_name.as_deref(),
        Some("session2")
    );
    assert_eq!(read[0].pixel_size, 0.5);
}

#[test]
fn test_unknown_optics_group_aborts_read() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.star");
    fs::write(
        &path,
        "data_particles\nloop_\n_rlnImageName\n_rlnOpticsGroup\n000001@s.mrcs 1\n000002@s.mrcs 3\n000003@s.mrcs 1\n\n\
         data_optics\nloop_\n_rlnOpticsGroup\n_rlnImagePixelSize\n1 1.0\n",
    )
    .unwrap();

    let results: Vec<_> = SetReader::new(ReaderConfig::default())
        .unwrap()
        .read_particles(&path)
        .unwrap()
        .collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(matches!(
        results[1],
        Err(ConvertError::SchemaError(crate::star::SchemaError::UnknownOpticsGroup(3)))
    ));
}

#[test]
fn test_missing_optics_block() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("old.star");
    fs::write(&path, "data_particles\nloop_\n_rlnImageName\n000001@s.mrcs\n").unwrap();

    let err = SetReader::new(ReaderConfig::default())
        .unwrap()
        .read_particles(&path)
        .err()
        .unwrap();
    assert!(matches!(
        err,
        ConvertError::StarError(StarError::BlockNotFound(ref name)) if name == "optics"
    ));
}

#[cfg(unix)]
#[test]
fn test_prepared_assets_rewrite_image_names() {
    let dir = tempdir().unwrap();
    let stack = dir.path().join("data/stack.mrc");
    fs::create_dir_all(stack.parent().unwrap()).unwrap();
    fs::write(&stack, b"binary").unwrap();

    let out = dir.path().join("job");
    let mut writer = SetWriter::new(
        WriterConfig::default()
            .with_comment("test output")
            .with_assets(AssetConfig::new(&out)),
    )
    .unwrap();
    let files: BTreeSet<PathBuf> = [stack.clone()].into_iter().collect();
    let stats = writer.prepare_assets(&files, &ProcessRunner).unwrap();
    assert_eq!(stats.links_created, 1);

    let particles = vec![Particle::new(Location::indexed(4, &stack), 1.0, krios())];
    let mut buf = Vec::new();
    writer.write_particles_to(&particles, &mut buf).unwrap();

    let (table, _) = parse(buf, "particles");
    let expected = format!("000004@{}", out.join("input/stack.mrcs").display());
    assert_eq!(table.get_row(0).unwrap().get_str("rlnImageName"), Some(expected.as_str()));
    assert_eq!(
        writer.files_mapping().get(&stack),
        Some(out.join("input/stack.mrcs").as_path())
    );
}

#[test]
fn test_extra_value_kinds_survive() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("p.star");
    let original = vec![particle(1).with_extra("rlnGroupName", "group 1")];
    SetWriter::new(WriterConfig::default().with_extra_labels(["rlnGroupName"]))
        .unwrap()
        .write_particles(&original, &path)
        .unwrap();

    let read: Vec<_> = SetReader::new(ReaderConfig::default().with_extra_labels(["rlnGroupName"]))
        .unwrap()
        .read_particles(&path)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(
        read[0].extra.get("rlnGroupName"),
        Some(&Value::Str("group 1".to_string()))
    );
}

#[test]
fn test_numeric_looking_extra_strings_kept() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("p.star");
    let original = vec![
        particle(1)
            .with_extra("rlnGroupName", "007")
            .with_extra("rlnAutopickFigureOfMerit", "1.50"),
        particle(2)
            .with_extra("rlnGroupName", "12")
            .with_extra("rlnAutopickFigureOfMerit", 0.25),
    ];
    let labels = ["rlnGroupName", "rlnAutopickFigureOfMerit"];
    SetWriter::new(WriterConfig::default().with_extra_labels(labels))
        .unwrap()
        .write_particles(&original, &path)
        .unwrap();

    let read: Vec<_> = SetReader::new(ReaderConfig::default().with_extra_labels(labels))
        .unwrap()
        .read_particles(&path)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(read[0].extra["rlnGroupName"], Value::Str("007".to_string()));
    assert_eq!(read[0].extra["rlnAutopickFigureOfMerit"], Value::Str("1.50".to_string()));
    assert_eq!(read[1].extra["rlnGroupName"], Value::Int(12));
    assert_eq!(read[1].extra["rlnAutopickFigureOfMerit"], Value::Float(0.25));
}

#[test]
fn test_row_hook_and_block_name() {
    let particles: Vec<Particle> = (1..=3).map(particle).collect();
    let config = WriterConfig::default()
        .with_block_name("images")
        .with_comment("test output");

    let mut buf = Vec::new();
    let mut seen = 0;
    let stats = SetWriter::new(config)
        .unwrap()
        .write_particles_with(&particles, &mut buf, |p: &Particle, row: &mut Row| {
            seen += 1;
            row.set("rlnGroupName", format!("group_{}", p.location.to_star()));
            row.set("rlnOpticsGroup", 7i64);
        })
        .unwrap();
    assert_eq!(seen, 3);
    assert_eq!(stats.records_written, 3);

    let text = String::from_utf8(buf.clone()).unwrap();
    assert!(text.contains("data_images\n"));
    assert!(!text.contains("data_particles"));

    let (table, optics) = parse(buf, "images");
    assert_eq!(table.len(), 3);
    assert_eq!(
        table.get_row(1).unwrap().get_str("rlnGroupName"),
        Some("group_000002@Extract/stack.mrcs")
    );
    assert!(table.rows().iter().all(|row| row.get_i64("rlnOpticsGroup").unwrap() == Some(7)));
    assert_eq!(optics.len(), 1);
}

#[test]
fn test_row_hook_cannot_add_labels_after_first_row() {
    let particles: Vec<Particle> = (1..=2).map(particle).collect();
    let mut buf = Vec::new();
    let err = writer(AlignType::None)
        .write_particles_with(&particles, &mut buf, |p: &Particle, row: &mut Row| {
            if p.location.index == Some(2) {
                row.set("rlnClassNumber", 1i64);
            }
        })
        .unwrap_err();
    assert!(matches!(
        err,
        ConvertError::StarError(StarError::Schema(SchemaError::UnknownColumn { ref label, .. }))
            if label == "rlnClassNumber"
    ));
}
