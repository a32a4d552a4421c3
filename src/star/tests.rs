use super::*;
use std::io::Cursor;
use std::path::{Path, PathBuf};

fn particle_row(name: &str, group: i64, psi: f64) -> Row {
    Row::new()
        .with("rlnImageName", name)
        .with("rlnOpticsGroup", group)
        .with("rlnAnglePsi", psi)
}

#[test]
fn test_table_freezes_columns_after_first_row() {
    let mut table = Table::new("particles");
    table.add_row(&particle_row("a.mrcs", 1, 0.0)).unwrap();

    let extra = particle_row("b.mrcs", 1, 0.0).with("rlnClassNumber", 2i64);
    let err = table.add_row(&extra).unwrap_err();
    assert!(matches!(
        err,
        SchemaError::UnknownColumn { ref label, ref block } if label == "rlnClassNumber" && block == "particles"
    ));
    assert_eq!(table.len(), 1);

    let labels: Vec<_> = table.columns().labels().collect();
    assert_eq!(labels, vec!["rlnImageName", "rlnOpticsGroup", "rlnAnglePsi"]);
}

#[test]
fn test_missing_labels_use_kind_defaults() {
    let mut table = Table::new("particles");
    table.add_row(&particle_row("a.mrcs", 3, 12.5)).unwrap();
    table
        .add_row(&Row::new().with("rlnImageName", "b.mrcs"))
        .unwrap();

    let row = table.get_row(1).unwrap();
    assert_eq!(row.get_i64("rlnOpticsGroup").unwrap(), Some(0));
    assert_eq!(row.get_f64("rlnAnglePsi").unwrap(), Some(0.0));
    assert_eq!(row.get_str("rlnImageName"), Some("b.mrcs"));
}

#[test]
fn test_duplicate_columns_rejected() {
    let err = Table::with_columns(
        "optics",
        vec![
            Column::new("rlnVoltage", ValueKind::Float),
            Column::new("rlnVoltage", ValueKind::Float),
        ],
    )
    .unwrap_err();
    assert_eq!(err, SchemaError::DuplicateColumn("rlnVoltage".to_string()));
}

#[test]
fn test_row_set_replaces_in_place() {
    let mut row = Row::new().with("a", 1i64).with("b", 2i64);
    row.set("a", 5i64);
    let entries: Vec<_> = row.iter().map(|(l, v)| (l.to_string(), v.clone())).collect();
    assert_eq!(
        entries,
        vec![
            ("a".to_string(), Value::Int(5)),
            ("b".to_string(), Value::Int(2))
        ]
    );
}

#[test]
fn test_bulk_table_layout() -> Result<(), StarError> {
    let mut table = Table::new("optics");
    table.add_row(
        &Row::new()
            .with("rlnOpticsGroupName", "opticsGroup1")
            .with("rlnOpticsGroup", 1i64)
            .with("rlnVoltage", 300.0),
    )?;

    let mut buf = Vec::new();
    let mut writer = StarWriter::new(&mut buf);
    writer.write_comment("generated for a test")?;
    writer.write_table(&table)?;
    let stats = writer.finish()?;
    assert_eq!(stats.blocks_written, 1);
    assert_eq!(stats.rows_written, 1);

    let text = String::from_utf8(buf).unwrap();
    assert_eq!(
        text,
        "# generated for a test\n\
         # version 30001\n\
         data_optics\n\
         \n\
         loop_\n\
         _rlnOpticsGroupName\n\
         _rlnOpticsGroup\n\
         _rlnVoltage\n\
         opticsGroup1 1 300.0\n\
         \n"
    );
    Ok(())
}

#[test]
fn test_streamed_block_reads_back() -> Result<(), StarError> {
    let mut buf = Vec::new();
    let mut writer = StarWriter::new(&mut buf).with_version(31001);
    let prototype = particle_row("000001@stack.mrcs", 1, -30.0);
    let mut block = writer.begin_block("particles", &prototype)?;
    for i in 1..=5 {
        block.write_row(&particle_row(&format!("{:06}@stack.mrcs", i), 1, i as f64))?;
    }
    assert_eq!(block.finish()?, 5);
    writer.finish()?;

    let text = String::from_utf8(buf.clone()).unwrap();
    assert!(text.starts_with("# version 31001\ndata_particles\n"));

    let reader = StarReader::new(Cursor::new(buf));
    let block = reader.read_block("particles")?;
    assert!(block.has_all_columns(&["rlnImageName", "rlnOpticsGroup"]));
    assert!(!block.has_column("rlnClassNumber"));
    assert!(block.has_any_column_of(&["rlnAngleRot", "rlnAnglePsi"]));

    let rows: Vec<TableRow> = block.collect::<Result<_, _>>()?;
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[2].get_str("rlnImageName"), Some("000003@stack.mrcs"));
    assert_eq!(rows[2].get_f64("rlnAnglePsi")?, Some(3.0));
    Ok(())
}

#[test]
fn test_block_not_found() {
    let text = "# version 30001\ndata_optics\n\nloop_\n_rlnOpticsGroup\n1\n";
    let reader = StarReader::new(Cursor::new(text));
    let err = reader.read_block("particles").err().unwrap();
    assert!(matches!(err, StarError::BlockNotFound(ref name) if name == "particles"));
}

#[test]
fn test_read_table_random_access_and_following_block() -> Result<(), StarError> {
    let text = "\
# version 30001
data_particles

loop_
_rlnImageName #1
_rlnOpticsGroup #2
000001@a.mrcs 1
000002@a.mrcs 2

# version 30001
data_optics

loop_
_rlnOpticsGroup #1
_rlnVoltage #2
1 300.000000
2 200.000000
";
    let mut reader = StarReader::new(Cursor::new(text));
    let particles = reader.read_table("particles")?;
    assert_eq!(particles.len(), 2);
    assert_eq!(particles.get_row(1).unwrap().get_i64("rlnOpticsGroup")?, Some(2));

    let optics = reader.read_table("optics")?;
    assert_eq!(optics.len(), 2);
    assert_eq!(optics.get_row(1).unwrap().get_f64("rlnVoltage")?, Some(200.0));
    assert_eq!(
        optics.columns().get(1).map(|c| c.kind),
        Some(ValueKind::Float)
    );
    Ok(())
}

#[test]
fn test_column_kinds_inferred_from_first_row() -> Result<(), StarError> {
    let text = "data_t\nloop_\n_a\n_b\n_c\n1 2.5 name\n";
    let block = StarReader::new(Cursor::new(text)).read_block("t")?;
    let kinds: Vec<_> = block.columns().iter().map(|c| c.kind).collect();
    assert_eq!(kinds, vec![ValueKind::Int, ValueKind::Float, ValueKind::Str]);
    Ok(())
}

#[test]
fn test_quoted_values_round_trip() -> Result<(), StarError> {
    let mut table = Table::new("micrographs");
    table.add_row(
        &Row::new()
            .with("rlnMicrographName", "dir with spaces/mic.mrc")
            .with("rlnMtfFileName", ""),
    )?;

    let mut buf = Vec::new();
    let mut writer = StarWriter::new(&mut buf);
    writer.write_table(&table)?;
    writer.finish()?;

    let text = String::from_utf8(buf.clone()).unwrap();
    assert!(text.contains("\"dir with spaces/mic.mrc\" \"\"\n"));

    let table = StarReader::new(Cursor::new(buf)).read_table("micrographs")?;
    let row = table.get_row(0).unwrap();
    assert_eq!(row.get_str("rlnMicrographName"), Some("dir with spaces/mic.mrc"));
    assert_eq!(row.get_str("rlnMtfFileName"), Some(""));
    Ok(())
}

#[test]
fn test_mixed_quotes_round_trip() -> Result<(), StarError> {
    let mut table = Table::new("t");
    table.add_row(
        &Row::new()
            .with("rlnA", "a' b\"")
            .with("rlnB", "x\" y'")
            .with("rlnC", 1i64),
    )?;

    let mut buf = Vec::new();
    let mut writer = StarWriter::new(&mut buf);
    writer.write_table(&table)?;
    writer.finish()?;

    let text = String::from_utf8(buf.clone()).unwrap();
    assert!(text.contains("\"a' b\"\" 'x\" y'' 1\n"));

    let table = StarReader::new(Cursor::new(buf)).read_table("t")?;
    let row = table.get_row(0).unwrap();
    assert_eq!(row.get_str("rlnA"), Some("a' b\""));
    assert_eq!(row.get_str("rlnB"), Some("x\" y'"));
    Ok(())
}

#[test]
fn test_unquotable_value_rejected_on_write() {
    let mut table = Table::new("t");
    table.add_row(&Row::new().with("rlnA", "a' b\" c")).unwrap();

    let mut buf = Vec::new();
    let mut writer = StarWriter::new(&mut buf);
    let err = writer.write_table(&table).unwrap_err();
    assert!(matches!(
        err,
        StarError::Schema(SchemaError::InvalidValue { ref label, .. }) if label == "rlnA"
    ));
    let text = String::from_utf8(buf).unwrap();
    assert!(!text.contains("a' b"));
}

#[test]
fn test_streamed_block_rejects_unknown_label() -> Result<(), StarError> {
    let mut buf = Vec::new();
    let mut writer = StarWriter::new(&mut buf);
    let prototype = particle_row("000001@stack.mrcs", 1, 0.0);
    let mut block = writer.begin_block("particles", &prototype)?;
    block.write_row(&prototype)?;

    let extra = particle_row("000002@stack.mrcs", 1, 0.0).with("rlnClassNumber", 2i64);
    let err = block.write_row(&extra).unwrap_err();
    assert!(matches!(
        err,
        StarError::Schema(SchemaError::UnknownColumn { ref label, ref block })
            if label == "rlnClassNumber" && block == "particles"
    ));
    assert_eq!(block.rows_written(), 1);
    assert_eq!(block.finish()?, 1);
    writer.finish()?;

    let text = String::from_utf8(buf).unwrap();
    assert!(!text.contains("000002@stack.mrcs"));
    Ok(())
}

#[test]
fn test_key_value_block() -> Result<(), StarError> {
    let row = Row::new()
        .with("rlnReferenceDimensionality", 3i64)
        .with("rlnCurrentResolution", 4.25);

    let mut buf = Vec::new();
    let mut writer = StarWriter::new(&mut buf);
    writer.write_single_row_block("model_general", &row)?;
    writer.finish()?;

    let mut block = StarReader::new(Cursor::new(buf)).read_block("model_general")?;
    assert_eq!(block.columns().len(), 2);
    let only = block.next_row()?.unwrap();
    assert_eq!(only.get_i64("rlnReferenceDimensionality")?, Some(3));
    assert_eq!(only.get_f64("rlnCurrentResolution")?, Some(4.25));
    assert!(block.next_row()?.is_none());
    Ok(())
}

#[test]
fn test_malformed_row_is_an_error() {
    let text = "data_t\nloop_\n_a\n_b\n1 2\n3\n";
    let block = StarReader::new(Cursor::new(text)).read_block("t").unwrap();
    let results: Vec<_> = block.collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(StarError::Malformed { line: 6, .. })));
}

#[test]
fn test_peek_does_not_consume() -> Result<(), StarError> {
    let text = "data_t\nloop_\n_a\n1\n2\n";
    let mut block = StarReader::new(Cursor::new(text)).read_block("t")?;
    assert_eq!(block.peek()?.and_then(|r| r.get_str("a")), Some("1"));
    assert_eq!(block.next_row()?.unwrap().get_str("a"), Some("1"));
    assert_eq!(block.peek()?.and_then(|r| r.get_str("a")), Some("2"));
    assert_eq!(block.count(), 1);
    Ok(())
}

#[test]
fn test_block_reader_stops_at_next_block() -> Result<(), StarError> {
    let text = "data_a\nloop_\n_x\n1\n2\ndata_b\nloop_\n_y\n9\n";
    let mut block = StarReader::new(Cursor::new(text)).read_block("a")?;
    assert_eq!(block.by_ref().count(), 2);

    let mut next = block.into_reader().read_block("b")?;
    assert_eq!(next.next_row()?.unwrap().get_i64("y")?, Some(9));
    Ok(())
}

#[test]
fn test_block_names() -> Result<(), StarError> {
    let text = "# version 30001\ndata_particles\nloop_\n_a\n1\n\n# version 30001\ndata_optics\nloop_\n_b\n2\n";
    let names = StarReader::new(Cursor::new(text)).block_names()?;
    assert_eq!(names, vec!["particles".to_string(), "optics".to_string()]);
    Ok(())
}

#[test]
fn test_float_tokens_are_lossless() {
    let value = Value::Float(0.1 + 0.2);
    let token = value.to_token();
    assert_eq!(token.parse::<f64>().unwrap(), 0.1 + 0.2);
    assert_eq!(Value::Float(-30.0).to_token(), "-30.0");
    assert_eq!(Value::parse_token(&Value::Float(2.0).to_token()).kind(), ValueKind::Float);
}

#[test]
fn test_invalid_value_reports_label() {
    let mut table = Table::new("t");
    table.add_row(&Row::new().with("rlnVoltage", "high")).unwrap();
    let err = table.get_row(0).unwrap().get_f64("rlnVoltage").unwrap_err();
    assert!(matches!(err, SchemaError::InvalidValue { ref label, .. } if label == "rlnVoltage"));
}

#[test]
fn test_location_strings() {
    let loc = Location::indexed(5, "Extract/job001/stack.mrcs");
    assert_eq!(loc.to_star(), "000005@Extract/job001/stack.mrcs");
    assert_eq!(Location::from_star("000005@Extract/job001/stack.mrcs"), loc);

    let bare = Location::file("mics/mic_001.mrc");
    assert_eq!(bare.to_star(), "mics/mic_001.mrc");
    assert_eq!(Location::from_star("mics/mic_001.mrc"), bare);

    assert_eq!(
        location_to_star(Some(1234567), Path::new("s.mrcs")),
        "1234567@s.mrcs"
    );
    assert_eq!(Location::from_star("user@host.mrc").index, None);
    assert_eq!(
        star_to_location("000012@a/b.mrcs"),
        (Some(12), PathBuf::from("a/b.mrcs"))
    );
}
