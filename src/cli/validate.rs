use anyhow::{Context, Result};
use emstar::convert::{ConvertError, SetReader};
use emstar::model::SetKind;
use emstar::transform::AlignType;
use log::info;
use std::path::PathBuf;

use super::Config;

/// Stream every record of a STAR file through the set reader
pub fn run(
    file: PathBuf,
    kind: SetKind,
    align: Option<AlignType>,
    config: Option<PathBuf>,
) -> Result<()> {
    let mut reader_config = Config::load(config.as_deref())?.reader;
    if let Some(align) = align {
        reader_config.align = align;
    }

    info!("emstar Validator");
    info!("================");
    info!("File: {}", file.display());
    info!("Kind: {}, alignment: {}", kind, reader_config.align);

    let reader = SetReader::new(reader_config).context("Invalid reader configuration")?;
    let count = match kind {
        SetKind::Particles => count_records(reader.read_particles(&file)?)?,
        SetKind::Micrographs => count_records(reader.read_micrographs(&file)?)?,
        SetKind::Movies => count_records(reader.read_movies(&file)?)?,
    };

    println!("{}: {} {} read without errors", file.display(), count, kind);
    Ok(())
}

fn count_records<T, I>(records: I) -> Result<usize>
where
    I: Iterator<Item = Result<T, ConvertError>>,
{
    let mut count = 0;
    for record in records {
        record.with_context(|| format!("Record {} is invalid", count + 1))?;
        count += 1;
    }
    Ok(count)
}
