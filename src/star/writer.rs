use std::borrow::Cow;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::error::{SchemaError, StarError};
use super::table::{ColumnSet, Row, Table};

/// Version written in the `# version` comment preceding every block
pub const DEFAULT_STAR_VERSION: u32 = 30001;

/// Statistics from a completed STAR write
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StarWriterStats {
    /// Number of data blocks written
    pub blocks_written: usize,
    /// Number of row lines written across all blocks
    pub rows_written: usize,
}

impl fmt::Display for StarWriterStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Wrote {} rows in {} blocks",
            self.rows_written, self.blocks_written
        )
    }
}

/// Writer for multi-block STAR files
///
/// Blocks are written either in bulk from a materialized [`Table`] or
/// streamed one row at a time through a [`BlockWriter`].
pub struct StarWriter<W: Write> {
    writer: W,
    version: u32,
    blocks_written: usize,
    rows_written: usize,
}

impl StarWriter<BufWriter<File>> {
    /// Create a new writer to a file path
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, StarError> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> StarWriter<W> {
    /// Create a new writer to any Write implementation
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            version: DEFAULT_STAR_VERSION,
            blocks_written: 0,
            rows_written: 0,
        }
    }

    /// Override the version number written before each block
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Write a free-text comment; each line of `text` becomes one `#` line
    pub fn write_comment(&mut self, text: &str) -> Result<(), StarError> {
        for line in text.lines() {
            writeln!(self.writer, "# {}", line)?;
        }
        Ok(())
    }

    /// Write a fully materialized table as a `loop_` block
    pub fn write_table(&mut self, table: &Table) -> Result<usize, StarError> {
        self.write_loop_header(table.name(), table.columns())?;
        for row in table.rows() {
            self.write_tokens(table.columns(), row.tokens())?;
        }
        writeln!(self.writer)?;

        self.blocks_written += 1;
        self.rows_written += table.len();
        Ok(table.len())
    }

    /// Write a key/value block with one `_label value` line per entry
    pub fn write_single_row_block(&mut self, name: &str, row: &Row) -> Result<(), StarError> {
        writeln!(self.writer, "# version {}", self.version)?;
        writeln!(self.writer, "data_{}", name)?;
        writeln!(self.writer)?;
        for (label, value) in row.iter() {
            let token = value.to_token();
            writeln!(self.writer, "_{} {}", label, quote_token(label, &token)?)?;
        }
        writeln!(self.writer)?;

        self.blocks_written += 1;
        self.rows_written += 1;
        Ok(())
    }

    /// Start a streamed `loop_` block.
    ///
    /// The header is taken from the labels and value kinds of `prototype`;
    /// the prototype's values are not written.
    pub fn begin_block(&mut self, name: &str, prototype: &Row) -> Result<BlockWriter<'_, W>, StarError> {
        let columns = ColumnSet::from_row(prototype)?;
        self.write_loop_header(name, &columns)?;
        Ok(BlockWriter {
            out: self,
            name: name.to_string(),
            columns,
            rows_written: 0,
        })
    }

    /// Flush and return statistics
    pub fn finish(mut self) -> Result<StarWriterStats, StarError> {
        self.writer.flush()?;
        Ok(StarWriterStats {
            blocks_written: self.blocks_written,
            rows_written: self.rows_written,
        })
    }

    fn write_loop_header(&mut self, name: &str, columns: &ColumnSet) -> Result<(), StarError> {
        writeln!(self.writer, "# version {}", self.version)?;
        writeln!(self.writer, "data_{}", name)?;
        writeln!(self.writer)?;
        writeln!(self.writer, "loop_")?;
        for column in columns.iter() {
            writeln!(self.writer, "_{}", column.label)?;
        }
        Ok(())
    }

    fn write_tokens(&mut self, columns: &ColumnSet, tokens: &[String]) -> Result<(), StarError> {
        let mut line = String::new();
        for (column, token) in columns.iter().zip(tokens) {
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&quote_token(&column.label, token)?);
        }
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Streaming writer for the rows of one `loop_` block
///
/// Holds only the frozen column set; each row is aligned and written as it
/// arrives.
pub struct BlockWriter<'a, W: Write> {
    out: &'a mut StarWriter<W>,
    name: String,
    columns: ColumnSet,
    rows_written: usize,
}

impl<W: Write> BlockWriter<'_, W> {
    /// Frozen column set of this block
    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }

    /// Number of rows written so far
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Append one row
    pub fn write_row(&mut self, row: &Row) -> Result<(), StarError> {
        let tokens = self.columns.align(row, &self.name)?;
        self.out.write_tokens(&self.columns, &tokens)?;
        self.rows_written += 1;
        Ok(())
    }

    /// Terminate the block and return the number of rows written
    pub fn finish(self) -> Result<usize, StarError> {
        writeln!(self.out.writer)?;
        self.out.blocks_written += 1;
        self.out.rows_written += self.rows_written;
        Ok(self.rows_written)
    }
}

/// Quote a token when it would otherwise not survive tokenization.
///
/// A quoted value ends at the first matching quote followed by whitespace,
/// so the quote character must not occur that way inside the token.
pub(crate) fn quote_token<'t>(label: &str, token: &'t str) -> Result<Cow<'t, str>, SchemaError> {
    let needs_quotes = token.is_empty()
        || token.chars().any(char::is_whitespace)
        || token.starts_with(['_', '#', '\'', '"'])
        || token.starts_with("data_")
        || token.starts_with("loop_");

    if !needs_quotes {
        return Ok(Cow::Borrowed(token));
    }
    match ['"', '\''].into_iter().find(|&q| !closes_early(token, q)) {
        Some(q) => Ok(Cow::Owned(format!("{q}{token}{q}"))),
        None => Err(SchemaError::InvalidValue {
            label: label.to_string(),
            value: token.to_string(),
            expected: "a string that can be quoted",
        }),
    }
}

fn closes_early(token: &str, quote: char) -> bool {
    let mut chars = token.chars().peekable();
    while let Some(c) = chars.next() {
        if c == quote && chars.peek().is_some_and(|next| next.is_whitespace()) {
            return true;
        }
    }
    false
}
