use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use super::error::StarError;
use super::table::{Column, ColumnSet, Table, TableRow, ValueKind};

const DATA_PREFIX: &str = "data_";
const LOOP_MARKER: &str = "loop_";

/// Line source that skips comments and blank lines and supports one-line pushback
struct LineSource<R: BufRead> {
    reader: R,
    buf: String,
    line_no: usize,
    pushed: Option<(usize, String)>,
}

impl<R: BufRead> LineSource<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            buf: String::new(),
            line_no: 0,
            pushed: None,
        }
    }

    /// Next non-blank, non-comment line, trimmed
    fn next_significant(&mut self) -> Result<Option<(usize, String)>, StarError> {
        if let Some(line) = self.pushed.take() {
            return Ok(Some(line));
        }
        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            let line = self.buf.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            return Ok(Some((self.line_no, line.to_string())));
        }
    }

    fn push_back(&mut self, line_no: usize, line: String) {
        debug_assert!(self.pushed.is_none());
        self.pushed = Some((line_no, line));
    }
}

/// Forward-only reader for multi-block STAR files
///
/// Blocks are located by name in file order. Reading a block positions the
/// reader after it, so later blocks remain reachable; earlier ones require
/// re-opening the source.
pub struct StarReader<R: BufRead> {
    lines: LineSource<R>,
}

impl StarReader<BufReader<File>> {
    /// Open a STAR file from a path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StarError> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> StarReader<R> {
    /// Create a new reader from a BufRead source
    pub fn new(reader: R) -> Self {
        Self {
            lines: LineSource::new(reader),
        }
    }

    /// Open a block for lazy, single-pass row iteration
    pub fn read_block(mut self, name: &str) -> Result<BlockReader<R>, StarError> {
        seek_block(&mut self.lines, name)?;
        let state = BlockState::parse_header(&mut self.lines, name.to_string())?;
        Ok(BlockReader {
            lines: self.lines,
            state,
        })
    }

    /// Materialize a block in memory for random access
    pub fn read_table(&mut self, name: &str) -> Result<Table, StarError> {
        seek_block(&mut self.lines, name)?;
        let mut state = BlockState::parse_header(&mut self.lines, name.to_string())?;

        let mut rows = Vec::new();
        while let Some(row) = state.next_row(&mut self.lines)? {
            rows.push(row);
        }
        Ok(Table::from_parts(state.name, state.columns, rows))
    }

    /// Names of every remaining block, in file order
    pub fn block_names(mut self) -> Result<Vec<String>, StarError> {
        let mut names = Vec::new();
        while let Some((_, line)) = self.lines.next_significant()? {
            if let Some(name) = line.strip_prefix(DATA_PREFIX) {
                names.push(name.trim().to_string());
            }
        }
        Ok(names)
    }
}

fn seek_block<R: BufRead>(lines: &mut LineSource<R>, name: &str) -> Result<(), StarError> {
    while let Some((_, line)) = lines.next_significant()? {
        if let Some(found) = line.strip_prefix(DATA_PREFIX) {
            if found.trim() == name {
                return Ok(());
            }
        }
    }
    Err(StarError::BlockNotFound(name.to_string()))
}

/// Parsed header plus cursor state of one block
struct BlockState {
    name: String,
    columns: Arc<ColumnSet>,
    pending: VecDeque<TableRow>,
    done: bool,
}

impl BlockState {
    fn parse_header<R: BufRead>(lines: &mut LineSource<R>, name: String) -> Result<Self, StarError> {
        let Some((line_no, line)) = lines.next_significant()? else {
            return Ok(Self::empty(name));
        };

        if line.starts_with(LOOP_MARKER) {
            Self::parse_loop_header(lines, name)
        } else if line.starts_with('_') {
            lines.push_back(line_no, line);
            Self::parse_key_values(lines, name)
        } else {
            lines.push_back(line_no, line);
            Ok(Self::empty(name))
        }
    }

    fn empty(name: String) -> Self {
        Self {
            name,
            columns: Arc::new(ColumnSet::new()),
            pending: VecDeque::new(),
            done: true,
        }
    }

    fn parse_loop_header<R: BufRead>(lines: &mut LineSource<R>, name: String) -> Result<Self, StarError> {
        let mut labels: Vec<(usize, String)> = Vec::new();
        let mut first_row: Option<(usize, Vec<String>)> = None;

        while let Some((line_no, line)) = lines.next_significant()? {
            if let Some(rest) = line.strip_prefix('_') {
                // Trailing `#N` position annotations are ignored
                let label = rest.split_whitespace().next().unwrap_or_default();
                labels.push((line_no, label.to_string()));
                continue;
            }
            if is_block_boundary(&line) {
                lines.push_back(line_no, line);
            } else {
                first_row = Some((line_no, tokenize(&line, line_no)?));
            }
            break;
        }

        let mut columns = ColumnSet::new();
        for (i, (line_no, label)) in labels.into_iter().enumerate() {
            let kind = first_row
                .as_ref()
                .and_then(|(_, tokens)| tokens.get(i))
                .map(|t| ValueKind::infer(t))
                .unwrap_or(ValueKind::Str);
            columns
                .push(Column::new(label, kind))
                .map_err(|e| StarError::Malformed {
                    line: line_no,
                    message: e.to_string(),
                })?;
        }
        let columns = Arc::new(columns);

        let mut pending = VecDeque::new();
        let done = first_row.is_none();
        if let Some((line_no, tokens)) = first_row {
            pending.push_back(make_row(&columns, tokens, line_no)?);
        }

        Ok(Self {
            name,
            columns,
            pending,
            done,
        })
    }

    fn parse_key_values<R: BufRead>(lines: &mut LineSource<R>, name: String) -> Result<Self, StarError> {
        let mut columns = ColumnSet::new();
        let mut tokens = Vec::new();

        while let Some((line_no, line)) = lines.next_significant()? {
            let Some(rest) = line.strip_prefix('_') else {
                lines.push_back(line_no, line);
                break;
            };
            let (label, value) = match rest.split_once(char::is_whitespace) {
                Some((label, value)) => (label, value.trim()),
                None => (rest, ""),
            };
            let value = tokenize(value, line_no)?
                .into_iter()
                .next()
                .unwrap_or_default();
            columns
                .push(Column::new(label, ValueKind::infer(&value)))
                .map_err(|e| StarError::Malformed {
                    line: line_no,
                    message: e.to_string(),
                })?;
            tokens.push(value);
        }

        let columns = Arc::new(columns);
        let row = TableRow::new(Arc::clone(&columns), tokens);
        Ok(Self {
            name,
            columns,
            pending: VecDeque::from([row]),
            done: true,
        })
    }

    fn next_row<R: BufRead>(&mut self, lines: &mut LineSource<R>) -> Result<Option<TableRow>, StarError> {
        if let Some(row) = self.pending.pop_front() {
            return Ok(Some(row));
        }
        self.read_next(lines)
    }

    fn read_next<R: BufRead>(&mut self, lines: &mut LineSource<R>) -> Result<Option<TableRow>, StarError> {
        if self.done {
            return Ok(None);
        }
        match lines.next_significant()? {
            None => {
                self.done = true;
                Ok(None)
            }
            Some((line_no, line)) if is_block_boundary(&line) || line.starts_with('_') => {
                lines.push_back(line_no, line);
                self.done = true;
                Ok(None)
            }
            Some((line_no, line)) => {
                let tokens = tokenize(&line, line_no)?;
                make_row(&self.columns, tokens, line_no).map(Some)
            }
        }
    }
}

/// Lazy row cursor over one block
///
/// The column set is frozen once the header has been parsed. Iteration ends
/// at the next `data_` line or at end of input and cannot be restarted.
pub struct BlockReader<R: BufRead> {
    lines: LineSource<R>,
    state: BlockState,
}

impl<R: BufRead> BlockReader<R> {
    /// Block name
    pub fn name(&self) -> &str {
        &self.state.name
    }

    /// Frozen column set
    pub fn columns(&self) -> &ColumnSet {
        &self.state.columns
    }

    /// Whether the label is present
    pub fn has_column(&self, label: &str) -> bool {
        self.state.columns.has_column(label)
    }

    /// Whether every label is present
    pub fn has_all_columns(&self, labels: &[&str]) -> bool {
        self.state.columns.has_all_columns(labels)
    }

    /// Whether at least one label is present
    pub fn has_any_column_of(&self, labels: &[&str]) -> bool {
        self.state.columns.has_any_column_of(labels)
    }

    /// First unconsumed row, without consuming it
    pub fn peek(&mut self) -> Result<Option<&TableRow>, StarError> {
        if self.state.pending.is_empty() {
            if let Some(row) = self.state.read_next(&mut self.lines)? {
                self.state.pending.push_back(row);
            }
        }
        Ok(self.state.pending.front())
    }

    /// Next row, or `None` at the end of the block
    pub fn next_row(&mut self) -> Result<Option<TableRow>, StarError> {
        self.state.next_row(&mut self.lines)
    }

    /// Give the underlying reader back, positioned after this block's rows
    pub fn into_reader(self) -> StarReader<R> {
        StarReader { lines: self.lines }
    }
}

impl<R: BufRead> Iterator for BlockReader<R> {
    type Item = Result<TableRow, StarError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_row() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => None,
            Err(e) => {
                self.state.done = true;
                self.state.pending.clear();
                Some(Err(e))
            }
        }
    }
}

fn is_block_boundary(line: &str) -> bool {
    line.starts_with(DATA_PREFIX) || line.starts_with(LOOP_MARKER)
}

fn make_row(columns: &Arc<ColumnSet>, tokens: Vec<String>, line_no: usize) -> Result<TableRow, StarError> {
    if tokens.len() != columns.len() {
        return Err(StarError::Malformed {
            line: line_no,
            message: format!("expected {} values, found {}", columns.len(), tokens.len()),
        });
    }
    Ok(TableRow::new(Arc::clone(columns), tokens))
}

/// Split a row line into tokens, honouring single and double quotes
pub(crate) fn tokenize(line: &str, line_no: usize) -> Result<Vec<String>, StarError> {
    let mut tokens = Vec::new();
    let mut chars = line.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        if c == '"' || c == '\'' {
            chars.next();
            let mut end = None;
            while let Some((i, ch)) = chars.next() {
                let at_boundary = chars.peek().map_or(true, |&(_, next)| next.is_whitespace());
                if ch == c && at_boundary {
                    end = Some(i);
                    break;
                }
            }
            let Some(end) = end else {
                return Err(StarError::Malformed {
                    line: line_no,
                    message: "unterminated quoted value".to_string(),
                });
            };
            tokens.push(line[start + 1..end].to_string());
        } else {
            let mut end = line.len();
            while let Some(&(i, ch)) = chars.peek() {
                if ch.is_whitespace() {
                    end = i;
                    break;
                }
                chars.next();
            }
            tokens.push(line[start..end].to_string());
        }
    }

    Ok(tokens)
}
