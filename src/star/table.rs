use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::error::SchemaError;

/// Kind of a column, inferred from the first value seen for it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Signed integer
    Int,
    /// Double precision float
    Float,
    /// Free text (paths, names, locations)
    Str,
}

impl ValueKind {
    /// Text written for a column a row leaves unset
    pub fn default_token(self) -> &'static str {
        match self {
            ValueKind::Int => "0",
            ValueKind::Float => "0.0",
            ValueKind::Str => "",
        }
    }

    /// Infer the kind of a raw text token
    pub fn infer(token: &str) -> Self {
        if token.parse::<i64>().is_ok() {
            ValueKind::Int
        } else if token.parse::<f64>().is_ok() {
            ValueKind::Float
        } else {
            ValueKind::Str
        }
    }

    fn name(self) -> &'static str {
        match self {
            ValueKind::Int => "integer",
            ValueKind::Float => "float",
            ValueKind::Str => "string",
        }
    }
}

/// A single cell value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Integer value
    Int(i64),
    /// Float value
    Float(f64),
    /// String value
    Str(String),
}

impl Value {
    /// Kind of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Str(_) => ValueKind::Str,
        }
    }

    /// Parse a raw token, preferring integer, then float, then string
    pub fn parse_token(token: &str) -> Self {
        if let Ok(v) = token.parse::<i64>() {
            Value::Int(v)
        } else if let Ok(v) = token.parse::<f64>() {
            Value::Float(v)
        } else {
            Value::Str(token.to_string())
        }
    }

    /// Parse a raw token, keeping it as a string unless the typed value
    /// formats back to the same text (`007` and `1.50` stay strings)
    pub fn parse_exact(token: &str) -> Self {
        match Value::parse_token(token) {
            Value::Str(s) => Value::Str(s),
            typed if typed.to_token() == token => typed,
            _ => Value::Str(token.to_string()),
        }
    }

    /// Unquoted text form.
    ///
    /// Floats use the shortest representation that parses back to the same
    /// bits and always keep a decimal point or exponent, so `-30.0` stays a
    /// float when read back.
    pub fn to_token(&self) -> String {
        match self {
            Value::Int(v) => v.to_string(),
            Value::Float(v) => format!("{:?}", v),
            Value::Str(s) => s.clone(),
        }
    }

    /// Numeric view of the value, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Str(s) => s.parse().ok(),
        }
    }

    /// Integer view of the value, if it has one
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            Value::Float(_) => None,
            Value::Str(s) => s.parse().ok(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_token())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

/// A labeled column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Label without the leading underscore
    pub label: String,
    /// Value kind
    pub kind: ValueKind,
}

impl Column {
    /// Create a new column
    pub fn new(label: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            label: label.into(),
            kind,
        }
    }
}

/// Ordered set of columns with constant-time label lookup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnSet {
    columns: Vec<Column>,
    index: HashMap<String, usize>,
}

impl ColumnSet {
    /// Create an empty column set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a column set, rejecting duplicate labels
    pub fn from_columns(columns: Vec<Column>) -> Result<Self, SchemaError> {
        let mut set = Self::new();
        for column in columns {
            set.push(column)?;
        }
        Ok(set)
    }

    /// Build a column set from a prototype row: labels in row order, kinds from its values
    pub fn from_row(row: &Row) -> Result<Self, SchemaError> {
        let mut set = Self::new();
        for (label, value) in row.iter() {
            set.push(Column::new(label, value.kind()))?;
        }
        Ok(set)
    }

    /// Append a column
    pub fn push(&mut self, column: Column) -> Result<(), SchemaError> {
        if self.index.contains_key(&column.label) {
            return Err(SchemaError::DuplicateColumn(column.label));
        }
        self.index.insert(column.label.clone(), self.columns.len());
        self.columns.push(column);
        Ok(())
    }

    /// Position of a label
    #[inline]
    pub fn position(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    /// Whether the label is present
    #[inline]
    pub fn has_column(&self, label: &str) -> bool {
        self.index.contains_key(label)
    }

    /// Whether every label is present
    pub fn has_all_columns(&self, labels: &[&str]) -> bool {
        labels.iter().all(|l| self.has_column(l))
    }

    /// Whether at least one label is present
    pub fn has_any_column_of(&self, labels: &[&str]) -> bool {
        labels.iter().any(|l| self.has_column(l))
    }

    /// Column at a position
    pub fn get(&self, position: usize) -> Option<&Column> {
        self.columns.get(position)
    }

    /// Columns in serialization order
    pub fn iter(&self) -> std::slice::Iter<'_, Column> {
        self.columns.iter()
    }

    /// Labels in serialization order
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.label.as_str())
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether there are no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Lay a row out in column order.
    ///
    /// Labels the row omits get their column's default token; a label the
    /// column set does not know is rejected.
    pub fn align(&self, row: &Row, block: &str) -> Result<Vec<String>, SchemaError> {
        for (label, _) in row.iter() {
            if !self.has_column(label) {
                return Err(SchemaError::UnknownColumn {
                    label: label.to_string(),
                    block: block.to_string(),
                });
            }
        }

        Ok(self
            .columns
            .iter()
            .map(|column| match row.get(&column.label) {
                Some(value) => value.to_token(),
                None => column.kind.default_token().to_string(),
            })
            .collect())
    }
}

/// Insertion-ordered mapping from label to value, used to build output rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    entries: Vec<(String, Value)>,
}

impl Row {
    /// Create an empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, replacing any existing value for the label in place
    pub fn set<V: Into<Value>>(&mut self, label: &str, value: V) {
        let value = value.into();
        match self.entries.iter_mut().find(|(l, _)| l == label) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((label.to_string(), value)),
        }
    }

    /// Builder-style [`Row::set`]
    pub fn with<V: Into<Value>>(mut self, label: &str, value: V) -> Self {
        self.set(label, value);
        self
    }

    /// Value for a label
    pub fn get(&self, label: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v)
    }

    /// Whether the label is set
    pub fn contains(&self, label: &str) -> bool {
        self.get(label).is_some()
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(l, v)| (l.as_str(), v))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the row has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every entry, keeping the allocation
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// A row laid out against a frozen column set.
///
/// Values are kept as their raw text so strings survive byte for byte;
/// typed getters parse on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    columns: Arc<ColumnSet>,
    tokens: Vec<String>,
}

impl TableRow {
    pub(crate) fn new(columns: Arc<ColumnSet>, tokens: Vec<String>) -> Self {
        debug_assert_eq!(columns.len(), tokens.len());
        Self { columns, tokens }
    }

    /// Column set this row is laid out against
    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }

    /// Raw tokens in column order
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Whether the label is present
    pub fn has_column(&self, label: &str) -> bool {
        self.columns.has_column(label)
    }

    /// Raw text for a label
    pub fn get_str(&self, label: &str) -> Option<&str> {
        self.columns
            .position(label)
            .map(|i| self.tokens[i].as_str())
    }

    /// Raw text for a label, or `default` when the column is absent
    pub fn get_str_or<'a>(&'a self, label: &str, default: &'a str) -> &'a str {
        self.get_str(label).unwrap_or(default)
    }

    /// Raw text for a label that must be present
    pub fn require_str(&self, label: &str, block: &str) -> Result<&str, SchemaError> {
        self.get_str(label).ok_or_else(|| SchemaError::MissingColumn {
            label: label.to_string(),
            block: block.to_string(),
        })
    }

    /// Parsed value for a label
    pub fn get_value(&self, label: &str) -> Option<Value> {
        self.get_str(label).map(Value::parse_token)
    }

    /// Float value for a label; `None` when the column is absent
    pub fn get_f64(&self, label: &str) -> Result<Option<f64>, SchemaError> {
        match self.get_str(label) {
            None => Ok(None),
            Some(token) => token
                .parse::<f64>()
                .map(Some)
                .map_err(|_| invalid(label, token, ValueKind::Float)),
        }
    }

    /// Float value for a label, or `default` when the column is absent
    pub fn get_f64_or(&self, label: &str, default: f64) -> Result<f64, SchemaError> {
        Ok(self.get_f64(label)?.unwrap_or(default))
    }

    /// Integer value for a label; integral floats such as `2.0` are accepted
    pub fn get_i64(&self, label: &str) -> Result<Option<i64>, SchemaError> {
        let Some(token) = self.get_str(label) else {
            return Ok(None);
        };
        if let Ok(v) = token.parse::<i64>() {
            return Ok(Some(v));
        }
        match token.parse::<f64>() {
            Ok(v) if v.is_finite() && v.fract() == 0.0 => Ok(Some(v as i64)),
            _ => Err(invalid(label, token, ValueKind::Int)),
        }
    }

    /// Integer value for a label, or `default` when the column is absent
    pub fn get_i64_or(&self, label: &str, default: i64) -> Result<i64, SchemaError> {
        Ok(self.get_i64(label)?.unwrap_or(default))
    }
}

fn invalid(label: &str, token: &str, kind: ValueKind) -> SchemaError {
    SchemaError::InvalidValue {
        label: label.to_string(),
        value: token.to_string(),
        expected: kind.name(),
    }
}

/// A named, materialized table
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    columns: Arc<ColumnSet>,
    rows: Vec<TableRow>,
    frozen: bool,
}

impl Table {
    /// Create an empty table whose columns are seeded by the first added row
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Arc::new(ColumnSet::new()),
            rows: Vec::new(),
            frozen: false,
        }
    }

    /// Create an empty table with a fixed column set
    pub fn with_columns(name: impl Into<String>, columns: Vec<Column>) -> Result<Self, SchemaError> {
        Ok(Self {
            name: name.into(),
            columns: Arc::new(ColumnSet::from_columns(columns)?),
            rows: Vec::new(),
            frozen: true,
        })
    }

    pub(crate) fn from_parts(name: String, columns: Arc<ColumnSet>, rows: Vec<TableRow>) -> Self {
        Self {
            name,
            columns,
            rows,
            frozen: true,
        }
    }

    /// Block name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Frozen column order
    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }

    /// Append a row.
    ///
    /// The first row fixes the column set when none was given up front.
    pub fn add_row(&mut self, row: &Row) -> Result<(), SchemaError> {
        if !self.frozen {
            self.columns = Arc::new(ColumnSet::from_row(row)?);
            self.frozen = true;
        }
        let tokens = self.columns.align(row, &self.name)?;
        self.rows.push(TableRow::new(Arc::clone(&self.columns), tokens));
        Ok(())
    }

    /// Row at an index
    pub fn get_row(&self, index: usize) -> Option<&TableRow> {
        self.rows.get(index)
    }

    /// All rows
    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    /// Iterate over rows
    pub fn iter(&self) -> std::slice::Iter<'_, TableRow> {
        self.rows.iter()
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
