use std::fmt;
use std::path::{Path, PathBuf};

/// Reference to an image inside a binary stack: a 1-based index plus a file path
///
/// Serialized as `000042@path/to/stack.mrcs`, or as the bare path when
/// the image is not part of a stack.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    /// 1-based index within the stack; `None` for single-image files
    pub index: Option<usize>,
    /// Path of the binary file
    pub path: PathBuf,
}

impl Location {
    /// Location of the `index`-th image (1-based) in a stack
    pub fn indexed(index: usize, path: impl Into<PathBuf>) -> Self {
        Self {
            index: Some(index),
            path: path.into(),
        }
    }

    /// Location of a single-image file
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            index: None,
            path: path.into(),
        }
    }

    /// Same index, different file
    pub fn with_path(&self, path: impl Into<PathBuf>) -> Self {
        Self {
            index: self.index,
            path: path.into(),
        }
    }

    /// Path of the binary file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Render as a STAR location string
    pub fn to_star(&self) -> String {
        location_to_star(self.index, &self.path)
    }

    /// Parse a STAR location string.
    ///
    /// A prefix before `@` that is not a number is treated as part of the path.
    pub fn from_star(text: &str) -> Self {
        let (index, path) = star_to_location(text);
        Self { index, path }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_star())
    }
}

/// Render an index and path as `"%06d@path"`, or the bare path without an index
pub fn location_to_star(index: Option<usize>, path: &Path) -> String {
    match index {
        Some(index) => format!("{:06}@{}", index, path.display()),
        None => path.display().to_string(),
    }
}

/// Split a STAR location string into its index and path
pub fn star_to_location(text: &str) -> (Option<usize>, PathBuf) {
    if let Some((index, path)) = text.split_once('@') {
        if let Ok(index) = index.parse::<usize>() {
            return (Some(index), PathBuf::from(path));
        }
    }
    (None, PathBuf::from(text))
}
