//! Raw row model shared by the tabular readers.
//!
//! Readers know nothing about demographics: they yield [`RawRow`]s mapping a
//! header string to a primitive [`Cell`]. Semantic interpretation happens in
//! [`crate::normalize`] and [`crate::eurostat`].

use std::{collections::HashMap, fmt, path::Path};

use crate::error::IngestError;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
    Boolean(bool),
}

impl Cell {
    /// Classifies a raw text field the way a dynamically typed reader would:
    /// anything that parses as a float is numeric, everything else is text.
    pub fn from_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Cell::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Cell::Number(value),
            _ => Cell::Text(trimmed.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    (*n as i64).to_string()
                } else {
                    n.to_string()
                }
            }
            Cell::Text(s) => s.clone(),
            Cell::Boolean(b) => b.to_string(),
        }
    }

    /// Integer view used for year columns; fractional or non-numeric values yield `None`.
    pub fn as_year(&self) -> Option<i32> {
        match self {
            Cell::Number(n) if n.fract() == 0.0 => i32::try_from(*n as i64).ok(),
            Cell::Text(s) => s.trim().parse::<i32>().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    cells: HashMap<String, Cell>,
}

impl RawRow {
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Cell)>,
        K: Into<String>,
    {
        Self {
            cells: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn get(&self, header: &str) -> Option<&Cell> {
        self.cells.get(header)
    }

    pub fn is_blank(&self) -> bool {
        self.cells.values().all(Cell::is_empty)
    }
}

/// A container format able to yield raw rows and, cheaply, just its header row.
pub trait TabularReader {
    fn read_headers(&self, path: &Path) -> Result<Vec<String>, IngestError>;
    fn read_rows(&self, path: &Path) -> Result<Vec<RawRow>, IngestError>;

    /// Header row plus data rows in one pass over the file.
    fn read_table(&self, path: &Path) -> Result<(Vec<String>, Vec<RawRow>), IngestError> {
        Ok((self.read_headers(path)?, self.read_rows(path)?))
    }
}
