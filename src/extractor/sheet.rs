//! Read access to the first worksheet of a workbook.
//!
//! Extraction only ever needs "value at (row, col)", so it is written against
//! [`CellGrid`] and can run on an in-memory grid in tests. Coordinates are
//! 1-indexed, the way the sheet layout is described (`G1`, row 8, column 2).

use crate::error::{IngestError, Result};
use calamine::{open_workbook_auto, Data, Range, Reader};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl CellValue {
    /// Empty text, zero and `false` count as blank.
    pub fn is_truthy(&self) -> bool {
        match self {
            CellValue::Text(s) => !s.is_empty(),
            CellValue::Int(i) => *i != 0,
            CellValue::Float(f) => *f != 0.0,
            CellValue::Bool(b) => *b,
        }
    }

    pub fn as_text(&self) -> String {
        self.to_string()
    }

    /// Numeric view of the cell. Text is parsed after trimming; non-finite
    /// results are treated as non-numeric.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            CellValue::Int(i) => *i as f64,
            CellValue::Float(f) => *f,
            CellValue::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            CellValue::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }

    /// Integer view going through a float, truncating toward zero.
    ///
    /// Anything that is not a number reads as 0.
    pub fn as_int(&self) -> i64 {
        match self {
            CellValue::Int(i) => *i,
            CellValue::Bool(_) => 0,
            _ => self.as_f64().map(|f| f.trunc() as i64).unwrap_or(0),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => f.write_str(s),
            CellValue::Int(i) => write!(f, "{}", i),
            // Workbooks store every number as a float; integral ones print as integers.
            CellValue::Float(v) if v.fract() == 0.0 && v.abs() < 1e15 => {
                write!(f, "{}", *v as i64)
            }
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::Bool(b) => f.write_str(if *b { "True" } else { "False" }),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        CellValue::Int(value as i64)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

pub trait CellGrid {
    /// Value at a 1-indexed position, `None` when the cell is empty.
    fn cell_at(&self, row: u32, col: u32) -> Option<CellValue>;

    /// Text of a cell as stored; blank and falsy cells read as "".
    fn raw_text_at(&self, row: u32, col: u32) -> String {
        self.cell_at(row, col)
            .filter(CellValue::is_truthy)
            .map(|v| v.as_text())
            .unwrap_or_default()
    }

    /// Trimmed text of a cell.
    fn text_at(&self, row: u32, col: u32) -> String {
        self.raw_text_at(row, col).trim().to_string()
    }
}

/// Spreadsheet-style reference of a 1-indexed position, e.g. `(1, 7)` -> `G1`.
pub fn cell_reference(row: u32, col: u32) -> String {
    let mut letters = Vec::new();
    let mut n = col;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.reverse();
    format!("{}{}", letters.into_iter().collect::<String>(), row)
}

#[derive(Debug, Clone, Default)]
pub struct MemorySheet {
    cells: HashMap<(u32, u32), CellValue>,
}

impl MemorySheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cell<V: Into<CellValue>>(mut self, row: u32, col: u32, value: V) -> Self {
        self.set(row, col, value);
        self
    }

    pub fn set<V: Into<CellValue>>(&mut self, row: u32, col: u32, value: V) {
        self.cells.insert((row, col), value.into());
    }
}

impl CellGrid for MemorySheet {
    fn cell_at(&self, row: u32, col: u32) -> Option<CellValue> {
        self.cells.get(&(row, col)).cloned()
    }
}

/// First worksheet of a workbook on disk.
///
/// The workbook handle is released when [`WorkbookSheet::open`] returns; only
/// the decoded cell range is kept.
pub struct WorkbookSheet {
    range: Range<Data>,
}

impl WorkbookSheet {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let workbook_error = |message: String| IngestError::Workbook {
            path: path.display().to_string(),
            message,
        };

        let mut workbook = open_workbook_auto(path).map_err(|e| workbook_error(e.to_string()))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| workbook_error("workbook has no worksheets".to_string()))?
            .map_err(|e| workbook_error(e.to_string()))?;

        Ok(Self { range })
    }
}

impl CellGrid for WorkbookSheet {
    fn cell_at(&self, row: u32, col: u32) -> Option<CellValue> {
        if row == 0 || col == 0 {
            return None;
        }
        match self.range.get_value((row - 1, col - 1))? {
            Data::Empty => None,
            Data::String(s) => Some(CellValue::Text(s.clone())),
            Data::Int(i) => Some(CellValue::Int(*i)),
            Data::Float(f) => Some(CellValue::Float(*f)),
            Data::Bool(b) => Some(CellValue::Bool(*b)),
            Data::DateTime(dt) => Some(CellValue::Float(dt.as_f64())),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Some(CellValue::Text(s.clone())),
            Data::Error(e) => Some(CellValue::Text(e.to_string())),
        }
    }
}
