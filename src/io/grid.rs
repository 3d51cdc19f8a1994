//! Header-less worksheet grids.
//!
//! Driver-analysis workbooks are not typed tables: field positions are
//! convention-based (fixed header cells, marker rows, a stop sentinel), so the
//! parser works against a plain cell grid instead of column headers. This
//! module loads the first worksheet of an XLSX file into that grid and offers
//! the few cell coercions the contract needs.
//!
//! Only columns 0 and 1 participate in the cell contract (headers, markers and
//! dropped drivers live in column 0; chart values in column 1), so wider
//! sheets are truncated to two columns at load time.

use std::path::Path;

use calamine::{open_workbook, Data, Reader, Xlsx};

/// Number of leading columns retained from each worksheet.
const GRID_COLS: u32 = 2;

/// One worksheet cell, reduced to the shapes the contract distinguishes.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
}

impl CellValue {
    fn from_data(data: Option<&Data>) -> Self {
        match data {
            None | Some(Data::Empty) | Some(Data::Error(_)) => CellValue::Empty,
            Some(Data::String(s)) => CellValue::Text(s.clone()),
            Some(Data::Float(v)) => CellValue::Number(*v),
            Some(Data::Int(v)) => CellValue::Number(*v as f64),
            Some(Data::Bool(b)) => CellValue::Text(b.to_string()),
            Some(Data::DateTime(dt)) => CellValue::Number(dt.as_f64()),
            Some(Data::DateTimeIso(s)) | Some(Data::DurationIso(s)) => CellValue::Text(s.clone()),
        }
    }
}

/// A dense, zero-indexed view of the first worksheet.
///
/// Row/column coordinates are absolute sheet coordinates, regardless of where
/// the first non-empty cell happens to sit.
#[derive(Debug, Clone, Default)]
pub struct Grid {
    rows: Vec<Vec<CellValue>>,
}

impl Grid {
    /// Build a grid directly from rows (used by parser tests and demo data).
    pub fn from_rows(rows: Vec<Vec<CellValue>>) -> Self {
        Self { rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&CellValue::Empty)
    }

    /// Textual view of a cell: non-empty strings as-is, numbers rendered the
    /// way a spreadsheet shows them (no trailing `.0` for whole numbers).
    pub fn text(&self, row: usize, col: usize) -> Option<String> {
        match self.cell(row, col) {
            CellValue::Empty => None,
            CellValue::Text(s) if s.is_empty() => None,
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Number(v) => Some(render_number(*v)),
        }
    }

    /// Numeric view of a cell; numeric-looking text parses too.
    pub fn number(&self, row: usize, col: usize) -> Option<f64> {
        match self.cell(row, col) {
            CellValue::Number(v) => Some(*v),
            CellValue::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            CellValue::Empty => None,
        }
    }

    /// Integer view of a cell. Numeric cells truncate toward zero; text cells
    /// must be integer literals.
    pub fn integer(&self, row: usize, col: usize) -> Option<i64> {
        match self.cell(row, col) {
            CellValue::Number(v) => Some(v.trunc() as i64),
            CellValue::Text(s) => s.trim().parse::<i64>().ok(),
            CellValue::Empty => None,
        }
    }

    /// First row whose column-`col` cell is exactly `needle`.
    ///
    /// Marker matching is literal text equality, as the workbooks define it.
    pub fn find_in_column(&self, col: usize, needle: &str) -> Option<usize> {
        (0..self.rows.len()).find(|&row| match self.cell(row, col) {
            CellValue::Text(s) => s == needle,
            _ => false,
        })
    }
}

fn render_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

/// Load the first worksheet of `path` as a two-column grid.
///
/// Errors are plain causes; the caller wraps them with file identity for the
/// per-file warning.
pub fn load_grid(path: &Path) -> Result<Grid, String> {
    let mut workbook: Xlsx<_> =
        open_workbook(path).map_err(|e| format!("failed to open workbook: {e}"))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| "workbook has no worksheets".to_string())?
        .map_err(|e| format!("failed to read first worksheet: {e}"))?;

    let Some(end) = range.end() else {
        return Ok(Grid::default());
    };

    let mut rows = Vec::with_capacity(end.0 as usize + 1);
    for r in 0..=end.0 {
        let mut cells = Vec::with_capacity(GRID_COLS as usize);
        for c in 0..GRID_COLS.min(end.1 + 1) {
            cells.push(CellValue::from_data(range.get_value((r, c))));
        }
        rows.push(cells);
    }

    Ok(Grid { rows })
}
