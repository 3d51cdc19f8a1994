//! Corpus ingest and normalization.
//!
//! This module turns a directory tree of driver-analysis workbooks into one
//! flat table of `NormalizedRecord`s.
//!
//! Design goals:
//! - **Convention in one place**: the fixed cell positions and marker texts
//!   live in a small declarative schema, not scattered scans
//! - **Per-file isolation**: one malformed workbook yields exactly one warning
//!   and zero records; every other file still loads
//! - **No hidden state**: each pass re-reads the filesystem from scratch;
//!   callers memoize the report if they need to avoid repeated disk I/O
//!
//! Ordering: records keep their in-file row order; files follow directory walk
//! order, which is platform-dependent and explicitly not a guarantee.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::{DataGroup, IngestConfig, Level, NormalizedRecord};
use crate::error::AppError;
use crate::io::grid::{load_grid, Grid};

/// Fixed header cell rows (column 0).
const STAGE_ROW: usize = 4;
const MARKET_ROW: usize = 5;
const DRIVER_SET_ROW: usize = 6;
const CLUSTER_INFO_ROW: usize = 7;

/// First chart data row.
const CHART_START_ROW: usize = 8;

/// Entity sentinel terminating the chart rows (that row is excluded too).
const STOP_SENTINEL: &str = "Stop";

/// Where a file-level scalar lives relative to its marker cell.
///
/// The workbooks encode scalars as "a literal marker text, value in the cell
/// `offset` rows below, same column". Keeping the convention declarative keeps
/// the brittle part of the format in one spot.
#[derive(Debug, Clone, Copy)]
struct ScalarMarker {
    marker: &'static str,
    offset: usize,
    col: usize,
}

const R_SQUARED: ScalarMarker = ScalarMarker {
    marker: "R SQUARED MODEL",
    offset: 1,
    col: 0,
};

const SAMPLE_SIZE: ScalarMarker = ScalarMarker {
    marker: "N",
    offset: 1,
    col: 0,
};

/// Section marker: every non-empty column-0 cell after it is a dropped driver.
const DROPPED_DRIVERS_MARKER: &str = "/// DROPPED SIGNIFICANT DRIVERS ///";

impl ScalarMarker {
    fn locate(&self, grid: &Grid) -> Result<usize, ParseError> {
        grid.find_in_column(self.col, self.marker)
            .ok_or(ParseError::MissingMarker { marker: self.marker })
    }

    fn float_value(&self, grid: &Grid) -> Result<f64, ParseError> {
        let row = self.locate(grid)? + self.offset;
        grid.number(row, self.col).ok_or_else(|| ParseError::BadScalar {
            marker: self.marker,
            reason: "expected a number in the cell below".to_string(),
        })
    }

    fn int_value(&self, grid: &Grid) -> Result<i64, ParseError> {
        let row = self.locate(grid)? + self.offset;
        grid.integer(row, self.col).ok_or_else(|| ParseError::BadScalar {
            marker: self.marker,
            reason: "expected an integer in the cell below".to_string(),
        })
    }
}

/// A failure confined to one workbook.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// The workbook could not be opened or its first sheet read.
    Workbook(String),
    /// A fixed-position header cell is empty or out of range.
    MissingHeader { row: usize, field: &'static str },
    /// A required marker text does not appear in column 0.
    MissingMarker { marker: &'static str },
    /// The cell below a marker is absent or of the wrong type.
    BadScalar { marker: &'static str, reason: String },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Workbook(msg) => f.write_str(msg),
            ParseError::MissingHeader { row, field } => {
                write!(f, "missing header cell '{field}' at row {row}, column 0")
            }
            ParseError::MissingMarker { marker } => {
                write!(f, "marker '{marker}' not found in column 0")
            }
            ParseError::BadScalar { marker, reason } => {
                write!(f, "value below marker '{marker}': {reason}")
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// One workbook discovered by the walker, with the identity its path encodes.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub project: String,
    pub level: Level,
    /// Country code: last `_`-delimited token of the country folder name.
    pub country: String,
    pub psychography: String,
    pub data_group: DataGroup,
}

impl SourceFile {
    /// The file name recorded on every record of this file.
    pub fn source_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// A non-fatal per-file failure, surfaced to the analyst.
#[derive(Debug, Clone)]
pub struct IngestWarning {
    pub path: PathBuf,
    pub message: String,
}

impl fmt::Display for IngestWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error in file {}: {}", self.path.display(), self.message)
    }
}

/// Output of one ingestion pass: the aggregated table plus diagnostics.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub records: Vec<NormalizedRecord>,
    pub files_seen: usize,
    pub files_parsed: usize,
    pub warnings: Vec<IngestWarning>,
}

/// Walk the corpus and aggregate every parsable workbook into one table.
///
/// An unreadable root is the only fatal condition; everything below degrades
/// to "this branch/file contributes nothing".
pub fn load_records(config: &IngestConfig) -> Result<IngestReport, AppError> {
    let sources = walk_sources(config)?;

    let mut report = IngestReport {
        files_seen: sources.len(),
        ..IngestReport::default()
    };

    for src in sources {
        match parse_file(&src) {
            Ok(mut records) => {
                report.files_parsed += 1;
                report.records.append(&mut records);
            }
            Err(err) => report.warnings.push(IngestWarning {
                path: src.path.clone(),
                message: err.to_string(),
            }),
        }
    }

    Ok(report)
}

/// Enumerate workbook candidates matching the four-level corpus layout:
///
/// `<root>/<Project>/<GFactor|Results>/<...>_<Country>/<Psychography>/<Group>/*.xlsx`
///
/// Non-directory entries at intermediate levels, level folders outside the
/// known pair, and unreadable subtrees are skipped silently; the corpus is
/// sparse by nature.
pub fn walk_sources(config: &IngestConfig) -> Result<Vec<SourceFile>, AppError> {
    if !config.root.is_dir() {
        return Err(AppError::input(format!(
            "Corpus root is not a readable directory: {}",
            config.root.display()
        )));
    }
    fs::read_dir(&config.root).map_err(|e| {
        AppError::input(format!(
            "Failed to read corpus root '{}': {e}",
            config.root.display()
        ))
    })?;

    let mut out = Vec::new();
    for project_dir in subdirs(&config.root) {
        let Some(project) = dir_name(&project_dir) else { continue };

        for level_dir in subdirs(&project_dir) {
            let Some(level) = dir_name(&level_dir).as_deref().and_then(Level::from_folder_name)
            else {
                continue;
            };

            for country_dir in subdirs(&level_dir) {
                let Some(country_folder) = dir_name(&country_dir) else { continue };
                let country = country_code(&country_folder).to_string();

                for psy_dir in subdirs(&country_dir) {
                    let Some(psychography) = dir_name(&psy_dir) else { continue };

                    for &data_group in &config.data_groups {
                        let group_dir = psy_dir.join(data_group.folder_name());
                        if !group_dir.is_dir() {
                            continue;
                        }
                        for path in workbook_files(&group_dir) {
                            out.push(SourceFile {
                                path,
                                project: project.clone(),
                                level,
                                country: country.clone(),
                                psychography: psychography.clone(),
                                data_group,
                            });
                        }
                    }
                }
            }
        }
    }

    Ok(out)
}

/// Country code extraction: `"EU_DE"` → `"DE"`, `"DE"` → `"DE"`.
pub fn country_code(folder_name: &str) -> &str {
    folder_name.rsplit('_').next().unwrap_or(folder_name)
}

fn subdirs(path: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(path) else {
        return Vec::new();
    };
    entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect()
}

fn dir_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

fn workbook_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| ext.eq_ignore_ascii_case("xlsx"))
                    == Some(true)
        })
        .collect()
}

/// Parse one workbook into records, all-or-nothing.
pub fn parse_file(src: &SourceFile) -> Result<Vec<NormalizedRecord>, ParseError> {
    let grid = load_grid(&src.path).map_err(ParseError::Workbook)?;
    parse_grid(&grid, src)
}

/// Parse an already-loaded grid into records.
///
/// Split from `parse_file` so the cell contract is testable without touching
/// the filesystem.
pub fn parse_grid(grid: &Grid, src: &SourceFile) -> Result<Vec<NormalizedRecord>, ParseError> {
    let stage = header_text(grid, STAGE_ROW, "stage")?;
    let market = header_text(grid, MARKET_ROW, "market")?;
    let driver_set = header_text(grid, DRIVER_SET_ROW, "driver set")?;
    let cluster_info = match src.data_group {
        DataGroup::Cluster => Some(header_text(grid, CLUSTER_INFO_ROW, "cluster info")?),
        DataGroup::Detail => None,
    };

    let adjusted_r2 = round2(R_SQUARED.float_value(grid)?);
    let n = SAMPLE_SIZE.int_value(grid)?;
    let dropped_drivers = dropped_drivers(grid)?;
    let source = src.source_name();

    let records = chart_rows(grid)
        .into_iter()
        .map(|(entity, value)| NormalizedRecord {
            project: src.project.clone(),
            level: src.level,
            country: src.country.clone(),
            psychography: src.psychography.clone(),
            data_group: src.data_group,
            stage: stage.clone(),
            market: market.clone(),
            driver_set: driver_set.clone(),
            entity,
            value,
            adjusted_r2,
            n,
            dropped_drivers: dropped_drivers.clone(),
            source: source.clone(),
            cluster_info: cluster_info.clone(),
        })
        .collect();

    Ok(records)
}

fn header_text(grid: &Grid, row: usize, field: &'static str) -> Result<String, ParseError> {
    grid.text(row, 0)
        .ok_or(ParseError::MissingHeader { row, field })
}

fn dropped_drivers(grid: &Grid) -> Result<Vec<String>, ParseError> {
    let marker_row = grid
        .find_in_column(0, DROPPED_DRIVERS_MARKER)
        .ok_or(ParseError::MissingMarker { marker: DROPPED_DRIVERS_MARKER })?;

    let mut drivers = Vec::new();
    for row in (marker_row + 1)..grid.row_count() {
        if let Some(name) = grid.text(row, 0) {
            drivers.push(name);
        }
    }
    Ok(drivers)
}

/// Extract `(entity, value)` chart rows from row 8 down.
///
/// Rows are visited in order; the first `"Stop"` entity ends the scan and is
/// itself excluded, even when its value cell is blank. Rows with an empty
/// entity or a non-numeric value are skipped.
fn chart_rows(grid: &Grid) -> Vec<(String, f64)> {
    let mut rows = Vec::new();
    for row in CHART_START_ROW..grid.row_count() {
        let entity = grid.text(row, 0);
        if entity.as_deref() == Some(STOP_SENTINEL) {
            break;
        }
        let (Some(entity), Some(value)) = (entity, grid.number(row, 1)) else {
            continue;
        };
        rows.push((entity, value));
    }
    rows
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
