//! Filesystem I/O: corpus walking, workbook parsing, view export.

pub mod export;
pub mod grid;
pub mod ingest;
