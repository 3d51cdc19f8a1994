//! Export a filtered view to CSV, or the full view state to a JSON snapshot.
//!
//! The CSV is meant to be easy to consume in spreadsheets or downstream
//! scripts; the JSON snapshot additionally captures the filter criteria and
//! model-fit panel so a view can be reproduced or diffed later.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::Utc;
use serde::Serialize;

use crate::domain::{FilterCriteria, ModelFit, NormalizedRecord};
use crate::error::AppError;

/// Write the records of one view to a CSV file.
pub fn write_view_csv(path: &Path, records: &[NormalizedRecord]) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create export CSV '{}': {e}", path.display())))?;

    writeln!(
        file,
        "project,level,country,psychography,data_group,cluster_info,stage,market,driver_set,entity,value,adjusted_r2,n,dropped_drivers,source"
    )
    .map_err(|e| AppError::input(format!("Failed to write export CSV header: {e}")))?;

    for r in records {
        writeln!(
            file,
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            csv_field(&r.project),
            r.level,
            csv_field(&r.country),
            csv_field(&r.psychography),
            r.data_group,
            csv_field(r.cluster_info.as_deref().unwrap_or("")),
            csv_field(&r.stage),
            csv_field(&r.market),
            csv_field(&r.driver_set),
            csv_field(&r.entity),
            r.value,
            r.adjusted_r2,
            r.n,
            csv_field(&r.dropped_drivers.join("; ")),
            csv_field(&r.source),
        )
        .map_err(|e| AppError::input(format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}

/// Quote a field only when it would break the row.
fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Everything needed to reproduce one view, serialized as pretty JSON.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot<'a> {
    pub created_at: String,
    pub criteria: &'a FilterCriteria,
    /// Present only for fully qualified views.
    pub model_fit: Option<&'a ModelFit>,
    pub dropped_drivers: &'a [String],
    pub records: &'a [NormalizedRecord],
}

impl<'a> Snapshot<'a> {
    pub fn new(
        criteria: &'a FilterCriteria,
        model_fit: Option<&'a ModelFit>,
        dropped_drivers: &'a [String],
        records: &'a [NormalizedRecord],
    ) -> Self {
        Self {
            created_at: Utc::now().to_rfc3339(),
            criteria,
            model_fit,
            dropped_drivers,
            records,
        }
    }
}

/// Write a view snapshot as pretty-printed JSON.
pub fn write_snapshot_json(path: &Path, snapshot: &Snapshot<'_>) -> Result<(), AppError> {
    let json = serde_json::to_string_pretty(snapshot)
        .map_err(|e| AppError::input(format!("Failed to serialize snapshot: {e}")))?;
    std::fs::write(path, json)
        .map_err(|e| AppError::input(format!("Failed to write snapshot '{}': {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DataGroup, Level};

    fn record(entity: &str) -> NormalizedRecord {
        NormalizedRecord {
            project: "CadillacUS".to_string(),
            level: Level::Results,
            country: "US".to_string(),
            psychography: "AE".to_string(),
            data_group: DataGroup::Detail,
            stage: "Awareness".to_string(),
            market: "US".to_string(),
            driver_set: "Brand".to_string(),
            entity: entity.to_string(),
            value: 0.8,
            adjusted_r2: 0.73,
            n: 250,
            dropped_drivers: vec!["Price".to_string()],
            source: "driver_model.xlsx".to_string(),
            cluster_info: None,
        }
    }

    #[test]
    fn csv_has_header_and_one_row_per_record() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("view.csv");
        write_view_csv(&path, &[record("Quality"), record("Trust")]).unwrap();

        let body = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("project,level,country"));
        assert!(lines[1].contains("Quality"));
        assert!(lines[1].contains("0.73"));
        assert!(lines[2].contains("Trust"));
    }

    #[test]
    fn fields_with_commas_are_quoted() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("view.csv");
        write_view_csv(&path, &[record("Quality, perceived")]).unwrap();

        let body = std::fs::read_to_string(&path).unwrap();
        assert!(body.contains("\"Quality, perceived\""));
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("snapshot.json");

        let criteria = FilterCriteria::default();
        let fit = ModelFit { adjusted_r2: 0.73, n: 250 };
        let dropped = vec!["Price".to_string()];
        let records = vec![record("Quality")];
        let snapshot = Snapshot::new(&criteria, Some(&fit), &dropped, &records);
        write_snapshot_json(&path, &snapshot).unwrap();

        let body = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed["model_fit"]["n"], 250);
        assert_eq!(parsed["records"][0]["entity"], "Quality");
        assert_eq!(parsed["dropped_drivers"][0], "Price");
    }
}
