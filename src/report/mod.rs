//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the ingest/filter code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::app::pipeline::ViewOutput;
use crate::domain::{FilterCriteria, IngestConfig, Selection};
use crate::io::ingest::IngestReport;

/// Format the load summary (corpus stats + per-file warnings).
pub fn format_load_summary(report: &IngestReport, config: &IngestConfig) -> String {
    let mut out = String::new();

    out.push_str("=== tad - Driver Analysis Load ===\n");
    out.push_str(&format!("Root: {}\n", config.root.display()));
    out.push_str(&format!(
        "Groups: {}\n",
        config
            .data_groups
            .iter()
            .map(|g| g.folder_name())
            .collect::<Vec<_>>()
            .join(", ")
    ));
    out.push_str(&format!(
        "Files: seen={} parsed={} failed={}\n",
        report.files_seen,
        report.files_parsed,
        report.warnings.len()
    ));
    out.push_str(&format!("Records: {}\n", report.records.len()));

    let mut projects: Vec<&str> = report.records.iter().map(|r| r.project.as_str()).collect();
    projects.sort();
    projects.dedup();
    out.push_str(&format!("Projects: {}\n", projects.join(", ")));

    if !report.warnings.is_empty() {
        out.push_str("\nWarnings:\n");
        for w in &report.warnings {
            out.push_str(&format!("- {w}\n"));
        }
    }

    out
}

/// Format one filtered view as a driver table plus the model-fit footer.
pub fn format_view(view: &ViewOutput, criteria: &FilterCriteria) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "View: project={} group={} level={} country={} psychography={} stage={} market={} set={}\n",
        criteria.project.as_deref().unwrap_or("-"),
        criteria
            .data_group
            .map(|g| g.folder_name())
            .unwrap_or("-"),
        criteria.level(),
        criteria.country,
        criteria.psychography,
        stage_label(criteria),
        criteria.market,
        criteria.driver_set,
    ));

    if view.records.is_empty() {
        out.push_str("\nNo records match the current filters.\n");
        return out;
    }

    out.push('\n');
    out.push_str(
        format!(
            "{:<28} {:>8} {:<14} {:<8} {:<14}\n",
            "entity", "value", "stage", "psy", "source"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!("{:-<28} {:-<8} {:-<14} {:-<8} {:-<14}\n", "", "", "", "", "").trim_end(),
    );
    out.push('\n');

    for r in &view.records {
        out.push_str(
            format!(
                "{:<28} {:>8.3} {:<14} {:<8} {:<14}\n",
                truncate(&r.entity, 28),
                r.value,
                truncate(&r.stage, 14),
                truncate(&r.psychography, 8),
                truncate(&r.source, 14),
            )
            .trim_end(),
        );
        out.push('\n');
    }

    if let Some(fit) = &view.model_fit {
        out.push_str(&format!("\nAdjusted R²: {:.2} | N: {}\n", fit.adjusted_r2, fit.n));
        if view.dropped_drivers.is_empty() {
            out.push_str("Dropped drivers: none\n");
        } else {
            out.push_str(&format!(
                "Dropped drivers: {}\n",
                view.dropped_drivers.join(", ")
            ));
        }
    }

    out
}

fn stage_label(criteria: &FilterCriteria) -> String {
    if criteria.general_factor {
        "-".to_string()
    } else {
        match &criteria.stage {
            Selection::All => "All".to_string(),
            Selection::One(v) => v.clone(),
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DataGroup, Level, ModelFit, NormalizedRecord};
    use crate::filter::FilterOptions;

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
            source: "f.xlsx".to_string(),
            cluster_info: None,
        }
    }

    #[test]
    fn load_summary_lists_warnings() {
        use crate::io::ingest::IngestWarning;

        let report = IngestReport {
            records: vec![record("Quality")],
            files_seen: 2,
            files_parsed: 1,
            warnings: vec![IngestWarning {
                path: "bad.xlsx".into(),
                message: "marker 'N' not found in column 0".to_string(),
            }],
        };
        let out = format_load_summary(&report, &IngestConfig::new("/corpus"));
        assert!(out.contains("seen=2 parsed=1 failed=1"));
        assert!(out.contains("Projects: CadillacUS"));
        assert!(out.contains("Error in file bad.xlsx"));
    }

    #[test]
    fn view_shows_fit_only_when_present() {
        let criteria = FilterCriteria {
            project: Some("CadillacUS".to_string()),
            data_group: Some(DataGroup::Detail),
            ..FilterCriteria::default()
        };
        let mut view = ViewOutput {
            records: vec![record("Quality")],
            options: FilterOptions::default(),
            model_fit: None,
            dropped_drivers: Vec::new(),
        };

        let out = format_view(&view, &criteria);
        assert!(out.contains("Quality"));
        assert!(!out.contains("Adjusted R²"));

        view.model_fit = Some(ModelFit { adjusted_r2: 0.73, n: 250 });
        view.dropped_drivers = vec!["Price".to_string()];
        let out = format_view(&view, &criteria);
        assert!(out.contains("Adjusted R²: 0.73 | N: 250"));
        assert!(out.contains("Dropped drivers: Price"));
    }

    #[test]
    fn empty_view_says_so() {
        let view = ViewOutput {
            records: Vec::new(),
            options: FilterOptions::default(),
            model_fit: None,
            dropped_drivers: Vec::new(),
        };
        let out = format_view(&view, &FilterCriteria::default());
        assert!(out.contains("No records match"));
    }
}
