//! Shared data pipeline used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! root resolution -> ingest -> filter -> view (records + options + fit)
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use crate::cli::DataArgs;
use crate::domain::{FilterCriteria, IngestConfig, ModelFit, NormalizedRecord};
use crate::error::AppError;
use crate::filter::{apply_filters, FilterOptions};
use crate::io::ingest::{load_records, IngestReport};

/// One loaded corpus, held in memory for the lifetime of a command.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub report: IngestReport,
    pub config: IngestConfig,
}

/// Directory tried before falling back to the interactive picker.
const DEFAULT_DATA_DIR: &str = "data";

/// Resolve the corpus root and ingest it (or generate the demo table).
///
/// Root resolution order: `-d` flag, then `TAD_DATA_ROOT` (after loading
/// `.env`), then `./data` if it exists, then the interactive picker. An empty
/// corpus is an error; a corpus with warnings is not.
pub fn load_data(args: &DataArgs) -> Result<LoadedData, AppError> {
    if args.demo {
        return demo_data(args);
    }

    let root = match &args.data {
        Some(path) => crate::cli::picker::validate_data_root(path)?,
        None => match std::env::var("TAD_DATA_ROOT") {
            Ok(path) if !path.trim().is_empty() => {
                crate::cli::picker::validate_data_root(path.trim().as_ref())?
            }
            _ if std::path::Path::new(DEFAULT_DATA_DIR).is_dir() => {
                std::path::PathBuf::from(DEFAULT_DATA_DIR)
            }
            _ => crate::cli::picker::prompt_for_data_root()?,
        },
    };

    let config = IngestConfig {
        root,
        data_groups: args.groups.clone(),
    };
    let report = load_records(&config)?;
    if report.records.is_empty() {
        return Err(AppError::no_data(format!(
            "No records loaded from '{}' ({} file(s) seen, {} failed).",
            config.root.display(),
            report.files_seen,
            report.warnings.len()
        )));
    }

    Ok(LoadedData { report, config })
}

fn demo_data(args: &DataArgs) -> Result<LoadedData, AppError> {
    let records = crate::data::generate_demo_records(args.demo_seed)?;

    let mut sources: Vec<&str> = records.iter().map(|r| r.source.as_str()).collect();
    sources.sort();
    sources.dedup();
    let files = sources.len();

    let mut config = IngestConfig::new("demo");
    config.data_groups = args.groups.clone();

    Ok(LoadedData {
        report: IngestReport {
            records,
            files_seen: files,
            files_parsed: files,
            warnings: Vec::new(),
        },
        config,
    })
}

/// One filtered view, ready for rendering.
#[derive(Debug, Clone)]
pub struct ViewOutput {
    pub records: Vec<NormalizedRecord>,
    pub options: FilterOptions,
    /// Present only when the view is fully qualified and non-empty.
    pub model_fit: Option<ModelFit>,
    pub dropped_drivers: Vec<String>,
}

/// Apply the criteria and derive everything a front-end needs.
///
/// The file-level scalars are only surfaced for fully qualified views; with
/// any dimension still on `All` the view mixes files and no single fit
/// describes it.
pub fn build_view(records: &[NormalizedRecord], criteria: &FilterCriteria) -> ViewOutput {
    let view_records = apply_filters(records, criteria);
    let options = FilterOptions::derive(records, criteria);

    let (model_fit, dropped_drivers) = if criteria.is_fully_qualified() {
        match view_records.first() {
            Some(first) => (
                Some(ModelFit {
                    adjusted_r2: first.adjusted_r2,
                    n: first.n,
                }),
                first.dropped_drivers.clone(),
            ),
            None => (None, Vec::new()),
        }
    } else {
        (None, Vec::new())
    };

    ViewOutput {
        records: view_records,
        options,
        model_fit,
        dropped_drivers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DataGroup, Selection};

    fn demo_args() -> DataArgs {
        DataArgs {
            data: None,
            groups: DataGroup::ALL.to_vec(),
            demo: true,
            demo_seed: 1,
        }
    }

    #[test]
    fn demo_load_produces_a_non_empty_corpus() {
        let loaded = load_data(&demo_args()).unwrap();
        assert!(!loaded.report.records.is_empty());
        assert!(loaded.report.files_seen > 0);
        assert!(loaded.report.warnings.is_empty());
    }

    #[test]
    fn fit_is_surfaced_only_for_fully_qualified_views() {
        let loaded = load_data(&demo_args()).unwrap();
        let records = &loaded.report.records;

        let mut criteria = FilterCriteria {
            project: Some("CadillacUS".to_string()),
            data_group: Some(DataGroup::Detail),
            ..FilterCriteria::default()
        };
        let view = build_view(records, &criteria);
        assert!(view.model_fit.is_none());
        assert!(!view.records.is_empty());

        criteria.country = Selection::one("US");
        criteria.psychography = Selection::one("AE");
        criteria.stage = Selection::one("Awareness");
        criteria.market = Selection::one("US");
        criteria.driver_set = Selection::one("Brand");
        let view = build_view(records, &criteria);
        assert!(!view.records.is_empty());
        let fit = view.model_fit.expect("fully qualified view has a fit");
        assert_eq!(fit.adjusted_r2, view.records[0].adjusted_r2);
        assert_eq!(fit.n, view.records[0].n);
    }
}
