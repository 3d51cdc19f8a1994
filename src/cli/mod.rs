//! Command-line parsing for the driver-analysis dashboard.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the ingest/filter code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::{DataGroup, FilterCriteria, Selection};

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "tad", version, about = "Touchpoint/driver analysis dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Ingest the workbook corpus and print a load summary.
    Load(DataArgs),
    /// Print one filtered view as a table (useful for scripting).
    Show(ViewArgs),
    /// Write one filtered view to CSV and/or a JSON snapshot.
    Export(ExportArgs),
    /// Launch the interactive TUI.
    ///
    /// Uses the same ingest/filter pipeline as `tad show`, but renders the
    /// view as a bar chart with interactive filters.
    Tui(DataArgs),
}

/// Options for locating and loading the corpus.
#[derive(Debug, Parser, Clone)]
pub struct DataArgs {
    /// Corpus root directory. Falls back to TAD_DATA_ROOT (also read from
    /// .env), then an interactive picker.
    #[arg(short = 'd', long)]
    pub data: Option<PathBuf>,

    /// Data groups to ingest.
    #[arg(long, value_enum, value_delimiter = ',', default_values_t = DataGroup::ALL)]
    pub groups: Vec<DataGroup>,

    /// Use the built-in synthetic corpus instead of reading workbooks.
    #[arg(long)]
    pub demo: bool,

    /// Random seed for the synthetic corpus.
    #[arg(long, default_value_t = 42)]
    pub demo_seed: u64,
}

/// Filter flags shared by `show` and `export`.
#[derive(Debug, Parser, Clone)]
pub struct FilterArgs {
    /// Project to view. Defaults to the first project in the corpus.
    #[arg(short = 'p', long)]
    pub project: Option<String>,

    /// Data group to view.
    #[arg(short = 'g', long, value_enum, default_value_t = DataGroup::Detail)]
    pub group: DataGroup,

    /// View the general-factor level instead of the per-stage results.
    #[arg(long)]
    pub gfactor: bool,

    /// Pin a cluster (Cluster group only).
    #[arg(long)]
    pub cluster: Option<String>,

    /// Pin a country code.
    #[arg(long)]
    pub country: Option<String>,

    /// Pin a psychography segment. The "all" aggregate segment only appears
    /// when pinned explicitly.
    #[arg(long)]
    pub psychography: Option<String>,

    /// Pin a journey stage (ignored with --gfactor).
    #[arg(long)]
    pub stage: Option<String>,

    /// Pin a market.
    #[arg(long)]
    pub market: Option<String>,

    /// Pin a driver set.
    #[arg(long = "driver-set")]
    pub driver_set: Option<String>,
}

impl FilterArgs {
    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            project: self.project.clone(),
            data_group: Some(self.group),
            general_factor: self.gfactor,
            cluster_info: selection(&self.cluster),
            country: selection(&self.country),
            psychography: selection(&self.psychography),
            stage: selection(&self.stage),
            market: selection(&self.market),
            driver_set: selection(&self.driver_set),
        }
    }
}

fn selection(value: &Option<String>) -> Selection {
    match value {
        None => Selection::All,
        Some(v) => Selection::one(v.clone()),
    }
}

/// Options for `tad show`.
#[derive(Debug, Parser)]
pub struct ViewArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub filter: FilterArgs,
}

/// Options for `tad export`.
#[derive(Debug, Parser)]
pub struct ExportArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub filter: FilterArgs,

    /// Write the view records to this CSV file.
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Write a full view snapshot (criteria + fit + records) to this JSON file.
    #[arg(long)]
    pub snapshot: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn filter_flags_map_to_criteria() {
        let args = FilterArgs {
            project: Some("CadillacUS".to_string()),
            group: DataGroup::Cluster,
            gfactor: true,
            cluster: Some("Cluster 1".to_string()),
            country: None,
            psychography: Some("all".to_string()),
            stage: None,
            market: None,
            driver_set: None,
        };
        let criteria = args.criteria();
        assert_eq!(criteria.project.as_deref(), Some("CadillacUS"));
        assert_eq!(criteria.data_group, Some(DataGroup::Cluster));
        assert!(criteria.general_factor);
        assert_eq!(criteria.cluster_info.pinned(), Some("Cluster 1"));
        assert_eq!(criteria.psychography.pinned(), Some("all"));
        assert!(criteria.country.is_all());
    }
}
