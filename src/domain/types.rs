//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - produced by the ingest pipeline and held in memory as one flat table
//! - filtered by the pure filter layer
//! - exported to CSV/JSON snapshots

use std::fmt;
use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Analysis level, encoded as the second folder level of the corpus.
///
/// `GFactor` holds aggregate-level ("general factor") model outputs; `Results`
/// holds the per-journey-stage outputs. Folder names at this level that match
/// neither variant are silently skipped by the walker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    GFactor,
    Results,
}

impl Level {
    /// The exact folder name this level uses on disk.
    pub fn folder_name(self) -> &'static str {
        match self {
            Level::GFactor => "GFactor",
            Level::Results => "Results",
        }
    }

    pub fn from_folder_name(name: &str) -> Option<Self> {
        match name {
            "GFactor" => Some(Level::GFactor),
            "Results" => Some(Level::Results),
            _ => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.folder_name())
    }
}

/// Data group, encoded as the innermost folder level of the corpus.
///
/// `Cluster` files carry one extra header cell (`ClusterInfo`, grid row 7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[value(rename_all = "PascalCase")]
pub enum DataGroup {
    Detail,
    Cluster,
}

impl DataGroup {
    pub const ALL: [DataGroup; 2] = [DataGroup::Detail, DataGroup::Cluster];

    /// The exact folder name this group uses on disk.
    pub fn folder_name(self) -> &'static str {
        match self {
            DataGroup::Detail => "Detail",
            DataGroup::Cluster => "Cluster",
        }
    }
}

impl fmt::Display for DataGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.folder_name())
    }
}

/// Customer-journey stages, in journey order.
///
/// Stage filter options and the chevron indicator always follow this order,
/// never an alphabetical sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JourneyStage {
    Awareness,
    Consideration,
    Purchase,
    Satisfaction,
    Loyalty,
}

impl JourneyStage {
    pub const ALL: [JourneyStage; 5] = [
        JourneyStage::Awareness,
        JourneyStage::Consideration,
        JourneyStage::Purchase,
        JourneyStage::Satisfaction,
        JourneyStage::Loyalty,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            JourneyStage::Awareness => "Awareness",
            JourneyStage::Consideration => "Consideration",
            JourneyStage::Purchase => "Purchase",
            JourneyStage::Satisfaction => "Satisfaction",
            JourneyStage::Loyalty => "Loyalty",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.display_name() == name)
    }
}

impl fmt::Display for JourneyStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Brand color for a psychography segment, as `(r, g, b)`.
///
/// The `"all"` aggregate segment has its own color; unknown segments fall back
/// to neutral gray.
pub fn psychography_color(psychography: &str) -> (u8, u8, u8) {
    match psychography {
        "AE" => (104, 125, 1),
        "AH" => (167, 202, 2),
        "AR" => (217, 255, 28),
        "LE" => (35, 67, 84),
        "LH" => (85, 134, 161),
        "LR" => (147, 206, 237),
        "ME" => (178, 34, 34),
        "MH" => (239, 44, 53),
        "MR" => (255, 71, 81),
        "all" => (81, 71, 31),
        _ => (136, 136, 136),
    }
}

/// One normalized row of the global table: a single `(entity, value)` driver
/// observation plus everything known about the file it came from.
///
/// Invariants (enforced by the parser, relied upon by consumers):
/// - `adjusted_r2`, `n`, and `dropped_drivers` are file-level scalars, equal
///   across all records sharing a `source`
/// - `cluster_info` is `Some` exactly when `data_group == DataGroup::Cluster`
/// - `entity` is never the sentinel `"Stop"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub project: String,
    pub level: Level,
    pub country: String,
    pub psychography: String,
    pub data_group: DataGroup,
    pub stage: String,
    pub market: String,
    pub driver_set: String,
    pub entity: String,
    pub value: f64,
    pub adjusted_r2: f64,
    pub n: i64,
    pub dropped_drivers: Vec<String>,
    /// File name (not the full path) of the originating spreadsheet.
    pub source: String,
    pub cluster_info: Option<String>,
}

/// File-level model-fit statistics, extracted once per spreadsheet and
/// broadcast onto every record of that file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFit {
    /// Adjusted R², rounded to 2 decimals at parse time.
    pub adjusted_r2: f64,
    /// Sample size.
    pub n: i64,
}

/// Parameters of one ingestion pass.
///
/// Re-running with an unchanged tree yields the same records as a multiset;
/// walk order across files is platform-dependent and not a guarantee.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Corpus root: `<root>/<Project>/<Level>/<Country>/<Psychography>/<Group>/*.xlsx`.
    pub root: PathBuf,
    /// Accepted data groups (folder names at the innermost level).
    pub data_groups: Vec<DataGroup>,
}

impl IngestConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            data_groups: DataGroup::ALL.to_vec(),
        }
    }
}

/// Selection state for one filter dimension: either the `All` aggregate or a
/// single pinned value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Selection {
    #[default]
    All,
    One(String),
}

impl Selection {
    pub fn one(value: impl Into<String>) -> Self {
        Selection::One(value.into())
    }

    pub fn pinned(&self) -> Option<&str> {
        match self {
            Selection::All => None,
            Selection::One(v) => Some(v.as_str()),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::All => f.write_str("All"),
            Selection::One(v) => f.write_str(v),
        }
    }
}

/// Immutable filter criteria for one view.
///
/// Passed whole to `filter::apply_filters`; the order in which the analyst
/// picked the values never affects the result.
///
/// `Selection::All` on the psychography dimension has special semantics: it
/// excludes the literal `"all"` aggregate segment, which is only shown when
/// pinned explicitly (its rows are modeled on different underlying data).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Project is mandatory before any view is produced.
    pub project: Option<String>,
    /// Data group is mandatory before any view is produced.
    pub data_group: Option<DataGroup>,
    /// `true` selects the `GFactor` level, `false` the `Results` level.
    pub general_factor: bool,
    /// Cluster selection; only meaningful when `data_group == Cluster`.
    pub cluster_info: Selection,
    pub country: Selection,
    pub psychography: Selection,
    /// Stage filter; ignored for the GFactor level (which has no stages).
    pub stage: Selection,
    pub market: Selection,
    pub driver_set: Selection,
}

impl FilterCriteria {
    pub fn level(&self) -> Level {
        if self.general_factor {
            Level::GFactor
        } else {
            Level::Results
        }
    }

    /// Whether the project/group preconditions for building a view are met.
    pub fn is_ready(&self) -> bool {
        self.project.is_some() && self.data_group.is_some()
    }

    /// A view is fully qualified when every remaining dimension is pinned to a
    /// single value. Only then do the file-level scalars (model fit, dropped
    /// drivers) describe the whole view and get surfaced.
    pub fn is_fully_qualified(&self) -> bool {
        let stage_pinned = self.general_factor || !self.stage.is_all();
        let cluster_pinned =
            self.data_group != Some(DataGroup::Cluster) || !self.cluster_info.is_all();
        self.is_ready()
            && !self.country.is_all()
            && !self.psychography.is_all()
            && stage_pinned
            && !self.market.is_all()
            && !self.driver_set.is_all()
            && cluster_pinned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_folder_round_trip() {
        assert_eq!(Level::from_folder_name("GFactor"), Some(Level::GFactor));
        assert_eq!(Level::from_folder_name("Results"), Some(Level::Results));
        assert_eq!(Level::from_folder_name("results"), None);
        assert_eq!(Level::from_folder_name("Archive"), None);
    }

    #[test]
    fn journey_stages_in_journey_order() {
        let names: Vec<&str> = JourneyStage::ALL.iter().map(|s| s.display_name()).collect();
        assert_eq!(
            names,
            vec!["Awareness", "Consideration", "Purchase", "Satisfaction", "Loyalty"]
        );
        assert_eq!(JourneyStage::from_name("Purchase"), Some(JourneyStage::Purchase));
        assert_eq!(JourneyStage::from_name("purchase"), None);
    }

    #[test]
    fn fully_qualified_requires_every_dimension() {
        let mut c = FilterCriteria {
            project: Some("CadillacUS".to_string()),
            data_group: Some(DataGroup::Detail),
            country: Selection::one("US"),
            psychography: Selection::one("AE"),
            stage: Selection::one("Awareness"),
            market: Selection::one("US"),
            driver_set: Selection::one("Brand"),
            ..FilterCriteria::default()
        };
        assert!(c.is_fully_qualified());

        c.market = Selection::All;
        assert!(!c.is_fully_qualified());
        c.market = Selection::one("US");

        // GFactor views have no stage dimension.
        c.stage = Selection::All;
        assert!(!c.is_fully_qualified());
        c.general_factor = true;
        assert!(c.is_fully_qualified());

        // Cluster group additionally needs a pinned cluster.
        c.data_group = Some(DataGroup::Cluster);
        assert!(!c.is_fully_qualified());
        c.cluster_info = Selection::one("Cluster 1");
        assert!(c.is_fully_qualified());
    }

    #[test]
    fn psychography_colors_cover_known_segments() {
        assert_eq!(psychography_color("AE"), (104, 125, 1));
        assert_eq!(psychography_color("all"), (81, 71, 31));
        assert_eq!(psychography_color("ZZ"), (136, 136, 136));
    }
}
