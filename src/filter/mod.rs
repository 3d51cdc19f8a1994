//! Pure filtering over the normalized table.
//!
//! Two responsibilities, both side-effect free:
//!
//! - [`apply_filters`] reduces the global table to the records of one view
//! - [`FilterOptions::derive`] computes the valid choices for each dimension,
//!   cascading through the dimensions in a fixed order so that every offered
//!   option is guaranteed to produce a non-empty view
//!
//! The cascade order is: project + level + group first, then cluster, country,
//! psychography, stage, market, driver set. The order the analyst picked the
//! values in never affects the result.

use crate::domain::{DataGroup, FilterCriteria, JourneyStage, NormalizedRecord, Selection};

/// Reduce the table to the records matching `criteria`.
///
/// Returns an empty view until project and data group are chosen.
///
/// `Selection::All` on psychography excludes the literal `"all"` aggregate
/// segment (case-insensitive); its rows are modeled on different underlying
/// data and only appear when pinned explicitly.
pub fn apply_filters(
    records: &[NormalizedRecord],
    criteria: &FilterCriteria,
) -> Vec<NormalizedRecord> {
    if !criteria.is_ready() {
        return Vec::new();
    }
    records
        .iter()
        .filter(|r| matches_base(r, criteria))
        .filter(|r| matches_selection(&criteria.cluster_info, r.cluster_info.as_deref()))
        .filter(|r| matches_selection(&criteria.country, Some(&r.country)))
        .filter(|r| matches_psychography(&criteria.psychography, &r.psychography))
        .filter(|r| criteria.general_factor || matches_selection(&criteria.stage, Some(&r.stage)))
        .filter(|r| matches_selection(&criteria.market, Some(&r.market)))
        .filter(|r| matches_selection(&criteria.driver_set, Some(&r.driver_set)))
        .cloned()
        .collect()
}

fn matches_base(r: &NormalizedRecord, criteria: &FilterCriteria) -> bool {
    criteria.project.as_deref() == Some(r.project.as_str())
        && criteria.data_group == Some(r.data_group)
        && r.level == criteria.level()
}

fn matches_selection(selection: &Selection, value: Option<&str>) -> bool {
    match selection.pinned() {
        None => true,
        Some(wanted) => value == Some(wanted),
    }
}

fn matches_psychography(selection: &Selection, value: &str) -> bool {
    match selection.pinned() {
        None => !value.eq_ignore_ascii_case("all"),
        Some(wanted) => value == wanted,
    }
}

/// The valid choices for every filter dimension, given the current criteria.
///
/// Each list is derived from the records surviving the dimensions *above* it
/// in the cascade, so narrowing an upper dimension narrows everything below.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOptions {
    pub projects: Vec<String>,
    /// Only populated for the Cluster data group.
    pub clusters: Vec<String>,
    pub countries: Vec<String>,
    pub psychographies: Vec<String>,
    /// In journey order, not alphabetical. Empty for the GFactor level.
    pub stages: Vec<String>,
    pub markets: Vec<String>,
    pub driver_sets: Vec<String>,
}

/// Driver-set choices are fixed for cluster views; the workbooks encode the
/// set in the header but clusters always model these two.
const CLUSTER_DRIVER_SETS: [&str; 2] = ["Brand", "Product"];

impl FilterOptions {
    pub fn derive(records: &[NormalizedRecord], criteria: &FilterCriteria) -> Self {
        let mut options = FilterOptions {
            projects: sorted_unique(records.iter().map(|r| r.project.as_str())),
            ..FilterOptions::default()
        };
        if !criteria.is_ready() {
            return options;
        }

        let mut pool: Vec<&NormalizedRecord> =
            records.iter().filter(|r| matches_base(r, criteria)).collect();

        if criteria.data_group == Some(DataGroup::Cluster) {
            options.clusters =
                sorted_unique(pool.iter().filter_map(|r| r.cluster_info.as_deref()));
            pool.retain(|r| matches_selection(&criteria.cluster_info, r.cluster_info.as_deref()));
        }

        options.countries = sorted_unique(pool.iter().map(|r| r.country.as_str()));
        pool.retain(|r| matches_selection(&criteria.country, Some(&r.country)));

        options.psychographies = sorted_unique(pool.iter().map(|r| r.psychography.as_str()));
        pool.retain(|r| matches_psychography(&criteria.psychography, &r.psychography));

        if !criteria.general_factor {
            options.stages = journey_ordered(pool.iter().map(|r| r.stage.as_str()));
            pool.retain(|r| matches_selection(&criteria.stage, Some(&r.stage)));
        }

        options.markets = sorted_unique(pool.iter().map(|r| r.market.as_str()));
        pool.retain(|r| matches_selection(&criteria.market, Some(&r.market)));

        options.driver_sets = if criteria.data_group == Some(DataGroup::Cluster) {
            CLUSTER_DRIVER_SETS.iter().map(|s| s.to_string()).collect()
        } else {
            sorted_unique(pool.iter().map(|r| r.driver_set.as_str()))
        };

        options
    }
}

fn sorted_unique<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = values.map(str::to_string).collect();
    out.sort();
    out.dedup();
    out
}

/// Known stages come first in journey order; anything else (a workbook with an
/// unexpected stage label) trails alphabetically rather than disappearing.
fn journey_ordered<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let present = sorted_unique(values);
    let mut out: Vec<String> = JourneyStage::ALL
        .iter()
        .map(|s| s.display_name().to_string())
        .filter(|s| present.contains(s))
        .collect();
    for v in present {
        if JourneyStage::from_name(&v).is_none() {
            out.push(v);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Level;

    fn record(
        project: &str,
        level: Level,
        country: &str,
        psychography: &str,
        stage: &str,
        market: &str,
        driver_set: &str,
    ) -> NormalizedRecord {
        NormalizedRecord {
            project: project.to_string(),
            level,
            country: country.to_string(),
            psychography: psychography.to_string(),
            data_group: DataGroup::Detail,
            stage: stage.to_string(),
            market: market.to_string(),
            driver_set: driver_set.to_string(),
            entity: "Quality".to_string(),
            value: 0.8,
            adjusted_r2: 0.73,
            n: 250,
            dropped_drivers: Vec::new(),
            source: "f.xlsx".to_string(),
            cluster_info: None,
        }
    }

    fn table() -> Vec<NormalizedRecord> {
        vec![
            record("CadillacUS", Level::Results, "US", "AE", "Awareness", "US", "Brand"),
            record("CadillacUS", Level::Results, "US", "LH", "Purchase", "US", "Brand"),
            record("CadillacUS", Level::Results, "DE", "AE", "Awareness", "DE", "Product"),
            record("CadillacUS", Level::Results, "US", "all", "Awareness", "US", "Brand"),
            record("CadillacUS", Level::GFactor, "US", "AE", "", "US", "Brand"),
            record("LyriqEU", Level::Results, "DE", "ME", "Loyalty", "DE", "Brand"),
        ]
    }

    fn ready() -> FilterCriteria {
        FilterCriteria {
            project: Some("CadillacUS".to_string()),
            data_group: Some(DataGroup::Detail),
            ..FilterCriteria::default()
        }
    }

    #[test]
    fn view_is_empty_until_project_and_group_are_chosen() {
        assert!(apply_filters(&table(), &FilterCriteria::default()).is_empty());
    }

    #[test]
    fn base_dimensions_always_apply() {
        let view = apply_filters(&table(), &ready());
        assert!(view.iter().all(|r| r.project == "CadillacUS"));
        assert!(view.iter().all(|r| r.level == Level::Results));
    }

    #[test]
    fn psychography_all_hides_the_aggregate_segment() {
        let view = apply_filters(&table(), &ready());
        assert!(view.iter().all(|r| r.psychography != "all"));

        let mut criteria = ready();
        criteria.psychography = Selection::one("all");
        let view = apply_filters(&table(), &criteria);
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].psychography, "all");
    }

    #[test]
    fn pinned_dimensions_narrow_the_view() {
        let mut criteria = ready();
        criteria.country = Selection::one("DE");
        let view = apply_filters(&table(), &criteria);
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].driver_set, "Product");
    }

    #[test]
    fn stage_is_ignored_for_gfactor_views() {
        let mut criteria = ready();
        criteria.general_factor = true;
        criteria.stage = Selection::one("Awareness");
        let view = apply_filters(&table(), &criteria);
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].level, Level::GFactor);
    }

    #[test]
    fn selection_order_never_matters() {
        let mut a = ready();
        a.country = Selection::one("US");
        a.psychography = Selection::one("AE");

        let mut b = ready();
        b.psychography = Selection::one("AE");
        b.country = Selection::one("US");

        assert_eq!(apply_filters(&table(), &a), apply_filters(&table(), &b));
    }

    #[test]
    fn options_cascade_downward() {
        let mut criteria = ready();
        let options = FilterOptions::derive(&table(), &criteria);
        assert_eq!(options.projects, ["CadillacUS", "LyriqEU"]);
        assert_eq!(options.countries, ["DE", "US"]);
        assert_eq!(options.psychographies, ["AE", "LH", "all"]);
        assert_eq!(options.markets, ["DE", "US"]);

        criteria.country = Selection::one("DE");
        let options = FilterOptions::derive(&table(), &criteria);
        assert_eq!(options.psychographies, ["AE"]);
        assert_eq!(options.markets, ["DE"]);
        assert_eq!(options.driver_sets, ["Product"]);
    }

    #[test]
    fn stage_options_follow_journey_order() {
        let mut records = table();
        records.push(record(
            "CadillacUS", Level::Results, "US", "AE", "Loyalty", "US", "Brand",
        ));
        let options = FilterOptions::derive(&records, &ready());
        assert_eq!(options.stages, ["Awareness", "Purchase", "Loyalty"]);
    }

    #[test]
    fn cluster_group_has_fixed_driver_sets_and_cluster_options() {
        let mut records = table();
        for r in &mut records {
            r.data_group = DataGroup::Cluster;
            r.cluster_info = Some("Cluster 1".to_string());
        }
        records[1].cluster_info = Some("Cluster 2".to_string());

        let mut criteria = ready();
        criteria.data_group = Some(DataGroup::Cluster);
        let options = FilterOptions::derive(&records, &criteria);
        assert_eq!(options.clusters, ["Cluster 1", "Cluster 2"]);
        assert_eq!(options.driver_sets, ["Brand", "Product"]);

        criteria.cluster_info = Selection::one("Cluster 2");
        let view = apply_filters(&records, &criteria);
        assert!(view.iter().all(|r| r.cluster_info.as_deref() == Some("Cluster 2")));
    }
}
