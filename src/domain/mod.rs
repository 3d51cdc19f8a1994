//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the corpus layout enums (`Level`, `DataGroup`, `JourneyStage`)
//! - the normalized table row (`NormalizedRecord`)
//! - view/filter inputs (`FilterCriteria`, `Selection`, `IngestConfig`)

pub mod types;

pub use types::*;
