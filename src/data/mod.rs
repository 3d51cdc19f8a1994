//! Built-in data sources (currently only the synthetic demo corpus).

pub mod demo;

pub use demo::generate_demo_records;
