//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - resolves the corpus root and ingests the workbooks
//! - builds filtered views
//! - prints reports
//! - writes optional exports

use clap::Parser;

use crate::cli::{Command, ExportArgs, ViewArgs};
use crate::domain::FilterCriteria;
use crate::error::AppError;

pub mod pipeline;

use pipeline::{build_view, load_data, LoadedData};

/// Entry point for the `tad` binary.
pub fn run() -> Result<(), AppError> {
    // TAD_DATA_ROOT may come from a .env next to the corpus.
    let _ = dotenvy::dotenv();

    // We want `tad` and `tad -d <dir>` to behave like `tad tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of
    // the argv list before parsing. This preserves a clean clap structure
    // while retaining the requested UX.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Load(args) => {
            let loaded = load_data(&args)?;
            println!(
                "{}",
                crate::report::format_load_summary(&loaded.report, &loaded.config)
            );
            Ok(())
        }
        Command::Show(args) => handle_show(args),
        Command::Export(args) => handle_export(args),
        Command::Tui(args) => crate::tui::run(args),
    }
}

fn handle_show(args: ViewArgs) -> Result<(), AppError> {
    let loaded = load_data(&args.data)?;
    let criteria = resolve_criteria(args.filter.criteria(), &loaded);
    let view = build_view(&loaded.report.records, &criteria);

    println!("{}", crate::report::format_view(&view, &criteria));
    Ok(())
}

fn handle_export(args: ExportArgs) -> Result<(), AppError> {
    if args.csv.is_none() && args.snapshot.is_none() {
        return Err(AppError::input(
            "Nothing to export: pass --csv <file> and/or --snapshot <file>.",
        ));
    }

    let loaded = load_data(&args.data)?;
    let criteria = resolve_criteria(args.filter.criteria(), &loaded);
    let view = build_view(&loaded.report.records, &criteria);

    if let Some(path) = &args.csv {
        crate::io::export::write_view_csv(path, &view.records)?;
        println!("Wrote {} record(s) to {}", view.records.len(), path.display());
    }
    if let Some(path) = &args.snapshot {
        let snapshot = crate::io::export::Snapshot::new(
            &criteria,
            view.model_fit.as_ref(),
            &view.dropped_drivers,
            &view.records,
        );
        crate::io::export::write_snapshot_json(path, &snapshot)?;
        println!("Wrote snapshot to {}", path.display());
    }

    Ok(())
}

/// Fill the mandatory project dimension when the flag was omitted: default to
/// the first project of the corpus, matching the TUI's initial state.
fn resolve_criteria(mut criteria: FilterCriteria, loaded: &LoadedData) -> FilterCriteria {
    if criteria.project.is_none() {
        let mut projects: Vec<&str> = loaded
            .report
            .records
            .iter()
            .map(|r| r.project.as_str())
            .collect();
        projects.sort();
        criteria.project = projects.first().map(|p| p.to_string());
    }
    criteria
}

/// Rewrite argv so `tad` defaults to `tad tui`.
///
/// Rules:
/// - `tad`                      -> `tad tui`
/// - `tad -d <dir> ...`         -> `tad tui -d <dir> ...`
/// - `tad --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "load" | "show" | "export" | "tui");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(tokens: &[&str]) -> Vec<String> {
        std::iter::once("tad")
            .chain(tokens.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn bare_invocation_defaults_to_tui() {
        assert_eq!(rewrite_args(args(&[])), args(&["tui"]));
        assert_eq!(rewrite_args(args(&["--demo"])), args(&["tui", "--demo"]));
        assert_eq!(
            rewrite_args(args(&["-d", "models"])),
            args(&["tui", "-d", "models"])
        );
    }

    #[test]
    fn subcommands_and_help_pass_through() {
        assert_eq!(rewrite_args(args(&["load", "--demo"])), args(&["load", "--demo"]));
        assert_eq!(rewrite_args(args(&["--help"])), args(&["--help"]));
        assert_eq!(rewrite_args(args(&["-V"])), args(&["-V"]));
    }
}
