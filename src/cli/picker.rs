//! Interactive corpus-root picker.
//!
//! This is intentionally kept separate from clap parsing:
//! - clap handles structured flags/subcommands
//! - the picker provides the "run `tad` and choose a corpus" UX
//!
//! A directory qualifies as a corpus root when at least one of its
//! grandchildren is a `GFactor` or `Results` folder (the second level of the
//! corpus layout).

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// Directory recursion depth when searching for corpus roots.
const DEFAULT_SEARCH_DEPTH: usize = 3;

/// Prompt the user to select a corpus root from the current directory tree.
///
/// Behavior:
/// - list discovered candidate roots
/// - accept either a number (from the list) or an explicit path
/// - `q` cancels
pub fn prompt_for_data_root() -> Result<PathBuf, AppError> {
    let roots = discover_data_roots();
    if roots.is_empty() {
        return Err(AppError::input(
            "No corpus directories found. Provide one with `tad tui -d <dir>` or set TAD_DATA_ROOT.",
        ));
    }

    println!("Found {} candidate corpus root(s):", roots.len());
    for (idx, path) in roots.iter().enumerate() {
        println!("{:>3}) {}", idx + 1, pretty_path(path));
    }

    loop {
        print!(
            "Select a directory by number (1-{}) or type a path (q to quit): ",
            roots.len()
        );
        io::stdout()
            .flush()
            .map_err(|e| AppError::input(format!("Failed to write prompt: {e}")))?;

        let mut input = String::new();
        let bytes = io::stdin()
            .read_line(&mut input)
            .map_err(|e| AppError::input(format!("Failed to read input: {e}")))?;

        if bytes == 0 {
            return Err(AppError::input(
                "No input received. Provide a corpus root with `-d <dir>`.",
            ));
        }

        let input = input.trim();
        if input.eq_ignore_ascii_case("q") {
            return Err(AppError::input("Canceled."));
        }

        if let Ok(choice) = input.parse::<usize>() {
            if (1..=roots.len()).contains(&choice) {
                return validate_data_root(&roots[choice - 1]);
            }
            println!(
                "Invalid choice: {choice}. Enter a number between 1 and {}.",
                roots.len()
            );
            continue;
        }

        let candidate = PathBuf::from(input);
        match validate_data_root(&candidate) {
            Ok(path) => return Ok(path),
            Err(err) => {
                println!("{err}");
                continue;
            }
        }
    }
}

/// Validate the provided path is a directory.
pub fn validate_data_root(path: &Path) -> Result<PathBuf, AppError> {
    if !path.exists() {
        return Err(AppError::input(format!(
            "Directory not found: {}",
            path.display()
        )));
    }
    if !path.is_dir() {
        return Err(AppError::input(format!(
            "Expected a directory, got a file: {}",
            path.display()
        )));
    }
    Ok(path.to_path_buf())
}

/// Discover corpus-root candidates under the current directory
/// (deterministic order).
pub fn discover_data_roots() -> Vec<PathBuf> {
    find_data_roots(Path::new("."), DEFAULT_SEARCH_DEPTH)
}

fn find_data_roots(start: &Path, max_depth: usize) -> Vec<PathBuf> {
    let mut out = Vec::new();
    find_data_roots_inner(start, 0, max_depth, &mut out);
    out.sort_by(|a, b| pretty_path(a).cmp(&pretty_path(b)));
    out
}

fn find_data_roots_inner(dir: &Path, depth: usize, max_depth: usize, out: &mut Vec<PathBuf>) {
    if depth > max_depth {
        return;
    }

    if looks_like_corpus_root(dir) {
        out.push(dir.to_path_buf());
        return;
    }

    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() && !should_skip_dir(&path) {
            find_data_roots_inner(&path, depth + 1, max_depth, out);
        }
    }
}

/// `<root>/<Project>/<GFactor|Results>` is the signature of the layout.
fn looks_like_corpus_root(dir: &Path) -> bool {
    let Ok(entries) = fs::read_dir(dir) else {
        return false;
    };
    entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .any(|project| project.join("GFactor").is_dir() || project.join("Results").is_dir())
}

fn should_skip_dir(path: &Path) -> bool {
    let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
    matches!(name, ".git" | "target" | "node_modules")
}

fn pretty_path(path: &Path) -> String {
    let stripped = path.strip_prefix("./").unwrap_or(path);
    stripped.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corpus_roots_are_detected_by_their_second_level() {
        let tmp = tempfile::tempdir().unwrap();
        let corpus = tmp.path().join("models");
        fs::create_dir_all(corpus.join("CadillacUS/Results")).unwrap();
        fs::create_dir_all(tmp.path().join("unrelated/stuff")).unwrap();

        let roots = find_data_roots(tmp.path(), 3);
        assert_eq!(roots, vec![corpus]);
    }

    #[test]
    fn validate_rejects_files_and_missing_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("f.txt");
        fs::write(&file, b"x").unwrap();

        assert!(validate_data_root(tmp.path()).is_ok());
        assert!(validate_data_root(&file).is_err());
        assert!(validate_data_root(Path::new("/no/such/dir")).is_err());
    }
}
