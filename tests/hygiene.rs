//! Hygiene — source budgets checked at test time.
//!
//! Scans `src/` (test files excluded) for patterns that crash the process or
//! swallow errors. Every budget is zero. If one must rise, fix an existing
//! hit first.

use std::fs;
use std::path::Path;

struct SourceFile {
    path: String,
    content: String,
}

/// (pattern, budget, what it means)
const BUDGETS: &[(&str, usize, &str)] = &[
    (".unwrap()", 0, "panics on None/Err"),
    (".expect(", 0, "panics on None/Err"),
    ("panic!(", 0, "crashes the session task"),
    ("unreachable!(", 0, "crashes the session task"),
    ("todo!(", 0, "unfinished stub"),
    ("unimplemented!(", 0, "unfinished stub"),
    ("let _ =", 0, "discards a result without inspecting it"),
    (".ok()", 0, "discards an error without inspecting it"),
    ("#[allow(dead_code)]", 0, "hides unused code"),
];

fn source_files() -> Vec<SourceFile> {
    let mut files = Vec::new();
    collect_rs_files(Path::new("src"), &mut files);
    files
}

fn collect_rs_files(dir: &Path, out: &mut Vec<SourceFile>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_rs_files(&path, out);
            continue;
        }
        let path_str = path.to_string_lossy().to_string();
        if !path_str.ends_with(".rs") || path_str.ends_with("_test.rs") {
            continue;
        }
        if let Ok(content) = fs::read_to_string(&path) {
            out.push(SourceFile { path: path_str, content });
        }
    }
}

fn hits(files: &[SourceFile], pattern: &str) -> Vec<(String, usize)> {
    files
        .iter()
        .filter_map(|file| {
            let count = file.content.lines().filter(|line| line.contains(pattern)).count();
            (count > 0).then(|| (file.path.clone(), count))
        })
        .collect()
}

#[test]
fn sources_are_found() {
    let files = source_files();
    assert!(files.iter().any(|f| f.path.ends_with("session.rs")), "hygiene scan found no sources; run from the crate root");
}

#[test]
fn budgets_hold() {
    let files = source_files();
    let mut failures = Vec::new();
    for (pattern, budget, meaning) in BUDGETS {
        let found = hits(&files, pattern);
        let count: usize = found.iter().map(|(_, c)| c).sum();
        if count > *budget {
            let detail = found.iter().map(|(path, c)| format!("    {path}: {c}")).collect::<Vec<_>>().join("\n");
            failures.push(format!("`{pattern}` ({meaning}): found {count}, max {budget}\n{detail}"));
        }
    }
    assert!(failures.is_empty(), "hygiene budgets exceeded:\n{}", failures.join("\n"));
}

#[test]
fn library_does_not_print() {
    let files = source_files();
    let offenders: Vec<_> = files
        .iter()
        .filter(|f| !f.path.ends_with("main.rs"))
        .filter(|f| f.content.contains("println!(") || f.content.contains("eprintln!("))
        .map(|f| f.path.clone())
        .collect();
    assert!(offenders.is_empty(), "library code should log through tracing: {offenders:?}");
}

#[test]
fn every_module_has_a_header() {
    let files = source_files();
    let missing: Vec<_> = files.iter().filter(|f| !f.content.starts_with("//!")).map(|f| f.path.clone()).collect();
    assert!(missing.is_empty(), "modules without a //! header: {missing:?}");
}
