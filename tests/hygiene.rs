//! Hygiene: enforces coding standards for the studio crate at test time.
//!
//! Each antipattern has a budget (ideally zero). If you must add one, you have
//! to fix an existing one first. The budget never grows.
//!
//! The binary is the only place allowed to print; library code logs through
//! `tracing`.

use std::fs;
use std::path::Path;

/// Pattern, budget, short reason, and files exempt from the rule.
const BUDGETS: &[(&str, usize, &str, &[&str])] = &[
    (".unwrap()", 0, "panics on None/Err", &[]),
    (".expect(", 0, "panics on None/Err", &[]),
    ("panic!(", 0, "crashes the process", &[]),
    ("unreachable!(", 0, "crashes the process", &[]),
    ("todo!(", 0, "unfinished stub", &[]),
    ("unimplemented!(", 0, "unfinished stub", &[]),
    ("let _ =", 0, "discards a value without inspecting it", &[]),
    (".ok()", 0, "drops the error", &[]),
    ("#[allow(dead_code)]", 0, "hides unused code", &[]),
    ("println!(", 0, "libraries log through tracing", &["main.rs"]),
    ("eprintln!(", 0, "libraries log through tracing", &[]),
];

struct SourceFile {
    path: String,
    content: String,
}

/// Production `.rs` files under `src/`, excluding `_test.rs` modules.
fn source_files() -> Vec<SourceFile> {
    let mut files = Vec::new();
    collect(Path::new("src"), &mut files);
    files
}

fn collect(dir: &Path, out: &mut Vec<SourceFile>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect(&path, out);
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

#[test]
fn source_tree_is_not_empty() {
    assert!(source_files().len() > 5, "expected to scan src");
}

#[test]
fn antipattern_budgets() {
    let files = source_files();
    let mut failures = Vec::new();
    for &(pattern, max, reason, exempt) in BUDGETS {
        let found: Vec<(String, usize)> = files
            .iter()
            .filter(|file| !exempt.iter().any(|name| file.path.ends_with(name)))
            .filter_map(|file| {
                let count = file.content.lines().filter(|line| line.contains(pattern)).count();
                (count > 0).then(|| (file.path.clone(), count))
            })
            .collect();
        let count: usize = found.iter().map(|(_, c)| c).sum();
        if count > max {
            let detail: Vec<String> = found.iter().map(|(path, c)| format!("    {path}: {c}")).collect();
            failures.push(format!("  `{pattern}` ({reason}): found {count}, max {max}\n{}", detail.join("\n")));
        }
    }
    assert!(failures.is_empty(), "hygiene budgets exceeded:\n{}", failures.join("\n"));
}

#[test]
fn storage_does_not_reach_into_services() {
    let offenders: Vec<String> = source_files()
        .into_iter()
        .filter(|file| file.path.contains("storage"))
        .filter(|file| file.content.contains("crate::services"))
        .map(|file| file.path)
        .collect();
    assert!(offenders.is_empty(), "storage depends on services: {offenders:?}");
}
