//! Normalizers from raw tool output to the report's record shapes.
//!
//! The expected formats are those of the default Go toolchain commands; any
//! tool printing the same line conventions works.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;
use regex::Regex;
use serde_json::{Map, Value};
use crate::config::ExcludeSet;
use crate::models::{package_id, package_of_location, ComplexityResult, DuplicateBlock, TestOutcome, TestRun};

const RACE_HEADER: &str = "WARNING: DATA RACE";
const RACE_FOOTER: &str = "==================";

static AVERAGE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Average:\s*([0-9]+(?:\.[0-9]+)?)").expect("valid regex"));

/// Split a finding into its location prefix and the rest, at the first `:`.
///
/// Returns `None` when there is no prefix or it does not look like a path.
pub fn split_location(finding: &str) -> Option<(&str, &str)> {
    let index = finding.find(':')?;
    let location = &finding[..index];
    if location.is_empty() || location.chars().any(char::is_whitespace) {
        return None;
    }
    Some((location, &finding[index + 1..]))
}

/// Parse `go test -cover -race` style output for a single package.
///
/// The summary line looks like `ok  <pkg>  0.012s  coverage: 85.0% of statements`
/// or `FAIL  <pkg>  0.020s`.
pub fn parse_test_output(output: &str) -> TestRun {
    let mut outcome = None;
    for line in output.lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 3 || !matches!(tokens[0], "ok" | "FAIL") {
            continue;
        }
        let coverage = tokens
            .iter()
            .position(|t| *t == "coverage:")
            .and_then(|i| tokens.get(i + 1))
            .filter(|t| t.ends_with('%'))
            .map(|t| t.to_string())
            .unwrap_or_default();
        outcome = Some(TestOutcome {
            status: tokens[0].to_string(),
            elapsed: tokens[2].to_string(),
            coverage,
        });
    }

    TestRun {
        outcome,
        races: parse_race_blocks(output),
    }
}

fn parse_race_blocks(output: &str) -> Vec<String> {
    let mut races = Vec::new();
    let mut current: Option<Vec<&str>> = None;
    for line in output.lines() {
        let trimmed = line.trim();
        if trimmed == RACE_HEADER {
            current = Some(Vec::new());
            continue;
        }
        if let Some(block) = current.as_mut() {
            if trimmed == RACE_FOOTER {
                if let Some(block) = current.take() {
                    if !block.is_empty() {
                        races.push(block.join("\n"));
                    }
                }
            } else if !trimmed.is_empty() {
                block.push(trimmed);
            }
        }
    }
    if let Some(block) = current {
        if !block.is_empty() {
            races.push(block.join("\n"));
        }
    }
    races
}

/// Parse `gocyclo` output: one `"<value> <pkg> <func> <location>"` line per function.
pub fn parse_complexity_output(output: &str) -> ComplexityResult {
    let mut findings = Vec::new();
    let mut values = Vec::new();
    let mut reported_average = None;

    for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(caps) = AVERAGE_LINE.captures(line) {
            reported_average = caps[1].parse::<f64>().ok();
            continue;
        }
        let leading = line.split_whitespace().next().unwrap_or_default();
        if let Ok(value) = leading.parse::<u32>() {
            values.push(value as f64);
            findings.push(line.to_string());
        }
    }

    let average = reported_average.unwrap_or_else(|| {
        if values.is_empty() {
            0.0
        } else {
            values.iter().sum::<f64>() / values.len() as f64
        }
    });

    ComplexityResult { average, findings }
}

/// Keep the lines of linter output that carry a `location:` prefix.
pub fn parse_located_findings(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter(|line| split_location(line).is_some_and(|(_, rest)| !rest.trim().is_empty()))
        .map(str::to_string)
        .collect()
}

/// Parse `dupl -plumbing` output: `a.go:10-20: duplicate of b.go:30-40`.
///
/// Pairs touching a file ending in `exclude_suffix` are dropped.
pub fn parse_duplicates(output: &str, exclude_suffix: &str) -> Vec<DuplicateBlock> {
    let excluded = |location: &str| {
        !exclude_suffix.is_empty()
            && split_location(location).is_some_and(|(file, _)| file.ends_with(exclude_suffix))
    };

    output
        .lines()
        .filter_map(|line| line.trim().split_once(": duplicate of "))
        .map(|(first, second)| (first.trim(), second.trim()))
        .filter(|(first, second)| !excluded(first) && !excluded(second))
        .map(|(first, second)| vec![first.to_string(), second.to_string()])
        .collect()
}

/// Parse `go list -f '{{.ImportPath}} {{join .Imports " "}}'` into
/// `{ package: [imports...] }`, skipping excluded packages and imports.
pub fn parse_dependency_listing(output: &str, exclude: &ExcludeSet) -> Value {
    let mut graph = Map::new();
    for line in output.lines() {
        let mut tokens = line.split_whitespace();
        let Some(package) = tokens.next() else { continue };
        if package.contains(':') || exclude.is_excluded_anywhere(package) {
            continue;
        }
        let imports: Vec<Value> = tokens
            .filter(|import| !exclude.is_excluded_anywhere(import))
            .map(|import| Value::String(import.to_string()))
            .collect();
        graph.insert(package.to_string(), Value::Array(imports));
    }
    Value::Object(graph)
}

/// Parse `misspell` output into `{ file: [findings...] }`.
pub fn parse_spelling(output: &str, project: &Path, exclude: &ExcludeSet) -> Value {
    let mut by_file: BTreeMap<String, Vec<Value>> = BTreeMap::new();
    for finding in parse_located_findings(output) {
        let Some((file, _)) = split_location(&finding) else { continue };
        if exclude.is_excluded(&package_of_location(project, file)) {
            continue;
        }
        by_file
            .entry(file.to_string())
            .or_default()
            .push(Value::String(finding.clone()));
    }
    Value::Object(
        by_file
            .into_iter()
            .map(|(file, findings)| (file, Value::Array(findings)))
            .collect(),
    )
}

/// Map directory listings (one absolute dir per line) to package ids, in
/// order and without duplicates.
pub fn parse_package_dirs(output: &str, project: &Path, exclude: &ExcludeSet) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && Path::new(line).is_absolute())
        .map(|dir| package_id(project, Path::new(dir)))
        .filter(|id| !id.starts_with('/') && !exclude.is_excluded(id))
        .filter(|id| seen.insert(id.clone()))
        .collect()
}
