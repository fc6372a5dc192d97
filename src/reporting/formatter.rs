//! HTML fragments for each report section. Every value taken from the report
//! is escaped before it is embedded.

use std::collections::BTreeMap;
use html_escape::encode_text;
use crate::models::{AggregateReport, AnalyzerRun, ComplexityResult, DuplicateBlock, PackageTestResult};
use crate::scoring::ScoreBreakdown;

fn empty_note(message: &str) -> String {
    format!("<p class=\"empty\">{}</p>\n", encode_text(message))
}

pub fn format_score_breakdown(breakdown: &ScoreBreakdown) -> String {
    let rows: [(&str, String, u32); 6] = [
        ("Test coverage", format!("{:.1}", breakdown.coverage), 40),
        ("Duplicate code", breakdown.duplicates.to_string(), 10),
        ("Static scan", breakdown.static_scan.to_string(), 10),
        ("Simplification", breakdown.simplification.to_string(), 10),
        ("Dead code", breakdown.dead_code.to_string(), 10),
        ("Cyclomatic complexity", breakdown.complexity.to_string(), 20),
    ];

    let mut html = String::from("<table class=\"breakdown\">\n<tr><th>Term</th><th>Points</th><th>Max</th></tr>\n");
    for (label, points, max) in rows {
        html.push_str(&format!("<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n", label, points, max));
    }
    html.push_str(&format!(
        "<tr class=\"total\"><td>Total</td><td>{}</td><td>100</td></tr>\n</table>\n",
        breakdown.total
    ));
    html
}

pub fn format_unit_tests(per_package: &BTreeMap<String, PackageTestResult>) -> String {
    if per_package.is_empty() {
        return empty_note("No test packages found.");
    }
    let mut html = String::from(
        "<table>\n<tr><th>Package</th><th>Result</th><th>Time (s)</th><th>Coverage</th></tr>\n",
    );
    for (package, result) in per_package {
        let (class, label) = if result.passed { ("pass", "PASS") } else { ("fail", "FAIL") };
        html.push_str(&format!(
            "<tr><td>{}</td><td class=\"{}\">{}</td><td>{:.3}</td><td>{}</td></tr>\n",
            encode_text(package),
            class,
            label,
            result.elapsed_seconds,
            encode_text(&result.coverage),
        ));
    }
    html.push_str("</table>\n");
    html
}

/// Findings grouped by package, one collapsible block per package.
pub fn format_grouped_findings(groups: &BTreeMap<String, Vec<String>>, empty: &str) -> String {
    if groups.values().all(Vec::is_empty) {
        return empty_note(empty);
    }
    let mut html = String::new();
    for (package, findings) in groups {
        html.push_str(&format!(
            "<details>\n<summary>{} <span class=\"count\">({})</span></summary>\n<ul>\n",
            encode_text(package),
            findings.len()
        ));
        for finding in findings {
            html.push_str(&format!("<li><code>{}</code></li>\n", encode_text(finding)));
        }
        html.push_str("</ul>\n</details>\n");
    }
    html
}

pub fn format_complexity(complexity: &BTreeMap<String, ComplexityResult>) -> String {
    if complexity.is_empty() {
        return empty_note("No complexity data.");
    }
    let mut html = String::from("<table>\n<tr><th>Package</th><th>Average</th><th>Functions</th></tr>\n");
    for (package, result) in complexity {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{:.2}</td><td>{}</td></tr>\n",
            encode_text(package),
            result.average,
            result.findings.len()
        ));
    }
    html.push_str("</table>\n");
    html
}

pub fn format_duplicates(blocks: &[DuplicateBlock]) -> String {
    if blocks.is_empty() {
        return empty_note("No duplicated code found.");
    }
    let mut html = String::from("<ol>\n");
    for block in blocks {
        let locations: Vec<String> = block
            .iter()
            .map(|location| format!("<code>{}</code>", encode_text(location)))
            .collect();
        html.push_str(&format!("<li>{}</li>\n", locations.join(" &harr; ")));
    }
    html.push_str("</ol>\n");
    html
}

pub fn format_list(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        return empty_note(empty);
    }
    let mut html = String::from("<ul>\n");
    for item in items {
        html.push_str(&format!("<li><code>{}</code></li>\n", encode_text(item)));
    }
    html.push_str("</ul>\n");
    html
}

/// Pretty-printed JSON inside a `<pre>` block.
pub fn format_json_block(value: &serde_json::Value, empty: &str) -> String {
    let is_empty = match value {
        serde_json::Value::Null => true,
        serde_json::Value::Object(map) => map.is_empty(),
        serde_json::Value::Array(items) => items.is_empty(),
        _ => false,
    };
    if is_empty {
        return empty_note(empty);
    }
    let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    format!("<pre>{}</pre>\n", encode_text(&pretty))
}

pub fn format_analyzer_runs(runs: &[AnalyzerRun]) -> String {
    if runs.is_empty() {
        return empty_note("No analyzer ran.");
    }
    let mut html = String::from("<table>\n<tr><th>Analyzer</th><th>Status</th><th>Duration</th></tr>\n");
    for run in runs {
        let class = if run.status.is_completed() { "pass" } else { "fail" };
        html.push_str(&format!(
            "<tr><td>{}</td><td class=\"{}\">{}</td><td>{}</td></tr>\n",
            run.kind.display_name(),
            class,
            run.status,
            crate::utils::formatting::format_duration(run.duration_ms),
        ));
    }
    html.push_str("</table>\n");
    html
}

/// Race findings flattened into one group per package.
pub fn format_races(report: &AggregateReport) -> String {
    format_grouped_findings(
        &report.unit_test.per_package_race_findings,
        "No data races detected.",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalyzerKind, RunStatus};

    #[test]
    fn test_findings_are_escaped() {
        let mut groups = BTreeMap::new();
        groups.insert("api".to_string(), vec!["api/h.go:1:1: use <nil> & stop".to_string()]);
        let html = format_grouped_findings(&groups, "none");
        assert!(html.contains("use &lt;nil&gt; &amp; stop"));
        assert!(!html.contains("<nil>"));
    }

    #[test]
    fn test_empty_sections_render_note() {
        assert!(format_duplicates(&[]).contains("No duplicated code found."));
        assert!(format_json_block(&serde_json::Value::Null, "No graph.").contains("No graph."));
        assert!(format_grouped_findings(&BTreeMap::new(), "Clean.").contains("Clean."));
    }

    #[test]
    fn test_unit_test_table() {
        let mut per_package = BTreeMap::new();
        per_package.insert("calc".to_string(), PackageTestResult {
            passed: true,
            elapsed_seconds: 0.012,
            coverage: "85.0%".into(),
        });
        let html = format_unit_tests(&per_package);
        assert!(html.contains("<td>calc</td>"));
        assert!(html.contains("PASS"));
        assert!(html.contains("0.012"));
    }

    #[test]
    fn test_analyzer_runs_table() {
        let runs = vec![AnalyzerRun {
            kind: AnalyzerKind::Spelling,
            status: RunStatus::TimedOut,
            duration_ms: 1500,
        }];
        let html = format_analyzer_runs(&runs);
        assert!(html.contains("Spelling"));
        assert!(html.contains("timed out"));
    }
}
