use std::collections::BTreeMap;
use html_escape::encode_text;
use crate::models::AggregateReport;
use crate::scoring::{self, ScoreBreakdown};
use super::formatter::*;

/// Placeholder names a document template may use.
pub const FIELDS: &[&str] = &[
    "PROJECT",
    "GENERATED_AT",
    "SCORE",
    "GRADE",
    "SCORE_BREAKDOWN",
    "AVERAGE_COVERAGE",
    "UNIT_TESTS",
    "RACES",
    "UNTESTED_PACKAGES",
    "COMPLEXITY",
    "STATIC_SCAN",
    "SIMPLIFICATION",
    "DUPLICATES",
    "DEAD_CODE",
    "SPELLING",
    "DEPENDENCY_GRAPH",
    "ANALYZER_RUNS",
    "GENERATOR",
];

fn generator() -> String {
    format!(
        "codegrade {} ({}, built {})",
        env!("CARGO_PKG_VERSION"),
        option_env!("CODEGRADE_GIT_HASH").unwrap_or("dev"),
        option_env!("CODEGRADE_BUILD_DATE").unwrap_or("unknown"),
    )
}

/// The report projected into pre-rendered, escaped HTML fragments.
#[derive(Debug, Clone)]
pub struct ReportView {
    pub breakdown: ScoreBreakdown,
    values: BTreeMap<&'static str, String>,
}

impl ReportView {
    pub fn new(report: &AggregateReport, generated_at: &str) -> Self {
        let breakdown = scoring::calculate(report);
        let mut values = BTreeMap::new();

        values.insert("PROJECT", encode_text(&report.project).into_owned());
        values.insert("GENERATED_AT", encode_text(generated_at).into_owned());
        values.insert("SCORE", report.score.to_string());
        values.insert("GRADE", scoring::letter(report.score).to_string());
        values.insert("SCORE_BREAKDOWN", format_score_breakdown(&breakdown));
        values.insert(
            "AVERAGE_COVERAGE",
            encode_text(&report.unit_test.average_coverage).into_owned(),
        );
        values.insert("UNIT_TESTS", format_unit_tests(&report.unit_test.per_package));
        values.insert("RACES", format_races(report));
        values.insert(
            "UNTESTED_PACKAGES",
            format_list(&report.packages_without_tests, "Every package has tests."),
        );
        values.insert("COMPLEXITY", format_complexity(&report.complexity));
        values.insert(
            "STATIC_SCAN",
            format_grouped_findings(&report.static_scan_tips, "No static scan findings."),
        );
        values.insert(
            "SIMPLIFICATION",
            format_grouped_findings(&report.simplification_tips, "No simplification hints."),
        );
        values.insert("DUPLICATES", format_duplicates(&report.duplicate_code_tips));
        values.insert("DEAD_CODE", format_list(&report.dead_code, "No dead code found."));
        values.insert(
            "SPELLING",
            format_json_block(&report.spelling_errors, "No spelling errors."),
        );
        values.insert(
            "DEPENDENCY_GRAPH",
            format_json_block(&report.dependency_graph, "No dependency data."),
        );
        values.insert("ANALYZER_RUNS", format_analyzer_runs(&report.analyzer_runs));
        values.insert("GENERATOR", encode_text(&generator()).into_owned());

        Self { breakdown, values }
    }

    pub fn values(&self) -> &BTreeMap<&'static str, String> {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_covers_every_field() {
        let report = AggregateReport::new("demo");
        let view = ReportView::new(&report, "2026-01-01 00:00:00 UTC");
        for field in FIELDS {
            assert!(view.values().contains_key(field), "missing {}", field);
        }
        assert_eq!(view.values().len(), FIELDS.len());
    }

    #[test]
    fn test_project_name_is_escaped() {
        let report = AggregateReport::new("<script>");
        let view = ReportView::new(&report, "now");
        assert_eq!(view.values()["PROJECT"], "&lt;script&gt;");
    }
}
