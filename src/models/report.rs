use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use super::run::AnalyzerRun;

/// Locations of one group of duplicated code blocks.
pub type DuplicateBlock = Vec<String>;

/// Outcome of one package's test run, as stored in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageTestResult {
    pub passed: bool,
    pub elapsed_seconds: f64,
    /// "NN.N%" as reported by the test tool, "0%" when unmeasured.
    pub coverage: String,
}

impl Default for PackageTestResult {
    fn default() -> Self {
        Self {
            passed: false,
            elapsed_seconds: 0.0,
            coverage: UNMEASURED_COVERAGE.to_string(),
        }
    }
}

pub const UNMEASURED_COVERAGE: &str = "0%";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitTestSummary {
    pub per_package: BTreeMap<String, PackageTestResult>,
    pub average_coverage: String,
    pub per_package_race_findings: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplexityResult {
    pub average: f64,
    /// "value description" lines, one per function.
    pub findings: Vec<String>,
}

/// Unified record of every analyzer's output plus the derived score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    pub project: String,
    pub unit_test: UnitTestSummary,
    pub complexity: BTreeMap<String, ComplexityResult>,
    pub simplification_tips: BTreeMap<String, Vec<String>>,
    pub static_scan_tips: BTreeMap<String, Vec<String>>,
    pub duplicate_code_tips: Vec<DuplicateBlock>,
    pub dependency_graph: serde_json::Value,
    pub dead_code: Vec<String>,
    pub spelling_errors: serde_json::Value,
    pub packages_without_tests: Vec<String>,
    pub score: u32,
    #[serde(default)]
    pub analyzer_runs: Vec<AnalyzerRun>,
}

impl AggregateReport {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            ..Default::default()
        }
    }

    pub fn static_scan_count(&self) -> usize {
        self.static_scan_tips.values().map(Vec::len).sum()
    }

    pub fn simplification_count(&self) -> usize {
        self.simplification_tips.values().map(Vec::len).sum()
    }

    pub fn failed_packages(&self) -> impl Iterator<Item = &str> {
        self.unit_test
            .per_package
            .iter()
            .filter(|(_, result)| !result.passed)
            .map(|(name, _)| name.as_str())
    }
}
