use std::collections::{BTreeMap, BTreeSet};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::Mutex;
use crate::models::{
    AggregateReport, AnalyzerRun, ComplexityResult, DuplicateBlock, PackageTestResult,
    UnitTestSummary, UNMEASURED_COVERAGE,
};
use tracing::{debug, warn};

/// Concurrent map where every key has exactly one producer.
///
/// A second write to an existing key is refused and logged, so a duplicate
/// producer can never silently replace a stored result.
#[derive(Debug)]
pub struct SharedMap<V> {
    name: &'static str,
    values: DashMap<String, V>,
}

impl<V> SharedMap<V> {
    pub fn new(name: &'static str) -> Self {
        Self { name, values: DashMap::new() }
    }

    /// Store `value` under `key`. Returns false if the key was already written.
    pub fn put(&self, key: impl Into<String>, value: V) -> bool {
        match self.values.entry(key.into()) {
            Entry::Occupied(existing) => {
                warn!(store = self.name, key = %existing.key(), "Duplicate write refused");
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Move every entry out in key order. Call only after the join barrier.
    pub fn drain_sorted(&self) -> BTreeMap<String, V> {
        let keys: Vec<String> = self.values.iter().map(|entry| entry.key().clone()).collect();
        keys.into_iter()
            .filter_map(|key| self.values.remove(&key))
            .collect()
    }
}

/// Single-writer result holder.
#[derive(Debug)]
pub struct Slot<T> {
    value: Mutex<Option<T>>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self { value: Mutex::new(None) }
    }
}

impl<T> Slot<T> {
    /// Store the result. Returns false if the slot was already filled.
    pub async fn set(&self, value: T) -> bool {
        let mut guard = self.value.lock().await;
        if guard.is_some() {
            warn!("Result slot written twice, keeping the first value");
            return false;
        }
        *guard = Some(value);
        true
    }

    pub async fn take(&self) -> Option<T> {
        self.value.lock().await.take()
    }
}

#[derive(Debug, Default)]
struct TestLedger {
    expected: BTreeSet<String>,
    results: BTreeMap<String, PackageTestResult>,
    races: BTreeMap<String, Vec<String>>,
    coverage_sum: f64,
    sealed: bool,
}

/// Per-package test results and the running project-wide coverage average.
///
/// A result, its race findings and its coverage land in one critical section.
/// Every enumerated package counts toward the denominator, including those
/// whose coverage could not be measured and those whose job never finished.
#[derive(Debug, Default)]
pub struct CoverageAccumulator {
    ledger: Mutex<TestLedger>,
}

impl CoverageAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the packages assigned to test jobs.
    pub async fn expect<I, S>(&self, packages: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ledger = self.ledger.lock().await;
        ledger.expected.extend(packages.into_iter().map(Into::into));
    }

    /// Record one package. `None` coverage means it was not measurable.
    ///
    /// Returns false when the package was already recorded or the ledger has
    /// been finished.
    pub async fn record(
        &self,
        package: impl Into<String>,
        result: PackageTestResult,
        percent: Option<f64>,
        races: Vec<String>,
    ) -> bool {
        let package = package.into();
        let mut ledger = self.ledger.lock().await;
        if ledger.sealed {
            debug!(package = %package, "Test result arrived after the barrier, dropped");
            return false;
        }
        if ledger.results.contains_key(&package) {
            warn!(store = "test_results", key = %package, "Duplicate write refused");
            return false;
        }
        ledger.coverage_sum += percent.filter(|p| p.is_finite()).unwrap_or(0.0);
        if !races.is_empty() {
            ledger.races.insert(package.clone(), races);
        }
        ledger.results.insert(package, result);
        true
    }

    /// Seal the ledger and produce the unit-test summary.
    ///
    /// Expected packages without a result are entered as failed with
    /// unmeasured coverage.
    pub async fn finish(&self) -> UnitTestSummary {
        let mut ledger = self.ledger.lock().await;
        ledger.sealed = true;

        let mut per_package = std::mem::take(&mut ledger.results);
        let unfinished: Vec<String> = ledger
            .expected
            .iter()
            .filter(|package| !per_package.contains_key(package.as_str()))
            .cloned()
            .collect();
        if !unfinished.is_empty() {
            warn!(count = unfinished.len(), "Package tests did not finish, counted as failed");
        }
        for package in unfinished {
            per_package.insert(package, PackageTestResult::default());
        }

        UnitTestSummary {
            average_coverage: format_average(ledger.coverage_sum, per_package.len()),
            per_package,
            per_package_race_findings: std::mem::take(&mut ledger.races),
        }
    }
}

fn format_average(sum: f64, count: usize) -> String {
    if count == 0 {
        debug!("No packages considered for coverage, using sentinel average");
        return UNMEASURED_COVERAGE.to_string();
    }
    format!("{:.1}%", sum / count as f64)
}

/// One concurrent store per result kind, merged into the report after the barrier.
#[derive(Debug)]
pub struct ResultAggregator {
    pub unit_tests: CoverageAccumulator,
    pub complexity: SharedMap<ComplexityResult>,
    pub simplification_tips: SharedMap<Vec<String>>,
    pub static_scan_tips: SharedMap<Vec<String>>,
    pub duplicates: Slot<Vec<DuplicateBlock>>,
    pub dependency_graph: Slot<serde_json::Value>,
    pub dead_code: Slot<Vec<String>>,
    pub spelling_errors: Slot<serde_json::Value>,
    pub import_closure: Slot<Vec<String>>,
}

impl Default for ResultAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self {
            unit_tests: CoverageAccumulator::new(),
            complexity: SharedMap::new("complexity"),
            simplification_tips: SharedMap::new("simplification_tips"),
            static_scan_tips: SharedMap::new("static_scan_tips"),
            duplicates: Slot::default(),
            dependency_graph: Slot::default(),
            dead_code: Slot::default(),
            spelling_errors: Slot::default(),
            import_closure: Slot::default(),
        }
    }

    /// Move the stored results into a report and hand back the import
    /// closure for derivations.
    ///
    /// Fields whose producer never finished stay empty. Workers of a task
    /// dropped at its deadline may still hold a reference while they unwind,
    /// so the stores are drained rather than consumed.
    pub async fn build_report(&self, project: &str, runs: Vec<AnalyzerRun>) -> (AggregateReport, Vec<String>) {
        let report = AggregateReport {
            project: project.to_string(),
            unit_test: self.unit_tests.finish().await,
            complexity: self.complexity.drain_sorted(),
            simplification_tips: self.simplification_tips.drain_sorted(),
            static_scan_tips: self.static_scan_tips.drain_sorted(),
            duplicate_code_tips: self.duplicates.take().await.unwrap_or_default(),
            dependency_graph: self.dependency_graph.take().await.unwrap_or_default(),
            dead_code: self.dead_code.take().await.unwrap_or_default(),
            spelling_errors: self.spelling_errors.take().await.unwrap_or_default(),
            packages_without_tests: Vec::new(),
            score: 0,
            analyzer_runs: runs,
        };
        let closure = self.import_closure.take().await.unwrap_or_default();
        (report, closure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_shared_map_refuses_second_write() {
        let map = SharedMap::new("test");
        assert!(map.put("pkg", 1));
        assert!(!map.put("pkg", 2));
        assert_eq!(map.len(), 1);
        assert_eq!(map.drain_sorted().get("pkg"), Some(&1));
        assert!(map.is_empty());
    }

    #[test]
    fn test_shared_map_sorted_output() {
        let map = SharedMap::new("test");
        map.put("zeta", ());
        map.put("alpha", ());
        map.put("mid", ());
        let keys: Vec<String> = map.drain_sorted().into_keys().collect();
        assert_eq!(keys, vec!["alpha", "mid", "zeta"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_puts_lose_nothing() {
        let map = Arc::new(SharedMap::new("test"));
        let mut handles = Vec::new();
        for i in 0..64 {
            let map = map.clone();
            handles.push(tokio::spawn(async move {
                map.put(format!("pkg/{i:02}"), i);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(map.drain_sorted().len(), 64);
    }

    fn passed(coverage: &str) -> PackageTestResult {
        PackageTestResult {
            passed: true,
            elapsed_seconds: 0.1,
            coverage: coverage.into(),
        }
    }

    #[tokio::test]
    async fn test_coverage_counts_unmeasured_packages() {
        let coverage = CoverageAccumulator::new();
        coverage.record("a", passed("80.0%"), Some(80.0), Vec::new()).await;
        coverage.record("b", passed("40.0%"), Some(40.0), Vec::new()).await;
        coverage.record("c", PackageTestResult::default(), None, Vec::new()).await;
        coverage.record("d", PackageTestResult::default(), None, Vec::new()).await;

        let summary = coverage.finish().await;
        assert_eq!(summary.per_package.len(), 4);
        assert_eq!(summary.average_coverage, "30.0%");
    }

    #[tokio::test]
    async fn test_coverage_zero_packages_sentinel() {
        let coverage = CoverageAccumulator::new();
        assert_eq!(coverage.finish().await.average_coverage, "0%");
    }

    #[tokio::test]
    async fn test_coverage_ignores_non_finite() {
        let coverage = CoverageAccumulator::new();
        coverage.record("a", passed("NaN%"), Some(f64::NAN), Vec::new()).await;
        coverage.record("b", passed("50.0%"), Some(50.0), Vec::new()).await;
        assert_eq!(coverage.finish().await.average_coverage, "25.0%");
    }

    #[tokio::test]
    async fn test_unfinished_packages_stay_in_denominator() {
        let coverage = CoverageAccumulator::new();
        coverage.expect(["a", "b", "c", "d"]).await;
        coverage.record("a", passed("100.0%"), Some(100.0), Vec::new()).await;

        let summary = coverage.finish().await;
        assert_eq!(summary.average_coverage, "25.0%");
        assert_eq!(summary.per_package.len(), 4);
        assert_eq!(summary.per_package["d"], PackageTestResult::default());
    }

    #[tokio::test]
    async fn test_duplicate_and_late_records_refused() {
        let coverage = CoverageAccumulator::new();
        assert!(coverage.record("a", passed("10.0%"), Some(10.0), vec!["race".into()]).await);
        assert!(!coverage.record("a", passed("90.0%"), Some(90.0), Vec::new()).await);

        let summary = coverage.finish().await;
        assert_eq!(summary.average_coverage, "10.0%");
        assert_eq!(summary.per_package_race_findings["a"], vec!["race"]);
        assert!(!coverage.record("b", passed("50.0%"), Some(50.0), Vec::new()).await);
    }

    #[tokio::test]
    async fn test_build_report_defaults_for_missing_results() {
        let aggregator = ResultAggregator::new();
        aggregator.dead_code.set(vec!["main.go:3:6: unused func".into()]).await;
        aggregator.import_closure.set(vec!["a".into(), "b".into()]).await;

        let (report, closure) = aggregator.build_report("demo", Vec::new()).await;
        assert_eq!(report.project, "demo");
        assert_eq!(report.dead_code.len(), 1);
        assert!(report.duplicate_code_tips.is_empty());
        assert!(report.dependency_graph.is_null());
        assert_eq!(report.unit_test.average_coverage, "0%");
        assert_eq!(closure, vec!["a", "b"]);
    }
}
