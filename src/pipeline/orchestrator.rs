use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use crate::analyzers::parse::split_location;
use crate::analyzers::Analyzers;
use crate::errors::GradeError;
use crate::models::{
    package_of_location, AggregateReport, AnalyzerKind, Package, PackageTestResult, TestOutcome,
    UNMEASURED_COVERAGE,
};
use crate::scoring;
use super::aggregator::ResultAggregator;
use super::events::RunEvent;
use super::state::{project_name, RunConfig};
use super::tasks::{for_each_bounded, TaskGroup};
use tracing::{debug, error, info, warn};

/// Drives one assessment: enumerate, fan out every analyzer, wait for all of
/// them, then assemble and score the report.
pub struct Orchestrator {
    config: RunConfig,
    analyzers: Arc<dyn Analyzers>,
    cancel_token: CancellationToken,
    event_tx: Option<mpsc::UnboundedSender<RunEvent>>,
}

impl Orchestrator {
    pub fn new(config: RunConfig, analyzers: Arc<dyn Analyzers>) -> Self {
        Self {
            config,
            analyzers,
            cancel_token: CancellationToken::new(),
            event_tx: None,
        }
    }

    /// Replace the internal cancel token with an external one (e.g. wired to Ctrl-C).
    /// Cancelling stops pending analyzers; the report is still assembled from what finished.
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = token;
        self
    }

    /// Attach an event channel for streaming run events to a progress display.
    pub fn with_event_channel(mut self, tx: mpsc::UnboundedSender<RunEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    fn emit(&self, event: RunEvent) {
        if let Some(ref tx) = self.event_tx {
            let _ = tx.send(event);
        }
    }

    pub async fn run(&self) -> Result<AggregateReport, GradeError> {
        let started = Instant::now();

        let project = match self.resolve_project().await {
            Ok(path) => path,
            Err(e) => {
                self.emit(RunEvent::RunFailed { error: e.to_string() });
                return Err(e);
            }
        };
        let project_name = project_name(&project);
        info!(
            project = %project.display(),
            exclude = ?self.config.exclude.patterns().collect::<Vec<_>>(),
            "Assessment started"
        );

        let test_packages = match self
            .analyzers
            .list_test_packages(&project, &self.config.exclude)
            .await
        {
            Ok(packages) => packages,
            Err(e) => {
                error!(error = %e, "Could not enumerate test packages");
                self.emit(RunEvent::RunFailed { error: e.to_string() });
                return Err(e);
            }
        };
        info!(count = test_packages.len(), "Test packages enumerated");
        self.emit(RunEvent::RunStarted {
            project: project_name.clone(),
            test_packages: test_packages.len(),
        });

        let project = Arc::new(project);
        let aggregator = Arc::new(ResultAggregator::new());
        aggregator
            .unit_tests
            .expect(test_packages.iter().map(|package| package.id.clone()))
            .await;
        let mut group = TaskGroup::new(self.cancel_token.clone())
            .with_deadline(self.config.analyzer_timeout)
            .with_event_channel(self.event_tx.clone());

        self.spawn_unit_tests(&mut group, &project, &aggregator, test_packages);
        self.spawn_complexity(&mut group, &project, &aggregator);
        self.spawn_project_analyzers(&mut group, &project, &aggregator);

        let runs = group.join_all().await;
        for run in runs.iter().filter(|run| !run.status.is_completed()) {
            warn!(kind = %run.kind, status = %run.status, "Analyzer did not complete, its results are missing");
        }

        let (mut report, closure) = aggregator.build_report(&project_name, runs).await;
        report.packages_without_tests = untested_packages(&closure, &report.unit_test.per_package);
        let score = scoring::grade(&mut report);

        let duration_ms = started.elapsed().as_millis() as u64;
        info!(
            score,
            packages = report.unit_test.per_package.len(),
            untested = report.packages_without_tests.len(),
            duration_ms,
            "Assessment complete"
        );
        self.emit(RunEvent::RunCompleted { score, duration_ms });
        Ok(report)
    }

    async fn resolve_project(&self) -> Result<PathBuf, GradeError> {
        let path = &self.config.project_path;
        tokio::fs::canonicalize(path).await.map_err(|e| {
            GradeError::Enumeration(format!("Cannot resolve project path {}: {}", path.display(), e))
        })
    }

    fn spawn_unit_tests(
        &self,
        group: &mut TaskGroup,
        project: &Arc<PathBuf>,
        aggregator: &Arc<ResultAggregator>,
        packages: Vec<Package>,
    ) {
        let analyzers = self.analyzers.clone();
        let project = project.clone();
        let aggregator = aggregator.clone();
        let event_tx = self.event_tx.clone();
        let workers = self.config.workers;

        group.spawn(AnalyzerKind::UnitTest, async move {
            let tested = for_each_bounded(packages, workers, move |package: Package| {
                let analyzers = analyzers.clone();
                let project = project.clone();
                let aggregator = aggregator.clone();
                let event_tx = event_tx.clone();
                async move {
                    let run = analyzers.run_tests(&project, &package).await;
                    let (result, coverage) = to_test_result(&package.id, run.outcome.as_ref());
                    let passed = result.passed;

                    if !run.races.is_empty() {
                        warn!(package = %package.id, races = run.races.len(), "Data races reported");
                    }
                    aggregator
                        .unit_tests
                        .record(package.id.clone(), result, coverage, run.races)
                        .await;
                    if let Some(tx) = event_tx {
                        let _ = tx.send(RunEvent::PackageTested { package: package.id, passed });
                    }
                }
            })
            .await;
            debug!(tested, "Package tests finished");
        });
    }

    fn spawn_complexity(
        &self,
        group: &mut TaskGroup,
        project: &Arc<PathBuf>,
        aggregator: &Arc<ResultAggregator>,
    ) {
        let analyzers = self.analyzers.clone();
        let project = project.clone();
        let aggregator = aggregator.clone();
        let exclude = self.config.exclude.clone();
        let workers = self.config.workers;

        group.spawn(AnalyzerKind::Complexity, async move {
            let packages = match analyzers.list_source_packages(&project, &exclude).await {
                Ok(packages) => packages,
                Err(e) => {
                    warn!(error = %e, "Could not list source packages, complexity skipped");
                    return;
                }
            };
            for_each_bounded(packages, workers, move |package: Package| {
                let analyzers = analyzers.clone();
                let project = project.clone();
                let aggregator = aggregator.clone();
                async move {
                    let result = analyzers.compute_complexity(&project, &package).await;
                    aggregator.complexity.put(package.id, result);
                }
            })
            .await;
        });
    }

    /// Whole-project analyzers, one task each.
    fn spawn_project_analyzers(
        &self,
        group: &mut TaskGroup,
        project: &Arc<PathBuf>,
        aggregator: &Arc<ResultAggregator>,
    ) {
        let exclude = self.config.exclude.clone();
        let test_suffix = self.config.test_file_suffix.clone();

        let (analyzers, project_dir, store) = (self.analyzers.clone(), project.clone(), aggregator.clone());
        group.spawn(AnalyzerKind::Simplification, async move {
            let tips = analyzers.find_simplifications(&project_dir).await;
            for (package, tips) in bucket_by_package(&project_dir, tips) {
                store.simplification_tips.put(package, tips);
            }
        });

        let (analyzers, project_dir, store) = (self.analyzers.clone(), project.clone(), aggregator.clone());
        group.spawn(AnalyzerKind::StaticScan, async move {
            let findings = analyzers.static_scan(&project_dir).await;
            for (package, findings) in bucket_by_package(&project_dir, findings) {
                store.static_scan_tips.put(package, findings);
            }
        });

        let (analyzers, project_dir, store) = (self.analyzers.clone(), project.clone(), aggregator.clone());
        group.spawn(AnalyzerKind::Duplicates, async move {
            let blocks = analyzers.find_duplicates(&project_dir, &test_suffix).await;
            store.duplicates.set(blocks).await;
        });

        let (analyzers, project_dir, store) = (self.analyzers.clone(), project.clone(), aggregator.clone());
        let graph_exclude = exclude.clone();
        group.spawn(AnalyzerKind::DependencyGraph, async move {
            let graph = analyzers.build_dependency_graph(&project_dir, &graph_exclude).await;
            store.dependency_graph.set(graph).await;
        });

        let (analyzers, project_dir, store) = (self.analyzers.clone(), project.clone(), aggregator.clone());
        group.spawn(AnalyzerKind::DeadCode, async move {
            let unused = analyzers.find_dead_code(&project_dir).await;
            store.dead_code.set(unused).await;
        });

        let (analyzers, project_dir, store) = (self.analyzers.clone(), project.clone(), aggregator.clone());
        let spelling_exclude = exclude.clone();
        group.spawn(AnalyzerKind::Spelling, async move {
            let misspelled = analyzers.check_spelling(&project_dir, &spelling_exclude).await;
            store.spelling_errors.set(misspelled).await;
        });

        let (analyzers, project_dir, store) = (self.analyzers.clone(), project.clone(), aggregator.clone());
        group.spawn(AnalyzerKind::ImportClosure, async move {
            let closure = analyzers.list_imported_packages(&project_dir, &exclude).await;
            store.import_closure.set(closure).await;
        });
    }
}

/// Interpret a test tool's raw summary tokens.
///
/// Returns the stored result and the coverage to feed the project average;
/// `None` coverage still counts toward the denominator.
pub fn to_test_result(package: &str, outcome: Option<&TestOutcome>) -> (PackageTestResult, Option<f64>) {
    let Some(outcome) = outcome else {
        debug!(package = %package, "No test summary reported");
        return (PackageTestResult::default(), None);
    };

    let elapsed_seconds = match outcome.elapsed.trim().trim_end_matches('s').parse::<f64>() {
        Ok(secs) if secs.is_finite() && secs >= 0.0 => secs,
        _ => {
            warn!(package = %package, elapsed = %outcome.elapsed, "Malformed elapsed time, using 0");
            0.0
        }
    };

    let percent = outcome
        .coverage
        .trim()
        .strip_suffix('%')
        .and_then(|pct| pct.parse::<f64>().ok())
        .filter(|pct| pct.is_finite());
    let coverage = match percent {
        Some(_) => outcome.coverage.trim().to_string(),
        None => {
            if !outcome.coverage.is_empty() {
                warn!(package = %package, coverage = %outcome.coverage, "Unparsable coverage, counted as 0");
            }
            UNMEASURED_COVERAGE.to_string()
        }
    };

    let result = PackageTestResult {
        passed: outcome.status == "ok",
        elapsed_seconds,
        coverage,
    };
    (result, percent)
}

/// Group `"location: message"` findings by the package of their location.
pub fn bucket_by_package(project: &Path, findings: Vec<String>) -> BTreeMap<String, Vec<String>> {
    let mut buckets: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for finding in findings {
        let Some((location, _)) = split_location(&finding) else {
            warn!(finding = %finding, "Finding without a location, dropped");
            continue;
        };
        let package = package_of_location(project, location);
        buckets.entry(package).or_default().push(finding);
    }
    buckets
}

/// Packages of the import closure with no test result, in closure order.
pub fn untested_packages(
    closure: &[String],
    tested: &BTreeMap<String, PackageTestResult>,
) -> Vec<String> {
    let mut seen = HashSet::new();
    closure
        .iter()
        .filter(|package| !tested.contains_key(package.as_str()))
        .filter(|package| seen.insert(package.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(status: &str, elapsed: &str, coverage: &str) -> TestOutcome {
        TestOutcome {
            status: status.into(),
            elapsed: elapsed.into(),
            coverage: coverage.into(),
        }
    }

    #[test]
    fn test_passing_outcome() {
        let (result, coverage) = to_test_result("calc", Some(&outcome("ok", "0.012s", "85.0%")));
        assert!(result.passed);
        assert!((result.elapsed_seconds - 0.012).abs() < 1e-9);
        assert_eq!(result.coverage, "85.0%");
        assert_eq!(coverage, Some(85.0));
    }

    #[test]
    fn test_malformed_elapsed_is_zero() {
        let (result, _) = to_test_result("calc", Some(&outcome("FAIL", "(cached)", "")));
        assert!(!result.passed);
        assert_eq!(result.elapsed_seconds, 0.0);
    }

    #[test]
    fn test_unmeasured_coverage() {
        let (result, coverage) = to_test_result("types", Some(&outcome("ok", "0.1s", "")));
        assert_eq!(result.coverage, "0%");
        assert_eq!(coverage, None);

        let (result, coverage) = to_test_result("types", Some(&outcome("ok", "0.1s", "abc%")));
        assert_eq!(result.coverage, "0%");
        assert_eq!(coverage, None);
    }

    #[test]
    fn test_missing_outcome() {
        let (result, coverage) = to_test_result("gone", None);
        assert_eq!(result, PackageTestResult::default());
        assert_eq!(coverage, None);
    }

    #[test]
    fn test_bucket_by_package() {
        let findings = vec![
            "api/h.go:10:2: should omit nil check".to_string(),
            "./api/x.go:3:1: should use strings.Contains".to_string(),
            "main.go:7:9: should merge declarations".to_string(),
            "exit status 1".to_string(),
        ];
        let buckets = bucket_by_package(Path::new("/src/app"), findings);
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets["api"].len(), 2);
        assert_eq!(buckets["."].len(), 1);
    }

    #[test]
    fn test_untested_packages_preserves_order() {
        let closure: Vec<String> = ["zeta", "api", "store", "api", "cmd"].iter().map(|s| s.to_string()).collect();
        let mut tested = BTreeMap::new();
        tested.insert("api".to_string(), PackageTestResult::default());

        assert_eq!(untested_packages(&closure, &tested), vec!["zeta", "store", "cmd"]);
    }
}
