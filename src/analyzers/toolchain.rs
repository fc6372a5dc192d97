use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use async_trait::async_trait;
use serde_json::Value;
use crate::config::{AnalyzersConfig, ExcludeSet, ToolConfig};
use crate::errors::GradeError;
use crate::models::{AnalyzerKind, ComplexityResult, DuplicateBlock, Package, TestRun};
use super::command::{interpolate, run_tool, CommandVariables};
use super::packages::discover_packages;
use super::parse;
use super::Analyzers;
use crate::pipeline::state::{DEFAULT_SOURCE_FILE_SUFFIX, DEFAULT_TEST_FILE_SUFFIX};
use tracing::{debug, info, warn};

/// Stock command line for each analyzer, targeting the Go toolchain.
pub fn default_command(kind: AnalyzerKind) -> Vec<String> {
    let argv: &[&str] = match kind {
        AnalyzerKind::UnitTest => &["go", "test", "-race", "-cover", "{{PACKAGE}}"],
        AnalyzerKind::Complexity => &["gocyclo", "{{PACKAGE_DIR}}"],
        AnalyzerKind::Simplification => &["staticcheck", "-checks", "S1*", "./..."],
        AnalyzerKind::Duplicates => &["dupl", "-plumbing", "-t", "50", "."],
        AnalyzerKind::StaticScan => &["go", "vet", "./..."],
        AnalyzerKind::DependencyGraph => &[
            "go",
            "list",
            "-f",
            "{{.ImportPath}} {{join .Imports \" \"}}",
            "./...",
        ],
        AnalyzerKind::DeadCode => &["staticcheck", "-checks", "U1000", "./..."],
        AnalyzerKind::Spelling => &["misspell", "."],
        AnalyzerKind::ImportClosure => &["go", "list", "-f", "{{.Dir}}", "./..."],
    };
    argv.iter().map(|s| s.to_string()).collect()
}

/// Analyzers backed by external command-line tools.
///
/// Every tool runs with the project as working directory. A disabled or
/// failing tool degrades to the empty result for its kind.
#[derive(Debug, Clone)]
pub struct ToolchainAnalyzers {
    commands: BTreeMap<AnalyzerKind, Vec<String>>,
    test_file_suffix: String,
    source_file_suffix: String,
}

impl Default for ToolchainAnalyzers {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ToolchainAnalyzers {
    pub fn new(config: Option<&AnalyzersConfig>) -> Self {
        let mut commands = BTreeMap::new();
        for kind in AnalyzerKind::ALL {
            let tool = config.and_then(|c| tool_config(c, kind));
            if tool.and_then(|t| t.enabled) == Some(false) {
                info!(kind = %kind, "Analyzer disabled by configuration");
                continue;
            }
            let argv = tool
                .and_then(|t| t.command.clone())
                .unwrap_or_else(|| default_command(kind));
            commands.insert(kind, argv);
        }
        Self {
            commands,
            test_file_suffix: DEFAULT_TEST_FILE_SUFFIX.to_string(),
            source_file_suffix: DEFAULT_SOURCE_FILE_SUFFIX.to_string(),
        }
    }

    pub fn with_suffixes(mut self, test_file_suffix: &str, source_file_suffix: &str) -> Self {
        self.test_file_suffix = test_file_suffix.to_string();
        self.source_file_suffix = source_file_suffix.to_string();
        self
    }

    pub fn is_enabled(&self, kind: AnalyzerKind) -> bool {
        self.commands.contains_key(&kind)
    }

    pub fn command(&self, kind: AnalyzerKind) -> Option<&[String]> {
        self.commands.get(&kind).map(Vec::as_slice)
    }

    /// Run the tool for `kind` and return its output, or `None` when it is
    /// disabled or could not run.
    async fn capture(&self, kind: AnalyzerKind, vars: CommandVariables<'_>) -> Option<String> {
        let Some(argv) = self.command(kind) else {
            debug!(kind = %kind, "Analyzer disabled, skipping");
            return None;
        };
        let argv = interpolate(argv, &vars);
        match run_tool(&argv, vars.project).await {
            Ok(output) => Some(output),
            Err(e) => {
                warn!(kind = %kind, error = %e, "Analyzer failed, contributing no findings");
                None
            }
        }
    }

    async fn discover(
        &self,
        project: &Path,
        suffix: &str,
        exclude: &ExcludeSet,
    ) -> Result<Vec<Package>, GradeError> {
        let project: PathBuf = project.to_path_buf();
        let suffix = suffix.to_string();
        let exclude = exclude.clone();
        tokio::task::spawn_blocking(move || discover_packages(&project, &suffix, &exclude))
            .await
            .map_err(|e| GradeError::Internal(format!("Package discovery task failed: {}", e)))?
    }
}

fn tool_config(config: &AnalyzersConfig, kind: AnalyzerKind) -> Option<&ToolConfig> {
    match kind {
        AnalyzerKind::UnitTest => config.unit_test.as_ref(),
        AnalyzerKind::Complexity => config.complexity.as_ref(),
        AnalyzerKind::Simplification => config.simplification.as_ref(),
        AnalyzerKind::Duplicates => config.duplicates.as_ref(),
        AnalyzerKind::StaticScan => config.static_scan.as_ref(),
        AnalyzerKind::DependencyGraph => config.dependency_graph.as_ref(),
        AnalyzerKind::DeadCode => config.dead_code.as_ref(),
        AnalyzerKind::Spelling => config.spelling.as_ref(),
        AnalyzerKind::ImportClosure => config.import_closure.as_ref(),
    }
}

#[async_trait]
impl Analyzers for ToolchainAnalyzers {
    async fn list_test_packages(
        &self,
        project: &Path,
        exclude: &ExcludeSet,
    ) -> Result<Vec<Package>, GradeError> {
        self.discover(project, &self.test_file_suffix, exclude).await
    }

    async fn list_source_packages(
        &self,
        project: &Path,
        exclude: &ExcludeSet,
    ) -> Result<Vec<Package>, GradeError> {
        self.discover(project, &self.source_file_suffix, exclude).await
    }

    async fn run_tests(&self, project: &Path, package: &Package) -> TestRun {
        self.capture(AnalyzerKind::UnitTest, CommandVariables::package(project, package))
            .await
            .map(|output| parse::parse_test_output(&output))
            .unwrap_or_default()
    }

    async fn compute_complexity(&self, project: &Path, package: &Package) -> ComplexityResult {
        self.capture(AnalyzerKind::Complexity, CommandVariables::package(project, package))
            .await
            .map(|output| parse::parse_complexity_output(&output))
            .unwrap_or_default()
    }

    async fn find_simplifications(&self, project: &Path) -> Vec<String> {
        self.capture(AnalyzerKind::Simplification, CommandVariables::project(project))
            .await
            .map(|output| parse::parse_located_findings(&output))
            .unwrap_or_default()
    }

    async fn find_duplicates(&self, project: &Path, exclude_suffix: &str) -> Vec<DuplicateBlock> {
        self.capture(AnalyzerKind::Duplicates, CommandVariables::project(project))
            .await
            .map(|output| parse::parse_duplicates(&output, exclude_suffix))
            .unwrap_or_default()
    }

    async fn static_scan(&self, project: &Path) -> Vec<String> {
        self.capture(AnalyzerKind::StaticScan, CommandVariables::project(project))
            .await
            .map(|output| parse::parse_located_findings(&output))
            .unwrap_or_default()
    }

    async fn build_dependency_graph(&self, project: &Path, exclude: &ExcludeSet) -> Value {
        self.capture(AnalyzerKind::DependencyGraph, CommandVariables::project(project))
            .await
            .map(|output| parse::parse_dependency_listing(&output, exclude))
            .unwrap_or(Value::Null)
    }

    async fn find_dead_code(&self, project: &Path) -> Vec<String> {
        self.capture(AnalyzerKind::DeadCode, CommandVariables::project(project))
            .await
            .map(|output| parse::parse_located_findings(&output))
            .unwrap_or_default()
    }

    async fn check_spelling(&self, project: &Path, exclude: &ExcludeSet) -> Value {
        self.capture(AnalyzerKind::Spelling, CommandVariables::project(project))
            .await
            .map(|output| parse::parse_spelling(&output, project, exclude))
            .unwrap_or(Value::Null)
    }

    async fn list_imported_packages(&self, project: &Path, exclude: &ExcludeSet) -> Vec<String> {
        if !self.is_enabled(AnalyzerKind::ImportClosure) {
            info!("Import closure disabled, no packages reported as untested");
            return Vec::new();
        }
        let listed = self
            .capture(AnalyzerKind::ImportClosure, CommandVariables::project(project))
            .await
            .map(|output| parse::parse_package_dirs(&output, project, exclude))
            .unwrap_or_default();
        if !listed.is_empty() {
            return listed;
        }

        info!("Import listing empty, falling back to source package discovery");
        match self.list_source_packages(project, exclude).await {
            Ok(packages) => packages.into_iter().map(|p| p.id).collect(),
            Err(e) => {
                warn!(error = %e, "Could not list source packages for the import closure");
                Vec::new()
            }
        }
    }
}
