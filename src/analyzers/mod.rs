pub mod command;
pub mod packages;
pub mod parse;
pub mod toolchain;

use std::path::Path;
use async_trait::async_trait;
use crate::config::ExcludeSet;
use crate::errors::GradeError;
use crate::models::{ComplexityResult, DuplicateBlock, Package, TestRun};

pub use packages::discover_packages;
pub use toolchain::ToolchainAnalyzers;

/// The external analysis tools a run consumes.
///
/// Only package enumeration may fail. Every other method swallows its own
/// errors, logs them and returns the zero value for its result kind.
#[async_trait]
pub trait Analyzers: Send + Sync {
    /// Packages holding at least one test file. Failure aborts the run.
    async fn list_test_packages(
        &self,
        project: &Path,
        exclude: &ExcludeSet,
    ) -> Result<Vec<Package>, GradeError>;

    /// Packages holding at least one source file.
    async fn list_source_packages(
        &self,
        project: &Path,
        exclude: &ExcludeSet,
    ) -> Result<Vec<Package>, GradeError>;

    /// Run one package's tests with coverage and race detection.
    async fn run_tests(&self, project: &Path, package: &Package) -> TestRun;

    async fn compute_complexity(&self, project: &Path, package: &Package) -> ComplexityResult;

    /// `"location: message"` simplification hints for the whole project.
    async fn find_simplifications(&self, project: &Path) -> Vec<String>;

    /// Duplicated block groups, ignoring files ending in `exclude_suffix`.
    async fn find_duplicates(&self, project: &Path, exclude_suffix: &str) -> Vec<DuplicateBlock>;

    /// `"location: message"` static bug-pattern findings.
    async fn static_scan(&self, project: &Path) -> Vec<String>;

    async fn build_dependency_graph(&self, project: &Path, exclude: &ExcludeSet) -> serde_json::Value;

    async fn find_dead_code(&self, project: &Path) -> Vec<String>;

    async fn check_spelling(&self, project: &Path, exclude: &ExcludeSet) -> serde_json::Value;

    /// Ids of every package in the project's import closure.
    async fn list_imported_packages(&self, project: &Path, exclude: &ExcludeSet) -> Vec<String>;
}
