use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::config::ExcludeSet;

pub const DEFAULT_TEST_FILE_SUFFIX: &str = "_test.go";
pub const DEFAULT_SOURCE_FILE_SUFFIX: &str = ".go";

/// Everything one orchestration run needs to know.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub project_path: PathBuf,
    pub exclude: ExcludeSet,
    /// Files ending with this mark a directory as a test package.
    pub test_file_suffix: String,
    pub source_file_suffix: String,
    /// Size of the package-test worker pool.
    pub workers: usize,
    /// Deadline applied to each top-level analyzer task.
    pub analyzer_timeout: Option<Duration>,
}

impl RunConfig {
    pub fn new(project_path: impl Into<PathBuf>) -> Self {
        Self {
            project_path: project_path.into(),
            exclude: ExcludeSet::default(),
            test_file_suffix: DEFAULT_TEST_FILE_SUFFIX.to_string(),
            source_file_suffix: DEFAULT_SOURCE_FILE_SUFFIX.to_string(),
            workers: default_workers(),
            analyzer_timeout: None,
        }
    }

    pub fn with_exclude(mut self, exclude: ExcludeSet) -> Self {
        self.exclude = exclude;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_analyzer_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.analyzer_timeout = timeout;
        self
    }
}

pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Last path segment of the resolved project path, used to name the report
/// and artifacts.
///
/// Expects a canonical path; a path ending in `..` or the filesystem root has
/// no usable segment and is named "project".
pub fn project_name(project_path: &Path) -> String {
    project_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_name_last_segment() {
        assert_eq!(project_name(Path::new("/home/dev/go/src/widget")), "widget");
        assert_eq!(project_name(Path::new("widget/")), "widget");
        assert_eq!(project_name(Path::new("a/b/c//")), "c");
    }

    #[test]
    fn test_project_name_of_canonical_relative_paths() {
        let dir = tempfile::TempDir::new().unwrap();
        let widget = dir.path().join("widget");
        std::fs::create_dir_all(widget.join("sub")).unwrap();

        let up = std::fs::canonicalize(widget.join("sub").join("..")).unwrap();
        assert_eq!(project_name(&up), "widget");
        let dotted = std::fs::canonicalize(widget.join(".")).unwrap();
        assert_eq!(project_name(&dotted), "widget");
    }

    #[test]
    fn test_project_name_without_segment() {
        assert_eq!(project_name(Path::new("/")), "project");
        assert_eq!(project_name(Path::new("a/..")), "project");
    }

    #[test]
    fn test_run_config_builders() {
        let config = RunConfig::new("/tmp/proj")
            .with_workers(0)
            .with_analyzer_timeout(Some(Duration::from_secs(30)));
        assert_eq!(config.workers, 1);
        assert_eq!(config.analyzer_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.test_file_suffix, "_test.go");
    }
}
