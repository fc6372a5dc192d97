use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

/// Id used for the package at the project root.
pub const ROOT_PACKAGE: &str = ".";

/// A directory-level unit of analysis inside the project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Package {
    /// Project-relative directory with `/` separators, "." for the root.
    pub id: String,
    /// Absolute (or project-joined) directory path.
    pub path: PathBuf,
}

impl Package {
    pub fn new(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self { id: id.into(), path: path.into() }
    }

    /// Build a package from a directory inside `project_root`.
    pub fn from_dir(project_root: &Path, dir: &Path) -> Self {
        Self::new(package_id(project_root, dir), dir)
    }

    /// "./rel" form understood by most toolchains.
    pub fn relative_arg(&self) -> String {
        if self.id == ROOT_PACKAGE {
            ".".to_string()
        } else {
            format!("./{}", self.id)
        }
    }
}

/// Compute the package id of `dir` relative to `project_root`.
///
/// Directories outside the project keep their full path so they never collide
/// with project packages.
pub fn package_id(project_root: &Path, dir: &Path) -> String {
    let relative = dir.strip_prefix(project_root).unwrap_or(dir);
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            std::path::Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            std::path::Component::RootDir => Some(String::new()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        ROOT_PACKAGE.to_string()
    } else {
        parts.join("/")
    }
}

/// Package id of a finding location such as `pkg/file.go` or `/abs/project/pkg/file.go`.
///
/// Relative locations are taken relative to the project root.
pub fn package_of_location(project_root: &Path, location: &str) -> String {
    let location = location.trim();
    let location = location.strip_prefix("./").unwrap_or(location);
    let dir = Path::new(location).parent().unwrap_or(Path::new(""));
    if dir.is_absolute() {
        package_id(project_root, dir)
    } else {
        package_id(Path::new(""), dir)
    }
}

/// Raw tokens of a test tool's summary line for one package.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestOutcome {
    /// "ok" on success, anything else is a failure.
    pub status: String,
    /// Elapsed time with a unit suffix, e.g. "0.012s".
    pub elapsed: String,
    /// Coverage percentage, e.g. "85.0%"; empty when the tool printed none.
    pub coverage: String,
}

/// Everything a test adapter reports for one package.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestRun {
    pub outcome: Option<TestOutcome>,
    pub races: Vec<String>,
}
