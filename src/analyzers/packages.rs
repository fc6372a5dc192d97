use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};
use crate::config::ExcludeSet;
use crate::errors::GradeError;
use crate::models::{package_id, Package};
use tracing::debug;

/// Directory names never treated as project packages.
const SKIPPED_DIRS: [&str; 4] = ["vendor", "testdata", "node_modules", "target"];

/// Find every directory under `project` holding at least one file whose name
/// ends with `file_suffix`, skipping hidden, tool-owned and excluded directories.
///
/// Packages come back sorted by id.
pub fn discover_packages(
    project: &Path,
    file_suffix: &str,
    exclude: &ExcludeSet,
) -> Result<Vec<Package>, GradeError> {
    if !project.is_dir() {
        return Err(GradeError::Enumeration(format!(
            "Project path is not a directory: {}",
            project.display()
        )));
    }

    let mut packages: BTreeMap<String, PathBuf> = BTreeMap::new();
    let walker = WalkDir::new(project)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| keep_entry(project, entry, exclude));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(GradeError::Enumeration(format!(
                    "Cannot read project {}: {}",
                    project.display(),
                    e
                )));
            }
            Err(e) => {
                debug!(error = %e, "Skipping unreadable path");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.ends_with(file_suffix));
        if !matches {
            continue;
        }
        if let Some(dir) = entry.path().parent() {
            packages
                .entry(package_id(project, dir))
                .or_insert_with(|| dir.to_path_buf());
        }
    }

    debug!(project = %project.display(), suffix = file_suffix, count = packages.len(), "Packages discovered");
    Ok(packages
        .into_iter()
        .map(|(id, path)| Package::new(id, path))
        .collect())
}

fn keep_entry(project: &Path, entry: &DirEntry, exclude: &ExcludeSet) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return true;
    }
    let name = entry.file_name().to_string_lossy();
    if name.starts_with('.') || name.starts_with('_') || SKIPPED_DIRS.contains(&name.as_ref()) {
        return false;
    }
    !exclude.is_excluded(&package_id(project, entry.path()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "package x\n").unwrap();
    }

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "main.go");
        touch(root, "main_test.go");
        touch(root, "api/handler.go");
        touch(root, "api/handler_test.go");
        touch(root, "store/db.go");
        touch(root, "store/mocks/db_mock.go");
        touch(root, "vendor/dep/dep.go");
        touch(root, "vendor/dep/dep_test.go");
        touch(root, ".git/hooks/pre_test.go");
        touch(root, "docs/README.md");
        dir
    }

    #[test]
    fn test_discovers_test_packages() {
        let dir = fixture();
        let packages = discover_packages(dir.path(), "_test.go", &ExcludeSet::default()).unwrap();
        let ids: Vec<&str> = packages.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec![".", "api"]);
    }

    #[test]
    fn test_discovers_source_packages_with_exclusions() {
        let dir = fixture();
        let exclude = ExcludeSet::parse("*/mocks").unwrap();
        let packages = discover_packages(dir.path(), ".go", &exclude).unwrap();
        let ids: Vec<&str> = packages.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec![".", "api", "store"]);
        assert_eq!(packages[1].path, dir.path().join("api"));
    }

    #[test]
    fn test_missing_project_is_enumeration_error() {
        let err = discover_packages(Path::new("/no/such/project"), ".go", &ExcludeSet::default())
            .unwrap_err();
        assert!(matches!(err, GradeError::Enumeration(_)));
    }
}
