use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use crate::errors::GradeError;
use crate::models::Package;
use tracing::debug;

/// Values substituted into tool command templates.
#[derive(Debug, Clone, Copy)]
pub struct CommandVariables<'a> {
    pub project: &'a Path,
    pub package: Option<&'a Package>,
}

impl<'a> CommandVariables<'a> {
    pub fn project(project: &'a Path) -> Self {
        Self { project, package: None }
    }

    pub fn package(project: &'a Path, package: &'a Package) -> Self {
        Self { project, package: Some(package) }
    }
}

/// Replace {{PROJECT}}, {{PACKAGE}} and {{PACKAGE_DIR}} in every argument.
/// Without a package, the package placeholders become the project root.
pub fn interpolate(argv: &[String], vars: &CommandVariables<'_>) -> Vec<String> {
    let project = vars.project.display().to_string();
    let (package, package_dir) = match vars.package {
        Some(pkg) => (pkg.relative_arg(), pkg.path.display().to_string()),
        None => (".".to_string(), project.clone()),
    };
    argv.iter()
        .map(|arg| {
            arg.replace("{{PROJECT}}", &project)
                .replace("{{PACKAGE_DIR}}", &package_dir)
                .replace("{{PACKAGE}}", &package)
        })
        .collect()
}

/// Run an external tool and return its combined stdout and stderr.
///
/// A non-zero exit status is not an error: linters exit non-zero when they
/// report findings. The child is killed if the returned future is dropped.
pub async fn run_tool(argv: &[String], cwd: &Path) -> Result<String, GradeError> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| GradeError::Analyzer("Empty tool command".into()))?;

    debug!(program = %program, args = ?args, cwd = %cwd.display(), "Running tool");

    let output = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                GradeError::Analyzer(format!("Tool not found on PATH: {}", program))
            }
            _ => GradeError::Analyzer(format!("Failed to run {}: {}", program, e)),
        })?;

    let mut collected = String::from_utf8_lossy(&output.stdout).into_owned();
    if !output.stderr.is_empty() {
        if !collected.is_empty() && !collected.ends_with('\n') {
            collected.push('\n');
        }
        collected.push_str(&String::from_utf8_lossy(&output.stderr));
    }

    debug!(
        program = %program,
        status = ?output.status.code(),
        bytes = collected.len(),
        "Tool finished"
    );
    Ok(collected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_interpolate_package_placeholders() {
        let project = Path::new("/src/app");
        let package = Package::new("api/v1", "/src/app/api/v1");
        let vars = CommandVariables::package(project, &package);
        let result = interpolate(&argv(&["tool", "{{PACKAGE}}", "--dir={{PACKAGE_DIR}}", "{{PROJECT}}"]), &vars);
        assert_eq!(result, vec!["tool", "./api/v1", "--dir=/src/app/api/v1", "/src/app"]);
    }

    #[test]
    fn test_interpolate_without_package_uses_project() {
        let vars = CommandVariables::project(Path::new("/src/app"));
        let result = interpolate(&argv(&["tool", "{{PACKAGE}}", "{{PACKAGE_DIR}}"]), &vars);
        assert_eq!(result, vec!["tool", ".", "/src/app"]);
    }

    #[test]
    fn test_interpolate_leaves_tool_templates_alone() {
        let vars = CommandVariables::project(Path::new("/src/app"));
        let result = interpolate(&argv(&["go", "list", "-f", "{{.Dir}}", "./..."]), &vars);
        assert_eq!(result[3], "{{.Dir}}");
    }

    #[tokio::test]
    async fn test_missing_tool_is_analyzer_error() {
        let err = run_tool(&argv(&["codegrade-no-such-tool-xyz"]), Path::new("."))
            .await
            .unwrap_err();
        assert!(matches!(err, GradeError::Analyzer(msg) if msg.contains("not found")));
    }

    #[tokio::test]
    async fn test_empty_command_is_error() {
        assert!(run_tool(&[], Path::new(".")).await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_captures_stdout_and_stderr() {
        let out = run_tool(&argv(&["sh", "-c", "echo out; echo err 1>&2; exit 3"]), Path::new("."))
            .await
            .unwrap();
        assert!(out.contains("out"));
        assert!(out.contains("err"));
    }
}
