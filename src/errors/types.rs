use thiserror::Error;

#[derive(Debug, Error)]
pub enum GradeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Package enumeration failed: {0}")]
    Enumeration(String),

    #[error("Analyzer error: {0}")]
    Analyzer(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Artifact write failed: {0}")]
    Artifact(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GradeError {
    /// Process exit status used by the binary for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            GradeError::Config(_) | GradeError::Yaml(_) | GradeError::Pattern(_) => 2,
            GradeError::Enumeration(_) => 3,
            GradeError::Artifact(_) => 4,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(GradeError::Config("bad".into()).exit_code(), 2);
        assert_eq!(GradeError::Enumeration("no dir".into()).exit_code(), 3);
        assert_eq!(GradeError::Template("x".into()).exit_code(), 1);
        assert_eq!(GradeError::Artifact("html: disk full".into()).exit_code(), 4);
        let pattern_err = glob::Pattern::new("[").unwrap_err();
        assert_eq!(GradeError::from(pattern_err).exit_code(), 2);
    }

    #[test]
    fn test_display_prefixes() {
        let err = GradeError::Enumeration("missing project".into());
        assert_eq!(err.to_string(), "Package enumeration failed: missing project");
    }
}
