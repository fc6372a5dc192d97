use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use chrono::{DateTime, Utc};
use crate::config::ArtifactFormat;
use crate::errors::GradeError;
use crate::models::AggregateReport;
use super::template::{Template, TemplateSource};
use super::view::{ReportView, FIELDS};
use tracing::{error, info};

/// Timestamp embedded in artifact file names.
pub fn artifact_timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y%m%d%H%M%S").to_string()
}

/// `dest/filename` with every run of separators collapsed to one, or just
/// `filename` (current directory) without a destination.
pub fn artifact_path(dest: Option<&Path>, filename: &str) -> PathBuf {
    let Some(dest) = dest else {
        return PathBuf::from(filename);
    };
    let joined = format!("{}{}{}", dest.display(), MAIN_SEPARATOR, filename);
    let mut collapsed = String::with_capacity(joined.len());
    let mut previous_was_separator = false;
    for c in joined.chars() {
        let is_separator = c == '/' || c == MAIN_SEPARATOR;
        if is_separator && previous_was_separator {
            continue;
        }
        previous_was_separator = is_separator;
        collapsed.push(c);
    }
    PathBuf::from(collapsed)
}

/// Outcome of writing every requested artifact.
#[derive(Debug, Default)]
pub struct ArtifactSummary {
    pub written: Vec<PathBuf>,
    /// One message per artifact that could not be produced.
    pub failed: Vec<String>,
}

impl ArtifactSummary {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Persists a finished report as JSON and/or a rendered HTML document.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    dest: Option<PathBuf>,
    timestamp: String,
    template: TemplateSource,
}

impl ArtifactWriter {
    pub fn new(dest: Option<PathBuf>, timestamp: impl Into<String>) -> Self {
        Self {
            dest,
            timestamp: timestamp.into(),
            template: TemplateSource::Builtin,
        }
    }

    pub fn with_template(mut self, template: TemplateSource) -> Self {
        self.template = template;
        self
    }

    pub fn path_for(&self, report: &AggregateReport, extension: &str) -> PathBuf {
        let filename = format!("{}-{}.{}", report.project, self.timestamp, extension);
        artifact_path(self.dest.as_deref(), &filename)
    }

    async fn ensure_dest(&self) -> Result<(), GradeError> {
        if let Some(ref dest) = self.dest {
            tokio::fs::create_dir_all(dest).await?;
        }
        Ok(())
    }

    pub async fn write_json(&self, report: &AggregateReport) -> Result<PathBuf, GradeError> {
        let json = serde_json::to_vec_pretty(report)?;
        self.ensure_dest().await?;
        let path = self.path_for(report, "json");
        tokio::fs::write(&path, &json).await?;
        info!(path = %path.display(), bytes = json.len(), "Wrote JSON report");
        Ok(path)
    }

    pub async fn write_html(&self, report: &AggregateReport) -> Result<PathBuf, GradeError> {
        let html = self.render_html(report)?;
        self.ensure_dest().await?;
        let path = self.path_for(report, "html");
        tokio::fs::write(&path, html.as_bytes()).await?;
        info!(path = %path.display(), bytes = html.len(), "Wrote HTML report");
        Ok(path)
    }

    pub fn render_html(&self, report: &AggregateReport) -> Result<String, GradeError> {
        let source = self.template.load()?;
        let template = Template::parse(&source, FIELDS)?;
        let generated_at = Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();
        let view = ReportView::new(report, &generated_at);
        template.render(view.values())
    }

    /// Write every artifact `format` selects. A failure in one never prevents
    /// the others.
    pub async fn write_all(&self, report: &AggregateReport, format: ArtifactFormat) -> ArtifactSummary {
        let mut summary = ArtifactSummary::default();

        if format.includes_json() {
            match self.write_json(report).await {
                Ok(path) => summary.written.push(path),
                Err(e) => {
                    error!(error = %e, "Failed to write JSON report");
                    summary.failed.push(format!("json: {}", e));
                }
            }
        }
        if format.includes_html() {
            match self.write_html(report).await {
                Ok(path) => summary.written.push(path),
                Err(e) => {
                    error!(error = %e, "Failed to write HTML report");
                    summary.failed.push(format!("html: {}", e));
                }
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_artifact_timestamp() {
        let at = Utc.with_ymd_and_hms(2026, 3, 7, 9, 5, 1).unwrap();
        assert_eq!(artifact_timestamp(at), "20260307090501");
    }

    #[cfg(unix)]
    #[test]
    fn test_artifact_path_collapses_separators() {
        assert_eq!(
            artifact_path(Some(Path::new("/tmp/reports/")), "demo-1.json"),
            PathBuf::from("/tmp/reports/demo-1.json")
        );
        assert_eq!(
            artifact_path(Some(Path::new("/tmp//reports///")), "demo-1.json"),
            PathBuf::from("/tmp/reports/demo-1.json")
        );
    }

    #[test]
    fn test_artifact_path_without_dest() {
        assert_eq!(artifact_path(None, "demo-1.html"), PathBuf::from("demo-1.html"));
    }

    #[test]
    fn test_render_builtin_template() {
        let mut report = AggregateReport::new("demo");
        report.score = 72;
        let writer = ArtifactWriter::new(None, "20260101000000");
        let html = writer.render_html(&report).unwrap();
        assert!(html.contains("<h1>demo</h1>"));
        assert!(html.contains("grade-C"));
        assert!(!html.contains("{{"));
    }

    #[tokio::test]
    async fn test_write_all_creates_destination() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("nested/out");
        let writer = ArtifactWriter::new(Some(dest.clone()), "20260101000000");

        let summary = writer.write_all(&AggregateReport::new("demo"), ArtifactFormat::All).await;
        assert!(summary.is_complete());
        assert_eq!(summary.written.len(), 2);
        assert!(dest.join("demo-20260101000000.json").exists());
        assert!(dest.join("demo-20260101000000.html").exists());
    }
}
