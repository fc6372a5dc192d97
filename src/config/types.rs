use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct GradeConfig {
    /// Package exclusion patterns (globs over package ids).
    pub exclude: Option<Vec<String>>,
    pub scan: Option<ScanConfig>,
    pub output: Option<OutputConfig>,
    pub analyzers: Option<AnalyzersConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ScanConfig {
    pub test_file_suffix: Option<String>,
    pub source_file_suffix: Option<String>,
    pub workers: Option<usize>,
    pub analyzer_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct OutputConfig {
    pub directory: Option<String>,
    pub format: Option<ArtifactFormat>,
    pub template: Option<String>,
}

/// Which artifacts a run writes.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactFormat {
    Html,
    Json,
    #[default]
    All,
}

impl ArtifactFormat {
    pub fn includes_json(&self) -> bool {
        matches!(self, ArtifactFormat::Json | ArtifactFormat::All)
    }

    pub fn includes_html(&self) -> bool {
        matches!(self, ArtifactFormat::Html | ArtifactFormat::All)
    }
}

impl std::str::FromStr for ArtifactFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "html" => Ok(ArtifactFormat::Html),
            "json" => Ok(ArtifactFormat::Json),
            "all" | "both" => Ok(ArtifactFormat::All),
            other => Err(format!("Unknown format '{}'. Valid formats: html, json, all", other)),
        }
    }
}

impl std::fmt::Display for ArtifactFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactFormat::Html => write!(f, "html"),
            ArtifactFormat::Json => write!(f, "json"),
            ArtifactFormat::All => write!(f, "all"),
        }
    }
}

/// Per-analyzer command overrides.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AnalyzersConfig {
    pub unit_test: Option<ToolConfig>,
    pub complexity: Option<ToolConfig>,
    pub simplification: Option<ToolConfig>,
    pub duplicates: Option<ToolConfig>,
    pub static_scan: Option<ToolConfig>,
    pub dependency_graph: Option<ToolConfig>,
    pub dead_code: Option<ToolConfig>,
    pub spelling: Option<ToolConfig>,
    pub import_closure: Option<ToolConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ToolConfig {
    pub enabled: Option<bool>,
    /// argv, first element is the program. Supports {{PROJECT}}, {{PACKAGE}}, {{PACKAGE_DIR}}.
    pub command: Option<Vec<String>>,
}
