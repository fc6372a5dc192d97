use std::path::Path;
use crate::errors::GradeError;
use super::exclude::ExcludeSet;
use super::types::{GradeConfig, ToolConfig};
use super::schema::CONFIG_SCHEMA;
use tracing::warn;

const MAX_CONFIG_BYTES: u64 = 1_048_576;

pub async fn parse_config(path: &Path) -> Result<GradeConfig, GradeError> {
    if !path.exists() {
        return Err(GradeError::Config(format!("Config file not found: {}", path.display())));
    }

    let metadata = tokio::fs::metadata(path).await?;
    if metadata.len() > MAX_CONFIG_BYTES {
        return Err(GradeError::Config("Config file exceeds 1MB limit".into()));
    }

    let content = tokio::fs::read_to_string(path).await?;
    parse_config_str(&content)
}

/// Parse and validate configuration from YAML text.
pub fn parse_config_str(content: &str) -> Result<GradeConfig, GradeError> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(content)?;
    if yaml.is_null() {
        return Ok(GradeConfig::default());
    }

    validate_schema(&yaml)?;

    let config: GradeConfig = serde_yaml::from_value(yaml)?;

    validate_conflicts(&config)?;

    Ok(config)
}

/// Validate config against the JSON schema for structural correctness.
fn validate_schema(yaml: &serde_yaml::Value) -> Result<(), GradeError> {
    let json_value = serde_json::to_value(yaml)
        .map_err(|e| GradeError::Config(format!("Config conversion error: {}", e)))?;

    let compiled = jsonschema::JSONSchema::compile(&CONFIG_SCHEMA)
        .map_err(|e| GradeError::Config(format!("Schema compilation error: {}", e)))?;

    if let Err(errors) = compiled.validate(&json_value) {
        // Advisory: the typed parse and semantic checks below are authoritative
        for e in errors {
            warn!(validation_error = %format!("{} at {}", e, e.instance_path), "Config schema warning");
        }
    }

    Ok(())
}

/// Semantic checks the typed parse cannot express.
fn validate_conflicts(config: &GradeConfig) -> Result<(), GradeError> {
    if let Some(patterns) = &config.exclude {
        ExcludeSet::new(patterns)?;
    }

    if let Some(scan) = &config.scan {
        if scan.workers == Some(0) {
            return Err(GradeError::Config("scan.workers must be at least 1".into()));
        }
        if scan.analyzer_timeout_secs == Some(0) {
            return Err(GradeError::Config("scan.analyzer_timeout_secs must be at least 1".into()));
        }
        for (name, suffix) in [
            ("test_file_suffix", &scan.test_file_suffix),
            ("source_file_suffix", &scan.source_file_suffix),
        ] {
            if suffix.as_deref().is_some_and(|s| s.trim().is_empty()) {
                return Err(GradeError::Config(format!("scan.{} must not be empty", name)));
            }
        }
    }

    if let Some(analyzers) = &config.analyzers {
        let tools: [(&str, &Option<ToolConfig>); 9] = [
            ("unit_test", &analyzers.unit_test),
            ("complexity", &analyzers.complexity),
            ("simplification", &analyzers.simplification),
            ("duplicates", &analyzers.duplicates),
            ("static_scan", &analyzers.static_scan),
            ("dependency_graph", &analyzers.dependency_graph),
            ("dead_code", &analyzers.dead_code),
            ("spelling", &analyzers.spelling),
            ("import_closure", &analyzers.import_closure),
        ];
        for (name, tool) in tools {
            let Some(tool) = tool else { continue };
            if let Some(command) = &tool.command {
                if command.first().map_or(true, |program| program.trim().is_empty()) {
                    return Err(GradeError::Config(format!(
                        "analyzers.{}.command must name a program",
                        name
                    )));
                }
            }
        }
    }

    Ok(())
}
