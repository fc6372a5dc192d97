use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::LazyLock;
use regex::Regex;
use crate::errors::GradeError;
use tracing::debug;

static PLACEHOLDER_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Z0-9_]*$").expect("valid regex"));

/// Where the HTML template comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TemplateSource {
    #[default]
    Builtin,
    Inline(String),
    File(PathBuf),
}

impl TemplateSource {
    pub fn load(&self) -> Result<String, GradeError> {
        match self {
            TemplateSource::Builtin => Ok(DEFAULT_TEMPLATE.to_string()),
            TemplateSource::Inline(text) => Ok(text.clone()),
            TemplateSource::File(path) => std::fs::read_to_string(path).map_err(|e| {
                GradeError::Template(format!("Failed to read template {}: {}", path.display(), e))
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Field(String),
}

/// A parsed document template with `{{ NAME }}` placeholders.
#[derive(Debug, Clone)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    /// Parse `source`, accepting only placeholder names listed in `known`.
    pub fn parse(source: &str, known: &[&str]) -> Result<Self, GradeError> {
        let mut segments = Vec::new();
        let mut rest = source;
        let mut offset = 0;

        while let Some(start) = rest.find("{{") {
            if start > 0 {
                segments.push(Segment::Text(rest[..start].to_string()));
            }
            let after_open = &rest[start + 2..];
            let Some(end) = after_open.find("}}") else {
                return Err(GradeError::Template(format!(
                    "Unterminated placeholder at byte {}",
                    offset + start
                )));
            };
            let name = after_open[..end].trim();
            if !PLACEHOLDER_NAME.is_match(name) || !known.contains(&name) {
                return Err(GradeError::Template(format!(
                    "Unknown placeholder '{{{{{}}}}}' at byte {}",
                    name,
                    offset + start
                )));
            }
            segments.push(Segment::Field(name.to_string()));

            let consumed = start + 2 + end + 2;
            offset += consumed;
            rest = &rest[consumed..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Text(rest.to_string()));
        }

        debug!(segments = segments.len(), "Template parsed");
        Ok(Self { segments })
    }

    pub fn render(&self, values: &BTreeMap<&'static str, String>) -> Result<String, GradeError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Field(name) => {
                    let value = values.get(name.as_str()).ok_or_else(|| {
                        GradeError::Template(format!("No value for placeholder '{}'", name))
                    })?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

pub const DEFAULT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Code quality report: {{ PROJECT }}</title>
<style>
body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif; margin: 0; background: #f4f5f7; color: #1f2933; }
.container { max-width: 1100px; margin: 0 auto; padding: 24px; }
.header { display: flex; justify-content: space-between; align-items: center; }
.grade { font-size: 48px; font-weight: 700; border-radius: 12px; padding: 8px 24px; color: #fff; background: #3e4c59; }
.grade-A { background: #2f9e44; } .grade-B { background: #5c940d; } .grade-C { background: #e67700; }
.grade-D { background: #d9480f; } .grade-F { background: #c92a2a; }
section { background: #fff; border-radius: 8px; padding: 16px 24px; margin-top: 16px; box-shadow: 0 1px 3px rgba(0,0,0,.08); }
table { border-collapse: collapse; width: 100%; }
th, td { text-align: left; padding: 6px 10px; border-bottom: 1px solid #e4e7eb; }
.pass { color: #2f9e44; font-weight: 600; } .fail { color: #c92a2a; font-weight: 600; }
.total td { font-weight: 700; }
.empty { color: #7b8794; font-style: italic; }
pre { background: #f5f7fa; padding: 12px; overflow-x: auto; }
code { font-size: 13px; }
</style>
</head>
<body>
<div class="container">
<div class="header">
<div>
<h1>{{ PROJECT }}</h1>
<p>Generated {{ GENERATED_AT }}</p>
</div>
<div class="grade grade-{{ GRADE }}">{{ GRADE }} &middot; {{ SCORE }}</div>
</div>
<section><h2>Score</h2>{{ SCORE_BREAKDOWN }}</section>
<section><h2>Unit tests</h2><p>Average coverage: <strong>{{ AVERAGE_COVERAGE }}</strong></p>{{ UNIT_TESTS }}</section>
<section><h2>Data races</h2>{{ RACES }}</section>
<section><h2>Packages without tests</h2>{{ UNTESTED_PACKAGES }}</section>
<section><h2>Cyclomatic complexity</h2>{{ COMPLEXITY }}</section>
<section><h2>Static scan</h2>{{ STATIC_SCAN }}</section>
<section><h2>Simplification hints</h2>{{ SIMPLIFICATION }}</section>
<section><h2>Duplicate code</h2>{{ DUPLICATES }}</section>
<section><h2>Dead code</h2>{{ DEAD_CODE }}</section>
<section><h2>Spelling</h2>{{ SPELLING }}</section>
<section><h2>Dependency graph</h2>{{ DEPENDENCY_GRAPH }}</section>
<section><h2>Analyzers</h2>{{ ANALYZER_RUNS }}</section>
<p class="empty">{{ GENERATOR }}</p>
</div>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    const KNOWN: &[&str] = &["PROJECT", "SCORE"];

    #[test]
    fn test_parse_and_render() {
        let template = Template::parse("<h1>{{ PROJECT }}</h1><p>{{SCORE}}</p>", KNOWN).unwrap();
        assert_eq!(template.segments.len(), 5);

        let mut values = BTreeMap::new();
        values.insert("PROJECT", "demo".to_string());
        values.insert("SCORE", "60".to_string());
        assert_eq!(template.render(&values).unwrap(), "<h1>demo</h1><p>60</p>");
    }

    #[test]
    fn test_unknown_placeholder_is_parse_error() {
        let err = Template::parse("{{ NOPE }}", KNOWN).unwrap_err();
        assert!(matches!(err, GradeError::Template(ref msg) if msg.contains("NOPE")));
    }

    #[test]
    fn test_unterminated_placeholder_is_parse_error() {
        let err = Template::parse("<p>{{ PROJECT</p>", KNOWN).unwrap_err();
        assert!(matches!(err, GradeError::Template(ref msg) if msg.contains("Unterminated")));
    }

    #[test]
    fn test_missing_value_is_render_error() {
        let template = Template::parse("{{ SCORE }}", KNOWN).unwrap();
        assert!(template.render(&BTreeMap::new()).is_err());
    }

    #[test]
    fn test_inline_and_missing_file_sources() {
        assert_eq!(TemplateSource::Inline("x".into()).load().unwrap(), "x");
        let missing = TemplateSource::File(PathBuf::from("/no/such/template.html"));
        assert!(matches!(missing.load(), Err(GradeError::Template(_))));
        assert!(TemplateSource::Builtin.load().unwrap().contains("{{ PROJECT }}"));
    }
}
