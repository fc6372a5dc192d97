use glob::Pattern;
use crate::errors::GradeError;

/// Package exclusion rules.
///
/// Each pattern is a glob matched against the package id. A pattern also
/// excludes every package nested below a package it matches, so `vendor`
/// excludes `vendor/github.com/x`.
#[derive(Debug, Clone, Default)]
pub struct ExcludeSet {
    patterns: Vec<Pattern>,
}

impl ExcludeSet {
    pub fn new<I, S>(patterns: I) -> Result<Self, GradeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| p.as_ref().trim().trim_matches('/').to_string())
            .filter(|p| !p.is_empty())
            .map(|p| Pattern::new(&p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Parse a comma-separated pattern list as given on the command line.
    pub fn parse(list: &str) -> Result<Self, GradeError> {
        Self::new(list.split(','))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn extend(&mut self, other: ExcludeSet) {
        self.patterns.extend(other.patterns);
    }

    pub fn is_excluded(&self, package_id: &str) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        let mut prefix = String::new();
        for (i, segment) in package_id.split('/').enumerate() {
            if i > 0 {
                prefix.push('/');
            }
            prefix.push_str(segment);
            if self.patterns.iter().any(|p| p.matches(&prefix)) {
                return true;
            }
        }
        false
    }

    /// Like [`is_excluded`](Self::is_excluded) but also tries every trailing
    /// sub-path, for module-qualified import paths such as `example.com/app/vendor/x`.
    pub fn is_excluded_anywhere(&self, path: &str) -> bool {
        let segments: Vec<&str> = path.split('/').collect();
        (0..segments.len()).any(|start| self.is_excluded(&segments[start..].join("/")))
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(Pattern::as_str)
    }
}
