//! Composite quality score.
//!
//! Six terms, each derived from one part of the aggregate report:
//!
//! | term           | max | input                                  |
//! |----------------|-----|----------------------------------------|
//! | coverage       |  40 | average coverage percentage            |
//! | duplicates     |  10 | duplicated block groups                |
//! | static scan    |  10 | static bug-pattern findings            |
//! | simplification |  10 | simplification hints                   |
//! | dead code      |  10 | unused symbols, one point per five     |
//! | complexity     |  20 | per-function cyclomatic complexity     |

use serde::{Deserialize, Serialize};
use crate::models::AggregateReport;
use tracing::debug;

const COVERAGE_WEIGHT: f64 = 40.0;
const COUNT_TERM_MAX: u32 = 10;
const DEAD_CODE_PER_POINT: u32 = 5;
const COMPLEXITY_WEIGHT: i64 = 20;
const HIGH_COMPLEXITY: u32 = 15;
const SEVERE_COMPLEXITY: u32 = 50;
pub const MAX_SCORE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub coverage: f64,
    pub duplicates: u32,
    pub static_scan: u32,
    pub simplification: u32,
    pub dead_code: u32,
    pub complexity: u32,
    pub total: u32,
}

/// Complexity values bucketed by magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ComplexityBuckets {
    pub severe: u32,
    pub high: u32,
    pub normal: u32,
    pub normal_sum: u64,
}

impl ComplexityBuckets {
    pub fn classify<'a>(findings: impl IntoIterator<Item = &'a str>) -> Self {
        let mut buckets = Self::default();
        for finding in findings {
            let leading = finding.split(' ').next().unwrap_or_default();
            let Ok(value) = leading.trim().parse::<u32>() else {
                debug!(finding = %finding, "Complexity finding without a numeric value, skipped");
                continue;
            };
            if value >= SEVERE_COMPLEXITY {
                buckets.severe += 1;
            } else if value >= HIGH_COMPLEXITY {
                buckets.high += 1;
            } else {
                buckets.normal += 1;
                buckets.normal_sum += u64::from(value);
            }
        }
        buckets
    }
}

/// Score a report without modifying it.
pub fn calculate(report: &AggregateReport) -> ScoreBreakdown {
    let coverage = coverage_term(&report.unit_test.average_coverage);
    let duplicates = count_term(report.duplicate_code_tips.len());
    let static_scan = count_term(report.static_scan_count());
    let simplification = count_term(report.simplification_count());
    let dead_code = dead_code_term(report.dead_code.len());
    let complexity = complexity_term(ComplexityBuckets::classify(
        report
            .complexity
            .values()
            .flat_map(|result| result.findings.iter().map(String::as_str)),
    ));

    let sum = coverage
        + f64::from(duplicates + static_scan + simplification + dead_code + complexity);
    let total = (sum.trunc().max(0.0) as u32).min(MAX_SCORE);

    ScoreBreakdown {
        coverage,
        duplicates,
        static_scan,
        simplification,
        dead_code,
        complexity,
        total,
    }
}

/// Score the report and record the total on it.
pub fn grade(report: &mut AggregateReport) -> u32 {
    let breakdown = calculate(report);
    debug!(?breakdown, "Score computed");
    report.score = breakdown.total;
    breakdown.total
}

/// Letter grade for a score.
pub fn letter(score: u32) -> &'static str {
    match score {
        90.. => "A",
        80..=89 => "B",
        70..=79 => "C",
        60..=69 => "D",
        _ => "F",
    }
}

fn coverage_term(average: &str) -> f64 {
    match average.trim().trim_end_matches('%').parse::<f64>() {
        Ok(pct) if pct.is_finite() => COVERAGE_WEIGHT * pct.clamp(0.0, 100.0) / 100.0,
        _ => {
            debug!(average = %average, "Unparsable coverage average, term is 0");
            0.0
        }
    }
}

fn count_term(count: usize) -> u32 {
    COUNT_TERM_MAX.saturating_sub(u32::try_from(count).unwrap_or(u32::MAX))
}

fn dead_code_term(count: usize) -> u32 {
    let penalty = u32::try_from(count).unwrap_or(u32::MAX) / DEAD_CODE_PER_POINT;
    COUNT_TERM_MAX.saturating_sub(penalty)
}

fn complexity_term(buckets: ComplexityBuckets) -> u32 {
    let normal = i64::from(buckets.normal);
    let base = if normal > 0 {
        let ceiling = i64::from(HIGH_COMPLEXITY) * normal;
        COMPLEXITY_WEIGHT * (ceiling - buckets.normal_sum as i64) / ceiling
    } else {
        0
    };
    let term = base - i64::from(buckets.severe / 5) - i64::from(buckets.high / 10);
    term.max(0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ComplexityResult;

    fn report_with_coverage(average: &str) -> AggregateReport {
        let mut report = AggregateReport::new("demo");
        report.unit_test.average_coverage = average.to_string();
        report
    }

    #[test]
    fn test_half_coverage_clean_project_scores_sixty() {
        let mut report = report_with_coverage("50.0%");
        let breakdown = calculate(&report);
        assert_eq!(breakdown.coverage, 20.0);
        assert_eq!(
            (breakdown.duplicates, breakdown.static_scan, breakdown.simplification, breakdown.dead_code),
            (10, 10, 10, 10)
        );
        assert_eq!(breakdown.complexity, 0);
        assert_eq!(grade(&mut report), 60);
        assert_eq!(report.score, 60);
    }

    #[test]
    fn test_calculate_is_pure() {
        let report = report_with_coverage("73.3%");
        assert_eq!(calculate(&report), calculate(&report));
    }

    #[test]
    fn test_unparsable_coverage_is_zero() {
        assert_eq!(coverage_term("n/a"), 0.0);
        assert_eq!(coverage_term("0%"), 0.0);
        assert_eq!(coverage_term("NaN%"), 0.0);
    }

    #[test]
    fn test_bucket_boundaries() {
        let buckets = ComplexityBuckets::classify(["15 pkg f a.go:1:1", "50 pkg g a.go:9:1", "14 pkg h a.go:20:1"]);
        assert_eq!(buckets.high, 1);
        assert_eq!(buckets.severe, 1);
        assert_eq!(buckets.normal, 1);
        assert_eq!(buckets.normal_sum, 14);
    }

    #[test]
    fn test_non_numeric_complexity_skipped() {
        let buckets = ComplexityBuckets::classify(["Average: 3.2", "x pkg f a.go:1:1"]);
        assert_eq!(buckets, ComplexityBuckets::default());
    }

    #[test]
    fn test_count_terms_non_increasing_and_floor_at_zero() {
        let mut previous = count_term(0);
        assert_eq!(previous, 10);
        for count in 1..20 {
            let term = count_term(count);
            assert!(term <= previous);
            previous = term;
        }
        assert_eq!(count_term(10), 0);
        assert_eq!(count_term(1_000), 0);
    }

    #[test]
    fn test_dead_code_term() {
        assert_eq!(dead_code_term(0), 10);
        assert_eq!(dead_code_term(4), 10);
        assert_eq!(dead_code_term(5), 9);
        assert_eq!(dead_code_term(49), 1);
        assert_eq!(dead_code_term(80), 0);
    }

    #[test]
    fn test_complexity_term() {
        // three functions of complexity 3: 20 * (45 - 9) / 45 = 16
        let mut report = report_with_coverage("0%");
        report.complexity.insert(
            "calc".into(),
            ComplexityResult {
                average: 3.0,
                findings: vec!["3 calc a a.go:1:1".into(), "3 calc b a.go:5:1".into(), "3 calc c a.go:9:1".into()],
            },
        );
        assert_eq!(calculate(&report).complexity, 16);

        let buckets = ComplexityBuckets { severe: 10, high: 0, normal: 1, normal_sum: 14 };
        // base 20 * (15 - 14) / 15 = 1, minus 2 for severe
        assert_eq!(complexity_term(buckets), 0);
    }

    #[test]
    fn test_full_marks_clamped() {
        let mut report = report_with_coverage("100.0%");
        report.complexity.insert(
            "a".into(),
            ComplexityResult { average: 1.0, findings: vec!["1 a f a.go:1:1".into()] },
        );
        let breakdown = calculate(&report);
        assert_eq!(breakdown.complexity, 18);
        assert!(breakdown.total <= MAX_SCORE);
        assert_eq!(breakdown.total, 98);
    }

    #[test]
    fn test_letter() {
        assert_eq!(letter(95), "A");
        assert_eq!(letter(60), "D");
        assert_eq!(letter(12), "F");
    }
}
