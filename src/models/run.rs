use serde::{Deserialize, Serialize};

/// Every top-level task the orchestrator schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyzerKind {
    UnitTest,
    Complexity,
    Simplification,
    Duplicates,
    StaticScan,
    DependencyGraph,
    DeadCode,
    Spelling,
    ImportClosure,
}

impl AnalyzerKind {
    pub const ALL: [AnalyzerKind; 9] = [
        AnalyzerKind::UnitTest,
        AnalyzerKind::Complexity,
        AnalyzerKind::Simplification,
        AnalyzerKind::Duplicates,
        AnalyzerKind::StaticScan,
        AnalyzerKind::DependencyGraph,
        AnalyzerKind::DeadCode,
        AnalyzerKind::Spelling,
        AnalyzerKind::ImportClosure,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyzerKind::UnitTest => "unit_test",
            AnalyzerKind::Complexity => "complexity",
            AnalyzerKind::Simplification => "simplification",
            AnalyzerKind::Duplicates => "duplicates",
            AnalyzerKind::StaticScan => "static_scan",
            AnalyzerKind::DependencyGraph => "dependency_graph",
            AnalyzerKind::DeadCode => "dead_code",
            AnalyzerKind::Spelling => "spelling",
            AnalyzerKind::ImportClosure => "import_closure",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AnalyzerKind::UnitTest => "Unit tests",
            AnalyzerKind::Complexity => "Cyclomatic complexity",
            AnalyzerKind::Simplification => "Simplification hints",
            AnalyzerKind::Duplicates => "Duplicate code",
            AnalyzerKind::StaticScan => "Static scan",
            AnalyzerKind::DependencyGraph => "Dependency graph",
            AnalyzerKind::DeadCode => "Dead code",
            AnalyzerKind::Spelling => "Spelling",
            AnalyzerKind::ImportClosure => "Import closure",
        }
    }
}

impl std::fmt::Display for AnalyzerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a top-level task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    TimedOut,
    Cancelled,
    Panicked,
}

impl RunStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunStatus::Completed)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RunStatus::Completed => "completed",
            RunStatus::TimedOut => "timed out",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Panicked => "panicked",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerRun {
    pub kind: AnalyzerKind,
    pub status: RunStatus,
    pub duration_ms: u64,
}
