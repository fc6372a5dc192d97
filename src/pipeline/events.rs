use crate::models::{AnalyzerKind, RunStatus};

/// Messages sent from a run to the CLI for real-time display.
#[derive(Debug, Clone)]
pub enum RunEvent {
    /// Packages were enumerated and analyzers are about to start
    RunStarted {
        project: String,
        test_packages: usize,
    },
    /// A top-level analyzer task started
    AnalyzerStarted {
        kind: AnalyzerKind,
    },
    /// A top-level analyzer task ended, successfully or not
    AnalyzerFinished {
        kind: AnalyzerKind,
        status: RunStatus,
        duration_ms: u64,
    },
    /// One package's tests finished
    PackageTested {
        package: String,
        passed: bool,
    },
    /// Report assembled and scored
    RunCompleted {
        score: u32,
        duration_ms: u64,
    },
    /// The run could not start
    RunFailed {
        error: String,
    },
}
