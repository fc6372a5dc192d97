use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use console::style;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use crate::analyzers::{Analyzers, ToolchainAnalyzers};
use crate::cli::commands::RunArgs;
use crate::cli::progress::RunProgress;
use crate::config::{self, ArtifactFormat, ExcludeSet, GradeConfig};
use crate::errors::GradeError;
use crate::models::AggregateReport;
use crate::pipeline::{Orchestrator, RunConfig, RunEvent};
use crate::reporting::{artifact_timestamp, ArtifactWriter, TemplateSource};
use crate::utils::formatting::pluralize;
use tracing::{info, warn};

/// Everything `run` needs, merged from the config file and the command line.
#[derive(Debug)]
pub struct RunSettings {
    pub run_config: RunConfig,
    pub output_dir: Option<PathBuf>,
    pub format: ArtifactFormat,
    pub template: TemplateSource,
    pub analyzers: ToolchainAnalyzers,
}

pub async fn handle_run(args: RunArgs, show_progress: bool) -> Result<(), GradeError> {
    info!(project = %args.project, "Starting assessment");

    let file_config = match &args.config {
        Some(path) => Some(config::parse_config(Path::new(path)).await?),
        None => None,
    };
    let settings = build_settings(&args, file_config.as_ref())?;

    let cancel_token = CancellationToken::new();
    let interrupt = {
        let token = cancel_token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, stopping analyzers and writing partial report");
                token.cancel();
            }
        })
    };

    let analyzers: Arc<dyn Analyzers> = Arc::new(settings.analyzers);
    let mut orchestrator =
        Orchestrator::new(settings.run_config, analyzers).with_cancel_token(cancel_token);

    let progress_task = if show_progress {
        let (tx, rx) = mpsc::unbounded_channel();
        orchestrator = orchestrator.with_event_channel(tx);
        Some(tokio::spawn(drive_progress(rx)))
    } else {
        None
    };

    let result = orchestrator.run().await;
    drop(orchestrator);
    interrupt.abort();
    if let Some(task) = progress_task {
        let _ = task.await;
    }
    let report = result?;

    let writer = ArtifactWriter::new(settings.output_dir, artifact_timestamp(Utc::now()))
        .with_template(settings.template);
    let summary = writer.write_all(&report, settings.format).await;

    print_summary(&report);
    for path in &summary.written {
        println!("  {} {}", style("wrote").green(), path.display());
    }
    if !summary.is_complete() {
        return Err(GradeError::Artifact(summary.failed.join("; ")));
    }
    Ok(())
}

async fn drive_progress(mut rx: mpsc::UnboundedReceiver<RunEvent>) {
    let mut progress = RunProgress::new();
    while let Some(event) = rx.recv().await {
        progress.handle_event(&event);
    }
}

fn print_summary(report: &AggregateReport) {
    let failed = report.failed_packages().count();
    println!(
        "{} {}: score {}",
        style("✓").green(),
        report.project,
        style(report.score).bold()
    );
    println!(
        "  {} tested ({} failing), average coverage {}",
        pluralize(report.unit_test.per_package.len(), "package"),
        failed,
        report.unit_test.average_coverage
    );
    println!(
        "  {}, {}, {} duplicated blocks, {} without tests",
        pluralize(report.static_scan_count(), "static finding"),
        pluralize(report.simplification_count(), "simplification hint"),
        report.duplicate_code_tips.len(),
        pluralize(report.packages_without_tests.len(), "package"),
    );
}

/// Merge the config file with command-line flags; flags win.
pub fn build_settings(args: &RunArgs, file_config: Option<&GradeConfig>) -> Result<RunSettings, GradeError> {
    let scan = file_config.and_then(|c| c.scan.as_ref());
    let output = file_config.and_then(|c| c.output.as_ref());

    let mut exclude = ExcludeSet::new(
        file_config
            .and_then(|c| c.exclude.as_ref())
            .map(|patterns| patterns.as_slice())
            .unwrap_or_default(),
    )?;
    if let Some(ref list) = args.exclude {
        exclude.extend(ExcludeSet::parse(list)?);
    }

    let workers = args.workers.or_else(|| scan.and_then(|s| s.workers));
    if workers == Some(0) {
        return Err(GradeError::Config("--workers must be at least 1".into()));
    }
    let timeout = args.timeout.or_else(|| scan.and_then(|s| s.analyzer_timeout_secs));
    if timeout == Some(0) {
        return Err(GradeError::Config("--timeout must be at least 1 second".into()));
    }

    let mut run_config = RunConfig::new(&args.project)
        .with_exclude(exclude)
        .with_analyzer_timeout(timeout.map(Duration::from_secs));
    if let Some(workers) = workers {
        run_config = run_config.with_workers(workers);
    }
    if let Some(suffix) = scan.and_then(|s| s.test_file_suffix.clone()) {
        run_config.test_file_suffix = suffix;
    }
    if let Some(suffix) = scan.and_then(|s| s.source_file_suffix.clone()) {
        run_config.source_file_suffix = suffix;
    }

    let template = args
        .template
        .clone()
        .or_else(|| output.and_then(|o| o.template.clone()))
        .map(|path| TemplateSource::File(PathBuf::from(path)))
        .unwrap_or_default();

    let analyzers = ToolchainAnalyzers::new(file_config.and_then(|c| c.analyzers.as_ref()))
        .with_suffixes(&run_config.test_file_suffix, &run_config.source_file_suffix);

    Ok(RunSettings {
        output_dir: args
            .output
            .clone()
            .or_else(|| output.and_then(|o| o.directory.clone()))
            .map(PathBuf::from),
        format: args
            .format
            .or_else(|| output.and_then(|o| o.format))
            .unwrap_or_default(),
        template,
        analyzers,
        run_config,
    })
}
