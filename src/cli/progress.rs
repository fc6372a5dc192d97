use std::collections::HashMap;
use std::time::Duration;
use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use crate::models::{AnalyzerKind, RunStatus};
use crate::pipeline::RunEvent;
use crate::utils::formatting::format_duration;

/// Indicatif display driven by [`RunEvent`]s: one spinner per running
/// analyzer, a bar for package tests and a status line.
pub struct RunProgress {
    multi: MultiProgress,
    test_bar: Option<ProgressBar>,
    analyzer_bars: HashMap<AnalyzerKind, ProgressBar>,
    status_bar: ProgressBar,
    failed_packages: usize,
    start_time: std::time::Instant,
}

fn spinner_style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template).unwrap_or_else(|_| ProgressStyle::default_spinner())
}

impl RunProgress {
    pub fn new() -> Self {
        let multi = MultiProgress::new();

        let status_bar = multi.add(ProgressBar::new_spinner());
        status_bar.set_style(spinner_style("  {spinner:.cyan} {msg}"));
        status_bar.set_message("Enumerating packages...");
        status_bar.enable_steady_tick(Duration::from_millis(120));

        Self {
            multi,
            test_bar: None,
            analyzer_bars: HashMap::new(),
            status_bar,
            failed_packages: 0,
            start_time: std::time::Instant::now(),
        }
    }

    pub fn handle_event(&mut self, event: &RunEvent) {
        match event {
            RunEvent::RunStarted { project, test_packages } => {
                let bar = self
                    .multi
                    .insert_before(&self.status_bar, ProgressBar::new(*test_packages as u64));
                bar.set_style(
                    ProgressStyle::with_template("  {bar:30.cyan/dark_gray} {pos}/{len} packages tested | {msg}")
                        .unwrap_or_else(|_| ProgressStyle::default_bar())
                        .progress_chars("█▓░"),
                );
                bar.set_message(project.clone());
                self.test_bar = Some(bar);
                self.update_status();
            }
            RunEvent::AnalyzerStarted { kind } => {
                let bar = self
                    .multi
                    .insert_before(&self.status_bar, ProgressBar::new_spinner());
                bar.set_style(spinner_style("    {spinner:.yellow} {msg}"));
                bar.set_message(kind.display_name().to_string());
                bar.enable_steady_tick(Duration::from_millis(100));
                self.analyzer_bars.insert(*kind, bar);
            }
            RunEvent::AnalyzerFinished { kind, status, duration_ms } => {
                if let Some(bar) = self.analyzer_bars.remove(kind) {
                    bar.finish_and_clear();
                }
                if *status != RunStatus::Completed {
                    self.println(&format!(
                        "  {} {} {} after {}",
                        style("⚠").yellow(),
                        kind.display_name(),
                        status,
                        format_duration(*duration_ms),
                    ));
                }
                self.update_status();
            }
            RunEvent::PackageTested { package, passed } => {
                if let Some(bar) = &self.test_bar {
                    bar.inc(1);
                }
                if !passed {
                    self.failed_packages += 1;
                    self.println(&format!("  {} {}", style("✗").red(), package));
                }
                self.update_status();
            }
            RunEvent::RunCompleted { score, duration_ms } => {
                for (_, bar) in self.analyzer_bars.drain() {
                    bar.finish_and_clear();
                }
                if let Some(bar) = self.test_bar.take() {
                    bar.finish_with_message("tests done");
                }
                self.status_bar.finish_with_message(format!(
                    "Assessment complete: score {} | {} failing packages | {}",
                    style(score).bold(),
                    self.failed_packages,
                    format_duration(*duration_ms),
                ));
            }
            RunEvent::RunFailed { error } => {
                for (_, bar) in self.analyzer_bars.drain() {
                    bar.finish_and_clear();
                }
                if let Some(bar) = self.test_bar.take() {
                    bar.abandon_with_message("Failed");
                }
                self.status_bar.finish_with_message(format!("Assessment failed: {}", error));
            }
        }
    }

    fn update_status(&self) {
        self.status_bar.set_message(format!(
            "{} | {} analyzers running | {} failing packages",
            format_duration(self.start_time.elapsed().as_millis() as u64),
            self.analyzer_bars.len(),
            self.failed_packages,
        ));
    }

    /// Print a line through the multi-progress (won't interfere with bars).
    pub fn println(&self, msg: &str) {
        let _ = self.multi.println(msg);
    }
}

impl Default for RunProgress {
    fn default() -> Self {
        Self::new()
    }
}
