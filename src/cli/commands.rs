use clap::{Args, Parser, Subcommand};
use crate::config::ArtifactFormat;

#[derive(Parser)]
#[command(
    name = "codegrade",
    version,
    about = "Run code-quality analyzers concurrently and grade the project"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress display
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Assess a project and write the report
    Run(RunArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
}

#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    /// Project root to assess
    pub project: String,

    /// Comma-separated package patterns to exclude (e.g. "vendor,internal/gen*")
    #[arg(short, long)]
    pub exclude: Option<String>,

    /// Directory for the report artifacts (default: current directory)
    #[arg(short, long)]
    pub output: Option<String>,

    /// HTML template file replacing the built-in one
    #[arg(short, long)]
    pub template: Option<String>,

    /// Artifacts to write: html, json, all
    #[arg(short, long)]
    pub format: Option<ArtifactFormat>,

    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Concurrent package test workers (default: available parallelism)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Per-analyzer deadline in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

#[derive(Args, Clone, Debug)]
pub struct ValidateArgs {
    /// Path to config file
    pub config: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_flags() {
        let cli = Cli::parse_from([
            "codegrade", "-vv", "run", "./app", "-e", "vendor,gen", "-o", "out", "-f", "json",
            "--workers", "8", "--timeout", "120",
        ]);
        assert_eq!(cli.verbose, 2);
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.project, "./app");
        assert_eq!(args.exclude.as_deref(), Some("vendor,gen"));
        assert_eq!(args.format, Some(ArtifactFormat::Json));
        assert_eq!(args.workers, Some(8));
        assert_eq!(args.timeout, Some(120));
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["codegrade", "run", ".", "-f", "pdf"]).is_err());
    }

    #[test]
    fn test_validate_subcommand() {
        let cli = Cli::parse_from(["codegrade", "--log-json", "validate", "grade.yaml"]);
        assert!(cli.log_json);
        assert!(matches!(cli.command, Commands::Validate(ref a) if a.config == "grade.yaml"));
    }
}
