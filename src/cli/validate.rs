use std::path::PathBuf;
use console::style;
use crate::cli::commands::ValidateArgs;
use crate::config;
use crate::errors::GradeError;

pub async fn handle_validate(args: ValidateArgs) -> Result<(), GradeError> {
    let path = PathBuf::from(&args.config);
    let config = config::parse_config(&path).await?;

    println!("{} Configuration is valid: {}", style("✓").green(), args.config);
    if let Some(patterns) = config.exclude.as_ref().filter(|p| !p.is_empty()) {
        println!("  exclude: {}", patterns.join(", "));
    }
    if let Some(analyzers) = config.analyzers.as_ref() {
        let overridden = [
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
        for (name, tool) in overridden {
            let Some(tool) = tool else { continue };
            if tool.enabled == Some(false) {
                println!("  {}: disabled", name);
            } else if let Some(command) = &tool.command {
                println!("  {}: {}", name, command.join(" "));
            }
        }
    }
    Ok(())
}
