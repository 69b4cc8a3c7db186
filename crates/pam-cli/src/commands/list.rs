//! List command implementation

use std::path::Path;

use colored::Colorize;

use pam_core::{Instance, PamConfig, StackEngine};
use pam_fs::NormalizedPath;

use crate::error::Result;

/// Run the list command
///
/// Prints every entry of the stack file named by `target` or `service`, or
/// of the default target.
pub fn run_list(
    config: &PamConfig,
    target: Option<&Path>,
    service: Option<&str>,
    json: bool,
) -> Result<()> {
    let target = target.map(NormalizedPath::new);
    let path = config.resolve_target(target.as_ref(), service);
    let engine = StackEngine::new(config.clone());
    let instances = engine.instances(&path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&instances)?);
        return Ok(());
    }

    println!("{} {}", "=>".blue().bold(), path.as_str().yellow());
    if instances.is_empty() {
        println!("   {}", "(no entries)".dimmed());
        return Ok(());
    }
    for (index, instance) in instances.iter().enumerate() {
        println!("{:>4}  {}", index + 1, format_instance(instance));
    }
    Ok(())
}

fn format_instance(instance: &Instance) -> String {
    let mut line = String::new();
    if let Some(service) = &instance.service {
        line.push_str(&format!("{} ", format!("{service:<10}").cyan()));
    }
    let phase = if instance.optional {
        format!("-{}", instance.phase)
    } else {
        instance.phase.clone()
    };
    line.push_str(&format!(
        "{} {:<12} {}",
        format!("{phase:<10}").green(),
        instance.control,
        instance.module.as_str().bold()
    ));
    for argument in &instance.arguments {
        line.push(' ');
        line.push_str(argument);
    }
    line
}
