//! Check command implementation

use std::path::Path;

use colored::Colorize;

use pam_core::{CheckStatus, DriftItem, PamConfig, StackEngine};

use super::load_entries;
use crate::error::Result;

/// Run the check command
///
/// Reports drift between the manifest and the stack files without writing.
pub fn run_check(config: &PamConfig, manifest: &Path, json: bool) -> Result<()> {
    let entries = load_entries(manifest)?;
    let engine = StackEngine::new(config.clone());

    if !json {
        println!("{} Checking {} entries...", "=>".blue().bold(), entries.len());
    }

    let report = engine.check(&entries);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    match report.status {
        CheckStatus::Healthy => {
            println!("{} Stack files match. No drift detected.", "OK".green().bold());
        }
        CheckStatus::Missing => {
            println!("{} Some entries are missing:", "MISSING".yellow().bold());
            print_items(&report.missing, "-".yellow().to_string());
            println!();
            println!("Run {} to repair.", "pamstack apply".cyan());
        }
        CheckStatus::Drifted => {
            println!("{} Stack files have drifted:", "DRIFTED".red().bold());
            print_items(&report.drifted, "!".red().to_string());
            if !report.missing.is_empty() {
                println!();
                println!("{} Also missing:", "MISSING".yellow().bold());
                print_items(&report.missing, "-".yellow().to_string());
            }
            println!();
            println!("Run {} to repair.", "pamstack apply".cyan());
        }
        CheckStatus::Broken => {
            println!("{} Stack files could not be checked:", "BROKEN".red().bold());
            for msg in &report.messages {
                println!("   {} {}", "!".red(), msg);
            }
        }
    }

    Ok(())
}

fn print_items(items: &[DriftItem], marker: String) {
    for item in items {
        println!(
            "   {} {} ({}): {}",
            marker,
            item.identity.cyan(),
            item.target.dimmed(),
            item.description
        );
    }
}
