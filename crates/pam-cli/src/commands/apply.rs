//! Apply command implementation
//!
//! Reconciles every declaration of a manifest, one transaction per entry.

use std::path::Path;

use colored::Colorize;

use pam_core::{ApplyOptions, PamConfig, ReconcileReport, StackEngine};

use super::load_entries;
use crate::error::Result;

/// Run the apply command
pub fn run_apply(config: &PamConfig, manifest: &Path, dry_run: bool, json: bool) -> Result<()> {
    let entries = load_entries(manifest)?;
    let engine = StackEngine::new(config.clone());
    let options = ApplyOptions { dry_run };

    if !json {
        let verb = if dry_run { "Previewing" } else { "Applying" };
        println!(
            "{} {} {} entries from {}",
            "=>".blue().bold(),
            verb,
            entries.len(),
            manifest.display().to_string().yellow()
        );
    }

    let reports = engine.apply(&entries, &options)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    for report in &reports {
        print_report(report);
    }

    let changed = reports.iter().filter(|r| r.is_change()).count();
    if changed == 0 {
        println!("{} Stack files already match.", "OK".green().bold());
    } else if dry_run {
        println!(
            "{} {} of {} entries would change. Run without {} to apply.",
            "DRY-RUN".yellow().bold(),
            changed,
            reports.len(),
            "--dry-run".cyan()
        );
    } else {
        println!(
            "{} {} of {} entries changed.",
            "OK".green().bold(),
            changed,
            reports.len()
        );
    }
    Ok(())
}

fn print_report(report: &ReconcileReport) {
    if !report.is_change() {
        println!("   {} {}", "=".dimmed(), report.action().dimmed());
        return;
    }

    println!("   {} {}", "+".green(), report.action());
    for change in &report.changes {
        println!("     {} {}", "~".yellow(), change);
    }
    for line in report.diff.lines() {
        let line = match line.chars().next() {
            Some('+') if !line.starts_with("+++") => line.green().to_string(),
            Some('-') if !line.starts_with("---") => line.red().to_string(),
            Some('@') => line.cyan().to_string(),
            _ => line.dimmed().to_string(),
        };
        println!("     {line}");
    }
}
