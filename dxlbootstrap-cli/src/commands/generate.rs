//! `generate`, `templates` and `sample-config` commands.

use std::path::Path;

use anyhow::{Context, Result};

use crate::generate::DxlBootstrap;
use crate::generate::report::{print_report, write_report};

/// Generates a project and prints its report.
pub fn handle_generate(
    template: &str,
    config_file: &Path,
    output_directory: &Path,
    report_path: Option<&Path>,
) -> Result<()> {
    let report = DxlBootstrap::new().run(template, config_file, output_directory)?;
    print_report(&report);

    if let Some(path) = report_path {
        write_report(&report, path).context("Failed to write generation report")?;
        println!("Report written to: {}", path.display());
    }

    println!("Generation succeeded.");
    Ok(())
}

/// Lists the supported templates.
pub fn handle_templates() -> Result<()> {
    println!("Supported templates:");
    for template in DxlBootstrap::new().templates() {
        println!("    {:<24}{}", template.name(), template.description());
    }
    Ok(())
}

/// Prints a starter configuration file for `template`.
pub fn handle_sample_config(template: &str) -> Result<()> {
    let template = DxlBootstrap::new().template(template)?;
    print!("{}", template.sample_config());
    Ok(())
}
