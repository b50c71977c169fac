//! Summary of a generation run.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

/// Directories and files produced by a template run.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub timestamp: String,
    pub template: String,
    pub destination: PathBuf,
    pub directories_created: Vec<PathBuf>,
    pub directories_existed: Vec<PathBuf>,
    pub files_written: Vec<PathBuf>,
}

impl GenerationReport {
    pub fn new(template: &str, destination: &Path) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            template: template.to_string(),
            destination: destination.to_path_buf(),
            directories_created: Vec::new(),
            directories_existed: Vec::new(),
            files_written: Vec::new(),
        }
    }

    pub fn total_directories(&self) -> usize {
        self.directories_created.len() + self.directories_existed.len()
    }
}

/// Writes the report as TOML, creating the parent directory if needed.
pub fn write_report(report: &GenerationReport, output_path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(report).context("Failed to serialize generation report")?;

    if let Some(parent) = output_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create parent directory: {}", parent.display()))?;
    }

    fs::write(output_path, content)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;
    Ok(())
}

pub fn print_report(report: &GenerationReport) {
    println!("dxlbootstrap generation report");
    println!("Generated:   {}", report.timestamp);
    println!("Template:    {}", report.template);
    println!("Destination: {}", report.destination.display());

    if report.total_directories() > 0 {
        println!();
        println!("Directories:");
        for dir in &report.directories_created {
            println!("  Created: {}", dir.display());
        }
        for dir in &report.directories_existed {
            println!("  Exists:  {}", dir.display());
        }
    }

    if !report.files_written.is_empty() {
        println!();
        println!("Files ({}):", report.files_written.len());
        for file in &report.files_written {
            println!("  {}", file.display());
        }
    }
    println!();
}
