//! State shared by components while a template executes.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::error::GenerateError;
use super::report::GenerationReport;

const INDENT: &str = "    ";

struct OpenFile {
    path: PathBuf,
    writer: BufWriter<File>,
}

/// Tracks the current output directory, the open file and the indent level.
///
/// In validate-only mode nothing is created or written; resources are still
/// rendered so that errors surface before any output exists.
pub struct TemplateContext {
    directories: Vec<PathBuf>,
    file: Option<OpenFile>,
    indent_level: usize,
    validate_only: bool,
    report: GenerationReport,
}

impl TemplateContext {
    pub fn new(template: &str, destination: &Path, validate_only: bool) -> Self {
        Self {
            directories: vec![destination.to_path_buf()],
            file: None,
            indent_level: 0,
            validate_only,
            report: GenerationReport::new(template, destination),
        }
    }

    pub fn validate_only(&self) -> bool {
        self.validate_only
    }

    pub fn current_directory(&self) -> &Path {
        self.directories.last().map_or(Path::new(""), PathBuf::as_path)
    }

    pub fn push_directory(&mut self, name: &str) {
        let dir = if name.is_empty() {
            self.current_directory().to_path_buf()
        } else {
            self.current_directory().join(name)
        };
        self.directories.push(dir);
    }

    pub fn pop_directory(&mut self) {
        if self.directories.len() > 1 {
            self.directories.pop();
        }
    }

    pub fn indent_level(&self) -> usize {
        self.indent_level
    }

    pub fn increase_indent(&mut self, levels: usize) {
        self.indent_level += levels;
    }

    pub fn decrease_indent(&mut self, levels: usize) {
        self.indent_level = self.indent_level.saturating_sub(levels);
    }

    /// Creates the current directory. A non-directory at that path is an
    /// error in both modes.
    pub fn create_current_directory(&mut self) -> Result<(), GenerateError> {
        let dir = self.current_directory().to_path_buf();
        if dir.exists() {
            if !dir.is_dir() {
                return Err(GenerateError::NotADirectory(dir));
            }
            if !self.validate_only {
                self.report.directories_existed.push(dir);
            }
            return Ok(());
        }
        if self.validate_only {
            return Ok(());
        }

        fs::create_dir_all(&dir).map_err(|e| GenerateError::io(&dir, e))?;
        debug!("created directory {}", dir.display());
        self.report.directories_created.push(dir);
        Ok(())
    }

    pub fn open_file(&mut self, file_name: &str) -> Result<(), GenerateError> {
        if self.validate_only {
            return Ok(());
        }
        self.close_file()?;

        let path = self.current_directory().join(file_name);
        let file = File::create(&path).map_err(|e| GenerateError::io(&path, e))?;
        self.file = Some(OpenFile {
            path,
            writer: BufWriter::new(file),
        });
        Ok(())
    }

    pub fn close_file(&mut self) -> Result<(), GenerateError> {
        if let Some(mut open) = self.file.take() {
            open.writer.flush().map_err(|e| GenerateError::io(&open.path, e))?;
            debug!("wrote {}", open.path.display());
            self.report.files_written.push(open.path);
        }
        Ok(())
    }

    /// Writes `lines` to the open file at the current indent level. Empty
    /// lines are written without indentation.
    pub fn write_lines(&mut self, resource: &str, lines: &[String]) -> Result<(), GenerateError> {
        if self.validate_only {
            return Ok(());
        }
        let indent = INDENT.repeat(self.indent_level);
        let Some(open) = self.file.as_mut() else {
            return Err(GenerateError::NoOpenFile(resource.to_string()));
        };

        for line in lines {
            let result = if line.is_empty() {
                writeln!(open.writer)
            } else {
                writeln!(open.writer, "{indent}{line}")
            };
            result.map_err(|e| GenerateError::io(&open.path, e))?;
        }
        Ok(())
    }

    pub fn into_report(self) -> GenerationReport {
        self.report
    }
}
