//! Errors raised while generating a project.

use std::path::PathBuf;

use thiserror::Error;

/// A required option is missing from a configuration section.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("No option '{option}' in section: '{section}'")]
pub struct NoOptionError {
    pub option: String,
    pub section: String,
}

impl NoOptionError {
    pub fn new(option: impl Into<String>, section: impl Into<String>) -> Self {
        Self {
            option: option.into(),
            section: section.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("An unknown template name was specified '{0}'")]
    UnknownTemplate(String),

    #[error("Error attempting to read configuration file: {}", .0.display())]
    ConfigRead(PathBuf),

    #[error(transparent)]
    NoOption(#[from] NoOptionError),

    #[error("Invalid value '{value}' for option '{option}' in section '{section}': {reason}")]
    InvalidValue {
        section: String,
        option: String,
        value: String,
        reason: String,
    },

    #[error(
        "Unexpected value in rustVersion: {0}. Expected X(.Y.Z) format (for example, '1', '1.75', or '1.75.0')."
    )]
    RustVersion(String),

    #[error("Unknown static resource: {0}")]
    UnknownResource(String),

    #[error("Error rendering resource {resource}: {details}")]
    Render { resource: String, details: String },

    #[error("Path exists but is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("No output file is open for resource {0}")]
    NoOpenFile(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GenerateError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
