//! Project generation from named templates.
//!
//! [`DxlBootstrap`] looks a template up by name, reads its configuration
//! file and runs it against an output directory.

pub mod component;
pub mod config;
pub mod context;
pub mod error;
pub mod report;
pub mod resources;
pub mod template;
pub mod templates;

use std::collections::BTreeMap;
use std::path::Path;

use tracing::info;

pub use config::TemplateConfig;
pub use error::{GenerateError, NoOptionError};
pub use report::GenerationReport;
pub use template::Template;
pub use templates::{AppTemplate, ClientTemplate};

type TemplateFactory = fn() -> Box<dyn Template>;

/// Registry of the supported templates.
pub struct DxlBootstrap {
    templates: BTreeMap<&'static str, TemplateFactory>,
}

impl Default for DxlBootstrap {
    fn default() -> Self {
        let mut templates: BTreeMap<&'static str, TemplateFactory> = BTreeMap::new();
        templates.insert(templates::app::NAME, templates::app::new_instance);
        templates.insert(templates::client::NAME, templates::client::new_instance);
        Self { templates }
    }
}

impl DxlBootstrap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Supported template names, sorted.
    pub fn template_names(&self) -> Vec<&'static str> {
        self.templates.keys().copied().collect()
    }

    /// Instances of every supported template, sorted by name.
    pub fn templates(&self) -> impl Iterator<Item = Box<dyn Template>> + '_ {
        self.templates.values().map(|factory| factory())
    }

    pub fn template(&self, name: &str) -> Result<Box<dyn Template>, GenerateError> {
        self.templates
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| GenerateError::UnknownTemplate(name.to_string()))
    }

    /// Generates a project with `template_name` configured by `config_file`
    /// into `destination`.
    pub fn run(
        &self,
        template_name: &str,
        config_file: &Path,
        destination: &Path,
    ) -> Result<GenerationReport, GenerateError> {
        let template = self.template(template_name)?;
        let config = TemplateConfig::from_file(config_file)?;
        info!(
            template = template_name,
            "using configuration {}",
            config_file.display()
        );
        template.run(&config, destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry() {
        let bootstrap = DxlBootstrap::new();
        assert_eq!(
            bootstrap.template_names(),
            vec!["application-template", "client-template"]
        );
        assert_eq!(bootstrap.template("client-template").unwrap().name(), "client-template");
        let names: Vec<_> = bootstrap.templates().map(|t| t.name()).collect();
        assert_eq!(names, bootstrap.template_names());
    }

    #[test]
    fn test_unknown_template_checked_before_config() {
        let err = DxlBootstrap::new()
            .run("bogus", Path::new("/nonexistent.config"), Path::new("/tmp"))
            .unwrap_err();
        assert_eq!(err.to_string(), "An unknown template name was specified 'bogus'");
    }
}
