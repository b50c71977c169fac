//! The template abstraction and helpers shared by the templates.

use std::path::Path;

use tracing::info;

use super::component::{DirComponent, TemplateComponent};
use super::config::{PackageSettings, TemplateConfig};
use super::context::TemplateContext;
use super::error::GenerateError;
use super::report::GenerationReport;

/// Rust image tag used when no `rustVersion` is configured.
pub const DEFAULT_DOCKER_RUST_VERSION: &str = "1";

/// A named project pattern.
pub trait Template {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// A starter configuration file for this template.
    fn sample_config(&self) -> &'static str;

    /// Builds the component tree from `config`. Every configuration error
    /// is reported here, before anything is written.
    fn root_component(&self, config: &TemplateConfig) -> Result<DirComponent, GenerateError>;

    /// Generates the project into `destination`.
    ///
    /// The tree runs once in validate-only mode and then for real, so a
    /// failing resource leaves no partial output behind.
    fn run(
        &self,
        config: &TemplateConfig,
        destination: &Path,
    ) -> Result<GenerationReport, GenerateError> {
        let root = self.root_component(config)?;

        let mut validation = TemplateContext::new(self.name(), destination, true);
        root.execute(&mut validation)?;

        info!(template = self.name(), "generating into {}", destination.display());
        let mut context = TemplateContext::new(self.name(), destination, false);
        root.execute(&mut context)?;
        Ok(context.into_report())
    }
}

/// Returns `length` copies of `ch`, e.g. `=====`.
pub fn create_underline(length: usize, ch: char) -> String {
    std::iter::repeat_n(ch, length).collect()
}

fn default_dependencies() -> Vec<(String, String)> {
    [
        ("dxlbootstrap", format!("\"{}\"", dxlbootstrap::VERSION)),
        ("async-trait", "\"0.1\"".to_string()),
        ("serde_json", "\"1.0\"".to_string()),
        ("tokio", "{ version = \"1\", features = [\"full\"] }".to_string()),
        ("tracing", "\"0.1\"".to_string()),
        (
            "tracing-subscriber",
            "{ version = \"0.3\", features = [\"env-filter\"] }".to_string(),
        ),
    ]
    .into_iter()
    .map(|(name, spec)| (name.to_string(), spec))
    .collect()
}

/// Renders the `[dependencies]` entries of a generated `Cargo.toml`.
///
/// `requires` entries are `crate` or `crate@version`. An entry naming one of
/// the default dependencies replaces it.
pub fn create_dependencies(requires: &[String]) -> String {
    let mut dependencies = default_dependencies();
    for requirement in requires {
        let (name, spec) = match requirement.split_once('@') {
            Some((name, version)) => (name.trim(), format!("\"{}\"", version.trim())),
            None => (requirement.trim(), "\"*\"".to_string()),
        };
        match dependencies.iter_mut().find(|(existing, _)| existing == name) {
            Some(entry) => entry.1 = spec,
            None => dependencies.push((name.to_string(), spec)),
        }
    }

    dependencies
        .iter()
        .map(|(name, spec)| format!("{name} = {spec}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Drops the `.Z` part of an `X.Y.Z` version; other versions are returned
/// unchanged.
pub fn remove_z_version(version: &str) -> &str {
    if version.matches('.').count() == 2
        && let Some((xy, _)) = version.rsplit_once('.')
    {
        return xy;
    }
    version
}

/// Tag of the `rust` image the generated Dockerfile builds with.
pub fn create_docker_image_version(rust_version: Option<&str>) -> String {
    rust_version.map_or_else(
        || DEFAULT_DOCKER_RUST_VERSION.to_string(),
        |v| remove_z_version(v).to_string(),
    )
}

/// Toolchain requirement sentence for the installation documentation.
pub fn create_installation_doc_version_text(rust_version: Option<&str>) -> String {
    const OS_TEXT: &str = "installed within a Windows or Linux environment.";
    match rust_version {
        Some(version) => format!("Rust {version} or higher {OS_TEXT}"),
        None => format!("A stable Rust toolchain {OS_TEXT}"),
    }
}

/// Quotes `value` as a Rust string literal.
pub fn rust_literal(value: &str) -> String {
    format!("{value:?}")
}

/// Variables every template passes to its package-level resources.
pub fn package_vars(package: &PackageSettings) -> tera::Context {
    let rust_version = package.rust_version.as_deref();

    let mut vars = tera::Context::new();
    vars.insert("name", &package.name);
    vars.insert("full_name", &package.full_name);
    vars.insert(
        "full_name_sep",
        &create_underline(package.full_name.chars().count(), '='),
    );
    vars.insert("copyright", &package.copyright);
    vars.insert("edition", &package.edition);
    vars.insert("rust_version", rust_version.unwrap_or(""));
    vars.insert("dependencies", &create_dependencies(&package.install_requires));
    vars.insert("docker_rust_version", &create_docker_image_version(rust_version));
    vars.insert(
        "install_doc_text",
        &create_installation_doc_version_text(rust_version),
    );
    vars
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_underline() {
        assert_eq!(create_underline(5, '='), "=====");
        assert_eq!(create_underline(0, '-'), "");
    }

    #[test]
    fn test_create_dependencies_replaces_defaults() {
        let deps = create_dependencies(&["tokio@1.40".to_string(), "reqwest".to_string()]);
        let lines: Vec<&str> = deps.lines().collect();

        assert_eq!(lines[0], format!("dxlbootstrap = \"{}\"", dxlbootstrap::VERSION));
        assert!(lines.contains(&"tokio = \"1.40\""));
        assert_eq!(lines.iter().filter(|l| l.starts_with("tokio ")).count(), 1);
        assert_eq!(lines.last(), Some(&"reqwest = \"*\""));
    }

    #[test]
    fn test_remove_z_version() {
        assert_eq!(remove_z_version("1.75.0"), "1.75");
        assert_eq!(remove_z_version("1.75"), "1.75");
        assert_eq!(remove_z_version("1"), "1");
    }

    #[test]
    fn test_version_text_helpers() {
        assert_eq!(create_docker_image_version(Some("1.80.1")), "1.80");
        assert_eq!(create_docker_image_version(None), DEFAULT_DOCKER_RUST_VERSION);
        assert_eq!(
            create_installation_doc_version_text(Some("1.80")),
            "Rust 1.80 or higher installed within a Windows or Linux environment."
        );
        assert!(create_installation_doc_version_text(None).starts_with("A stable Rust toolchain"));
    }

    #[test]
    fn test_rust_literal_escapes() {
        assert_eq!(rust_literal("/a/b"), "\"/a/b\"");
        assert_eq!(rust_literal("say \"hi\""), "\"say \\\"hi\\\"\"");
    }
}
