//! Template configuration files.
//!
//! A template configuration is a TOML document. Each table is a section and
//! options are read by name. Lists may be written as TOML arrays or as a
//! comma-delimited string where `'` quotes items that contain commas.

use std::fs;
use std::path::Path;

use regex::Regex;

use super::error::{GenerateError, NoOptionError};

const CRATE_NAME_PATTERN: &str = r"^[a-z][a-z0-9_]*$";
const IDENTIFIER_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*$";
const RUST_VERSION_PATTERN: &str = r"^\d+(\.\d*){0,2}$";

pub const DEFAULT_EDITION: &str = "2021";
const EDITIONS: [&str; 3] = ["2018", "2021", "2024"];

/// Strict and reserved keywords of the 2018 and later editions.
const RUST_KEYWORDS: &[&str] = &[
    "_", "abstract", "as", "async", "await", "become", "box", "break", "const", "continue",
    "crate", "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if",
    "impl", "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv",
    "pub", "ref", "return", "self", "Self", "static", "struct", "super", "trait", "true", "try",
    "type", "typeof", "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

fn matches(pattern: &str, value: &str) -> bool {
    Regex::new(pattern).is_ok_and(|re| re.is_match(value))
}

fn is_keyword(value: &str) -> bool {
    RUST_KEYWORDS.contains(&value)
}

/// The parsed configuration file for a template.
#[derive(Debug, Clone, Default)]
pub struct TemplateConfig {
    table: toml::Table,
}

impl TemplateConfig {
    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        Ok(Self {
            table: toml::from_str(contents)?,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, GenerateError> {
        let contents = fs::read_to_string(path).map_err(|err| {
            tracing::debug!("unable to read {}: {err}", path.display());
            GenerateError::ConfigRead(path.to_path_buf())
        })?;
        Self::parse(&contents).map_err(|err| {
            tracing::debug!("unable to parse {}: {err}", path.display());
            GenerateError::ConfigRead(path.to_path_buf())
        })
    }

    pub fn section(&self, name: &str) -> ConfigSection<'_> {
        ConfigSection {
            name: name.to_string(),
            table: self.table.get(name).and_then(toml::Value::as_table),
        }
    }
}

/// Read access to one section of a [`TemplateConfig`].
#[derive(Debug, Clone)]
pub struct ConfigSection<'a> {
    name: String,
    table: Option<&'a toml::Table>,
}

impl ConfigSection<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }

    fn value(&self, option: &str) -> Option<&toml::Value> {
        self.table.and_then(|t| t.get(option))
    }

    pub fn property(&self, option: &str) -> Option<String> {
        self.value(option).map(value_to_string)
    }

    pub fn property_or(&self, option: &str, default: &str) -> String {
        self.property(option).unwrap_or_else(|| default.to_string())
    }

    pub fn required_property(&self, option: &str) -> Result<String, NoOptionError> {
        self.property(option)
            .ok_or_else(|| NoOptionError::new(option, &self.name))
    }

    /// Accepts TOML booleans and `1/yes/true/on`, `0/no/false/off` strings.
    pub fn boolean_property(&self, option: &str, default: bool) -> Result<bool, GenerateError> {
        let Some(value) = self.value(option) else {
            return Ok(default);
        };
        let parsed = match value {
            toml::Value::Boolean(b) => Some(*b),
            toml::Value::Integer(1) => Some(true),
            toml::Value::Integer(0) => Some(false),
            toml::Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "yes" | "true" | "on" => Some(true),
                "0" | "no" | "false" | "off" => Some(false),
                _ => None,
            },
            _ => None,
        };
        parsed.ok_or_else(|| self.invalid(option, &value_to_string(value), "not a boolean"))
    }

    /// List option; missing or empty lists yield an empty vector.
    pub fn list_property(&self, option: &str) -> Vec<String> {
        let items = match self.value(option) {
            None => Vec::new(),
            Some(toml::Value::Array(values)) => values.iter().map(value_to_string).collect(),
            Some(toml::Value::String(s)) => split_list(s),
            Some(other) => vec![value_to_string(other)],
        };
        items
            .into_iter()
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect()
    }

    pub fn required_list_property(&self, option: &str) -> Result<Vec<String>, NoOptionError> {
        let items = self.list_property(option);
        if items.is_empty() {
            return Err(NoOptionError::new(option, &self.name));
        }
        Ok(items)
    }

    /// Required option that must be a Rust identifier.
    pub fn identifier_property(&self, option: &str) -> Result<String, GenerateError> {
        let value = self.required_property(option)?;
        if !matches(IDENTIFIER_PATTERN, &value) {
            return Err(self.invalid(option, &value, "expected a Rust identifier"));
        }
        if is_keyword(&value) {
            return Err(self.invalid(option, &value, "Rust keywords cannot be used as names"));
        }
        Ok(value)
    }

    pub(crate) fn invalid(&self, option: &str, value: &str, reason: &str) -> GenerateError {
        GenerateError::InvalidValue {
            section: self.name.clone(),
            option: option.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

fn value_to_string(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Splits a comma-delimited list. A field that starts with `'` is quoted
/// and may contain commas; `''` inside quotes is a literal quote.
fn split_list(value: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = value.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' if in_quotes => {
                if chars.peek() == Some(&'\'') {
                    current.push('\'');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '\'' if current.is_empty() => in_quotes = true,
            ',' | '\n' | '\r' if !in_quotes => items.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    items.push(current);
    items
}

/// Package details shared by every template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSettings {
    pub name: String,
    pub full_name: String,
    pub copyright: String,
    pub install_requires: Vec<String>,
    pub edition: String,
    pub rust_version: Option<String>,
}

impl PackageSettings {
    pub fn read(section: &ConfigSection<'_>) -> Result<Self, GenerateError> {
        let name = section.required_property("name")?;
        if !matches(CRATE_NAME_PATTERN, &name) {
            return Err(section.invalid(
                "name",
                &name,
                "expected a lowercase crate name (letters, digits and underscores)",
            ));
        }
        if is_keyword(&name) {
            return Err(section.invalid("name", &name, "Rust keywords cannot be used as names"));
        }

        let edition = section.property_or("edition", DEFAULT_EDITION);
        if !EDITIONS.contains(&edition.as_str()) {
            return Err(section.invalid("edition", &edition, "expected 2018, 2021 or 2024"));
        }

        let rust_version = section.property("rustVersion").map(|v| v.trim().to_string());
        if let Some(version) = &rust_version
            && !matches(RUST_VERSION_PATTERN, version)
        {
            return Err(GenerateError::RustVersion(version.clone()));
        }

        Ok(Self {
            name,
            full_name: section.required_property("fullName")?,
            copyright: section.property_or("copyright", ""),
            install_requires: section.list_property("installRequires"),
            edition,
            rust_version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list_quotes() {
        assert_eq!(split_list("a, b,c"), vec!["a", " b", "c"]);
        assert_eq!(split_list("'x,y',z"), vec!["x,y", "z"]);
        assert_eq!(split_list("'it''s',ok"), vec!["it's", "ok"]);
    }

    #[test]
    fn test_list_property_forms() {
        let config = TemplateConfig::parse(
            r#"
[S]
csv = "one, two,, three"
array = ["a", " ", "b"]
empty = ""
"#,
        )
        .unwrap();
        let section = config.section("S");
        assert_eq!(section.list_property("csv"), vec!["one", "two", "three"]);
        assert_eq!(section.list_property("array"), vec!["a", "b"]);
        assert!(section.list_property("empty").is_empty());
        assert!(section.list_property("missing").is_empty());

        let err = section.required_list_property("empty").unwrap_err();
        assert_eq!(err.to_string(), "No option 'empty' in section: 'S'");
    }

    #[test]
    fn test_boolean_property() {
        let config = TemplateConfig::parse(
            r#"
[S]
a = "yes"
b = "Off"
c = true
d = "maybe"
"#,
        )
        .unwrap();
        let section = config.section("S");
        assert!(section.boolean_property("a", false).unwrap());
        assert!(!section.boolean_property("b", true).unwrap());
        assert!(section.boolean_property("c", false).unwrap());
        assert!(section.boolean_property("missing", true).unwrap());
        assert!(section.boolean_property("d", true).is_err());
    }

    #[test]
    fn test_identifier_property_rejects_keywords() {
        let config = TemplateConfig::parse(
            r#"
[S]
plain = "GeoCallback"
keyword = "type"
self_type = "Self"
underscore = "_"
"#,
        )
        .unwrap();
        let section = config.section("S");
        assert_eq!(section.identifier_property("plain").unwrap(), "GeoCallback");
        for option in ["keyword", "self_type", "underscore"] {
            assert!(
                matches!(
                    section.identifier_property(option),
                    Err(GenerateError::InvalidValue { .. })
                ),
                "{option}"
            );
        }
    }

    #[test]
    fn test_missing_section_reports_option() {
        let config = TemplateConfig::default();
        let err = config.section("Client").required_property("name").unwrap_err();
        assert_eq!(err, NoOptionError::new("name", "Client"));
    }

    #[test]
    fn test_package_settings() {
        let config = TemplateConfig::parse(
            r#"
[Client]
name = "myclient"
fullName = "My Client"
installRequires = "reqwest@0.12, 'serde@1'"
rustVersion = "1.75"
"#,
        )
        .unwrap();
        let package = PackageSettings::read(&config.section("Client")).unwrap();
        assert_eq!(package.name, "myclient");
        assert_eq!(package.copyright, "");
        assert_eq!(package.edition, DEFAULT_EDITION);
        assert_eq!(package.install_requires, vec!["reqwest@0.12", "serde@1"]);
        assert_eq!(package.rust_version.as_deref(), Some("1.75"));
    }

    #[test]
    fn test_package_settings_rejects_bad_values() {
        for bad in [
            "name = \"My-Client\"",
            "name = \"match\"",
            "name = \"c\"\nedition = \"2015\"",
        ] {
            let config = TemplateConfig::parse(&format!("[C]\n{bad}\nfullName = \"x\"\n")).unwrap();
            assert!(
                matches!(
                    PackageSettings::read(&config.section("C")),
                    Err(GenerateError::InvalidValue { .. })
                ),
                "{bad}"
            );
        }

        let bad_version = TemplateConfig::parse(
            "[C]\nname = \"c\"\nfullName = \"x\"\nrustVersion = \"1.x\"\n",
        )
        .unwrap();
        let err = PackageSettings::read(&bad_version.section("C")).unwrap_err();
        assert!(err.to_string().starts_with("Unexpected value in rustVersion: 1.x."));
    }
}
