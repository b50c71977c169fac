//! `client-template`: a wrapper that hides DXL topics and message formats
//! behind typed methods.

use crate::generate::component::{CodeComponent, DirComponent, FileComponent};
use crate::generate::config::{PackageSettings, TemplateConfig};
use crate::generate::error::GenerateError;
use crate::generate::template::{Template, package_vars};

pub const NAME: &str = "client-template";
const SECTION: &str = "Client";

const SAMPLE_CONFIG: &str = include_str!("../static/client/sample.toml");

#[derive(Debug, Clone, PartialEq, Eq)]
struct ClientSettings {
    package: PackageSettings,
    client_class_name: String,
    include_example_method: bool,
}

impl ClientSettings {
    fn read(config: &TemplateConfig) -> Result<Self, GenerateError> {
        let section = config.section(SECTION);
        Ok(Self {
            package: PackageSettings::read(&section)?,
            client_class_name: section.identifier_property("clientClassName")?,
            include_example_method: section.boolean_property("includeExampleMethod", true)?,
        })
    }

    fn vars(&self) -> tera::Context {
        let mut vars = package_vars(&self.package);
        vars.insert("client_class_name", &self.client_class_name);
        vars
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ClientTemplate;

pub fn new_instance() -> Box<dyn Template> {
    Box::new(ClientTemplate)
}

impl ClientTemplate {
    fn root_files(root: &mut DirComponent, vars: &tera::Context) {
        root.add_child(FileComponent::new("README", "common/README.tera", vars.clone()));
        root.add_child(FileComponent::new("README.md", "common/README.md.tera", vars.clone()));
        root.add_child(FileComponent::new("Cargo.toml", "common/Cargo.toml.tera", vars.clone()));
        root.add_child(FileComponent::new("LICENSE", "common/LICENSE.tera", vars.clone()));
        root.add_child(FileComponent::new(".gitignore", "common/gitignore.tera", vars.clone()));
    }

    fn src_directory(settings: &ClientSettings, vars: &tera::Context) -> DirComponent {
        let mut client_vars = vars.clone();
        let imports = if settings.include_example_method {
            "use dxlbootstrap::{Message, message_utils};\nuse serde_json::Value;\n"
        } else {
            ""
        };
        client_vars.insert("additional_imports", imports);

        let mut client = FileComponent::new("client.rs", "client/src/client.rs.tera", client_vars)
            .with_footer("common/close_brace.tera");
        if settings.include_example_method {
            client.add_child(
                CodeComponent::new("client/code/example_method.tera", vars.clone()).with_indent(1),
            );
        }

        DirComponent::new("src")
            .with_child(FileComponent::new("lib.rs", "client/src/lib.rs.tera", vars.clone()))
            .with_child(client)
    }

    fn sample_directory(vars: &tera::Context) -> DirComponent {
        DirComponent::new("sample")
            .with_child(FileComponent::new(
                "dxlclient.config",
                "common/config/dxlclient.config.tera",
                vars.clone(),
            ))
            .with_child(FileComponent::new(
                "dxlclient.config.dist",
                "common/config/dxlclient.config.tera",
                vars.clone(),
            ))
    }

    fn examples_directory(settings: &ClientSettings, vars: &tera::Context) -> DirComponent {
        let mut sample_vars = vars.clone();
        let imports = if settings.include_example_method {
            "use dxlbootstrap::message_utils;\nuse serde_json::json;\n"
        } else {
            ""
        };
        sample_vars.insert("additional_imports", imports);

        let mut basic_sample = FileComponent::new(
            "basic_sample.rs",
            "client/examples/basic_sample.rs.tera",
            sample_vars,
        )
        .with_footer("client/examples/basic_sample_footer.rs.tera");
        if settings.include_example_method {
            basic_sample.add_child(
                CodeComponent::new("client/code/invoke_example_method.tera", vars.clone())
                    .with_indent(1),
            );
        }

        DirComponent::new("examples")
            .with_child(DirComponent::new("common").with_child(FileComponent::new(
                "mod.rs",
                "common/examples/common_mod.rs.tera",
                vars.clone(),
            )))
            .with_child(basic_sample)
    }

    fn docs_directory(vars: &tera::Context) -> DirComponent {
        let sdk = DirComponent::new("sdk")
            .with_child(FileComponent::new("index.md", "client/doc/index.md.tera", vars.clone()))
            .with_child(FileComponent::new(
                "overview.md",
                "common/doc/overview.md.tera",
                vars.clone(),
            ))
            .with_child(FileComponent::new(
                "installation.md",
                "client/doc/installation.md.tera",
                vars.clone(),
            ))
            .with_child(FileComponent::new(
                "sampleconfig.md",
                "common/doc/sampleconfig.md.tera",
                vars.clone(),
            ));
        DirComponent::new("doc").with_child(sdk)
    }
}

impl Template for ClientTemplate {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Client wrapper that hides DXL topics and message formats behind typed methods"
    }

    fn sample_config(&self) -> &'static str {
        SAMPLE_CONFIG
    }

    fn root_component(&self, config: &TemplateConfig) -> Result<DirComponent, GenerateError> {
        let settings = ClientSettings::read(config)?;
        let vars = settings.vars();

        let mut root = DirComponent::new("");
        Self::root_files(&mut root, &vars);
        root.add_child(Self::src_directory(&settings, &vars));
        root.add_child(Self::sample_directory(&vars));
        root.add_child(Self::examples_directory(&settings, &vars));
        root.add_child(Self::docs_directory(&vars));
        Ok(root)
    }
}
