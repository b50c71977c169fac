//! `application-template`: a persistent application that listens for
//! events and exposes services.

use std::collections::BTreeSet;

use crate::generate::component::{CodeComponent, DirComponent, FileComponent};
use crate::generate::config::{PackageSettings, TemplateConfig};
use crate::generate::error::GenerateError;
use crate::generate::template::{Template, create_underline, package_vars, rust_literal};

pub const NAME: &str = "application-template";
const SECTION: &str = "Application";

const SAMPLE_CONFIG: &str = include_str!("../static/app/sample.toml");

/// An event or request handler section.
#[derive(Debug, Clone, PartialEq, Eq)]
struct HandlerSettings {
    name: String,
    topic: String,
    class_name: String,
    separate_thread: bool,
}

impl HandlerSettings {
    fn read(config: &TemplateConfig, name: &str) -> Result<Self, GenerateError> {
        let section = config.section(name);
        Ok(Self {
            name: name.to_string(),
            topic: section.required_property("topic")?,
            class_name: section.identifier_property("className")?,
            separate_thread: section.boolean_property("separateThread", true)?,
        })
    }

    fn vars(&self) -> tera::Context {
        let mut vars = tera::Context::new();
        vars.insert("name", &self.name);
        vars.insert("name_literal", &rust_literal(&self.name));
        vars.insert("topic", &self.topic);
        vars.insert("topic_literal", &rust_literal(&self.topic));
        vars.insert("class_name", &self.class_name);
        vars.insert("separate_thread", &self.separate_thread);
        vars
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ServiceSettings {
    name: String,
    service_type: String,
    request_handlers: Vec<HandlerSettings>,
}

impl ServiceSettings {
    fn read(config: &TemplateConfig, name: &str) -> Result<Self, GenerateError> {
        let section = config.section(name);
        let request_handlers = section
            .list_property("requestHandlers")
            .iter()
            .map(|handler| HandlerSettings::read(config, handler))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: name.to_string(),
            service_type: section.required_property("serviceType")?,
            request_handlers,
        })
    }

    fn vars(&self) -> tera::Context {
        let mut vars = tera::Context::new();
        vars.insert("name", &self.name);
        vars.insert("service_type_literal", &rust_literal(&self.service_type));
        vars
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AppSettings {
    package: PackageSettings,
    app_class_name: String,
    event_handlers: Vec<HandlerSettings>,
    services: Vec<ServiceSettings>,
}

impl AppSettings {
    fn read(config: &TemplateConfig) -> Result<Self, GenerateError> {
        let section = config.section(SECTION);
        let package = PackageSettings::read(&section)?;
        let app_class_name = section.identifier_property("appClassName")?;

        let event_handlers = section
            .list_property("eventHandlers")
            .iter()
            .map(|handler| HandlerSettings::read(config, handler))
            .collect::<Result<Vec<_>, _>>()?;
        let services = section
            .list_property("services")
            .iter()
            .map(|service| ServiceSettings::read(config, service))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            package,
            app_class_name,
            event_handlers,
            services,
        })
    }

    fn has_events(&self) -> bool {
        !self.event_handlers.is_empty()
    }

    fn has_services(&self) -> bool {
        !self.services.is_empty()
    }

    fn request_handlers(&self) -> impl Iterator<Item = &HandlerSettings> {
        self.services.iter().flat_map(|s| s.request_handlers.iter())
    }

    fn has_request_handlers(&self) -> bool {
        self.request_handlers().next().is_some()
    }

    fn vars(&self) -> tera::Context {
        let package = &self.package;
        let config_title = format!("{} ({}.config)", package.full_name, package.name);

        let mut vars = package_vars(package);
        vars.insert("app_class_name", &self.app_class_name);
        vars.insert("config_title_sep", &create_underline(config_title.chars().count(), '-'));
        vars.insert("config_title", &config_title);
        vars
    }

    /// Imports `app.rs` needs for the handlers and services it registers.
    fn additional_imports(&self) -> String {
        let mut imports = String::new();
        if self.has_services() {
            imports.push_str("use dxlbootstrap::fabric::ServiceRegistrationInfo;\n");
        }
        if self.has_events() || self.has_request_handlers() {
            imports.push('\n');
        }
        if self.has_events() {
            imports.push_str("use crate::event_handlers::*;\n");
        }
        if self.has_request_handlers() {
            imports.push_str("use crate::request_handlers::*;\n");
        }
        imports
    }
}

/// Adds one callback definition per distinct class name.
fn add_callback_definitions<'a>(
    file: &mut FileComponent,
    resource: &'static str,
    handlers: impl Iterator<Item = &'a HandlerSettings>,
) {
    let mut defined = BTreeSet::new();
    for handler in handlers {
        if defined.insert(handler.class_name.clone()) {
            file.add_child(CodeComponent::new(resource, handler.vars()));
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AppTemplate;

pub fn new_instance() -> Box<dyn Template> {
    Box::new(AppTemplate)
}

impl AppTemplate {
    fn root_files(root: &mut DirComponent, vars: &tera::Context) {
        root.add_child(FileComponent::new("README", "common/README.tera", vars.clone()));
        root.add_child(FileComponent::new("README.md", "common/README.md.tera", vars.clone()));
        root.add_child(FileComponent::new("Cargo.toml", "common/Cargo.toml.tera", vars.clone()));
        root.add_child(FileComponent::new("LICENSE", "common/LICENSE.tera", vars.clone()));
        root.add_child(FileComponent::new(".gitignore", "common/gitignore.tera", vars.clone()));
        root.add_child(FileComponent::new("Dockerfile", "app/Dockerfile.tera", vars.clone()));
    }

    fn config_directory(settings: &AppSettings, vars: &tera::Context) -> DirComponent {
        let app_config = format!("{}.config", settings.package.name);
        DirComponent::new("config")
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
            .with_child(FileComponent::new(
                app_config.clone(),
                "app/config/app.config.tera",
                vars.clone(),
            ))
            .with_child(FileComponent::new(
                format!("{app_config}.dist"),
                "app/config/app.config.tera",
                vars.clone(),
            ))
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

    fn examples_directory(settings: &AppSettings, vars: &tera::Context) -> DirComponent {
        let mut basic_sample = FileComponent::new(
            "basic_sample.rs",
            "app/examples/basic_sample.rs.tera",
            vars.clone(),
        )
        .with_footer("app/examples/basic_sample_footer.rs.tera");
        for handler in &settings.event_handlers {
            basic_sample.add_child(
                CodeComponent::new("app/code/sample_event.tera", handler.vars()).with_indent(1),
            );
        }
        for handler in settings.request_handlers() {
            basic_sample.add_child(
                CodeComponent::new("app/code/sample_request.tera", handler.vars()).with_indent(1),
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
            .with_child(FileComponent::new("index.md", "app/doc/index.md.tera", vars.clone()))
            .with_child(FileComponent::new(
                "overview.md",
                "common/doc/overview.md.tera",
                vars.clone(),
            ))
            .with_child(FileComponent::new(
                "installation.md",
                "app/doc/installation.md.tera",
                vars.clone(),
            ))
            .with_child(FileComponent::new("running.md", "app/doc/running.md.tera", vars.clone()))
            .with_child(FileComponent::new(
                "configuration.md",
                "app/doc/configuration.md.tera",
                vars.clone(),
            ))
            .with_child(FileComponent::new(
                "sampleconfig.md",
                "common/doc/sampleconfig.md.tera",
                vars.clone(),
            ));
        DirComponent::new("doc").with_child(sdk)
    }

    fn app_file(settings: &AppSettings, vars: &tera::Context) -> FileComponent {
        let mut app_vars = vars.clone();
        app_vars.insert("additional_imports", &settings.additional_imports());
        let mut app_file = FileComponent::new("app.rs", "app/src/app.rs.tera", app_vars)
            .with_footer("common/close_brace.tera");

        if settings.has_events() {
            let mut register = CodeComponent::new(
                "app/code/register_event_handlers_def.tera",
                tera::Context::new(),
            )
            .with_indent(1)
            .with_footer("common/fn_footer.tera");
            for handler in &settings.event_handlers {
                register.add_child(
                    CodeComponent::new("app/code/register_event_handler.tera", handler.vars())
                        .with_indent(1),
                );
            }
            app_file.add_child(register);
        }

        if settings.has_services() {
            let mut register =
                CodeComponent::new("app/code/register_services_def.tera", tera::Context::new())
                    .with_indent(1)
                    .with_footer("common/fn_footer.tera");
            for service in &settings.services {
                let mut create = CodeComponent::new("app/code/service_create.tera", service.vars())
                    .with_indent(1)
                    .with_footer("app/code/service_register.tera");
                for handler in &service.request_handlers {
                    create.add_child(CodeComponent::new(
                        "app/code/service_add_topic.tera",
                        handler.vars(),
                    ));
                }
                register.add_child(create);
            }
            app_file.add_child(register);
        }

        app_file
    }

    fn src_directory(settings: &AppSettings, vars: &tera::Context) -> DirComponent {
        let mut lib = FileComponent::new("lib.rs", "app/src/lib.rs.tera", vars.clone())
            .with_footer("app/src/lib_footer.rs.tera");
        if settings.has_events() {
            lib.add_child(CodeComponent::new("app/code/lib_event_handlers_mod.tera", vars.clone()));
        }
        if settings.has_request_handlers() {
            lib.add_child(CodeComponent::new(
                "app/code/lib_request_handlers_mod.tera",
                vars.clone(),
            ));
        }

        let mut src = DirComponent::new("src")
            .with_child(lib)
            .with_child(Self::app_file(settings, vars))
            .with_child(FileComponent::new("main.rs", "app/src/main.rs.tera", vars.clone()));

        if settings.has_events() {
            let mut events = FileComponent::new(
                "event_handlers.rs",
                "app/src/event_handlers.rs.tera",
                vars.clone(),
            );
            add_callback_definitions(
                &mut events,
                "app/code/event_callback.tera",
                settings.event_handlers.iter(),
            );
            src.add_child(events);
        }
        if settings.has_request_handlers() {
            let mut requests = FileComponent::new(
                "request_handlers.rs",
                "app/src/request_handlers.rs.tera",
                vars.clone(),
            );
            add_callback_definitions(
                &mut requests,
                "app/code/request_callback.tera",
                settings.request_handlers(),
            );
            src.add_child(requests);
        }
        src
    }
}

impl Template for AppTemplate {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Persistent application that listens for DXL events and registers DXL services"
    }

    fn sample_config(&self) -> &'static str {
        SAMPLE_CONFIG
    }

    fn root_component(&self, config: &TemplateConfig) -> Result<DirComponent, GenerateError> {
        let settings = AppSettings::read(config)?;
        let vars = settings.vars();

        let mut root = DirComponent::new("");
        Self::root_files(&mut root, &vars);
        root.add_child(Self::config_directory(&settings, &vars));
        root.add_child(Self::sample_directory(&vars));
        root.add_child(Self::examples_directory(&settings, &vars));
        root.add_child(Self::docs_directory(&vars));
        root.add_child(Self::src_directory(&settings, &vars));
        Ok(root)
    }
}
