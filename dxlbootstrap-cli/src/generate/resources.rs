//! Static resources embedded in the binary and rendered with tera.

use std::error::Error as _;

use super::error::GenerateError;

macro_rules! resource {
    ($name:literal) => {
        ($name, include_str!(concat!("static/", $name)))
    };
}

const RESOURCES: &[(&str, &str)] = &[
    resource!("common/README.tera"),
    resource!("common/README.md.tera"),
    resource!("common/Cargo.toml.tera"),
    resource!("common/LICENSE.tera"),
    resource!("common/gitignore.tera"),
    resource!("common/close_brace.tera"),
    resource!("common/fn_footer.tera"),
    resource!("common/config/dxlclient.config.tera"),
    resource!("common/examples/common_mod.rs.tera"),
    resource!("common/doc/overview.md.tera"),
    resource!("common/doc/sampleconfig.md.tera"),
    resource!("app/Dockerfile.tera"),
    resource!("app/config/app.config.tera"),
    resource!("app/src/lib.rs.tera"),
    resource!("app/src/lib_footer.rs.tera"),
    resource!("app/src/app.rs.tera"),
    resource!("app/src/main.rs.tera"),
    resource!("app/src/event_handlers.rs.tera"),
    resource!("app/src/request_handlers.rs.tera"),
    resource!("app/code/lib_event_handlers_mod.tera"),
    resource!("app/code/lib_request_handlers_mod.tera"),
    resource!("app/code/event_callback.tera"),
    resource!("app/code/request_callback.tera"),
    resource!("app/code/register_event_handlers_def.tera"),
    resource!("app/code/register_event_handler.tera"),
    resource!("app/code/register_services_def.tera"),
    resource!("app/code/service_create.tera"),
    resource!("app/code/service_register.tera"),
    resource!("app/code/service_add_topic.tera"),
    resource!("app/code/sample_event.tera"),
    resource!("app/code/sample_request.tera"),
    resource!("app/examples/basic_sample.rs.tera"),
    resource!("app/examples/basic_sample_footer.rs.tera"),
    resource!("app/doc/index.md.tera"),
    resource!("app/doc/installation.md.tera"),
    resource!("app/doc/running.md.tera"),
    resource!("app/doc/configuration.md.tera"),
    resource!("client/src/lib.rs.tera"),
    resource!("client/src/client.rs.tera"),
    resource!("client/code/example_method.tera"),
    resource!("client/code/invoke_example_method.tera"),
    resource!("client/examples/basic_sample.rs.tera"),
    resource!("client/examples/basic_sample_footer.rs.tera"),
    resource!("client/doc/index.md.tera"),
    resource!("client/doc/installation.md.tera"),
];

#[cfg(test)]
const TEST_RESOURCES: &[(&str, &str)] = &[
    ("test/open.tera", "{{ name }} {"),
    ("test/line.tera", "{{ name }}"),
];

fn lookup(table: &[(&'static str, &'static str)], name: &str) -> Option<&'static str> {
    table.iter().find(|(n, _)| *n == name).map(|(_, r)| *r)
}

#[cfg(test)]
fn test_resource(name: &str) -> Option<&'static str> {
    lookup(TEST_RESOURCES, name)
}

#[cfg(not(test))]
fn test_resource(_name: &str) -> Option<&'static str> {
    None
}

pub fn get(name: &str) -> Option<&'static str> {
    lookup(RESOURCES, name).or_else(|| test_resource(name))
}

/// Renders `name` with `vars` and returns its lines.
pub fn render(name: &str, vars: &tera::Context) -> Result<Vec<String>, GenerateError> {
    let source = get(name).ok_or_else(|| GenerateError::UnknownResource(name.to_string()))?;
    let rendered = tera::Tera::one_off(source, vars, false).map_err(|err| GenerateError::Render {
        resource: name.to_string(),
        details: describe(&err),
    })?;
    Ok(rendered.lines().map(str::to_string).collect())
}

fn describe(err: &tera::Error) -> String {
    let mut details = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        details.push_str(": ");
        details.push_str(&inner.to_string());
        source = inner.source();
    }
    details
}
