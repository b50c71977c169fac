//! The component tree a template is built from.
//!
//! Executing a component runs its pre-execute step, its own execute step,
//! each child in order, and finally its post-execute step.

use super::context::TemplateContext;
use super::error::GenerateError;
use super::resources;

pub trait TemplateComponent {
    fn children(&self) -> &[Box<dyn TemplateComponent>];

    fn on_pre_execute(&self, _context: &mut TemplateContext) -> Result<(), GenerateError> {
        Ok(())
    }

    fn on_execute(&self, _context: &mut TemplateContext) -> Result<(), GenerateError> {
        Ok(())
    }

    fn on_post_execute(&self, _context: &mut TemplateContext) -> Result<(), GenerateError> {
        Ok(())
    }

    fn execute(&self, context: &mut TemplateContext) -> Result<(), GenerateError> {
        self.on_pre_execute(context)?;
        self.on_execute(context)?;
        for child in self.children() {
            child.execute(context)?;
        }
        self.on_post_execute(context)
    }
}

/// A directory below the current one. An empty name stands for the current
/// directory itself.
#[derive(Default)]
pub struct DirComponent {
    name: String,
    children: Vec<Box<dyn TemplateComponent>>,
}

impl DirComponent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn add_child(&mut self, child: impl TemplateComponent + 'static) {
        self.children.push(Box::new(child));
    }

    #[must_use]
    pub fn with_child(mut self, child: impl TemplateComponent + 'static) -> Self {
        self.add_child(child);
        self
    }
}

impl TemplateComponent for DirComponent {
    fn children(&self) -> &[Box<dyn TemplateComponent>] {
        &self.children
    }

    fn on_pre_execute(&self, context: &mut TemplateContext) -> Result<(), GenerateError> {
        context.push_directory(&self.name);
        Ok(())
    }

    fn on_execute(&self, context: &mut TemplateContext) -> Result<(), GenerateError> {
        context.create_current_directory()
    }

    fn on_post_execute(&self, context: &mut TemplateContext) -> Result<(), GenerateError> {
        context.pop_directory();
        Ok(())
    }
}

/// A rendered resource written into the open file.
///
/// The indent level is added to the context before the resource and its
/// children are written. The optional footer is written after the children,
/// at the same indent as the resource.
pub struct CodeComponent {
    resource: &'static str,
    vars: tera::Context,
    footer: Option<&'static str>,
    indent_level: usize,
    children: Vec<Box<dyn TemplateComponent>>,
}

impl CodeComponent {
    pub fn new(resource: &'static str, vars: tera::Context) -> Self {
        Self {
            resource,
            vars,
            footer: None,
            indent_level: 0,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_indent(mut self, indent_level: usize) -> Self {
        self.indent_level = indent_level;
        self
    }

    #[must_use]
    pub fn with_footer(mut self, footer: &'static str) -> Self {
        self.footer = Some(footer);
        self
    }

    pub fn add_child(&mut self, child: impl TemplateComponent + 'static) {
        self.children.push(Box::new(child));
    }

    #[must_use]
    pub fn with_child(mut self, child: impl TemplateComponent + 'static) -> Self {
        self.add_child(child);
        self
    }

    fn write_resource(
        &self,
        resource: &'static str,
        context: &mut TemplateContext,
    ) -> Result<(), GenerateError> {
        let lines = resources::render(resource, &self.vars)?;
        context.write_lines(resource, &lines)
    }
}

impl TemplateComponent for CodeComponent {
    fn children(&self) -> &[Box<dyn TemplateComponent>] {
        &self.children
    }

    fn on_pre_execute(&self, context: &mut TemplateContext) -> Result<(), GenerateError> {
        context.increase_indent(self.indent_level);
        Ok(())
    }

    fn on_execute(&self, context: &mut TemplateContext) -> Result<(), GenerateError> {
        self.write_resource(self.resource, context)
    }

    fn on_post_execute(&self, context: &mut TemplateContext) -> Result<(), GenerateError> {
        if let Some(footer) = self.footer {
            self.write_resource(footer, context)?;
        }
        context.decrease_indent(self.indent_level);
        Ok(())
    }
}

/// A file in the current directory whose content is a [`CodeComponent`].
pub struct FileComponent {
    file_name: String,
    code: CodeComponent,
}

impl FileComponent {
    pub fn new(file_name: impl Into<String>, resource: &'static str, vars: tera::Context) -> Self {
        Self {
            file_name: file_name.into(),
            code: CodeComponent::new(resource, vars),
        }
    }

    #[must_use]
    pub fn with_footer(mut self, footer: &'static str) -> Self {
        self.code = self.code.with_footer(footer);
        self
    }

    pub fn add_child(&mut self, child: impl TemplateComponent + 'static) {
        self.code.add_child(child);
    }

    #[must_use]
    pub fn with_child(mut self, child: impl TemplateComponent + 'static) -> Self {
        self.add_child(child);
        self
    }
}

impl TemplateComponent for FileComponent {
    fn children(&self) -> &[Box<dyn TemplateComponent>] {
        self.code.children()
    }

    fn on_pre_execute(&self, context: &mut TemplateContext) -> Result<(), GenerateError> {
        context.open_file(&self.file_name)?;
        self.code.on_pre_execute(context)
    }

    fn on_execute(&self, context: &mut TemplateContext) -> Result<(), GenerateError> {
        self.code.on_execute(context)
    }

    fn on_post_execute(&self, context: &mut TemplateContext) -> Result<(), GenerateError> {
        self.code.on_post_execute(context)?;
        context.close_file()
    }
}
