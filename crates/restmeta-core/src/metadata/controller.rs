//! Controller generation over a class and its ancestors.

use std::collections::HashSet;

use super::method::MethodGenerator;
use super::resolve_type::Ancestors;
use super::{read_security, Controller, Method};
use crate::config::Settings;
use crate::decorators::{get_decorator_text_value, get_unique_values};
use crate::path::normalize_path;
use crate::syntax::{ClassDecl, Program, SourceFile};
use crate::error::Scope;
use crate::{Error, Result};

/// Generates the [`Controller`] for one class declaration.
pub struct ControllerGenerator<'a> {
    program: &'a Program,
    settings: &'a Settings,
    file: &'a SourceFile,
    node: &'a ClassDecl,
    path: String,
}

impl<'a> ControllerGenerator<'a> {
    pub fn new(
        program: &'a Program,
        settings: &'a Settings,
        file: &'a SourceFile,
        node: &'a ClassDecl,
    ) -> Self {
        let path = class_path(program, file, node);
        Self {
            program,
            settings,
            file,
            node,
            path,
        }
    }

    /// Every class can be documented: a class without `Path` or a usable
    /// `PathFromGenericArg` lives at the empty root path.
    pub fn is_valid(&self) -> bool {
        true
    }

    pub fn generate(&self) -> Result<Controller> {
        if self.file.file_name.is_empty() {
            return Err(Error::linkage(
                "Controller node doesn't have a valid parent source file.",
            ));
        }
        let name = self
            .node
            .name
            .as_deref()
            .ok_or_else(|| Error::linkage("Controller node doesn't have a valid name."))?;
        log::debug!("Generating controller {} from {}", name, self.file.file_name);

        Ok(Controller {
            name: name.to_string(),
            location: self.file.file_name.clone(),
            methods: self.build_methods(&self.path)?,
            path: self.path.clone(),
            tags: get_unique_values(self.node, "Tags", name, Scope::Controller)?,
            security: read_security(self.node),
            consumes: get_unique_values(self.node, "Accept", name, Scope::Controller)?,
            produces: get_unique_values(self.node, "Produces", name, Scope::Controller)?,
        })
    }

    /// Valid methods of the class and its ancestors; the most derived
    /// declaration of a name wins.
    fn build_methods(&self, path: &str) -> Result<Vec<Method>> {
        let mut seen = HashSet::new();
        let mut methods = Vec::new();

        for ancestor in Ancestors::new(self.program, self.file, self.node) {
            let class_name = ancestor.declaration.name.as_deref().unwrap_or("<anonymous>");
            for node in &ancestor.declaration.methods {
                let generator =
                    MethodGenerator::new(self.settings, node, class_name, path, ancestor.bindings())?;
                if !generator.is_valid() {
                    continue;
                }
                match generator.name() {
                    Some(name) if !seen.insert(name.to_string()) => {}
                    // a nameless operation fails in generate()
                    _ => methods.push(generator.generate()?),
                }
            }
        }
        Ok(methods)
    }
}

/// Explicit `Path` of the class, else a `PathFromGenericArg` template bound
/// to the first type argument the hierarchy supplies to its ancestor.
fn class_path(program: &Program, file: &SourceFile, node: &ClassDecl) -> String {
    if let Some(path) =
        get_decorator_text_value(node, |d| d.name == "Path").filter(|p| !p.is_empty())
    {
        return normalize_path(&path);
    }

    Ancestors::new(program, file, node)
        .skip(1)
        .find_map(|ancestor| {
            get_decorator_text_value(ancestor.declaration, |d| d.name == "PathFromGenericArg")
                .map(|template| (template, ancestor))
        })
        .and_then(|(template, ancestor)| {
            let argument = ancestor.type_arguments.first()?;
            Some(normalize_path(
                &template.replace("{type}", &argument.to_string()),
            ))
        })
        .unwrap_or_default()
}
