//! Parameter generation.

use super::resolve_type::{apply_number_format, resolve_type, GenericBindings};
use super::{HttpVerb, Parameter, ParameterLocation, Type};
use crate::decorators::{get_decorators, DecoratorData};
use crate::path::path_placeholders;
use crate::syntax::{Literal, ParamDecl};
use crate::{Error, Result};

/// Parameter decorators that decide where a value is read from
const PARAMETER_DECORATORS: &[&str] = &[
    "PathParam",
    "QueryParam",
    "HeaderParam",
    "CookieParam",
    "FormParam",
    "FileParam",
    "FilesParam",
    "Param",
];

fn is_parameter_decorator(d: &DecoratorData<'_>) -> bool {
    PARAMETER_DECORATORS.contains(&d.name) || d.name.starts_with("Context")
}

/// Builds the [`Parameter`] for one formal parameter of a method.
pub struct ParameterGenerator<'a> {
    parameter: &'a ParamDecl,
    method: HttpVerb,
    path: &'a str,
    bindings: Option<&'a GenericBindings>,
}

impl<'a> ParameterGenerator<'a> {
    /// `path` is the method's composed absolute path.
    pub fn new(
        parameter: &'a ParamDecl,
        method: HttpVerb,
        path: &'a str,
        bindings: Option<&'a GenericBindings>,
    ) -> Self {
        Self {
            parameter,
            method,
            path,
            bindings,
        }
    }

    pub fn generate(&self) -> Result<Parameter> {
        let decorator = get_decorators(self.parameter, is_parameter_decorator)
            .into_iter()
            .next();

        let Some(decorator) = decorator else {
            return self.body_parameter();
        };

        match decorator.name {
            "PathParam" => self.path_parameter(&decorator),
            "QueryParam" => self.named_parameter(&decorator, ParameterLocation::Query),
            "HeaderParam" => self.named_parameter(&decorator, ParameterLocation::Header),
            "CookieParam" => self.loose_parameter(&decorator, ParameterLocation::Cookie),
            "FormParam" => self.named_parameter(&decorator, ParameterLocation::FormData),
            "FileParam" => self.file_parameter(&decorator, Type::named("file")),
            "FilesParam" => self.file_parameter(&decorator, Type::array(Type::named("file"))),
            "Param" => {
                let location = if self.method.accepts_body() {
                    ParameterLocation::FormData
                } else {
                    ParameterLocation::Query
                };
                self.named_parameter(&decorator, location)
            }
            _ => self.loose_parameter(&decorator, ParameterLocation::Context),
        }
    }

    /// Synthetic parameter not backed by a declaration (`BodyType`,
    /// `ParamFromPath`, auto path parameters).
    pub fn build(
        name: &str,
        in_: ParameterLocation,
        type_: Type,
        description: Option<String>,
    ) -> Parameter {
        Parameter {
            name: name.to_string(),
            parameter_name: name.to_string(),
            in_,
            type_,
            required: true,
            default: None,
            description,
        }
    }

    fn validated_type(&self) -> Result<Type> {
        let expr = self
            .parameter
            .type_expr
            .as_ref()
            .ok_or_else(|| Error::unsupported("Parameter has no type declaration."))?;
        let ty = resolve_type(Some(expr), self.bindings);
        Ok(apply_number_format(ty, self.parameter))
    }

    fn wire_name(&self, decorator: &DecoratorData<'_>) -> String {
        decorator
            .first_text()
            .unwrap_or_else(|| self.parameter.name.clone())
    }

    fn default_value(&self) -> Option<serde_json::Value> {
        self.parameter.initializer.as_ref().and_then(Literal::to_json)
    }

    fn required(&self) -> bool {
        !self.parameter.optional && self.parameter.initializer.is_none()
    }

    fn parameter(&self, name: String, in_: ParameterLocation, type_: Type) -> Parameter {
        Parameter {
            name,
            parameter_name: self.parameter.name.clone(),
            in_,
            type_,
            required: self.required(),
            default: self.default_value(),
            description: None,
        }
    }

    fn named_parameter(
        &self,
        decorator: &DecoratorData<'_>,
        in_: ParameterLocation,
    ) -> Result<Parameter> {
        let type_ = self.validated_type()?;
        Ok(self.parameter(self.wire_name(decorator), in_, type_))
    }

    /// Context and cookie inputs are dropped later, so an untyped one is fine.
    fn loose_parameter(
        &self,
        decorator: &DecoratorData<'_>,
        in_: ParameterLocation,
    ) -> Result<Parameter> {
        let type_ = match &self.parameter.type_expr {
            Some(expr) => resolve_type(Some(expr), self.bindings),
            None => Type::object(),
        };
        Ok(self.parameter(self.wire_name(decorator), in_, type_))
    }

    fn file_parameter(&self, decorator: &DecoratorData<'_>, type_: Type) -> Result<Parameter> {
        Ok(self.parameter(self.wire_name(decorator), ParameterLocation::FormData, type_))
    }

    fn path_parameter(&self, decorator: &DecoratorData<'_>) -> Result<Parameter> {
        let type_ = self.validated_type()?;
        let name = self.wire_name(decorator);
        if !path_placeholders(self.path).contains(&name.as_str()) {
            return Err(Error::unsupported(format!(
                "Parameter '{}' can't be passed as path parameter in '{}'.",
                self.parameter.name, self.path
            )));
        }
        Ok(Parameter {
            required: true,
            ..self.parameter(name, ParameterLocation::Path, type_)
        })
    }

    fn body_parameter(&self) -> Result<Parameter> {
        if !self.method.accepts_body() {
            return Err(Error::unsupported(format!(
                "Body can't support '{}' method.",
                self.method
            )));
        }
        let type_ = self.validated_type()?;
        Ok(self.parameter(
            self.parameter.name.clone(),
            ParameterLocation::Body,
            type_,
        ))
    }
}
