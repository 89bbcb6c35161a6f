//! Method generation: verb, path, parameters and responses of one operation.

use super::parameter::ParameterGenerator;
use super::resolve_type::{resolve_type, GenericBindings};
use super::{read_security, HttpVerb, Method, Parameter, ParameterLocation, ResponseType, Type};
use crate::config::Settings;
use crate::decorators::{get_decorators, get_named, get_unique, get_unique_values, has_decorator};
use crate::path::{compose_path, normalize_path, path_placeholders};
use crate::syntax::{Literal, MethodDecl};
use crate::error::Scope;
use crate::{Error, Result};

/// Generates [`Method`] records for one method declaration.
///
/// Construction reads the verb and path decorators and fails when either
/// is ambiguous; a method without a verb is merely invalid.
pub struct MethodGenerator<'a> {
    settings: &'a Settings,
    node: &'a MethodDecl,
    controller_name: &'a str,
    controller_path: &'a str,
    bindings: Option<&'a GenericBindings>,
    verb: Option<HttpVerb>,
    path: String,
}

impl<'a> MethodGenerator<'a> {
    pub fn new(
        settings: &'a Settings,
        node: &'a MethodDecl,
        controller_name: &'a str,
        controller_path: &'a str,
        bindings: Option<&'a GenericBindings>,
    ) -> Result<Self> {
        let mut generator = Self {
            settings,
            node,
            controller_name,
            controller_path,
            bindings,
            verb: None,
            path: String::new(),
        };
        generator.process_decorators()?;
        Ok(generator)
    }

    pub fn is_valid(&self) -> bool {
        self.verb.is_some()
    }

    pub fn name(&self) -> Option<&str> {
        self.node.name.as_deref()
    }

    pub fn generate(&self) -> Result<Method> {
        let Some(verb) = self.verb else {
            return Err(Error::unsupported(format!(
                "'{}' isn't a valid controller method.",
                self.location()
            )));
        };
        let name = self.name().ok_or_else(|| {
            Error::linkage(format!(
                "Method node in '{}' doesn't have a valid name.",
                self.controller_name
            ))
        })?;
        log::debug!("Generating method {}", self.location());

        let location = self.location();
        let type_ = resolve_type(self.node.return_type.as_ref(), self.bindings);
        let default_response = self.success_response(&type_)?;
        let responses = merge_responses(self.explicit_responses(), default_response);
        let doc = self.node.doc.as_ref();

        Ok(Method {
            name: name.to_string(),
            method: verb,
            path: self.path.clone(),
            base_path: get_named(self.node, "BasePath")
                .first()
                .and_then(|d| d.first_text()),
            is_plural: has_decorator(self.node, "Plural"),
            parameters: self.build_parameters(verb)?,
            responses,
            tags: get_unique_values(self.node, "Tags", &location, Scope::Method)?,
            security: read_security(self.node),
            consumes: get_unique_values(self.node, "Accept", &location, Scope::Method)?,
            produces: get_unique_values(self.node, "Produces", &location, Scope::Method)?,
            deprecated: doc.is_some_and(|d| d.has_tag("deprecated")),
            summary: doc
                .and_then(|d| d.tag("summary"))
                .and_then(|t| t.text.clone()),
            description: doc.and_then(|d| d.description.clone()),
            type_,
        })
    }

    fn location(&self) -> String {
        format!(
            "{}.{}",
            self.controller_name,
            self.name().unwrap_or("<anonymous>")
        )
    }

    fn process_decorators(&mut self) -> Result<()> {
        let verbs = get_decorators(self.node, |d| HttpVerb::from_decorator(d.name).is_some());
        let Some(first) = verbs.first() else {
            return Ok(());
        };
        if verbs.len() > 1 {
            return Err(Error::MultipleHttpMethods {
                location: self.location(),
                found: verbs.iter().map(|d| d.name.to_string()).collect(),
            });
        }
        self.verb = HttpVerb::from_decorator(first.name);

        let location = self.location();
        self.path = match get_unique(self.node, "Path", &location, Scope::Method)? {
            Some(path) => format!(
                "/{}",
                normalize_path(&path.first_text().unwrap_or_default())
            ),
            None => String::new(),
        };
        Ok(())
    }

    fn build_parameters(&self, verb: HttpVerb) -> Result<Vec<Parameter>> {
        let location = self.location();
        let composed = compose_path(self.controller_path, &self.path);
        let mut parameters = self.node_parameters(verb, &composed)?;

        if let Some(body) = get_unique(self.node, "BodyType", &location, Scope::Method)? {
            if let Some(type_name) = body.argument(0).and_then(Literal::as_name) {
                parameters.push(ParameterGenerator::build(
                    "body",
                    ParameterLocation::Body,
                    Type::named(type_name),
                    None,
                ));
            }
        }

        self.add_path_parameters(&mut parameters, &composed)?;

        let body_count = parameters
            .iter()
            .filter(|p| p.in_ == ParameterLocation::Body)
            .count();
        let has_form = parameters
            .iter()
            .any(|p| p.in_ == ParameterLocation::FormData);
        if body_count > 1 {
            return Err(Error::MultipleBodyParameters(location));
        }
        if body_count > 0 && has_form {
            return Err(Error::BodyWithFormData(location));
        }
        Ok(parameters)
    }

    fn node_parameters(&self, verb: HttpVerb, composed: &str) -> Result<Vec<Parameter>> {
        let mut parameters = Vec::new();
        for declaration in &self.node.parameters {
            if self.settings.ignore_parameters.contains(&declaration.name) {
                continue;
            }
            let mut parameter =
                ParameterGenerator::new(declaration, verb, composed, self.bindings)
                    .generate()
                    .map_err(|e| Error::Parameter {
                        location: self.location(),
                        parameter: declaration.name.clone(),
                        source: Box::new(e),
                    })?;
            if !parameter.in_.is_documented() {
                continue;
            }
            if parameter.description.is_none() {
                parameter.description = self
                    .node
                    .doc
                    .as_ref()
                    .and_then(|doc| doc.param_description(&declaration.name));
            }
            parameters.push(parameter);
        }
        Ok(parameters)
    }

    /// `ParamFromPath` declarations, then placeholders matched by the
    /// configured auto path rules.
    fn add_path_parameters(&self, parameters: &mut Vec<Parameter>, composed: &str) -> Result<()> {
        for decorator in get_named(self.node, "ParamFromPath") {
            let Some(name) = decorator.first_text() else {
                log::warn!("Ignoring ParamFromPath without a name in '{}'", self.location());
                continue;
            };
            let type_ = match decorator.argument(1).and_then(Literal::as_name) {
                Some(primitive) => primitive.parse::<super::PrimitiveType>()?.to_type(),
                None => Type::named("string"),
            };
            let description = decorator.argument(2).and_then(Literal::as_text);
            parameters.push(ParameterGenerator::build(
                &name,
                ParameterLocation::Path,
                type_,
                description,
            ));
        }

        for placeholder in path_placeholders(composed) {
            let declared = parameters
                .iter()
                .any(|p| p.in_ == ParameterLocation::Path && p.name == placeholder);
            if declared {
                continue;
            }
            let rule = self
                .settings
                .auto_path_parameters
                .iter()
                .find(|rule| rule.pattern.is_match(placeholder));
            if let Some(rule) = rule {
                parameters.push(ParameterGenerator::build(
                    placeholder,
                    ParameterLocation::Path,
                    rule.type_.clone(),
                    rule.description.clone(),
                ));
            }
        }
        Ok(())
    }

    fn explicit_responses(&self) -> Vec<ResponseType> {
        get_named(self.node, "Response")
            .into_iter()
            .map(|d| ResponseType {
                status: d.first_text().unwrap_or_else(|| "200".to_string()),
                description: d.argument(1).and_then(Literal::as_text).unwrap_or_default(),
                schema: d
                    .type_arguments
                    .first()
                    .map(|t| resolve_type(Some(t), self.bindings)),
                examples: d.argument(2).and_then(Literal::to_json),
            })
            .collect()
    }

    fn success_response(&self, type_: &Type) -> Result<ResponseType> {
        let example = get_unique(self.node, "Example", &self.location(), Scope::Method)?;
        let (status, schema) = success_status(type_);
        let description = if type_.is_void() { "No content" } else { "Ok" };
        Ok(ResponseType {
            status: status.to_string(),
            description: description.to_string(),
            schema: Some(schema),
            examples: example.and_then(|d| d.argument(0)).and_then(Literal::to_json),
        })
    }
}

/// Status and schema inferred from a return type.
fn success_status(type_: &Type) -> (&'static str, Type) {
    let inner = || type_.type_argument.as_deref().unwrap_or(type_).clone();
    match type_.type_name.as_str() {
        "void" => ("204", type_.clone()),
        "NewResource" => ("201", inner()),
        "RequestAccepted" => ("202", inner()),
        "MovedPermanently" => ("301", inner()),
        "MovedTemporarily" => ("302", inner()),
        "DownloadResource" | "DownloadBinaryData" => ("200", Type::buffer()),
        _ => ("200", type_.clone()),
    }
}

/// One response per status: explicit responses win, the default fills in
/// a missing example or is appended.
pub fn merge_responses(
    mut responses: Vec<ResponseType>,
    default_response: ResponseType,
) -> Vec<ResponseType> {
    if responses.is_empty() {
        return vec![default_response];
    }
    match responses
        .iter()
        .position(|r| r.status == default_response.status)
    {
        Some(index) => {
            let existing = &mut responses[index];
            if existing.examples.is_none() {
                existing.examples = default_response.examples;
            }
        }
        None => responses.push(default_response),
    }
    responses
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::syntax::Program;
    use serde_json::json;

    fn class_methods(yaml: &str) -> Program {
        Program::parse_content(yaml).unwrap()
    }

    fn response(status: &str, examples: Option<serde_json::Value>) -> ResponseType {
        ResponseType {
            status: status.into(),
            description: String::new(),
            schema: None,
            examples,
        }
    }

    #[test]
    fn test_merge_appends_default() {
        let merged = merge_responses(vec![response("500", None)], response("200", None));
        let statuses: Vec<_> = merged.iter().map(|r| r.status.as_str()).collect();
        assert_eq!(statuses, ["500", "200"]);
    }

    #[test]
    fn test_merge_adopts_default_example() {
        let example = json!([{"name": "Joe"}]);
        let merged = merge_responses(
            vec![response("200", None)],
            response("200", Some(example.clone())),
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].examples, Some(example));

        let merged = merge_responses(
            vec![response("200", Some(json!("own")))],
            response("200", Some(json!("default"))),
        );
        assert_eq!(merged[0].examples, Some(json!("own")));
        assert_eq!(merge_responses(vec![], response("204", None)).len(), 1);
    }

    #[test]
    fn test_success_status_table() {
        let person = Type::named("Person");
        let (status, schema) = success_status(&Type::reference("NewResource", Some(person.clone())));
        assert_eq!((status, schema), ("201", person.clone()));
        let (status, schema) = success_status(&Type::void());
        assert_eq!((status, schema), ("204", Type::void()));
        let (status, schema) = success_status(&Type::named("RequestAccepted"));
        assert_eq!((status, schema), ("202", Type::named("RequestAccepted")));
        let (status, schema) = success_status(&Type::named("DownloadBinaryData"));
        assert_eq!((status, schema), ("200", Type::buffer()));
        let (status, schema) = success_status(&person);
        assert_eq!((status, schema), ("200", person));
    }

    const SERVICE: &str = r#"
files:
  - fileName: src/service.ts
    classes:
      - name: MyService
        exported: true
        methods:
          - name: test
            returnType: "Promise<void>"
            decorators:
              - {name: GET}
              - {name: POST}
          - name: helper
            returnType: string
          - name: upload
            returnType: string
            decorators:
              - {name: POST}
            parameters:
              - {name: body, type: Person}
              - {name: file, type: any, decorators: [{name: FileParam, arguments: [file]}]}
          - name: primitives
            returnType: "Return.NewResource<Person>"
            decorators:
              - {name: GET}
              - {name: Path, arguments: [":AUTOID_test/test/:nonAutoParam"]}
              - {name: ParamFromPath, arguments: [nonAutoParam, {"$ident": "PrimitiveTypes.string"}, "explicit"]}
              - {name: Tags, arguments: [primitives, tests]}
            doc:
              description: Creates a thing
              tags:
                - {name: summary, text: Create}
                - {name: deprecated}
"#;

    fn method<'a>(program: &'a Program, name: &str) -> &'a MethodDecl {
        program.files[0].classes[0]
            .methods
            .iter()
            .find(|m| m.name.as_deref() == Some(name))
            .unwrap()
    }

    #[test]
    fn test_multiple_verbs_fail_fast() {
        let program = class_methods(SERVICE);
        let settings = Config::default().settings().unwrap();
        let err = MethodGenerator::new(&settings, method(&program, "test"), "MyService", "", None)
            .err()
            .unwrap();
        assert_eq!(
            err.to_string(),
            "Only one HTTP Method decorator in 'MyService.test' method is acceptable, Found: GET, POST"
        );
    }

    #[test]
    fn test_method_without_verb_is_invalid() {
        let program = class_methods(SERVICE);
        let settings = Config::default().settings().unwrap();
        let generator =
            MethodGenerator::new(&settings, method(&program, "helper"), "MyService", "", None)
                .unwrap();
        assert!(!generator.is_valid());
        assert!(generator.generate().is_err());
    }

    #[test]
    fn test_body_and_form_data_conflict() {
        let program = class_methods(SERVICE);
        let settings = Config::default().settings().unwrap();
        let err = MethodGenerator::new(&settings, method(&program, "upload"), "MyService", "", None)
            .unwrap()
            .generate()
            .unwrap_err();
        assert!(matches!(err, Error::BodyWithFormData(ref loc) if loc == "MyService.upload"));
    }

    #[test]
    fn test_auto_path_parameters_never_override_explicit() {
        let program = class_methods(SERVICE);
        let config: Config = serde_yaml::from_str(
            r#"
autoPathParameters:
  - ["^AUTOID_", long, auto id parameter]
  - {pattern: "^non", primitiveType: integer, description: never used}
"#,
        )
        .unwrap();
        let settings = config.settings().unwrap();
        let generated =
            MethodGenerator::new(&settings, method(&program, "primitives"), "MyService", "primitives", None)
                .unwrap()
                .generate()
                .unwrap();

        assert_eq!(generated.path, "/{AUTOID_test}/test/{nonAutoParam}");
        let path_params: Vec<_> = generated
            .parameters
            .iter()
            .map(|p| (p.name.as_str(), p.type_.type_name.as_str()))
            .collect();
        assert_eq!(path_params, [("nonAutoParam", "string"), ("AUTOID_test", "long")]);
        assert_eq!(
            generated.parameters[1].description.as_deref(),
            Some("auto id parameter")
        );

        assert_eq!(generated.responses.len(), 1);
        assert_eq!(generated.responses[0].status, "201");
        assert_eq!(generated.responses[0].schema, Some(Type::named("Person")));
        assert_eq!(generated.tags, ["primitives", "tests"]);
        assert_eq!(generated.summary.as_deref(), Some("Create"));
        assert_eq!(generated.description.as_deref(), Some("Creates a thing"));
        assert!(generated.deprecated);
    }
}
