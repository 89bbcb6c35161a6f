//! Collection of the named model types reachable from the controllers.

use std::collections::{BTreeMap, HashMap, HashSet};

use super::resolve_type::{apply_number_format, resolve_type, substitute_type, Ancestors, GenericBindings};
use super::{Controller, Property, ReferenceType, Type};
use crate::decorators::has_decorator;
use crate::syntax::{ClassDecl, InterfaceDecl, Program, PropertyDecl, SourceFile, TypeExpr};

type TypeBindings = HashMap<String, Type>;

/// Deepest model instantiation documented as such; anything nested further
/// (a model whose members re-instantiate it with a growing argument) is
/// documented as `object`.
const MAX_TYPE_DEPTH: usize = 8;

/// Resolves every named reference used by a set of controllers into a
/// property list, following references found in those properties too.
pub struct ReferenceTypeCollector<'a> {
    program: &'a Program,
}

impl<'a> ReferenceTypeCollector<'a> {
    pub fn new(program: &'a Program) -> Self {
        Self { program }
    }

    pub fn collect(&self, controllers: &[Controller]) -> BTreeMap<String, ReferenceType> {
        let mut pending: Vec<Type> = controllers
            .iter()
            .flat_map(|c| c.methods.iter())
            .flat_map(|m| {
                m.parameters
                    .iter()
                    .map(|p| p.type_.clone())
                    .chain(m.responses.iter().filter_map(|r| r.schema.clone()))
                    .chain(std::iter::once(m.type_.clone()))
            })
            .collect();
        pending.reverse();

        let mut collected = BTreeMap::new();
        let mut skipped = HashSet::new();
        while let Some(ty) = pending.pop() {
            pending.extend(ty.children().cloned());
            if !ty.is_reference() {
                continue;
            }
            let key = ty.display_name();
            if collected.contains_key(&key) || skipped.contains(&key) {
                continue;
            }
            match self.reference_type(&ty, key.clone()).map(bound_reference) {
                Some(reference) => {
                    for property in &reference.properties {
                        pending.push(property.type_.clone());
                    }
                    pending.extend(reference.alias_of.iter().cloned());
                    collected.insert(key, reference);
                }
                None => {
                    log::debug!("No declaration found for model '{}'", key);
                    skipped.insert(key);
                }
            }
        }
        collected
    }

    fn reference_type(&self, ty: &Type, key: String) -> Option<ReferenceType> {
        let argument = ty.type_argument.as_deref();

        if let Some(interface) = self.program.find_interface(&ty.type_name) {
            let bindings = first_parameter(&interface.type_parameters, argument);
            let mut properties = Vec::new();
            let mut visited = HashSet::new();
            self.interface_properties(interface, &bindings, &mut properties, &mut visited);
            return Some(ReferenceType {
                type_name: key,
                description: interface.doc.as_ref().and_then(|d| d.description.clone()),
                properties,
                alias_of: None,
            });
        }

        if let Some((file, class)) = self.program.find_class(&ty.type_name) {
            let bindings = first_parameter(&class.type_parameters, argument);
            let mut properties = Vec::new();
            self.class_properties(file, class, &bindings, &mut properties);
            return Some(ReferenceType {
                type_name: key,
                description: class.doc.as_ref().and_then(|d| d.description.clone()),
                properties,
                alias_of: None,
            });
        }

        let alias = self.program.find_type_alias(&ty.type_name)?;
        let bindings = first_parameter(&alias.type_parameters, argument);
        let target = substitute_type(&resolve_type(Some(&alias.type_expr), None), &bindings);
        let description = alias.doc.as_ref().and_then(|d| d.description.clone());
        Some(match target.properties {
            Some(properties) if target.type_name == "object" => ReferenceType {
                type_name: key,
                description,
                properties,
                alias_of: None,
            },
            _ => ReferenceType {
                type_name: key,
                description,
                properties: Vec::new(),
                alias_of: Some(target),
            },
        })
    }

    /// Own properties first, then those of extended interfaces (or
    /// classes) not already declared.
    fn interface_properties(
        &self,
        interface: &'a InterfaceDecl,
        bindings: &TypeBindings,
        properties: &mut Vec<Property>,
        visited: &mut HashSet<&'a str>,
    ) {
        if !visited.insert(interface.name.as_str()) {
            return;
        }
        for declaration in &interface.properties {
            if properties.iter().any(|p| p.name == declaration.name) {
                continue;
            }
            if let Some(property) = resolve_property(declaration, None, bindings) {
                properties.push(property);
            }
        }
        for base in &interface.extends {
            let TypeExpr::Reference {
                name,
                type_arguments,
            } = base
            else {
                continue;
            };
            let arguments = type_arguments
                .iter()
                .map(|a| substitute_type(&resolve_type(Some(a), None), bindings));
            if let Some(parent) = self.program.find_interface(name) {
                let parent_bindings: TypeBindings = parent.type_parameters.iter().cloned().zip(arguments).collect();
                self.interface_properties(parent, &parent_bindings, properties, visited);
            } else if let Some((file, class)) = self.program.find_class(name) {
                let parent_bindings: TypeBindings = class.type_parameters.iter().cloned().zip(arguments).collect();
                self.class_properties(file, class, &parent_bindings, properties);
            } else {
                log::debug!("Extended type '{}' is not declared", name);
            }
        }
    }

    /// Properties of a class and its base classes, most derived first.
    fn class_properties(
        &self,
        file: &'a SourceFile,
        class: &'a ClassDecl,
        bindings: &TypeBindings,
        properties: &mut Vec<Property>,
    ) {
        for ancestor in Ancestors::new(self.program, file, class) {
            for declaration in &ancestor.declaration.properties {
                if properties.iter().any(|p| p.name == declaration.name) {
                    continue;
                }
                if let Some(property) = resolve_property(declaration, ancestor.bindings(), bindings) {
                    properties.push(property);
                }
            }
        }
    }
}

fn bound_reference(mut reference: ReferenceType) -> ReferenceType {
    for property in &mut reference.properties {
        property.type_ = bound_depth(std::mem::replace(&mut property.type_, Type::object()));
    }
    reference.alias_of = reference.alias_of.map(bound_depth);
    reference
}

/// Replaces references nested deeper than [`MAX_TYPE_DEPTH`] with `object`.
fn bound_depth(mut ty: Type) -> Type {
    if ty.is_reference() && ty.depth() > MAX_TYPE_DEPTH {
        log::warn!(
            "Type '{}' nests too deeply, documenting it as object",
            ty.display_name()
        );
        return Type::object();
    }
    ty.type_argument = ty.type_argument.map(|t| Box::new(bound_depth(*t)));
    ty.element_type = ty.element_type.map(|t| Box::new(bound_depth(*t)));
    if let Some(properties) = ty.properties.as_mut() {
        for property in properties {
            property.type_ = bound_depth(std::mem::replace(&mut property.type_, Type::object()));
        }
    }
    ty
}

/// Binding of a model's first type parameter to the reference's argument.
fn first_parameter(type_parameters: &[String], argument: Option<&Type>) -> TypeBindings {
    match (type_parameters.first(), argument) {
        (Some(parameter), Some(argument)) => {
            HashMap::from([(parameter.clone(), argument.clone())])
        }
        _ => HashMap::new(),
    }
}

fn resolve_property(
    declaration: &PropertyDecl,
    generic: Option<&GenericBindings>,
    bindings: &TypeBindings,
) -> Option<Property> {
    if has_decorator(declaration, "hidden") {
        return None;
    }
    let resolved = resolve_type(declaration.type_expr.as_ref(), generic);
    let type_ = apply_number_format(substitute_type(&resolved, bindings), declaration);
    Some(Property {
        name: declaration.name.clone(),
        type_,
        required: !declaration.optional,
        description: declaration.doc.as_ref().and_then(|d| d.description.clone()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::metadata::ControllerGenerator;

    const MODELS: &str = r#"
files:
  - fileName: src/models.ts
    interfaces:
      - name: Address
        properties:
          - {name: street, type: string}
      - name: Person
        doc: {description: A person}
        properties:
          - {name: name, type: string}
          - {name: address, type: Address, optional: true}
          - name: age
            type: number
            decorators: [{name: IsInt}]
          - name: secret
            type: string
            decorators: [{name: hidden}]
      - name: Employee
        extends: [Person]
        properties:
          - name: salary
            type: number
            doc: {tags: [{name: IsLong}]}
    typeAliases:
      - name: Page
        typeParameters: [T]
        type: "{ items: T[]; total: number }"
      - name: Status
        type: "'on' | 'off'"
    classes:
      - name: Base
        properties:
          - {name: id, type: string}
      - name: Account
        extends: Base
        properties:
          - {name: owner, type: Employee}
      - name: Models
        exported: true
        methods:
          - name: page
            returnType: "Page<Person>"
            decorators: [{name: GET}]
          - name: account
            returnType: "Promise<Account>"
            decorators: [{name: GET}, {name: Path, arguments: [account]}]
          - name: status
            returnType: Status
            decorators: [{name: GET}, {name: Path, arguments: [status]}]
          - name: missing
            returnType: Unknown
            decorators: [{name: GET}, {name: Path, arguments: [missing]}]
"#;

    fn collect() -> BTreeMap<String, ReferenceType> {
        let program = Program::parse_content(MODELS).unwrap();
        let settings = Settings::default();
        let (file, node) = program.find_class("Models").unwrap();
        let controller = ControllerGenerator::new(&program, &settings, file, node)
            .generate()
            .unwrap();
        ReferenceTypeCollector::new(&program).collect(&[controller])
    }

    const RECURSIVE: &str = r#"
files:
  - fileName: src/tree.ts
    interfaces:
      - name: Tree
        typeParameters: [T]
        properties:
          - {name: value, type: T}
          - {name: child, type: "Tree<T[]>", optional: true}
          - {name: nested, type: "{ next: Tree<T[]> }", optional: true}
    classes:
      - name: Trees
        exported: true
        methods:
          - name: root
            returnType: "Tree<string>"
            decorators: [{name: GET}]
"#;

    fn property<'r>(reference: &'r ReferenceType, name: &str) -> Option<&'r Property> {
        reference.properties.iter().find(|p| p.name == name)
    }

    #[test]
    fn test_interfaces_with_formats_and_hidden() {
        let types = collect();
        let person = &types["Person"];
        assert_eq!(person.description.as_deref(), Some("A person"));
        assert_eq!(property(person, "age").unwrap().type_, Type::named("integer"));
        assert!(!property(person, "address").unwrap().required);
        assert!(property(person, "secret").is_none());
        assert!(types.contains_key("Address"));

        let employee = &types["Employee"];
        assert_eq!(property(employee, "salary").unwrap().type_, Type::named("long"));
        assert!(property(employee, "name").is_some());
    }

    #[test]
    fn test_generic_alias_binds_first_parameter() {
        let types = collect();
        let page = &types["Page<Person>"];
        assert_eq!(
            property(page, "items").unwrap().type_,
            Type::array(Type::named("Person"))
        );
        assert_eq!(property(page, "total").unwrap().type_, Type::named("double"));
    }

    #[test]
    fn test_growing_recursive_model_terminates() {
        let program = Program::parse_content(RECURSIVE).unwrap();
        let settings = Settings::default();
        let (file, node) = program.find_class("Trees").unwrap();
        let controller = ControllerGenerator::new(&program, &settings, file, node)
            .generate()
            .unwrap();
        let types = ReferenceTypeCollector::new(&program).collect(&[controller]);

        assert_eq!(types.keys().filter(|k| k.starts_with("Tree<")).count(), 7);
        let root = &types["Tree<string>"];
        assert_eq!(property(root, "value").unwrap().type_, Type::named("string"));
        assert_eq!(property(root, "child").unwrap().type_.display_name(), "Tree<string[]>");

        let deepest = &types["Tree<string[][][][][][]>"];
        assert_eq!(property(deepest, "child").unwrap().type_, Type::object());
        let nested = &property(deepest, "nested").unwrap().type_;
        assert_eq!(nested.properties.as_ref().unwrap()[0].type_, Type::object());
    }

    #[test]
    fn test_classes_and_non_object_aliases() {
        let types = collect();
        let account = &types["Account"];
        let names: Vec<_> = account.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["owner", "id"]);
        assert!(types.contains_key("Employee"));

        let status = &types["Status"];
        assert!(status.properties.is_empty());
        assert_eq!(
            status.alias_of.as_ref().and_then(|t| t.enum_members.clone()),
            Some(vec!["on".to_string(), "off".to_string()])
        );
        assert!(!types.contains_key("Unknown"));
    }
}
