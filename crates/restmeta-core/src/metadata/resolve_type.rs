//! Type resolution and superclass lookup.
//!
//! [`resolve_type`] never fails: expressions it has no description for
//! resolve to `object`, so a single exotic type cannot block a whole
//! generation run. [`get_super_class`] and [`Ancestors`] walk `extends`
//! clauses, carrying a fresh generic binding map at each step so that
//! multi-level generic inheritance ends up with concrete types.

use std::collections::HashMap;

use super::{Property, Type};
use crate::decorators::has_decorator;
use crate::syntax::{ClassDecl, Decorated, Keyword, Program, SourceFile, TypeExpr};

/// Generic parameter name → concrete type expression
pub type GenericBindings = HashMap<String, TypeExpr>;

/// Resolve a type expression, substituting generic parameters from `bindings`.
pub fn resolve_type(expr: Option<&TypeExpr>, bindings: Option<&GenericBindings>) -> Type {
    let Some(expr) = expr else {
        return Type::void();
    };

    match expr {
        TypeExpr::Keyword(keyword) => resolve_keyword(*keyword),
        TypeExpr::Reference {
            name,
            type_arguments,
        } => {
            if type_arguments.is_empty() {
                if let Some(bound) = bindings.and_then(|b| b.get(name)) {
                    return resolve_type(Some(bound), None);
                }
            }
            resolve_reference(name, type_arguments, bindings)
        }
        TypeExpr::Array(element) => Type::array(resolve_type(Some(element), bindings)),
        TypeExpr::TypeLiteral(members) => Type::inline(
            members
                .iter()
                .filter(|m| !matches!(m.type_expr, TypeExpr::Function(_)))
                .map(|m| Property {
                    name: m.name.clone(),
                    type_: resolve_type(Some(&m.type_expr), bindings),
                    required: !m.optional,
                    description: None,
                })
                .collect(),
        ),
        TypeExpr::Union(members) => resolve_union(members, bindings),
        TypeExpr::StringLiteral(value) => Type::enumeration(vec![value.clone()]),
        TypeExpr::NumberLiteral(_) => Type::named("double"),
        TypeExpr::Tuple(_) | TypeExpr::Intersection(_) | TypeExpr::Function(_) => {
            log::warn!("Unsupported type '{}', documenting it as object", expr);
            Type::object()
        }
    }
}

fn resolve_keyword(keyword: Keyword) -> Type {
    match keyword {
        Keyword::String => Type::named("string"),
        Keyword::Number => Type::named("double"),
        Keyword::BigInt => Type::named("long"),
        Keyword::Boolean => Type::named("boolean"),
        Keyword::Void | Keyword::Undefined | Keyword::Null | Keyword::Never => Type::void(),
        Keyword::Any | Keyword::Unknown | Keyword::Object => Type::object(),
    }
}

fn resolve_reference(
    name: &str,
    type_arguments: &[TypeExpr],
    bindings: Option<&GenericBindings>,
) -> Type {
    let first = type_arguments.first();
    match crate::syntax::simple_name(name) {
        "Promise" => match first {
            Some(inner) => resolve_type(Some(inner), bindings),
            None => Type::object(),
        },
        "Array" | "ReadonlyArray" => Type::array(match first {
            Some(element) => resolve_type(Some(element), bindings),
            None => Type::object(),
        }),
        "Date" => Type::named("datetime"),
        "Buffer" => Type::buffer(),
        "String" => Type::named("string"),
        "Number" => Type::named("double"),
        "Boolean" => Type::named("boolean"),
        "Object" => Type::object(),
        simple => Type::reference(simple, first.map(|arg| resolve_type(Some(arg), bindings))),
    }
}

fn resolve_union(members: &[TypeExpr], bindings: Option<&GenericBindings>) -> Type {
    let defined: Vec<&TypeExpr> = members
        .iter()
        .filter(|m| {
            !matches!(
                m,
                TypeExpr::Keyword(Keyword::Undefined) | TypeExpr::Keyword(Keyword::Null)
            )
        })
        .collect();

    if let [single] = defined.as_slice() {
        return resolve_type(Some(*single), bindings);
    }

    let literals: Option<Vec<String>> = defined
        .iter()
        .map(|m| match m {
            TypeExpr::StringLiteral(value) => Some(value.clone()),
            _ => None,
        })
        .collect();
    match literals {
        Some(values) if !values.is_empty() => Type::enumeration(values),
        _ => {
            log::warn!(
                "Union type '{}' has no single description, documenting it as object",
                TypeExpr::Union(members.to_vec())
            );
            Type::object()
        }
    }
}

/// Replace generic parameter references in `expr` with their bound types.
pub fn substitute(expr: &TypeExpr, bindings: &GenericBindings) -> TypeExpr {
    match expr {
        TypeExpr::Reference {
            name,
            type_arguments,
        } => {
            if type_arguments.is_empty() {
                if let Some(bound) = bindings.get(name) {
                    return bound.clone();
                }
            }
            TypeExpr::Reference {
                name: name.clone(),
                type_arguments: type_arguments
                    .iter()
                    .map(|a| substitute(a, bindings))
                    .collect(),
            }
        }
        TypeExpr::Array(element) => TypeExpr::Array(Box::new(substitute(element, bindings))),
        TypeExpr::Tuple(items) => {
            TypeExpr::Tuple(items.iter().map(|i| substitute(i, bindings)).collect())
        }
        TypeExpr::Union(items) => {
            TypeExpr::Union(items.iter().map(|i| substitute(i, bindings)).collect())
        }
        TypeExpr::Intersection(items) => {
            TypeExpr::Intersection(items.iter().map(|i| substitute(i, bindings)).collect())
        }
        TypeExpr::TypeLiteral(members) => TypeExpr::TypeLiteral(
            members
                .iter()
                .map(|m| crate::syntax::PropertySignature {
                    type_expr: substitute(&m.type_expr, bindings),
                    ..m.clone()
                })
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Same substitution on resolved types, for model generics bound after resolution.
pub fn substitute_type(ty: &Type, bindings: &HashMap<String, Type>) -> Type {
    if ty.is_reference() && ty.type_argument.is_none() {
        if let Some(bound) = bindings.get(&ty.type_name) {
            return bound.clone();
        }
    }
    Type {
        type_name: ty.type_name.clone(),
        type_argument: ty
            .type_argument
            .as_ref()
            .map(|t| Box::new(substitute_type(t, bindings))),
        element_type: ty
            .element_type
            .as_ref()
            .map(|t| Box::new(substitute_type(t, bindings))),
        properties: ty.properties.as_ref().map(|props| {
            props
                .iter()
                .map(|p| Property {
                    type_: substitute_type(&p.type_, bindings),
                    ..p.clone()
                })
                .collect()
        }),
        enum_members: ty.enum_members.clone(),
    }
}

/// A class in an ancestor chain, with what its subclass supplied to it
#[derive(Debug, Clone)]
pub struct Ancestor<'a> {
    pub file: &'a SourceFile,
    pub declaration: &'a ClassDecl,
    /// Concrete type arguments given in the subclass's `extends` clause
    pub type_arguments: Vec<TypeExpr>,
    /// This class's type parameters bound to `type_arguments`
    pub bindings: GenericBindings,
}

impl Ancestor<'_> {
    pub fn bindings(&self) -> Option<&GenericBindings> {
        (!self.bindings.is_empty()).then_some(&self.bindings)
    }
}

/// Immediate base class of `class`, with the concrete type arguments it is
/// given once `current` bindings are applied.
pub fn get_super_class<'a>(
    program: &'a Program,
    class: &ClassDecl,
    current: Option<&GenericBindings>,
) -> Option<Ancestor<'a>> {
    let TypeExpr::Reference {
        name,
        type_arguments,
    } = class.extends.as_ref()?
    else {
        return None;
    };
    let Some((file, declaration)) = program.find_class(name) else {
        log::debug!("Base class '{}' is not declared in the program", name);
        return None;
    };

    let type_arguments: Vec<TypeExpr> = match current {
        Some(current) => type_arguments.iter().map(|a| substitute(a, current)).collect(),
        None => type_arguments.clone(),
    };
    let bindings = declaration
        .type_parameters
        .iter()
        .cloned()
        .zip(type_arguments.iter().cloned())
        .collect();

    Some(Ancestor {
        file,
        declaration,
        type_arguments,
        bindings,
    })
}

/// Walks a class and then each of its base classes, most derived first.
pub struct Ancestors<'a> {
    program: &'a Program,
    next: Option<Ancestor<'a>>,
    visited: Vec<&'a ClassDecl>,
}

impl<'a> Ancestors<'a> {
    pub fn new(program: &'a Program, file: &'a SourceFile, class: &'a ClassDecl) -> Self {
        Self {
            program,
            next: Some(Ancestor {
                file,
                declaration: class,
                type_arguments: Vec::new(),
                bindings: GenericBindings::new(),
            }),
            visited: Vec::new(),
        }
    }
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = Ancestor<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        self.visited.push(current.declaration);
        self.next = get_super_class(self.program, current.declaration, current.bindings())
            .filter(|parent| {
                let seen = self
                    .visited
                    .iter()
                    .any(|v| std::ptr::eq(*v, parent.declaration));
                if seen {
                    log::warn!(
                        "Inheritance cycle through '{}'",
                        parent.declaration.name.as_deref().unwrap_or("<anonymous>")
                    );
                }
                !seen
            });
        Some(current)
    }
}

/// Format marker (`IsInt`, `IsLong`, `IsFloat`, `IsDouble`) given as a
/// decorator or a doc tag.
pub fn number_format<N: Decorated + ?Sized>(node: &N) -> Option<&'static str> {
    const FORMATS: [(&str, &str); 4] = [
        ("IsInt", "integer"),
        ("IsLong", "long"),
        ("IsFloat", "float"),
        ("IsDouble", "double"),
    ];
    FORMATS.iter().find_map(|(marker, type_name)| {
        let tagged = node.doc().is_some_and(|doc| doc.has_tag(marker));
        (has_decorator(node, marker) || tagged).then_some(*type_name)
    })
}

/// Refine a `double` (or array of `double`) with the node's number format.
pub fn apply_number_format<N: Decorated + ?Sized>(ty: Type, node: &N) -> Type {
    let Some(format) = number_format(node) else {
        return ty;
    };
    if ty.type_name == "double" {
        return Type::named(format);
    }
    let double_elements = ty
        .element_type
        .as_ref()
        .is_some_and(|element| element.type_name == "double");
    if ty.type_name == "array" && double_elements {
        return Type::array(Type::named(format));
    }
    ty
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(text: &str) -> Type {
        resolve_type(Some(&TypeExpr::parse(text).unwrap()), None)
    }

    fn program(yaml: &str) -> Program {
        Program::parse_content(yaml).unwrap()
    }

    #[test]
    fn test_primitives_and_void() {
        assert_eq!(resolve("string"), Type::named("string"));
        assert_eq!(resolve("number"), Type::named("double"));
        assert_eq!(resolve("boolean"), Type::named("boolean"));
        assert_eq!(resolve("Date"), Type::named("datetime"));
        assert_eq!(resolve("void"), Type::void());
        assert_eq!(resolve("Promise<void>"), Type::void());
        assert_eq!(resolve_type(None, None), Type::void());
    }

    #[test]
    fn test_arrays_and_wrappers() {
        assert_eq!(resolve("string[]"), Type::array(Type::named("string")));
        assert_eq!(resolve("Array<Person>"), Type::array(Type::named("Person")));
        assert_eq!(
            resolve("Promise<Return.NewResource<Person>>"),
            Type::reference("NewResource", Some(Type::named("Person")))
        );
        assert_eq!(resolve("Return.DownloadBinaryData"), Type::named("DownloadBinaryData"));
    }

    #[test]
    fn test_inline_object() {
        let ty = resolve("{ name: string; tags?: string[]; compare: (a: string) => boolean }");
        assert_eq!(
            ty,
            Type::inline(vec![
                Property {
                    name: "name".into(),
                    type_: Type::named("string"),
                    required: true,
                    description: None,
                },
                Property {
                    name: "tags".into(),
                    type_: Type::array(Type::named("string")),
                    required: false,
                    description: None,
                },
            ])
        );
    }

    #[test]
    fn test_unions_and_fallbacks() {
        assert_eq!(resolve("string | undefined"), Type::named("string"));
        assert_eq!(
            resolve("'asc' | 'desc'"),
            Type::enumeration(vec!["asc".into(), "desc".into()])
        );
        assert_eq!(resolve("string | string[]"), Type::object());
        assert_eq!(resolve("A & B"), Type::object());
        assert_eq!(resolve("[string, number]"), Type::object());
        assert_eq!(resolve("any"), Type::object());
    }

    #[test]
    fn test_generic_substitution() {
        let mut bindings = GenericBindings::new();
        bindings.insert("T".into(), TypeExpr::reference("MyDatatype"));
        let expr = TypeExpr::parse("Promise<Array<T>>").unwrap();
        assert_eq!(
            resolve_type(Some(&expr), Some(&bindings)),
            Type::array(Type::named("MyDatatype"))
        );
        // Unbound parameters stay as references
        let expr = TypeExpr::parse("U").unwrap();
        assert_eq!(resolve_type(Some(&expr), Some(&bindings)), Type::named("U"));
    }

    #[test]
    fn test_super_class_composes_bindings() {
        let program = program(
            r#"
files:
  - fileName: a.ts
    classes:
      - name: Root
        typeParameters: [R]
      - name: Middle
        typeParameters: [M]
        extends: "Root<Array<M>>"
      - name: Leaf
        extends: "Middle<Person>"
      - name: Alone
"#,
        );
        let (file, leaf) = program.find_class("Leaf").unwrap();
        let chain: Vec<_> = Ancestors::new(&program, file, leaf).collect();
        let names: Vec<_> = chain
            .iter()
            .map(|a| a.declaration.name.as_deref().unwrap())
            .collect();
        assert_eq!(names, vec!["Leaf", "Middle", "Root"]);
        assert_eq!(chain[1].type_arguments, vec![TypeExpr::reference("Person")]);
        assert_eq!(
            chain[2].bindings.get("R"),
            Some(&TypeExpr::parse("Array<Person>").unwrap())
        );

        let (_, alone) = program.find_class("Alone").unwrap();
        assert!(get_super_class(&program, alone, None).is_none());
    }

    #[test]
    fn test_ancestor_cycle_terminates() {
        let program = program(
            r#"
files:
  - fileName: a.ts
    classes:
      - name: A
        extends: B
      - name: B
        extends: A
"#,
        );
        let (file, a) = program.find_class("A").unwrap();
        assert_eq!(Ancestors::new(&program, file, a).count(), 2);
    }
}
