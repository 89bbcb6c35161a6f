//! Decorator lookups over declarations.

use crate::syntax::{simple_name, Decorated, Literal, TypeExpr};
use crate::error::Scope;
use crate::{Error, Result};

/// Structured view of one applied decorator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecoratorData<'a> {
    /// Unqualified decorator name (`Response` for `swagger.Response`)
    pub name: &'a str,
    pub arguments: &'a [Literal],
    pub type_arguments: &'a [TypeExpr],
}

impl<'a> DecoratorData<'a> {
    pub fn argument(&self, index: usize) -> Option<&'a Literal> {
        self.arguments.get(index)
    }

    /// Text of the first argument, if it is a literal with a textual form.
    pub fn first_text(&self) -> Option<String> {
        self.arguments.first().and_then(Literal::as_text)
    }
}

/// Decorators of `node` accepted by `predicate`, in source order.
pub fn get_decorators<'a, N, F>(node: &'a N, predicate: F) -> Vec<DecoratorData<'a>>
where
    N: Decorated + ?Sized,
    F: Fn(&DecoratorData<'a>) -> bool,
{
    node.decorators()
        .iter()
        .map(|d| DecoratorData {
            name: simple_name(&d.name),
            arguments: &d.arguments,
            type_arguments: &d.type_arguments,
        })
        .filter(|d| predicate(d))
        .collect()
}

/// Decorators of `node` with the given unqualified name.
pub fn get_named<'a, N>(node: &'a N, name: &str) -> Vec<DecoratorData<'a>>
where
    N: Decorated + ?Sized,
{
    get_decorators(node, |d| d.name == name)
}

/// First argument text of the first decorator accepted by `predicate`.
pub fn get_decorator_text_value<'a, N, F>(node: &'a N, predicate: F) -> Option<String>
where
    N: Decorated + ?Sized,
    F: Fn(&DecoratorData<'a>) -> bool,
{
    get_decorators(node, predicate)
        .first()
        .and_then(DecoratorData::first_text)
}

pub fn has_decorator<N: Decorated + ?Sized>(node: &N, name: &str) -> bool {
    !get_named(node, name).is_empty()
}

/// The single decorator named `name`, failing when it occurs more than once.
pub fn get_unique<'a, N>(
    node: &'a N,
    name: &str,
    location: &str,
    scope: Scope,
) -> Result<Option<DecoratorData<'a>>>
where
    N: Decorated + ?Sized,
{
    let mut found = get_named(node, name);
    if found.len() > 1 {
        return Err(Error::duplicate(name, location, scope));
    }
    Ok(found.pop())
}

/// String arguments of the single decorator named `name` (`Tags`,
/// `Produces`, `Accept`); empty when absent.
pub fn get_unique_values<N>(node: &N, name: &str, location: &str, scope: Scope) -> Result<Vec<String>>
where
    N: Decorated + ?Sized,
{
    Ok(get_unique(node, name, location, scope)?
        .map(|d| d.arguments.iter().filter_map(Literal::as_text).collect())
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{Decorator, ParamDecl};

    fn param(decorators: Vec<Decorator>) -> ParamDecl {
        ParamDecl {
            name: "p".into(),
            type_expr: None,
            optional: false,
            initializer: None,
            decorators,
        }
    }

    fn decorator(name: &str, args: Vec<Literal>) -> Decorator {
        Decorator {
            name: name.into(),
            arguments: args,
            type_arguments: Vec::new(),
        }
    }

    #[test]
    fn test_qualified_names_match_on_last_segment() {
        let node = param(vec![
            decorator("swagger.Tags", vec![Literal::String("a".into())]),
            decorator("Deprecated", vec![]),
            decorator("Tags", vec![Literal::String("b".into())]),
        ]);
        let found = get_named(&node, "Tags");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].first_text().as_deref(), Some("a"));
        assert_eq!(found[1].first_text().as_deref(), Some("b"));
        assert!(get_named(&node, "Missing").is_empty());
    }

    #[test]
    fn test_text_value() {
        let node = param(vec![
            decorator("QueryParam", vec![Literal::Number(5.0)]),
            decorator("Path", vec![]),
        ]);
        assert_eq!(
            get_decorator_text_value(&node, |d| d.name == "QueryParam").as_deref(),
            Some("5")
        );
        assert_eq!(get_decorator_text_value(&node, |d| d.name == "Path"), None);
        assert_eq!(get_decorator_text_value(&node, |d| d.name == "Nope"), None);
    }

    #[test]
    fn test_unique_rejects_duplicates() {
        let node = param(vec![
            decorator("Produces", vec![Literal::String("application/json".into())]),
            decorator("Produces", vec![Literal::String("text/html".into())]),
        ]);
        let err = get_unique_values(&node, "Produces", "MyService.test", Scope::Method).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Only one Produces decorator allowed in 'MyService.test' method."
        );
        let err = get_unique_values(&node, "Produces", "MyService", Scope::Controller).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Only one Produces decorator allowed in 'MyService' controller."
        );
        assert!(get_unique_values(&node, "Tags", "MyService.test", Scope::Method)
            .unwrap()
            .is_empty());
    }
}
