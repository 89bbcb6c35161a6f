//! Literal decorator arguments and parameter initializers.

use serde::Deserialize;
use serde_json::{Map as JsonMap, Number, Value as JsonValue};

use crate::Error;

/// Key marking an identifier reference inside a tree file, e.g. `{"$ident": "Person"}`.
pub const IDENT_KEY: &str = "$ident";

/// A literal as written in source: decorator arguments, initializers and
/// example payloads all keep their original shape.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "JsonValue")]
pub enum Literal {
    String(String),
    Number(f64),
    Bool(bool),
    Null,
    /// Identifier or member access (`Person`, `PrimitiveTypes.long`)
    Ident(String),
    List(Vec<Literal>),
    /// Object literal, properties in declaration order
    Mapping(Vec<(String, Literal)>),
}

impl Literal {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::String(s) => Some(s),
            _ => None,
        }
    }

    /// Literal text of the value: strings verbatim, numbers and booleans
    /// in their source spelling.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Literal::String(s) => Some(s.clone()),
            Literal::Number(n) => Some(format_number(*n)),
            Literal::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Last segment of an identifier reference, or the text of a string.
    ///
    /// `PrimitiveTypes.long` and `'long'` both name `long`.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Literal::Ident(path) => path.rsplit('.').next(),
            Literal::String(s) => Some(s),
            _ => None,
        }
    }

    /// String elements of a list literal; other elements are skipped.
    pub fn string_elements(&self) -> Option<Vec<String>> {
        match self {
            Literal::List(items) => Some(
                items
                    .iter()
                    .filter_map(Literal::as_str)
                    .map(String::from)
                    .collect(),
            ),
            _ => None,
        }
    }

    /// Evaluate to a JSON value.
    ///
    /// Identifier references have no value: they evaluate to `None`, become
    /// `null` inside lists and are dropped from mappings.
    pub fn to_json(&self) -> Option<JsonValue> {
        match self {
            Literal::String(s) => Some(JsonValue::String(s.clone())),
            Literal::Number(n) => Some(number_to_json(*n)),
            Literal::Bool(b) => Some(JsonValue::Bool(*b)),
            Literal::Null => Some(JsonValue::Null),
            Literal::Ident(_) => None,
            Literal::List(items) => Some(JsonValue::Array(
                items
                    .iter()
                    .map(|item| item.to_json().unwrap_or(JsonValue::Null))
                    .collect(),
            )),
            Literal::Mapping(entries) => {
                let mut map = JsonMap::new();
                for (key, value) in entries {
                    if let Some(value) = value.to_json() {
                        map.insert(key.clone(), value);
                    }
                }
                Some(JsonValue::Object(map))
            }
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn number_to_json(n: f64) -> JsonValue {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        JsonValue::Number(Number::from(n as i64))
    } else {
        Number::from_f64(n)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null)
    }
}

impl TryFrom<JsonValue> for Literal {
    type Error = Error;

    fn try_from(value: JsonValue) -> Result<Self, Self::Error> {
        Ok(match value {
            JsonValue::String(s) => Literal::String(s),
            JsonValue::Number(n) => Literal::Number(
                n.as_f64()
                    .ok_or_else(|| Error::syntax(format!("unrepresentable number {}", n)))?,
            ),
            JsonValue::Bool(b) => Literal::Bool(b),
            JsonValue::Null => Literal::Null,
            JsonValue::Array(items) => Literal::List(
                items
                    .into_iter()
                    .map(Literal::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            JsonValue::Object(map) => {
                if map.len() == 1 {
                    if let Some(JsonValue::String(ident)) = map.get(IDENT_KEY) {
                        return Ok(Literal::Ident(ident.clone()));
                    }
                }
                Literal::Mapping(
                    map.into_iter()
                        .map(|(k, v)| Literal::try_from(v).map(|v| (k, v)))
                        .collect::<Result<_, _>>()?,
                )
            }
        })
    }
}
