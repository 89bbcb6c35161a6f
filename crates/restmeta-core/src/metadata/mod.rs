//! Normalized API metadata and the generators that produce it.
//!
//! The pipeline reads a [`Program`](crate::syntax::Program) and produces a
//! [`Metadata`] value: one [`Controller`] per exported annotated class, plus
//! the named model types those controllers reference. Every record here is
//! serializable with camelCase keys, ready for a document renderer.
//!
//! # Examples
//!
//! ```
//! use restmeta_core::{Config, MetadataGenerator};
//! use restmeta_core::syntax::Program;
//!
//! let program = Program::parse_content(r#"
//! files:
//!   - fileName: src/people.ts
//!     classes:
//!       - name: PeopleService
//!         exported: true
//!         decorators: [{name: Path, arguments: [people]}]
//!         methods:
//!           - name: list
//!             returnType: "Promise<string[]>"
//!             decorators: [{name: GET}]
//! "#).unwrap();
//!
//! let metadata = MetadataGenerator::new(&program, &Config::default())
//!     .unwrap()
//!     .generate()
//!     .unwrap();
//! let controller = &metadata.controllers[0];
//! assert_eq!(controller.path, "people");
//! assert_eq!(controller.methods[0].responses[0].status, "200");
//! ```

pub mod controller;
pub mod generator;
pub mod method;
pub mod parameter;
pub mod reference;
pub mod resolve_type;

// Internal imports (std, crate)
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// External imports (alphabetized)
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::decorators::get_named;
use crate::syntax::{Decorated, Literal};

pub use controller::ControllerGenerator;
pub use generator::MetadataGenerator;
pub use method::MethodGenerator;
pub use parameter::ParameterGenerator;
pub use reference::ReferenceTypeCollector;
pub use resolve_type::{get_super_class, resolve_type, Ancestor, Ancestors, GenericBindings};

/// Type names that describe built-in shapes rather than named models
const BUILTIN_TYPE_NAMES: &[&str] = &[
    "string", "double", "float", "integer", "long", "boolean", "date", "datetime", "buffer",
    "file", "object", "array", "void", "enum",
];

/// A normalized type description
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Type {
    /// Primitive tag, `object`, `array`, `buffer`, `void`, `enum`, or a model name
    pub type_name: String,
    /// Inner type of single-generic wrappers (`NewResource<Person>`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_argument: Option<Box<Type>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_type: Option<Box<Type>>,
    /// Members of an inline object type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<Property>>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_members: Option<Vec<String>>,
}

impl Type {
    pub fn named<S: Into<String>>(name: S) -> Self {
        Self {
            type_name: name.into(),
            type_argument: None,
            element_type: None,
            properties: None,
            enum_members: None,
        }
    }

    pub fn void() -> Self {
        Self::named("void")
    }

    /// Catch-all for anything that has no better description
    pub fn object() -> Self {
        Self::named("object")
    }

    pub fn buffer() -> Self {
        Self::named("buffer")
    }

    pub fn array(element: Type) -> Self {
        Self {
            element_type: Some(Box::new(element)),
            ..Self::named("array")
        }
    }

    pub fn inline(properties: Vec<Property>) -> Self {
        Self {
            properties: Some(properties),
            ..Self::object()
        }
    }

    pub fn enumeration(members: Vec<String>) -> Self {
        Self {
            enum_members: Some(members),
            ..Self::named("enum")
        }
    }

    pub fn reference<S: Into<String>>(name: S, type_argument: Option<Type>) -> Self {
        Self {
            type_argument: type_argument.map(Box::new),
            ..Self::named(name)
        }
    }

    pub fn is_void(&self) -> bool {
        self.type_name == "void"
    }

    /// Whether this names a model declaration rather than a built-in shape.
    pub fn is_reference(&self) -> bool {
        !BUILTIN_TYPE_NAMES.contains(&self.type_name.as_str())
    }

    /// Readable name including type arguments (`ResponseBody<string[]>`).
    pub fn display_name(&self) -> String {
        match (&self.element_type, &self.type_argument) {
            (Some(element), _) if self.type_name == "array" => {
                format!("{}[]", element.display_name())
            }
            (_, Some(argument)) => format!("{}<{}>", self.type_name, argument.display_name()),
            _ => self.type_name.clone(),
        }
    }

    /// Direct child types: wrapper argument, array element, inline members.
    pub fn children(&self) -> impl Iterator<Item = &Type> {
        self.type_argument
            .as_deref()
            .into_iter()
            .chain(self.element_type.as_deref())
            .chain(self.properties.iter().flatten().map(|p| &p.type_))
    }

    /// Nesting of wrapper arguments and array elements: `string` is 1,
    /// `Tree<string[]>` is 3.
    pub fn depth(&self) -> usize {
        let argument = self.type_argument.as_deref().map_or(0, Type::depth);
        let element = self.element_type.as_deref().map_or(0, Type::depth);
        1 + argument.max(element)
    }
}

/// One member of an object type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: Type,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Primitive names accepted by `ParamFromPath` and auto path parameter rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    String,
    Double,
    Float,
    Integer,
    Long,
    Boolean,
    Date,
    DateTime,
}

impl PrimitiveType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveType::String => "string",
            PrimitiveType::Double => "double",
            PrimitiveType::Float => "float",
            PrimitiveType::Integer => "integer",
            PrimitiveType::Long => "long",
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Date => "date",
            PrimitiveType::DateTime => "datetime",
        }
    }

    pub fn to_type(self) -> Type {
        Type::named(self.as_str())
    }
}

impl FromStr for PrimitiveType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "string" => PrimitiveType::String,
            "double" | "number" => PrimitiveType::Double,
            "float" => PrimitiveType::Float,
            "int" | "integer" => PrimitiveType::Integer,
            "long" => PrimitiveType::Long,
            "boolean" | "bool" => PrimitiveType::Boolean,
            "date" => PrimitiveType::Date,
            "datetime" => PrimitiveType::DateTime,
            other => {
                return Err(crate::Error::config(format!(
                    "unknown primitive type '{}'",
                    other
                )))
            }
        })
    }
}

/// HTTP verbs recognized as method decorators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpVerb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Head,
}

impl HttpVerb {
    /// Verb for a decorator name, if it is one (`GET`, `POST`, ...)
    pub fn from_decorator(name: &str) -> Option<Self> {
        Some(match name {
            "GET" => HttpVerb::Get,
            "POST" => HttpVerb::Post,
            "PUT" => HttpVerb::Put,
            "PATCH" => HttpVerb::Patch,
            "DELETE" => HttpVerb::Delete,
            "OPTIONS" => HttpVerb::Options,
            "HEAD" => HttpVerb::Head,
            _ => return None,
        })
    }

    /// Verbs that may carry a request body
    pub fn accepts_body(&self) -> bool {
        matches!(
            self,
            HttpVerb::Post | HttpVerb::Put | HttpVerb::Patch | HttpVerb::Delete
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpVerb::Get => "get",
            HttpVerb::Post => "post",
            HttpVerb::Put => "put",
            HttpVerb::Patch => "patch",
            HttpVerb::Delete => "delete",
            HttpVerb::Options => "options",
            HttpVerb::Head => "head",
        }
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a parameter is read from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    FormData,
    Body,
    Context,
    Cookie,
}

impl ParameterLocation {
    /// Context and cookie inputs never appear in the document
    pub fn is_documented(&self) -> bool {
        !matches!(self, ParameterLocation::Context | ParameterLocation::Cookie)
    }
}

/// One formal input to an operation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    /// Wire name
    pub name: String,
    /// Declared identifier
    pub parameter_name: String,
    #[serde(rename = "in")]
    pub in_: ParameterLocation,
    #[serde(rename = "type")]
    pub type_: Type,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One documented or inferred response
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseType {
    pub status: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Type>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub examples: Option<JsonValue>,
}

/// A named credential plus optional scopes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Security {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
}

/// One operation on a controller
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Method {
    pub name: String,
    pub method: HttpVerb,
    /// Fragment below the controller path, slash-prefixed or empty
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,
    pub is_plural: bool,
    pub parameters: Vec<Parameter>,
    pub responses: Vec<ResponseType>,
    pub tags: Vec<String>,
    pub security: Vec<Security>,
    pub consumes: Vec<String>,
    pub produces: Vec<String>,
    pub deprecated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Resolved return type
    #[serde(rename = "type")]
    pub type_: Type,
}

/// One exported annotated class
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Controller {
    pub name: String,
    /// Source file the class is declared in
    pub location: String,
    /// Normalized base path; empty for the root
    pub path: String,
    pub methods: Vec<Method>,
    pub tags: Vec<String>,
    pub security: Vec<Security>,
    pub consumes: Vec<String>,
    pub produces: Vec<String>,
}

/// A named model referenced from the controllers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceType {
    pub type_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub properties: Vec<Property>,
    /// Target of a type alias that is not an object shape
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias_of: Option<Type>,
}

/// Output of one generation run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub controllers: Vec<Controller>,
    pub reference_types: BTreeMap<String, ReferenceType>,
}

/// `Security(name, scopes?)` decorators of a class or method, one entry each.
pub(crate) fn read_security<N: Decorated + ?Sized>(node: &N) -> Vec<Security> {
    get_named(node, "Security")
        .into_iter()
        .filter_map(|d| {
            let Some(name) = d.first_text() else {
                log::warn!("Ignoring Security decorator without a name");
                return None;
            };
            Some(Security {
                name,
                scopes: d.argument(1).and_then(Literal::string_elements),
            })
        })
        .collect()
}
