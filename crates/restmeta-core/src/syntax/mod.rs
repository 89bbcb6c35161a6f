//! Read-only declaration tree consumed by the metadata pipeline.
//!
//! The tree is produced by an external front end and handed over as JSON or
//! YAML. It keeps exactly what the pipeline needs: declaration structure,
//! decorator names with their literal arguments, type expressions as text,
//! and doc comments.
//!
//! # Examples
//!
//! ```
//! use restmeta_core::syntax::Program;
//!
//! let program = Program::parse_content(r#"
//! files:
//!   - fileName: src/people.ts
//!     classes:
//!       - name: PeopleService
//!         exported: true
//!         decorators:
//!           - name: Path
//!             arguments: [people]
//! "#).unwrap();
//!
//! assert!(program.find_class("PeopleService").is_some());
//! ```

pub mod literal;
pub mod type_expr;

// Internal imports (std, crate)
use std::path::Path;

// External imports (alphabetized)
use serde::Deserialize;
use tokio::fs;

pub use literal::Literal;
pub use type_expr::{Keyword, PropertySignature, TypeExpr};

/// One applied decorator, as written
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decorator {
    /// Decorator expression, possibly qualified (`swagger.Response`)
    pub name: String,
    #[serde(default)]
    pub arguments: Vec<Literal>,
    #[serde(default)]
    pub type_arguments: Vec<TypeExpr>,
}

/// Block tag of a doc comment (`@summary`, `@param id the id`, ...)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DocTag {
    pub name: String,
    #[serde(default)]
    pub text: Option<String>,
}

/// Doc comment attached to a declaration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DocComment {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<DocTag>,
}

impl DocComment {
    pub fn tag(&self, name: &str) -> Option<&DocTag> {
        self.tags.iter().find(|t| t.name == name)
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tag(name).is_some()
    }

    /// Text of an `@param <name> <text>` tag for the given parameter.
    pub fn param_description(&self, param: &str) -> Option<String> {
        self.tags
            .iter()
            .filter(|t| t.name == "param")
            .filter_map(|t| t.text.as_deref())
            .find_map(|text| {
                let mut parts = text.trim().splitn(2, char::is_whitespace);
                (parts.next() == Some(param))
                    .then(|| parts.next().unwrap_or("").trim().to_string())
            })
            .filter(|d| !d.is_empty())
    }
}

/// Declarations that can carry decorators and doc comments.
pub trait Decorated {
    fn decorators(&self) -> &[Decorator];

    fn doc(&self) -> Option<&DocComment> {
        None
    }
}

/// Formal parameter of a method
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamDecl {
    pub name: String,
    #[serde(default, rename = "type")]
    pub type_expr: Option<TypeExpr>,
    /// Declared with `?`
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub initializer: Option<Literal>,
    #[serde(default)]
    pub decorators: Vec<Decorator>,
}

/// Method declaration of a class
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodDecl {
    /// Absent for computed names
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub parameters: Vec<ParamDecl>,
    #[serde(default)]
    pub return_type: Option<TypeExpr>,
    #[serde(default)]
    pub decorators: Vec<Decorator>,
    #[serde(default)]
    pub doc: Option<DocComment>,
}

/// Property of a class or interface
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDecl {
    pub name: String,
    #[serde(default, rename = "type")]
    pub type_expr: Option<TypeExpr>,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub decorators: Vec<Decorator>,
    #[serde(default)]
    pub doc: Option<DocComment>,
}

/// Class declaration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDecl {
    /// Absent for anonymous default exports
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub exported: bool,
    #[serde(default)]
    pub type_parameters: Vec<String>,
    #[serde(default)]
    pub extends: Option<TypeExpr>,
    #[serde(default)]
    pub decorators: Vec<Decorator>,
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
    #[serde(default)]
    pub properties: Vec<PropertyDecl>,
    #[serde(default)]
    pub doc: Option<DocComment>,
}

/// Interface declaration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceDecl {
    pub name: String,
    #[serde(default)]
    pub type_parameters: Vec<String>,
    #[serde(default)]
    pub extends: Vec<TypeExpr>,
    #[serde(default)]
    pub properties: Vec<PropertyDecl>,
    #[serde(default)]
    pub doc: Option<DocComment>,
}

/// `type Name<T> = ...`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeAliasDecl {
    pub name: String,
    #[serde(default)]
    pub type_parameters: Vec<String>,
    #[serde(rename = "type")]
    pub type_expr: TypeExpr,
    #[serde(default)]
    pub doc: Option<DocComment>,
}

/// One parsed source file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFile {
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub classes: Vec<ClassDecl>,
    #[serde(default)]
    pub interfaces: Vec<InterfaceDecl>,
    #[serde(default)]
    pub type_aliases: Vec<TypeAliasDecl>,
}

/// The whole declaration tree of one generation run
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Program {
    #[serde(default)]
    pub files: Vec<SourceFile>,
}

macro_rules! impl_decorated {
    ($($ty:ty),*) => {
        $(impl Decorated for $ty {
            fn decorators(&self) -> &[Decorator] {
                &self.decorators
            }

            fn doc(&self) -> Option<&DocComment> {
                self.doc.as_ref()
            }
        })*
    };
}

impl_decorated!(ClassDecl, MethodDecl, PropertyDecl);

impl Decorated for ParamDecl {
    fn decorators(&self) -> &[Decorator] {
        &self.decorators
    }
}

impl Program {
    /// Load a declaration tree from a file (supports both YAML and JSON)
    pub async fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).await?;
        Self::parse_content(&content).map_err(|e| {
            crate::Error::syntax(format!(
                "Failed to parse declaration tree at {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Parse content as either JSON or YAML
    pub fn parse_content(content: &str) -> crate::Result<Self> {
        // Try to parse as JSON first
        if let Ok(program) = serde_json::from_str(content) {
            return Ok(program);
        }

        // YAML is a superset of JSON, so its error is the informative one
        Ok(serde_yaml::from_str(content)?)
    }

    /// Find a class by name; qualified names match on their last segment.
    pub fn find_class(&self, name: &str) -> Option<(&SourceFile, &ClassDecl)> {
        let name = simple_name(name);
        self.files.iter().find_map(|file| {
            file.classes
                .iter()
                .find(|c| c.name.as_deref() == Some(name))
                .map(|c| (file, c))
        })
    }

    pub fn find_interface(&self, name: &str) -> Option<&InterfaceDecl> {
        let name = simple_name(name);
        self.files
            .iter()
            .flat_map(|f| f.interfaces.iter())
            .find(|i| i.name == name)
    }

    pub fn find_type_alias(&self, name: &str) -> Option<&TypeAliasDecl> {
        let name = simple_name(name);
        self.files
            .iter()
            .flat_map(|f| f.type_aliases.iter())
            .find(|a| a.name == name)
    }
}

/// Last segment of a dotted name.
pub fn simple_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const TREE: &str = r#"
files:
  - fileName: src/apis.ts
    classes:
      - name: MyService
        exported: true
        decorators:
          - name: Path
            arguments: [mypath]
        methods:
          - name: test2
            returnType: Person
            doc:
              description: This is the method description
              tags:
                - name: param
                  text: test This is the test param description
            parameters:
              - name: test
                type: string
                decorators:
                  - name: QueryParam
                    arguments: [testRequired]
              - name: test2
                type: string
                initializer: value
    interfaces:
      - name: Person
        properties:
          - name: name
            type: string
"#;

    #[test]
    fn test_parse_yaml_tree() {
        let program = Program::parse_content(TREE).unwrap();
        let (file, class) = program.find_class("Module.MyService").unwrap();
        assert_eq!(file.file_name, "src/apis.ts");
        assert_eq!(class.decorators[0].arguments, vec![Literal::String("mypath".into())]);
        let method = &class.methods[0];
        assert_eq!(method.return_type, Some(TypeExpr::reference("Person")));
        assert_eq!(method.parameters[1].initializer, Some(Literal::String("value".into())));
        assert_eq!(
            method.doc().unwrap().param_description("test").as_deref(),
            Some("This is the test param description")
        );
        assert!(program.find_interface("Person").is_some());
        assert!(program.find_type_alias("Person").is_none());
    }

    #[test]
    fn test_bad_type_text_is_rejected() {
        let tree = r#"{"files": [{"fileName": "a.ts", "typeAliases": [{"name": "X", "type": "Array<"}]}]}"#;
        assert!(Program::parse_content(tree).is_err());
    }

    #[tokio::test]
    async fn test_from_file() -> crate::Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("tree.json");
        let json_content = r#"
        {
            "files": [
                {
                    "fileName": "src/secure.ts",
                    "classes": [{"name": "SecureEndpoint", "exported": true}]
                }
            ]
        }
        "#;
        tokio::fs::write(&file_path, json_content).await?;

        let program = Program::from_file(&file_path).await?;
        assert_eq!(program.files.len(), 1);
        assert!(program.find_class("SecureEndpoint").is_some());
        Ok(())
    }
}
