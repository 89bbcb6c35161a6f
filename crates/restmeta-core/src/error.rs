//! Error handling for the restmeta metadata pipeline.
//!
//! This module defines the main error type `Error` used throughout the library,
//! along with a convenient `Result` type alias. Generation failures carry the
//! `Controller.method` location (and parameter name where relevant) of the
//! declaration that broke them.
//!
//! # Examples
//!
//! ```
//! use restmeta_core::error::{Error, Result};
//!
//! fn might_fail() -> Result<()> {
//!     Err(Error::config("unknown primitive type 'uuid'"))
//! }
//!
//! assert!(might_fail().is_err());
//! ```

use std::fmt;

use thiserror::Error;

/// Result type for restmeta operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for restmeta operations
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Malformed type expression or declaration tree
    #[error("Syntax error: {0}")]
    Syntax(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A decorator restricted to one occurrence was applied several times
    #[error("Only one {decorator} decorator allowed in '{location}' {scope}.")]
    DuplicateDecorator {
        decorator: String,
        location: String,
        scope: Scope,
    },

    /// More than one HTTP verb decorator on a single method
    #[error("Only one HTTP Method decorator in '{location}' method is acceptable, Found: {}", .found.join(", "))]
    MultipleHttpMethods { location: String, found: Vec<String> },

    /// More than one body parameter on a single method
    #[error("Only one body parameter allowed in '{0}' method.")]
    MultipleBodyParameters(String),

    /// Body and form parameters mixed on a single method
    #[error("Choose either during @FormParam and @FileParam or body parameter in '{0}' method.")]
    BodyWithFormData(String),

    /// A parameter declaration could not be turned into a parameter
    #[error("Error generate parameter method: '{location}' argument: {parameter} {source}")]
    Parameter {
        location: String,
        parameter: String,
        #[source]
        source: Box<Error>,
    },

    /// Unsupported use of a parameter declaration
    #[error("{0}")]
    Unsupported(String),

    /// A declaration lacks the name or source file it must have
    #[error("{0}")]
    Linkage(String),
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new syntax error
    pub fn syntax<S: Into<String>>(msg: S) -> Self {
        Self::Syntax(msg.into())
    }

    /// Create a new unsupported-declaration error
    pub fn unsupported<S: Into<String>>(msg: S) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Create a new linkage error
    pub fn linkage<S: Into<String>>(msg: S) -> Self {
        Self::Linkage(msg.into())
    }

    /// Create a duplicate decorator error
    pub fn duplicate<D: Into<String>, L: Into<String>>(decorator: D, location: L, scope: Scope) -> Self {
        Self::DuplicateDecorator {
            decorator: decorator.into(),
            location: location.into(),
            scope,
        }
    }
}

/// Kind of declaration a decorator lookup runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Controller,
    Method,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Controller => f.write_str("controller"),
            Scope::Method => f.write_str("method"),
        }
    }
}

impl From<regex::Error> for Error {
    fn from(e: regex::Error) -> Self {
        Self::Config(format!("invalid pattern: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiple_http_methods_names_location() {
        let err = Error::MultipleHttpMethods {
            location: "MyService.test".to_string(),
            found: vec!["GET".to_string(), "POST".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Only one HTTP Method decorator in 'MyService.test' method is acceptable, Found: GET, POST"
        );
    }

    #[test]
    fn test_parameter_error_wraps_cause() {
        let err = Error::Parameter {
            location: "MyService.test".to_string(),
            parameter: "body".to_string(),
            source: Box::new(Error::unsupported("Body can't support 'get' method.")),
        };
        assert_eq!(
            err.to_string(),
            "Error generate parameter method: 'MyService.test' argument: body Body can't support 'get' method."
        );
    }
}
