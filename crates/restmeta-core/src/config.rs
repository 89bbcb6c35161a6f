//! Configuration management for restmeta generation runs.
//!
//! This module defines the `Config` struct read from a YAML, JSON or TOML
//! file, and the compiled [`Settings`] the generators consume. Auto path
//! parameter rules may be written either as `[pattern, type, description]`
//! lists or as mappings.
//!
//! # Examples
//!
//! ```
//! use restmeta_core::config::Config;
//!
//! let config: Config = serde_yaml::from_str(r#"
//! ignoreParameters: [req, res]
//! autoPathParameters:
//!   - ["^AUTOID_", long, auto id parameter]
//!   - {pattern: "Id$", primitiveType: string}
//! "#).unwrap();
//!
//! let settings = config.settings().unwrap();
//! assert_eq!(settings.auto_path_parameters.len(), 2);
//! assert!(settings.auto_path_parameters[0].pattern.is_match("AUTOID_test"));
//! ```

// Internal imports (std, crate)
use std::path::Path;

// External imports (alphabetized)
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_value::Value as SerdeValue;
use tokio::fs;

use crate::metadata::{PrimitiveType, Type};

/// Configuration for one generation run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Declaration tree to read
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_file: Option<String>,

    /// Where the metadata is written; stdout when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,

    /// Emit YAML instead of JSON
    #[serde(default)]
    pub yaml: bool,

    /// Parameter names never documented (framework-injected objects)
    #[serde(default)]
    pub ignore_parameters: Vec<String>,

    /// Ordered rules for inferring undeclared path parameters
    #[serde(default)]
    pub auto_path_parameters: Vec<AutoPathParameter>,
}

/// One automatic path parameter rule as written in the configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoPathParameter {
    /// Regular expression matched against placeholder names
    pub pattern: String,
    pub primitive_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AutoPathParameterMap {
    pattern: String,
    primitive_type: String,
    #[serde(default)]
    description: Option<String>,
}

impl<'de> Deserialize<'de> for AutoPathParameter {
    /// Accepts either `[pattern, primitiveType, description?]` or a mapping
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = SerdeValue::deserialize(deserializer)?;

        match value {
            SerdeValue::Seq(seq) => {
                let mut items = Vec::new();
                for item in seq {
                    if let SerdeValue::String(s) = item {
                        items.push(s);
                    } else {
                        return Err(serde::de::Error::custom(
                            "Expected auto path parameter rule entries to be strings",
                        ));
                    }
                }
                let mut items = items.into_iter();
                match (items.next(), items.next(), items.next(), items.next()) {
                    (Some(pattern), Some(primitive_type), description, None) => Ok(Self {
                        pattern,
                        primitive_type,
                        description,
                    }),
                    _ => Err(serde::de::Error::custom(
                        "Expected [pattern, primitiveType, description?]",
                    )),
                }
            }
            map @ SerdeValue::Map(_) => {
                let rule: AutoPathParameterMap =
                    map.deserialize_into().map_err(serde::de::Error::custom)?;
                Ok(Self {
                    pattern: rule.pattern,
                    primitive_type: rule.primitive_type,
                    description: rule.description,
                })
            }
            _ => Err(serde::de::Error::custom(
                "Expected auto path parameter rule as a list or a mapping",
            )),
        }
    }
}

/// A compiled auto path parameter rule
#[derive(Debug, Clone)]
pub struct AutoPathRule {
    pub pattern: Regex,
    pub type_: Type,
    pub description: Option<String>,
}

/// Configuration compiled for the generators
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub ignore_parameters: Vec<String>,
    pub auto_path_parameters: Vec<AutoPathRule>,
}

impl Config {
    /// Load configuration from a file; the format follows the extension
    /// (`.json`, `.toml`, anything else is YAML).
    pub async fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).await?;
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            Some("toml") => toml::from_str(&content)?,
            _ => serde_yaml::from_str(&content)?,
        };
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Save configuration to a file
    pub async fn save<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        let content = serde_yaml::to_string(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Compile patterns and primitive type names.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) for an invalid
    /// regular expression or an unknown primitive type.
    pub fn settings(&self) -> crate::Result<Settings> {
        let auto_path_parameters = self
            .auto_path_parameters
            .iter()
            .map(|rule| {
                Ok(AutoPathRule {
                    pattern: Regex::new(&rule.pattern)?,
                    type_: rule.primitive_type.parse::<PrimitiveType>()?.to_type(),
                    description: rule.description.clone(),
                })
            })
            .collect::<crate::Result<Vec<_>>>()?;

        Ok(Settings {
            ignore_parameters: self.ignore_parameters.clone(),
            auto_path_parameters,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> Config {
        Config {
            entry_file: Some("apis.yaml".to_string()),
            output_file: None,
            yaml: true,
            ignore_parameters: vec!["req".to_string()],
            auto_path_parameters: vec![AutoPathParameter {
                pattern: "^AUTOID_".to_string(),
                primitive_type: "long".to_string(),
                description: Some("auto id parameter".to_string()),
            }],
        }
    }

    #[tokio::test]
    async fn test_config_roundtrip() -> crate::Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("restmeta.yaml");

        let config = sample();
        config.save(&file_path).await?;

        let loaded = Config::from_file(&file_path).await?;
        assert_eq!(loaded, config);

        Ok(())
    }

    #[tokio::test]
    async fn test_config_formats_by_extension() -> crate::Result<()> {
        let dir = tempdir()?;

        let json_path = dir.path().join("restmeta.json");
        fs::write(
            &json_path,
            r#"{"ignoreParameters": ["ctx"], "autoPathParameters": [["Id$", "string"]]}"#,
        )
        .await?;
        let config = Config::from_file(&json_path).await?;
        assert_eq!(config.ignore_parameters, vec!["ctx".to_string()]);
        assert_eq!(config.auto_path_parameters[0].description, None);

        let toml_path = dir.path().join("restmeta.toml");
        fs::write(
            &toml_path,
            "yaml = true\n\n[[autoPathParameters]]\npattern = \"^AUTOID_\"\nprimitiveType = \"long\"\n",
        )
        .await?;
        let config = Config::from_file(&toml_path).await?;
        assert!(config.yaml);
        assert_eq!(config.auto_path_parameters[0].primitive_type, "long");

        Ok(())
    }

    #[test]
    fn test_invalid_rules_are_rejected() {
        let mut config = sample();
        config.auto_path_parameters[0].pattern = "(".to_string();
        assert!(matches!(config.settings(), Err(crate::Error::Config(_))));

        let mut config = sample();
        config.auto_path_parameters[0].primitive_type = "uuid".to_string();
        assert!(config.settings().is_err());

        let parsed: Result<Config, _> =
            serde_yaml::from_str("autoPathParameters:\n  - [only-one]\n");
        assert!(parsed.is_err());
    }
}
