//! Schema configuration.
//!
//! Configuration can be specified in a TOML file under the `[schema]` section.
//!
//! # Example Configuration
//!
//! ```toml
//! [schema]
//! max_depth = 15
//! max_complexity = 500
//! introspection = true
//! inherit_interface_fields = true
//! query_type = "Query"
//! mutation_type = "Mutation"
//! ```

use serde::{Deserialize, Serialize};
use typeweave_core::AnalyzerOptions;
use typeweave_core::type_ref::is_builtin_scalar;

use crate::error::GraphQLError;
use crate::schema::SchemaBuilderConfig;

/// Schema synthesis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Maximum query depth allowed.
    /// Default: 15
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Maximum query complexity allowed.
    /// Default: 500
    #[serde(default = "default_max_complexity")]
    pub max_complexity: usize,

    /// Enable introspection queries.
    /// Default: true
    #[serde(default = "default_introspection")]
    pub introspection: bool,

    /// Supply interface fields that an implementing object does not declare.
    /// When disabled, such objects are rejected.
    /// Default: true
    #[serde(default = "default_inherit_interface_fields")]
    pub inherit_interface_fields: bool,

    /// Name of the query root type.
    /// Default: "Query"
    #[serde(default = "default_query_type")]
    pub query_type: String,

    /// Name of the mutation root type.
    /// Default: "Mutation"
    #[serde(default = "default_mutation_type")]
    pub mutation_type: String,
}

fn default_max_depth() -> usize {
    15
}

fn default_max_complexity() -> usize {
    500
}

fn default_introspection() -> bool {
    true
}

fn default_inherit_interface_fields() -> bool {
    true
}

fn default_query_type() -> String {
    "Query".to_string()
}

fn default_mutation_type() -> String {
    "Mutation".to_string()
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_complexity: default_max_complexity(),
            introspection: default_introspection(),
            inherit_interface_fields: default_inherit_interface_fields(),
            query_type: default_query_type(),
            mutation_type: default_mutation_type(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    schema: SchemaConfig,
}

impl SchemaConfig {
    /// Reads the `[schema]` table of a TOML document. A missing table yields
    /// the defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, GraphQLError> {
        let file: ConfigFile =
            toml::from_str(source).map_err(|e| GraphQLError::InvalidConfig(e.to_string()))?;
        file.schema
            .validate()
            .map_err(GraphQLError::InvalidConfig)?;
        Ok(file.schema)
    }

    /// Checks the query limits and the root type names.
    ///
    /// # Errors
    ///
    /// Returns a message naming the offending key.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_depth == 0 {
            return Err("schema.max_depth must be > 0".into());
        }
        if self.max_complexity == 0 {
            return Err("schema.max_complexity must be > 0".into());
        }
        for (key, name) in [
            ("query_type", &self.query_type),
            ("mutation_type", &self.mutation_type),
        ] {
            if name.is_empty() {
                return Err(format!("schema.{key} must not be empty"));
            }
            if is_builtin_scalar(name) {
                return Err(format!("schema.{key} must not name a built-in scalar"));
            }
        }
        if self.query_type == self.mutation_type {
            return Err("schema.query_type and schema.mutation_type must differ".into());
        }
        Ok(())
    }

    #[must_use]
    pub fn analyzer_options(&self) -> AnalyzerOptions {
        AnalyzerOptions {
            inherit_interface_fields: self.inherit_interface_fields,
            query_type: self.query_type.clone(),
            mutation_type: self.mutation_type.clone(),
        }
    }

    /// Converts this config to a SchemaBuilderConfig.
    #[must_use]
    pub fn to_schema_builder_config(&self) -> SchemaBuilderConfig {
        SchemaBuilderConfig {
            max_depth: self.max_depth,
            max_complexity: self.max_complexity,
            introspection_enabled: self.introspection,
            analyzer: self.analyzer_options(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SchemaConfig::default();
        assert_eq!(config.max_depth, 15);
        assert_eq!(config.max_complexity, 500);
        assert!(config.introspection);
        assert!(config.inherit_interface_fields);
        assert_eq!(config.query_type, "Query");
        assert_eq!(config.mutation_type, "Mutation");
    }

    #[test]
    fn test_query_limits_must_be_positive() {
        assert!(SchemaConfig::default().validate().is_ok());

        for limits in [(0, 500), (15, 0)] {
            let config = SchemaConfig {
                max_depth: limits.0,
                max_complexity: limits.1,
                ..SchemaConfig::default()
            };
            assert!(config.validate().is_err(), "{limits:?}");
        }
    }

    #[test]
    fn test_invalid_root_names() {
        let mut config = SchemaConfig::default();
        config.mutation_type = "Query".into();
        assert!(config.validate().is_err());

        let mut config = SchemaConfig::default();
        config.query_type = "String".into();
        assert!(config.validate().is_err());

        let mut config = SchemaConfig::default();
        config.query_type = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_from_toml() {
        let toml = r#"
            [schema]
            max_depth = 20
            max_complexity = 1000
            introspection = false
            inherit_interface_fields = false
            query_type = "RootQuery"
        "#;

        let config = SchemaConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.max_depth, 20);
        assert_eq!(config.max_complexity, 1000);
        assert!(!config.introspection);
        assert!(!config.inherit_interface_fields);
        assert_eq!(config.query_type, "RootQuery");
        assert_eq!(config.mutation_type, "Mutation");

        let options = config.analyzer_options();
        assert!(!options.inherit_interface_fields);
        assert_eq!(options.query_type, "RootQuery");
    }

    #[test]
    fn test_missing_table_uses_defaults() {
        let config = SchemaConfig::from_toml_str("[server]\nport = 8080\n").unwrap();
        assert_eq!(config.max_depth, 15);
    }

    #[test]
    fn test_invalid_toml_is_rejected() {
        let err = SchemaConfig::from_toml_str("[schema]\nmax_depth = 0\n").unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }
}
