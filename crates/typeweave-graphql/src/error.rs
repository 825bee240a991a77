//! Error types for the GraphQL layer.

use std::fmt;

use async_graphql::ErrorExtensions;
use typeweave_core::{DiscriminationError, ResolverError, SchemaGenerationError};

/// Errors that can occur while synthesizing or serving a schema.
#[derive(Debug)]
pub enum GraphQLError {
    /// No schema has been built yet.
    SchemaUnavailable,

    /// Schema synthesis failed; every collected problem is included.
    SchemaBuildFailed(SchemaGenerationError),

    /// Configuration could not be read or is invalid.
    InvalidConfig(String),

    /// The concrete type of an abstract value could not be decided.
    Discrimination(DiscriminationError),

    /// A field handler failed.
    Resolver(ResolverError),
}

impl fmt::Display for GraphQLError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SchemaUnavailable => {
                write!(f, "No schema has been built")
            }
            Self::SchemaBuildFailed(err) => {
                write!(f, "Failed to build schema: {err}")
            }
            Self::InvalidConfig(msg) => {
                write!(f, "Invalid schema configuration: {msg}")
            }
            Self::Discrimination(err) => write!(f, "{err}"),
            Self::Resolver(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for GraphQLError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::SchemaBuildFailed(err) => Some(err),
            Self::Discrimination(err) => Some(err),
            Self::Resolver(err) => Some(err),
            Self::SchemaUnavailable | Self::InvalidConfig(_) => None,
        }
    }
}

impl GraphQLError {
    /// Returns the error code for GraphQL error extensions.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::SchemaUnavailable => "SCHEMA_UNAVAILABLE",
            Self::SchemaBuildFailed(_) => "SCHEMA_BUILD_FAILED",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Discrimination(_) => "ABSTRACT_TYPE_UNRESOLVED",
            Self::Resolver(_) => "RESOLVER_ERROR",
        }
    }

    /// Converts into a field error carrying the error code as an extension.
    #[must_use]
    pub fn into_field_error(self) -> async_graphql::Error {
        let code = self.error_code();
        async_graphql::Error::new(self.to_string()).extend_with(|_, ext| ext.set("code", code))
    }
}

impl From<SchemaGenerationError> for GraphQLError {
    fn from(err: SchemaGenerationError) -> Self {
        Self::SchemaBuildFailed(err)
    }
}

impl From<DiscriminationError> for GraphQLError {
    fn from(err: DiscriminationError) -> Self {
        Self::Discrimination(err)
    }
}

impl From<ResolverError> for GraphQLError {
    fn from(err: ResolverError) -> Self {
        Self::Resolver(err)
    }
}
