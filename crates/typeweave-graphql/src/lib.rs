//! # typeweave-graphql
//!
//! Executable GraphQL schemas synthesized from typeweave metadata.
//!
//! Types, fields, inheritance and resolver methods registered with a
//! [`MetadataRegistry`](typeweave_core::MetadataRegistry) are analyzed and
//! emitted through async-graphql's dynamic schema API. Values returned for
//! interface and union fields are classified at runtime by the discriminator
//! installed for that type.
//!
//! ## Configuration
//!
//! ```toml
//! [schema]
//! max_depth = 15
//! max_complexity = 500
//! introspection = true
//! inherit_interface_fields = true
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Configuration options
//! - [`schema`] - Schema synthesis and the live schema holder
//! - [`error`] - Error types for the GraphQL layer

pub mod config;
pub mod error;
pub mod schema;

// Re-export main types
pub use config::SchemaConfig;
pub use error::GraphQLError;
pub use schema::{LiveSchema, ResolvedTypeGraph, SchemaBuilderConfig, SchemaState, SchemaSynthesizer};

/// Result type for GraphQL operations.
pub type Result<T> = std::result::Result<T, GraphQLError>;
