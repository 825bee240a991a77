//! Schema synthesis and serving.
//!
//! ## Components
//!
//! - [`SchemaSynthesizer`] - Builds an executable schema from registered metadata
//! - [`ResolvedTypeGraph`] - The built schema with its model and discriminators
//! - [`LiveSchema`] - Swappable schema holder with rebuild support
//!
//! ## Architecture
//!
//! The synthesis process:
//! 1. The registry is analyzed into a validated model
//! 2. Scalars, enums, inputs, interfaces, objects and unions are emitted
//! 3. Query and mutation roots are assembled from resolver methods
//! 4. A discriminator is installed for every interface and union
//! 5. The execution library finalizes the schema

mod builder;
mod live;
mod resolve;

pub use builder::{ResolvedTypeGraph, SchemaBuilderConfig, SchemaSynthesizer};
pub use live::{LiveSchema, SchemaState};
