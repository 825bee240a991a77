//! Declarative schema metadata and its analysis.
//!
//! Program elements register type declarations, fields, `implements` and
//! `extends` edges and resolver methods with a [`MetadataRegistry`]. The
//! [`SchemaAnalyzer`] validates the registry, flattens inheritance, checks
//! interface conformance and resolves every type reference into a
//! [`SchemaModel`], ready to be handed to a protocol library.

pub mod analyzer;
pub mod catalog;
pub mod conformance;
pub mod declaration;
pub mod discriminator;
pub mod error;
pub mod inheritance;
pub mod model;
pub mod registry;
pub mod type_ref;
pub mod value;

pub use analyzer::{AnalyzerOptions, SchemaAnalyzer};
pub use declaration::{
    ArgumentSource, EnumDeclaration, FieldDeclaration, ScalarDeclaration, TypeDeclaration, TypeKind,
    UnionDeclaration,
};
pub use discriminator::TypeDiscriminator;
pub use error::{DiscriminationError, ResolverError, SchemaGenerationError, SchemaProblem};
pub use model::SchemaModel;
pub use registry::{MetadataRegistry, OperationKind, ResolverMethod};
pub use type_ref::{ElementId, TypeExpr, TypeName, TypeSignature};
pub use value::{FieldHandler, IsTypeOf, Output, Record, ResolveType, ResolverInput};

pub type Result<T> = std::result::Result<T, SchemaGenerationError>;
