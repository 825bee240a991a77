//! Schema synthesis.
//!
//! `SchemaSynthesizer` analyzes a metadata registry and emits the result
//! through async-graphql's dynamic schema API, so the schema is constructed
//! at runtime from whatever was registered.

use std::sync::Arc;

use async_graphql::dynamic::{
    Enum, EnumItem, InputObject, Interface, InterfaceField, Object, Scalar, Schema, SchemaBuilder,
    Union,
};
use indexmap::IndexMap;
use tracing::{debug, trace};
use typeweave_core::discriminator::TypeDiscriminator;
use typeweave_core::model::{ModelRoot, SchemaModel};
use typeweave_core::registry::with_registry;
use typeweave_core::{
    AnalyzerOptions, MetadataRegistry, SchemaAnalyzer, SchemaGenerationError, SchemaProblem,
    TypeName,
};

use super::resolve::{Resolution, input_value, object_field, type_ref};

/// Configuration for the schema synthesizer.
#[derive(Debug, Clone)]
pub struct SchemaBuilderConfig {
    /// Maximum query depth allowed.
    pub max_depth: usize,

    /// Maximum query complexity allowed.
    pub max_complexity: usize,

    /// Whether to enable introspection queries.
    pub introspection_enabled: bool,

    /// Analysis options (root names, interface field inheritance).
    pub analyzer: AnalyzerOptions,
}

impl Default for SchemaBuilderConfig {
    fn default() -> Self {
        Self {
            max_depth: 15,
            max_complexity: 500,
            introspection_enabled: true,
            analyzer: AnalyzerOptions::default(),
        }
    }
}

/// A finished schema together with the model it was built from.
#[derive(Clone)]
pub struct ResolvedTypeGraph {
    schema: Schema,
    model: Arc<SchemaModel>,
    discriminators: Arc<IndexMap<String, TypeDiscriminator>>,
}

impl ResolvedTypeGraph {
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn model(&self) -> &SchemaModel {
        &self.model
    }

    /// Discriminator installed for an interface or union.
    pub fn discriminator(&self, abstract_type: &str) -> Option<&TypeDiscriminator> {
        self.discriminators.get(abstract_type)
    }

    pub fn sdl(&self) -> String {
        self.schema.sdl()
    }

    pub async fn execute(&self, request: impl Into<async_graphql::Request>) -> async_graphql::Response {
        self.schema.execute(request).await
    }
}

impl std::fmt::Debug for ResolvedTypeGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedTypeGraph")
            .field("query", &self.model.query.name)
            .field("types", &self.model.type_names().count())
            .field("discriminators", &self.discriminators.len())
            .finish()
    }
}

/// Builds executable schemas from registered metadata.
///
/// # Example
///
/// ```ignore
/// let synthesizer = SchemaSynthesizer::new(SchemaBuilderConfig::default());
/// let graph = synthesizer.synthesize(&registry, &[TypeName::from("UserResolver")])?;
/// let response = graph.execute("{ users { name } }").await;
/// ```
#[derive(Debug, Clone, Default)]
pub struct SchemaSynthesizer {
    config: SchemaBuilderConfig,
}

impl SchemaSynthesizer {
    #[must_use]
    pub fn new(config: SchemaBuilderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SchemaBuilderConfig {
        &self.config
    }

    /// Builds the schema exposing the methods of `resolver_classes` as root
    /// fields.
    ///
    /// # Errors
    ///
    /// Returns every problem found in the registry, or the execution
    /// library's rejection of the emitted schema.
    pub fn synthesize(
        &self,
        registry: &MetadataRegistry,
        resolver_classes: &[TypeName],
    ) -> Result<ResolvedTypeGraph, SchemaGenerationError> {
        debug!(
            resolver_classes = resolver_classes.len(),
            "Starting schema synthesis"
        );

        let model = SchemaAnalyzer::new(self.config.analyzer.clone())
            .analyze(registry, resolver_classes)?;
        let model = Arc::new(model);

        let discriminators: IndexMap<String, TypeDiscriminator> = model
            .interfaces
            .keys()
            .chain(model.unions.keys())
            .filter_map(|name| model.discriminator(name).map(|d| (name.clone(), d)))
            .collect();
        let discriminators = Arc::new(discriminators);
        trace!(count = discriminators.len(), "Installed discriminators");

        let resolution = Arc::new(Resolution {
            model: Arc::clone(&model),
            discriminators: Arc::clone(&discriminators),
        });

        let mutation_name = model.mutation.as_ref().map(|m| m.name.as_str());
        let mut builder = Schema::build(&model.query.name, mutation_name, None);
        builder = self.register_types(builder, &model, &resolution);
        builder = builder.register(self.build_root(&model.query, &resolution));
        if let Some(mutation) = &model.mutation {
            builder = builder.register(self.build_root(mutation, &resolution));
        }

        // Configure limits
        let mut builder = builder.limit_depth(self.config.max_depth);
        builder = builder.limit_complexity(self.config.max_complexity);

        if !self.config.introspection_enabled {
            builder = builder.disable_introspection();
        }

        let schema = builder
            .finish()
            .map_err(|e| SchemaGenerationError::from(SchemaProblem::Protocol(e.to_string())))?;

        debug!(
            types = model.type_names().count(),
            query_fields = model.query.fields.len(),
            "Schema synthesis complete"
        );
        Ok(ResolvedTypeGraph {
            schema,
            model,
            discriminators,
        })
    }

    /// [`synthesize`](Self::synthesize) against the process-wide registry.
    pub fn synthesize_global(
        &self,
        resolver_classes: &[TypeName],
    ) -> Result<ResolvedTypeGraph, SchemaGenerationError> {
        with_registry(|registry| self.synthesize(registry, resolver_classes))
    }

    fn register_types(
        &self,
        mut builder: SchemaBuilder,
        model: &SchemaModel,
        resolution: &Arc<Resolution>,
    ) -> SchemaBuilder {
        for scalar in model.scalars.values() {
            let mut emitted = Scalar::new(scalar.name.clone());
            if let Some(description) = &scalar.description {
                emitted = emitted.description(description.clone());
            }
            builder = builder.register(emitted);
        }

        for decl in model.enums.values() {
            let mut emitted = Enum::new(decl.name.clone());
            for value in &decl.values {
                emitted = emitted.item(EnumItem::new(value.clone()));
            }
            if let Some(description) = &decl.description {
                emitted = emitted.description(description.clone());
            }
            builder = builder.register(emitted);
        }

        for input in model.inputs.values() {
            let mut emitted = InputObject::new(input.name.clone());
            for field in &input.fields {
                emitted = emitted.field(input_value(field));
            }
            if let Some(description) = &input.description {
                emitted = emitted.description(description.clone());
            }
            builder = builder.register(emitted);
        }

        for interface in model.interfaces.values() {
            let mut emitted = Interface::new(interface.name.clone());
            for parent in &interface.interfaces {
                emitted = emitted.implement(parent.clone());
            }
            for field in &interface.fields {
                let mut emitted_field = InterfaceField::new(field.name.clone(), type_ref(&field.ty));
                for arg in &field.args {
                    emitted_field = emitted_field.argument(input_value(arg));
                }
                if let Some(description) = &field.description {
                    emitted_field = emitted_field.description(description.clone());
                }
                if field.deprecation.is_some() {
                    emitted_field = emitted_field.deprecation(field.deprecation.as_deref());
                }
                emitted = emitted.field(emitted_field);
            }
            if let Some(description) = &interface.description {
                emitted = emitted.description(description.clone());
            }
            trace!(interface = %interface.name, fields = interface.fields.len(), "Registered interface");
            builder = builder.register(emitted);
        }

        for object in model.objects.values() {
            let mut emitted = Object::new(object.name.clone());
            for interface in &object.interfaces {
                emitted = emitted.implement(interface.clone());
            }
            for field in &object.fields {
                emitted = emitted.field(object_field(resolution, &object.name, field));
            }
            if let Some(description) = &object.description {
                emitted = emitted.description(description.clone());
            }
            trace!(object = %object.name, fields = object.fields.len(), "Registered object");
            builder = builder.register(emitted);
        }

        for union in model.unions.values() {
            let mut emitted = Union::new(union.name.clone());
            for member in &union.members {
                emitted = emitted.possible_type(member.clone());
            }
            if let Some(description) = &union.description {
                emitted = emitted.description(description.clone());
            }
            builder = builder.register(emitted);
        }

        builder
    }

    fn build_root(&self, root: &ModelRoot, resolution: &Arc<Resolution>) -> Object {
        let mut object = Object::new(root.name.clone());
        for field in &root.fields {
            object = object.field(object_field(resolution, &root.name, field));
        }
        debug!(root = %root.name, fields = root.fields.len(), "Built root type");
        object
    }
}
