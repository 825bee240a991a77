//! Turns a registry into a [`SchemaModel`].
//!
//! Analysis runs in stages: catalog, inheritance, conformance, type
//! references, roots. Every problem of a stage is collected, and a failing
//! stage stops the run.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::catalog::{Catalog, NamedKind};
use crate::conformance::{self, ConformanceReport};
use crate::declaration::{ArgumentSource, FieldDeclaration, TypeKind};
use crate::error::{SchemaGenerationError, SchemaProblem};
use crate::inheritance::{EffectiveFieldSet, InheritanceResolver};
use crate::model::{
    ModelArgument, ModelEnum, ModelField, ModelInput, ModelInterface, ModelObject, ModelRoot,
    ModelScalar, ModelUnion, SchemaModel,
};
use crate::registry::{MetadataRegistry, OperationKind};
use crate::type_ref::{TypeExpr, TypeName, TypeSignature};

#[derive(Debug, Clone)]
pub struct AnalyzerOptions {
    /// Supply interface fields an object does not declare itself.
    pub inherit_interface_fields: bool,
    pub query_type: String,
    pub mutation_type: String,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            inherit_interface_fields: true,
            query_type: "Query".to_string(),
            mutation_type: "Mutation".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Input,
    Output,
}

impl Position {
    fn label(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
        }
    }

    fn accepts(self, kind: NamedKind) -> bool {
        match self {
            Self::Output => matches!(
                kind,
                NamedKind::Declared(TypeKind::Object | TypeKind::Interface)
                    | NamedKind::Union
                    | NamedKind::Scalar
                    | NamedKind::Enum
            ),
            Self::Input => matches!(
                kind,
                NamedKind::Declared(TypeKind::Input) | NamedKind::Scalar | NamedKind::Enum
            ),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SchemaAnalyzer {
    options: AnalyzerOptions,
}

impl SchemaAnalyzer {
    pub fn new(options: AnalyzerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &AnalyzerOptions {
        &self.options
    }

    /// Validates `registry` and builds the model exposing the methods of
    /// `resolver_classes` as root fields.
    pub fn analyze(
        &self,
        registry: &MetadataRegistry,
        resolver_classes: &[TypeName],
    ) -> Result<SchemaModel, SchemaGenerationError> {
        let catalog = Catalog::build(registry)?;
        let mut effective = InheritanceResolver::resolve_all(&catalog)?;
        let report = conformance::validate(
            &catalog,
            &mut effective,
            self.options.inherit_interface_fields,
        )?;

        let mut references = References::new(&catalog, &effective);
        let mut model = references.model(&report);
        if !references.problems.is_empty() {
            return Err(SchemaGenerationError::new(references.problems));
        }
        debug!(
            objects = model.objects.len(),
            interfaces = model.interfaces.len(),
            inputs = model.inputs.len(),
            unions = model.unions.len(),
            "Type references resolved"
        );

        let (query, mutation) = self.roots(&mut references, resolver_classes);
        if !references.problems.is_empty() {
            return Err(SchemaGenerationError::new(references.problems));
        }
        model.query = query;
        model.mutation = mutation;

        debug!(
            query_fields = model.query.fields.len(),
            mutation_fields = model.mutation.as_ref().map_or(0, |m| m.fields.len()),
            "Schema model assembled"
        );
        Ok(model)
    }

    fn roots(
        &self,
        references: &mut References<'_>,
        resolver_classes: &[TypeName],
    ) -> (ModelRoot, Option<ModelRoot>) {
        let catalog = references.catalog;
        let mut query = ModelRoot {
            name: self.options.query_type.clone(),
            fields: Vec::new(),
        };
        let mut mutation = ModelRoot {
            name: self.options.mutation_type.clone(),
            fields: Vec::new(),
        };

        for root in [&query.name, &mutation.name] {
            if catalog.kind_of(root).is_some() {
                references.report(SchemaProblem::DuplicateType { name: root.clone() });
            }
        }

        let mut requested: Vec<String> = Vec::new();
        for class in resolver_classes {
            let name = class.resolve(catalog.elements());
            if !requested.contains(&name) {
                requested.push(name);
            }
        }

        for class in &requested {
            if !catalog.resolvers.iter().any(|r| &r.resolver == class) {
                references.report(SchemaProblem::UnknownResolverClass { name: class.clone() });
            }
        }

        let mut owners: IndexMap<(OperationKind, String), String> = IndexMap::new();
        for entry in catalog.resolvers.iter().filter(|r| requested.contains(&r.resolver)) {
            let operation = entry.method.operation;
            let decl = &entry.method.field;
            let key = (operation, decl.name.clone());
            if let Some(first) = owners.get(&key) {
                references.report(SchemaProblem::DuplicateRootField {
                    operation,
                    field: decl.name.clone(),
                    first: first.clone(),
                    second: entry.resolver.clone(),
                });
                continue;
            }
            owners.insert(key, entry.resolver.clone());

            let root = match operation {
                OperationKind::Query => &mut query,
                OperationKind::Mutation => &mut mutation,
            };
            if let Some(field) = references.output_field(&root.name, &entry.resolver, decl) {
                root.fields.push(field);
            }
        }

        if query.fields.is_empty() {
            references.report(SchemaProblem::EmptyQueryRoot);
        }

        let mutation = (!mutation.fields.is_empty()).then_some(mutation);
        (query, mutation)
    }
}

/// Resolution of every type reference against the catalog.
struct References<'a> {
    catalog: &'a Catalog,
    effective: &'a IndexMap<String, EffectiveFieldSet>,
    argument_sets: IndexMap<String, Vec<ModelArgument>>,
    problems: Vec<SchemaProblem>,
}

impl<'a> References<'a> {
    fn new(catalog: &'a Catalog, effective: &'a IndexMap<String, EffectiveFieldSet>) -> Self {
        Self {
            catalog,
            effective,
            argument_sets: IndexMap::new(),
            problems: Vec::new(),
        }
    }

    fn report(&mut self, problem: SchemaProblem) {
        if !self.problems.contains(&problem) {
            self.problems.push(problem);
        }
    }

    fn signature(
        &mut self,
        owner: &str,
        field: &str,
        expr: &TypeExpr,
        position: Position,
    ) -> Option<TypeSignature> {
        let signature = expr.signature(self.catalog.elements());
        let reference = signature.named_type();
        match self.catalog.kind_of(reference) {
            None => {
                self.report(SchemaProblem::UnresolvableTypeReference {
                    owner: owner.to_string(),
                    field: field.to_string(),
                    reference: reference.to_string(),
                });
                None
            }
            Some(kind) if !position.accepts(kind) => {
                self.report(SchemaProblem::InvalidTypePosition {
                    owner: owner.to_string(),
                    field: field.to_string(),
                    reference: reference.to_string(),
                    kind: kind.describe(),
                    position: position.label(),
                });
                None
            }
            Some(_) => Some(signature),
        }
    }

    fn input_value(&mut self, owner: &str, decl: &FieldDeclaration) -> Option<ModelArgument> {
        let ty = self.signature(owner, &decl.name, &decl.ty, Position::Input)?;
        Some(ModelArgument {
            name: decl.name.clone(),
            ty,
            description: decl.description.clone(),
            default_value: decl.default_value.clone(),
        })
    }

    /// Flattened fields of an argument-set type, in effective order.
    fn argument_set(&mut self, name: &str) -> Vec<ModelArgument> {
        if let Some(arguments) = self.argument_sets.get(name) {
            return arguments.clone();
        }
        let effective = self.effective;
        let Some(fields) = effective.get(name) else {
            return Vec::new();
        };
        let arguments: Vec<ModelArgument> = fields
            .values()
            .filter_map(|entry| self.input_value(name, &entry.field))
            .collect();
        self.argument_sets.insert(name.to_string(), arguments.clone());
        arguments
    }

    /// Arguments of an output field; a later source replaces an earlier
    /// argument of the same name in place.
    fn arguments(&mut self, owner: &str, decl: &FieldDeclaration) -> Vec<ModelArgument> {
        let Some(binding) = &decl.resolver else {
            return Vec::new();
        };
        let mut arguments: IndexMap<String, ModelArgument> = IndexMap::new();
        for source in &binding.args {
            match source {
                ArgumentSource::Single(argument) => {
                    if let Some(argument) = self.input_value(owner, argument) {
                        arguments.insert(argument.name.clone(), argument);
                    }
                }
                ArgumentSource::Set(reference) => {
                    let name = reference.resolve(self.catalog.elements());
                    if self.catalog.kind_of(&name) != Some(NamedKind::Declared(TypeKind::ArgumentSet)) {
                        self.report(SchemaProblem::NotAnArgumentSet {
                            owner: owner.to_string(),
                            field: decl.name.clone(),
                            reference: name,
                        });
                        continue;
                    }
                    for argument in self.argument_set(&name) {
                        arguments.insert(argument.name.clone(), argument);
                    }
                }
            }
        }
        arguments.into_values().collect()
    }

    /// `owner` is the type the field appears on; `declared_by` is recorded
    /// on the model field.
    fn output_field(
        &mut self,
        owner: &str,
        declared_by: &str,
        decl: &FieldDeclaration,
    ) -> Option<ModelField> {
        let args = self.arguments(owner, decl);
        let ty = self.signature(owner, &decl.name, &decl.ty, Position::Output)?;
        Some(ModelField {
            name: decl.name.clone(),
            owner: declared_by.to_string(),
            ty,
            description: decl.description.clone(),
            deprecation: decl.deprecation.clone(),
            args,
            handler: decl.resolver.as_ref().and_then(|b| b.handler.clone()),
        })
    }

    fn output_fields(&mut self, owner: &str) -> Vec<ModelField> {
        let effective = self.effective;
        let Some(fields) = effective.get(owner) else {
            return Vec::new();
        };
        fields
            .values()
            .filter_map(|entry| self.output_field(owner, &entry.owner, &entry.field))
            .collect()
    }

    fn input_fields(&mut self, owner: &str, kind: TypeKind) -> Vec<ModelArgument> {
        let effective = self.effective;
        let Some(fields) = effective.get(owner) else {
            return Vec::new();
        };
        let mut resolved = Vec::new();
        for entry in fields.values() {
            if entry.field.resolver.is_some() {
                self.report(SchemaProblem::MisplacedResolver {
                    type_name: owner.to_string(),
                    kind,
                    field: entry.field.name.clone(),
                });
            }
            if kind == TypeKind::Input {
                resolved.extend(self.input_value(owner, &entry.field));
            }
        }
        resolved
    }

    fn model(&mut self, report: &ConformanceReport) -> SchemaModel {
        let catalog = self.catalog;
        let mut model = SchemaModel {
            objects: IndexMap::new(),
            interfaces: IndexMap::new(),
            inputs: IndexMap::new(),
            argument_sets: IndexMap::new(),
            unions: IndexMap::new(),
            scalars: IndexMap::new(),
            enums: IndexMap::new(),
            query: ModelRoot {
                name: String::new(),
                fields: Vec::new(),
            },
            mutation: None,
            elements: Arc::new(catalog.elements().clone()),
        };

        for scalar in catalog.scalars.values() {
            model.scalars.insert(
                scalar.name.clone(),
                ModelScalar {
                    name: scalar.name.clone(),
                    description: scalar.description.clone(),
                },
            );
        }

        for decl in catalog.enums.values() {
            model.enums.insert(
                decl.name.clone(),
                ModelEnum {
                    name: decl.name.clone(),
                    description: decl.description.clone(),
                    values: decl.values.clone(),
                },
            );
        }

        for ty in catalog.types() {
            match ty.kind {
                TypeKind::Object => {
                    let fields = self.output_fields(&ty.name);
                    model.objects.insert(
                        ty.name.clone(),
                        ModelObject {
                            name: ty.name.clone(),
                            description: ty.description.clone(),
                            fields,
                            interfaces: report.interfaces.get(&ty.name).cloned().unwrap_or_default(),
                            is_type_of: ty.is_type_of.clone(),
                        },
                    );
                }
                TypeKind::Interface => {
                    let fields = self.output_fields(&ty.name);
                    model.interfaces.insert(
                        ty.name.clone(),
                        ModelInterface {
                            name: ty.name.clone(),
                            description: ty.description.clone(),
                            fields,
                            interfaces: report
                                .interface_ancestors
                                .get(&ty.name)
                                .cloned()
                                .unwrap_or_default(),
                            implementers: report.implementers.get(&ty.name).cloned().unwrap_or_default(),
                            resolve_type: ty.resolve_type.clone(),
                        },
                    );
                }
                TypeKind::Input => {
                    let fields = self.input_fields(&ty.name, TypeKind::Input);
                    model.inputs.insert(
                        ty.name.clone(),
                        ModelInput {
                            name: ty.name.clone(),
                            description: ty.description.clone(),
                            fields,
                        },
                    );
                }
                TypeKind::ArgumentSet => {
                    self.input_fields(&ty.name, TypeKind::ArgumentSet);
                    self.argument_set(&ty.name);
                }
            }
        }

        for union in catalog.unions.values() {
            for member in &union.members {
                match catalog.kind_of(member) {
                    None => self.report(SchemaProblem::UndeclaredType {
                        name: member.clone(),
                        context: format!("union \"{}\"", union.name),
                    }),
                    Some(NamedKind::Declared(TypeKind::Object)) => {}
                    Some(_) => self.report(SchemaProblem::InvalidUnionMember {
                        union: union.name.clone(),
                        member: member.clone(),
                    }),
                }
            }
            model.unions.insert(
                union.name.clone(),
                ModelUnion {
                    name: union.name.clone(),
                    description: union.description.clone(),
                    members: union.members.clone(),
                    resolve_type: union.resolve_type.clone(),
                },
            );
        }

        model.argument_sets = self.argument_sets.clone();
        model
    }
}
