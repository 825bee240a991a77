//! The metadata registry.
//!
//! Program elements register their declarations here through plain calls.
//! Registration never fails and tolerates forward references: a field, an
//! `implements` edge or an `extends` edge may name a type that is declared
//! later (or never, which is reported when the schema is analyzed).
//!
//! A process-wide instance is available through [`global`]; independent
//! registries are plain values, which keeps tests isolated.

use std::fmt;
use std::sync::LazyLock;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::declaration::{
    EnumDeclaration, FieldDeclaration, ScalarDeclaration, TypeDeclaration, UnionDeclaration,
};
use crate::type_ref::{TypeExpr, TypeName};
use crate::value::FieldHandler;

/// Root operation a resolver method is exposed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Query,
    Mutation,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query => f.write_str("Query"),
            Self::Mutation => f.write_str("Mutation"),
        }
    }
}

/// A root field contributed by a resolver class.
#[derive(Debug, Clone)]
pub struct ResolverMethod {
    pub(crate) operation: OperationKind,
    pub(crate) field: FieldDeclaration,
}

impl ResolverMethod {
    pub fn new(
        operation: OperationKind,
        name: impl Into<String>,
        ty: TypeExpr,
        handler: FieldHandler,
    ) -> Self {
        Self {
            operation,
            field: FieldDeclaration::new(name, ty).resolve_with(handler),
        }
    }

    pub fn query(name: impl Into<String>, ty: TypeExpr, handler: FieldHandler) -> Self {
        Self::new(OperationKind::Query, name, ty, handler)
    }

    pub fn mutation(name: impl Into<String>, ty: TypeExpr, handler: FieldHandler) -> Self {
        Self::new(OperationKind::Mutation, name, ty, handler)
    }

    #[must_use]
    pub fn argument(mut self, argument: FieldDeclaration) -> Self {
        self.field = self.field.argument(argument);
        self
    }

    #[must_use]
    pub fn arguments_from(mut self, argument_set: impl Into<TypeName>) -> Self {
        self.field = self.field.arguments_from(argument_set);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.field = self.field.description(description);
        self
    }

    #[must_use]
    pub fn deprecated(mut self, reason: impl Into<String>) -> Self {
        self.field = self.field.deprecated(reason);
        self
    }

    pub fn operation(&self) -> OperationKind {
        self.operation
    }

    pub fn name(&self) -> &str {
        self.field.name()
    }
}

/// Append-only store of every registered declaration, until cleared.
#[derive(Debug, Clone, Default)]
pub struct MetadataRegistry {
    pub(crate) types: Vec<TypeDeclaration>,
    pub(crate) fields: Vec<(TypeName, FieldDeclaration)>,
    pub(crate) implements: Vec<(TypeName, TypeName)>,
    pub(crate) extends: Vec<(TypeName, TypeName)>,
    pub(crate) resolvers: Vec<(TypeName, ResolverMethod)>,
    pub(crate) scalars: Vec<ScalarDeclaration>,
    pub(crate) enums: Vec<EnumDeclaration>,
    pub(crate) unions: Vec<UnionDeclaration>,
    generation: u64,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_type(&mut self, decl: TypeDeclaration) {
        trace!(name = %decl.name, kind = %decl.kind, "Registering type");
        self.types.push(decl);
    }

    /// Adds a field to a type that may not be declared yet. Fields added this
    /// way follow the fields embedded in the declaration, in call order.
    pub fn register_field(&mut self, owner: impl Into<TypeName>, field: FieldDeclaration) {
        let owner = owner.into();
        trace!(owner = ?owner, field = %field.name, "Registering field");
        self.fields.push((owner, field));
    }

    pub fn register_implements<I, N>(&mut self, object: impl Into<TypeName>, interfaces: I)
    where
        I: IntoIterator<Item = N>,
        N: Into<TypeName>,
    {
        let object = object.into();
        for interface in interfaces {
            let interface = interface.into();
            trace!(object = ?object, interface = ?interface, "Registering implements edge");
            self.implements.push((object.clone(), interface));
        }
    }

    pub fn register_extends(&mut self, ty: impl Into<TypeName>, parent: impl Into<TypeName>) {
        let (ty, parent) = (ty.into(), parent.into());
        trace!(ty = ?ty, parent = ?parent, "Registering extends edge");
        self.extends.push((ty, parent));
    }

    pub fn register_resolver_method(&mut self, resolver: impl Into<TypeName>, method: ResolverMethod) {
        let resolver = resolver.into();
        trace!(
            resolver = ?resolver,
            operation = %method.operation,
            field = %method.name(),
            "Registering resolver method"
        );
        self.resolvers.push((resolver, method));
    }

    pub fn register_scalar(&mut self, scalar: ScalarDeclaration) {
        self.scalars.push(scalar);
    }

    pub fn register_enum(&mut self, decl: EnumDeclaration) {
        self.enums.push(decl);
    }

    pub fn register_union(&mut self, decl: UnionDeclaration) {
        self.unions.push(decl);
    }

    /// Discards every registration. There is no partial clear.
    pub fn clear(&mut self) {
        debug!(
            generation = self.generation,
            types = self.types.len(),
            "Clearing metadata registry"
        );
        let generation = self.generation + 1;
        *self = Self {
            generation,
            ..Self::default()
        };
    }

    /// Number of times this registry has been cleared.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
            && self.fields.is_empty()
            && self.implements.is_empty()
            && self.extends.is_empty()
            && self.resolvers.is_empty()
            && self.scalars.is_empty()
            && self.enums.is_empty()
            && self.unions.is_empty()
    }

    pub fn types(&self) -> &[TypeDeclaration] {
        &self.types
    }

    pub fn resolver_methods(&self) -> impl Iterator<Item = (&TypeName, &ResolverMethod)> {
        self.resolvers.iter().map(|(resolver, method)| (resolver, method))
    }
}

static GLOBAL: LazyLock<RwLock<MetadataRegistry>> = LazyLock::new(Default::default);

/// The process-wide registry.
pub fn global() -> &'static RwLock<MetadataRegistry> {
    &GLOBAL
}

pub fn with_registry<R>(f: impl FnOnce(&MetadataRegistry) -> R) -> R {
    f(&GLOBAL.read())
}

pub fn with_registry_mut<R>(f: impl FnOnce(&mut MetadataRegistry) -> R) -> R {
    f(&mut GLOBAL.write())
}

/// Clears the process-wide registry.
pub fn reset_global() {
    GLOBAL.write().clear();
}
