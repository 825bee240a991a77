//! Name-indexed view of a registry.
//!
//! Building a catalog dereferences every type reference held by the registry
//! and attaches edges and late-registered fields to their owners. It is the
//! first thing an analysis run does, so every later step works with plain
//! names.

use indexmap::IndexMap;
use tracing::debug;

use crate::declaration::{EnumDeclaration, FieldDeclaration, ScalarDeclaration, TypeKind};
use crate::error::{SchemaGenerationError, SchemaProblem};
use crate::registry::{MetadataRegistry, ResolverMethod};
use crate::type_ref::{ElementNames, is_builtin_scalar};
use crate::value::{IsTypeOf, ResolveType};

#[derive(Debug, Clone)]
pub struct CatalogType {
    pub name: String,
    pub kind: TypeKind,
    pub description: Option<String>,
    pub parent: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<FieldDeclaration>,
    pub is_type_of: Option<IsTypeOf>,
    pub resolve_type: Option<ResolveType>,
}

#[derive(Debug, Clone)]
pub struct CatalogUnion {
    pub name: String,
    pub description: Option<String>,
    pub members: Vec<String>,
    pub resolve_type: Option<ResolveType>,
}

#[derive(Debug, Clone)]
pub struct CatalogResolver {
    pub resolver: String,
    pub method: ResolverMethod,
}

/// What a type name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedKind {
    Declared(TypeKind),
    Scalar,
    Enum,
    Union,
}

impl NamedKind {
    pub fn describe(self) -> String {
        match self {
            Self::Declared(kind) => kind.to_string().to_lowercase(),
            Self::Scalar => "scalar".to_string(),
            Self::Enum => "enum".to_string(),
            Self::Union => "union".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub(crate) elements: ElementNames,
    pub(crate) types: IndexMap<String, CatalogType>,
    pub(crate) scalars: IndexMap<String, ScalarDeclaration>,
    pub(crate) enums: IndexMap<String, EnumDeclaration>,
    pub(crate) unions: IndexMap<String, CatalogUnion>,
    pub(crate) resolvers: Vec<CatalogResolver>,
}

impl Catalog {
    /// Indexes `registry`, reporting every naming problem at once.
    pub fn build(registry: &MetadataRegistry) -> Result<Self, SchemaGenerationError> {
        let mut problems = Vec::new();
        let mut catalog = Self::default();

        for decl in &registry.types {
            if let Some(element) = decl.element {
                catalog.elements.insert(element, decl.name.clone());
            }
        }

        for decl in &registry.types {
            if catalog.is_taken(&decl.name) {
                problems.push(SchemaProblem::DuplicateType {
                    name: decl.name.clone(),
                });
                continue;
            }
            let interfaces: Vec<String> = decl
                .interfaces
                .iter()
                .map(|i| i.resolve(&catalog.elements))
                .collect();
            if decl.kind != TypeKind::Object {
                for interface in &interfaces {
                    problems.push(SchemaProblem::ImplementsOnNonObject {
                        type_name: decl.name.clone(),
                        kind: decl.kind,
                        interface: interface.clone(),
                    });
                }
            }
            catalog.types.insert(
                decl.name.clone(),
                CatalogType {
                    name: decl.name.clone(),
                    kind: decl.kind,
                    description: decl.description.clone(),
                    parent: decl.parent.as_ref().map(|p| p.resolve(&catalog.elements)),
                    interfaces,
                    fields: decl.fields.clone(),
                    is_type_of: decl.is_type_of.clone(),
                    resolve_type: decl.resolve_type.clone(),
                },
            );
        }

        for scalar in &registry.scalars {
            if catalog.is_taken(&scalar.name) {
                problems.push(SchemaProblem::DuplicateType {
                    name: scalar.name.clone(),
                });
            } else {
                catalog.scalars.insert(scalar.name.clone(), scalar.clone());
            }
        }

        for decl in &registry.enums {
            if catalog.is_taken(&decl.name) {
                problems.push(SchemaProblem::DuplicateType {
                    name: decl.name.clone(),
                });
            } else {
                catalog.enums.insert(decl.name.clone(), decl.clone());
            }
        }

        for decl in &registry.unions {
            if catalog.is_taken(&decl.name) {
                problems.push(SchemaProblem::DuplicateType {
                    name: decl.name.clone(),
                });
                continue;
            }
            let members = decl
                .members
                .iter()
                .map(|m| m.resolve(&catalog.elements))
                .collect();
            catalog.unions.insert(
                decl.name.clone(),
                CatalogUnion {
                    name: decl.name.clone(),
                    description: decl.description.clone(),
                    members,
                    resolve_type: decl.resolve_type.clone(),
                },
            );
        }

        for (owner, field) in &registry.fields {
            let owner = owner.resolve(&catalog.elements);
            match catalog.types.get_mut(&owner) {
                Some(ty) => ty.fields.push(field.clone()),
                None => problems.push(SchemaProblem::UndeclaredType {
                    name: owner,
                    context: format!("field \"{}\"", field.name),
                }),
            }
        }

        for (ty, parent) in &registry.extends {
            let ty = ty.resolve(&catalog.elements);
            let parent = parent.resolve(&catalog.elements);
            let Some(entry) = catalog.types.get_mut(&ty) else {
                problems.push(SchemaProblem::UndeclaredType {
                    name: ty,
                    context: format!("an extends edge to \"{parent}\""),
                });
                continue;
            };
            match &entry.parent {
                Some(existing) if *existing != parent => {
                    problems.push(SchemaProblem::ConflictingParents {
                        type_name: ty,
                        first: existing.clone(),
                        second: parent,
                    });
                }
                Some(_) => {}
                None => entry.parent = Some(parent),
            }
        }

        for (object, interface) in &registry.implements {
            let object = object.resolve(&catalog.elements);
            let interface = interface.resolve(&catalog.elements);
            let Some(entry) = catalog.types.get_mut(&object) else {
                problems.push(SchemaProblem::UndeclaredType {
                    name: object,
                    context: format!("an implements edge to \"{interface}\""),
                });
                continue;
            };
            if entry.kind != TypeKind::Object {
                problems.push(SchemaProblem::ImplementsOnNonObject {
                    type_name: object,
                    kind: entry.kind,
                    interface,
                });
            } else if !entry.interfaces.contains(&interface) {
                entry.interfaces.push(interface);
            }
        }

        for (resolver, method) in &registry.resolvers {
            catalog.resolvers.push(CatalogResolver {
                resolver: resolver.resolve(&catalog.elements),
                method: method.clone(),
            });
        }

        if !problems.is_empty() {
            return Err(SchemaGenerationError::new(problems));
        }

        debug!(
            types = catalog.types.len(),
            scalars = catalog.scalars.len(),
            enums = catalog.enums.len(),
            unions = catalog.unions.len(),
            resolvers = catalog.resolvers.len(),
            "Catalog built"
        );
        Ok(catalog)
    }

    fn is_taken(&self, name: &str) -> bool {
        is_builtin_scalar(name)
            || self.types.contains_key(name)
            || self.scalars.contains_key(name)
            || self.enums.contains_key(name)
            || self.unions.contains_key(name)
    }

    pub fn kind_of(&self, name: &str) -> Option<NamedKind> {
        if is_builtin_scalar(name) || self.scalars.contains_key(name) {
            Some(NamedKind::Scalar)
        } else if let Some(ty) = self.types.get(name) {
            Some(NamedKind::Declared(ty.kind))
        } else if self.enums.contains_key(name) {
            Some(NamedKind::Enum)
        } else if self.unions.contains_key(name) {
            Some(NamedKind::Union)
        } else {
            None
        }
    }

    pub fn get(&self, name: &str) -> Option<&CatalogType> {
        self.types.get(name)
    }

    pub fn types(&self) -> impl Iterator<Item = &CatalogType> {
        self.types.values()
    }

    pub fn types_of_kind(&self, kind: TypeKind) -> impl Iterator<Item = &CatalogType> {
        self.types.values().filter(move |t| t.kind == kind)
    }

    pub fn elements(&self) -> &ElementNames {
        &self.elements
    }
}
