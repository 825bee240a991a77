//! The validated, flattened and resolved description of a schema.

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use crate::discriminator::{Implementer, TypeDiscriminator};
use crate::type_ref::{ElementNames, TypeSignature};
use crate::value::{FieldHandler, IsTypeOf, ResolveType};

#[derive(Debug, Clone)]
pub struct ModelArgument {
    pub name: String,
    pub ty: TypeSignature,
    pub description: Option<String>,
    pub default_value: Option<JsonValue>,
}

#[derive(Debug, Clone)]
pub struct ModelField {
    pub name: String,
    /// Type (or resolver class, for root fields) that declared the field.
    pub owner: String,
    pub ty: TypeSignature,
    pub description: Option<String>,
    pub deprecation: Option<String>,
    pub args: Vec<ModelArgument>,
    pub handler: Option<FieldHandler>,
}

#[derive(Debug, Clone)]
pub struct ModelObject {
    pub name: String,
    pub description: Option<String>,
    pub fields: Vec<ModelField>,
    pub interfaces: Vec<String>,
    pub is_type_of: Option<IsTypeOf>,
}

#[derive(Debug, Clone)]
pub struct ModelInterface {
    pub name: String,
    pub description: Option<String>,
    pub fields: Vec<ModelField>,
    /// Interfaces this one extends, nearest first.
    pub interfaces: Vec<String>,
    pub implementers: Vec<String>,
    pub resolve_type: Option<ResolveType>,
}

#[derive(Debug, Clone)]
pub struct ModelInput {
    pub name: String,
    pub description: Option<String>,
    pub fields: Vec<ModelArgument>,
}

#[derive(Debug, Clone)]
pub struct ModelUnion {
    pub name: String,
    pub description: Option<String>,
    pub members: Vec<String>,
    pub resolve_type: Option<ResolveType>,
}

#[derive(Debug, Clone)]
pub struct ModelScalar {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ModelEnum {
    pub name: String,
    pub description: Option<String>,
    pub values: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ModelRoot {
    pub name: String,
    pub fields: Vec<ModelField>,
}

/// What a name in the model refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Object,
    Interface,
    Input,
    Union,
    Scalar,
    Enum,
}

#[derive(Debug, Clone)]
pub struct SchemaModel {
    pub objects: IndexMap<String, ModelObject>,
    pub interfaces: IndexMap<String, ModelInterface>,
    pub inputs: IndexMap<String, ModelInput>,
    /// Flattened argument sets; these never appear as schema types.
    pub argument_sets: IndexMap<String, Vec<ModelArgument>>,
    pub unions: IndexMap<String, ModelUnion>,
    pub scalars: IndexMap<String, ModelScalar>,
    pub enums: IndexMap<String, ModelEnum>,
    pub query: ModelRoot,
    pub mutation: Option<ModelRoot>,
    pub elements: Arc<ElementNames>,
}

impl SchemaModel {
    /// Kind of a schema type; built-in scalars are not listed.
    pub fn kind_of(&self, name: &str) -> Option<ModelKind> {
        if self.objects.contains_key(name) {
            Some(ModelKind::Object)
        } else if self.interfaces.contains_key(name) {
            Some(ModelKind::Interface)
        } else if self.inputs.contains_key(name) {
            Some(ModelKind::Input)
        } else if self.unions.contains_key(name) {
            Some(ModelKind::Union)
        } else if self.scalars.contains_key(name) {
            Some(ModelKind::Scalar)
        } else if self.enums.contains_key(name) {
            Some(ModelKind::Enum)
        } else {
            None
        }
    }

    pub fn is_abstract(&self, name: &str) -> bool {
        matches!(
            self.kind_of(name),
            Some(ModelKind::Interface | ModelKind::Union)
        )
    }

    /// Discriminator for an interface or union.
    pub fn discriminator(&self, abstract_type: &str) -> Option<TypeDiscriminator> {
        let (members, resolve_type) = if let Some(interface) = self.interfaces.get(abstract_type) {
            (&interface.implementers, interface.resolve_type.clone())
        } else if let Some(union) = self.unions.get(abstract_type) {
            (&union.members, union.resolve_type.clone())
        } else {
            return None;
        };

        let implementers = members
            .iter()
            .map(|name| Implementer {
                name: name.clone(),
                is_type_of: self.objects.get(name).and_then(|o| o.is_type_of.clone()),
            })
            .collect();

        Some(TypeDiscriminator::new(
            abstract_type,
            implementers,
            resolve_type,
            Arc::clone(&self.elements),
        ))
    }

    /// Names of every emitted type, excluding roots and built-in scalars.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.scalars
            .keys()
            .chain(self.enums.keys())
            .chain(self.inputs.keys())
            .chain(self.interfaces.keys())
            .chain(self.objects.keys())
            .chain(self.unions.keys())
            .map(String::as_str)
    }
}
