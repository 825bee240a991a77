//! Runtime type discrimination for interface and union values.

use std::sync::Arc;

use crate::error::DiscriminationError;
use crate::type_ref::ElementNames;
use crate::value::{IsTypeOf, Record, ResolveType};

/// A possible concrete type of an abstract type.
#[derive(Debug, Clone)]
pub struct Implementer {
    pub name: String,
    pub is_type_of: Option<IsTypeOf>,
}

/// Decides which implementer a record returned for an abstract type is.
///
/// The decision is a pure function of the record and the implementer set, so
/// one discriminator can be shared by concurrently resolving fields.
///
/// Order of precedence:
/// 1. the type the record was constructed as;
/// 2. the abstract type's `resolveType` strategy;
/// 3. the first implementer whose `isTypeOf` predicate accepts the record.
#[derive(Debug, Clone)]
pub struct TypeDiscriminator {
    abstract_type: String,
    implementers: Vec<Implementer>,
    resolve_type: Option<ResolveType>,
    elements: Arc<ElementNames>,
}

impl TypeDiscriminator {
    pub fn new(
        abstract_type: impl Into<String>,
        implementers: Vec<Implementer>,
        resolve_type: Option<ResolveType>,
        elements: Arc<ElementNames>,
    ) -> Self {
        Self {
            abstract_type: abstract_type.into(),
            implementers,
            resolve_type,
            elements,
        }
    }

    pub fn abstract_type(&self) -> &str {
        &self.abstract_type
    }

    pub fn implementers(&self) -> impl Iterator<Item = &str> {
        self.implementers.iter().map(|i| i.name.as_str())
    }

    fn is_implementer(&self, name: &str) -> bool {
        self.implementers.iter().any(|i| i.name == name)
    }

    fn checked(&self, type_name: String, field: &str) -> Result<String, DiscriminationError> {
        if self.is_implementer(&type_name) {
            Ok(type_name)
        } else {
            Err(DiscriminationError::NotAnImplementer {
                abstract_type: self.abstract_type.clone(),
                field: field.to_string(),
                type_name,
            })
        }
    }

    /// Names the concrete type of `record`, returned by `field`
    /// (formatted as `Parent.field`).
    pub fn discriminate(&self, record: &Record, field: &str) -> Result<String, DiscriminationError> {
        if let Some(tag) = record.tag() {
            return self.checked(tag.resolve(&self.elements), field);
        }

        if let Some(name) = self.resolve_type.as_ref().and_then(|s| s.call(record)) {
            return self.checked(name, field);
        }

        self.implementers
            .iter()
            .find(|i| i.is_type_of.as_ref().is_some_and(|p| p.call(record)))
            .map(|i| i.name.clone())
            .ok_or_else(|| DiscriminationError::Unresolvable {
                abstract_type: self.abstract_type.clone(),
                field: field.to_string(),
            })
    }
}
