//! Flattening of extension chains into effective field sets.
//!
//! The effective fields of a type are its parent's effective fields overlaid
//! with its own. An own field named like an inherited one replaces it
//! entirely but keeps the inherited position; other own fields follow in
//! declaration order. The same rule applies to every category, and a type
//! may only extend a type of its own category.

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::catalog::Catalog;
use crate::declaration::FieldDeclaration;
use crate::error::{SchemaGenerationError, SchemaProblem};

/// A field as seen from a type, together with the type that declared it.
#[derive(Debug, Clone)]
pub struct EffectiveField {
    pub owner: String,
    pub field: FieldDeclaration,
}

pub type EffectiveFieldSet = IndexMap<String, EffectiveField>;

/// Returns `name` followed by its ancestors, nearest first.
///
/// Walks parent links with a visited list, so a cyclic chain is reported
/// instead of looping.
pub fn extension_chain(catalog: &Catalog, name: &str) -> Result<Vec<String>, SchemaProblem> {
    let mut current = catalog.get(name).ok_or_else(|| SchemaProblem::UndeclaredType {
        name: name.to_string(),
        context: "an extension chain".to_string(),
    })?;
    let mut chain = vec![current.name.clone()];

    while let Some(parent_name) = &current.parent {
        if let Some(start) = chain.iter().position(|n| n == parent_name) {
            return Err(SchemaProblem::CyclicExtension {
                chain: normalize_cycle(&chain[start..]),
            });
        }
        let parent = catalog
            .get(parent_name)
            .ok_or_else(|| SchemaProblem::UndeclaredType {
                name: parent_name.clone(),
                context: format!("the extends clause of \"{}\"", current.name),
            })?;
        if parent.kind != current.kind {
            return Err(SchemaProblem::IncompatibleExtension {
                type_name: current.name.clone(),
                kind: current.kind,
                parent: parent.name.clone(),
                parent_kind: parent.kind,
            });
        }
        chain.push(parent.name.clone());
        current = parent;
    }

    Ok(chain)
}

/// Rotates a cycle so it starts at its smallest name and closes on it, so
/// the same cycle reached from different members compares equal.
fn normalize_cycle(members: &[String]) -> Vec<String> {
    let start = members
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.cmp(b.1))
        .map_or(0, |(i, _)| i);
    let mut cycle: Vec<String> = members[start..]
        .iter()
        .chain(&members[..start])
        .cloned()
        .collect();
    if let Some(first) = cycle.first().cloned() {
        cycle.push(first);
    }
    cycle
}

/// Computes effective field sets, memoizing per type.
pub struct InheritanceResolver<'a> {
    catalog: &'a Catalog,
    cache: HashMap<String, EffectiveFieldSet>,
}

impl<'a> InheritanceResolver<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            cache: HashMap::new(),
        }
    }

    pub fn effective_fields(&mut self, name: &str) -> Result<EffectiveFieldSet, SchemaProblem> {
        if let Some(cached) = self.cache.get(name) {
            return Ok(cached.clone());
        }

        let chain = extension_chain(self.catalog, name)?;
        let mut fields = EffectiveFieldSet::new();

        // Root ancestor first so nearer declarations win.
        for type_name in chain.iter().rev() {
            if let Some(cached) = self.cache.get(type_name) {
                fields = cached.clone();
                continue;
            }
            let Some(ty) = self.catalog.get(type_name) else {
                continue;
            };
            for field in &ty.fields {
                if fields.contains_key(&field.name) {
                    trace!(
                        type_name = %ty.name,
                        field = %field.name,
                        "Own field replaces inherited field"
                    );
                }
                fields.insert(
                    field.name.clone(),
                    EffectiveField {
                        owner: ty.name.clone(),
                        field: field.clone(),
                    },
                );
            }
            self.cache.insert(type_name.clone(), fields.clone());
        }

        Ok(fields)
    }

    /// Effective fields of every catalogued type, in catalog order.
    pub fn resolve_all(
        catalog: &'a Catalog,
    ) -> Result<IndexMap<String, EffectiveFieldSet>, SchemaGenerationError> {
        let mut resolver = Self::new(catalog);
        let mut problems: Vec<SchemaProblem> = Vec::new();
        let mut resolved = IndexMap::new();

        for ty in catalog.types() {
            match resolver.effective_fields(&ty.name) {
                Ok(fields) => {
                    resolved.insert(ty.name.clone(), fields);
                }
                Err(problem) => {
                    if !problems.contains(&problem) {
                        problems.push(problem);
                    }
                }
            }
        }

        if !problems.is_empty() {
            return Err(SchemaGenerationError::new(problems));
        }

        debug!(types = resolved.len(), "Effective field sets computed");
        Ok(resolved)
    }
}
