//! Interface conformance.
//!
//! An object's interfaces are the ones it declares, the ones declared by any
//! of its ancestors, and every interface those extend. For each of them, each
//! field of the interface's effective set must appear in the object's
//! effective set with an identical signature. Interface fields the object
//! does not have are supplied from the interface unless that is disabled.
//! Fields declared by the object must also accept the interface field's
//! arguments.

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::catalog::{Catalog, NamedKind};
use crate::declaration::{ArgumentSource, FieldDeclaration, TypeKind};
use crate::error::{SchemaGenerationError, SchemaProblem};
use crate::inheritance::{EffectiveFieldSet, extension_chain};
use crate::type_ref::TypeSignature;

/// Derived interface relationships of one analysis run.
#[derive(Debug, Clone, Default)]
pub struct ConformanceReport {
    /// Object name to every interface it conforms to, declared or derived.
    pub interfaces: IndexMap<String, Vec<String>>,
    /// Interface name to the objects conforming to it.
    pub implementers: IndexMap<String, Vec<String>>,
    /// Interface name to the interfaces it extends, nearest first.
    pub interface_ancestors: IndexMap<String, Vec<String>>,
}

/// Every interface `object` conforms to, in discovery order without
/// duplicates: own declarations first, then each ancestor's, each followed by
/// the interfaces it extends.
pub fn derived_interfaces(catalog: &Catalog, object: &str) -> Result<Vec<String>, Vec<SchemaProblem>> {
    let chain = extension_chain(catalog, object).map_err(|p| vec![p])?;
    let mut derived: Vec<String> = Vec::new();
    let mut problems = Vec::new();

    for type_name in &chain {
        let Some(ty) = catalog.get(type_name) else {
            continue;
        };
        for interface in &ty.interfaces {
            match catalog.get(interface) {
                None => problems.push(SchemaProblem::UndeclaredType {
                    name: interface.clone(),
                    context: format!("the implements clause of \"{type_name}\""),
                }),
                Some(decl) if decl.kind != TypeKind::Interface => {
                    problems.push(SchemaProblem::NotAnInterface {
                        object: type_name.clone(),
                        name: interface.clone(),
                    })
                }
                Some(_) => match extension_chain(catalog, interface) {
                    Ok(interfaces) => {
                        for name in interfaces {
                            if !derived.contains(&name) {
                                derived.push(name);
                            }
                        }
                    }
                    Err(problem) => problems.push(problem),
                },
            }
        }
    }

    if problems.is_empty() {
        Ok(derived)
    } else {
        Err(problems)
    }
}

/// Flattened argument signatures of a field. Argument sets are expanded in
/// place; references that are not argument sets are left to later analysis.
fn argument_signatures(
    catalog: &Catalog,
    effective: &IndexMap<String, EffectiveFieldSet>,
    field: &FieldDeclaration,
) -> IndexMap<String, TypeSignature> {
    let elements = catalog.elements();
    let mut arguments = IndexMap::new();
    let Some(binding) = &field.resolver else {
        return arguments;
    };
    for source in &binding.args {
        match source {
            ArgumentSource::Single(argument) => {
                arguments.insert(argument.name.clone(), argument.ty.signature(elements));
            }
            ArgumentSource::Set(reference) => {
                let name = reference.resolve(elements);
                if catalog.kind_of(&name) != Some(NamedKind::Declared(TypeKind::ArgumentSet)) {
                    continue;
                }
                for (argument, declared) in effective.get(&name).into_iter().flatten() {
                    arguments.insert(argument.clone(), declared.field.ty.signature(elements));
                }
            }
        }
    }
    arguments
}

/// An object field must accept every argument of the interface field with
/// the same type; any additional argument must be nullable.
fn argument_problems(
    catalog: &Catalog,
    effective: &IndexMap<String, EffectiveFieldSet>,
    interface: &str,
    object: &str,
    required: &FieldDeclaration,
    candidate: &FieldDeclaration,
) -> Vec<SchemaProblem> {
    let expected = argument_signatures(catalog, effective, required);
    let found = argument_signatures(catalog, effective, candidate);
    let problem = |argument: &str, detail: String| SchemaProblem::InterfaceArgumentMismatch {
        interface: interface.to_string(),
        object: object.to_string(),
        field: required.name.clone(),
        argument: argument.to_string(),
        detail,
    };

    let mut problems = Vec::new();
    for (argument, ty) in &expected {
        match found.get(argument) {
            None => problems.push(problem(argument, format!("missing, expected {ty}"))),
            Some(other) if other != ty => {
                problems.push(problem(argument, format!("expected {ty}, found {other}")));
            }
            Some(_) => {}
        }
    }
    for (argument, ty) in &found {
        if !expected.contains_key(argument) && ty.is_non_null() {
            problems.push(problem(
                argument,
                format!("additional argument of type {ty} must be nullable"),
            ));
        }
    }
    problems
}

/// Checks every object against its interfaces and completes object field
/// sets with supplied interface fields.
///
/// Supplied fields come before the object's own effective fields.
pub fn validate(
    catalog: &Catalog,
    effective: &mut IndexMap<String, EffectiveFieldSet>,
    inherit_interface_fields: bool,
) -> Result<ConformanceReport, SchemaGenerationError> {
    let elements = catalog.elements();
    let mut report = ConformanceReport::default();
    let mut problems: Vec<SchemaProblem> = Vec::new();

    for interface in catalog.types_of_kind(TypeKind::Interface) {
        report.implementers.insert(interface.name.clone(), Vec::new());
        match extension_chain(catalog, &interface.name) {
            Ok(chain) => {
                report
                    .interface_ancestors
                    .insert(interface.name.clone(), chain[1..].to_vec());
            }
            Err(problem) => problems.push(problem),
        }
    }

    for object in catalog.types_of_kind(TypeKind::Object) {
        let interfaces = match derived_interfaces(catalog, &object.name) {
            Ok(interfaces) => interfaces,
            Err(found) => {
                for problem in found {
                    if !problems.contains(&problem) {
                        problems.push(problem);
                    }
                }
                continue;
            }
        };

        let Some(own) = effective.get(&object.name) else {
            continue;
        };
        let mut supplied = EffectiveFieldSet::new();
        let problems_before = problems.len();

        // A later interface's diverging field replaces an earlier one, so the
        // earlier interface is the one that fails the check below.
        if inherit_interface_fields {
            for interface in &interfaces {
                let Some(interface_fields) = effective.get(interface) else {
                    continue;
                };
                for (name, required) in interface_fields {
                    if own.contains_key(name) {
                        continue;
                    }
                    let expected = required.field.ty.signature(elements);
                    if supplied
                        .get(name)
                        .is_some_and(|present| present.field.ty.signature(elements) == expected)
                    {
                        continue;
                    }
                    trace!(
                        object = %object.name,
                        interface = %interface,
                        field = %name,
                        "Supplying interface field"
                    );
                    supplied.insert(name.clone(), required.clone());
                }
            }
        }

        for interface in &interfaces {
            let Some(interface_fields) = effective.get(interface) else {
                continue;
            };
            for (name, required) in interface_fields {
                let Some(candidate) = own.get(name).or_else(|| supplied.get(name)) else {
                    problems.push(SchemaProblem::MissingInterfaceField {
                        interface: interface.clone(),
                        object: object.name.clone(),
                        field: name.clone(),
                    });
                    continue;
                };
                let expected = required.field.ty.signature(elements);
                let found = candidate.field.ty.signature(elements);
                if found != expected {
                    problems.push(SchemaProblem::InterfaceFieldMismatch {
                        interface: interface.clone(),
                        object: object.name.clone(),
                        field: name.clone(),
                        expected: expected.to_string(),
                        found: found.to_string(),
                    });
                    continue;
                }
                problems.extend(argument_problems(
                    catalog,
                    effective,
                    interface,
                    &object.name,
                    &required.field,
                    &candidate.field,
                ));
            }
        }

        if problems.len() == problems_before && !supplied.is_empty() {
            let mut merged = supplied;
            for (name, field) in own {
                merged.insert(name.clone(), field.clone());
            }
            effective.insert(object.name.clone(), merged);
        }

        for interface in &interfaces {
            if let Some(objects) = report.implementers.get_mut(interface) {
                objects.push(object.name.clone());
            }
        }
        report.interfaces.insert(object.name.clone(), interfaces);
    }

    if !problems.is_empty() {
        return Err(SchemaGenerationError::new(problems));
    }

    debug!(
        objects = report.interfaces.len(),
        interfaces = report.implementers.len(),
        "Interface conformance validated"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::{FieldDeclaration, TypeDeclaration};
    use crate::inheritance::InheritanceResolver;
    use crate::registry::MetadataRegistry;
    use crate::type_ref::TypeExpr;

    fn run(
        registry: &MetadataRegistry,
        inherit: bool,
    ) -> Result<(ConformanceReport, IndexMap<String, EffectiveFieldSet>), SchemaGenerationError> {
        let catalog = Catalog::build(registry)?;
        let mut effective = InheritanceResolver::resolve_all(&catalog)?;
        let report = validate(&catalog, &mut effective, inherit)?;
        Ok((report, effective))
    }

    fn field_names(set: &EffectiveFieldSet) -> Vec<&str> {
        set.keys().map(String::as_str).collect()
    }

    #[test]
    fn test_type_mismatch_names_interface_object_and_field() {
        let mut registry = MetadataRegistry::new();
        registry.register_type(
            TypeDeclaration::interface("I")
                .field(FieldDeclaration::new("f", TypeExpr::id()))
                .field(FieldDeclaration::new("g", TypeExpr::string())),
        );
        registry.register_type(
            TypeDeclaration::object("O")
                .implements("I")
                .field(FieldDeclaration::new("f", TypeExpr::id())),
        );
        registry.register_field("O", FieldDeclaration::new("g", TypeExpr::int()));

        let err = run(&registry, true).expect_err("mismatch");
        assert_eq!(err.problems().len(), 1);
        let message = err.to_string();
        assert!(message.contains("\"I\""));
        assert!(message.contains("\"O\""));
        assert!(message.contains("\"g\""));
        assert!(message.contains("Int"));
        assert!(message.contains("String"));
    }

    #[test]
    fn test_nullability_and_list_depth_must_match() {
        let mut registry = MetadataRegistry::new();
        registry.register_type(
            TypeDeclaration::interface("Tagged")
                .field(FieldDeclaration::new("tags", TypeExpr::string().non_null().list()))
                .field(FieldDeclaration::new("id", TypeExpr::id().non_null())),
        );
        registry.register_type(
            TypeDeclaration::object("Post")
                .implements("Tagged")
                .field(FieldDeclaration::new("tags", TypeExpr::string().list()))
                .field(FieldDeclaration::new("id", TypeExpr::id().non_null().list())),
        );

        let err = run(&registry, true).expect_err("mismatch");
        assert_eq!(err.problems().len(), 2);
        assert!(err.mentions("[String]"));
        assert!(err.mentions("[String!]"));
        assert!(err.mentions("[ID!]"));
    }

    #[test]
    fn test_all_violations_are_collected() {
        let mut registry = MetadataRegistry::new();
        registry.register_type(
            TypeDeclaration::interface("Node").field(FieldDeclaration::new("id", TypeExpr::id().non_null())),
        );
        for name in ["User", "Team"] {
            registry.register_type(
                TypeDeclaration::object(name)
                    .implements("Node")
                    .field(FieldDeclaration::new("id", TypeExpr::string())),
            );
        }

        let err = run(&registry, true).expect_err("mismatch");
        assert_eq!(err.problems().len(), 2);
        assert!(err.mentions("\"User\""));
        assert!(err.mentions("\"Team\""));
    }

    #[test]
    fn test_missing_field_when_inheritance_disabled() {
        let mut registry = MetadataRegistry::new();
        registry.register_type(
            TypeDeclaration::interface("Node").field(FieldDeclaration::new("id", TypeExpr::id().non_null())),
        );
        registry.register_type(TypeDeclaration::object("User").implements("Node"));

        let err = run(&registry, false).expect_err("missing");
        assert_eq!(
            err.problems(),
            [SchemaProblem::MissingInterfaceField {
                interface: "Node".into(),
                object: "User".into(),
                field: "id".into(),
            }]
        );

        let (_, effective) = run(&registry, true).expect("supplied");
        assert_eq!(field_names(&effective["User"]), ["id"]);
        assert_eq!(effective["User"]["id"].owner, "Node");
    }

    #[test]
    fn test_field_available_through_superclass() {
        let mut registry = MetadataRegistry::new();
        registry.register_type(
            TypeDeclaration::interface("Node").field(FieldDeclaration::new("id", TypeExpr::id().non_null())),
        );
        registry.register_type(
            TypeDeclaration::object("Entity").field(FieldDeclaration::new("id", TypeExpr::id().non_null())),
        );
        registry.register_type(
            TypeDeclaration::object("User")
                .extends("Entity")
                .implements("Node")
                .field(FieldDeclaration::new("email", TypeExpr::string())),
        );

        let (report, effective) = run(&registry, false).expect("conforms");
        assert_eq!(field_names(&effective["User"]), ["id", "email"]);
        assert_eq!(effective["User"]["id"].owner, "Entity");
        assert_eq!(report.implementers["Node"], ["User"]);
    }

    #[test]
    fn test_interfaces_derived_from_ancestors_and_interface_chains() {
        let mut registry = MetadataRegistry::new();
        registry.register_type(
            TypeDeclaration::interface("Node").field(FieldDeclaration::new("id", TypeExpr::id().non_null())),
        );
        registry.register_type(
            TypeDeclaration::interface("Resource")
                .extends("Node")
                .field(FieldDeclaration::new("url", TypeExpr::string())),
        );
        registry.register_type(
            TypeDeclaration::interface("Timestamped")
                .field(FieldDeclaration::new("createdAt", TypeExpr::string())),
        );
        registry.register_type(TypeDeclaration::object("Base").implements("Timestamped"));
        registry.register_type(TypeDeclaration::object("Photo").extends("Base").implements("Resource"));

        let (report, effective) = run(&registry, true).expect("conforms");
        assert_eq!(report.interfaces["Photo"], ["Resource", "Node", "Timestamped"]);
        assert_eq!(report.interfaces["Base"], ["Timestamped"]);
        assert_eq!(report.implementers["Node"], ["Photo"]);
        assert_eq!(report.implementers["Timestamped"], ["Base", "Photo"]);
        assert_eq!(report.interface_ancestors["Resource"], ["Node"]);
        assert_eq!(field_names(&effective["Photo"]), ["id", "url", "createdAt"]);
    }

    #[test]
    fn test_two_interfaces_union_their_fields() {
        let mut registry = MetadataRegistry::new();
        registry.register_type(
            TypeDeclaration::interface("Named")
                .field(FieldDeclaration::new("id", TypeExpr::id().non_null()))
                .field(FieldDeclaration::new("name", TypeExpr::string())),
        );
        registry.register_type(
            TypeDeclaration::interface("Aged")
                .field(FieldDeclaration::new("id", TypeExpr::id().non_null()))
                .field(FieldDeclaration::new("age", TypeExpr::int())),
        );
        registry.register_type(
            TypeDeclaration::object("Person")
                .implements("Named")
                .implements("Aged")
                .field(FieldDeclaration::new("email", TypeExpr::string())),
        );

        let (_, effective) = run(&registry, true).expect("conforms");
        assert_eq!(field_names(&effective["Person"]), ["id", "name", "age", "email"]);
        assert_eq!(effective["Person"]["id"].owner, "Named");
    }

    #[test]
    fn test_diverging_interfaces_conflict_on_first() {
        let mut registry = MetadataRegistry::new();
        registry.register_type(
            TypeDeclaration::interface("First").field(FieldDeclaration::new("code", TypeExpr::string().non_null())),
        );
        registry.register_type(
            TypeDeclaration::interface("Second").field(FieldDeclaration::new("code", TypeExpr::int())),
        );
        registry.register_type(TypeDeclaration::object("Both").implements("First").implements("Second"));

        let err = run(&registry, true).expect_err("conflict");
        assert_eq!(
            err.problems(),
            [SchemaProblem::InterfaceFieldMismatch {
                interface: "First".into(),
                object: "Both".into(),
                field: "code".into(),
                expected: "String!".into(),
                found: "Int".into(),
            }]
        );
    }

    fn search_interface(registry: &mut MetadataRegistry) {
        registry.register_type(
            TypeDeclaration::interface("Searchable").field(
                FieldDeclaration::new("matches", TypeExpr::int())
                    .argument(FieldDeclaration::new("term", TypeExpr::string().non_null())),
            ),
        );
    }

    #[test]
    fn test_object_field_must_accept_interface_arguments() {
        let mut registry = MetadataRegistry::new();
        search_interface(&mut registry);
        registry.register_type(
            TypeDeclaration::object("Page")
                .implements("Searchable")
                .field(FieldDeclaration::new("matches", TypeExpr::int())),
        );
        registry.register_type(
            TypeDeclaration::object("Note").implements("Searchable").field(
                FieldDeclaration::new("matches", TypeExpr::int())
                    .argument(FieldDeclaration::new("term", TypeExpr::string())),
            ),
        );

        let err = run(&registry, true).expect_err("argument mismatch");
        assert_eq!(err.problems().len(), 2);
        assert!(matches!(
            &err.problems()[0],
            SchemaProblem::InterfaceArgumentMismatch { interface, object, field, argument, .. }
                if interface == "Searchable" && object == "Page" && field == "matches" && argument == "term"
        ));
        let message = err.problems()[1].to_string();
        assert!(message.contains("\"Note.matches\""), "{message}");
        assert!(message.contains("expected String!, found String"), "{message}");
    }

    #[test]
    fn test_additional_object_arguments_must_be_nullable() {
        let mut registry = MetadataRegistry::new();
        search_interface(&mut registry);
        registry.register_type(
            TypeDeclaration::argument_set("SearchArgs")
                .field(FieldDeclaration::new("term", TypeExpr::string().non_null()))
                .field(FieldDeclaration::new("limit", TypeExpr::int())),
        );
        registry.register_type(
            TypeDeclaration::object("Page").implements("Searchable").field(
                FieldDeclaration::new("matches", TypeExpr::int()).arguments_from("SearchArgs"),
            ),
        );
        run(&registry, true).expect("nullable extra argument conforms");

        registry.register_type(
            TypeDeclaration::object("Note").implements("Searchable").field(
                FieldDeclaration::new("matches", TypeExpr::int())
                    .arguments_from("SearchArgs")
                    .argument(FieldDeclaration::new("strict", TypeExpr::boolean().non_null())),
            ),
        );
        let err = run(&registry, true).expect_err("required extra argument");
        assert!(matches!(
            err.problems(),
            [SchemaProblem::InterfaceArgumentMismatch { object, argument, .. }]
                if object == "Note" && argument == "strict"
        ));
    }

    #[test]
    fn test_supplied_field_keeps_interface_arguments() {
        let mut registry = MetadataRegistry::new();
        search_interface(&mut registry);
        registry.register_type(TypeDeclaration::object("Page").implements("Searchable"));

        let (_, effective) = run(&registry, true).expect("supplied");
        assert_eq!(effective["Page"]["matches"].owner, "Searchable");
    }

    #[test]
    fn test_implementing_a_non_interface() {
        let mut registry = MetadataRegistry::new();
        registry.register_type(TypeDeclaration::object("Plain"));
        registry.register_type(TypeDeclaration::object("User").implements("Plain").implements("Ghost"));

        let err = run(&registry, true).expect_err("invalid");
        assert_eq!(err.problems().len(), 2);
        assert!(matches!(&err.problems()[0], SchemaProblem::NotAnInterface { name, .. } if name == "Plain"));
        assert!(matches!(&err.problems()[1], SchemaProblem::UndeclaredType { name, .. } if name == "Ghost"));
    }
}
