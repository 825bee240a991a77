//! Integration tests for schema synthesis.
//!
//! These tests register metadata, synthesize a schema and execute real
//! GraphQL requests against it.

use async_graphql::{Request, Variables};
use serde_json::json;
use typeweave_core::{
    EnumDeclaration, FieldDeclaration, FieldHandler, MetadataRegistry, Output, Record,
    ResolverMethod, ScalarDeclaration, SchemaProblem, TypeDeclaration, TypeExpr, TypeName,
};
use typeweave_graphql::{
    GraphQLError, LiveSchema, ResolvedTypeGraph, SchemaBuilderConfig, SchemaConfig,
    SchemaSynthesizer,
};

// =============================================================================
// Helpers
// =============================================================================

fn synthesize(registry: &MetadataRegistry, classes: &[&str]) -> ResolvedTypeGraph {
    let classes: Vec<TypeName> = classes.iter().map(|c| TypeName::from(*c)).collect();
    SchemaSynthesizer::default()
        .synthesize(registry, &classes)
        .expect("Schema should build successfully")
}

async fn execute_json(graph: &ResolvedTypeGraph, request: impl Into<Request>) -> serde_json::Value {
    let response = graph.execute(request).await;
    assert!(response.errors.is_empty(), "Unexpected errors: {:?}", response.errors);
    response.data.into_json().expect("response data should be JSON")
}

fn ping_resolver(registry: &mut MetadataRegistry) {
    registry.register_resolver_method(
        "PingResolver",
        ResolverMethod::query("ping", TypeExpr::string(), FieldHandler::sync(|_| Ok("pong".into()))),
    );
}

// =============================================================================
// Interface Conformance Tests
// =============================================================================

#[test]
fn test_conflicting_interface_field_fails_synthesis() {
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
    ping_resolver(&mut registry);

    let err = SchemaSynthesizer::default()
        .synthesize(&registry, &[TypeName::from("PingResolver")])
        .expect_err("conflicting field types must fail");

    let message = err.to_string();
    assert!(message.contains("\"I\""), "{message}");
    assert!(message.contains("\"O\""), "{message}");
    assert!(message.contains("\"g\""), "{message}");
    assert!(matches!(
        err.problems(),
        [SchemaProblem::InterfaceFieldMismatch { field, .. }] if field == "g"
    ));
}

#[test]
fn test_every_conformance_violation_is_reported() {
    let mut registry = MetadataRegistry::new();
    registry.register_type(
        TypeDeclaration::interface("Named").field(FieldDeclaration::new("name", TypeExpr::string().non_null())),
    );
    registry.register_type(
        TypeDeclaration::object("Cat")
            .implements("Named")
            .field(FieldDeclaration::new("name", TypeExpr::string())),
    );
    registry.register_type(
        TypeDeclaration::object("Dog")
            .implements("Named")
            .field(FieldDeclaration::new("name", TypeExpr::string().list())),
    );
    ping_resolver(&mut registry);

    let err = SchemaSynthesizer::default()
        .synthesize(&registry, &[TypeName::from("PingResolver")])
        .expect_err("both objects violate Named");
    assert_eq!(err.problems().len(), 2);
    assert!(err.mentions("Cat"));
    assert!(err.mentions("Dog"));
}

#[test]
fn test_interface_field_arguments_are_enforced() {
    let mut registry = MetadataRegistry::new();
    registry.register_type(
        TypeDeclaration::interface("I").field(
            FieldDeclaration::new("f", TypeExpr::int()).argument(FieldDeclaration::new("x", TypeExpr::int())),
        ),
    );
    registry.register_type(
        TypeDeclaration::object("O")
            .implements("I")
            .field(FieldDeclaration::new("f", TypeExpr::int())),
    );
    ping_resolver(&mut registry);

    let err = SchemaSynthesizer::default()
        .synthesize(&registry, &[TypeName::from("PingResolver")])
        .expect_err("missing interface argument must fail");
    assert!(matches!(
        err.problems(),
        [SchemaProblem::InterfaceArgumentMismatch { interface, object, field, argument, .. }]
            if interface == "I" && object == "O" && field == "f" && argument == "x"
    ));
}

#[tokio::test]
async fn test_objects_receive_fields_of_every_interface() {
    let mut registry = MetadataRegistry::new();
    registry.register_type(
        TypeDeclaration::interface("Node").field(FieldDeclaration::new("id", TypeExpr::id().non_null())),
    );
    registry.register_type(
        TypeDeclaration::interface("Timestamped")
            .field(FieldDeclaration::new("createdAt", TypeExpr::string())),
    );
    registry.register_type(
        TypeDeclaration::object("Post")
            .implements("Node")
            .implements("Timestamped")
            .field(FieldDeclaration::new("title", TypeExpr::string())),
    );
    registry.register_resolver_method(
        "PostResolver",
        ResolverMethod::query(
            "post",
            TypeExpr::named("Post"),
            FieldHandler::sync(|_| {
                Ok(Record::of("Post")
                    .with("id", "p1")
                    .with("createdAt", "2024-01-01")
                    .with("title", "Hello")
                    .into())
            }),
        ),
    );

    let graph = synthesize(&registry, &["PostResolver"]);
    let post = graph.model().objects.get("Post").expect("Post in model");
    let names: Vec<&str> = post.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["id", "createdAt", "title"]);

    let data = execute_json(&graph, "{ post { id createdAt title } }").await;
    assert_eq!(
        data,
        json!({ "post": { "id": "p1", "createdAt": "2024-01-01", "title": "Hello" } })
    );
}

// =============================================================================
// Inheritance Tests
// =============================================================================

#[tokio::test]
async fn test_three_level_object_extension() {
    let mut registry = MetadataRegistry::new();
    registry.register_type(
        TypeDeclaration::object("Base")
            .field(FieldDeclaration::new("id", TypeExpr::id()))
            .field(FieldDeclaration::new("label", TypeExpr::string())),
    );
    registry.register_type(
        TypeDeclaration::object("Middle")
            .extends("Base")
            .field(FieldDeclaration::new("label", TypeExpr::string().non_null()))
            .field(FieldDeclaration::new("depth", TypeExpr::int())),
    );
    registry.register_type(
        TypeDeclaration::object("Leaf")
            .extends("Middle")
            .field(FieldDeclaration::new("leaf", TypeExpr::boolean())),
    );
    registry.register_resolver_method(
        "LeafResolver",
        ResolverMethod::query(
            "leaf",
            TypeExpr::named("Leaf"),
            FieldHandler::sync(|_| {
                Ok(Record::of("Leaf")
                    .with("id", "l1")
                    .with("label", "bottom")
                    .with("depth", 3)
                    .with("leaf", true)
                    .into())
            }),
        ),
    );

    let graph = synthesize(&registry, &["LeafResolver"]);
    let leaf = graph.model().objects.get("Leaf").expect("Leaf in model");
    let fields: Vec<(&str, String)> = leaf
        .fields
        .iter()
        .map(|f| (f.name.as_str(), f.ty.to_string()))
        .collect();
    assert_eq!(
        fields,
        [
            ("id", "ID".to_string()),
            ("label", "String!".to_string()),
            ("depth", "Int".to_string()),
            ("leaf", "Boolean".to_string()),
        ]
    );

    let data = execute_json(&graph, "{ leaf { id label depth leaf } }").await;
    assert_eq!(
        data,
        json!({ "leaf": { "id": "l1", "label": "bottom", "depth": 3, "leaf": true } })
    );
}

#[test]
fn test_interface_extension_appears_in_sdl() {
    let mut registry = MetadataRegistry::new();
    registry.register_type(
        TypeDeclaration::interface("Entity").field(FieldDeclaration::new("id", TypeExpr::id())),
    );
    registry.register_type(
        TypeDeclaration::interface("Person")
            .extends("Entity")
            .field(FieldDeclaration::new("name", TypeExpr::string())),
    );
    registry.register_type(
        TypeDeclaration::object("Employee")
            .implements("Person")
            .field(FieldDeclaration::new("company", TypeExpr::string())),
    );
    ping_resolver(&mut registry);

    let graph = synthesize(&registry, &["PingResolver"]);
    let sdl = graph.sdl();
    assert!(sdl.contains("interface Person"), "{sdl}");
    assert!(sdl.contains("type Employee implements"), "{sdl}");

    let employee = graph.model().objects.get("Employee").expect("Employee in model");
    assert!(employee.interfaces.iter().any(|i| i == "Entity"));
    assert!(employee.fields.iter().any(|f| f.name == "id"));
    assert!(employee.fields.iter().any(|f| f.name == "name"));
}

#[test]
fn test_cyclic_extension_is_reported() {
    let mut registry = MetadataRegistry::new();
    registry.register_type(
        TypeDeclaration::object("A")
            .extends("B")
            .field(FieldDeclaration::new("a", TypeExpr::string())),
    );
    registry.register_type(
        TypeDeclaration::object("B")
            .extends("A")
            .field(FieldDeclaration::new("b", TypeExpr::string())),
    );
    ping_resolver(&mut registry);

    let err = SchemaSynthesizer::default()
        .synthesize(&registry, &[TypeName::from("PingResolver")])
        .expect_err("cycle must be reported");
    assert!(
        err.problems()
            .iter()
            .any(|p| matches!(p, SchemaProblem::CyclicExtension { .. }))
    );
}

// =============================================================================
// Argument And Input Tests
// =============================================================================

#[tokio::test]
async fn test_argument_set_flattening_with_defaults() {
    let mut registry = MetadataRegistry::new();
    registry.register_type(
        TypeDeclaration::argument_set("PageArgs")
            .field(FieldDeclaration::new("limit", TypeExpr::int()).default_value(10))
            .field(FieldDeclaration::new("offset", TypeExpr::int()).default_value(0)),
    );
    registry.register_type(
        TypeDeclaration::argument_set("SearchArgs")
            .extends("PageArgs")
            .field(FieldDeclaration::new("limit", TypeExpr::int()).default_value(25))
            .field(FieldDeclaration::new("term", TypeExpr::string())),
    );
    registry.register_resolver_method(
        "SearchResolver",
        ResolverMethod::query(
            "search",
            TypeExpr::string(),
            FieldHandler::sync(|input| {
                Ok(format!(
                    "{}:{}:{}",
                    input.arg_str("term").unwrap_or("*"),
                    input.arg_i64("limit").unwrap_or(-1),
                    input.arg_i64("offset").unwrap_or(-1),
                )
                .into())
            }),
        )
        .arguments_from("SearchArgs"),
    );

    let graph = synthesize(&registry, &["SearchResolver"]);
    let data = execute_json(&graph, "{ search }").await;
    assert_eq!(data, json!({ "search": "*:25:0" }));

    let data = execute_json(&graph, r#"{ search(term: "rust", offset: 5) }"#).await;
    assert_eq!(data, json!({ "search": "rust:25:5" }));
}

#[tokio::test]
async fn test_input_objects_enums_and_scalars() {
    let mut registry = MetadataRegistry::new();
    registry.register_scalar(ScalarDeclaration::new("DateTime").description("ISO-8601 timestamp"));
    registry.register_enum(EnumDeclaration::new("Role", ["ADMIN", "MEMBER"]));
    registry.register_type(
        TypeDeclaration::input("UserInput")
            .field(FieldDeclaration::new("name", TypeExpr::string().non_null()))
            .field(FieldDeclaration::new("role", TypeExpr::named("Role")).default_value("MEMBER")),
    );
    registry.register_type(
        TypeDeclaration::object("User")
            .field(FieldDeclaration::new("name", TypeExpr::string()))
            .field(FieldDeclaration::new("role", TypeExpr::named("Role")))
            .field(FieldDeclaration::new("joined", TypeExpr::named("DateTime"))),
    );
    registry.register_resolver_method(
        "UserResolver",
        ResolverMethod::mutation(
            "createUser",
            TypeExpr::named("User"),
            FieldHandler::sync(|input| {
                let user = input.arg("input").cloned().unwrap_or_default();
                Ok(Record::of("User")
                    .with("name", user["name"].clone())
                    .with("role", user["role"].clone())
                    .with("joined", "2024-05-01T00:00:00Z")
                    .into())
            }),
        )
        .argument(FieldDeclaration::new("input", TypeExpr::named("UserInput").non_null())),
    );
    registry.register_resolver_method(
        "UserResolver",
        ResolverMethod::query("userCount", TypeExpr::int(), FieldHandler::sync(|_| Ok(1.into()))),
    );

    let graph = synthesize(&registry, &["UserResolver"]);
    let sdl = graph.sdl();
    assert!(sdl.contains("scalar DateTime"), "{sdl}");
    assert!(sdl.contains("enum Role"), "{sdl}");
    assert!(sdl.contains("input UserInput"), "{sdl}");
    assert!(sdl.contains("type Mutation"), "{sdl}");

    let request = Request::new(
        "mutation Create($input: UserInput!) { createUser(input: $input) { name role joined } }",
    )
    .variables(Variables::from_json(json!({ "input": { "name": "Ada" } })));
    let data = execute_json(&graph, request).await;
    assert_eq!(
        data,
        json!({
            "createUser": { "name": "Ada", "role": "MEMBER", "joined": "2024-05-01T00:00:00Z" }
        })
    );
}

// =============================================================================
// Field Resolution Tests
// =============================================================================

#[tokio::test]
async fn test_field_handlers_receive_parent_record() {
    let mut registry = MetadataRegistry::new();
    registry.register_type(
        TypeDeclaration::object("Author")
            .field(FieldDeclaration::new("first", TypeExpr::string()))
            .field(FieldDeclaration::new("last", TypeExpr::string()))
            .field(FieldDeclaration::new("full", TypeExpr::string()).resolve_with(FieldHandler::sync(
                |input| {
                    let parent = input.parent().expect("parent record");
                    let part = |name: &str| {
                        parent
                            .get(name)
                            .cloned()
                            .map(Output::into_json)
                            .and_then(|v| v.as_str().map(str::to_string))
                            .unwrap_or_default()
                    };
                    Ok(format!("{} {}", part("first"), part("last")).into())
                },
            ))),
    );
    registry.register_resolver_method(
        "AuthorResolver",
        ResolverMethod::query(
            "authors",
            TypeExpr::named("Author").non_null().list(),
            FieldHandler::new(|_| async {
                Ok(vec![
                    Record::of("Author").with("first", "Ada").with("last", "Lovelace"),
                    Record::of("Author").with("first", "Alan").with("last", "Turing"),
                ]
                .into())
            }),
        ),
    );

    let graph = synthesize(&registry, &["AuthorResolver"]);
    let data = execute_json(&graph, "{ authors { full } }").await;
    assert_eq!(
        data,
        json!({ "authors": [{ "full": "Ada Lovelace" }, { "full": "Alan Turing" }] })
    );
}

#[tokio::test]
async fn test_handler_error_is_field_error() {
    let mut registry = MetadataRegistry::new();
    registry.register_resolver_method(
        "FailingResolver",
        ResolverMethod::query(
            "broken",
            TypeExpr::string(),
            FieldHandler::sync(|_| Err(typeweave_core::ResolverError::new("backend offline"))),
        ),
    );
    ping_resolver(&mut registry);

    let graph = synthesize(&registry, &["FailingResolver", "PingResolver"]);
    let response = graph.execute("{ broken ping }").await;
    assert_eq!(response.errors.len(), 1);
    assert!(response.errors[0].message.contains("backend offline"));

    let data = response.data.into_json().expect("json");
    assert_eq!(data["ping"], "pong");
    assert!(data.get("broken").is_none_or(serde_json::Value::is_null), "{data}");
}

#[tokio::test]
async fn test_record_tagged_as_another_object_is_rejected() {
    let mut registry = MetadataRegistry::new();
    for name in ["User", "Team"] {
        registry.register_type(
            TypeDeclaration::object(name).field(FieldDeclaration::new("name", TypeExpr::string())),
        );
    }
    registry.register_resolver_method(
        "UserResolver",
        ResolverMethod::query(
            "me",
            TypeExpr::named("User"),
            FieldHandler::sync(|_| Ok(Record::of("Team").with("name", "core").into())),
        ),
    );
    registry.register_resolver_method(
        "UserResolver",
        ResolverMethod::query(
            "plain",
            TypeExpr::named("User"),
            FieldHandler::sync(|_| Ok(Record::untyped().with("name", "ada").into())),
        ),
    );

    let graph = synthesize(&registry, &["UserResolver"]);
    let response = graph.execute("{ me { name } plain { name } }").await;
    assert_eq!(response.errors.len(), 1, "{:?}", response.errors);
    let message = &response.errors[0].message;
    assert!(message.contains("\"Team\""), "{message}");
    assert!(message.contains("\"User\""), "{message}");
    assert!(message.contains("\"Query.me\""), "{message}");

    let data = response.data.into_json().expect("json");
    assert_eq!(data["plain"], json!({ "name": "ada" }));
}

// =============================================================================
// Forward Reference Tests
// =============================================================================

#[tokio::test]
async fn test_mutually_referencing_types_through_deferred_names() {
    let mut registry = MetadataRegistry::new();
    registry.register_type(
        TypeDeclaration::object("A")
            .field(FieldDeclaration::new("n", TypeExpr::int()))
            .field(FieldDeclaration::new("b", TypeExpr::deferred(|| TypeName::from("B")))),
    );
    registry.register_type(
        TypeDeclaration::object("B").field(FieldDeclaration::new("a", TypeExpr::named("A"))),
    );
    registry.register_resolver_method(
        "GraphResolver",
        ResolverMethod::query(
            "a",
            TypeExpr::named("A"),
            FieldHandler::sync(|_| {
                let inner = Record::of("A").with("n", 2);
                Ok(Record::of("A")
                    .with("n", 1)
                    .with("b", Record::of("B").with("a", inner))
                    .into())
            }),
        ),
    );

    let graph = synthesize(&registry, &["GraphResolver"]);
    let b = graph.model().objects.get("A").expect("A in model").fields[1].ty.to_string();
    assert_eq!(b, "B");

    let data = execute_json(&graph, "{ a { n b { a { n } } } }").await;
    assert_eq!(data, json!({ "a": { "n": 1, "b": { "a": { "n": 2 } } } }));
}

// =============================================================================
// Root And Configuration Tests
// =============================================================================

#[test]
fn test_unknown_resolver_class_and_empty_root() {
    let registry = MetadataRegistry::new();
    let err = SchemaSynthesizer::default()
        .synthesize(&registry, &[TypeName::from("Missing")])
        .expect_err("nothing registered");
    assert!(err.problems().contains(&SchemaProblem::UnknownResolverClass {
        name: "Missing".into()
    }));
    assert!(err.problems().contains(&SchemaProblem::EmptyQueryRoot));
}

#[tokio::test]
async fn test_depth_limit_from_config() {
    let config = SchemaConfig::from_toml_str(
        r#"
        [schema]
        max_depth = 2
        "#,
    )
    .expect("valid config");

    let mut registry = MetadataRegistry::new();
    registry.register_type(
        TypeDeclaration::object("Tree")
            .field(FieldDeclaration::new("name", TypeExpr::string()))
            .field(FieldDeclaration::new("child", TypeExpr::named("Tree"))),
    );
    registry.register_resolver_method(
        "TreeResolver",
        ResolverMethod::query(
            "tree",
            TypeExpr::named("Tree"),
            FieldHandler::sync(|_| {
                Ok(Record::of("Tree")
                    .with("name", "root")
                    .with("child", Record::of("Tree").with("name", "leaf"))
                    .into())
            }),
        ),
    );

    let live = LiveSchema::from_config(&config, vec![TypeName::from("TreeResolver")]);
    live.rebuild(&registry).expect("rebuild");

    let response = live.execute("{ tree { child { name } } }").await.expect("schema");
    assert!(!response.errors.is_empty(), "three levels exceed the limit");

    let response = live.execute("{ tree { name } }").await.expect("schema");
    assert!(response.errors.is_empty());
}

#[test]
fn test_invalid_config_is_rejected() {
    let err = SchemaConfig::from_toml_str(
        r#"
        [schema]
        query_type = "Root"
        mutation_type = "Root"
        "#,
    )
    .expect_err("identical root names");
    assert_eq!(err.error_code(), "INVALID_CONFIG");

    let builder_config: SchemaBuilderConfig = SchemaConfig::default().to_schema_builder_config();
    assert_eq!(builder_config.analyzer.query_type, "Query");
    assert!(matches!(err, GraphQLError::InvalidConfig(_)));
}
