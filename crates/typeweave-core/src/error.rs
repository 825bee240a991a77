use std::fmt;

use thiserror::Error;

use crate::declaration::TypeKind;
use crate::registry::OperationKind;

/// A single structural problem found while turning registered declarations
/// into a schema model.
///
/// Every message quotes the offending type, interface and field names
/// verbatim so callers can match on them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaProblem {
    #[error("Type \"{name}\" is declared more than once")]
    DuplicateType { name: String },

    #[error("Type \"{name}\" is referenced by {context} but was never declared")]
    UndeclaredType { name: String, context: String },

    #[error("Type \"{type_name}\" extends both \"{first}\" and \"{second}\"; only one parent is allowed")]
    ConflictingParents {
        type_name: String,
        first: String,
        second: String,
    },

    #[error("Cyclic extension chain detected: {}", chain.join(" -> "))]
    CyclicExtension { chain: Vec<String> },

    #[error("{kind} \"{type_name}\" cannot extend {parent_kind} \"{parent}\"")]
    IncompatibleExtension {
        type_name: String,
        kind: TypeKind,
        parent: String,
        parent_kind: TypeKind,
    },

    #[error("{kind} \"{type_name}\" cannot implement interfaces (attempted \"{interface}\")")]
    ImplementsOnNonObject {
        type_name: String,
        kind: TypeKind,
        interface: String,
    },

    #[error("Object type \"{object}\" implements \"{name}\", which is not an interface type")]
    NotAnInterface { object: String, name: String },

    #[error("Interface \"{interface}\" requires field \"{field}\" but object type \"{object}\" does not provide it")]
    MissingInterfaceField {
        interface: String,
        object: String,
        field: String,
    },

    #[error("Field \"{field}\" of object type \"{object}\" has type {found} but interface \"{interface}\" declares it as {expected}")]
    InterfaceFieldMismatch {
        interface: String,
        object: String,
        field: String,
        expected: String,
        found: String,
    },

    #[error("Argument \"{argument}\" of field \"{object}.{field}\" does not match interface \"{interface}\": {detail}")]
    InterfaceArgumentMismatch {
        interface: String,
        object: String,
        field: String,
        argument: String,
        detail: String,
    },

    #[error("Field \"{owner}.{field}\" references unknown type \"{reference}\"")]
    UnresolvableTypeReference {
        owner: String,
        field: String,
        reference: String,
    },

    #[error("Field \"{owner}.{field}\" cannot use {kind} \"{reference}\" in {position} position")]
    InvalidTypePosition {
        owner: String,
        field: String,
        reference: String,
        kind: String,
        position: &'static str,
    },

    #[error("Union \"{union}\" member \"{member}\" must be an object type")]
    InvalidUnionMember { union: String, member: String },

    #[error("Field \"{owner}.{field}\" takes arguments from \"{reference}\", which is not an argument-set type")]
    NotAnArgumentSet {
        owner: String,
        field: String,
        reference: String,
    },

    #[error("Field \"{type_name}.{field}\" of {kind} \"{type_name}\" cannot carry a resolver")]
    MisplacedResolver {
        type_name: String,
        kind: TypeKind,
        field: String,
    },

    #[error("{operation} root field \"{field}\" is registered by both \"{first}\" and \"{second}\"")]
    DuplicateRootField {
        operation: OperationKind,
        field: String,
        first: String,
        second: String,
    },

    #[error("Resolver class \"{name}\" has no registered resolver methods")]
    UnknownResolverClass { name: String },

    #[error("Schema must contain at least one query field")]
    EmptyQueryRoot,

    #[error("Schema rejected by the execution library: {0}")]
    Protocol(String),
}

/// Aggregate failure of one schema build, carrying every problem that was
/// collected by the failing step in discovery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaGenerationError {
    problems: Vec<SchemaProblem>,
}

impl SchemaGenerationError {
    pub fn new(problems: Vec<SchemaProblem>) -> Self {
        Self { problems }
    }

    pub fn problems(&self) -> &[SchemaProblem] {
        &self.problems
    }

    pub fn into_problems(self) -> Vec<SchemaProblem> {
        self.problems
    }

    /// Returns true if any problem's message contains `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.problems.iter().any(|p| p.to_string().contains(needle))
    }
}

impl fmt::Display for SchemaGenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Schema generation failed with {} problem(s):",
            self.problems.len()
        )?;
        for problem in &self.problems {
            write!(f, "\n  - {problem}")?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaGenerationError {}

impl From<SchemaProblem> for SchemaGenerationError {
    fn from(problem: SchemaProblem) -> Self {
        Self::new(vec![problem])
    }
}

/// Failure to decide which concrete type a value of abstract type is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscriminationError {
    #[error(
        "Abstract type \"{abstract_type}\" must resolve to an object type at runtime for field \"{field}\". \
         The returned value was not constructed as any known implementer. \
         Either the \"{abstract_type}\" type should provide a \"resolveType\" function \
         or each possible type should provide an \"isTypeOf\" function."
    )]
    Unresolvable { abstract_type: String, field: String },

    #[error(
        "Runtime object type \"{type_name}\" returned for field \"{field}\" is not a possible type of \"{abstract_type}\""
    )]
    NotAnImplementer {
        abstract_type: String,
        field: String,
        type_name: String,
    },
}

/// Error raised by a user-supplied field handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ResolverError {
    message: String,
}

impl ResolverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<serde_json::Error> for ResolverError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(format!("JSON error: {err}"))
    }
}
