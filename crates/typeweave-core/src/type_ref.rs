//! Type references and type expressions.
//!
//! A [`TypeName`] names a type without requiring it to exist yet. It can be a
//! literal name, the identity of a Rust type used as a program element, or a
//! deferred thunk evaluated (once) on first read. A [`TypeExpr`] wraps a name
//! in any nesting of list and non-null modifiers; resolving it against the
//! declared element names yields a concrete [`TypeSignature`].

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

/// Scalars every schema has without registering them.
pub const BUILTIN_SCALARS: [&str; 5] = ["Int", "Float", "String", "Boolean", "ID"];

/// Returns true for the scalars every schema provides.
pub fn is_builtin_scalar(name: &str) -> bool {
    BUILTIN_SCALARS.contains(&name)
}

/// Identity of a Rust type acting as a program element.
#[derive(Clone, Copy)]
pub struct ElementId {
    type_id: TypeId,
    ident: &'static str,
}

impl ElementId {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            ident: short_ident(std::any::type_name::<T>()),
        }
    }

    /// The element's own identifier, e.g. `Dog` for `my_app::model::Dog<T>`.
    pub fn ident(&self) -> &'static str {
        self.ident
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }
}

impl PartialEq for ElementId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ElementId {}

impl Hash for ElementId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ElementId({})", self.ident)
    }
}

fn short_ident(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Names under which program elements were declared.
#[derive(Debug, Clone, Default)]
pub struct ElementNames {
    names: HashMap<TypeId, String>,
}

impl ElementNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, element: ElementId, name: impl Into<String>) {
        self.names.insert(element.type_id, name.into());
    }

    /// Declared name of `element`, or its own identifier if it never was.
    pub fn name_of(&self, element: &ElementId) -> String {
        self.names
            .get(&element.type_id)
            .cloned()
            .unwrap_or_else(|| element.ident.to_string())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// A type name computed on first read and memoized.
pub struct DeferredName {
    thunk: Box<dyn Fn() -> TypeName + Send + Sync>,
    cell: OnceLock<TypeName>,
}

impl DeferredName {
    fn get(&self) -> &TypeName {
        self.cell.get_or_init(|| (self.thunk)())
    }

    pub fn is_evaluated(&self) -> bool {
        self.cell.get().is_some()
    }
}

/// Reference to a type that may not be registered yet.
#[derive(Clone)]
pub enum TypeName {
    Literal(String),
    Element(ElementId),
    Deferred(Arc<DeferredName>),
}

impl TypeName {
    pub fn literal(name: impl Into<String>) -> Self {
        Self::Literal(name.into())
    }

    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::Element(ElementId::of::<T>())
    }

    pub fn deferred<F>(thunk: F) -> Self
    where
        F: Fn() -> TypeName + Send + Sync + 'static,
    {
        Self::Deferred(Arc::new(DeferredName {
            thunk: Box::new(thunk),
            cell: OnceLock::new(),
        }))
    }

    /// Dereferences this name against the declared element names.
    pub fn resolve(&self, elements: &ElementNames) -> String {
        match self {
            Self::Literal(name) => name.clone(),
            Self::Element(element) => elements.name_of(element),
            Self::Deferred(deferred) => deferred.get().resolve(elements),
        }
    }
}

impl From<&str> for TypeName {
    fn from(name: &str) -> Self {
        Self::Literal(name.to_string())
    }
}

impl From<String> for TypeName {
    fn from(name: String) -> Self {
        Self::Literal(name)
    }
}

impl From<&String> for TypeName {
    fn from(name: &String) -> Self {
        Self::Literal(name.clone())
    }
}

impl From<ElementId> for TypeName {
    fn from(element: ElementId) -> Self {
        Self::Element(element)
    }
}

impl fmt::Debug for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(name) => write!(f, "{name}"),
            Self::Element(element) => write!(f, "<{}>", element.ident),
            Self::Deferred(deferred) => match deferred.cell.get() {
                Some(name) => write!(f, "{name:?}"),
                None => write!(f, "<deferred>"),
            },
        }
    }
}

/// A declared field or argument type: a named type wrapped in any nesting of
/// list and non-null modifiers.
#[derive(Clone, Debug)]
pub enum TypeExpr {
    Named(TypeName),
    List(Box<TypeExpr>),
    NonNull(Box<TypeExpr>),
}

impl TypeExpr {
    pub fn named(name: impl Into<TypeName>) -> Self {
        Self::Named(name.into())
    }

    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::Named(TypeName::of::<T>())
    }

    pub fn deferred<F>(thunk: F) -> Self
    where
        F: Fn() -> TypeName + Send + Sync + 'static,
    {
        Self::Named(TypeName::deferred(thunk))
    }

    pub fn int() -> Self {
        Self::named("Int")
    }

    pub fn float() -> Self {
        Self::named("Float")
    }

    pub fn string() -> Self {
        Self::named("String")
    }

    pub fn boolean() -> Self {
        Self::named("Boolean")
    }

    pub fn id() -> Self {
        Self::named("ID")
    }

    /// Wraps this type in a list.
    #[must_use]
    pub fn list(self) -> Self {
        Self::List(Box::new(self))
    }

    /// Wraps this type in non-null. Already non-null types are returned as is.
    #[must_use]
    pub fn non_null(self) -> Self {
        match self {
            Self::NonNull(_) => self,
            other => Self::NonNull(Box::new(other)),
        }
    }

    /// The innermost named type.
    pub fn inner(&self) -> &TypeName {
        match self {
            Self::Named(name) => name,
            Self::List(inner) | Self::NonNull(inner) => inner.inner(),
        }
    }

    pub fn signature(&self, elements: &ElementNames) -> TypeSignature {
        match self {
            Self::Named(name) => TypeSignature::Named(name.resolve(elements)),
            Self::List(inner) => TypeSignature::List(Box::new(inner.signature(elements))),
            Self::NonNull(inner) => TypeSignature::NonNull(Box::new(inner.signature(elements))),
        }
    }
}

/// A fully resolved type expression. Two signatures are compatible only when
/// they are structurally identical.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeSignature {
    Named(String),
    List(Box<TypeSignature>),
    NonNull(Box<TypeSignature>),
}

impl TypeSignature {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn named_type(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::List(inner) | Self::NonNull(inner) => inner.named_type(),
        }
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, Self::NonNull(_))
    }

    /// Number of list wrappers between the outside and the named type.
    pub fn list_depth(&self) -> usize {
        match self {
            Self::Named(_) => 0,
            Self::List(inner) => 1 + inner.list_depth(),
            Self::NonNull(inner) => inner.list_depth(),
        }
    }
}

impl fmt::Display for TypeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, "{name}"),
            Self::List(inner) => write!(f, "[{inner}]"),
            Self::NonNull(inner) => write!(f, "{inner}!"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct Dog;

    mod nested {
        pub struct Wrapper<T>(pub T);
    }

    #[test]
    fn test_signature_rendering() {
        let elements = ElementNames::new();
        let ty = TypeExpr::string().non_null().list().non_null();
        assert_eq!(ty.signature(&elements).to_string(), "[String!]!");

        let ty = TypeExpr::int().list();
        assert_eq!(ty.signature(&elements).to_string(), "[Int]");

        let ty = TypeExpr::id().non_null().list().non_null().list();
        let sig = ty.signature(&elements);
        assert_eq!(sig.to_string(), "[[ID!]!]");
        assert_eq!(sig.list_depth(), 2);
        assert_eq!(sig.named_type(), "ID");
        assert!(!sig.is_non_null());
    }

    #[test]
    fn test_non_null_is_idempotent() {
        let elements = ElementNames::new();
        let ty = TypeExpr::string().non_null().non_null();
        assert_eq!(ty.signature(&elements).to_string(), "String!");
    }

    #[test]
    fn test_nullability_positions_are_distinct() {
        let elements = ElementNames::new();
        let outer = TypeExpr::string().list().non_null().signature(&elements);
        let inner = TypeExpr::string().non_null().list().signature(&elements);
        assert_ne!(outer, inner);
    }

    #[test]
    fn test_element_names() {
        assert_eq!(ElementId::of::<Dog>().ident(), "Dog");
        assert_eq!(ElementId::of::<nested::Wrapper<Dog>>().ident(), "Wrapper");

        let mut elements = ElementNames::new();
        assert!(elements.is_empty());
        let dog = TypeName::of::<Dog>();
        assert_eq!(dog.resolve(&elements), "Dog");

        elements.insert(ElementId::of::<Dog>(), "Canine");
        assert_eq!(elements.len(), 1);
        assert_eq!(dog.resolve(&elements), "Canine");
    }

    #[test]
    fn test_deferred_name_is_memoized() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let name = TypeName::deferred(|| {
            CALLS.fetch_add(1, Ordering::SeqCst);
            TypeName::literal("Later")
        });
        let elements = ElementNames::new();
        let TypeName::Deferred(deferred) = &name else {
            panic!("deferred name expected");
        };
        assert!(!deferred.is_evaluated());

        assert_eq!(name.resolve(&elements), "Later");
        assert!(deferred.is_evaluated());
        assert_eq!(name.resolve(&elements), "Later");
        let cloned = name.clone();
        assert_eq!(cloned.resolve(&elements), "Later");
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_deferred_element_follows_rename() {
        let name = TypeName::deferred(TypeName::of::<Dog>);
        let mut elements = ElementNames::new();
        elements.insert(ElementId::of::<Dog>(), "Hound");
        assert_eq!(name.resolve(&elements), "Hound");
    }
}
