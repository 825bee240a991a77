//! Declarations collected by the registry.

use std::fmt;

use serde_json::Value as JsonValue;

use crate::type_ref::{ElementId, TypeExpr, TypeName};
use crate::value::{FieldHandler, IsTypeOf, ResolveType};

/// Category of a declared type. Extension is only allowed within a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Object,
    Interface,
    Input,
    ArgumentSet,
}

impl TypeKind {
    /// Whether fields of this kind produce values (as opposed to accepting them).
    pub fn is_output(self) -> bool {
        matches!(self, Self::Object | Self::Interface)
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Object => "Object type",
            Self::Interface => "Interface type",
            Self::Input => "Input type",
            Self::ArgumentSet => "Argument-set type",
        };
        f.write_str(label)
    }
}

/// A declared object, interface, input or argument-set type.
#[derive(Debug, Clone)]
pub struct TypeDeclaration {
    pub(crate) name: String,
    pub(crate) element: Option<ElementId>,
    pub(crate) kind: TypeKind,
    pub(crate) description: Option<String>,
    pub(crate) parent: Option<TypeName>,
    pub(crate) interfaces: Vec<TypeName>,
    pub(crate) fields: Vec<FieldDeclaration>,
    pub(crate) is_type_of: Option<IsTypeOf>,
    pub(crate) resolve_type: Option<ResolveType>,
}

impl TypeDeclaration {
    pub fn new(kind: TypeKind, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            element: None,
            kind,
            description: None,
            parent: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            is_type_of: None,
            resolve_type: None,
        }
    }

    /// Declares the Rust type `T` as a schema type named after its identifier.
    pub fn for_element<T: ?Sized + 'static>(kind: TypeKind) -> Self {
        let element = ElementId::of::<T>();
        let mut decl = Self::new(kind, element.ident());
        decl.element = Some(element);
        decl
    }

    pub fn object(name: impl Into<String>) -> Self {
        Self::new(TypeKind::Object, name)
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self::new(TypeKind::Interface, name)
    }

    pub fn input(name: impl Into<String>) -> Self {
        Self::new(TypeKind::Input, name)
    }

    pub fn argument_set(name: impl Into<String>) -> Self {
        Self::new(TypeKind::ArgumentSet, name)
    }

    /// Overrides the default name.
    #[must_use]
    pub fn rename(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn extends(mut self, parent: impl Into<TypeName>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    #[must_use]
    pub fn implements(mut self, interface: impl Into<TypeName>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    #[must_use]
    pub fn field(mut self, field: FieldDeclaration) -> Self {
        self.fields.push(field);
        self
    }

    /// Predicate recognizing untagged records of this object type.
    #[must_use]
    pub fn is_type_of(mut self, predicate: IsTypeOf) -> Self {
        self.is_type_of = Some(predicate);
        self
    }

    /// Explicit resolution strategy for values of this interface type.
    #[must_use]
    pub fn resolve_type(mut self, strategy: ResolveType) -> Self {
        self.resolve_type = Some(strategy);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn element(&self) -> Option<ElementId> {
        self.element
    }
}

/// A field of any declared type, or an argument.
#[derive(Debug, Clone)]
pub struct FieldDeclaration {
    pub(crate) name: String,
    pub(crate) ty: TypeExpr,
    pub(crate) description: Option<String>,
    pub(crate) deprecation: Option<String>,
    pub(crate) default_value: Option<JsonValue>,
    pub(crate) resolver: Option<ResolverBinding>,
}

impl FieldDeclaration {
    pub fn new(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            name: name.into(),
            ty,
            description: None,
            deprecation: None,
            default_value: None,
            resolver: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn deprecated(mut self, reason: impl Into<String>) -> Self {
        self.deprecation = Some(reason.into());
        self
    }

    /// Default used when an input or argument value is omitted.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<JsonValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Binds a handler computing this field's value.
    #[must_use]
    pub fn resolve_with(mut self, handler: FieldHandler) -> Self {
        self.binding_mut().handler = Some(handler);
        self
    }

    /// Adds a single argument. Only meaningful together with a handler.
    #[must_use]
    pub fn argument(mut self, argument: FieldDeclaration) -> Self {
        self.binding_mut().args.push(ArgumentSource::Single(argument));
        self
    }

    /// Adds every field of an argument-set type as arguments.
    #[must_use]
    pub fn arguments_from(mut self, argument_set: impl Into<TypeName>) -> Self {
        self.binding_mut()
            .args
            .push(ArgumentSource::Set(argument_set.into()));
        self
    }

    fn binding_mut(&mut self) -> &mut ResolverBinding {
        self.resolver.get_or_insert_with(|| ResolverBinding {
            handler: None,
            args: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &TypeExpr {
        &self.ty
    }

    pub fn default(&self) -> Option<&JsonValue> {
        self.default_value.as_ref()
    }

    pub fn resolver(&self) -> Option<&ResolverBinding> {
        self.resolver.as_ref()
    }

    pub fn doc(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn deprecation(&self) -> Option<&str> {
        self.deprecation.as_deref()
    }
}

/// A handler bound to an output field, with its declared arguments.
///
/// Without a handler the field reads the same-named entry of its parent record.
#[derive(Debug, Clone)]
pub struct ResolverBinding {
    pub(crate) handler: Option<FieldHandler>,
    pub(crate) args: Vec<ArgumentSource>,
}

impl ResolverBinding {
    pub fn handler(&self) -> Option<&FieldHandler> {
        self.handler.as_ref()
    }

    pub fn args(&self) -> &[ArgumentSource] {
        &self.args
    }
}

/// Where a field's arguments come from.
#[derive(Debug, Clone)]
pub enum ArgumentSource {
    Single(FieldDeclaration),
    Set(TypeName),
}

/// A custom scalar.
#[derive(Debug, Clone)]
pub struct ScalarDeclaration {
    pub(crate) name: String,
    pub(crate) description: Option<String>,
}

impl ScalarDeclaration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// An enumeration of named values.
#[derive(Debug, Clone)]
pub struct EnumDeclaration {
    pub(crate) name: String,
    pub(crate) values: Vec<String>,
    pub(crate) description: Option<String>,
}

impl EnumDeclaration {
    pub fn new<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
            description: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A union of object types.
#[derive(Debug, Clone)]
pub struct UnionDeclaration {
    pub(crate) name: String,
    pub(crate) members: Vec<TypeName>,
    pub(crate) description: Option<String>,
    pub(crate) resolve_type: Option<ResolveType>,
}

impl UnionDeclaration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
            description: None,
            resolve_type: None,
        }
    }

    #[must_use]
    pub fn member(mut self, member: impl Into<TypeName>) -> Self {
        self.members.push(member.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn resolve_type(mut self, strategy: ResolveType) -> Self {
        self.resolve_type = Some(strategy);
        self
    }
}
