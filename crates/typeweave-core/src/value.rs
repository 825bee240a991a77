//! Runtime values produced by field handlers.
//!
//! Records built through [`Record::of`] carry the type they were constructed
//! as. That tag is what lets the discriminator classify a value returned for
//! an interface or union field without any reflection.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use crate::error::ResolverError;
use crate::type_ref::TypeName;

/// A value returned by a resolver.
#[derive(Debug, Clone, Default)]
pub enum Output {
    #[default]
    Null,
    Scalar(JsonValue),
    List(Vec<Output>),
    Record(Record),
}

impl Output {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Converts back to plain JSON, dropping record tags.
    pub fn into_json(self) -> JsonValue {
        match self {
            Self::Null => JsonValue::Null,
            Self::Scalar(value) => value,
            Self::List(items) => JsonValue::Array(items.into_iter().map(Self::into_json).collect()),
            Self::Record(record) => record.into_json(),
        }
    }
}

impl From<JsonValue> for Output {
    /// JSON objects become untagged records.
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => Self::Null,
            JsonValue::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            JsonValue::Object(map) => Self::Record(Record {
                tag: None,
                fields: map.into_iter().map(|(k, v)| (k, Self::from(v))).collect(),
            }),
            scalar => Self::Scalar(scalar),
        }
    }
}

impl From<Record> for Output {
    fn from(record: Record) -> Self {
        Self::Record(record)
    }
}

impl From<&str> for Output {
    fn from(value: &str) -> Self {
        Self::Scalar(JsonValue::String(value.to_string()))
    }
}

impl From<String> for Output {
    fn from(value: String) -> Self {
        Self::Scalar(JsonValue::String(value))
    }
}

impl From<bool> for Output {
    fn from(value: bool) -> Self {
        Self::Scalar(JsonValue::Bool(value))
    }
}

impl From<i32> for Output {
    fn from(value: i32) -> Self {
        Self::Scalar(value.into())
    }
}

impl From<i64> for Output {
    fn from(value: i64) -> Self {
        Self::Scalar(value.into())
    }
}

impl From<f64> for Output {
    fn from(value: f64) -> Self {
        Self::Scalar(value.into())
    }
}

impl<T: Into<Output>> From<Vec<T>> for Output {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Output>> From<Option<T>> for Output {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// A structured value, optionally tagged with the type it was constructed as.
#[derive(Debug, Clone, Default)]
pub struct Record {
    tag: Option<TypeName>,
    fields: IndexMap<String, Output>,
}

impl Record {
    /// A record constructed as the given type.
    pub fn of(type_name: impl Into<TypeName>) -> Self {
        Self {
            tag: Some(type_name.into()),
            fields: IndexMap::new(),
        }
    }

    /// A record constructed as the Rust type `T`'s declared schema type.
    pub fn of_element<T: ?Sized + 'static>() -> Self {
        Self::of(TypeName::of::<T>())
    }

    /// A bare record not constructed through any declared type.
    pub fn untyped() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Output>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Output>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Output> {
        self.fields.get(name)
    }

    pub fn tag(&self) -> Option<&TypeName> {
        self.tag.as_ref()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Output)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn into_json(self) -> JsonValue {
        JsonValue::Object(
            self.fields
                .into_iter()
                .map(|(k, v)| (k, v.into_json()))
                .collect(),
        )
    }
}

/// Inputs passed to a field handler.
#[derive(Debug, Clone, Default)]
pub struct ResolverInput {
    parent: Option<Record>,
    arguments: IndexMap<String, JsonValue>,
}

impl ResolverInput {
    pub fn new(parent: Option<Record>, arguments: IndexMap<String, JsonValue>) -> Self {
        Self { parent, arguments }
    }

    /// The record the field is being resolved on; `None` for root fields.
    pub fn parent(&self) -> Option<&Record> {
        self.parent.as_ref()
    }

    pub fn arg(&self, name: &str) -> Option<&JsonValue> {
        self.arguments.get(name).filter(|v| !v.is_null())
    }

    pub fn arg_str(&self, name: &str) -> Option<&str> {
        self.arg(name).and_then(JsonValue::as_str)
    }

    pub fn arg_i64(&self, name: &str) -> Option<i64> {
        self.arg(name).and_then(JsonValue::as_i64)
    }

    pub fn arg_bool(&self, name: &str) -> Option<bool> {
        self.arg(name).and_then(JsonValue::as_bool)
    }

    pub fn arguments(&self) -> &IndexMap<String, JsonValue> {
        &self.arguments
    }

    /// Deserializes a single argument.
    pub fn arg_as<T: serde::de::DeserializeOwned>(&self, name: &str) -> Result<Option<T>, ResolverError> {
        self.arg(name)
            .map(|v| serde_json::from_value(v.clone()))
            .transpose()
            .map_err(ResolverError::from)
    }
}

type HandlerFn =
    dyn Fn(ResolverInput) -> BoxFuture<'static, Result<Output, ResolverError>> + Send + Sync;

/// Function bound to a field that computes its value.
#[derive(Clone)]
pub struct FieldHandler(Arc<HandlerFn>);

impl FieldHandler {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(ResolverInput) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Output, ResolverError>> + Send + 'static,
    {
        Self(Arc::new(
            move |input| -> BoxFuture<'static, Result<Output, ResolverError>> { Box::pin(f(input)) },
        ))
    }

    /// A handler that completes without awaiting anything.
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(ResolverInput) -> Result<Output, ResolverError> + Send + Sync + 'static,
    {
        Self(Arc::new(
            move |input| -> BoxFuture<'static, Result<Output, ResolverError>> {
                let result = f(input);
                Box::pin(async move { result })
            },
        ))
    }

    pub fn call(&self, input: ResolverInput) -> BoxFuture<'static, Result<Output, ResolverError>> {
        (self.0)(input)
    }
}

impl fmt::Debug for FieldHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FieldHandler(..)")
    }
}

/// Explicit strategy naming the concrete type of a record.
#[derive(Clone)]
pub struct ResolveType(Arc<dyn Fn(&Record) -> Option<String> + Send + Sync>);

impl ResolveType {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Record) -> Option<String> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, record: &Record) -> Option<String> {
        (self.0)(record)
    }
}

impl fmt::Debug for ResolveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ResolveType(..)")
    }
}

/// Per-object predicate recognizing its own records.
#[derive(Clone)]
pub struct IsTypeOf(Arc<dyn Fn(&Record) -> bool + Send + Sync>);

impl IsTypeOf {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Record) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, record: &Record) -> bool {
        (self.0)(record)
    }
}

impl fmt::Debug for IsTypeOf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("IsTypeOf(..)")
    }
}
