//! Field resolution for synthesized schemas.
//!
//! Every object and root field gets a resolver that either calls its bound
//! handler or reads the same-named entry of the parent record. Handler
//! results are shaped to the field's declared type; records returned where an
//! interface or union is expected are tagged with the concrete type chosen by
//! that type's discriminator.

use std::collections::HashMap;
use std::sync::Arc;

use async_graphql::dynamic::{Field, FieldFuture, FieldValue, InputValue, ResolverContext, TypeRef};
use async_graphql::{Name, Value};
use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use tracing::trace;
use typeweave_core::discriminator::TypeDiscriminator;
use typeweave_core::model::{ModelArgument, ModelField, ModelKind, SchemaModel};
use typeweave_core::{DiscriminationError, FieldHandler, Output, Record, ResolverInput, TypeSignature};

use crate::error::GraphQLError;

/// Model and discriminators shared by every resolver of one schema.
pub(crate) struct Resolution {
    pub(crate) model: Arc<SchemaModel>,
    pub(crate) discriminators: Arc<IndexMap<String, TypeDiscriminator>>,
}

impl Resolution {
    /// Fills omitted input-object fields with their declared defaults.
    fn with_input_defaults(&self, ty: &TypeSignature, value: JsonValue) -> JsonValue {
        match (ty, value) {
            (TypeSignature::NonNull(inner), value) => self.with_input_defaults(inner, value),
            (TypeSignature::List(inner), JsonValue::Array(items)) => JsonValue::Array(
                items
                    .into_iter()
                    .map(|item| self.with_input_defaults(inner, item))
                    .collect(),
            ),
            (TypeSignature::Named(name), JsonValue::Object(mut map)) => {
                if let Some(input) = self.model.inputs.get(name) {
                    for field in &input.fields {
                        match map.remove(&field.name) {
                            Some(value) => {
                                let value = self.with_input_defaults(&field.ty, value);
                                map.insert(field.name.clone(), value);
                            }
                            None => {
                                if let Some(default) = &field.default_value {
                                    map.insert(field.name.clone(), default.clone());
                                }
                            }
                        }
                    }
                }
                JsonValue::Object(map)
            }
            (_, value) => value,
        }
    }

    /// Shapes `output` to `ty`. `path` names the field as `Parent.field`.
    fn field_value<'a>(
        &self,
        output: Output,
        ty: &TypeSignature,
        path: &str,
    ) -> Result<Option<FieldValue<'a>>, async_graphql::Error> {
        let output = match output {
            Output::Scalar(value @ (JsonValue::Null | JsonValue::Array(_) | JsonValue::Object(_))) => {
                Output::from(value)
            }
            other => other,
        };

        match ty {
            TypeSignature::NonNull(inner) => self.field_value(output, inner, path),
            TypeSignature::List(inner) => match output {
                Output::Null => Ok(None),
                Output::List(items) => {
                    let mut values = Vec::with_capacity(items.len());
                    for item in items {
                        values.push(self.field_value(item, inner, path)?.unwrap_or(FieldValue::NULL));
                    }
                    Ok(Some(FieldValue::list(values)))
                }
                _ => Err(async_graphql::Error::new(format!(
                    "Field \"{path}\" must resolve to a list"
                ))),
            },
            TypeSignature::Named(name) => match output {
                Output::Null => Ok(None),
                Output::List(_) => Err(async_graphql::Error::new(format!(
                    "Field \"{path}\" must not resolve to a list"
                ))),
                Output::Record(record) => self.record_value(record, name, path).map(Some),
                Output::Scalar(value) => Ok(Some(self.scalar_value(value, name))),
            },
        }
    }

    fn record_value<'a>(
        &self,
        record: Record,
        type_name: &str,
        path: &str,
    ) -> Result<FieldValue<'a>, async_graphql::Error> {
        match self.model.kind_of(type_name) {
            Some(ModelKind::Object) => {
                if let Some(tag) = record.tag() {
                    let constructed = tag.resolve(&self.model.elements);
                    if constructed != type_name {
                        let err = DiscriminationError::NotAnImplementer {
                            abstract_type: type_name.to_string(),
                            field: path.to_string(),
                            type_name: constructed,
                        };
                        return Err(GraphQLError::from(err).into_field_error());
                    }
                }
                Ok(FieldValue::owned_any(record))
            }
            Some(ModelKind::Interface | ModelKind::Union) => {
                let Some(discriminator) = self.discriminators.get(type_name) else {
                    return Err(GraphQLError::SchemaUnavailable.into_field_error());
                };
                let concrete = discriminator
                    .discriminate(&record, path)
                    .map_err(|e| GraphQLError::from(e).into_field_error())?;
                trace!(abstract_type = %type_name, concrete = %concrete, field = %path, "Discriminated value");
                Ok(FieldValue::owned_any(record).with_type(concrete))
            }
            _ => Ok(FieldValue::value(json_to_graphql_value(record.into_json()))),
        }
    }

    fn scalar_value<'a>(&self, value: JsonValue, type_name: &str) -> FieldValue<'a> {
        match (self.model.kind_of(type_name), value) {
            (Some(ModelKind::Enum), JsonValue::String(item)) => {
                FieldValue::value(Value::Enum(Name::new(item)))
            }
            (_, value) => FieldValue::value(json_to_graphql_value(value)),
        }
    }
}

/// Everything needed to resolve one field.
struct FieldPlan {
    name: String,
    path: String,
    ty: TypeSignature,
    handler: Option<FieldHandler>,
    args: Vec<ModelArgument>,
    resolution: Arc<Resolution>,
}

impl FieldPlan {
    fn arguments(&self, ctx: &ResolverContext<'_>) -> Result<IndexMap<String, JsonValue>, async_graphql::Error> {
        let provided: HashMap<&str, &Value> = ctx
            .args
            .as_index_map()
            .iter()
            .map(|(name, value)| (name.as_str(), value))
            .collect();

        let mut arguments = IndexMap::new();
        for arg in &self.args {
            let value = match provided.get(arg.name.as_str()) {
                Some(value) => (*value).clone().into_json()?,
                None => match &arg.default_value {
                    Some(default) => default.clone(),
                    None => continue,
                },
            };
            let value = self.resolution.with_input_defaults(&arg.ty, value);
            arguments.insert(arg.name.clone(), value);
        }
        Ok(arguments)
    }

    async fn resolve<'a>(
        &self,
        ctx: ResolverContext<'a>,
    ) -> Result<Option<FieldValue<'a>>, async_graphql::Error> {
        let output = match &self.handler {
            Some(handler) => {
                let parent = ctx.parent_value.downcast_ref::<Record>().cloned();
                let arguments = self.arguments(&ctx)?;
                handler
                    .call(ResolverInput::new(parent, arguments))
                    .await
                    .map_err(|e| GraphQLError::from(e).into_field_error())?
            }
            None => ctx
                .parent_value
                .downcast_ref::<Record>()
                .and_then(|parent| parent.get(&self.name))
                .cloned()
                .unwrap_or_default(),
        };
        self.resolution.field_value(output, &self.ty, &self.path)
    }
}

pub(crate) fn type_ref(ty: &TypeSignature) -> TypeRef {
    match ty {
        TypeSignature::Named(name) => TypeRef::Named(name.clone().into()),
        TypeSignature::List(inner) => TypeRef::List(Box::new(type_ref(inner))),
        TypeSignature::NonNull(inner) => TypeRef::NonNull(Box::new(type_ref(inner))),
    }
}

pub(crate) fn input_value(arg: &ModelArgument) -> InputValue {
    let mut input = InputValue::new(arg.name.clone(), type_ref(&arg.ty));
    if let Some(description) = &arg.description {
        input = input.description(description.clone());
    }
    if let Some(default) = &arg.default_value {
        input = input.default_value(json_to_graphql_value(default.clone()));
    }
    input
}

/// Builds a resolving field of an object or root type.
pub(crate) fn object_field(resolution: &Arc<Resolution>, parent_type: &str, field: &ModelField) -> Field {
    let plan = Arc::new(FieldPlan {
        name: field.name.clone(),
        path: format!("{parent_type}.{}", field.name),
        ty: field.ty.clone(),
        handler: field.handler.clone(),
        args: field.args.clone(),
        resolution: Arc::clone(resolution),
    });

    let mut emitted = Field::new(field.name.clone(), type_ref(&field.ty), move |ctx| {
        let plan = Arc::clone(&plan);
        FieldFuture::new(async move { plan.resolve(ctx).await })
    });
    if let Some(description) = &field.description {
        emitted = emitted.description(description.clone());
    }
    if field.deprecation.is_some() {
        emitted = emitted.deprecation(field.deprecation.as_deref());
    }
    for arg in &field.args {
        emitted = emitted.argument(input_value(arg));
    }
    emitted
}

/// Converts JSON into a GraphQL value.
pub(crate) fn json_to_graphql_value(json: JsonValue) -> Value {
    match json {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Boolean(b),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                Value::Number(u.into())
            } else if let Some(f) = n.as_f64() {
                Value::Number(
                    async_graphql::Number::from_f64(f).unwrap_or_else(|| async_graphql::Number::from(0)),
                )
            } else {
                Value::Null
            }
        }
        JsonValue::String(s) => Value::String(s),
        JsonValue::Array(arr) => Value::List(arr.into_iter().map(json_to_graphql_value).collect()),
        JsonValue::Object(obj) => {
            let map: async_graphql::indexmap::IndexMap<Name, Value> = obj
                .into_iter()
                .map(|(k, v)| (Name::new(k), json_to_graphql_value(v)))
                .collect();
            Value::Object(map)
        }
    }
}
