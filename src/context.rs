//! Render context derivation.
//!
//! A recipe's context is the "dump" of its declared fields, including the derived
//! values each type lists explicitly through [`Declarative::properties`]. Nested
//! declarative fields opt into the same treatment with
//! `#[serde(serialize_with = "kiln::context::with_properties")]`.

use crate::error::{Error, Result};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Flattened key/value scope names and content are rendered against.
pub type Context = Map<String, Value>;

/// A derived field, computed from the value it is declared on.
pub struct Property<T> {
    pub name: &'static str,
    pub compute: fn(&T) -> Value,
}

impl<T> Property<T> {
    pub const fn new(name: &'static str, compute: fn(&T) -> Value) -> Self {
        Self { name, compute }
    }
}

/// A structured value object whose dump includes its derived fields.
pub trait Declarative: Serialize {
    /// Derived fields, in the order they are added to the dump.
    fn properties() -> Vec<Property<Self>>
    where
        Self: Sized,
    {
        Vec::new()
    }

    /// Constructor signature, used by recipe inspection.
    fn parameters() -> Vec<Parameter>
    where
        Self: Sized,
    {
        Vec::new()
    }

    /// Serializes the declared fields and appends every derived field.
    fn dump(&self) -> Result<Context>
    where
        Self: Sized,
    {
        let mut map = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(Error::ContextError(format!(
                    "declared fields must serialize to a mapping, got '{other}'"
                )))
            }
        };
        for property in Self::properties() {
            map.insert(property.name.to_string(), (property.compute)(self));
        }
        Ok(map)
    }
}

/// Object-safe view of a [`Declarative`] value, so recipes can own any field set.
pub trait FieldSet {
    fn dump(&self) -> Result<Context>;
}

impl<T: Declarative> FieldSet for T {
    fn dump(&self) -> Result<Context> {
        Declarative::dump(self)
    }
}

/// Recipe without declared fields of its own.
#[derive(Debug, Default, Clone, Serialize, serde::Deserialize)]
pub struct NoFields {}

impl Declarative for NoFields {}

/// Serializes a nested declarative field including its derived fields.
pub fn with_properties<T, S>(value: &T, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    T: Declarative,
    S: Serializer,
{
    let map = Declarative::dump(value).map_err(serde::ser::Error::custom)?;
    map.serialize(serializer)
}

/// Merges `extra` on top of `context`, overwriting top-level keys.
pub fn merge(mut context: Context, extra: Context) -> Context {
    context.extend(extra);
    context
}

/// Which level of the recipe hierarchy a parameter is declared on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Tree-structural fields every folder carries.
    Folder,
    /// Identity and hook fields every recipe carries.
    Recipe,
    /// Fields declared by the concrete recipe type.
    Declared,
}

/// Default value of a parameter as reported by inspection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultValue {
    Required,
    Value(Value),
    Signature(Vec<Parameter>),
}

/// One constructor-equivalent field.
#[derive(Debug, Clone, Serialize)]
pub struct Parameter {
    pub name: &'static str,
    pub annotation: &'static str,
    pub default: DefaultValue,
    pub origin: Origin,
    #[serde(skip)]
    nested: Option<fn() -> Vec<Parameter>>,
}

impl PartialEq for Parameter {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.annotation == other.annotation
            && self.default == other.default
            && self.origin == other.origin
    }
}

impl Parameter {
    pub fn required(name: &'static str, annotation: &'static str) -> Self {
        Self { name, annotation, default: DefaultValue::Required, origin: Origin::Declared, nested: None }
    }

    pub fn optional(name: &'static str, annotation: &'static str, default: Value) -> Self {
        Self {
            name,
            annotation,
            default: DefaultValue::Value(default),
            origin: Origin::Declared,
            nested: None,
        }
    }

    /// A field holding another declarative object; inspection expands it one level.
    pub fn nested<T: Declarative>(name: &'static str, default: Option<Value>) -> Self {
        Self {
            name,
            annotation: short_type_name::<T>(),
            default: default.map_or(DefaultValue::Required, DefaultValue::Value),
            origin: Origin::Declared,
            nested: Some(T::parameters),
        }
    }

    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    pub fn is_private(&self) -> bool {
        self.name.starts_with('_')
    }

    pub fn is_required(&self) -> bool {
        matches!(self.default, DefaultValue::Required)
    }

    /// Replaces the default of a nested field with the nested type's own signature.
    pub fn expanded(&self) -> Self {
        let mut parameter = self.clone();
        if let Some(nested) = self.nested {
            parameter.default = DefaultValue::Signature(nested());
            parameter.nested = None;
        }
        parameter
    }
}

/// Type name without its module path.
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// `<module path>:<TypeName>` identity of a type.
pub fn type_identity<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    match base.rsplit_once("::") {
        Some((module, name)) => format!("{module}:{name}"),
        None => base.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Inner {
        a: i64,
    }

    impl Declarative for Inner {
        fn properties() -> Vec<Property<Self>> {
            vec![Property::new("double", |inner| json!(inner.a * 2))]
        }
    }

    #[derive(Serialize)]
    struct Outer {
        #[serde(serialize_with = "with_properties")]
        x: Inner,
        #[serde(skip_serializing)]
        _hidden: bool,
    }

    impl Declarative for Outer {
        fn properties() -> Vec<Property<Self>> {
            vec![Property::new("random_property", |_| json!("abacus"))]
        }
    }

    #[test]
    fn test_dump_includes_nested_properties() {
        let outer = Outer { x: Inner { a: 1 }, _hidden: true };
        let dump = Declarative::dump(&outer).unwrap();
        assert_eq!(
            Value::Object(dump),
            json!({"x": {"a": 1, "double": 2}, "random_property": "abacus"})
        );
    }

    #[test]
    fn test_no_fields_dump_is_empty() {
        assert!(Declarative::dump(&NoFields {}).unwrap().is_empty());
    }

    #[test]
    fn test_type_identity() {
        assert_eq!(type_identity::<NoFields>(), "kiln::context:NoFields");
        assert_eq!(short_type_name::<NoFields>(), "NoFields");
    }
}
