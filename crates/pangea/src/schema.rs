//! Attribute schemas.
//!
//! A resource reads its raw input mapping through [`Attributes`], one field
//! at a time. Each reader converts the JSON value into a typed value and
//! reports a [`Error::SchemaViolation`] naming the field and the broken
//! [`Rule`] when that fails.
//!
//! Absent fields and `null` fields are different things: `optional` readers
//! treat both as `None`, while `or_default` readers only apply their default
//! when the key is entirely absent.
use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value};
use snafu::OptionExt;

use crate::{validators::Constraint, Error, Result, SchemaViolationSnafu};

/// Policy for input keys that the schema never reads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnknownKeys {
    /// Unknown keys are a [`Rule::UnknownField`] violation.
    #[default]
    Strict,
    /// Unknown keys are logged and ignored.
    Lax,
}

/// A rule broken by a single field.
#[derive(Clone, Debug, PartialEq)]
pub enum Rule {
    Missing,
    Null,
    WrongType {
        expected: String,
    },
    NotInSet {
        allowed: Vec<String>,
    },
    Pattern {
        description: String,
    },
    OutOfRange {
        min: Option<String>,
        max: Option<String>,
    },
    Length {
        min: Option<usize>,
        max: Option<usize>,
    },
    UnknownField,
    /// A rule broken by one item of a list.
    Item {
        index: usize,
        rule: Box<Rule>,
    },
    Invalid {
        reason: String,
    },
}

impl core::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rule::Missing => f.write_str("is required"),
            Rule::Null => f.write_str("must not be null"),
            Rule::WrongType { expected } => write!(f, "must be {expected}"),
            Rule::NotInSet { allowed } => {
                write!(f, "is not in the allowed set: {}", allowed.join(", "))
            }
            Rule::Pattern { description } => {
                write!(f, "does not match the required pattern ({description})")
            }
            Rule::OutOfRange { min, max } => match (min, max) {
                (Some(min), Some(max)) => write!(f, "is out of range, must be {min}..={max}"),
                (Some(min), None) => write!(f, "is out of range, must be at least {min}"),
                (None, Some(max)) => write!(f, "is out of range, must be at most {max}"),
                (None, None) => f.write_str("is out of range"),
            },
            Rule::Length { min, max } => match (min, max) {
                (Some(min), Some(max)) => write!(f, "must have a length of {min}..={max}"),
                (Some(min), None) => write!(f, "must have a length of at least {min}"),
                (None, Some(max)) => write!(f, "must have a length of at most {max}"),
                (None, None) => f.write_str("has an invalid length"),
            },
            Rule::UnknownField => f.write_str("is not a known attribute"),
            Rule::Item { index, rule } => write!(f, "item {index} {rule}"),
            Rule::Invalid { reason } => f.write_str(reason),
        }
    }
}

fn wrong_type(expected: &str) -> Rule {
    Rule::WrongType {
        expected: expected.to_owned(),
    }
}

/// Values that can be read out of a JSON attribute.
pub trait FieldValue: Sized {
    fn from_value(value: &Value) -> Result<Self, Rule>;
}

impl FieldValue for String {
    fn from_value(value: &Value) -> Result<Self, Rule> {
        value
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| wrong_type("a string"))
    }
}

impl FieldValue for bool {
    fn from_value(value: &Value) -> Result<Self, Rule> {
        value.as_bool().ok_or_else(|| wrong_type("a boolean"))
    }
}

impl FieldValue for i64 {
    fn from_value(value: &Value) -> Result<Self, Rule> {
        value.as_i64().ok_or_else(|| wrong_type("an integer"))
    }
}

impl FieldValue for f64 {
    fn from_value(value: &Value) -> Result<Self, Rule> {
        value.as_f64().ok_or_else(|| wrong_type("a number"))
    }
}

macro_rules! unsigned {
    ($type: ty) => {
        impl FieldValue for $type {
            fn from_value(value: &Value) -> Result<Self, Rule> {
                let n = value
                    .as_u64()
                    .ok_or_else(|| wrong_type("a non-negative integer"))?;
                <$type>::try_from(n).map_err(|_| Rule::OutOfRange {
                    min: Some("0".to_owned()),
                    max: Some(<$type>::MAX.to_string()),
                })
            }
        }
    };
}

unsigned!(u16);
unsigned!(u32);

impl<T: FieldValue> FieldValue for Vec<T> {
    fn from_value(value: &Value) -> Result<Self, Rule> {
        let items = value.as_array().ok_or_else(|| wrong_type("a list"))?;
        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                T::from_value(item).map_err(|rule| Rule::Item {
                    index,
                    rule: Box::new(rule),
                })
            })
            .collect()
    }
}

impl FieldValue for BTreeMap<String, String> {
    fn from_value(value: &Value) -> Result<Self, Rule> {
        let map = value
            .as_object()
            .ok_or_else(|| wrong_type("a mapping of strings"))?;
        map.iter()
            .map(|(key, value)| match value.as_str() {
                Some(s) => Ok((key.clone(), s.to_owned())),
                None => Err(Rule::Invalid {
                    reason: format!("value of '{key}' must be a string"),
                }),
            })
            .collect()
    }
}

/// Declares a closed set of string values.
///
/// The enum serializes as its string form and reads as a [`FieldValue`],
/// failing with [`Rule::NotInSet`] for anything outside the set.
macro_rules! enumerated {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl core::str::FromStr for $name {
            type Err = $crate::schema::Rule;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    _ => Err($crate::schema::Rule::NotInSet {
                        allowed: vec![$($text.to_owned()),+],
                    }),
                }
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(self.as_str())
            }
        }

        impl $crate::schema::FieldValue for $name {
            fn from_value(value: &serde_json::Value) -> Result<Self, $crate::schema::Rule> {
                let s = value.as_str().ok_or_else(|| $crate::schema::Rule::WrongType {
                    expected: "a string".to_owned(),
                })?;
                s.parse()
            }
        }
    };
}

pub(crate) use enumerated;

/// Typed readers over one input mapping.
pub struct Attributes<'a> {
    resource_type: &'static str,
    policy: UnknownKeys,
    /// Path of this mapping inside the top-level input, empty at the top.
    path: String,
    map: &'a Map<String, Value>,
    read: BTreeSet<&'a str>,
}

impl<'a> Attributes<'a> {
    pub fn new(resource_type: &'static str, policy: UnknownKeys, input: &'a Value) -> Result<Self> {
        let map = input.as_object().context(SchemaViolationSnafu {
            resource_type,
            field: "<attributes>",
            rule: wrong_type("a mapping"),
            received: input.clone(),
        })?;
        Ok(Attributes {
            resource_type,
            policy,
            path: String::new(),
            map,
            read: BTreeSet::default(),
        })
    }

    pub fn resource_type(&self) -> &'static str {
        self.resource_type
    }

    /// Full path of `key` inside the top-level input.
    pub fn field_path(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_owned()
        } else {
            format!("{}.{key}", self.path)
        }
    }

    /// Builds a schema violation for `key` of this mapping.
    pub fn violation(&self, key: &str, rule: Rule, received: Value) -> Error {
        Error::SchemaViolation {
            resource_type: self.resource_type.to_owned(),
            field: self.field_path(key),
            rule,
            received,
        }
    }

    /// Whether `key` is present, `null` included. Does not mark it as read.
    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    fn lookup(&mut self, key: &str) -> Option<&'a Value> {
        let (key, value) = self.map.get_key_value(key)?;
        self.read.insert(key.as_str());
        Some(value)
    }

    fn convert<T: FieldValue>(&self, key: &str, value: &Value) -> Result<T> {
        T::from_value(value).map_err(|rule| self.violation(key, rule, value.clone()))
    }

    fn constrain<T, C: Constraint<T>>(&self, key: &str, value: T, constraint: &C) -> Result<T> {
        match constraint.check(&value) {
            Ok(()) => Ok(value),
            Err(rule) => {
                let received = self.map.get(key).cloned().unwrap_or_default();
                Err(self.violation(key, rule, received))
            }
        }
    }

    pub fn required<T: FieldValue>(&mut self, key: &str) -> Result<T> {
        match self.lookup(key) {
            None => Err(self.violation(key, Rule::Missing, Value::Null)),
            Some(Value::Null) => Err(self.violation(key, Rule::Null, Value::Null)),
            Some(value) => self.convert(key, value),
        }
    }

    pub fn required_with<T: FieldValue>(
        &mut self,
        key: &str,
        constraint: impl Constraint<T>,
    ) -> Result<T> {
        let value = self.required(key)?;
        self.constrain(key, value, &constraint)
    }

    pub fn optional<T: FieldValue>(&mut self, key: &str) -> Result<Option<T>> {
        match self.lookup(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => self.convert(key, value).map(Some),
        }
    }

    pub fn optional_with<T: FieldValue>(
        &mut self,
        key: &str,
        constraint: impl Constraint<T>,
    ) -> Result<Option<T>> {
        match self.optional(key)? {
            Some(value) => self.constrain(key, value, &constraint).map(Some),
            None => Ok(None),
        }
    }

    pub fn or_default<T: FieldValue>(&mut self, key: &str, default: T) -> Result<T> {
        match self.lookup(key) {
            None => Ok(default),
            Some(Value::Null) => Err(self.violation(key, Rule::Null, Value::Null)),
            Some(value) => self.convert(key, value),
        }
    }

    pub fn or_default_with<T: FieldValue>(
        &mut self,
        key: &str,
        default: T,
        constraint: impl Constraint<T>,
    ) -> Result<T> {
        if self.contains(key) {
            let value = self.or_default(key, default)?;
            self.constrain(key, value, &constraint)
        } else {
            Ok(default)
        }
    }

    /// Reads the common `tags` mapping, empty when absent.
    pub fn tags(&mut self) -> Result<BTreeMap<String, String>> {
        self.or_default_with("tags", BTreeMap::new(), crate::validators::tags())
    }

    fn child<T>(
        &self,
        path: String,
        value: &'a Value,
        parse: impl FnOnce(&mut Attributes<'a>) -> Result<T>,
    ) -> Result<T> {
        let map = value.as_object().context(SchemaViolationSnafu {
            resource_type: self.resource_type,
            field: path.clone(),
            rule: wrong_type("a mapping"),
            received: value.clone(),
        })?;
        let mut child = Attributes {
            resource_type: self.resource_type,
            policy: self.policy,
            path,
            map,
            read: BTreeSet::default(),
        };
        let parsed = parse(&mut child)?;
        child.finish()?;
        Ok(parsed)
    }

    /// Reads an optional nested mapping with `parse`.
    pub fn nested_with<T>(
        &mut self,
        key: &str,
        parse: impl FnOnce(&mut Attributes<'a>) -> Result<T>,
    ) -> Result<Option<T>> {
        match self.lookup(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => self.child(self.field_path(key), value, parse).map(Some),
        }
    }

    /// Reads a required nested mapping with `parse`.
    pub fn required_nested_with<T>(
        &mut self,
        key: &str,
        parse: impl FnOnce(&mut Attributes<'a>) -> Result<T>,
    ) -> Result<T> {
        match self.lookup(key) {
            None => Err(self.violation(key, Rule::Missing, Value::Null)),
            Some(Value::Null) => Err(self.violation(key, Rule::Null, Value::Null)),
            Some(value) => self.child(self.field_path(key), value, parse),
        }
    }

    /// Reads a list of nested mappings, empty when absent.
    pub fn list_with<T>(
        &mut self,
        key: &str,
        mut parse: impl FnMut(&mut Attributes<'a>) -> Result<T>,
    ) -> Result<Vec<T>> {
        match self.lookup(key) {
            None | Some(Value::Null) => Ok(vec![]),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    self.child(format!("{}[{index}]", self.field_path(key)), item, &mut parse)
                })
                .collect(),
            Some(value) => Err(self.violation(key, wrong_type("a list of mappings"), value.clone())),
        }
    }

    /// Takes every key not read so far, marking them as read.
    ///
    /// Lax resources use it to pass through arguments they do not model.
    pub fn remaining(&mut self) -> Map<String, Value> {
        let map = self.map;
        let mut rest = Map::new();
        for (key, value) in map {
            if self.read.insert(key.as_str()) {
                rest.insert(key.clone(), value.clone());
            }
        }
        rest
    }

    /// Applies the unknown-keys policy to every key that was never read.
    pub fn finish(self) -> Result<()> {
        let unknown: Vec<&str> = self
            .map
            .keys()
            .map(String::as_str)
            .filter(|key| !self.read.contains(key))
            .collect();
        if unknown.is_empty() {
            return Ok(());
        }
        match self.policy {
            UnknownKeys::Strict => {
                let key = unknown[0];
                let received = self.map.get(key).cloned().unwrap_or_default();
                Err(self.violation(key, Rule::UnknownField, received))
            }
            UnknownKeys::Lax => {
                log::debug!(
                    "{}: ignoring unknown attributes {}",
                    self.resource_type,
                    unknown
                        .iter()
                        .map(|key| self.field_path(key))
                        .collect::<Vec<_>>()
                        .join(", ")
                );
                Ok(())
            }
        }
    }
}
