//! References to declared resources.
//!
//! A reference is what the caller gets back after declaring a resource. Its
//! outputs are Terraform interpolation placeholders, so they can be used as
//! attribute values of other resources before anything exists in AWS.
use std::{collections::BTreeMap, ops::Deref, sync::LazyLock};

use regex::Regex;
use serde_json::Value;
use snafu::prelude::*;

use crate::{Dependencies, Resource, Result, SerializeSnafu};

/// Returns the placeholder `${<resource_type>.<name>.<field>}`.
pub fn placeholder(resource_type: &str, name: &str, field: &str) -> String {
    format!("${{{resource_type}.{name}.{field}}}")
}

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z0-9_]+)\.([A-Za-z0-9_-]+)\.([A-Za-z0-9_.\[\]]+)\}").unwrap()
});

/// Whether `value` interpolates an output of another resource, eg
/// `arn:${aws_lb.web.arn}`. Such values are only known once applied.
pub fn is_interpolated(value: &str) -> bool {
    PLACEHOLDER.is_match(value)
}

/// The output placeholders of one resource type.
///
/// Derive it with `#[derive(Outputs)]` on a struct of `String` fields.
pub trait Outputs: core::fmt::Debug + Clone + PartialEq {
    /// Terraform attribute names of the outputs.
    const FIELDS: &'static [&'static str];

    fn for_resource(resource_type: &str, name: &str) -> Self;

    fn to_map(&self) -> BTreeMap<&'static str, String>;
}

/// A declared resource.
///
/// Dereferences to the validated record.
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceReference<R: Resource> {
    name: String,
    record: R,
    outputs: R::Outputs,
    computed: R::Computed,
    attributes: Value,
}

impl<R: Resource> Deref for ResourceReference<R> {
    type Target = R;

    fn deref(&self) -> &Self::Target {
        &self.record
    }
}

impl<R: Resource> ResourceReference<R> {
    pub(crate) fn new(name: &str, record: R) -> Result<Self> {
        let attributes = serde_json::to_value(&record).context(SerializeSnafu { name })?;
        Ok(ResourceReference {
            name: name.to_owned(),
            outputs: R::Outputs::for_resource(R::TYPE, name),
            computed: record.computed(),
            record,
            attributes,
        })
    }

    pub fn resource_type(&self) -> &'static str {
        R::TYPE
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The Terraform address, eg `aws_vpc.main`.
    pub fn address(&self) -> String {
        format!("{}.{}", R::TYPE, self.name)
    }

    pub fn record(&self) -> &R {
        &self.record
    }

    pub fn outputs(&self) -> &R::Outputs {
        &self.outputs
    }

    /// Looks up an output placeholder by its attribute name.
    pub fn output(&self, field: &str) -> Option<String> {
        R::Outputs::FIELDS
            .contains(&field)
            .then(|| placeholder(R::TYPE, &self.name, field))
    }

    pub fn output_map(&self) -> BTreeMap<&'static str, String> {
        self.outputs.to_map()
    }

    /// The validated attributes, in their serialized form.
    pub fn resource_attributes(&self) -> &Value {
        &self.attributes
    }

    pub fn computed(&self) -> &R::Computed {
        &self.computed
    }

    /// Other resources this one refers to through placeholders.
    pub fn dependencies(&self) -> Dependencies {
        references_in(&self.attributes)
    }

    pub fn summary(&self) -> Result<ReferenceSummary> {
        let computed = serde_json::to_value(&self.computed).context(SerializeSnafu {
            name: self.address(),
        })?;
        Ok(ReferenceSummary {
            resource_type: R::TYPE.to_owned(),
            name: self.name.clone(),
            outputs: self
                .output_map()
                .into_iter()
                .map(|(k, v)| (k.to_owned(), v))
                .collect(),
            resource_attributes: self.attributes.clone(),
            computed,
        })
    }
}

/// A type-erased view of a [`ResourceReference`].
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ReferenceSummary {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    pub outputs: BTreeMap<String, String>,
    pub resource_attributes: Value,
    pub computed: Value,
}

impl ReferenceSummary {
    pub fn address(&self) -> String {
        format!("{}.{}", self.resource_type, self.name)
    }
}

/// Collects the `type.name` addresses of all placeholders found in the string
/// leaves of `value`.
pub fn references_in(value: &Value) -> Dependencies {
    fn go(value: &Value, found: &mut Vec<String>) {
        match value {
            Value::String(s) => {
                for captures in PLACEHOLDER.captures_iter(s) {
                    found.push(format!("{}.{}", &captures[1], &captures[2]));
                }
            }
            Value::Array(items) => items.iter().for_each(|item| go(item, found)),
            Value::Object(map) => map.values().for_each(|item| go(item, found)),
            _ => {}
        }
    }

    let mut found = vec![];
    go(value, &mut found);
    found.into_iter().collect()
}
