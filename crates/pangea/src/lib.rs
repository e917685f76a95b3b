//! # Pangea
//!
//! Pangea is a library of typed, validated constructors for AWS Terraform
//! resources. Each resource type is a plain Rust struct that is parsed out of
//! a raw input mapping, checked field by field and then across fields, and
//! finally registered with a [`Synthesizer`] that accumulates Terraform JSON.
//!
//! ## Key Features
//!
//! - **Attribute schemas**: every resource reads its input through
//!   [`schema::Attributes`], applying defaults and primitive constraints
//!   (formats, ranges, enumerations) and rejecting unknown keys.
//! - **Consistency checks**: invariants spanning several fields (mutual
//!   exclusion, conditional requirements, ordered ranges) run before a record
//!   is handed to anyone.
//! - **References**: declaring a resource returns a [`ResourceReference`]
//!   exposing the Terraform output placeholders
//!   (`${aws_vpc.main.id}`) and computed properties such as cost estimates.
//!
//! ## Usage
//!
//! ```rust
//! use pangea::{aws::vpc::Vpc, synth::TerraformSynthesizer};
//!
//! let mut synth = TerraformSynthesizer::default();
//! let vpc = pangea::declare_input::<Vpc, _>(
//!     &mut synth,
//!     "main",
//!     &serde_json::json!({ "cidr_block": "10.0.0.0/16" }),
//! )
//! .unwrap();
//! assert_eq!("${aws_vpc.main.id}", vpc.outputs().id);
//! assert!(vpc.computed().is_private_cidr);
//! ```
//!
//! ### Concepts
//!
//! Construction is a single synchronous pass:
//!
//! - **Parse**: the input mapping becomes a typed record. Missing, mistyped or
//!   out-of-range fields fail with [`Error::SchemaViolation`].
//! - **Validate**: cross-field invariants fail with
//!   [`Error::ConsistencyViolation`].
//! - **Emit**: the record is rendered into a Terraform block and registered
//!   under its `(type, name)` address. Registering the same address twice
//!   replaces the earlier block.
//!
//! ## Error Handling
//!
//! Pangea exposes a single error enum [`Error`]. Both violation kinds carry
//! the offending field names, the rule that was broken and the received value,
//! see [`Error::fields`], [`Error::rule`] and [`Error::received`].

use snafu::prelude::*;

pub mod aws;
pub mod catalog;
pub mod components;
pub mod config;
pub mod cost;
pub mod reference;
pub mod schema;
pub mod synth;
#[cfg(test)]
mod test;
pub mod validators;

pub use pangea_derive::Outputs;
pub use reference::{placeholder, Outputs, ReferenceSummary, ResourceReference};
pub use schema::{Attributes, Rule, UnknownKeys};
pub use synth::{Synthesizer, TerraformSynthesizer};

/// Top-level error enum that encompasses all errors.
#[derive(snafu::Snafu, Debug)]
pub enum Error {
    #[snafu(display("{resource_type}: attribute '{field}' {rule} (received {received})"))]
    SchemaViolation {
        resource_type: String,
        field: String,
        rule: Rule,
        received: serde_json::Value,
    },

    #[snafu(display("{resource_type}: {rule} (fields: {})", fields.join(", ")))]
    ConsistencyViolation {
        resource_type: String,
        fields: Vec<String>,
        rule: String,
        received: serde_json::Value,
    },

    #[snafu(display("Could not serialize '{name}': {source}"))]
    Serialize {
        name: String,
        source: serde_json::Error,
    },

    #[snafu(display("Could not read stack file '{path:?}': {source}"))]
    ReadConfig {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Could not parse stack file '{path:?}': {source}"))]
    ParseToml {
        path: std::path::PathBuf,
        source: toml::de::Error,
    },

    #[snafu(display("Could not parse stack file '{path:?}': {source}"))]
    ParseJson {
        path: std::path::PathBuf,
        source: serde_json::Error,
    },

    #[snafu(display("Could not create file {path:?}: {source}"))]
    CreateFile {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Could not write file {path:?}: {source}"))]
    WriteFile {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Unknown kind '{kind}' for '{name}', expected one of: {}", catalog::KINDS.join(", ")))]
    UnknownKind { kind: String, name: String },
}

impl Error {
    pub fn is_schema_violation(&self) -> bool {
        matches!(self, Error::SchemaViolation { .. })
    }

    pub fn is_consistency_violation(&self) -> bool {
        matches!(self, Error::ConsistencyViolation { .. })
    }

    /// Names of the offending fields of a violation.
    ///
    /// Nested fields are reported as `parent.child` and list items as
    /// `parent[index].child`.
    pub fn fields(&self) -> Vec<&str> {
        match self {
            Error::SchemaViolation { field, .. } => vec![field.as_str()],
            Error::ConsistencyViolation { fields, .. } => {
                fields.iter().map(String::as_str).collect()
            }
            _ => vec![],
        }
    }

    /// Human readable description of the violated rule.
    pub fn rule(&self) -> Option<String> {
        match self {
            Error::SchemaViolation { rule, .. } => Some(rule.to_string()),
            Error::ConsistencyViolation { rule, .. } => Some(rule.clone()),
            _ => None,
        }
    }

    /// The value(s) that broke the rule.
    ///
    /// For consistency violations this is a mapping of each involved field
    /// to its value in the record.
    pub fn received(&self) -> Option<&serde_json::Value> {
        match self {
            Error::SchemaViolation { received, .. }
            | Error::ConsistencyViolation { received, .. } => Some(received),
            _ => None,
        }
    }
}

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// A Terraform resource type.
///
/// Implementors are the validated attribute records of one resource type.
pub trait Resource:
    core::fmt::Debug + Clone + PartialEq + serde::Serialize + Sized + 'static
{
    /// The Terraform resource type, eg `aws_vpc`.
    const TYPE: &'static str;

    /// What to do with input keys the schema does not read.
    const UNKNOWN_KEYS: UnknownKeys = UnknownKeys::Strict;

    /// Output placeholders of this resource.
    type Outputs: Outputs;

    /// Properties derived from the validated record.
    type Computed: core::fmt::Debug + Clone + PartialEq + serde::Serialize;

    /// Reads the record out of its input attributes.
    ///
    /// Unknown keys are handled by the caller according to
    /// [`Resource::UNKNOWN_KEYS`].
    fn parse(attrs: &mut Attributes<'_>) -> Result<Self>;

    /// Cross-field invariants. Must be pure.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Derived properties. Must not fail for any record that passed
    /// [`Resource::validate`].
    fn computed(&self) -> Self::Computed;

    /// Renders the Terraform block registered with the synthesizer.
    fn block(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self).context(SerializeSnafu { name: Self::TYPE })
    }

    /// Runs schema parsing followed by validation.
    fn from_input(input: &serde_json::Value) -> Result<Self> {
        log::debug!("parsing {}", Self::TYPE);
        let mut attrs = Attributes::new(Self::TYPE, Self::UNKNOWN_KEYS, input)?;
        let record = Self::parse(&mut attrs)?;
        attrs.finish()?;
        record.validate()?;
        Ok(record)
    }
}

#[derive(Clone, Default, Debug, PartialEq)]
pub struct Dependencies {
    /// Terraform addresses (`type.name`) of referenced resources.
    inner: Vec<String>,
}

impl IntoIterator for Dependencies {
    type Item = String;

    type IntoIter = <Vec<String> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl FromIterator<String> for Dependencies {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        Dependencies::default().merge(Dependencies {
            inner: iter.into_iter().collect(),
        })
    }
}

impl core::fmt::Display for Dependencies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.inner.join(", "))
    }
}

impl Dependencies {
    /// Merges two sets of dependencies, keeping them sorted and unique.
    pub fn merge(self, other: Self) -> Self {
        let mut inner = [self.inner, other.inner].concat();
        inner.sort();
        inner.dedup();
        Dependencies { inner }
    }

    pub fn contains(&self, address: &str) -> bool {
        self.inner.iter().any(|a| a == address)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.inner.iter().map(String::as_str)
    }
}

/// Registers a record with the synthesizer under `(R::TYPE, name)`.
///
/// The record goes through the schema and validation again from its
/// serialized form, so records built by hand get the same guarantees as
/// parsed ones. Re-declaring an address replaces the earlier block.
pub fn declare<R, S>(synth: &mut S, name: &str, record: R) -> Result<ResourceReference<R>>
where
    R: Resource,
    S: Synthesizer + ?Sized,
{
    validators::check_resource_name(R::TYPE, name)?;
    let input = serde_json::to_value(&record).context(SerializeSnafu { name })?;
    let record = R::from_input(&input)?;
    emit(synth, name, record)
}

/// Parses, validates and declares a resource from a raw input mapping.
pub fn declare_input<R, S>(
    synth: &mut S,
    name: &str,
    input: &serde_json::Value,
) -> Result<ResourceReference<R>>
where
    R: Resource,
    S: Synthesizer + ?Sized,
{
    validators::check_resource_name(R::TYPE, name)?;
    let record = R::from_input(input)?;
    emit(synth, name, record)
}

fn emit<R, S>(synth: &mut S, name: &str, record: R) -> Result<ResourceReference<R>>
where
    R: Resource,
    S: Synthesizer + ?Sized,
{
    let block = record.block()?;
    log::debug!("declaring {}.{name}", R::TYPE);
    log::trace!("  {block}");
    synth.resource(R::TYPE, name, block);
    ResourceReference::new(name, record)
}
