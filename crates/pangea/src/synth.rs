//! Synthesizers accumulate declared resources into Terraform JSON.
use std::collections::BTreeMap;

use serde_json::{json, Map, Value};
use snafu::prelude::*;

use crate::{reference::references_in, CreateFileSnafu, Dependencies, Result, WriteFileSnafu};

/// The registry that declared resources are handed to.
pub trait Synthesizer {
    /// Registers `block` under `(resource_type, name)`, replacing any earlier
    /// block at that address.
    fn resource(&mut self, resource_type: &str, name: &str, block: Value);

    /// The accumulated declarative structure.
    fn synthesis(&self) -> Value;
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
struct OutputBlock {
    value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

/// An in-memory synthesizer producing Terraform JSON syntax (`*.tf.json`).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TerraformSynthesizer {
    resources: BTreeMap<String, BTreeMap<String, Value>>,
    outputs: BTreeMap<String, OutputBlock>,
}

impl Synthesizer for TerraformSynthesizer {
    fn resource(&mut self, resource_type: &str, name: &str, block: Value) {
        let previous = self
            .resources
            .entry(resource_type.to_owned())
            .or_default()
            .insert(name.to_owned(), block);
        if previous.is_some() {
            log::warn!("{resource_type}.{name} was declared again, replacing the earlier block");
        }
    }

    fn synthesis(&self) -> Value {
        let mut root = Map::new();
        if !self.resources.is_empty() {
            root.insert("resource".to_owned(), json!(self.resources));
        }
        if !self.outputs.is_empty() {
            root.insert("output".to_owned(), json!(self.outputs));
        }
        Value::Object(root)
    }
}

impl TerraformSynthesizer {
    /// Registers a Terraform `output` block.
    pub fn output(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
        description: Option<&str>,
    ) {
        self.outputs.insert(
            name.into(),
            OutputBlock {
                value: value.into(),
                description: description.map(str::to_owned),
            },
        );
    }

    pub fn get(&self, resource_type: &str, name: &str) -> Option<&Value> {
        self.resources.get(resource_type)?.get(name)
    }

    /// Number of registered resource blocks.
    pub fn len(&self) -> usize {
        self.resources.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Addresses (`type.name`) of all registered resources, sorted.
    pub fn addresses(&self) -> Vec<String> {
        self.resources
            .iter()
            .flat_map(|(ty, names)| names.keys().map(move |name| format!("{ty}.{name}")))
            .collect()
    }

    /// Addresses referenced by the block registered at `(resource_type, name)`.
    pub fn dependencies(&self, resource_type: &str, name: &str) -> Dependencies {
        self.get(resource_type, name)
            .map(references_in)
            .unwrap_or_default()
    }

    /// Addresses that are referenced through placeholders but never declared.
    pub fn unresolved(&self) -> Dependencies {
        let all = self
            .resources
            .values()
            .flat_map(BTreeMap::values)
            .map(references_in)
            .chain(self.outputs.values().map(|o| references_in(&json!(o.value))))
            .fold(Dependencies::default(), Dependencies::merge);
        all.into_iter()
            .filter(|address| {
                address
                    .split_once('.')
                    .map_or(true, |(ty, name)| self.get(ty, name).is_none())
            })
            .collect()
    }

    /// Writes the pretty-printed synthesis to `path`.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let path = path.as_ref();
        log::info!("writing {} resources to {path:?}", self.len());
        let file = std::fs::File::create(path).context(CreateFileSnafu { path })?;
        serde_json::to_writer_pretty(file, &self.synthesis())
            .map_err(std::io::Error::from)
            .context(WriteFileSnafu { path })
    }
}
