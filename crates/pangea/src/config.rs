//! Stack files.
//!
//! A stack file lists resources to declare, in TOML:
//!
//! ```toml
//! [[resource]]
//! type = "aws_vpc"
//! name = "main"
//! [resource.attributes]
//! cidr_block = "10.0.0.0/16"
//! ```
//!
//! or the equivalent JSON document when the file ends in `.json`.
use std::path::Path;

use serde_json::{Map, Value};
use snafu::prelude::*;

use crate::{
    catalog, ParseJsonSnafu, ParseTomlSnafu, ReadConfigSnafu, ReferenceSummary, Result,
    Synthesizer,
};

#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ResourceDecl {
    /// A resource type or component kind, see [`catalog::KINDS`].
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct StackConfig {
    #[serde(default)]
    pub resource: Vec<ResourceDecl>,
}

impl StackConfig {
    pub fn from_toml_str(path: impl AsRef<Path>, contents: &str) -> Result<Self> {
        toml::from_str(contents).context(ParseTomlSnafu {
            path: path.as_ref(),
        })
    }

    pub fn from_json_str(path: impl AsRef<Path>, contents: &str) -> Result<Self> {
        serde_json::from_str(contents).context(ParseJsonSnafu {
            path: path.as_ref(),
        })
    }

    /// Reads a stack file, as JSON when its extension is `json` and as TOML
    /// otherwise.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("reading stack file {path:?}");
        let contents = std::fs::read_to_string(path).context(ReadConfigSnafu { path })?;
        if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json_str(path, &contents)
        } else {
            Self::from_toml_str(path, &contents)
        }
    }

    /// Declares every entry in order, stopping at the first failure.
    pub fn declare_all<S: Synthesizer + ?Sized>(
        &self,
        synth: &mut S,
    ) -> Result<Vec<ReferenceSummary>> {
        let mut summaries = vec![];
        for decl in self.resource.iter() {
            log::info!("declaring {} '{}'", decl.kind, decl.name);
            let input = Value::Object(decl.attributes.clone());
            summaries.extend(catalog::declare(synth, &decl.kind, &decl.name, &input)?);
        }
        Ok(summaries)
    }
}
