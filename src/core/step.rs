//! Step domain model

use crate::core::provenance::Purl;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A single node in a recipe's step tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Step {
    /// Human-readable step name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Step kind to expand from a recipe fragment (e.g. `fetch`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uses: Option<String>,

    /// Caller-supplied arguments for `uses`
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub with: HashMap<String, String>,

    /// Shell script body
    #[serde(default)]
    pub runs: String,

    /// Working directory override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,

    /// Literal environment exported before `runs`, sorted by name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,

    /// Conditional guard; empty means always run
    #[serde(default, rename = "if", skip_serializing_if = "Option::is_none")]
    pub if_condition: Option<String>,

    /// Nested steps, run in order after `runs`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pipeline: Vec<Step>,

    /// Structural checks applied after children ran
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assertions: Option<Assertions>,

    /// Input schema, populated when expanded from a fragment
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub inputs: HashMap<String, Input>,

    /// Provenance of externally fetched artifacts (filled in by the compiler)
    #[serde(skip)]
    pub external_refs: Vec<Purl>,
}

/// Assertions about how a step's children executed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Assertions {
    /// Exact number of children whose guard evaluated true
    pub required_steps: usize,
}

/// Declared input of a step kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Input {
    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub default: String,

    #[serde(default)]
    pub required: bool,
}

impl Step {
    /// Create a bare script step
    pub fn script(runs: impl Into<String>) -> Self {
        Self {
            runs: runs.into(),
            ..Default::default()
        }
    }

    /// Name used in log output, `???` when the step has neither name nor kind
    pub fn identity(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(self.uses.as_deref().filter(|u| !u.is_empty()))
            .unwrap_or("???")
    }

    /// The guard expression, if one is set and non-empty
    pub fn guard(&self) -> Option<&str> {
        self.if_condition.as_deref().filter(|c| !c.trim().is_empty())
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_guard(mut self, condition: impl Into<String>) -> Self {
        self.if_condition = Some(condition.into());
        self
    }

    pub fn with_children(mut self, children: Vec<Step>) -> Self {
        self.pipeline = children;
        self
    }

    pub fn with_required_steps(mut self, required_steps: usize) -> Self {
        self.assertions = Some(Assertions { required_steps });
        self
    }

    pub fn with_working_directory(mut self, dir: impl Into<String>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }
}
