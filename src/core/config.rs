//! Recipe configuration from YAML

use crate::core::step::Step;
use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Top-level build recipe
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Configuration {
    /// The package being built
    pub package: Package,

    /// User-declared template variables (`${{vars.<name>}}`)
    #[serde(default)]
    pub vars: HashMap<String, String>,

    /// Regex-derived variables computed from other templates
    #[serde(default)]
    pub var_transforms: Vec<VarTransform>,

    /// Build options that can be toggled per build
    #[serde(default)]
    pub options: HashMap<String, BuildOption>,

    /// Main build pipeline
    #[serde(default)]
    pub pipeline: Vec<Step>,

    /// Additional packages split out of the main build
    #[serde(default)]
    pub subpackages: Vec<Subpackage>,

    /// Test pipeline, run in test mode
    #[serde(default)]
    pub test: Option<TestBlock>,
}

/// Package metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,

    pub version: String,

    #[serde(default)]
    pub epoch: u64,

    #[serde(default)]
    pub description: Option<String>,
}

/// A package split out of the main build
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subpackage {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub pipeline: Vec<Step>,
}

/// Variables overridden when an option is enabled
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOption {
    #[serde(default)]
    pub vars: HashMap<String, String>,
}

/// Derive `${{vars.<to>}}` by applying `match`/`replace` to a template
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarTransform {
    pub from: String,

    #[serde(rename = "match")]
    pub match_pattern: String,

    pub replace: String,

    pub to: String,
}

/// Test section of a recipe
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestBlock {
    #[serde(default)]
    pub pipeline: Vec<Step>,
}

impl Configuration {
    /// Load a recipe from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a recipe from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Configuration = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the recipe
    pub fn validate(&self) -> Result<()> {
        if self.package.name.is_empty() {
            anyhow::bail!("package name is required");
        }
        if self.package.version.is_empty() {
            anyhow::bail!("package '{}' has no version", self.package.name);
        }

        // Package and subpackage names share one output namespace
        let mut seen = HashSet::new();
        seen.insert(self.package.name.as_str());
        for sp in &self.subpackages {
            if sp.name.is_empty() {
                anyhow::bail!("subpackage name is required");
            }
            if !seen.insert(sp.name.as_str()) {
                anyhow::bail!("Duplicate package name: {}", sp.name);
            }
        }

        for transform in &self.var_transforms {
            if transform.to.is_empty() {
                anyhow::bail!("var-transform from {:?} has no 'to' variable", transform.from);
            }
            if let Err(e) = Regex::new(&transform.match_pattern) {
                anyhow::bail!(
                    "var-transform '{}' has invalid match {:?}: {}",
                    transform.to,
                    transform.match_pattern,
                    e
                );
            }
        }

        for step in self.all_steps() {
            check_assertions(step)?;
        }

        Ok(())
    }

    /// Apply the variable overrides of each enabled option
    pub fn apply_build_options(&mut self, enabled: &[String]) -> Result<()> {
        for name in enabled {
            let option = self
                .options
                .get(name)
                .ok_or_else(|| anyhow::anyhow!("unknown build option: {}", name))?;
            self.vars.extend(option.vars.clone());
        }
        Ok(())
    }

    /// Look up a subpackage by name
    pub fn subpackage(&self, name: &str) -> Option<&Subpackage> {
        self.subpackages.iter().find(|sp| sp.name == name)
    }

    /// Test pipeline, empty when the recipe has none
    pub fn test_pipeline(&self) -> &[Step] {
        self.test.as_ref().map(|t| t.pipeline.as_slice()).unwrap_or(&[])
    }

    fn all_steps(&self) -> impl Iterator<Item = &Step> {
        self.pipeline
            .iter()
            .chain(self.subpackages.iter().flat_map(|sp| sp.pipeline.iter()))
            .chain(self.test_pipeline().iter())
    }
}

fn check_assertions(step: &Step) -> Result<()> {
    if let Some(assertions) = step.assertions {
        if assertions.required_steps > step.pipeline.len() && step.uses.is_none() {
            anyhow::bail!(
                "step '{}' requires {} steps but only declares {}",
                step.identity(),
                assertions.required_steps,
                step.pipeline.len()
            );
        }
    }
    for child in &step.pipeline {
        check_assertions(child)?;
    }
    Ok(())
}
