//! Package URLs describing where fetched artifacts came from

use crate::core::substitution::{input_key, Namespace};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

const GITHUB_PREFIX: &str = "https://github.com/";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PurlError {
    #[error("invalid purl type {0:?}")]
    InvalidType(String),

    #[error("purl of type {0:?} is missing a name")]
    MissingName(String),

    #[error("invalid qualifier key {0:?}")]
    InvalidQualifier(String),
}

/// A package URL (`pkg:type/namespace/name@version?qualifiers`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purl {
    #[serde(rename = "type")]
    pub ty: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub qualifiers: BTreeMap<String, String>,
}

impl Purl {
    pub fn new(ty: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_qualifier(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.qualifiers.insert(key.into(), value.into());
        self
    }

    /// Bring the purl into canonical form, rejecting invalid components
    pub fn normalize(&mut self) -> Result<(), PurlError> {
        let ty = self.ty.trim().to_ascii_lowercase();
        let valid_type = !ty.is_empty()
            && !ty.starts_with(|c: char| c.is_ascii_digit())
            && ty
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '+' | '-'));
        if !valid_type {
            return Err(PurlError::InvalidType(self.ty.clone()));
        }
        self.ty = ty;

        self.namespace = self.namespace.trim_matches('/').to_string();
        self.name = self.name.trim_matches('/').to_string();
        if self.name.is_empty() {
            return Err(PurlError::MissingName(self.ty.clone()));
        }

        // These hosts treat owner and repository names case-insensitively
        if matches!(self.ty.as_str(), "github" | "gitlab" | "bitbucket") {
            self.namespace = self.namespace.to_lowercase();
            self.name = self.name.to_lowercase();
        }

        let mut qualifiers = BTreeMap::new();
        for (key, value) in std::mem::take(&mut self.qualifiers) {
            let key = key.to_ascii_lowercase();
            let valid_key = !key.is_empty()
                && !key.starts_with(|c: char| c.is_ascii_digit())
                && key
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '-' | '_'));
            if !valid_key {
                return Err(PurlError::InvalidQualifier(key));
            }
            if !value.is_empty() {
                qualifiers.insert(key, value);
            }
        }
        self.qualifiers = qualifiers;

        Ok(())
    }
}

impl fmt::Display for Purl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pkg:{}/", self.ty)?;
        for segment in self.namespace.split('/').filter(|s| !s.is_empty()) {
            write!(f, "{}/", urlencoding::encode(segment))?;
        }
        write!(f, "{}", urlencoding::encode(&self.name))?;
        if !self.version.is_empty() {
            write!(f, "@{}", urlencoding::encode(&self.version))?;
        }
        let mut sep = '?';
        for (key, value) in &self.qualifiers {
            write!(f, "{}{}={}", sep, key, urlencoding::encode(value))?;
            sep = '&';
        }
        Ok(())
    }
}

fn input<'a>(with: &'a Namespace, name: &str) -> &'a str {
    with.get(&input_key(name)).map(String::as_str).unwrap_or("")
}

fn normalized(mut purl: Purl) -> Result<Purl, PurlError> {
    purl.normalize()?;
    Ok(purl)
}

/// Derive package URLs for a step of kind `uses` from its resolved inputs.
///
/// Step kinds without provenance yield an empty list.
pub fn compute_external_refs(uses: &str, with: &Namespace) -> Result<Vec<Purl>, PurlError> {
    let mut purls = Vec::new();

    match uses {
        "fetch" => {
            let mut purl = Purl::new("generic", input(with, "purl-name"))
                .with_version(input(with, "purl-version"))
                .with_qualifier("download_url", input(with, "uri"));

            // sha512 overrides sha256 when both are given
            let sha256 = input(with, "expected-sha256");
            if !sha256.is_empty() {
                purl = purl.with_qualifier("checksum", format!("sha256:{}", sha256));
            }
            let sha512 = input(with, "expected-sha512");
            if !sha512.is_empty() {
                purl = purl.with_qualifier("checksum", format!("sha512:{}", sha512));
            }

            purls.push(normalized(purl)?);
        }
        "git-checkout" => {
            let repository = input(with, "repository");
            let tag = input(with, "tag");
            let commit = input(with, "expected-commit");

            if let Some(path) = repository.strip_prefix(GITHUB_PREFIX) {
                let (namespace, name) = path.split_once('/').unwrap_or((path, ""));
                // One purl per identifier so both tag and commit are recorded
                for version in [tag, commit] {
                    if !version.is_empty() {
                        let purl = Purl::new("github", name)
                            .with_namespace(namespace)
                            .with_version(version);
                        purls.push(normalized(purl)?);
                    }
                }
            } else {
                let base = repository.trim_end_matches('/').rsplit('/').next().unwrap_or("");
                let name = base.strip_suffix(".git").unwrap_or(base);

                let mut vcs_url = format!("git+{}", repository);
                if !commit.is_empty() {
                    vcs_url.push('@');
                    vcs_url.push_str(commit);
                }

                let purl = Purl::new("generic", name)
                    .with_version(tag)
                    .with_qualifier("vcs_url", vcs_url);
                purls.push(normalized(purl)?);
            }
        }
        _ => {}
    }

    Ok(purls)
}
