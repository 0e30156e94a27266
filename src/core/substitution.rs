//! Template substitution primitive and well-known namespace keys
//!
//! Templates reference namespace entries as `${{dotted.path}}`. Every key in
//! a [`Namespace`] is stored in that wrapped form, so a lookup for
//! `package.name` reads the entry `${{package.name}}`.

use std::collections::BTreeMap;
use thiserror::Error;

/// Resolved template variables visible to a step
pub type Namespace = BTreeMap<String, String>;

pub const PACKAGE_NAME: &str = "${{package.name}}";
pub const PACKAGE_VERSION: &str = "${{package.version}}";
pub const PACKAGE_EPOCH: &str = "${{package.epoch}}";
pub const PACKAGE_FULL_VERSION: &str = "${{package.full-version}}";
pub const TARGETS_DESTDIR: &str = "${{targets.destdir}}";
pub const TARGETS_CONTEXTDIR: &str = "${{targets.contextdir}}";
pub const TARGETS_SUBPKGDIR: &str = "${{targets.subpkgdir}}";
pub const HOST_TRIPLET_GNU: &str = "${{host.triplet.gnu}}";
pub const HOST_TRIPLET_RUST: &str = "${{host.triplet.rust}}";
pub const CROSS_TRIPLET_GNU_GLIBC: &str = "${{cross.triplet.gnu.glibc}}";
pub const CROSS_TRIPLET_GNU_MUSL: &str = "${{cross.triplet.gnu.musl}}";
pub const CROSS_TRIPLET_RUST_GLIBC: &str = "${{cross.triplet.rust.glibc}}";
pub const CROSS_TRIPLET_RUST_MUSL: &str = "${{cross.triplet.rust.musl}}";
pub const BUILD_ARCH: &str = "${{build.arch}}";
pub const BUILD_GOARCH: &str = "${{build.goarch}}";

/// Root under which every package's output directory lives
pub const OUTPUT_ROOT: &str = "/home/build/melange-out";

const OPEN: &str = "${{";
const CLOSE: &str = "}}";

/// Errors raised while resolving templates
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubstitutionError {
    #[error("unterminated substitution in {0:?}")]
    Malformed(String),

    #[error("variable {0} not defined")]
    Undefined(String),

    #[error("invalid var-transform match {pattern:?}: {reason}")]
    InvalidTransform { pattern: String, reason: String },
}

/// Wrap a dotted path into its namespace key form
pub fn key(path: &str) -> String {
    format!("{}{}{}", OPEN, path, CLOSE)
}

/// Key for a caller-supplied input
pub fn input_key(name: &str) -> String {
    key(&format!("inputs.{}", name))
}

/// Key for a user-declared variable
pub fn var_key(name: &str) -> String {
    key(&format!("vars.{}", name))
}

/// Key for a build option flag
pub fn option_key(name: &str) -> String {
    key(&format!("options.{}.enabled", name))
}

/// Key for another package's output directory
pub fn package_target_key(name: &str) -> String {
    key(&format!("targets.package.{}", name))
}

/// Default output directory of a package or subpackage
pub fn output_dir(name: &str) -> String {
    format!("{}/{}", OUTPUT_ROOT, name)
}

/// Replace every `${{...}}` reference in `input` with its namespace value.
///
/// This is a single pass: substituted text is never rescanned, so a value
/// that itself contains a reference is copied through verbatim.
pub fn mutate_string(namespace: &Namespace, input: &str) -> Result<String, SubstitutionError> {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find(OPEN) {
        output.push_str(&rest[..start]);
        let after_open = &rest[start + OPEN.len()..];
        let end = after_open
            .find(CLOSE)
            .ok_or_else(|| SubstitutionError::Malformed(input.to_string()))?;

        let path = after_open[..end].trim();
        let lookup = key(path);
        let value = namespace
            .get(&lookup)
            .ok_or(SubstitutionError::Undefined(lookup))?;
        output.push_str(value);

        rest = &after_open[end + CLOSE.len()..];
    }

    output.push_str(rest);
    Ok(output)
}
