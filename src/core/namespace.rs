//! Namespace construction for a pipeline build
//!
//! Layers are applied in order, each overwriting same-named keys from the
//! layer before it: package facts, build-only facts, user variables,
//! var-transforms, subpackage scope, per-package output directories and
//! finally build option flags.

use crate::core::{
    context::PipelineBuild,
    substitution::{self, mutate_string, Namespace, SubstitutionError},
};
use regex::Regex;
use std::collections::HashMap;

/// Build the base namespace visible to every step of `pb`
pub fn build_namespace(pb: &PipelineBuild) -> Result<Namespace, SubstitutionError> {
    let package = &pb.package;
    let mut nw = Namespace::new();

    nw.insert(substitution::PACKAGE_NAME.to_string(), package.name.clone());
    nw.insert(substitution::PACKAGE_VERSION.to_string(), package.version.clone());
    nw.insert(substitution::PACKAGE_EPOCH.to_string(), package.epoch.to_string());
    nw.insert(
        substitution::PACKAGE_FULL_VERSION.to_string(),
        format!("{}-r{}", package.version, package.epoch),
    );
    nw.insert(substitution::TARGETS_DESTDIR.to_string(), substitution::output_dir(&package.name));
    nw.insert(substitution::TARGETS_CONTEXTDIR.to_string(), substitution::output_dir(&package.name));

    // Triplets and arch names mean nothing to a test run
    if let Some(build) = pb.build_context() {
        let arch = build.arch;
        nw.insert(substitution::HOST_TRIPLET_GNU.to_string(), build.host_triplet_gnu());
        nw.insert(substitution::HOST_TRIPLET_RUST.to_string(), build.host_triplet_rust());
        nw.insert(substitution::CROSS_TRIPLET_GNU_GLIBC.to_string(), arch.to_triplet("gnu"));
        nw.insert(substitution::CROSS_TRIPLET_GNU_MUSL.to_string(), arch.to_triplet("musl"));
        nw.insert(substitution::CROSS_TRIPLET_RUST_GLIBC.to_string(), arch.to_rust_triplet("gnu"));
        nw.insert(substitution::CROSS_TRIPLET_RUST_MUSL.to_string(), arch.to_rust_triplet("musl"));
        nw.insert(substitution::BUILD_ARCH.to_string(), arch.to_apk().to_string());
        nw.insert(substitution::BUILD_GOARCH.to_string(), arch.to_go().to_string());
    }

    let config = pb.configuration();

    // User variables resolve once against what is known so far
    let mut vars: Vec<(&String, &String)> = config.vars.iter().collect();
    vars.sort();
    for (name, value) in vars {
        let resolved = mutate_string(&nw, value)?;
        nw.insert(substitution::var_key(name), resolved);
    }

    for transform in &config.var_transforms {
        let from = mutate_string(&nw, &transform.from)?;
        let re = Regex::new(&transform.match_pattern).map_err(|e| {
            SubstitutionError::InvalidTransform {
                pattern: transform.match_pattern.clone(),
                reason: e.to_string(),
            }
        })?;
        let output = re.replace_all(&from, transform.replace.as_str()).into_owned();
        nw.insert(substitution::var_key(&transform.to), output);
    }

    if let Some(subpackage) = &pb.subpackage {
        let dir = substitution::output_dir(&subpackage.name);
        nw.insert(substitution::TARGETS_SUBPKGDIR.to_string(), dir.clone());
        nw.insert(substitution::TARGETS_CONTEXTDIR.to_string(), dir);
    }

    let package_names = std::iter::once(&package.name)
        .chain(config.subpackages.iter().map(|sp| &sp.name));
    for name in package_names {
        nw.insert(substitution::package_target_key(name), substitution::output_dir(name));
    }

    for name in config.options.keys() {
        nw.insert(substitution::option_key(name), "false".to_string());
    }
    if let Some(build) = pb.build_context() {
        for name in &build.enabled_options {
            nw.insert(substitution::option_key(name), "true".to_string());
        }
    }

    Ok(nw)
}

/// Layer caller arguments over the base namespace and resolve every value.
///
/// Bare argument names become `${{inputs.<name>}}`; keys already in wrapped
/// form are kept as they are. When both spell the same key, the bare one
/// wins.
pub fn mutate_with(
    pb: &PipelineBuild,
    with: &HashMap<String, String>,
) -> Result<Namespace, SubstitutionError> {
    let mut nw = build_namespace(pb)?;

    // Bare names are the step's own arguments and win over inherited keys
    let (wrapped, bare): (Vec<_>, Vec<_>) = with.iter().partition(|(k, _)| k.starts_with("${{"));
    for (k, v) in wrapped {
        nw.insert(k.clone(), v.clone());
    }
    for (k, v) in bare {
        nw.insert(substitution::input_key(k), v.clone());
    }

    let merged = nw.clone();
    for value in nw.values_mut() {
        *value = mutate_string(&merged, value)?;
    }

    Ok(nw)
}
