//! Step compilation - expanding `uses:` fragments and resolving templates
//!
//! A compiled step has no `${{...}}` references left in `runs`, `if`,
//! `working-directory` or `environment`, its inputs have been validated,
//! and any provenance it implies is attached as `external_refs`.

use crate::core::{
    context::PipelineBuild,
    error::PipelineError,
    inputs::validate_with,
    loader::FragmentLoader,
    namespace::mutate_with,
    provenance::compute_external_refs,
    step::Step,
    substitution::{input_key, mutate_string, Namespace, SubstitutionError},
};
use std::collections::HashMap;
use tracing::debug;

/// Fragments may reference other fragments, but not endlessly
const MAX_DEPTH: usize = 32;

/// Compiles recipe steps against a pipeline build
pub struct Compiler<'a> {
    loader: &'a dyn FragmentLoader,
}

impl<'a> Compiler<'a> {
    pub fn new(loader: &'a dyn FragmentLoader) -> Self {
        Self { loader }
    }

    /// Compile a sequence of top-level steps
    pub fn compile_pipeline(
        &self,
        pb: &PipelineBuild,
        steps: &[Step],
    ) -> Result<Vec<Step>, PipelineError> {
        steps
            .iter()
            .map(|step| self.compile_step(pb, step.clone(), 0))
            .collect()
    }

    fn compile_step(
        &self,
        pb: &PipelineBuild,
        step: Step,
        depth: usize,
    ) -> Result<Step, PipelineError> {
        let mut step = match step.uses.clone() {
            Some(uses) if !uses.is_empty() => {
                if depth >= MAX_DEPTH {
                    return Err(PipelineError::FragmentDepth(uses));
                }
                self.expand(step, &uses)?
            }
            _ => step,
        };

        let id = step.identity().to_string();

        let with = validate_with(std::mem::take(&mut step.with), &step.inputs).map_err(|source| {
            PipelineError::Input {
                step: id.clone(),
                source,
            }
        })?;
        let mutated = mutate_with(pb, &with).map_err(|source| PipelineError::Substitution {
            step: id.clone(),
            source,
        })?;

        if let Some(uses) = &step.uses {
            step.external_refs = compute_external_refs(uses, &mutated).map_err(|source| {
                PipelineError::Provenance {
                    step: id.clone(),
                    source,
                }
            })?;
        }

        substitute(&mut step, &mutated).map_err(|source| PipelineError::Substitution {
            step: id.clone(),
            source,
        })?;

        // Children see the parent's inputs unless they override them
        let children = std::mem::take(&mut step.pipeline);
        step.pipeline = children
            .into_iter()
            .map(|mut child| {
                let child_id = child.identity().to_string();
                child.with = inherit(&mutated, std::mem::take(&mut child.with)).map_err(
                    |source| PipelineError::Substitution {
                        step: child_id,
                        source,
                    },
                )?;
                self.compile_step(pb, child, depth + 1)
            })
            .collect::<Result<_, _>>()?;

        // Keep only the caller-facing arguments
        step.with = with;
        Ok(step)
    }

    /// Overlay a fragment's definition onto the calling step
    fn expand(&self, step: Step, uses: &str) -> Result<Step, PipelineError> {
        debug!("Expanding step {:?} from fragment {:?}", step.identity(), uses);
        let data = self.loader.load(uses)?;
        let fragment: Step =
            serde_yaml::from_slice(&data).map_err(|source| PipelineError::FragmentParse {
                uses: uses.to_string(),
                source,
            })?;

        let mut environment = fragment.environment;
        environment.extend(step.environment);

        Ok(Step {
            name: step.name.or(fragment.name),
            uses: Some(uses.to_string()),
            with: step.with,
            runs: fragment.runs,
            working_directory: step.working_directory.or(fragment.working_directory),
            environment,
            if_condition: step.if_condition,
            pipeline: fragment.pipeline,
            assertions: step.assertions.or(fragment.assertions),
            inputs: fragment.inputs,
            external_refs: Vec::new(),
        })
    }
}

/// Seed a child's arguments with the parent's resolved namespace.
///
/// The child's own arguments are written in the parent's scope, so they are
/// resolved against it here and replace any parent input of the same name.
fn inherit(
    parent: &Namespace,
    child: HashMap<String, String>,
) -> Result<HashMap<String, String>, SubstitutionError> {
    let mut with: HashMap<String, String> = parent
        .iter()
        .filter(|(k, _)| !child.keys().any(|name| input_key(name) == **k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    for (name, value) in child {
        with.insert(name, mutate_string(parent, &value)?);
    }
    Ok(with)
}

fn substitute(step: &mut Step, nw: &Namespace) -> Result<(), SubstitutionError> {
    step.runs = mutate_string(nw, &step.runs)?;
    if let Some(condition) = &step.if_condition {
        step.if_condition = Some(mutate_string(nw, condition)?);
    }
    if let Some(dir) = &step.working_directory {
        step.working_directory = Some(mutate_string(nw, dir)?);
    }
    for value in step.environment.values_mut() {
        *value = mutate_string(nw, value)?;
    }
    Ok(())
}
