//! Reconciling caller arguments with a step kind's declared inputs

use crate::core::step::Input;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("required input {0:?} for pipeline is missing")]
    MissingRequired(String),
}

/// Apply defaults and check required inputs.
///
/// Arguments that are not declared in `inputs` are passed through untouched.
pub fn validate_with(
    mut with: HashMap<String, String>,
    inputs: &HashMap<String, Input>,
) -> Result<HashMap<String, String>, InputError> {
    for (name, input) in inputs {
        let value = with.entry(name.clone()).or_default();
        if value.is_empty() {
            *value = input.default.clone();
        }

        if input.required && value.is_empty() {
            return Err(InputError::MissingRequired(name.clone()));
        }
    }

    Ok(with)
}
