//! User input and interaction handling.
//! Prompts for the required recipe parameters the command line and
//! configuration left unset.

use crate::context::{Context, DefaultValue, Parameter};
use crate::error::{Error, Result};
use dialoguer::{Confirm, Input};
use serde_json::Value;

/// Asks the user for a single parameter value.
pub trait Prompter {
    /// `label` is the dotted path of the parameter, e.g. `repo.owner`.
    fn answer(&self, label: &str, parameter: &Parameter) -> Result<Value>;
}

/// Terminal prompter backed by `dialoguer`.
#[derive(Debug, Default)]
pub struct DialoguerPrompter;

impl DialoguerPrompter {
    pub fn new() -> Self {
        Self
    }
}

impl Prompter for DialoguerPrompter {
    fn answer(&self, label: &str, parameter: &Parameter) -> Result<Value> {
        let prompt = format!("{label} ({})", parameter.annotation);
        if parameter.annotation == "bool" {
            let answer = Confirm::new()
                .with_prompt(prompt)
                .default(false)
                .interact()
                .map_err(|e| Error::ConfigError(e.to_string()))?;
            return Ok(Value::Bool(answer));
        }
        let answer: String = Input::new()
            .with_prompt(prompt)
            .interact_text()
            .map_err(|e| Error::ConfigError(e.to_string()))?;
        Ok(Value::String(answer))
    }
}

/// Fills every required parameter missing from `kwargs`, recursing into nested fields.
pub fn prompt_missing(prompter: &dyn Prompter, parameters: &[Parameter], kwargs: &mut Context) -> Result<()> {
    fill(prompter, parameters, kwargs, "")
}

/// Dotted paths of the required parameters missing from `kwargs`.
pub fn missing_parameters(parameters: &[Parameter], kwargs: &Context) -> Vec<String> {
    let mut missing = Vec::new();
    collect_missing(parameters, kwargs, "", &mut missing);
    missing
}

fn label(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

fn fill(prompter: &dyn Prompter, parameters: &[Parameter], kwargs: &mut Context, prefix: &str) -> Result<()> {
    for parameter in parameters.iter().map(Parameter::expanded) {
        let label = label(prefix, parameter.name);
        match &parameter.default {
            DefaultValue::Signature(nested) => {
                let mut inner = match kwargs.get(parameter.name) {
                    Some(Value::Object(inner)) => inner.clone(),
                    _ => Context::new(),
                };
                let before = inner.len();
                fill(prompter, nested, &mut inner, &label)?;
                if inner.len() > before || kwargs.contains_key(parameter.name) {
                    kwargs.insert(parameter.name.to_string(), Value::Object(inner));
                }
            }
            DefaultValue::Required if !kwargs.contains_key(parameter.name) => {
                let value = prompter.answer(&label, &parameter)?;
                kwargs.insert(parameter.name.to_string(), value);
            }
            _ => {}
        }
    }
    Ok(())
}

fn collect_missing(parameters: &[Parameter], kwargs: &Context, prefix: &str, missing: &mut Vec<String>) {
    for parameter in parameters.iter().map(Parameter::expanded) {
        let label = label(prefix, parameter.name);
        match (&parameter.default, kwargs.get(parameter.name)) {
            (DefaultValue::Signature(nested), Some(Value::Object(inner))) => {
                collect_missing(nested, inner, &label, missing)
            }
            (DefaultValue::Signature(nested), None) => collect_missing(nested, &Context::new(), &label, missing),
            (DefaultValue::Required, None) => missing.push(label),
            _ => {}
        }
    }
}
