//! Call arguments and parameter binding
//!
//! [`CallArgs`] is what a caller hands to a task: positional values plus
//! keyword values. Binding maps them onto the task's declared parameters and
//! produces the [`TaskArgs`] a body reads from.

use crate::error::BindingError;
use crate::runner::Param;
use serde_yaml::Value;
use std::collections::{BTreeMap, HashMap};

/// Arguments supplied by the caller of a task
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    /// Positional values, matched against parameters in declaration order
    pub positional: Vec<Value>,

    /// Keyword values, matched by parameter name
    pub keyword: BTreeMap<String, Value>,
}

impl CallArgs {
    /// Create an empty argument list
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional value
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Set a keyword value
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keyword.insert(name.into(), value.into());
        self
    }

    /// True when no arguments were given at all
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }
}

/// Arguments bound to a task's parameters, as seen by the task body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskArgs {
    values: HashMap<String, Value>,
}

impl TaskArgs {
    /// Get the raw value of a parameter
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    /// Get a list parameter; `None` when absent or not a sequence
    pub fn get_list(&self, name: &str) -> Option<&[Value]> {
        self.get(name)
            .and_then(Value::as_sequence)
            .map(|seq| seq.as_slice())
    }

    /// Whether a value is bound for this parameter
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Bind arguments for a direct call.
///
/// Positional values fill parameters in order, keyword values fill them by
/// name and defaults fill whatever is left. Anything that does not fit is an
/// error.
pub fn bind_strict(task: &str, params: &[Param], args: &CallArgs) -> Result<TaskArgs, BindingError> {
    if args.positional.len() > params.len() {
        return Err(BindingError::TooManyPositional {
            task: task.to_string(),
            expected: params.len(),
            given: args.positional.len(),
        });
    }

    if let Some(name) = args
        .keyword
        .keys()
        .find(|name| !params.iter().any(|p| &p.name == *name))
    {
        return Err(BindingError::UnexpectedKeyword {
            task: task.to_string(),
            name: name.clone(),
        });
    }

    bind_params(task, params, args)
}

/// Bind arguments for a hooked peer.
///
/// Surplus positional values are ignored and keyword values the peer does not
/// declare are dropped. A required parameter must be covered by a positional
/// value; a keyword of the same name does not satisfy it.
pub fn bind_for_peer(task: &str, params: &[Param], args: &CallArgs) -> Result<TaskArgs, BindingError> {
    if let Some(param) = params
        .iter()
        .skip(args.positional.len())
        .find(|p| p.is_required())
    {
        return Err(BindingError::MissingArgument {
            task: task.to_string(),
            param: param.name.clone(),
        });
    }

    bind_params(task, params, args)
}

fn bind_params(task: &str, params: &[Param], args: &CallArgs) -> Result<TaskArgs, BindingError> {
    let mut values = HashMap::with_capacity(params.len());

    for (i, param) in params.iter().enumerate() {
        let positional = args.positional.get(i);
        let keyword = args.keyword.get(&param.name);

        let value = match (positional, keyword) {
            (Some(_), Some(_)) => {
                return Err(BindingError::MultipleValues {
                    task: task.to_string(),
                    param: param.name.clone(),
                });
            }
            (Some(v), None) | (None, Some(v)) => v.clone(),
            (None, None) => match &param.default {
                Some(default) => default.clone(),
                None => {
                    return Err(BindingError::MissingArgument {
                        task: task.to_string(),
                        param: param.name.clone(),
                    });
                }
            },
        };

        values.insert(param.name.clone(), value);
    }

    Ok(TaskArgs { values })
}
