//! Command-line presentation of task parameters
//!
//! [`FlagResolver`] turns each parameter of a task into a [`FlagSpec`]: the
//! names it answers to on the command line, its help text and how its value is
//! parsed. Explicit `flags` entries on the task replace the derived names
//! (`as_json` -> `--json`, `exclude` -> `--exclude`/`-x`); help text comes
//! from the task's `help` entries, then from the derived spec, then from the
//! task's documentation block.

use crate::runner::{extract_param_doc, Param, Task};
use serde_yaml::Value;
use std::collections::{HashMap, HashSet};

/// Flag names clap reserves on every subcommand
pub const RESERVED_FLAGS: &[&str] = &["-h", "--help"];

/// How a flag's value is parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagKind {
    Str,
    Bool,
    Int,
    Float,
    /// Repeatable, collects a list
    List,
    /// Counts occurrences
    Counter,
}

impl FlagKind {
    /// Infer the kind from a parameter default
    pub fn from_default(default: Option<&Value>) -> Self {
        match default {
            Some(Value::Bool(_)) => FlagKind::Bool,
            Some(Value::Number(n)) if n.is_i64() || n.is_u64() => FlagKind::Int,
            Some(Value::Number(_)) => FlagKind::Float,
            Some(Value::Sequence(_)) => FlagKind::List,
            _ => FlagKind::Str,
        }
    }
}

/// Resolved command-line presentation of one parameter
#[derive(Debug, Clone, PartialEq)]
pub struct FlagSpec {
    /// Parameter this flag feeds
    pub param: String,

    /// Command-line names, long ones as `--name`, short ones as `-n`
    pub names: Vec<String>,

    pub help: Option<String>,

    pub kind: FlagKind,

    pub default: Option<Value>,

    /// Taken by position rather than by flag
    pub positional: bool,

    /// A bare flag is accepted and means `true`
    pub optional: bool,
}

impl FlagSpec {
    /// Long names without their leading dashes
    pub fn longs(&self) -> impl Iterator<Item = &str> {
        self.names.iter().filter_map(|n| n.strip_prefix("--"))
    }

    /// Short names as characters
    pub fn shorts(&self) -> impl Iterator<Item = char> + '_ {
        self.names
            .iter()
            .filter(|n| !n.starts_with("--"))
            .filter_map(|n| n.strip_prefix('-'))
            .filter_map(|n| {
                let mut chars = n.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(c),
                    _ => None,
                }
            })
    }
}

/// Spell a bare name as a flag: one character becomes `-x`, anything longer
/// becomes `--name`. Names that already start with a dash are kept.
pub fn flag_name(name: &str, dash_names: bool) -> String {
    if name.starts_with('-') {
        return name.to_string();
    }
    let name = if dash_names {
        name.replace('_', "-")
    } else {
        name.to_string()
    };
    if name.chars().count() == 1 {
        format!("-{}", name)
    } else {
        format!("--{}", name)
    }
}

/// Resolves the flag specs of one task
#[derive(Debug)]
pub struct FlagResolver<'a> {
    task: &'a Task,
    dash_names: bool,
    reserved: HashSet<String>,
    consumed: HashSet<String>,
    resolved_help: HashMap<String, String>,
}

impl<'a> FlagResolver<'a> {
    pub fn new(task: &'a Task) -> Self {
        FlagResolver {
            task,
            dash_names: true,
            reserved: RESERVED_FLAGS.iter().map(|s| s.to_string()).collect(),
            consumed: HashSet::new(),
            resolved_help: HashMap::new(),
        }
    }

    /// Whether underscores in parameter names become dashes
    pub fn dash_names(mut self, enabled: bool) -> Self {
        self.dash_names = enabled;
        self
    }

    /// The flag spec the parser would derive on its own, given the names other
    /// parameters already hold
    pub fn default_spec(&self, param: &str, taken: &HashSet<String>) -> FlagSpec {
        let declared = self.task.param(param);
        let default = declared.and_then(|p| p.default.clone());

        let kind = if self.task.incrementable.iter().any(|n| n == param) {
            FlagKind::Counter
        } else if self.task.iterable.iter().any(|n| n == param) {
            FlagKind::List
        } else {
            FlagKind::from_default(default.as_ref())
        };

        let primary = flag_name(param, self.dash_names);
        let mut names = vec![primary.clone()];

        if self.task.auto_shortflags && primary.starts_with("--") {
            let short = param
                .chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .map(|c| format!("-{}", c))
                .find(|short| !taken.contains(short) && !self.reserved.contains(short));
            if let Some(short) = short {
                names.push(short);
            }
        }

        // help may be declared under the dashed spelling of the parameter
        let help = self
            .task
            .help
            .get(primary.trim_start_matches('-'))
            .filter(|_| primary.trim_start_matches('-') != param)
            .cloned();

        FlagSpec {
            param: param.to_string(),
            names,
            help,
            kind,
            default,
            positional: self.task.is_positional(param),
            optional: self.task.optional.iter().any(|n| n == param),
        }
    }

    /// Derive the flag spec for `param` and apply the task's customizations
    pub fn resolve(&mut self, param: &str, taken: &HashSet<String>) -> FlagSpec {
        let default = self.default_spec(param, taken);
        self.customize(param, default)
    }

    /// Apply the task's help and flag customizations to a derived spec
    pub fn customize(&mut self, param: &str, mut spec: FlagSpec) -> FlagSpec {
        let explicit = if self.consumed.insert(param.to_string()) {
            self.task.help.get(param).cloned()
        } else {
            None
        };

        let help = explicit
            .filter(|h| !h.is_empty())
            .or_else(|| spec.help.clone().filter(|h| !h.is_empty()))
            .or_else(|| {
                self.task
                    .doc
                    .as_deref()
                    .and_then(|doc| extract_param_doc(doc, param))
            });

        if let Some(flags) = self.task.flags.get(param) {
            spec.names = flags
                .iter()
                .map(|f| flag_name(f, self.dash_names))
                .collect();
        }

        if let Some(text) = &help {
            for name in &spec.names {
                self.resolved_help.insert(name.clone(), text.clone());
            }
        }

        spec.help = help;
        spec
    }

    /// Specs for every parameter, positional ones first.
    ///
    /// Names given explicitly through `flags`, and the `-x` primary names of
    /// one-character parameters, are claimed before any short flag is
    /// derived, so derived shorts never steal them.
    pub fn arguments(&mut self) -> Vec<FlagSpec> {
        let task = self.task;
        let mut taken: HashSet<String> = self.reserved.clone();
        taken.extend(
            task.flags
                .values()
                .flatten()
                .map(|f| flag_name(f, self.dash_names)),
        );
        taken.extend(
            task.params
                .iter()
                .filter(|p| !task.flags.contains_key(&p.name))
                .map(|p| flag_name(&p.name, self.dash_names))
                .filter(|name| !name.starts_with("--")),
        );

        let mut specs = Vec::with_capacity(task.params.len());
        for Param { name, .. } in &task.params {
            let spec = self.resolve(name, &taken);
            taken.extend(spec.names.iter().cloned());
            specs.push(spec);
        }

        let (mut positional, rest): (Vec<_>, Vec<_>) =
            specs.into_iter().partition(|s| s.positional);
        positional.extend(rest);
        positional
    }

    /// Help recorded for a final flag name during resolution
    pub fn help_for(&self, flag: &str) -> Option<&str> {
        self.resolved_help.get(flag).map(String::as_str)
    }

    /// All help recorded during resolution, keyed by final flag name
    pub fn into_help(self) -> HashMap<String, String> {
        self.resolved_help
    }
}
