//! Namespace validation
//!
//! Checks a namespace tree before it is turned into a command line: every
//! subcommand name must be unique and every task's resolved flags must be
//! unambiguous.

use crate::config::types::TaskSettings;
use crate::error::{ConfigError, ConfigResult};
use crate::runner::{FlagResolver, Namespace, Task, RESERVED_FLAGS};
use std::collections::HashSet;
use std::sync::Arc;

/// Subcommand names clap adds on its own
pub const RESERVED_COMMANDS: &[&str] = &["help"];

/// How a task is reached from the command line
#[derive(Debug, Clone)]
pub struct TaskCommand<'a> {
    /// Dotted task path inside the tree
    pub path: String,
    /// Subcommand name
    pub name: String,
    /// Visible aliases, including the collection path of a default task
    pub aliases: Vec<String>,
    pub task: &'a Arc<Task>,
}

/// Subcommand names and aliases for every task in the tree
pub fn task_commands<'a>(root: &'a Namespace, settings: &TaskSettings) -> Vec<TaskCommand<'a>> {
    let dash = settings.auto_dash_names;

    root.task_paths()
        .into_iter()
        .map(|(path, task)| {
            let name = command_path(&path, dash);
            let prefix = name.rsplit_once('.').map(|(prefix, _)| prefix.to_string());

            let mut aliases: Vec<String> = task
                .aliases
                .iter()
                .map(|alias| {
                    let alias = command_path(alias, dash);
                    match &prefix {
                        Some(prefix) => format!("{}.{}", prefix, alias),
                        None => alias,
                    }
                })
                .collect();

            // a collection's default task also answers to the collection name
            if task.is_default {
                if let Some(prefix) = prefix {
                    aliases.push(prefix);
                }
            }

            TaskCommand {
                path,
                name,
                aliases,
                task,
            }
        })
        .collect()
}

/// Command-line spelling of a dotted task path
pub fn command_path(path: &str, dash: bool) -> String {
    if dash {
        path.replace('_', "-")
    } else {
        path.to_string()
    }
}

/// Validate every task in a namespace tree
pub fn validate_namespace(root: &Namespace, settings: &TaskSettings) -> ConfigResult<()> {
    validate_commands(root, settings)?;
    for (path, task) in root.task_paths() {
        validate_task(&path, task, settings)?;
    }
    Ok(())
}

/// No two tasks may answer to the same subcommand name or alias
pub fn validate_commands(root: &Namespace, settings: &TaskSettings) -> ConfigResult<()> {
    let mut seen: HashSet<String> = RESERVED_COMMANDS.iter().map(|s| s.to_string()).collect();

    for command in task_commands(root, settings) {
        for name in std::iter::once(&command.name).chain(command.aliases.iter()) {
            if !seen.insert(name.clone()) {
                return Err(ConfigError::CommandCollision {
                    task: command.path.clone(),
                    name: name.clone(),
                });
            }
        }
    }

    Ok(())
}

/// Validate a single task's flags
pub fn validate_task(path: &str, task: &Task, settings: &TaskSettings) -> ConfigResult<()> {
    let specs = FlagResolver::new(task)
        .dash_names(settings.auto_dash_names)
        .arguments();

    let mut seen: HashSet<&str> = RESERVED_FLAGS.iter().copied().collect();
    for spec in &specs {
        for name in &spec.names {
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::FlagCollision {
                    task: path.to_string(),
                    flag: name.clone(),
                });
            }
        }
    }

    Ok(())
}
