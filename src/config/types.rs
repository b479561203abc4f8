//! Core configuration types
//!
//! This module defines the data structures that represent a taskhook.yml
//! configuration file.

use crate::runner::Verbosity;
use serde::{Deserialize, Serialize};

/// Top-level configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Application name (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Application usage description (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,

    /// Default verbosity when no flag is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbosity: Option<Verbosity>,

    /// Task handling settings
    #[serde(default)]
    pub tasks: TaskSettings,
}

/// Settings that affect how tasks are exposed and run
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TaskSettings {
    /// Turn underscores into dashes in task and flag names
    #[serde(default = "default_true")]
    pub auto_dash_names: bool,

    /// Run a pre/post task only once per run when several tasks request it
    #[serde(default = "default_true")]
    pub dedupe: bool,
}

impl Default for TaskSettings {
    fn default() -> Self {
        TaskSettings {
            auto_dash_names: true,
            dedupe: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty_config() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.tasks.auto_dash_names);
        assert!(config.tasks.dedupe);
    }

    #[test]
    fn test_deserialize_full_config() {
        let yaml = r#"
name: myproj
usage: Project tasks
verbosity: verbose
tasks:
  auto_dash_names: false
  dedupe: false
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.name, Some("myproj".to_string()));
        assert_eq!(config.verbosity, Some(Verbosity::Verbose));
        assert!(!config.tasks.auto_dash_names);
        assert!(!config.tasks.dedupe);
    }

    #[test]
    fn test_partial_task_settings_keep_defaults() {
        let config: Config = serde_yaml::from_str("tasks:\n  dedupe: false\n").unwrap();
        assert!(config.tasks.auto_dash_names);
        assert!(!config.tasks.dedupe);
    }

    #[test]
    fn test_unknown_verbosity_is_rejected() {
        let result: Result<Config, _> = serde_yaml::from_str("verbosity: chatty");
        assert!(result.is_err());
    }
}
