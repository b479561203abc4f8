//! Common test utilities

#![allow(dead_code)]

use serde_yaml::Value;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use taskhook::runner::{task, AppState, Context, Namespace, Task};
use tempfile::TempDir;

/// Parse an inline YAML value
pub fn yaml(s: &str) -> Value {
    serde_yaml::from_str(s).unwrap()
}

/// Create a temporary directory with a taskhook.yml file
pub fn create_test_config(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("taskhook.yml");
    fs::write(&config_path, content).unwrap();
    (temp_dir, config_path)
}

/// Create a test config in a subdirectory
pub fn create_test_config_in_subdir(content: &str) -> (TempDir, PathBuf, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("taskhook.yml");
    let sub_dir = temp_dir.path().join("subdir");

    fs::write(&config_path, content).unwrap();
    fs::create_dir(&sub_dir).unwrap();

    (temp_dir, config_path, sub_dir)
}

/// Task named `name` that returns `value`
pub fn returning(name: &str, value: &str, hookable: Option<bool>) -> Arc<Task> {
    let value = yaml(value);
    task(name)
        .hookable(hookable)
        .build(move |_, _| Ok(value.clone()))
        .unwrap()
}

/// Task named `name` that always fails with `message`
pub fn failing(name: &str, message: &'static str) -> Arc<Task> {
    task(name)
        .build(move |_, _| Err(anyhow::anyhow!(message)))
        .unwrap()
}

/// Core `sync` task in the root with two plugin collections:
/// `plugin1.sync` fails, `plugin2.sync` returns `{b: 2}`
pub fn plugin_tree() -> (Namespace, Arc<Task>) {
    let core = returning("sync", "{a: 1}", Some(true));

    let plugin1 = Namespace::new("plugin1")
        .with_task(failing("sync", "connection refused"))
        .unwrap();
    let plugin2 = Namespace::new("plugin2")
        .with_task(returning("sync", "{b: 2}", None))
        .unwrap();

    let root = Namespace::new("tasks")
        .with_task(Arc::clone(&core))
        .unwrap()
        .with_collection(plugin1)
        .unwrap()
        .with_collection(plugin2)
        .unwrap();

    (root, core)
}

/// Fresh context over a namespace tree
pub fn context(root: Namespace) -> Context {
    Context::new(AppState::new(root))
}
