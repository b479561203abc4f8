//! Hook registry
//!
//! Index of every task in a namespace tree by name, so a hookable task can
//! find its same-named peers without walking the tree on every call.

use crate::runner::{Namespace, Task};
use std::collections::HashMap;
use std::sync::Arc;

/// A task found somewhere in the tree
#[derive(Debug, Clone)]
pub struct HookEntry {
    /// Dotted path of the namespace holding the task
    pub namespace: String,
    pub task: Arc<Task>,
}

/// Task name -> every task with that name, in tree order
#[derive(Debug, Clone, Default)]
pub struct HookRegistry {
    by_name: HashMap<String, Vec<HookEntry>>,
}

impl HookRegistry {
    /// Walk a namespace tree and index all of its tasks
    pub fn build(root: &Namespace) -> Self {
        let mut by_name: HashMap<String, Vec<HookEntry>> = HashMap::new();

        for (path, ns) in root.walk() {
            for task in ns.tasks() {
                by_name.entry(task.name.clone()).or_default().push(HookEntry {
                    namespace: path.clone(),
                    task: Arc::clone(task),
                });
            }
        }

        log::debug!(
            "Indexed {} task names across namespace '{}'",
            by_name.len(),
            root.name
        );

        HookRegistry { by_name }
    }

    /// All tasks registered under `name`; empty when there are none
    pub fn peers(&self, name: &str) -> &[HookEntry] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of distinct task names
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
