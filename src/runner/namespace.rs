//! Namespace tree
//!
//! A namespace holds tasks and nested namespaces ("collections"). Both keep
//! their insertion order, which is the order hook cascades follow.

use crate::error::{ConfigError, ConfigResult};
use crate::runner::Task;
use std::sync::Arc;

/// A named container of tasks and child namespaces
#[derive(Debug, Clone)]
pub struct Namespace {
    pub name: String,
    tasks: Vec<Arc<Task>>,
    collections: Vec<Namespace>,
}

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        Namespace {
            name: name.into(),
            tasks: Vec::new(),
            collections: Vec::new(),
        }
    }

    /// Add a task; names and aliases must not clash with existing tasks
    pub fn add_task(&mut self, task: Arc<Task>) -> ConfigResult<()> {
        let clash = std::iter::once(&task.name)
            .chain(task.aliases.iter())
            .find(|name| self.tasks.iter().any(|t| t.answers_to(name)));

        if let Some(name) = clash {
            return Err(ConfigError::DuplicateTask {
                namespace: self.name.clone(),
                name: name.clone(),
            });
        }

        self.tasks.push(task);
        Ok(())
    }

    /// Add a child namespace
    pub fn add_collection(&mut self, collection: Namespace) -> ConfigResult<()> {
        if self.collection(&collection.name).is_some() {
            return Err(ConfigError::DuplicateCollection {
                namespace: self.name.clone(),
                name: collection.name,
            });
        }

        self.collections.push(collection);
        Ok(())
    }

    /// Builder form of [`Namespace::add_task`]
    pub fn with_task(mut self, task: Arc<Task>) -> ConfigResult<Self> {
        self.add_task(task)?;
        Ok(self)
    }

    /// Builder form of [`Namespace::add_collection`]
    pub fn with_collection(mut self, collection: Namespace) -> ConfigResult<Self> {
        self.add_collection(collection)?;
        Ok(self)
    }

    /// Task with exactly this name
    pub fn task(&self, name: &str) -> Option<&Arc<Task>> {
        self.tasks.iter().find(|t| t.name == name)
    }

    /// Task with this name or alias
    pub fn find_task(&self, name: &str) -> Option<&Arc<Task>> {
        self.tasks.iter().find(|t| t.answers_to(name))
    }

    /// Direct child namespace
    pub fn collection(&self, name: &str) -> Option<&Namespace> {
        self.collections.iter().find(|c| c.name == name)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Arc<Task>> {
        self.tasks.iter()
    }

    pub fn collections(&self) -> impl Iterator<Item = &Namespace> {
        self.collections.iter()
    }

    /// The task marked as this namespace's default, if any
    pub fn default_task(&self) -> Option<&Arc<Task>> {
        self.tasks.iter().find(|t| t.is_default)
    }

    /// Resolve a dotted path such as `deploy.sync` to a task.
    ///
    /// A path naming a collection resolves to that collection's default task.
    pub fn resolve(&self, path: &str) -> Option<&Arc<Task>> {
        match path.split_once('.') {
            Some((head, rest)) => self.collection(head)?.resolve(rest),
            None => self
                .find_task(path)
                .or_else(|| self.collection(path)?.default_task()),
        }
    }

    /// Visit this namespace and every descendant, depth first, parents before
    /// children. Each namespace is paired with its dotted path; the root is
    /// identified by its own name.
    pub fn walk(&self) -> Vec<(String, &Namespace)> {
        let mut out = vec![(self.name.clone(), self)];
        for child in &self.collections {
            child.walk_into(String::new(), &mut out);
        }
        out
    }

    fn walk_into<'a>(&'a self, prefix: String, out: &mut Vec<(String, &'a Namespace)>) {
        let path = if prefix.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", prefix, self.name)
        };
        out.push((path.clone(), self));
        for child in &self.collections {
            child.walk_into(path.clone(), out);
        }
    }

    /// Every task in the tree with its dotted call path
    pub fn task_paths(&self) -> Vec<(String, &Arc<Task>)> {
        let mut out: Vec<(String, &Arc<Task>)> = self
            .tasks
            .iter()
            .map(|t| (t.name.clone(), t))
            .collect();
        for (path, ns) in self.walk().into_iter().skip(1) {
            out.extend(ns.tasks.iter().map(|t| (format!("{}.{}", path, t.name), t)));
        }
        out
    }
}
