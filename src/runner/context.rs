//! Execution context for task running
//!
//! The context carries the run configuration (including the root namespace and
//! its hook registry) and a general key store. The `result` key of that store
//! is the slot every task in a cascade merges its return value into.

use crate::config::Config;
use crate::runner::{empty_result, merge_result, HookRegistry, Namespace};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Key of the shared result slot in the context store
pub const RESULT_KEY: &str = "result";

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Silent = 0,
    Quiet = 1,
    Normal = 2,
    Verbose = 3,
}

impl Verbosity {
    /// Log level used for this verbosity
    pub fn level_filter(self) -> log::LevelFilter {
        match self {
            Verbosity::Silent => log::LevelFilter::Off,
            Verbosity::Quiet => log::LevelFilter::Error,
            Verbosity::Normal => log::LevelFilter::Warn,
            Verbosity::Verbose => log::LevelFilter::Debug,
        }
    }
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::Normal
    }
}

/// The application a context belongs to: its namespace tree and the hook
/// registry built from it
#[derive(Debug, Clone)]
pub struct AppState {
    pub namespace: Arc<Namespace>,
    pub registry: Arc<HookRegistry>,
}

impl AppState {
    /// Take ownership of a namespace tree and index it for hook lookups
    pub fn new(namespace: Namespace) -> Self {
        let registry = HookRegistry::build(&namespace);
        AppState {
            namespace: Arc::new(namespace),
            registry: Arc::new(registry),
        }
    }
}

/// Configuration visible to tasks
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub app: AppState,
    pub settings: Arc<Config>,
}

/// A hooked peer that failed during a cascade
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookWarning {
    /// Namespace the peer was found in
    pub namespace: String,

    /// Peer task name
    pub task: String,

    /// Rendered error
    pub message: String,
}

impl fmt::Display for HookWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Failed running subtask {}.{}: {}.",
            self.namespace, self.task, self.message
        )
    }
}

/// Behaviour shared by every kind of execution context.
///
/// Plain and remote contexts expose the same key store, so the result slot
/// works the same way for both.
pub trait TaskContext {
    fn config(&self) -> &RunConfig;

    fn get(&self, key: &str) -> Option<&Value>;

    fn get_mut(&mut self, key: &str) -> Option<&mut Value>;

    fn set(&mut self, key: &str, value: Value);

    fn remove(&mut self, key: &str) -> Option<Value>;

    /// Warnings recorded so far
    fn warnings(&self) -> &[HookWarning];

    fn record_warning(&mut self, warning: HookWarning);

    /// Current value of the result slot
    fn result(&self) -> Option<&Value> {
        self.get(RESULT_KEY)
    }

    /// Create the result slot as an empty mapping unless it already exists
    fn ensure_result(&mut self) {
        if self.get(RESULT_KEY).is_none() {
            self.set(RESULT_KEY, empty_result());
        }
    }

    /// Merge a task return value into the result slot
    fn merge_result(&mut self, value: Value) {
        match self.get_mut(RESULT_KEY) {
            Some(acc) => merge_result(acc, value),
            None => {
                let mut acc = empty_result();
                merge_result(&mut acc, value);
                self.set(RESULT_KEY, acc);
            }
        }
    }

    /// Root of the namespace tree
    fn root_namespace(&self) -> &Namespace {
        &self.config().app.namespace
    }

    /// Direct child collection of the root namespace
    fn find_namespace(&self, name: &str) -> Option<&Namespace> {
        self.root_namespace().collection(name)
    }
}

/// Execution context that tracks state during a task invocation
#[derive(Debug, Clone)]
pub struct Context {
    config: RunConfig,

    /// Arbitrary values shared between tasks (the result slot lives here)
    pub vars: HashMap<String, Value>,

    /// Hook failures seen during this invocation
    pub warnings: Vec<HookWarning>,

    /// Verbosity level
    pub verbosity: Verbosity,
}

impl Context {
    /// Create a context for an application with default settings
    pub fn new(app: AppState) -> Self {
        Context {
            config: RunConfig {
                app,
                settings: Arc::new(Config::default()),
            },
            vars: HashMap::new(),
            warnings: Vec::new(),
            verbosity: Verbosity::Normal,
        }
    }

    /// Use specific settings
    pub fn with_settings(mut self, settings: Arc<Config>) -> Self {
        self.config.settings = settings;
        self
    }

    /// Set verbosity level
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set a single variable
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// A context sharing this one's configuration but none of its state
    pub fn fresh(&self) -> Self {
        Context {
            config: self.config.clone(),
            vars: HashMap::new(),
            warnings: Vec::new(),
            verbosity: self.verbosity,
        }
    }
}

impl TaskContext for Context {
    fn config(&self) -> &RunConfig {
        &self.config
    }

    fn get(&self, key: &str) -> Option<&Value> {
        self.vars.get(key)
    }

    fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.vars.get_mut(key)
    }

    fn set(&mut self, key: &str, value: Value) {
        self.vars.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) -> Option<Value> {
        self.vars.remove(key)
    }

    fn warnings(&self) -> &[HookWarning] {
        &self.warnings
    }

    fn record_warning(&mut self, warning: HookWarning) {
        self.warnings.push(warning);
    }
}

/// Context bound to a remote host.
///
/// Connecting and running commands is left to the caller; this type only
/// carries the host details alongside a regular [`Context`].
#[derive(Debug, Clone)]
pub struct Connection {
    pub host: String,
    pub user: Option<String>,
    pub port: u16,
    context: Context,
}

impl Connection {
    pub fn new(host: impl Into<String>, context: Context) -> Self {
        Connection {
            host: host.into(),
            user: None,
            port: 22,
            context,
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// `user@host:port` form of the connection target
    pub fn target(&self) -> String {
        match &self.user {
            Some(user) => format!("{}@{}:{}", user, self.host, self.port),
            None => format!("{}:{}", self.host, self.port),
        }
    }

    pub fn into_context(self) -> Context {
        self.context
    }
}

impl TaskContext for Connection {
    fn config(&self) -> &RunConfig {
        self.context.config()
    }

    fn get(&self, key: &str) -> Option<&Value> {
        self.context.get(key)
    }

    fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.context.get_mut(key)
    }

    fn set(&mut self, key: &str, value: Value) {
        self.context.set(key, value);
    }

    fn remove(&mut self, key: &str) -> Option<Value> {
        self.context.remove(key)
    }

    fn warnings(&self) -> &[HookWarning] {
        self.context.warnings()
    }

    fn record_warning(&mut self, warning: HookWarning) {
        self.context.record_warning(warning);
    }
}
