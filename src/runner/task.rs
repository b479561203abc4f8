//! Task definitions
//!
//! A [`Task`] wraps a body closure together with everything the command line
//! front end and the invoker need to know about it: its parameters, flag and
//! help customizations, pre/post tasks and its hook policy. Tasks are built
//! once through [`TaskBuilder`] and never change afterwards.

use crate::error::{ConfigError, ConfigResult};
use crate::runner::{TaskArgs, TaskContext};
use serde_yaml::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Signature of a task body
pub type TaskBody = Arc<dyn Fn(&mut dyn TaskContext, &TaskArgs) -> anyhow::Result<Value> + Send + Sync>;

/// Whether a task starts hook cascades or only takes part in them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Runs every same-named peer after itself
    Core,
    /// Never cascades; may be run as a peer of a core task
    Plugin,
}

/// How a task participates in hook cascades
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookPolicy {
    pub kind: TaskKind,

    /// Never run this task as somebody else's peer
    pub opt_out: bool,
}

impl HookPolicy {
    /// Map the tri-state `hookable` option onto a policy.
    ///
    /// | hookable      | kind   | opt_out |
    /// |---------------|--------|---------|
    /// | `Some(true)`  | Core   | false   |
    /// | `Some(false)` | Plugin | true    |
    /// | `None`        | Plugin | false   |
    pub fn from_hookable(hookable: Option<bool>) -> Self {
        match hookable {
            Some(true) => HookPolicy {
                kind: TaskKind::Core,
                opt_out: false,
            },
            Some(false) => HookPolicy {
                kind: TaskKind::Plugin,
                opt_out: true,
            },
            None => HookPolicy {
                kind: TaskKind::Plugin,
                opt_out: false,
            },
        }
    }

    /// Whether calling this task triggers a cascade
    pub fn cascades(&self) -> bool {
        self.kind == TaskKind::Core
    }

    /// Whether this task may run as a peer in another task's cascade
    pub fn accepts_hooks(&self) -> bool {
        !self.opt_out
    }
}

impl Default for HookPolicy {
    fn default() -> Self {
        Self::from_hookable(None)
    }
}

/// A declared task parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,

    /// Default value; parameters without one are required
    pub default: Option<Value>,
}

impl Param {
    pub fn required(name: impl Into<String>) -> Self {
        Param {
            name: name.into(),
            default: None,
        }
    }

    pub fn with_default(name: impl Into<String>, default: impl Into<Value>) -> Self {
        Param {
            name: name.into(),
            default: Some(default.into()),
        }
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// Runtime task representation
#[derive(Clone)]
pub struct Task {
    /// Task name, unique within its namespace
    pub name: String,

    /// Alternative names the task can be called by
    pub aliases: Vec<String>,

    /// Documentation block; parameter descriptions are read from it
    pub doc: Option<String>,

    /// Declared parameters (the context is implicit)
    pub params: Vec<Param>,

    /// Parameters taken positionally; `None` means "those without a default"
    pub positional: Option<Vec<String>>,

    /// Parameters whose value may be omitted on the command line
    pub optional: Vec<String>,

    /// Parameters that collect repeated flags into a list
    pub iterable: Vec<String>,

    /// Parameters that count flag occurrences
    pub incrementable: Vec<String>,

    /// Whether this is its collection's default task
    pub is_default: bool,

    /// Whether short flags are derived automatically
    pub auto_shortflags: bool,

    /// Declared help text, keyed by parameter or flag name
    pub help: HashMap<String, String>,

    /// Explicit command-line names per parameter
    pub flags: HashMap<String, Vec<String>>,

    /// Tasks run before this one
    pub pre: Vec<Arc<Task>>,

    /// Tasks run after this one
    pub post: Vec<Arc<Task>>,

    /// Print the result when run from the command line
    pub autoprint: bool,

    pub hooks: HookPolicy,

    body: TaskBody,
}

impl Task {
    /// Start building a task from a body function name
    pub fn builder(name: impl Into<String>) -> TaskBuilder {
        TaskBuilder::new(name)
    }

    /// Look up a declared parameter
    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Whether a parameter is taken positionally
    pub fn is_positional(&self, name: &str) -> bool {
        match &self.positional {
            Some(names) => names.iter().any(|n| n == name),
            None => self.param(name).map(Param::is_required).unwrap_or(false),
        }
    }

    /// First line of the documentation block
    pub fn summary(&self) -> Option<&str> {
        self.doc
            .as_deref()
            .and_then(|doc| doc.lines().map(str::trim).find(|line| !line.is_empty()))
    }

    /// Whether `name` is this task's name or one of its aliases
    pub fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|a| a == name)
    }

    pub(crate) fn body(&self) -> &TaskBody {
        &self.body
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("params", &self.params)
            .field("flags", &self.flags)
            .field("hooks", &self.hooks)
            .field("pre", &self.pre.iter().map(|t| &t.name).collect::<Vec<_>>())
            .field("post", &self.post.iter().map(|t| &t.name).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Task`], taking the same options a task decorator would
pub struct TaskBuilder {
    fn_name: String,
    name: Option<String>,
    aliases: Vec<String>,
    doc: Option<String>,
    params: Vec<Param>,
    positional: Option<Vec<String>>,
    optional: Vec<String>,
    iterable: Vec<String>,
    incrementable: Vec<String>,
    is_default: bool,
    auto_shortflags: bool,
    help: HashMap<String, String>,
    flags: HashMap<String, Vec<String>>,
    pre: Vec<Arc<Task>>,
    post: Vec<Arc<Task>>,
    autoprint: bool,
    hooks: HookPolicy,
}

impl TaskBuilder {
    pub fn new(fn_name: impl Into<String>) -> Self {
        TaskBuilder {
            fn_name: fn_name.into(),
            name: None,
            aliases: Vec::new(),
            doc: None,
            params: Vec::new(),
            positional: None,
            optional: Vec::new(),
            iterable: Vec::new(),
            incrementable: Vec::new(),
            is_default: false,
            auto_shortflags: true,
            help: HashMap::new(),
            flags: HashMap::new(),
            pre: Vec::new(),
            post: Vec::new(),
            autoprint: false,
            hooks: HookPolicy::default(),
        }
    }

    /// Name used in the namespace instead of the function name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Declare a required parameter
    pub fn param(mut self, name: impl Into<String>) -> Self {
        self.params.push(Param::required(name));
        self
    }

    /// Declare a parameter with a default value
    pub fn param_default(mut self, name: impl Into<String>, default: impl Into<Value>) -> Self {
        self.params.push(Param::with_default(name, default));
        self
    }

    pub fn positional<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.positional = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn optional(mut self, name: impl Into<String>) -> Self {
        self.optional.push(name.into());
        self
    }

    pub fn iterable(mut self, name: impl Into<String>) -> Self {
        self.iterable.push(name.into());
        self
    }

    pub fn incrementable(mut self, name: impl Into<String>) -> Self {
        self.incrementable.push(name.into());
        self
    }

    /// Make this the default task of its collection
    pub fn default(mut self, is_default: bool) -> Self {
        self.is_default = is_default;
        self
    }

    pub fn auto_shortflags(mut self, enabled: bool) -> Self {
        self.auto_shortflags = enabled;
        self
    }

    /// Help text for a parameter (or for one of its flag names)
    pub fn help(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.help.insert(name.into(), text.into());
        self
    }

    /// Replace the command-line names of a parameter, e.g. `as_json` -> `--json`
    pub fn flags<I, S>(mut self, param: impl Into<String>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.flags
            .insert(param.into(), names.into_iter().map(Into::into).collect());
        self
    }

    pub fn pre(mut self, task: Arc<Task>) -> Self {
        self.pre.push(task);
        self
    }

    pub fn post(mut self, task: Arc<Task>) -> Self {
        self.post.push(task);
        self
    }

    pub fn autoprint(mut self, enabled: bool) -> Self {
        self.autoprint = enabled;
        self
    }

    /// Tri-state hook option; see [`HookPolicy::from_hookable`]
    pub fn hookable(mut self, hookable: Option<bool>) -> Self {
        self.hooks = HookPolicy::from_hookable(hookable);
        self
    }

    pub fn kind(mut self, kind: TaskKind) -> Self {
        self.hooks.kind = kind;
        self
    }

    pub fn hook_opt_out(mut self, opt_out: bool) -> Self {
        self.hooks.opt_out = opt_out;
        self
    }

    /// Attach the body and finish the task
    pub fn build<F>(self, body: F) -> ConfigResult<Arc<Task>>
    where
        F: Fn(&mut dyn TaskContext, &TaskArgs) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        let name = self.name.unwrap_or(self.fn_name);

        check_declared(&name, &self.params, "flags", self.flags.keys())?;
        check_declared(&name, &self.params, "positional", self.positional.iter().flatten())?;
        check_declared(&name, &self.params, "optional", &self.optional)?;
        check_declared(&name, &self.params, "iterable", &self.iterable)?;
        check_declared(&name, &self.params, "incrementable", &self.incrementable)?;

        // positional parameters have no flag names to replace
        let positional = |param: &str| match &self.positional {
            Some(names) => names.iter().any(|n| n == param),
            None => self.params.iter().any(|p| p.name == param && p.is_required()),
        };
        if let Some(param) = self.flags.keys().find(|param| positional(param.as_str())) {
            return Err(ConfigError::PositionalFlags {
                task: name,
                param: param.clone(),
            });
        }

        Ok(Arc::new(Task {
            name,
            aliases: self.aliases,
            doc: self.doc,
            params: self.params,
            positional: self.positional,
            optional: self.optional,
            iterable: self.iterable,
            incrementable: self.incrementable,
            is_default: self.is_default,
            auto_shortflags: self.auto_shortflags,
            help: self.help,
            flags: self.flags,
            pre: self.pre,
            post: self.post,
            autoprint: self.autoprint,
            hooks: self.hooks,
            body: Arc::new(body),
        }))
    }
}

/// Every parameter named by a task option must be declared
fn check_declared<'a>(
    task: &str,
    params: &[Param],
    option: &'static str,
    names: impl IntoIterator<Item = &'a String>,
) -> ConfigResult<()> {
    for name in names {
        if !params.iter().any(|p| &p.name == name) {
            return Err(ConfigError::UnknownParameter {
                task: task.to_string(),
                option,
                param: name.clone(),
            });
        }
    }
    Ok(())
}

/// Start declaring a task, decorator style:
///
/// ```
/// use taskhook::task;
/// use serde_yaml::Value;
///
/// let sync = task("sync")
///     .param_default("as_json", false)
///     .flags("as_json", ["--json"])
///     .hookable(Some(true))
///     .build(|_ctx, _args| Ok(Value::Null))
///     .unwrap();
/// assert!(sync.hooks.cascades());
/// ```
pub fn task(fn_name: impl Into<String>) -> TaskBuilder {
    TaskBuilder::new(fn_name)
}
