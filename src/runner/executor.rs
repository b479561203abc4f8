//! Running a requested task together with its pre and post tasks

use crate::error::InvokeResult;
use crate::runner::{CallArgs, Context, HookWarning, Task, TaskContext};
use serde_yaml::Value;
use std::sync::Arc;

/// One task to run with its arguments
#[derive(Debug, Clone)]
pub struct Call {
    pub task: Arc<Task>,
    pub args: CallArgs,
}

impl Call {
    pub fn new(task: Arc<Task>, args: CallArgs) -> Self {
        Call { task, args }
    }

    fn same_as(&self, other: &Call) -> bool {
        Arc::ptr_eq(&self.task, &other.task) && self.args == other.args
    }
}

/// What a single call produced
#[derive(Debug, Clone)]
pub struct CallOutcome {
    pub task: String,
    pub result: Value,
    pub warnings: Vec<HookWarning>,
}

/// Outcome of a run, in execution order
#[derive(Debug, Clone, Default)]
pub struct ExecutionReport {
    pub outcomes: Vec<CallOutcome>,
}

impl ExecutionReport {
    /// Outcome of the last call made for `task`
    pub fn outcome(&self, task: &str) -> Option<&CallOutcome> {
        self.outcomes.iter().rev().find(|o| o.task == task)
    }

    /// Every hook warning raised during the run
    pub fn warnings(&self) -> impl Iterator<Item = &HookWarning> {
        self.outcomes.iter().flat_map(|o| o.warnings.iter())
    }
}

/// Expands calls into pre, call, post order and runs them one by one
#[derive(Debug)]
pub struct Executor {
    base: Context,
    dedupe: bool,
}

impl Executor {
    /// Every call gets a fresh copy of `base`
    pub fn new(base: Context) -> Self {
        let dedupe = base.config().settings.tasks.dedupe;
        Executor { base, dedupe }
    }

    /// Override the `tasks.dedupe` setting
    pub fn dedupe(mut self, enabled: bool) -> Self {
        self.dedupe = enabled;
        self
    }

    /// Final call list: each call preceded by its pre tasks and followed by
    /// its post tasks, recursively
    pub fn expand(&self, calls: &[Call]) -> Vec<Call> {
        let mut out = Vec::new();
        for call in calls {
            expand_into(call, &mut out);
        }

        if !self.dedupe {
            return out;
        }

        let mut deduped: Vec<Call> = Vec::with_capacity(out.len());
        for call in out {
            if deduped.iter().any(|seen| seen.same_as(&call)) {
                log::debug!("Skipping duplicate call to '{}'", call.task.name);
                continue;
            }
            deduped.push(call);
        }
        deduped
    }

    /// Run the calls. The first failing call stops the run.
    pub fn execute(&self, calls: &[Call]) -> InvokeResult<ExecutionReport> {
        let mut report = ExecutionReport::default();

        for call in self.expand(calls) {
            let mut ctx = self.base.fresh();
            log::debug!("Running task: {}", call.task.name);
            let result = call.task.call(&mut ctx, &call.args)?;
            report.outcomes.push(CallOutcome {
                task: call.task.name.clone(),
                result,
                warnings: ctx.warnings,
            });
        }

        Ok(report)
    }
}

fn expand_into(call: &Call, out: &mut Vec<Call>) {
    for pre in &call.task.pre {
        expand_into(&Call::new(Arc::clone(pre), CallArgs::new()), out);
    }
    out.push(call.clone());
    for post in &call.task.post {
        expand_into(&Call::new(Arc::clone(post), CallArgs::new()), out);
    }
}
