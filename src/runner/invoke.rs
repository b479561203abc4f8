//! Task invocation and hook cascades
//!
//! Calling a task runs its body, merges the returned value into the context's
//! result slot and, for core tasks, runs every same-named task registered
//! elsewhere in the namespace tree. A failing peer is reported as a warning;
//! it never aborts the cascade. The caller always gets the merged result.

use crate::error::{InvokeError, InvokeResult};
use crate::runner::{bind_for_peer, bind_strict, CallArgs, HookEntry, HookWarning, Task, TaskContext};
use serde_yaml::Value;
use std::sync::Arc;

impl Task {
    /// Invoke the task.
    ///
    /// Binding errors and body errors of this task are returned as-is; errors
    /// from hooked peers are recorded on the context instead.
    pub fn call(&self, ctx: &mut dyn TaskContext, args: &CallArgs) -> InvokeResult<Value> {
        ctx.ensure_result();

        let bound = bind_strict(&self.name, &self.params, args)?;
        let value = (self.body())(&mut *ctx, &bound).map_err(InvokeError::Task)?;
        log::trace!("Merging result of '{}'", self.name);
        ctx.merge_result(value);

        if self.hooks.cascades() {
            self.run_hooks(ctx, args);
        }

        Ok(ctx.result().cloned().unwrap_or(Value::Null))
    }

    /// Run every same-named peer, in registry order
    fn run_hooks(&self, ctx: &mut dyn TaskContext, args: &CallArgs) {
        let registry = Arc::clone(&ctx.config().app.registry);

        for HookEntry { namespace, task } in registry.peers(&self.name) {
            if std::ptr::eq(task.as_ref(), self) {
                continue;
            }
            if !task.hooks.accepts_hooks() {
                log::debug!("Skipping hook {}.{}: opted out", namespace, task.name);
                continue;
            }

            log::debug!("Running hook {}.{}", namespace, task.name);
            match task.execute_subtask(&mut *ctx, args) {
                Ok(value) => ctx.merge_result(value),
                Err(err) => {
                    let warning = HookWarning {
                        namespace: namespace.clone(),
                        task: task.name.clone(),
                        message: format!("{:#}", err),
                    };
                    log::warn!("{}", warning);
                    ctx.record_warning(warning);
                }
            }
        }
    }

    /// Run this task's body as a hooked peer, with lenient binding
    fn execute_subtask(&self, ctx: &mut dyn TaskContext, args: &CallArgs) -> anyhow::Result<Value> {
        let bound = bind_for_peer(&self.name, &self.params, args)?;
        (self.body())(&mut *ctx, &bound)
    }
}
