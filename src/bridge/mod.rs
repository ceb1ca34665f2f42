//! Tool-facing entry point.
//!
//! `Bridge` is the seam between an outer protocol layer (the stdio server or
//! the CLI) and the core: it resolves the runner, builds the request, runs
//! it with the configured timeout and output limit, and records audit
//! events. Every failure leaves here as a classified `BridgeError`.

mod labels;
mod payload;

#[cfg(test)]
mod tests;

pub use labels::assign_labels;
pub use payload::{AgentTask, BatchResponse, TaskOutcome, TaskResult, ToolError};

use crate::agent::factory::registrations;
use crate::agent::{
    AgentAvailability, CancelToken, ExecuteOptions, ProcessExecutor, RunnerFactory,
    SubprocessExecutor, detect, execute_with,
};
use crate::config::Config;
use crate::error::{BridgeError, Result};
use crate::events::{Event, EventAction, EventLog};
use crate::model::{InvocationRequest, Options, StructuredResult};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

/// Per-call overrides for [`Bridge::invoke_with`].
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Overrides the configured timeout.
    pub timeout: Option<Duration>,
    pub cancel: CancelToken,
    /// Batch label recorded in audit events.
    pub label: Option<String>,
}

/// Entry point used by the server and the CLI.
pub struct Bridge {
    config: Config,
    factory: RunnerFactory,
    executor: Arc<dyn ProcessExecutor>,
    events: Option<EventLog>,
}

impl Bridge {
    /// Bridge running agents as real subprocesses.
    pub fn new(config: Config) -> Self {
        Self::with_executor(config, Arc::new(SubprocessExecutor))
    }

    pub fn with_executor(config: Config, executor: Arc<dyn ProcessExecutor>) -> Self {
        let factory = RunnerFactory::new(&config);
        let events = config.event_log.as_ref().map(EventLog::new);
        Self {
            config,
            factory,
            executor,
            events,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run one prompt with the configured timeout.
    pub fn invoke(&self, agent: &str, prompt: &str, options: Options) -> Result<StructuredResult> {
        self.invoke_with(agent, prompt, options, &CallOptions::default())
    }

    /// Run one prompt with explicit timeout, cancellation and label.
    ///
    /// # Returns
    ///
    /// * `Ok(StructuredResult)` - The agent's normalized answer
    /// * `Err(BridgeError)` - Unknown agent, bad request, missing binary,
    ///   non-zero exit, timeout or cancellation
    pub fn invoke_with(
        &self,
        agent: &str,
        prompt: &str,
        options: Options,
        call: &CallOptions,
    ) -> Result<StructuredResult> {
        let id = self.factory.agent_id(agent)?;
        let request = InvocationRequest::with_options(id, prompt, options)?;

        let timeout = call.timeout.unwrap_or_else(|| self.config.timeout());
        if timeout.is_zero() {
            return Err(
                BridgeError::invalid_key("timeout_seconds", "timeout must be greater than 0")
                    .for_agent(id),
            );
        }

        // A cancelled call never spawns, so skip the version check
        let runner = if call.cancel.is_cancelled() {
            self.factory.create(agent)?
        } else {
            self.factory.create_resolved(id, self.executor.as_ref())?
        };

        let label = call.label.as_deref();
        self.record(
            Event::new(EventAction::InvokeStart, id)
                .with_label(label)
                .with_details(json!({
                    "timeout_seconds": timeout.as_secs_f64(),
                    "options": request.options().keys().collect::<Vec<_>>(),
                    "prompt_chars": request.prompt().chars().count(),
                })),
        );

        let started = Instant::now();
        let execute = ExecuteOptions::new(timeout)
            .with_output_limit(self.config.output_limit_bytes)
            .with_cancel(call.cancel.clone());
        let result = execute_with(runner.as_ref(), self.executor.as_ref(), &request, &execute);
        let duration_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(structured) => self.record(
                Event::new(EventAction::InvokeComplete, id)
                    .with_label(label)
                    .with_details(json!({
                        "duration_ms": duration_ms,
                        "exit_code": 0,
                        "format": structured.format,
                        "truncated": structured.truncation.is_some(),
                    })),
            ),
            Err(e) => {
                let exit_code = match e {
                    BridgeError::AgentExecution { exit_code, .. } => Some(*exit_code),
                    _ => None,
                };
                self.record(
                    Event::new(EventAction::InvokeFailed, id)
                        .with_label(label)
                        .with_details(json!({
                            "duration_ms": duration_ms,
                            "kind": e.kind(),
                            "exit_code": exit_code,
                        })),
                );
            }
        }

        result
    }

    /// Run independent tasks on a bounded pool of threads.
    ///
    /// Results come back in input order. A failing task yields an error
    /// entry and never affects the others. `max_concurrency` defaults to the
    /// configured value; zero is treated as one.
    pub fn batch(
        &self,
        tasks: &[AgentTask],
        max_concurrency: Option<usize>,
        cancel: &CancelToken,
    ) -> BatchResponse {
        let labels = assign_labels(tasks);
        let workers = max_concurrency
            .unwrap_or(self.config.max_concurrency)
            .clamp(1, tasks.len().max(1));

        tracing::debug!(tasks = tasks.len(), workers, "starting batch");

        let next = AtomicUsize::new(0);
        let mut slots: Vec<Option<TaskResult>> = vec![None; tasks.len()];
        let (tx, rx) = mpsc::channel();

        thread::scope(|scope| {
            for _ in 0..workers {
                let tx = tx.clone();
                let next = &next;
                let labels = &labels;
                scope.spawn(move || {
                    loop {
                        let index = next.fetch_add(1, Ordering::SeqCst);
                        let Some(task) = tasks.get(index) else {
                            break;
                        };
                        let result = self.run_task(task, &labels[index], cancel);
                        if tx.send((index, result)).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(tx);

            for (index, result) in rx {
                slots[index] = Some(result);
            }
        });

        BatchResponse {
            results: slots.into_iter().flatten().collect(),
        }
    }

    fn run_task(&self, task: &AgentTask, label: &str, cancel: &CancelToken) -> TaskResult {
        let call = CallOptions {
            timeout: None,
            cancel: cancel.clone(),
            label: Some(label.to_string()),
        };
        let outcome = match self.invoke_with(&task.agent, &task.prompt, task.merged_options(), &call)
        {
            Ok(result) => TaskOutcome::Result(result),
            Err(e) => {
                tracing::debug!(label, kind = %e.kind(), "batch task failed: {}", e);
                TaskOutcome::Error(ToolError::from(&e))
            }
        };
        TaskResult {
            label: label.to_string(),
            agent: task.agent.clone(),
            outcome,
        }
    }

    /// Names of every registered agent.
    pub fn list_agents(&self) -> Vec<String> {
        self.factory.list_agents()
    }

    /// Locate every registered agent CLI on this host and read its version.
    pub fn detect_agents(&self) -> Vec<AgentAvailability> {
        registrations()
            .iter()
            .map(|registration| {
                detect(
                    registration,
                    &self.factory.settings(registration.id),
                    self.executor.as_ref(),
                )
            })
            .collect()
    }

    fn record(&self, event: Event) {
        if let Some(log) = &self.events {
            log.record(&event);
        }
    }
}
