use crate::agent::command::AgentCommand;
use crate::agent::dispatch::{CancelToken, DispatchError, ProcessExecutor};
use crate::model::ProcessOutcome;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

/// Write an executable `/bin/sh` script and return its path.
#[cfg(unix)]
pub(crate) fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

pub(crate) fn outcome(exit_code: i32, stdout: &str, stderr: &str) -> ProcessOutcome {
    ProcessOutcome::new(
        exit_code,
        stdout.to_string(),
        stderr.to_string(),
        Duration::from_millis(5),
    )
}

/// Process executor double that records commands instead of spawning them.
pub(crate) struct RecordingExecutor {
    response: Box<dyn Fn(&AgentCommand) -> Result<ProcessOutcome, DispatchError> + Send + Sync>,
    commands: Mutex<Vec<AgentCommand>>,
}

impl RecordingExecutor {
    /// Every run returns a copy of `outcome`.
    pub(crate) fn returning(outcome: ProcessOutcome) -> Self {
        Self::with(move |_| Ok(outcome.clone()))
    }

    /// Every run fails to spawn with `NotFound`.
    pub(crate) fn not_found() -> Self {
        Self::with(|command| {
            Err(DispatchError::Spawn {
                program: command.program().to_string(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
        })
    }

    pub(crate) fn with<F>(response: F) -> Self
    where
        F: Fn(&AgentCommand) -> Result<ProcessOutcome, DispatchError> + Send + Sync + 'static,
    {
        Self {
            response: Box::new(response),
            commands: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn spawn_count(&self) -> usize {
        self.commands.lock().unwrap().len()
    }

    pub(crate) fn commands(&self) -> Vec<AgentCommand> {
        self.commands.lock().unwrap().clone()
    }
}

impl ProcessExecutor for RecordingExecutor {
    fn run(
        &self,
        command: &AgentCommand,
        _timeout: Duration,
        _cancel: &CancelToken,
    ) -> Result<ProcessOutcome, DispatchError> {
        self.commands.lock().unwrap().push(command.clone());
        (self.response)(command)
    }
}
