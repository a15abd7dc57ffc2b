// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shell command execution.
//!
//! The [`CommandRunner`] is the only place processes are started. It runs in
//! one of two modes, chosen at construction:
//!
//! - [`ExecutionMode::Concurrent`]: every submission starts immediately.
//! - [`ExecutionMode::Serialized`]: submissions go into a FIFO drained by a
//!   single worker, so at most one command is in flight for the whole
//!   runner. Use it when commands share an external side effect (e.g. two
//!   devices woken by the same broadcast packet).
//!
//! A submission returns a [`Completion`] that resolves exactly once. Dropping
//! it does not cancel the command: the process runs to the end and its
//! result is discarded.
//!
//! # Examples
//!
//! ```no_run
//! use cmdswitch_lib::runner::{CommandRunner, ExecutionMode, Invocation};
//!
//! # async fn example() -> Result<(), cmdswitch_lib::error::ProcessError> {
//! let runner = CommandRunner::new(ExecutionMode::Serialized);
//!
//! let output = runner.submit(Invocation::new("echo 42")).await?;
//! assert!(output.success());
//! assert_eq!(output.stdout.trim(), "42");
//! # Ok(())
//! # }
//! ```

mod queue;
#[cfg(test)]
pub(crate) mod scripted;
mod shell;

pub use shell::{Shell, SystemShell};

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::error::ProcessError;

use queue::CommandQueue;

/// How a [`CommandRunner`] schedules submissions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Each submission runs immediately, in parallel with others.
    #[default]
    Concurrent,
    /// Submissions run one at a time in submission order.
    Serialized,
}

/// A command line plus the extra environment it runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    command: String,
    env: Vec<(String, String)>,
}

impl Invocation {
    /// Creates an invocation with no extra environment.
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            env: Vec::new(),
        }
    }

    /// Adds an environment variable.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Returns the command line.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Returns the extra environment entries.
    #[must_use]
    pub fn env(&self) -> &[(String, String)] {
        &self.env
    }
}

/// Output of a command that ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when terminated by a signal.
    pub exit_code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl CommandOutput {
    /// Returns `true` if the command exited with status 0.
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Turns an unsuccessful exit into [`ProcessError::Exited`].
    ///
    /// # Errors
    ///
    /// Returns `ProcessError::Exited` if the exit status is not 0.
    pub fn check(self, command: &str) -> Result<Self, ProcessError> {
        if self.success() {
            Ok(self)
        } else {
            Err(ProcessError::Exited {
                command: command.to_string(),
                code: self.exit_code,
                stderr: self.stderr,
            })
        }
    }
}

/// Pending result of a submitted command.
///
/// Resolves once with the command's output, or with
/// [`ProcessError::Abandoned`] if the runner went away first.
#[derive(Debug)]
#[must_use = "a completion does nothing unless awaited; dropping it discards the result"]
pub struct Completion {
    receiver: oneshot::Receiver<Result<CommandOutput, ProcessError>>,
    command: String,
}

impl Future for Completion {
    type Output = Result<CommandOutput, ProcessError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &mut *self;
        match Pin::new(&mut this.receiver).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(ProcessError::Abandoned {
                command: std::mem::take(&mut this.command),
            })),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Executes shell commands, concurrently or through a FIFO.
///
/// Cloning a runner is cheap; clones share the same queue.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    shell: Arc<dyn Shell>,
    queue: Option<CommandQueue>,
}

impl CommandRunner {
    /// Creates a runner backed by `sh -c`.
    ///
    /// # Panics
    ///
    /// In serialized mode the queue worker is spawned immediately, so this
    /// must be called from within a tokio runtime.
    #[must_use]
    pub fn new(mode: ExecutionMode) -> Self {
        Self::with_shell(mode, Arc::new(SystemShell))
    }

    /// Creates a runner backed by a custom shell.
    ///
    /// # Panics
    ///
    /// In serialized mode the queue worker is spawned immediately, so this
    /// must be called from within a tokio runtime.
    #[must_use]
    pub fn with_shell(mode: ExecutionMode, shell: Arc<dyn Shell>) -> Self {
        let queue = match mode {
            ExecutionMode::Concurrent => None,
            ExecutionMode::Serialized => Some(CommandQueue::spawn(Arc::clone(&shell))),
        };
        Self { shell, queue }
    }

    /// Returns the execution mode.
    #[must_use]
    pub fn mode(&self) -> ExecutionMode {
        if self.queue.is_some() {
            ExecutionMode::Serialized
        } else {
            ExecutionMode::Concurrent
        }
    }

    /// Submits an invocation.
    ///
    /// The command starts (or is queued) right away, whether or not the
    /// returned [`Completion`] is awaited.
    pub fn submit(&self, invocation: Invocation) -> Completion {
        let (reply, receiver) = oneshot::channel();
        let command = invocation.command().to_string();

        match &self.queue {
            Some(queue) => queue.push(invocation, reply),
            None => {
                let shell = Arc::clone(&self.shell);
                tokio::spawn(async move {
                    let result = shell.run(&invocation).await;
                    let _ = reply.send(result);
                });
            }
        }

        Completion { receiver, command }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::scripted::{Script, ScriptedShell};
    use super::*;

    #[test]
    fn output_check_maps_failure() {
        let output = CommandOutput {
            exit_code: Some(3),
            stdout: String::new(),
            stderr: "boom".to_string(),
        };

        let err = output.check("false").unwrap_err();
        assert!(matches!(
            err,
            ProcessError::Exited { code: Some(3), ref stderr, .. } if stderr == "boom"
        ));
    }

    #[test]
    fn output_signal_is_not_success() {
        let output = CommandOutput {
            exit_code: None,
            ..CommandOutput::default()
        };
        assert!(!output.success());
    }

    #[test]
    fn invocation_env() {
        let invocation = Invocation::new("dim").with_env("HB_BRIGHTNESS", "40");
        assert_eq!(invocation.command(), "dim");
        assert_eq!(
            invocation.env(),
            &[("HB_BRIGHTNESS".to_string(), "40".to_string())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_mode_overlaps_commands() {
        let shell = Arc::new(
            ScriptedShell::new()
                .script("a", Script::ok().after(Duration::from_secs(2)))
                .script("b", Script::ok().after(Duration::from_secs(2))),
        );
        let runner = CommandRunner::with_shell(ExecutionMode::Concurrent, shell.clone());
        assert_eq!(runner.mode(), ExecutionMode::Concurrent);

        let first = runner.submit(Invocation::new("a"));
        let second = runner.submit(Invocation::new("b"));
        let (first, second) = tokio::join!(first, second);

        assert!(first.unwrap().success());
        assert!(second.unwrap().success());
        assert_eq!(shell.peak_concurrency(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn serialized_mode_runs_one_at_a_time_in_order() {
        let shell = Arc::new(
            ScriptedShell::new()
                .script("slow", Script::ok().after(Duration::from_secs(3)))
                .script("fast", Script::ok().after(Duration::from_millis(10)))
                .script("medium", Script::ok().after(Duration::from_secs(1))),
        );
        let runner = CommandRunner::with_shell(ExecutionMode::Serialized, shell.clone());
        assert_eq!(runner.mode(), ExecutionMode::Serialized);

        let completions: Vec<_> = ["slow", "fast", "medium"]
            .into_iter()
            .map(|cmd| runner.submit(Invocation::new(cmd)))
            .collect();
        for completion in completions {
            completion.await.unwrap();
        }

        assert_eq!(shell.peak_concurrency(), 1);
        assert_eq!(shell.finished(), vec!["slow", "fast", "medium"]);
    }

    #[tokio::test(start_paused = true)]
    async fn serialized_queue_survives_failures() {
        let shell = Arc::new(
            ScriptedShell::new()
                .script("broken", Script::unspawnable())
                .script("failing", Script::exit(1)),
        );
        let runner = CommandRunner::with_shell(ExecutionMode::Serialized, shell.clone());

        let broken = runner.submit(Invocation::new("broken"));
        let failing = runner.submit(Invocation::new("failing"));
        let next = runner.submit(Invocation::new("next"));

        assert!(matches!(broken.await, Err(ProcessError::Spawn { .. })));
        assert!(!failing.await.unwrap().success());
        assert!(next.await.unwrap().success());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_completion_still_runs_command() {
        let shell = Arc::new(
            ScriptedShell::new().script("late", Script::ok().after(Duration::from_secs(5))),
        );
        let runner = CommandRunner::with_shell(ExecutionMode::Serialized, shell.clone());

        drop(runner.submit(Invocation::new("late")));
        let after = runner.submit(Invocation::new("after")).await.unwrap();

        assert!(after.success());
        assert_eq!(shell.finished(), vec!["late", "after"]);
    }

    #[tokio::test]
    async fn completion_reports_stdout() {
        let shell = Arc::new(ScriptedShell::new().script("probe", Script::ok().stdout("75%\n")));
        let runner = CommandRunner::with_shell(ExecutionMode::Concurrent, shell);

        let output = runner.submit(Invocation::new("probe")).await.unwrap();
        assert_eq!(output.stdout, "75%\n");
    }
}
