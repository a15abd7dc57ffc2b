// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory shell for unit tests.
//!
//! Commands are matched by their exact command line. Unknown commands
//! succeed with empty output after no delay.

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::ProcessError;

use super::{CommandOutput, Invocation, Shell};

/// Scripted behaviour for one command line.
#[derive(Debug, Clone, Default)]
pub(crate) struct Script {
    delay: Duration,
    exit_code: Option<i32>,
    stdout: String,
    stderr: String,
    unspawnable: bool,
}

impl Script {
    pub(crate) fn ok() -> Self {
        Self::exit(0)
    }

    pub(crate) fn exit(code: i32) -> Self {
        Self {
            exit_code: Some(code),
            ..Self::default()
        }
    }

    pub(crate) fn unspawnable() -> Self {
        Self {
            unspawnable: true,
            ..Self::default()
        }
    }

    pub(crate) fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn stdout(mut self, stdout: &str) -> Self {
        self.stdout = stdout.to_string();
        self
    }

    pub(crate) fn stderr(mut self, stderr: &str) -> Self {
        self.stderr = stderr.to_string();
        self
    }
}

#[derive(Debug, Default)]
pub(crate) struct ScriptedShell {
    scripts: Mutex<HashMap<String, Script>>,
    invocations: Mutex<Vec<Invocation>>,
    finished: Mutex<Vec<String>>,
    running: AtomicUsize,
    peak: AtomicUsize,
}

impl ScriptedShell {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn script(self, command: &str, script: Script) -> Self {
        self.scripts.lock().insert(command.to_string(), script);
        self
    }

    /// Replaces a script after construction.
    pub(crate) fn set(&self, command: &str, script: Script) {
        self.scripts.lock().insert(command.to_string(), script);
    }

    /// Every invocation started so far, in start order.
    pub(crate) fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().clone()
    }

    /// Number of times `command` was started.
    pub(crate) fn calls(&self, command: &str) -> usize {
        self.invocations
            .lock()
            .iter()
            .filter(|inv| inv.command() == command)
            .count()
    }

    /// Command lines in completion order.
    pub(crate) fn finished(&self) -> Vec<String> {
        self.finished.lock().clone()
    }

    pub(crate) fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Shell for ScriptedShell {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ProcessError> {
        let script = self
            .scripts
            .lock()
            .get(invocation.command())
            .cloned()
            .unwrap_or_else(Script::ok);
        self.invocations.lock().push(invocation.clone());

        if script.unspawnable {
            return Err(ProcessError::Spawn {
                command: invocation.command().to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "scripted spawn failure"),
            });
        }

        let running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(running, Ordering::SeqCst);

        if !script.delay.is_zero() {
            tokio::time::sleep(script.delay).await;
        }

        self.running.fetch_sub(1, Ordering::SeqCst);
        self.finished.lock().push(invocation.command().to_string());

        Ok(CommandOutput {
            exit_code: script.exit_code,
            stdout: script.stdout,
            stderr: script.stderr,
        })
    }
}
