// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shell backends that actually execute command lines.

use std::fmt;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::ProcessError;

use super::{CommandOutput, Invocation};

/// Interpreter used by [`SystemShell`].
const SHELL: &str = "sh";

/// Backend that runs a single invocation to completion.
///
/// Implementations report spawn failures as [`ProcessError::Spawn`] and
/// return a [`CommandOutput`] for everything that ran, whatever its exit
/// status.
#[async_trait]
pub trait Shell: Send + Sync + fmt::Debug {
    /// Runs the invocation and collects its output.
    ///
    /// # Errors
    ///
    /// Returns `ProcessError::Spawn` if the process could not be started.
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ProcessError>;
}

/// Runs command lines through `sh -c`.
///
/// Extra environment entries are added on top of the inherited
/// environment. Processes are never killed once started, even if the caller
/// stops waiting for them.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemShell;

#[async_trait]
impl Shell for SystemShell {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ProcessError> {
        let output = Command::new(SHELL)
            .arg("-c")
            .arg(invocation.command())
            .envs(invocation.env().iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| ProcessError::Spawn {
                command: invocation.command().to_string(),
                source,
            })?;

        Ok(CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
