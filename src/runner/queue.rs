// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! FIFO worker behind the serialized execution mode.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::error::ProcessError;

use super::{CommandOutput, Invocation, Shell};

/// A queued invocation and the slot its result goes to.
struct Job {
    invocation: Invocation,
    reply: oneshot::Sender<Result<CommandOutput, ProcessError>>,
}

/// Handle to the single worker draining queued invocations.
///
/// The worker runs one invocation to completion before taking the next, so
/// submission order is execution order. It exits once every handle is
/// dropped and the queue is empty.
#[derive(Debug, Clone)]
pub(crate) struct CommandQueue {
    sender: mpsc::UnboundedSender<Job>,
}

impl CommandQueue {
    /// Spawns the worker on the current tokio runtime.
    pub(crate) fn spawn(shell: Arc<dyn Shell>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(drain(shell, receiver));
        Self { sender }
    }

    /// Appends an invocation to the queue.
    pub(crate) fn push(
        &self,
        invocation: Invocation,
        reply: oneshot::Sender<Result<CommandOutput, ProcessError>>,
    ) {
        // A closed queue drops the reply, which surfaces as `Abandoned`.
        let _ = self.sender.send(Job { invocation, reply });
    }
}

async fn drain(shell: Arc<dyn Shell>, mut receiver: mpsc::UnboundedReceiver<Job>) {
    tracing::debug!("command queue started");

    while let Some(job) = receiver.recv().await {
        tracing::debug!(command = %job.invocation.command(), "running queued command");
        let result = shell.run(&job.invocation).await;
        // The caller may have stopped waiting (deadline elapsed).
        let _ = job.reply.send(result);
    }

    tracing::debug!("command queue stopped");
}
