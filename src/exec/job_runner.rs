// src/exec/job_runner.rs

//! Individual job process runner.

use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{ChildStderr, ChildStdout, Command};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::engine::{DispatchedJob, RuntimeEvent};
use crate::exec::protocol::{LineParser, ProtocolLine};
use crate::scheduler::JobOutcome;

/// Run a single job's process and report `Completed` / `Failed`.
///
/// If the cancel channel fires, the child is killed and **no** terminal
/// event is sent: the scheduler already marked the job cancelled.
pub async fn run_job(
    cmd: String,
    parser: LineParser,
    job: DispatchedJob,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    cancel_rx: oneshot::Receiver<()>,
) {
    let record_id = job.record_id.clone();
    let sequence_id = job.sequence_id;
    if let Err(err) = run_job_inner(&cmd, parser, job, &runtime_tx, cancel_rx).await {
        error!(sequence_id, record_id = %record_id, error = %err, "job execution error");
        let _ = runtime_tx
            .send(RuntimeEvent::Failed {
                record_id,
                message: format!("{err:#}"),
            })
            .await;
    }
}

async fn run_job_inner(
    cmd: &str,
    parser: LineParser,
    job: DispatchedJob,
    runtime_tx: &mpsc::Sender<RuntimeEvent>,
    mut cancel_rx: oneshot::Receiver<()>,
) -> Result<()> {
    info!(
        sequence_id = job.sequence_id,
        record_id = %job.record_id,
        title = %job.title,
        "starting worker process"
    );

    let mut command = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    };

    command
        .env("FORGEQ_RECORD_ID", &job.record_id)
        .env("FORGEQ_SEQUENCE_ID", job.sequence_id.to_string())
        .env("FORGEQ_TITLE", &job.title)
        .env("FORGEQ_PRIORITY", job.priority.to_string())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command
        .spawn()
        .with_context(|| format!("spawning worker for job {}", job.sequence_id))?;

    let stdout_task = child
        .stdout
        .take()
        .map(|out| spawn_stdout_reader(out, parser, job.clone(), runtime_tx.clone()));
    let stderr_task = child
        .stderr
        .take()
        .map(|err| spawn_stderr_reader(err, job.sequence_id));

    tokio::select! {
        status_res = child.wait() => {
            let status = status_res
                .with_context(|| format!("waiting for worker of job {}", job.sequence_id))?;

            // Pipes close once the process exits; collect what the readers saw.
            let outcome = match stdout_task {
                Some(task) => task.await.unwrap_or_default(),
                None => JobOutcome::default(),
            };
            let last_stderr = match stderr_task {
                Some(task) => task.await.ok().flatten(),
                None => None,
            };

            let code = status.code().unwrap_or(-1);
            info!(
                sequence_id = job.sequence_id,
                exit_code = code,
                success = status.success(),
                "worker process exited"
            );

            let event = if status.success() {
                RuntimeEvent::Completed {
                    record_id: job.record_id.clone(),
                    outcome,
                }
            } else {
                RuntimeEvent::Failed {
                    record_id: job.record_id.clone(),
                    message: last_stderr.unwrap_or_else(|| format!("exit code {code}")),
                }
            };

            runtime_tx
                .send(event)
                .await
                .with_context(|| format!("reporting result of job {} to runtime", job.sequence_id))?;
        }

        cancel = &mut cancel_rx => {
            match cancel {
                Ok(()) => {
                    info!(sequence_id = job.sequence_id, "abort requested; killing worker process");
                    if let Err(e) = child.kill().await {
                        warn!(
                            sequence_id = job.sequence_id,
                            error = %e,
                            "failed to kill worker process"
                        );
                    }
                }
                Err(e) => {
                    debug!(
                        sequence_id = job.sequence_id,
                        error = %e,
                        "cancel channel closed without explicit abort"
                    );
                    // kill_on_drop(true) reaps the child.
                }
            }
        }
    }

    Ok(())
}

/// Read stdout, forward progress lines, and fold outcome lines.
fn spawn_stdout_reader(
    stdout: ChildStdout,
    parser: LineParser,
    job: DispatchedJob,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> JoinHandle<JobOutcome> {
    tokio::spawn(async move {
        let mut outcome = JobOutcome::default();
        let mut lines = BufReader::new(stdout).lines();

        while let Ok(Some(line)) = lines.next_line().await {
            match parser.parse(&line) {
                Some(ProtocolLine::Progress { stage, progress }) => {
                    let _ = runtime_tx
                        .send(RuntimeEvent::Progress {
                            record_id: job.record_id.clone(),
                            stage,
                            progress,
                        })
                        .await;
                }
                Some(other) => {
                    other.merge_into(&mut outcome);
                }
                None => debug!(sequence_id = job.sequence_id, "stdout: {}", line),
            }
        }

        outcome
    })
}

/// Drain stderr (so buffers don't fill) and keep its last non-empty line.
fn spawn_stderr_reader(stderr: ChildStderr, sequence_id: u64) -> JoinHandle<Option<String>> {
    tokio::spawn(async move {
        let mut last = None;
        let mut lines = BufReader::new(stderr).lines();

        while let Ok(Some(line)) = lines.next_line().await {
            debug!(sequence_id, "stderr: {}", line);
            if !line.trim().is_empty() {
                last = Some(line.trim().to_string());
            }
        }

        last
    })
}
