// src/control.rs

//! Operator commands for a running `forgeq run`.
//!
//! While `run` owns the scheduler, operators type line commands on its
//! stdin:
//!
//! ```text
//! submit [--batch] [--parent SEQ] <title...>
//! cancel <seq>
//! dismiss <seq>
//! promote <seq>
//! retry <seq>
//! quit
//! ```
//!
//! Each accepted line becomes a `RuntimeEvent` on the runtime channel, so it
//! is applied by the same loop that applies worker callbacks.

use std::io::BufRead;
use std::thread;

use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::RuntimeEvent;
use crate::types::{Priority, SequenceId};

#[derive(Debug, Parser)]
#[command(name = "forgeq", no_binary_name = true, disable_help_flag = true)]
struct ControlLine {
    #[command(subcommand)]
    command: ControlCommand,
}

#[derive(Debug, Subcommand)]
enum ControlCommand {
    Submit {
        #[arg(long)]
        batch: bool,
        #[arg(long, value_name = "SEQ")]
        parent: Option<SequenceId>,
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
    },
    Cancel { sequence_id: SequenceId },
    Dismiss { sequence_id: SequenceId },
    Promote { sequence_id: SequenceId },
    Retry { sequence_id: SequenceId },
    Quit,
}

impl From<ControlCommand> for RuntimeEvent {
    fn from(command: ControlCommand) -> Self {
        match command {
            ControlCommand::Submit {
                batch,
                parent,
                title,
            } => RuntimeEvent::Submit {
                title: title.join(" "),
                priority: batch.then_some(Priority::Batch),
                parent,
            },
            ControlCommand::Cancel { sequence_id } => RuntimeEvent::Cancel { sequence_id },
            ControlCommand::Dismiss { sequence_id } => RuntimeEvent::Dismiss { sequence_id },
            ControlCommand::Promote { sequence_id } => RuntimeEvent::Promote { sequence_id },
            ControlCommand::Retry { sequence_id } => RuntimeEvent::Retry { sequence_id },
            ControlCommand::Quit => RuntimeEvent::ShutdownRequested,
        }
    }
}

/// Parse one command line.
///
/// Blank lines and `#` comments yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<RuntimeEvent>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    ControlLine::try_parse_from(line.split_whitespace())
        .map(|parsed| Some(parsed.command.into()))
        .map_err(|e| e.to_string().lines().next().unwrap_or_default().to_string())
}

/// Forward every command read from `reader` into the runtime channel.
///
/// Malformed lines are logged and skipped. Returns the number of events sent,
/// once the reader hits EOF or the runtime has gone away.
pub fn pump_commands<R: BufRead>(reader: R, runtime_tx: &mpsc::Sender<RuntimeEvent>) -> usize {
    let mut sent = 0;

    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "failed to read operator command");
                break;
            }
        };

        match parse_command(&line) {
            Ok(Some(event)) => {
                debug!(?event, "operator command");
                if runtime_tx.blocking_send(event).is_err() {
                    debug!("runtime closed; ignoring further commands");
                    break;
                }
                sent += 1;
            }
            Ok(None) => {}
            Err(message) => warn!(line = %line, "ignoring operator command: {message}"),
        }
    }

    sent
}

/// Read operator commands from stdin on a dedicated thread.
///
/// A plain thread keeps a blocking stdin read from holding up runtime
/// shutdown. EOF on stdin only stops the reader, not the runtime.
pub fn spawn_stdin_commands(runtime_tx: mpsc::Sender<RuntimeEvent>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        let sent = pump_commands(stdin.lock(), &runtime_tx);
        info!(commands = sent, "operator input closed");
    })
}
