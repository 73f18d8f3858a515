// src/lib.rs

pub mod cli;
pub mod config;
pub mod control;
pub mod engine;
pub mod errors;
pub mod events;
pub mod exec;
pub mod logging;
pub mod scheduler;
pub mod store;
pub mod types;

use std::path::PathBuf;

use anyhow::{bail, Result};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::{CliArgs, Command};
use crate::config::{load_or_default, ConfigFile};
use crate::engine::{CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions};
use crate::events::{EventBus, EventNotifier, LifecycleEvent, NullNotifier};
use crate::exec::CommandWorker;
use crate::scheduler::{JobOutcome, JobRecord, Scheduler, SchedulerOptions};
use crate::store::{ensure_unlocked, open_store, MemoryStore, RunLock, SnapshotStore};
use crate::types::{Priority, StoreBackend};

/// High-level entry point used by `main.rs`.
///
/// One-shot commands restore the scheduler from the configured store, apply
/// a single operation (the scheduler persists its own snapshot) and print
/// the affected state. They refuse to touch a store locked by `run`; `list`
/// only reads. `run` wires:
/// - store lock
/// - scheduler restored from the store
/// - runtime event channel
/// - command worker
/// - operator commands on stdin
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_or_default(&config_path)?;
    debug!(config = ?cfg, "configuration loaded");

    match args.command {
        Command::Run { once } => run_worker(&cfg, once).await,
        Command::List => {
            let scheduler = Scheduler::restore(
                SchedulerOptions::from_config(&cfg),
                snapshot_copy(&cfg),
                Box::new(NullNotifier),
            );
            print_list(&scheduler);
            Ok(())
        }
        command => {
            // A running `forgeq run` would overwrite whatever we write here.
            if cfg.store.backend == StoreBackend::File {
                ensure_unlocked(&cfg.store.dir)?;
            }
            let mut scheduler = restore_scheduler(&cfg, Box::new(NullNotifier));
            apply_command(&mut scheduler, command);
            Ok(())
        }
    }
}

fn restore_scheduler(cfg: &ConfigFile, notifier: Box<dyn EventNotifier>) -> Scheduler {
    Scheduler::restore(
        SchedulerOptions::from_config(cfg),
        open_store(&cfg.store),
        notifier,
    )
}

/// In-memory copy of the stored snapshot, so reading never writes back.
fn snapshot_copy(cfg: &ConfigFile) -> Box<dyn SnapshotStore> {
    let source = open_store(&cfg.store);
    let mut copy = MemoryStore::new();
    for key in [&cfg.store.jobs_key, &cfg.store.active_key] {
        match source.get(key) {
            Ok(Some(value)) => {
                if let Err(e) = copy.set(key, &value) {
                    debug!(key = %key, error = %e, "failed to copy snapshot key");
                }
            }
            Ok(None) => {}
            Err(e) => debug!(key = %key, error = %e, "failed to read snapshot key"),
        }
    }
    Box::new(copy)
}

/// Apply a one-shot command and print what it touched.
fn apply_command(scheduler: &mut Scheduler, command: Command) {
    match command {
        Command::Submit {
            title,
            batch,
            parent,
        } => {
            let priority = batch.then_some(Priority::Batch);
            let job = scheduler.admit(title, priority, parent);
            print_job(&job);
        }
        Command::Complete {
            record_id,
            score,
            strategy,
            result_ref,
        } => {
            let outcome = JobOutcome {
                score,
                strategy_used: strategy,
                result_reference: result_ref,
                payload: None,
            };
            scheduler.complete(&record_id, outcome);
            print_record(scheduler, &record_id);
        }
        Command::Fail { record_id, message } => {
            scheduler.fail(&record_id, message);
            print_record(scheduler, &record_id);
        }
        Command::Cancel { sequence_id } => {
            scheduler.cancel(sequence_id);
            print_sequence(scheduler, sequence_id);
        }
        Command::Dismiss { sequence_id } => {
            scheduler.dismiss(sequence_id);
            print_sequence(scheduler, sequence_id);
        }
        Command::Promote { sequence_id } => {
            scheduler.promote(sequence_id);
            print_sequence(scheduler, sequence_id);
        }
        Command::Retry { sequence_id } => match scheduler.retry(sequence_id) {
            Some(job) => print_job(&job),
            None => println!("#{sequence_id} cannot be retried"),
        },
        Command::Progress {
            record_id,
            stage,
            fraction,
        } => {
            scheduler.update_progress(&record_id, stage, fraction);
            print_record(scheduler, &record_id);
        }
        Command::Focus { record_id } => {
            scheduler.focus(&record_id);
            print_record(scheduler, &record_id);
        }
        Command::Reset => {
            scheduler.reset();
            println!("all jobs cleared");
        }
        // Handled by `run`.
        Command::List | Command::Run { .. } => {}
    }
}

async fn run_worker(cfg: &ConfigFile, once: bool) -> Result<()> {
    let Some(cmd) = cfg.worker.cmd.clone() else {
        bail!("`run` needs a worker command: set [worker].cmd in the config file");
    };

    // Held until the runtime stops; one-shot writers refuse meanwhile.
    let _lock = match cfg.store.backend {
        StoreBackend::File => Some(RunLock::acquire(&cfg.store.dir)?),
        StoreBackend::Memory => None,
    };

    let bus = EventBus::new();
    bus.subscribe(print_event);
    let scheduler = restore_scheduler(cfg, Box::new(bus));

    // Runtime event channel.
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    let worker = CommandWorker::new(cmd, rt_tx.clone())?;

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    // Operator commands (submit, cancel, ...) arrive as lines on stdin.
    control::spawn_stdin_commands(rt_tx.clone());

    let options = RuntimeOptions {
        exit_when_idle: once,
    };
    let core = CoreRuntime::new(scheduler, options);
    let runtime = Runtime::new(core, rt_rx, worker);

    let scheduler = runtime.run().await?;
    info!(
        running = scheduler.running().len(),
        queued = scheduler.queue().len(),
        "runtime stopped"
    );
    Ok(())
}

fn print_event(event: &LifecycleEvent) {
    let p = &event.payload;
    match (&p.outcome, &p.error_message) {
        (Some(outcome), _) => println!(
            "[{}] #{} {} score={}",
            event.kind,
            p.sequence_id,
            p.title,
            outcome
                .score
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string())
        ),
        (None, Some(message)) => {
            println!("[{}] #{} {}: {message}", event.kind, p.sequence_id, p.title)
        }
        (None, None) => println!("[{}] #{} {}", event.kind, p.sequence_id, p.title),
    }
}

fn print_record(scheduler: &Scheduler, record_id: &str) {
    match scheduler.job(record_id) {
        Some(job) => print_job(job),
        None => println!("no job with record id {record_id}"),
    }
}

fn print_sequence(scheduler: &Scheduler, sequence_id: u64) {
    match scheduler.job_by_sequence(sequence_id) {
        Some(job) => print_job(job),
        None => println!("no job #{sequence_id}"),
    }
}

fn print_job(job: &JobRecord) {
    let mut line = format!(
        "#{:<4} {:<10} {:<11} {:>4.0}%  {}  ({})",
        job.sequence_id,
        job.status.to_string(),
        job.priority.to_string(),
        job.progress * 100.0,
        job.title,
        job.record_id
    );
    if let Some(stage) = &job.current_stage {
        line.push_str(&format!("  stage={stage}"));
    }
    if let Some(parent) = job.parent_sequence_id {
        line.push_str(&format!("  retry-of=#{parent}"));
    }
    if let Some(score) = job.score {
        line.push_str(&format!("  score={score}"));
    }
    if let Some(message) = &job.error_message {
        line.push_str(&format!("  error={message}"));
    }
    println!("{line}");
}

fn print_list(scheduler: &Scheduler) {
    let active = scheduler.active_job_record_id();
    println!(
        "forgeq: {} job(s), {}/{} running, {} queued",
        scheduler.jobs().len(),
        scheduler.running().len(),
        scheduler.max_concurrent(),
        scheduler.queue().len()
    );
    for job in scheduler.jobs() {
        let marker = if Some(job.record_id.as_str()) == active {
            "*"
        } else {
            " "
        };
        print!("{marker} ");
        print_job(job);
    }
}
