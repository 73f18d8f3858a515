// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

use crate::types::SequenceId;

/// Command-line arguments for `forgeq`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "forgeq",
    version,
    about = "Queue, run and track forge jobs with bounded concurrency.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Forgeq.toml` in the current working directory. A missing
    /// default file means built-in defaults.
    #[arg(long, value_name = "PATH", default_value = "Forgeq.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `FORGEQ_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Admit a new job.
    Submit {
        title: String,
        /// Queue behind interactive work.
        #[arg(long)]
        batch: bool,
        /// Sequence id of the job this one derives from.
        #[arg(long, value_name = "SEQ")]
        parent: Option<SequenceId>,
    },
    /// Mark a running job as completed.
    Complete {
        record_id: String,
        #[arg(long, value_parser = parse_score)]
        score: Option<f64>,
        #[arg(long)]
        strategy: Option<String>,
        #[arg(long, value_name = "REF")]
        result_ref: Option<String>,
    },
    /// Mark a running job as failed.
    Fail { record_id: String, message: String },
    Cancel { sequence_id: SequenceId },
    /// Remove a finished job from the list.
    Dismiss { sequence_id: SequenceId },
    /// Raise a queued batch job to interactive.
    Promote { sequence_id: SequenceId },
    /// Re-admit a failed or cancelled job.
    Retry { sequence_id: SequenceId },
    /// Report progress for a running job.
    Progress {
        record_id: String,
        stage: String,
        #[arg(allow_negative_numbers = true)]
        fraction: f64,
    },
    /// Move the focus cursor to a job.
    Focus { record_id: String },
    /// Print every retained job.
    List,
    /// Forget all jobs and clear the snapshot store.
    Reset,
    /// Drive jobs through `[worker].cmd` until interrupted.
    Run {
        /// Exit once nothing is running or queued.
        #[arg(long)]
        once: bool,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Scores must be finite; JSON snapshots cannot hold `inf` or `NaN`.
fn parse_score(s: &str) -> Result<f64, String> {
    let score: f64 = s.parse().map_err(|e| format!("invalid score '{s}': {e}"))?;
    if !score.is_finite() {
        return Err(format!("score must be a finite number (got '{s}')"));
    }
    Ok(score)
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_defaults_to_interactive_without_parent() {
        let args = CliArgs::try_parse_from(["forgeq", "submit", "tune weights"]).unwrap();
        assert_eq!(args.config, "Forgeq.toml");
        match args.command {
            Command::Submit {
                title,
                batch,
                parent,
            } => {
                assert_eq!(title, "tune weights");
                assert!(!batch);
                assert_eq!(parent, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn run_once_and_global_flags_parse() {
        let args = CliArgs::try_parse_from([
            "forgeq",
            "--config",
            "custom.toml",
            "--log-level",
            "debug",
            "run",
            "--once",
        ])
        .unwrap();
        assert_eq!(args.config, "custom.toml");
        assert!(matches!(args.log_level, Some(LogLevel::Debug)));
        assert!(matches!(args.command, Command::Run { once: true }));
    }

    #[test]
    fn complete_rejects_non_finite_scores() {
        for bad in ["inf", "NaN", "-inf"] {
            let parsed =
                CliArgs::try_parse_from(["forgeq", "complete", "rec-1", "--score", bad]);
            assert!(parsed.is_err(), "{bad} should be rejected");
        }

        let args =
            CliArgs::try_parse_from(["forgeq", "complete", "rec-1", "--score", "0.75"]).unwrap();
        assert!(matches!(args.command, Command::Complete { score: Some(s), .. } if s == 0.75));
    }

    #[test]
    fn sequence_ids_must_be_numeric() {
        assert!(CliArgs::try_parse_from(["forgeq", "cancel", "abc"]).is_err());
    }
}
