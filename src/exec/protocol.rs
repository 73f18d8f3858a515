// src/exec/protocol.rs

//! Stdout line protocol spoken by the worker command.
//!
//! ```text
//! progress <stage> <fraction>
//! score <number>
//! strategy <name>
//! result <reference>
//! ```
//!
//! Any other line is treated as plain log output.

use regex::Regex;

use crate::errors::{Error, Result};
use crate::scheduler::JobOutcome;

#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolLine {
    Progress { stage: String, progress: f64 },
    Score(f64),
    Strategy(String),
    ResultReference(String),
}

impl ProtocolLine {
    /// Fold an outcome line into `outcome`. Returns `false` for progress lines.
    pub fn merge_into(&self, outcome: &mut JobOutcome) -> bool {
        match self {
            ProtocolLine::Progress { .. } => return false,
            ProtocolLine::Score(score) => outcome.score = Some(*score),
            ProtocolLine::Strategy(name) => outcome.strategy_used = Some(name.clone()),
            ProtocolLine::ResultReference(r) => outcome.result_reference = Some(r.clone()),
        }
        true
    }
}

#[derive(Debug, Clone)]
pub struct LineParser {
    line: Regex,
}

impl LineParser {
    pub fn new() -> Result<Self> {
        let line = Regex::new(r"^\s*(progress|score|strategy|result)\s+(.*\S)\s*$")
            .map_err(Error::from)?;
        Ok(Self { line })
    }

    pub fn parse(&self, line: &str) -> Option<ProtocolLine> {
        let caps = self.line.captures(line)?;
        let rest = caps.get(2)?.as_str();

        match caps.get(1)?.as_str() {
            "progress" => {
                let (stage, value) = rest.rsplit_once(char::is_whitespace)?;
                let progress = value.parse::<f64>().ok()?;
                Some(ProtocolLine::Progress {
                    stage: stage.trim().to_string(),
                    progress,
                })
            }
            "score" => rest
                .parse::<f64>()
                .ok()
                .filter(|score| score.is_finite())
                .map(ProtocolLine::Score),
            "strategy" => Some(ProtocolLine::Strategy(rest.to_string())),
            "result" => Some(ProtocolLine::ResultReference(rest.to_string())),
            _ => None,
        }
    }
}
