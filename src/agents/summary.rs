use std::fmt;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::time::Duration;

use owo_colors::OwoColorize;

use crate::error::Error;
use crate::llm::CallMetadata;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Ok,
    Failed,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Failed => "failed",
        }
    }
}

/// Outcome of one agent run. Token and cost fields stay at zero when the
/// model call never completed.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub agent: &'static str,
    pub input: Option<PathBuf>,
    pub status: RunStatus,
    pub duration_ms: u64,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
    pub cost_usd: f64,
    pub error: Option<String>,
}

impl RunSummary {
    pub(crate) fn new(
        agent: &'static str,
        input: Option<PathBuf>,
        call: Option<&CallMetadata>,
        elapsed: Duration,
        error: Option<&Error>,
    ) -> Self {
        Self {
            agent,
            input,
            status: if error.is_some() {
                RunStatus::Failed
            } else {
                RunStatus::Ok
            },
            duration_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            provider: call.map(|call| call.provider.clone()),
            model: call.map(|call| call.model.clone()),
            prompt_tokens: call.map_or(0, |call| call.prompt_tokens),
            completion_tokens: call.map_or(0, |call| call.completion_tokens),
            total_tokens: call.map_or(0, |call| call.total_tokens),
            cost_usd: call.map_or(0.0, |call| call.cost_usd),
            error: error.map(ToString::to_string),
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "agent={} status={} duration_ms={} tokens={} cost_usd={:.6}",
            self.agent,
            self.status.as_str(),
            self.duration_ms,
            self.total_tokens,
            self.cost_usd
        )?;
        if let Some(input) = &self.input {
            write!(f, " input={}", input.display())?;
        }
        Ok(())
    }
}

/// Receives the summary of every run, successful or not.
pub trait SummarySink {
    fn emit(&self, summary: &RunSummary);
}

/// Prints summaries on stderr, colored when stderr is a terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink {
    pub quiet: bool,
}

impl SummarySink for ConsoleSink {
    fn emit(&self, summary: &RunSummary) {
        if self.quiet {
            return;
        }
        let mut stderr = io::stderr().lock();
        let label = if stderr.is_terminal() {
            match summary.status {
                RunStatus::Ok => "summary:".green().to_string(),
                RunStatus::Failed => "summary:".red().to_string(),
            }
        } else {
            "summary:".to_string()
        };
        let _ = writeln!(stderr, "{label} {summary}");
    }
}
