//! Single-shot agents: pick an input file, ask the model once, persist the
//! artifacts, report a summary.

pub mod log_analyzer;
pub mod summary;
pub mod testcase;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::error::{Error, Result};
use crate::llm::{CallMetadata, ChatClient, Message};

pub use log_analyzer::LogAnalyzer;
pub use summary::{ConsoleSink, RunStatus, RunSummary, SummarySink};
pub use testcase::TestcaseAgent;

/// One persisted output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub label: &'static str,
    pub path: PathBuf,
}

/// What makes one agent differ from another: where it reads, what it asks,
/// what it writes.
pub trait Agent {
    fn name(&self) -> &'static str;

    fn default_input_dir(&self) -> &'static str;

    fn default_output_dir(&self) -> &'static str;

    /// File extensions considered when scanning the input directory.
    fn input_extensions(&self) -> &'static [&'static str];

    fn build_messages(&self, contents: &str) -> Vec<Message>;

    fn persist(&self, input: &Path, response: &str, output_dir: &Path) -> Result<Vec<Artifact>>;
}

#[derive(Debug, Clone)]
pub struct AgentOptions {
    pub file: Option<PathBuf>,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl AgentOptions {
    pub fn defaults_for(agent: &dyn Agent) -> Self {
        Self {
            file: None,
            input_dir: PathBuf::from(agent.default_input_dir()),
            output_dir: PathBuf::from(agent.default_output_dir()),
        }
    }
}

/// The conversation an agent would send, before any network call.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub input: PathBuf,
    pub messages: Vec<Message>,
}

/// Returns the explicit path if it exists, else the lexicographically first
/// file in `dir` with one of `extensions`.
pub fn pick_input(explicit: Option<&Path>, dir: &Path, extensions: &[&str]) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(Error::NotFound(format!(
                "file {} does not exist",
                path.display()
            )));
        }
        return Ok(path.to_path_buf());
    }

    let none_found = || {
        Error::NotFound(format!(
            "no input files ({}) found in directory {}",
            extensions
                .iter()
                .map(|ext| format!("*.{ext}"))
                .collect::<Vec<_>>()
                .join(", "),
            dir.display()
        ))
    };

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Err(none_found()),
        Err(err) => return Err(Error::io(dir, err)),
    };

    let mut candidates = entries
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| extensions.contains(&ext))
        })
        .collect::<Vec<_>>();
    candidates.sort();
    candidates.into_iter().next().ok_or_else(none_found)
}

pub fn prepare(agent: &dyn Agent, options: &AgentOptions) -> Result<Prepared> {
    let input = pick_input(
        options.file.as_deref(),
        &options.input_dir,
        agent.input_extensions(),
    )?;
    let contents = fs::read_to_string(&input).map_err(|err| Error::io(&input, err))?;
    tracing::info!(
        agent = agent.name(),
        input = %input.display(),
        chars = contents.chars().count(),
        "input selected"
    );
    Ok(Prepared {
        messages: agent.build_messages(&contents),
        input,
    })
}

/// Runs one agent end to end. The sink sees a summary on every exit path,
/// including failures after the model call.
pub fn run(
    agent: &dyn Agent,
    client: &ChatClient,
    options: &AgentOptions,
    sink: &dyn SummarySink,
) -> Result<Vec<Artifact>> {
    let started = Instant::now();
    let mut input = None;
    let mut call: Option<CallMetadata> = None;

    let result = (|| -> Result<Vec<Artifact>> {
        let prepared = prepare(agent, options)?;
        input = Some(prepared.input.clone());
        let reply = client.chat(&prepared.messages)?;
        call = Some(reply.metadata);
        agent.persist(&prepared.input, &reply.response, &options.output_dir)
    })();

    let summary = RunSummary::new(
        agent.name(),
        input,
        call.as_ref(),
        started.elapsed(),
        result.as_ref().err(),
    );
    match &result {
        Ok(artifacts) => tracing::info!(
            agent = summary.agent,
            artifacts = artifacts.len(),
            duration_ms = summary.duration_ms,
            total_tokens = summary.total_tokens,
            cost_usd = summary.cost_usd,
            "run succeeded"
        ),
        Err(err) => tracing::error!(
            agent = summary.agent,
            error = %err,
            duration_ms = summary.duration_ms,
            total_tokens = summary.total_tokens,
            cost_usd = summary.cost_usd,
            "run failed"
        ),
    }
    sink.emit(&summary);

    result
}

pub(crate) fn write_artifact(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| Error::io(parent, err))?;
    }
    fs::write(path, contents).map_err(|err| Error::io(path, err))
}
