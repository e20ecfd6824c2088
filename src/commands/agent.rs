use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use serde_json::json;

use crate::agents::{self, Agent, AgentOptions, ConsoleSink, RunSummary, SummarySink};
use crate::commands::LlmArgs;
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::llm::ChatClient;
use crate::logging::{Verbosity, init_tracing};

#[derive(Debug, Args, Clone)]
pub struct AgentArgs {
    #[arg(help = "Input file; defaults to the first matching file in --input-dir")]
    pub file: Option<PathBuf>,
    #[arg(long, help = "Directory scanned when no input file is given")]
    pub input_dir: Option<PathBuf>,
    #[arg(long, help = "Directory the artifacts are written to")]
    pub output_dir: Option<PathBuf>,
    #[command(flatten)]
    pub llm: LlmArgs,
    #[arg(long, help = "Print the request that would be sent and exit")]
    pub dry_run: bool,
    #[arg(long, help = "Enable debug logging")]
    pub verbose: bool,
    #[arg(long, help = "Suppress logs and the run summary")]
    pub quiet: bool,
}

impl AgentArgs {
    fn options_for(&self, agent: &dyn Agent) -> AgentOptions {
        let defaults = AgentOptions::defaults_for(agent);
        AgentOptions {
            file: self.file.clone(),
            input_dir: self.input_dir.clone().unwrap_or(defaults.input_dir),
            output_dir: self.output_dir.clone().unwrap_or(defaults.output_dir),
        }
    }
}

pub fn run(agent: &dyn Agent, args: AgentArgs) -> Result<()> {
    let sink = ConsoleSink { quiet: args.quiet };
    run_with(agent, args, &sink, ChatClient::from_settings)
}

fn run_with(
    agent: &dyn Agent,
    args: AgentArgs,
    sink: &dyn SummarySink,
    build_client: impl FnOnce(&Settings) -> Result<ChatClient>,
) -> Result<()> {
    let started = Instant::now();
    // Failures before `agents::run` takes over still get a summary.
    let report = |err: Error| -> Error {
        sink.emit(&RunSummary::new(
            agent.name(),
            None,
            None,
            started.elapsed(),
            Some(&err),
        ));
        err
    };

    let settings = match Settings::load(&args.llm.overrides()) {
        Ok(settings) => settings,
        Err(err) if args.dry_run => return Err(err),
        Err(err) => return Err(report(err)),
    };
    init_tracing(
        Verbosity::from_flags(args.quiet, args.verbose),
        &settings.log_level,
    );
    tracing::debug!(
        agent = agent.name(),
        provider = %settings.provider,
        model = %settings.model,
        timeout_secs = settings.timeout_secs,
        api_key_present = settings.api_key_present(),
        "settings resolved"
    );

    let options = args.options_for(agent);
    if args.dry_run {
        return dry_run(agent, &settings, &options);
    }

    let client = build_client(&settings).map_err(report)?;
    let artifacts = agents::run(agent, &client, &options, sink)?;
    for artifact in artifacts {
        println!("{} saved to: {}", artifact.label, artifact.path.display());
    }
    Ok(())
}

fn dry_run(agent: &dyn Agent, settings: &Settings, options: &AgentOptions) -> Result<()> {
    let prepared = agents::prepare(agent, options)?;
    let body = json!({
        "dry_run": true,
        "agent": agent.name(),
        "provider": settings.provider.as_str(),
        "model": settings.model,
        "input": prepared.input.display().to_string(),
        "output_dir": options.output_dir.display().to_string(),
        "messages": prepared.messages,
        "request": {"timeout_secs": settings.timeout_secs},
        "api_key_present": settings.api_key_present(),
    });
    println!("{body:#}");
    Ok(())
}
