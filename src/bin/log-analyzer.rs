use std::process;

use clap::Parser;
use qagents::agents::LogAnalyzer;
use qagents::commands::VERSION;
use qagents::commands::agent::{self, AgentArgs};

#[derive(Debug, Parser)]
#[command(
    name = "log-analyzer",
    about = "Analyze a log file into technical, JSON and executive reports",
    version = VERSION
)]
struct Cli {
    #[command(flatten)]
    args: AgentArgs,
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = agent::run(&LogAnalyzer, cli.args) {
        eprintln!("{err}");
        process::exit(1);
    }
}
