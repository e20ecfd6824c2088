use std::process;

use clap::Parser;
use qagents::agents::TestcaseAgent;
use qagents::commands::VERSION;
use qagents::commands::agent::{self, AgentArgs};

#[derive(Debug, Parser)]
#[command(
    name = "testcase-agent",
    about = "Generate test cases from a requirements file",
    version = VERSION
)]
struct Cli {
    #[command(flatten)]
    args: AgentArgs,
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = agent::run(&TestcaseAgent, cli.args) {
        eprintln!("{err}");
        process::exit(1);
    }
}
