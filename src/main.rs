use std::io;
use std::process;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, shells};
use qagents::agents::{LogAnalyzer, TestcaseAgent};
use qagents::commands::VERSION;
use qagents::commands::agent::{self, AgentArgs};
use qagents::commands::config::{self, ConfigArgs};

const ROOT_HELP_EXAMPLES: &str = "Examples:\n  qagents testcases data/requirements/login.txt\n  PROVIDER=ollama MODEL=llama3 qagents logs\n  qagents logs --provider google --model gemini-2.5-flash --dry-run app.log\n  qagents config check --provider openai\n  qagents completion bash > ~/.local/share/bash-completion/completions/qagents";

#[derive(Debug, Parser)]
#[command(
    name = "qagents",
    about = "LLM-backed QA agents",
    version = VERSION,
    after_help = ROOT_HELP_EXAMPLES
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Generate test cases from a requirements file")]
    Testcases(AgentArgs),
    #[command(about = "Analyze a log file into technical, JSON and executive reports")]
    Logs(AgentArgs),
    #[command(about = "Inspect resolved configuration")]
    Config(ConfigArgs),
    #[command(about = "Generate shell completion script")]
    Completion {
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

fn print_completion(shell: CompletionShell) {
    let mut cmd = Cli::command();
    match shell {
        CompletionShell::Bash => generate(shells::Bash, &mut cmd, "qagents", &mut io::stdout()),
        CompletionShell::Zsh => generate(shells::Zsh, &mut cmd, "qagents", &mut io::stdout()),
        CompletionShell::Fish => generate(shells::Fish, &mut cmd, "qagents", &mut io::stdout()),
    }
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Testcases(args) => agent::run(&TestcaseAgent, args),
        Commands::Logs(args) => agent::run(&LogAnalyzer, args),
        Commands::Config(args) => config::run(args),
        Commands::Completion { shell } => {
            print_completion(shell);
            Ok(())
        }
    };

    if let Err(err) = result {
        eprintln!("{err}");
        process::exit(1);
    }
}
