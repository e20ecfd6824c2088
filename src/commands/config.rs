use clap::{Args, Subcommand};

use crate::commands::LlmArgs;
use crate::config::Settings;
use crate::error::{Error, Result};

#[derive(Debug, Args, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigSubcommand,
}

#[derive(Debug, Subcommand, Clone)]
enum ConfigSubcommand {
    #[command(about = "Resolve settings and check the selected provider's credential")]
    Check {
        #[command(flatten)]
        llm: LlmArgs,
    },
}

pub fn run(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigSubcommand::Check { llm } => {
            let settings = Settings::load(&llm.overrides())?;
            if !settings.api_key_present() {
                let key_env = settings.provider.api_key_env().unwrap_or("API key");
                return Err(Error::Configuration(format!("{key_env} is not set")));
            }
            println!(
                "config OK: provider={} model={} timeout_secs={} api_key_present={}",
                settings.provider,
                settings.model,
                settings.timeout_secs,
                settings.api_key_present()
            );
            Ok(())
        }
    }
}
