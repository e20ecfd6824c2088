//! Command-line front ends shared by the `qagents` binary and the
//! single-agent binaries.

pub mod agent;
pub mod config;

use clap::Args;

use crate::config::Overrides;

pub const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\ncommit: ",
    env!("QAGENTS_GIT_SHA"),
    "\nbuilt: ",
    env!("QAGENTS_BUILD_TS")
);

/// Provider selection flags; each one overrides its environment variable.
#[derive(Debug, Args, Clone, Default)]
pub struct LlmArgs {
    #[arg(long, help = "Provider: openai, google or ollama (env: PROVIDER)")]
    pub provider: Option<String>,
    #[arg(long, help = "Model identifier (env: MODEL)")]
    pub model: Option<String>,
    #[arg(long, help = "Request timeout in seconds (env: TIMEOUT)")]
    pub timeout: Option<u64>,
    #[arg(long, help = "Profile name from the qagents config file")]
    pub profile: Option<String>,
}

impl LlmArgs {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            provider: self.provider.clone(),
            model: self.model.clone(),
            timeout_secs: self.timeout,
            profile: self.profile.clone(),
        }
    }
}
