use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::llm::Provider;
use crate::llm::ollama::DEFAULT_OLLAMA_HOST;

pub const DEFAULT_PROVIDER: &str = "openai";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProfileConfig {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub timeout: Option<u64>,
    pub ollama_host: Option<String>,
    pub log_level: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    profiles: Option<HashMap<String, ProfileConfig>>,
}

/// Values given on the command line; they win over everything else.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
    pub profile: Option<String>,
}

/// Process-wide configuration, resolved once and passed down explicitly.
#[derive(Debug, Clone)]
pub struct Settings {
    pub provider: Provider,
    pub model: String,
    pub openai_api_key: Option<String>,
    pub google_api_key: Option<String>,
    pub ollama_host: String,
    pub timeout_secs: u64,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: Provider::Openai,
            model: DEFAULT_MODEL.to_string(),
            openai_api_key: None,
            google_api_key: None,
            ollama_host: DEFAULT_OLLAMA_HOST.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Settings {
    /// Loads `.env`, then resolves from the process environment.
    pub fn load(overrides: &Overrides) -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::resolve(overrides, |key| env::var(key).ok())
    }

    /// Resolves settings with precedence CLI > environment > profile > default.
    pub fn resolve(overrides: &Overrides, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| non_blank(lookup(key));
        let profile = match overrides.profile.as_deref() {
            Some(name) => load_profile(name, &var)?,
            None => ProfileConfig::default(),
        };

        let provider = non_blank(overrides.provider.clone())
            .or_else(|| var("PROVIDER"))
            .or_else(|| non_blank(profile.provider))
            .unwrap_or_else(|| DEFAULT_PROVIDER.to_string())
            .parse::<Provider>()?;

        let model = non_blank(overrides.model.clone())
            .or_else(|| var("MODEL"))
            .or_else(|| non_blank(profile.model))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let timeout_secs = match overrides.timeout_secs {
            Some(value) => value,
            None => match var("TIMEOUT") {
                Some(raw) => raw.parse::<u64>().map_err(|_| {
                    Error::Configuration(format!(
                        "Invalid TIMEOUT '{raw}': expected a whole number of seconds."
                    ))
                })?,
                None => profile.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS),
            },
        };

        let ollama_host = var("OLLAMA_HOST")
            .or_else(|| non_blank(profile.ollama_host))
            .unwrap_or_else(|| DEFAULT_OLLAMA_HOST.to_string());

        let log_level = var("LOG_LEVEL")
            .or_else(|| non_blank(profile.log_level))
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
            .to_ascii_lowercase();

        Ok(Self {
            provider,
            model,
            openai_api_key: var("OPENAI_API_KEY"),
            google_api_key: var("GOOGLE_API_KEY"),
            ollama_host,
            timeout_secs,
            log_level,
        })
    }

    /// Whether the selected provider has what it needs to authenticate.
    pub fn api_key_present(&self) -> bool {
        match self.provider {
            Provider::Openai => self.openai_api_key.is_some(),
            Provider::Google => self.google_api_key.is_some(),
            Provider::Ollama => true,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn load_profile(name: &str, var: &dyn Fn(&str) -> Option<String>) -> Result<ProfileConfig> {
    let path = config_path(var)?;
    let raw = fs::read_to_string(&path).map_err(|err| {
        Error::Configuration(format!(
            "Failed to read config file '{}': {err}",
            path.display()
        ))
    })?;

    let config: ConfigFile = toml::from_str(&raw).map_err(|err| {
        Error::Configuration(format!(
            "Failed to parse config file '{}': {err}",
            path.display()
        ))
    })?;

    let profiles = config.profiles.ok_or_else(|| {
        Error::Configuration(format!(
            "Config file '{}' does not contain a [profiles] section.",
            path.display()
        ))
    })?;

    profiles.get(name).cloned().ok_or_else(|| {
        Error::Configuration(format!(
            "Profile '{name}' not found in config file '{}'.",
            path.display()
        ))
    })
}

fn config_path(var: &dyn Fn(&str) -> Option<String>) -> Result<PathBuf> {
    if let Some(path) = var("QAGENTS_CONFIG") {
        return Ok(PathBuf::from(path));
    }

    if let Some(xdg) = var("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(xdg).join("qagents").join("config.toml"));
    }

    let home = var("HOME").ok_or_else(|| {
        Error::Configuration(
            "Cannot resolve config path: set QAGENTS_CONFIG or HOME/XDG_CONFIG_HOME.".to_string(),
        )
    })?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("qagents")
        .join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key: &str| {
            vars.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| value.to_string())
        }
    }

    fn write_config(dir: &Path, body: &str) -> String {
        let path = dir.join("config.toml");
        fs::write(&path, body).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let settings = Settings::resolve(&Overrides::default(), lookup(&[])).unwrap();
        assert_eq!(settings.provider, Provider::Openai);
        assert_eq!(settings.model, "gpt-4o-mini");
        assert_eq!(settings.ollama_host, "http://localhost:11434");
        assert_eq!(settings.timeout_secs, 60);
        assert_eq!(settings.log_level, "info");
        assert!(settings.openai_api_key.is_none());
        assert!(!settings.api_key_present());
    }

    #[test]
    fn environment_values_are_read() {
        let vars = [
            ("PROVIDER", "google"),
            ("MODEL", "gemini-2.5-flash"),
            ("GOOGLE_API_KEY", "g-key"),
            ("TIMEOUT", "15"),
            ("LOG_LEVEL", "DEBUG"),
        ];
        let settings = Settings::resolve(&Overrides::default(), lookup(&vars)).unwrap();
        assert_eq!(settings.provider, Provider::Google);
        assert_eq!(settings.model, "gemini-2.5-flash");
        assert_eq!(settings.google_api_key.as_deref(), Some("g-key"));
        assert_eq!(settings.timeout_secs, 15);
        assert_eq!(settings.log_level, "debug");
        assert!(settings.api_key_present());
    }

    #[test]
    fn blank_values_count_as_unset() {
        let vars = [("PROVIDER", "  "), ("OPENAI_API_KEY", "")];
        let settings = Settings::resolve(&Overrides::default(), lookup(&vars)).unwrap();
        assert_eq!(settings.provider, Provider::Openai);
        assert!(settings.openai_api_key.is_none());
    }

    #[test]
    fn overrides_win_over_environment() {
        let vars = [("PROVIDER", "openai"), ("MODEL", "env-model"), ("TIMEOUT", "5")];
        let overrides = Overrides {
            provider: Some("ollama".to_string()),
            model: Some("llama3".to_string()),
            timeout_secs: Some(9),
            profile: None,
        };
        let settings = Settings::resolve(&overrides, lookup(&vars)).unwrap();
        assert_eq!(settings.provider, Provider::Ollama);
        assert_eq!(settings.model, "llama3");
        assert_eq!(settings.timeout_secs, 9);
    }

    #[test]
    fn unknown_provider_is_unsupported() {
        let err = Settings::resolve(&Overrides::default(), lookup(&[("PROVIDER", "bad")]))
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedProvider(ref name) if name == "bad"));
    }

    #[test]
    fn invalid_timeout_is_a_configuration_error() {
        let err = Settings::resolve(&Overrides::default(), lookup(&[("TIMEOUT", "soon")]))
            .unwrap_err();
        assert!(
            matches!(err, Error::Configuration(ref msg) if msg.contains("Invalid TIMEOUT 'soon'"))
        );
    }

    #[test]
    fn profile_fills_gaps_below_environment() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "[profiles.local]\nprovider = \"ollama\"\nmodel = \"mistral\"\ntimeout = 120\nollama_host = \"http://gpu-box:11434\"\n",
        );
        let vars = [("QAGENTS_CONFIG", path.as_str()), ("MODEL", "llama3")];
        let overrides = Overrides {
            profile: Some("local".to_string()),
            ..Overrides::default()
        };

        let settings = Settings::resolve(&overrides, lookup(&vars)).unwrap();
        assert_eq!(settings.provider, Provider::Ollama);
        assert_eq!(settings.model, "llama3");
        assert_eq!(settings.timeout_secs, 120);
        assert_eq!(settings.ollama_host, "http://gpu-box:11434");
    }

    #[test]
    fn profile_is_not_loaded_unless_requested() {
        let vars = [("QAGENTS_CONFIG", "/nonexistent/qagents.toml")];
        assert!(Settings::resolve(&Overrides::default(), lookup(&vars)).is_ok());
    }

    #[test]
    fn missing_profile_reports_its_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "[profiles.other]\nmodel = \"x\"\n");
        let vars = [("QAGENTS_CONFIG", path.as_str())];
        let overrides = Overrides {
            profile: Some("missing".to_string()),
            ..Overrides::default()
        };
        let err = Settings::resolve(&overrides, lookup(&vars)).unwrap_err();
        assert!(err.to_string().contains("Profile 'missing' not found"));
    }

    #[test]
    fn unreadable_and_invalid_config_files_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml").to_string_lossy().into_owned();
        let err = load_profile("x", &lookup(&[("QAGENTS_CONFIG", missing.as_str())])).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));

        let path = write_config(dir.path(), "[profiles.bad\nprovider = \"openai\"");
        let err = load_profile("bad", &lookup(&[("QAGENTS_CONFIG", path.as_str())])).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn config_path_prefers_explicit_then_xdg_then_home() {
        let path = config_path(&lookup(&[("QAGENTS_CONFIG", "/tmp/q.toml"), ("HOME", "/home/u")]))
            .unwrap();
        assert_eq!(path, PathBuf::from("/tmp/q.toml"));

        let path = config_path(&lookup(&[("XDG_CONFIG_HOME", "/xdg"), ("HOME", "/home/u")]))
            .unwrap();
        assert_eq!(path, PathBuf::from("/xdg/qagents/config.toml"));

        let path = config_path(&lookup(&[("HOME", "/home/u")])).unwrap();
        assert_eq!(path, PathBuf::from("/home/u/.config/qagents/config.toml"));

        assert!(config_path(&lookup(&[])).is_err());
    }
}
