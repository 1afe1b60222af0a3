use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

/// Project-local config file name, looked up in the working directory.
pub const PROJECT_CONFIG_FILE: &str = "dsm.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DsmConfig {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub build: BuildConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// `pretty`, `text`, or `json`.
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfig {
    #[serde(default = "default_true")]
    pub symmetrize: bool,
    #[serde(default = "default_true")]
    pub validate: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            symmetrize: default_true(),
            validate: default_true(),
        }
    }
}

/// Load `dsm.toml` from `project_root`, falling back to the user config.
///
/// Missing files yield defaults.
///
/// # Errors
///
/// Returns an error naming the path if a config file exists but cannot be
/// read or parsed.
pub fn load_config(project_root: &Path) -> Result<DsmConfig> {
    let project_path = project_root.join(PROJECT_CONFIG_FILE);
    if project_path.exists() {
        return load_config_file(&project_path);
    }

    match user_config_path() {
        Some(path) if path.exists() => load_config_file(&path),
        _ => Ok(DsmConfig::default()),
    }
}

/// Parse a single config file.
///
/// # Errors
///
/// Returns an error naming `path` on read or parse failure.
pub fn load_config_file(path: &Path) -> Result<DsmConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<DsmConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("dsm/config.toml"))
}

/// Resolve the output mode name: `cli_format` > `FORMAT` env > config > TTY default.
#[must_use]
pub fn resolve_output(cli_format: Option<&str>, config: &DsmConfig) -> &'static str {
    let env_format = env::var("FORMAT").ok();
    resolve_output_inner(
        cli_format,
        env_format.as_deref(),
        config.output.format.as_deref(),
        std::io::stdout().is_terminal(),
    )
}

fn resolve_output_inner(
    cli_format: Option<&str>,
    env_format: Option<&str>,
    config_format: Option<&str>,
    is_tty: bool,
) -> &'static str {
    fn normalize_output_mode(raw: &str) -> Option<&'static str> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "human" => Some("pretty"),
            "text" | "plain" => Some("text"),
            "json" => Some("json"),
            _ => None,
        }
    }

    [cli_format, env_format, config_format]
        .into_iter()
        .flatten()
        .find_map(normalize_output_mode)
        .unwrap_or(if is_tty { "pretty" } else { "text" })
}

const fn default_true() -> bool {
    true
}
