//! User configuration from `$XDG_CONFIG_HOME/redline/config.toml`.
//!
//! Every key is optional. A missing file yields the defaults; a file that
//! fails to parse also yields the defaults, plus a warning the caller logs
//! once logging is up.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use redline_core::{RetryPolicy, DEFAULT_CONTEXT_LINES};
use serde::Deserialize;

use crate::cli::Cli;
use crate::media::{ImageOutput, Unresolved};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub theme: String,
    pub context_lines: usize,
    pub db_path: PathBuf,
    pub log_dir: PathBuf,
    pub retry: RetryConfig,
    pub media: MediaConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub max_retries: u32,
}

/// Placeholder id -> URL tables used when exporting Markdown.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub links: HashMap<String, String>,
    pub images: HashMap<String, String>,
    pub videos: HashMap<String, String>,
    pub image_output: ImageOutput,
    pub unresolved: Unresolved,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: "catppuccin-mocha".to_owned(),
            context_lines: DEFAULT_CONTEXT_LINES,
            db_path: PathBuf::from(".redline/reviews.db"),
            log_dir: std::env::temp_dir(),
            retry: RetryConfig::default(),
            media: MediaConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            base_delay_ms: policy.base_delay.as_millis() as u64,
            max_delay_ms: policy.max_delay.as_millis() as u64,
            max_retries: policy.max_retries,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            max_retries: self.max_retries,
        }
    }
}

impl Config {
    /// Lets command-line flags override file settings.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(n) = cli.context {
            self.context_lines = n;
        }
        if let Some(db) = &cli.db {
            self.db_path = db.clone();
        }
    }
}

/// Returns the path to the redline config file.
///
/// Prefers `$XDG_CONFIG_HOME/redline/config.toml`; falls back to
/// `~/.config/redline/config.toml` when the env var is absent.
pub fn config_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(".config"))
        })
        .unwrap_or_else(|| PathBuf::from(".config"));
    base.join("redline").join("config.toml")
}

/// Loads the config at `path`. Never fails; see the module docs.
pub fn load(path: &Path) -> (Config, Option<String>) {
    let raw = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(_) => return (Config::default(), None),
    };
    parse(&raw).map_or_else(
        |e| {
            (
                Config::default(),
                Some(format!("config parse error in {}: {e}", path.display())),
            )
        },
        |config| (config, None),
    )
}

fn parse(raw: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config.context_lines, 3);
        assert_eq!(config.theme, "catppuccin-mocha");
        assert_eq!(config.retry.policy(), RetryPolicy::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = parse(
            r#"
            theme = "dark"
            context_lines = 5

            [retry]
            max_retries = 2

            [media.links]
            docs = "https://example.com/docs"
            "#,
        )
        .unwrap();
        assert_eq!(config.theme, "dark");
        assert_eq!(config.context_lines, 5);
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.retry.base_delay_ms, 350);
        assert_eq!(
            config.media.links.get("docs").map(String::as_str),
            Some("https://example.com/docs")
        );
        assert_eq!(config.media.image_output, ImageOutput::Url);
        assert_eq!(config.media.unresolved, Unresolved::Remove);
    }

    #[test]
    fn media_policies_parse() {
        let config = parse(
            r#"
            [media]
            image_output = "markdown"
            unresolved = "keep"
            "#,
        )
        .unwrap();
        assert_eq!(config.media.image_output, ImageOutput::Markdown);
        assert_eq!(config.media.unresolved, Unresolved::Keep);
    }

    #[test]
    fn broken_file_falls_back_with_warning() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "context_lines = \"many\"").unwrap();

        let (config, warning) = load(&path);
        assert_eq!(config.context_lines, 3);
        assert!(warning.unwrap().contains("config parse error"));
    }

    #[test]
    fn missing_file_is_silent() {
        let dir = tempfile::TempDir::new().unwrap();
        let (config, warning) = load(&dir.path().join("absent.toml"));
        assert!(warning.is_none());
        assert_eq!(config.db_path, PathBuf::from(".redline/reviews.db"));
    }

    #[test]
    fn cli_flags_override() {
        use clap::Parser;
        let cli = Cli::parse_from(["redline", "a", "b", "--context", "0", "--db", "x.db"]);
        let mut config = Config::default();
        config.apply_cli(&cli);
        assert_eq!(config.context_lines, 0);
        assert_eq!(config.db_path, PathBuf::from("x.db"));
    }
}
