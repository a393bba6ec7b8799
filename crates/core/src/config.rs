use std::{
    fs::{self, File},
    io::Write,
    path::PathBuf,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::assets::{get_config_dir, get_default_config};

#[derive(Error, Debug)]
pub enum DuologConfigError {
    #[error("File system error: {0}")]
    IO(#[from] std::io::Error),
    #[error("YAML parsing error: {0}")]
    YAMLError(#[from] serde_yaml::Error),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Display color for a bot's streamed output (serialized as lowercase strings).
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BotColor {
    Cyan,
    Yellow,
    Green,
    Blue,
    Magenta,
    Red,
}

/// One conversation participant.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct BotConfig {
    /// Logical service name for the cluster lookup.
    pub service: String,
    /// Model identifier sent with each generate request.
    pub model: String,
    /// Display name printed in the turn header.
    pub name: String,
    pub color: BotColor,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Banner title printed before the opening turn.
    pub topic: String,
    /// Prompt for the opening turn, before any model-generated text exists.
    pub seed_prompt: String,
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
    #[serde(default = "default_warmup_delay_secs")]
    pub warmup_delay_secs: u64,
    #[serde(default = "default_turn_delay_secs")]
    pub turn_delay_secs: u64,
    /// Exactly two entries. The first bot speaks the opening turn.
    pub bots: Vec<BotConfig>,
}

fn default_namespace() -> String {
    "ollama".to_string()
}

fn default_max_turns() -> usize {
    4
}

fn default_warmup_delay_secs() -> u64 {
    10
}

fn default_turn_delay_secs() -> u64 {
    1
}

impl Config {
    fn validate(&self) -> Result<(), DuologConfigError> {
        if self.bots.len() != 2 {
            return Err(DuologConfigError::Config(format!(
                "Expected exactly 2 bots, found {}",
                self.bots.len()
            )));
        }
        for bot in &self.bots {
            if bot.service.is_empty() {
                return Err(DuologConfigError::Config(format!(
                    "Bot '{}' has an empty service name",
                    bot.name
                )));
            }
            if bot.model.is_empty() {
                return Err(DuologConfigError::Config(format!(
                    "Bot '{}' has an empty model name",
                    bot.name
                )));
            }
        }
        if self.seed_prompt.trim().is_empty() {
            return Err(DuologConfigError::Config(
                "Seed prompt must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[instrument(skip(config_path))]
pub fn create_or_get_config_file(
    config_path: Option<PathBuf>,
) -> Result<(bool, PathBuf), DuologConfigError> {
    let actual_path = config_path.unwrap_or_else(|| {
        let config_dir = get_config_dir();
        config_dir.join("duolog.yml")
    });

    let parent_dir = actual_path.parent().ok_or_else(|| {
        DuologConfigError::IO(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "Config path has no parent directory",
        ))
    })?;

    if !parent_dir.exists() {
        fs::create_dir_all(parent_dir)?;
    }

    if actual_path.exists() {
        Ok((true, actual_path))
    } else {
        File::create(&actual_path)?.write_all(get_default_config().as_bytes())?;
        Ok((false, actual_path))
    }
}

#[instrument(skip(config_path))]
pub fn get_config(config_path: Option<PathBuf>) -> Result<Config, DuologConfigError> {
    let (_, config_file) = create_or_get_config_file(config_path)?;
    let content = fs::read_to_string(&config_file)?;
    let config: Config = serde_yaml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::{fs::File, io::Write, path::PathBuf};

    use tempfile::tempdir;

    use super::*;

    fn write_config(dir: &tempfile::TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("duolog.yml");
        File::create(&path)
            .unwrap()
            .write_all(content.as_bytes())
            .unwrap();
        path
    }

    #[test]
    fn test_default_config_is_valid() {
        let dir = tempdir().unwrap();
        let path = write_config(&dir, &get_default_config());
        let config = get_config(Some(path)).unwrap();

        assert_eq!(config.namespace, "ollama");
        assert_eq!(config.max_turns, 4);
        assert_eq!(config.warmup_delay_secs, 10);
        assert_eq!(config.turn_delay_secs, 1);
        assert_eq!(config.bots.len(), 2);
        assert_eq!(config.bots[0].model, "llama2");
        assert_eq!(config.bots[0].color, BotColor::Cyan);
        assert_eq!(config.bots[1].name, "Mistral");
        assert!(config.seed_prompt.starts_with("Mistral, as fellow AI"));
    }

    #[test]
    fn test_missing_config_file_is_created() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("duolog.yml");
        assert!(!path.exists());

        let (existed, created_path) = create_or_get_config_file(Some(path.clone())).unwrap();
        assert!(!existed);
        assert_eq!(created_path, path);
        assert!(path.exists());

        // Second call finds the file in place.
        let (existed, _) = create_or_get_config_file(Some(path)).unwrap();
        assert!(existed);
    }

    #[test]
    fn test_optional_fields_use_defaults() {
        let dir = tempdir().unwrap();
        let content = r#"
topic: "Test topic"
seed_prompt: "Say hello"
bots:
  - service: svc-a
    model: modela
    name: Bot A
    color: green
  - service: svc-b
    model: modelb
    name: Bot B
    color: magenta
"#;
        let path = write_config(&dir, content);
        let config = get_config(Some(path)).unwrap();

        assert_eq!(config.namespace, "ollama");
        assert_eq!(config.max_turns, 4);
        assert_eq!(config.warmup_delay_secs, 10);
        assert_eq!(config.turn_delay_secs, 1);
        assert_eq!(config.bots[1].color, BotColor::Magenta);
    }

    #[test]
    fn test_wrong_bot_count_is_rejected() {
        let dir = tempdir().unwrap();
        let content = r#"
topic: "Test topic"
seed_prompt: "Say hello"
bots:
  - service: svc-a
    model: modela
    name: Bot A
    color: green
"#;
        let path = write_config(&dir, content);
        let err = get_config(Some(path)).unwrap_err();
        assert!(matches!(err, DuologConfigError::Config(_)));
        assert!(err.to_string().contains("Expected exactly 2 bots"));
    }

    #[test]
    fn test_empty_model_is_rejected() {
        let dir = tempdir().unwrap();
        let content = r#"
topic: "Test topic"
seed_prompt: "Say hello"
bots:
  - service: svc-a
    model: ""
    name: Bot A
    color: green
  - service: svc-b
    model: modelb
    name: Bot B
    color: magenta
"#;
        let path = write_config(&dir, content);
        let err = get_config(Some(path)).unwrap_err();
        assert!(err.to_string().contains("empty model name"));
    }

    #[test]
    fn test_malformed_yaml_is_rejected() {
        let dir = tempdir().unwrap();
        let path = write_config(&dir, "topic: [unterminated");
        let err = get_config(Some(path)).unwrap_err();
        assert!(matches!(err, DuologConfigError::YAMLError(_)));
    }
}
