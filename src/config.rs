use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Missing required input: {0}")]
    MissingInput(&'static str),

    #[error("Invalid value for {input}: {value}")]
    InvalidInput { input: &'static str, value: String },
}

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_MAX_TOKENS: u32 = 3000;

/// Fully resolved configuration for one run. Constructed once at process
/// entry and passed by reference into the controller.
#[derive(Debug, Clone)]
pub struct Config {
    /// GitHub API token.
    pub github_token: String,
    /// OpenAI API key.
    pub openai_api_key: String,
    /// Chat model identifier.
    pub model: String,
    /// Output-token budget for the completion call.
    pub max_tokens: u32,
    /// Optional user prompt template.
    pub template: Option<String>,
    /// Optional override for the built-in system instruction.
    pub system_prompt: Option<String>,
}

/// Raw contents of .pr-review.toml. All fields are optional — the tool
/// works with zero config when inputs come from the environment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub github: GitHubSection,

    #[serde(default)]
    pub openai: OpenAiSection,

    #[serde(default)]
    pub prompt: PromptSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitHubSection {
    /// GitHub API token. If None, falls back to action inputs / GITHUB_TOKEN.
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenAiSection {
    /// OpenAI API key. If None, falls back to action inputs / OPENAI_API_KEY.
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromptSection {
    pub template: Option<String>,
    pub system_prompt: Option<String>,
}

/// Inputs gathered from the environment. On a GitHub Actions runner these
/// are the INPUT_* variables the runner sets for each `with:` entry; the
/// plain-named variables cover local invocations.
#[derive(Debug, Clone, Default)]
pub struct EnvInputs {
    pub token: Option<String>,
    pub openai_api_key: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<String>,
    pub template: Option<String>,
    pub system_prompt: Option<String>,
    pub github_token_fallback: Option<String>,
    pub openai_api_key_fallback: Option<String>,
}

impl EnvInputs {
    pub fn from_env() -> Self {
        EnvInputs {
            token: action_input("TOKEN"),
            openai_api_key: action_input("OPENAI_API_KEY"),
            model: action_input("MODEL"),
            max_tokens: action_input("MAX_TOKENS"),
            template: action_input("TEMPLATE"),
            system_prompt: action_input("SYSTEM_PROMPT"),
            github_token_fallback: non_empty_var("GITHUB_TOKEN"),
            openai_api_key_fallback: non_empty_var("OPENAI_API_KEY"),
        }
    }
}

fn action_input(name: &str) -> Option<String> {
    non_empty_var(&format!("INPUT_{name}"))
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load configuration from .pr-review.toml in the current directory
    /// (if present) merged with environment inputs.
    pub fn load() -> Result<Config, ConfigError> {
        let path = Path::new(".pr-review.toml");
        let file = if path.exists() {
            ConfigFile::load_from(path)?
        } else {
            ConfigFile::default()
        };

        Config::resolve(file, EnvInputs::from_env())
    }

    /// Merge file contents and environment inputs into a resolved Config.
    /// Precedence per field: action input > config file > ambient env var.
    pub fn resolve(file: ConfigFile, env: EnvInputs) -> Result<Config, ConfigError> {
        let github_token = env
            .token
            .or(file.github.token)
            .or(env.github_token_fallback)
            .ok_or(ConfigError::MissingInput("token"))?;

        let openai_api_key = env
            .openai_api_key
            .or(file.openai.api_key)
            .or(env.openai_api_key_fallback)
            .ok_or(ConfigError::MissingInput("openai_api_key"))?;

        let model = env
            .model
            .or(file.openai.model)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let max_tokens = match env.max_tokens {
            Some(raw) => {
                raw.trim()
                    .parse::<u32>()
                    .map_err(|_| ConfigError::InvalidInput {
                        input: "max_tokens",
                        value: raw.clone(),
                    })?
            }
            None => file.openai.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        };

        let template = env.template.or(file.prompt.template);
        let system_prompt = env.system_prompt.or(file.prompt.system_prompt);

        Ok(Config {
            github_token,
            openai_api_key,
            model,
            max_tokens,
            template,
            system_prompt,
        })
    }
}

impl ConfigFile {
    /// Load from a specific path (useful for testing).
    pub fn load_from(path: &Path) -> Result<ConfigFile, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let file = toml::from_str(&contents)?;
        Ok(file)
    }
}
