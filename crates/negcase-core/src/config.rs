//! Project configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::suite::{DEFAULT_AUTH_HEADER, DEFAULT_MAX_COMBINATION, GenerationOptions};

/// Project configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// OpenAPI contract path (YAML or JSON)
    pub spec: PathBuf,

    /// Overrides `servers[0].url` from the contract
    #[serde(default)]
    pub base_url: Option<String>,

    /// Headers sent with every request; overwrite contract-derived ones
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Path/query parameter values (entity IDs, etc.)
    #[serde(default)]
    pub path_params: BTreeMap<String, String>,

    /// Headers reported as mandatory by the header generator
    #[serde(default)]
    pub mandatory_headers: Vec<String>,

    /// Header carrying the session token
    #[serde(default = "default_auth_header")]
    pub auth_header: String,

    /// Largest field combination for multi-field cases
    #[serde(default = "default_max_combination")]
    pub max_combination: usize,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_true")]
    pub verify_tls: bool,

    /// Worker threads executing requests
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// CSV report destination
    #[serde(default = "default_report")]
    pub report: PathBuf,

    /// JSON array of paths to restrict the run to
    #[serde(default)]
    pub filter_file: Option<PathBuf>,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub knowledge: KnowledgeConfig,
}

/// Response validator settings (OpenAI-compatible chat endpoint)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: "https://api.perplexity.ai/chat/completions".to_string(),
            model: "sonar-pro".to_string(),
            api_key_env: "PERPLEXITY_API_KEY".to_string(),
        }
    }
}

/// Knowledge base used to give the validator context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeConfig {
    /// Folder of `.txt`/`.md` documents; unset disables the knowledge base
    pub folder: Option<PathBuf>,
    pub chunk_size: usize,
    pub overlap: usize,
    pub top_k: usize,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            folder: None,
            chunk_size: 1000,
            overlap: 200,
            top_k: 3,
        }
    }
}

fn default_auth_header() -> String {
    DEFAULT_AUTH_HEADER.to_string()
}

fn default_max_combination() -> usize {
    DEFAULT_MAX_COMBINATION
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_concurrency() -> usize {
    4
}

fn default_report() -> PathBuf {
    PathBuf::from("negcase-report.csv")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spec: PathBuf::from("openapi.yaml"),
            base_url: None,
            headers: BTreeMap::new(),
            path_params: BTreeMap::new(),
            mandatory_headers: Vec::new(),
            auth_header: default_auth_header(),
            max_combination: default_max_combination(),
            timeout_secs: default_timeout_secs(),
            verify_tls: true,
            concurrency: default_concurrency(),
            report: default_report(),
            filter_file: None,
            llm: LlmConfig::default(),
            knowledge: KnowledgeConfig::default(),
        }
    }
}

impl Config {
    /// Load config from file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))?;

        if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        }
    }

    /// Load from default location (.negcase.toml)
    ///
    /// # Errors
    ///
    /// Returns error if a candidate file exists but cannot be loaded
    pub fn load_default() -> Result<Self, ConfigError> {
        let candidates = [".negcase.toml", ".negcase.json", "negcase.toml"];

        for name in candidates {
            let path = Path::new(name);
            if path.exists() {
                return Self::load(path);
            }
        }

        Ok(Self::default())
    }

    /// Generator knobs carried by this config.
    #[must_use]
    pub fn generation_options(&self) -> GenerationOptions {
        GenerationOptions {
            max_combination: self.max_combination,
            mandatory_headers: self.mandatory_headers.clone(),
            auth_header: self.auth_header.clone(),
        }
    }

    /// Example config file written by `negcase init`
    #[must_use]
    pub fn example() -> &'static str {
        r#"# negcase configuration

# OpenAPI contract (YAML or JSON)
spec = "openapi.yaml"

# Overrides servers[0].url from the contract
# base_url = "http://localhost:8080"

# Sent with every request, overriding contract-derived headers
[headers]
x-session-token = "your-token-here"

# Values for path/query parameters
[path_params]
user_id = "1"

# Header generator labels these as mandatory
# mandatory_headers = ["x-session-token", "x-tenant-id"]

# auth_header = "x-session-token"
# max_combination = 2
# timeout_secs = 30
# verify_tls = true
# concurrency = 4
# report = "negcase-report.csv"
# filter_file = "paths.json"

# [llm]
# enabled = true
# endpoint = "https://api.perplexity.ai/chat/completions"
# model = "sonar-pro"
# api_key_env = "PERPLEXITY_API_KEY"

# [knowledge]
# folder = "knowledgebase"
# chunk_size = 1000
# overlap = 200
# top_k = 3
"#
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {0}: {1}")]
    Io(PathBuf, String),
    #[error("Parse error: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.spec, PathBuf::from("openapi.yaml"));
        assert_eq!(config.base_url, None);
        assert_eq!(config.auth_header, "x-session-token");
        assert_eq!(config.max_combination, 2);
        assert!(config.verify_tls);
        assert!(!config.llm.enabled);
        assert_eq!(config.knowledge.top_k, 3);
    }

    #[test]
    fn parse_minimal_toml_fills_defaults() {
        let config: Config = toml::from_str(r#"spec = "api.yaml""#).unwrap();
        assert_eq!(config.spec, PathBuf::from("api.yaml"));
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.report, PathBuf::from("negcase-report.csv"));
        assert_eq!(config.knowledge.chunk_size, 1000);
        assert_eq!(config.knowledge.overlap, 200);
    }

    #[test]
    fn parse_toml() {
        let toml = r#"
spec = "api.yaml"
base_url = "https://staging.example.com"
mandatory_headers = ["X-Tenant"]
max_combination = 3
verify_tls = false

[headers]
x-session-token = "abc"

[path_params]
user_id = "42"

[llm]
enabled = true
model = "other-model"

[knowledge]
folder = "kb"
top_k = 5
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.base_url.as_deref(), Some("https://staging.example.com"));
        assert_eq!(config.headers.get("x-session-token"), Some(&"abc".to_string()));
        assert_eq!(config.path_params.get("user_id"), Some(&"42".to_string()));
        assert!(!config.verify_tls);
        assert!(config.llm.enabled);
        assert_eq!(config.llm.model, "other-model");
        assert_eq!(config.llm.api_key_env, "PERPLEXITY_API_KEY");
        assert_eq!(config.knowledge.folder, Some(PathBuf::from("kb")));
        assert_eq!(config.knowledge.top_k, 5);
        assert_eq!(config.knowledge.chunk_size, 1000);

        let opts = config.generation_options();
        assert_eq!(opts.max_combination, 3);
        assert_eq!(opts.mandatory_headers, vec!["X-Tenant".to_string()]);
    }

    #[test]
    fn example_parses() {
        let config: Config = toml::from_str(Config::example()).unwrap();
        assert_eq!(config.spec, PathBuf::from("openapi.yaml"));
        assert_eq!(config.path_params.get("user_id"), Some(&"1".to_string()));
    }

    #[test]
    fn load_json_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("negcase.json");
        std::fs::write(&path, r#"{"spec": "c.json", "concurrency": 8}"#).unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.concurrency, 8);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = Config::load(Path::new("/nonexistent/negcase.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(..)));
    }
}
