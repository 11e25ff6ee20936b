use log::LevelFilter;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_TEMPERATURE: f64 = 0.9;
pub const DEFAULT_TOKEN_LIMIT: usize = 4000;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for field '{field}': {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required field: {field}")]
    MissingRequired { field: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Knobs of the completion call and the request budget.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyConfig {
    pub model: String,
    pub temperature: f64,
    /// Requests whose token total reaches this value are rejected
    pub token_limit: usize,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            token_limit: DEFAULT_TOKEN_LIMIT,
        }
    }
}

#[derive(Clone)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
    /// Bearer credential for the upstream API. Checked on every request, not at startup.
    pub api_key: Option<String>,
    /// Base URL shared by the moderation and completion endpoints
    pub api_base: String,
    pub policy: PolicyConfig,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub log_level: LevelFilter,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            policy: PolicyConfig::default(),
            request_timeout_secs: 600,
            connect_timeout_secs: 10,
            log_level: LevelFilter::Info,
        }
    }
}

impl ProxyConfig {
    /// The API key if one is set and not blank
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn moderation_url(&self) -> String {
        format!("{}/v1/moderations", self.api_base.trim_end_matches('/'))
    }

    pub fn completion_url(&self) -> String {
        format!("{}/v1/chat/completions", self.api_base.trim_end_matches('/'))
    }
}

impl std::fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base", &self.api_base)
            .field("policy", &self.policy)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("log_level", &self.log_level)
            .finish()
    }
}

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(config: &ProxyConfig) -> ConfigResult<()> {
        if config.host.is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "host".to_string(),
            });
        }

        if config.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "port".to_string(),
                value: config.port.to_string(),
                reason: "Must be > 0".to_string(),
            });
        }

        if !(config.api_base.starts_with("http://") || config.api_base.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "api_base".to_string(),
                value: config.api_base.clone(),
                reason: "Must start with http:// or https://".to_string(),
            });
        }

        if config.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_secs".to_string(),
                value: config.request_timeout_secs.to_string(),
                reason: "Must be > 0".to_string(),
            });
        }

        if config.connect_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "connect_timeout_secs".to_string(),
                value: config.connect_timeout_secs.to_string(),
                reason: "Must be > 0".to_string(),
            });
        }

        Self::validate_policy(&config.policy)
    }

    fn validate_policy(policy: &PolicyConfig) -> ConfigResult<()> {
        if policy.model.is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "model".to_string(),
            });
        }

        if !(0.0..=2.0).contains(&policy.temperature) {
            return Err(ConfigError::InvalidValue {
                field: "temperature".to_string(),
                value: policy.temperature.to_string(),
                reason: "Must be between 0.0 and 2.0".to_string(),
            });
        }

        if policy.token_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "token_limit".to_string(),
                value: policy.token_limit.to_string(),
                reason: "Must be > 0".to_string(),
            });
        }

        Ok(())
    }
}
