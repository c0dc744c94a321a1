use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// System prompt used when neither the request nor the environment provides one.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant";

/// Auth module names accepted by `AUTH_MODULE`.
pub const AUTH_MODULES: &[&str] = &["noop", "noop-with-token"];

/// Conversations remembered before the least recently used one is forgotten.
pub const DEFAULT_CONVERSATION_CAPACITY: usize = 10_000;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u16(profile: &str, key: &str, default: u16) -> u16 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_usize(profile: &str, key: &str, default: usize) -> usize {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_opt(profile, key) {
        Some(v) => matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        None => default,
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    /// Service name reported by `/v1/info`.
    pub name: String,
    pub service: ServiceConfig,
    pub upstream: UpstreamConfig,
    pub customization: CustomizationConfig,
    pub user_data: UserDataConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `AGENTGATE_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("AGENTGATE_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            name: profiled_env_or(p, "SERVICE_NAME", "agentgate"),
            service: ServiceConfig::from_env_profiled(p),
            upstream: UpstreamConfig::from_env_profiled(p),
            customization: CustomizationConfig::from_env_profiled(p),
            user_data: UserDataConfig::from_env_profiled(p),
        }
    }

    /// Reject combinations the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !AUTH_MODULES.contains(&self.service.auth_module.as_str()) {
            return Err(ConfigError::UnknownAuthModule(
                self.service.auth_module.clone(),
            ));
        }
        if self.service.conversation_capacity == 0 {
            return Err(ConfigError::InvalidValue(
                "CONVERSATION_CAPACITY",
                "must be at least 1".to_string(),
            ));
        }
        if !self.user_data.feedback_disabled && self.user_data.feedback_storage.is_none() {
            return Err(ConfigError::MissingStorage("FEEDBACK_STORAGE"));
        }
        if !self.user_data.transcripts_disabled && self.user_data.transcripts_storage.is_none() {
            return Err(ConfigError::MissingStorage("TRANSCRIPTS_STORAGE"));
        }
        Ok(())
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  service:     {} on {}:{}", self.name, self.service.host, self.service.port);
        tracing::info!("  auth:        module={}", self.service.auth_module);
        tracing::info!("  registry:    {} conversations", self.service.conversation_capacity);
        tracing::info!(
            "  upstream:    url={}, api_key={}",
            self.upstream.url,
            if self.upstream.api_key.is_some() { "set" } else { "(none)" }
        );
        tracing::info!(
            "  feedback:    {}",
            if self.user_data.feedback_disabled { "disabled" } else { "enabled" }
        );
        tracing::info!(
            "  transcripts: {}",
            if self.user_data.transcripts_disabled { "disabled" } else { "enabled" }
        );
    }

    /// Return a redacted view safe for API responses (no secrets).
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "name": self.name,
            "service": {
                "host": self.service.host,
                "port": self.service.port,
                "cors_origin": self.service.cors_origin,
                "auth_module": self.service.auth_module,
                "conversation_capacity": self.service.conversation_capacity,
            },
            "upstream": {
                "url": self.upstream.url,
                "timeout_secs": self.upstream.timeout_secs,
                "api_key_configured": self.upstream.api_key.is_some(),
            },
            "customization": {
                "default_system_prompt": self.customization.default_system_prompt,
            },
            "user_data_collection": {
                "feedback_disabled": self.user_data.feedback_disabled,
                "feedback_storage": self.user_data.feedback_storage,
                "transcripts_disabled": self.user_data.transcripts_disabled,
                "transcripts_storage": self.user_data.transcripts_storage,
            },
        })
    }
}

// ── Service ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
    /// One of [`AUTH_MODULES`].
    pub auth_module: String,
    /// Upper bound of the in-memory conversation registry.
    pub conversation_capacity: usize,
}

impl ServiceConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "HOST", "0.0.0.0"),
            port: profiled_env_u16(p, "PORT", 8080),
            cors_origin: profiled_env_or(p, "CORS_ORIGIN", "*"),
            auth_module: profiled_env_or(p, "AUTH_MODULE", "noop").to_lowercase(),
            conversation_capacity: profiled_env_usize(
                p,
                "CONVERSATION_CAPACITY",
                DEFAULT_CONVERSATION_CAPACITY,
            ),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ── Upstream agent service ────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl UpstreamConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            url: profiled_env_or(p, "UPSTREAM_URL", "http://localhost:8321"),
            api_key: profiled_env_opt(p, "UPSTREAM_API_KEY"),
            timeout_secs: profiled_env_u64(p, "UPSTREAM_TIMEOUT_SECS", 180),
        }
    }
}

// ── Customization ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomizationConfig {
    pub default_system_prompt: String,
}

impl CustomizationConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            default_system_prompt: profiled_env_or(p, "DEFAULT_SYSTEM_PROMPT", DEFAULT_SYSTEM_PROMPT),
        }
    }
}

// ── User data collection ──────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDataConfig {
    pub feedback_disabled: bool,
    pub feedback_storage: Option<PathBuf>,
    pub transcripts_disabled: bool,
    pub transcripts_storage: Option<PathBuf>,
}

impl UserDataConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            feedback_disabled: profiled_env_bool(p, "FEEDBACK_DISABLED", true),
            feedback_storage: profiled_env_opt(p, "FEEDBACK_STORAGE").map(PathBuf::from),
            transcripts_disabled: profiled_env_bool(p, "TRANSCRIPTS_DISABLED", true),
            transcripts_storage: profiled_env_opt(p, "TRANSCRIPTS_STORAGE").map(PathBuf::from),
        }
    }

    pub fn transcripts_enabled(&self) -> bool {
        !self.transcripts_disabled
    }

    pub fn feedback_enabled(&self) -> bool {
        !self.feedback_disabled
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profile: String::new(),
            name: "agentgate".to_string(),
            service: ServiceConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                cors_origin: "*".to_string(),
                auth_module: "noop".to_string(),
                conversation_capacity: DEFAULT_CONVERSATION_CAPACITY,
            },
            upstream: UpstreamConfig {
                url: "http://localhost:8321".to_string(),
                api_key: None,
                timeout_secs: 180,
            },
            customization: CustomizationConfig {
                default_system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            },
            user_data: UserDataConfig {
                feedback_disabled: true,
                feedback_storage: None,
                transcripts_disabled: true,
                transcripts_storage: None,
            },
        }
    }
}
