mod loader;

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::access_log::LogFormat;
use crate::security::{resolve_security_schemes, SecuritySchemes};
use crate::validation::DEFAULT_BODY_LIMIT;

pub use loader::apply_env_overlay;

pub const DEFAULT_TITLE: &str = "Restful API Documents";
pub const DEFAULT_VERSION: &str = "1.0.0";
pub const DEFAULT_OPENAPI_VERSION: &str = "3.0.3";
pub const DEFAULT_RATE_LIMIT: u32 = 100;
pub const DEFAULT_RATE_WINDOW_MINUTES: u64 = 15;

/// Prefix of environment variables overlaid onto loaded settings.
pub const ENV_PREFIX: &str = "NESTOI__";

/// Environment variable selecting the active profile.
pub const PROFILE_ENV: &str = "NESTOI_PROFILE";

/// Error type for settings operations.
#[derive(Debug)]
pub enum ConfigError {
    /// An I/O or YAML parsing error occurred while loading settings files.
    Load(String),
    /// The merged settings do not have the expected shape.
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Load(msg) => write!(f, "Config load error: {msg}"),
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Rate-limit settings as written in configuration files.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RateLimitSettings {
    pub limit: Option<u32>,
    #[serde(alias = "limit-time")]
    pub window_minutes: Option<u64>,
}

/// Documentation UI settings as written in configuration files.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SwaggerSettings {
    pub disabled: Option<bool>,
    pub servers: Vec<String>,
    pub security_schemes: Option<SecuritySchemes>,
    pub openapi_version: Option<String>,
}

/// Every non-code part of the application configuration, all optional.
///
/// Resolution order (lowest to highest priority):
/// 1. `application.yaml`
/// 2. `application-{profile}.yaml`
/// 3. `.env` and `.env.{profile}` (loaded into the process environment)
/// 4. `NESTOI__SECTION__KEY` environment variables
///
/// ```yaml
/// title: Pet Store
/// route-prefix: /api
/// rate-limit:
///   limit: 200
///   window-minutes: 5
/// swagger:
///   servers: [http://localhost:3000]
/// fields:
///   email: { type: string, format: email, example: a@b.co }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AppSettings {
    pub title: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    pub route_prefix: Option<String>,
    pub rate_limit: Option<RateLimitSettings>,
    pub log_format: Option<LogFormat>,
    pub swagger: Option<SwaggerSettings>,
    pub body_limit: Option<usize>,
    /// Field rules as JSON Schema fragments, keyed by field name.
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl AppSettings {
    /// Load settings from the current working directory.
    ///
    /// The profile is taken from `NESTOI_PROFILE` when set, else from `profile`.
    pub fn load(profile: &str) -> Result<Self, ConfigError> {
        Self::load_from(Path::new("."), profile)
    }

    /// Load settings from `dir` for the given profile.
    pub fn load_from(dir: &Path, profile: &str) -> Result<Self, ConfigError> {
        let active_profile =
            std::env::var(PROFILE_ENV).unwrap_or_else(|_| profile.to_string());

        let mut tree = serde_yaml::Value::Null;
        loader::merge_yaml_file(&dir.join("application.yaml"), &mut tree)?;
        loader::merge_yaml_file(&dir.join(format!("application-{active_profile}.yaml")), &mut tree)?;

        // .env files never overwrite variables that are already set.
        let _ = dotenvy::from_path(dir.join(".env"));
        let _ = dotenvy::from_path(dir.join(format!(".env.{active_profile}")));

        apply_env_overlay(&mut tree, std::env::vars());
        Self::from_yaml_value(tree)
    }

    /// Parse settings from a YAML string, without files or environment.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let tree: serde_yaml::Value =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::Load(e.to_string()))?;
        Self::from_yaml_value(tree)
    }

    fn from_yaml_value(tree: serde_yaml::Value) -> Result<Self, ConfigError> {
        if tree.is_null() {
            return Ok(Self::default());
        }
        serde_yaml::from_value(tree).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Fill every unset value with its default. Does not modify `self`.
    pub fn resolve(&self) -> Settings {
        let rate_limit = self.rate_limit.clone().unwrap_or_default();
        let swagger = self.swagger.clone().unwrap_or_default();

        Settings {
            title: self.title.clone().unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            description: self.description.clone(),
            version: self.version.clone().unwrap_or_else(|| DEFAULT_VERSION.to_string()),
            route_prefix: self.route_prefix.as_deref().and_then(normalize_prefix),
            rate_limit: RateLimit {
                // Zero would reject every request, so it means "unset".
                limit: rate_limit.limit.filter(|l| *l > 0).unwrap_or(DEFAULT_RATE_LIMIT),
                window: Duration::from_secs(
                    rate_limit
                        .window_minutes
                        .filter(|m| *m > 0)
                        .unwrap_or(DEFAULT_RATE_WINDOW_MINUTES)
                        .saturating_mul(60),
                ),
            },
            log_format: self.log_format.unwrap_or_default(),
            docs: DocsSettings {
                enabled: !swagger.disabled.unwrap_or(false),
                servers: swagger.servers,
                security_schemes: resolve_security_schemes(swagger.security_schemes.as_ref()),
                openapi_version: swagger
                    .openapi_version
                    .unwrap_or_else(|| DEFAULT_OPENAPI_VERSION.to_string()),
            },
            body_limit: self.body_limit.unwrap_or(DEFAULT_BODY_LIMIT),
        }
    }
}

/// Leading slash enforced, trailing slashes dropped; `""` and `"/"` mean no prefix.
fn normalize_prefix(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(format!("/{trimmed}"))
    }
}

/// Fully resolved settings used to assemble the application.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub title: String,
    pub description: Option<String>,
    pub version: String,
    pub route_prefix: Option<String>,
    pub rate_limit: RateLimit,
    pub log_format: LogFormat,
    pub docs: DocsSettings,
    pub body_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        AppSettings::default().resolve()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    /// Requests allowed per window.
    pub limit: u32,
    pub window: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocsSettings {
    pub enabled: bool,
    pub servers: Vec<String>,
    pub security_schemes: SecuritySchemes,
    pub openapi_version: String,
}
