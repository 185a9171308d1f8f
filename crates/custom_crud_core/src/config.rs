//! Runtime configuration.
//!
//! # Responsibility
//! - Deserialize the TOML configuration with defaults for every key.
//! - Validate values before any component is built from them.
//!
//! # Invariants
//! - Unknown keys are rejected.
//! - A validated config always yields a valid `TableName`.

use crate::db::{DbError, TableName};
use crate::security::capability::{parse_capability, Capability, CapabilityError};
use crate::security::nonce::{NonceError, NonceIssuer, MIN_SECRET_BYTES};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub admin: AdminConfig,
    pub security: SecurityConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Socket address to listen on.
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// SQLite database file.
    pub path: PathBuf,
    /// Prefix of the record table name (`<prefix>custom_crud`).
    pub table_prefix: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("custom_crud.sqlite3"),
            table_prefix: "wp_".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdminConfig {
    /// Path serving the listing/edit page.
    pub page_path: String,
    /// Path receiving save/delete submissions.
    pub post_path: String,
    /// Value of the `page` query parameter that selects this admin page.
    pub page_slug: String,
    pub page_title: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            page_path: "/wp-admin/admin.php".to_string(),
            post_path: "/wp-admin/admin-post.php".to_string(),
            page_slug: "custom-crud-plugin".to_string(),
            page_title: "Custom CRUD".to_string(),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SecurityConfig {
    pub required_capability: String,
    /// Header carrying the host-authenticated user id.
    pub user_header: String,
    /// Header carrying comma-separated capability names.
    pub capabilities_header: String,
    /// Token signing secret; a random one is generated when absent.
    pub nonce_secret: Option<String>,
    pub nonce_lifetime_secs: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            required_capability: "manage_options".to_string(),
            user_header: "x-host-user".to_string(),
            capabilities_header: "x-host-capabilities".to_string(),
            nonce_secret: None,
            nonce_lifetime_secs: 86_400,
        }
    }
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("required_capability", &self.required_capability)
            .field("user_header", &self.user_header)
            .field("capabilities_header", &self.capabilities_header)
            .field("nonce_secret", &self.nonce_secret.as_ref().map(|_| "<redacted>"))
            .field("nonce_lifetime_secs", &self.nonce_lifetime_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `trace|debug|info|warn|error`; build-mode default when absent.
    pub level: Option<String>,
    /// Absolute directory for rolling log files; stderr when absent.
    pub dir: Option<String>,
}

/// Configuration load/validation errors.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config syntax: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

impl From<DbError> for ConfigError {
    fn from(value: DbError) -> Self {
        Self::Invalid(value.to_string())
    }
}

impl From<CapabilityError> for ConfigError {
    fn from(value: CapabilityError) -> Self {
        Self::Invalid(format!("security.required_capability: {value}"))
    }
}

impl From<NonceError> for ConfigError {
    fn from(value: NonceError) -> Self {
        Self::Invalid(format!("security: {value}"))
    }
}

impl AppConfig {
    /// Reads, parses and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Parses and validates TOML text.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every value that later construction relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.bind.trim().is_empty() {
            return Err(ConfigError::Invalid("server.bind must not be empty".to_string()));
        }
        self.table_name()?;

        for (key, path) in [
            ("admin.page_path", &self.admin.page_path),
            ("admin.post_path", &self.admin.post_path),
        ] {
            if !path.starts_with('/') || path.contains(['?', '#', ' ', '{', '}', '*', ':']) {
                return Err(ConfigError::Invalid(format!(
                    "{key} must be a literal absolute path without query, got `{path}`"
                )));
            }
        }
        if self.admin.page_path == self.admin.post_path {
            return Err(ConfigError::Invalid(
                "admin.page_path and admin.post_path must differ".to_string(),
            ));
        }
        let slug_ok = !self.admin.page_slug.is_empty()
            && self.admin.page_slug.bytes().all(|b| {
                b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_'
            });
        if !slug_ok {
            return Err(ConfigError::Invalid(format!(
                "admin.page_slug must match [a-z0-9_-]+, got `{}`",
                self.admin.page_slug
            )));
        }

        self.required_capability()?;
        for (key, header) in [
            ("security.user_header", &self.security.user_header),
            ("security.capabilities_header", &self.security.capabilities_header),
        ] {
            let header_ok = !header.is_empty()
                && header
                    .bytes()
                    .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-');
            if !header_ok {
                return Err(ConfigError::Invalid(format!(
                    "{key} must be a lowercase header name, got `{header}`"
                )));
            }
        }
        if let Some(secret) = &self.security.nonce_secret {
            if secret.len() < MIN_SECRET_BYTES {
                return Err(NonceError::SecretTooShort {
                    min: MIN_SECRET_BYTES,
                    actual: secret.len(),
                }
                .into());
            }
        }
        if self.security.nonce_lifetime_secs < 2 {
            return Err(NonceError::LifetimeTooShort(self.nonce_lifetime()).into());
        }

        if let Some(dir) = &self.logging.dir {
            if !Path::new(dir).is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "logging.dir must be absolute, got `{dir}`"
                )));
            }
        }
        Ok(())
    }

    /// Record table name derived from the configured prefix.
    pub fn table_name(&self) -> Result<TableName, ConfigError> {
        Ok(TableName::from_prefix(&self.database.table_prefix)?)
    }

    pub fn required_capability(&self) -> Result<Capability, ConfigError> {
        Ok(parse_capability(&self.security.required_capability)?)
    }

    pub fn nonce_lifetime(&self) -> Duration {
        Duration::from_secs(self.security.nonce_lifetime_secs)
    }

    /// Builds the token issuer from the configured or a random secret.
    pub fn nonce_issuer(&self) -> Result<NonceIssuer, ConfigError> {
        let issuer = match &self.security.nonce_secret {
            Some(secret) => NonceIssuer::new(secret.as_bytes(), self.nonce_lifetime())?,
            None => NonceIssuer::with_random_secret(self.nonce_lifetime())?,
        };
        Ok(issuer)
    }
}
