//! Environment-driven configuration.
//!
//! | Variable              | Default                  |
//! |-----------------------|--------------------------|
//! | `HOST`                | `0.0.0.0`                |
//! | `PORT`                | `5000`                   |
//! | `APP_ENV`             | `development`            |
//! | `CLIENT_URL`          | empty (any origin)       |
//! | `STORAGE_MODE`        | `redis`                  |
//! | `REDIS_URL`           | `redis://127.0.0.1:6379` |
//! | `AUTH_MODE`           | `firebase`               |
//! | `FIREBASE_PROJECT_ID` | required for `firebase`  |
//! | `AUTH_SHARED_SECRET`  | required for `shared_secret` |
//! | `STATIC_DIR`          | `frontend/dist`          |

use std::path::PathBuf;

use axum::http::HeaderValue;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be set when {reason}")]
    Missing { name: &'static str, reason: &'static str },

    #[error("{name}='{value}' is invalid: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    Redis { url: String },
    Memory,
}

impl StorageConfig {
    pub fn mode(&self) -> &'static str {
        match self {
            StorageConfig::Redis { .. } => "redis",
            StorageConfig::Memory => "memory",
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum AuthConfig {
    Firebase { project_id: String },
    SharedSecret { secret: String },
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthConfig::Firebase { project_id } => f
                .debug_struct("Firebase")
                .field("project_id", project_id)
                .finish(),
            AuthConfig::SharedSecret { .. } => f
                .debug_struct("SharedSecret")
                .field("secret", &"<redacted>")
                .finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub allowed_origins: Vec<String>,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub static_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source. Blank
    /// values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let host = var("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = match var("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|error| ConfigError::Invalid {
                name: "PORT",
                value: raw.clone(),
                reason: error.to_string(),
            })?,
            None => 5000,
        };

        let environment = match var("APP_ENV").as_deref() {
            None | Some("development") => Environment::Development,
            Some("production") => Environment::Production,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "APP_ENV",
                    value: other.to_string(),
                    reason: "expected `development` or `production`".to_string(),
                })
            }
        };

        let allowed_origins = parse_origins(var("CLIENT_URL").as_deref().unwrap_or_default())?;

        let storage = match var("STORAGE_MODE").as_deref() {
            None | Some("redis") => StorageConfig::Redis {
                url: var("REDIS_URL").unwrap_or_else(|| "redis://127.0.0.1:6379".to_string()),
            },
            Some("memory") => StorageConfig::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "STORAGE_MODE",
                    value: other.to_string(),
                    reason: "expected `redis` or `memory`".to_string(),
                })
            }
        };

        let auth = match var("AUTH_MODE").as_deref() {
            None | Some("firebase") => AuthConfig::Firebase {
                project_id: var("FIREBASE_PROJECT_ID").ok_or(ConfigError::Missing {
                    name: "FIREBASE_PROJECT_ID",
                    reason: "AUTH_MODE=firebase",
                })?,
            },
            Some("shared_secret") => AuthConfig::SharedSecret {
                secret: var("AUTH_SHARED_SECRET").ok_or(ConfigError::Missing {
                    name: "AUTH_SHARED_SECRET",
                    reason: "AUTH_MODE=shared_secret",
                })?,
            },
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "AUTH_MODE",
                    value: other.to_string(),
                    reason: "expected `firebase` or `shared_secret`".to_string(),
                })
            }
        };

        let static_dir = var("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("frontend/dist"));

        Ok(Self {
            host,
            port,
            environment,
            allowed_origins,
            storage,
            auth,
            static_dir,
        })
    }

    /// With no allow-list configured every origin is accepted.
    pub fn origin_allowed(&self, origin: &str) -> bool {
        self.allowed_origins.is_empty() || self.allowed_origins.iter().any(|o| o == origin)
    }
}

fn parse_origins(raw: &str) -> Result<Vec<String>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| {
            HeaderValue::from_str(origin)
                .map(|_| origin.to_string())
                .map_err(|error| ConfigError::Invalid {
                    name: "CLIENT_URL",
                    value: origin.to_string(),
                    reason: error.to_string(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_only_project_is_set() {
        let config = config_from(&[("FIREBASE_PROJECT_ID", "planner-dev")]).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.environment, Environment::Development);
        assert!(config.allowed_origins.is_empty());
        assert_eq!(
            config.storage,
            StorageConfig::Redis {
                url: "redis://127.0.0.1:6379".into()
            }
        );
        assert_eq!(
            config.auth,
            AuthConfig::Firebase {
                project_id: "planner-dev".into()
            }
        );
    }

    #[test]
    fn firebase_mode_requires_project_id() {
        let error = config_from(&[]).unwrap_err();
        assert!(matches!(
            error,
            ConfigError::Missing {
                name: "FIREBASE_PROJECT_ID",
                ..
            }
        ));
    }

    #[test]
    fn client_url_is_split_and_trimmed() {
        let config = config_from(&[
            ("AUTH_MODE", "shared_secret"),
            ("AUTH_SHARED_SECRET", "s3cret"),
            ("CLIENT_URL", "https://a.example, https://b.example ,"),
        ])
        .unwrap();
        assert_eq!(
            config.allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert!(config.origin_allowed("https://b.example"));
        assert!(!config.origin_allowed("https://evil.example"));
    }

    #[test]
    fn empty_allow_list_accepts_any_origin() {
        let config = config_from(&[("FIREBASE_PROJECT_ID", "p")]).unwrap();
        assert!(config.origin_allowed("http://localhost:5173"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            config_from(&[("FIREBASE_PROJECT_ID", "p"), ("PORT", "eighty")]),
            Err(ConfigError::Invalid { name: "PORT", .. })
        ));
        assert!(matches!(
            config_from(&[("FIREBASE_PROJECT_ID", "p"), ("STORAGE_MODE", "mongo")]),
            Err(ConfigError::Invalid {
                name: "STORAGE_MODE",
                ..
            })
        ));
        assert!(matches!(
            config_from(&[("FIREBASE_PROJECT_ID", "p"), ("APP_ENV", "staging")]),
            Err(ConfigError::Invalid { name: "APP_ENV", .. })
        ));
    }

    #[test]
    fn secret_is_not_printed() {
        let config = config_from(&[
            ("AUTH_MODE", "shared_secret"),
            ("AUTH_SHARED_SECRET", "hunter2"),
        ])
        .unwrap();
        assert!(!format!("{:?}", config.auth).contains("hunter2"));
    }
}
