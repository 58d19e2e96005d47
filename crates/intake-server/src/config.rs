use std::env;
use std::fmt::Display;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use intake_auth::trust::DEFAULT_SESSION_TTL;
use intake_autosave::pipeline::AutosaveConfig;

/// Where client, device and draft records live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    S3 {
        bucket: String,
        /// Overrides the region from the AWS config chain.
        region: Option<String>,
    },
    /// In-process store for local development, optionally seeded with a JSON
    /// array of clients.
    Memory { seed_file: Option<PathBuf> },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub store: StoreBackend,
    /// Mark device cookies `Secure`; disable only when serving plain HTTP.
    pub secure_cookies: bool,
    pub autosave: AutosaveConfig,
    /// How long a remember=false login opens the workspace.
    pub session_ttl: Duration,
    /// Open workspaces unused for this long are closed.
    pub workspace_idle: Duration,
}

impl ServerConfig {
    pub fn from_env() -> eyre::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key lookup; unset keys take their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> eyre::Result<Self> {
        let store = match lookup("INTAKE_STORE").as_deref().unwrap_or("s3") {
            "s3" => StoreBackend::S3 {
                bucket: lookup("INTAKE_BUCKET").unwrap_or_else(|| "intake".to_string()),
                region: lookup("INTAKE_S3_REGION"),
            },
            "memory" => StoreBackend::Memory {
                seed_file: lookup("INTAKE_SEED_FILE").map(PathBuf::from),
            },
            other => {
                return Err(eyre::eyre!(
                    "INTAKE_STORE must be \"s3\" or \"memory\", got {other:?}"
                ));
            }
        };

        let defaults = AutosaveConfig::default();
        let autosave = AutosaveConfig {
            quiet_period: Duration::from_millis(parse_or(
                &lookup,
                "INTAKE_AUTOSAVE_QUIET_MS",
                defaults.quiet_period.as_millis() as u64,
            )?),
            saved_display: Duration::from_millis(parse_or(
                &lookup,
                "INTAKE_SAVED_DISPLAY_MS",
                defaults.saved_display.as_millis() as u64,
            )?),
        };

        Ok(Self {
            bind_addr: parse_or(&lookup, "INTAKE_BIND_ADDR", ([0, 0, 0, 0], 8080).into())?,
            store,
            secure_cookies: parse_or(&lookup, "INTAKE_SECURE_COOKIES", true)?,
            autosave,
            session_ttl: Duration::from_secs(parse_or(
                &lookup,
                "INTAKE_SESSION_TTL_SECS",
                DEFAULT_SESSION_TTL.as_secs(),
            )?),
            workspace_idle: Duration::from_secs(parse_or(
                &lookup,
                "INTAKE_WORKSPACE_IDLE_SECS",
                30 * 60,
            )?),
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> eyre::Result<T>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| eyre::eyre!("invalid {key} value {raw:?}: {e}")),
        None => {
            tracing::info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> eyre::Result<ServerConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(
            config.store,
            StoreBackend::S3 {
                bucket: "intake".to_string(),
                region: None
            }
        );
        assert!(config.secure_cookies);
        assert_eq!(config.autosave.quiet_period, Duration::from_secs(1));
        assert_eq!(config.autosave.saved_display, Duration::from_secs(2));
        assert_eq!(config.session_ttl, Duration::from_secs(12 * 60 * 60));
        assert_eq!(config.workspace_idle, Duration::from_secs(30 * 60));
    }

    #[test]
    fn overrides() {
        let config = config(&[
            ("INTAKE_BIND_ADDR", "127.0.0.1:3000"),
            ("INTAKE_STORE", "memory"),
            ("INTAKE_SEED_FILE", "/etc/intake/clients.json"),
            ("INTAKE_SECURE_COOKIES", "false"),
            ("INTAKE_AUTOSAVE_QUIET_MS", "250"),
            ("INTAKE_WORKSPACE_IDLE_SECS", "600"),
        ])
        .unwrap();

        assert_eq!(config.bind_addr, "127.0.0.1:3000".parse().unwrap());
        assert_eq!(
            config.store,
            StoreBackend::Memory {
                seed_file: Some(PathBuf::from("/etc/intake/clients.json"))
            }
        );
        assert!(!config.secure_cookies);
        assert_eq!(config.autosave.quiet_period, Duration::from_millis(250));
        assert_eq!(config.workspace_idle, Duration::from_secs(600));
    }

    #[test]
    fn invalid_values_are_errors() {
        assert!(config(&[("INTAKE_STORE", "postgres")]).is_err());
        assert!(config(&[("INTAKE_SECURE_COOKIES", "sometimes")]).is_err());
        assert!(config(&[("INTAKE_AUTOSAVE_QUIET_MS", "-5")]).is_err());
        assert!(config(&[("INTAKE_BIND_ADDR", "localhost")]).is_err());
    }
}
