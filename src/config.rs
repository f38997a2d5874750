use std::{env, str::FromStr, time::Duration};

use crate::{models::header::Theme, services::sessions::SessionLimits};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Memory,
    File,
    Redis,
}

impl FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(BackendKind::Memory),
            "file" => Ok(BackendKind::File),
            "redis" => Ok(BackendKind::Redis),
            other => anyhow::bail!("Unknown DISMISSAL_BACKEND '{}' (expected memory, file or redis)", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Path of the console's deployment.config.json
    pub console_config_path: String,
    pub dismissal_backend: BackendKind,
    pub dismissal_dir: String,
    pub redis_url: String,
    pub admin_key: String,
    pub app_base_url: String,
    /// Brand overrides from the active theme (THEME_NAME, THEME_APP_NAME, THEME_LOGO)
    pub theme: Theme,
    pub session_limits: SessionLimits,
    /// How often idle sessions are swept
    pub session_sweep_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,
            console_config_path: required("CONSOLE_CONFIG_PATH")?,
            dismissal_backend: env::var("DISMISSAL_BACKEND")
                .unwrap_or_else(|_| "memory".into())
                .parse()?,
            dismissal_dir: env::var("DISMISSAL_DIR")
                .unwrap_or_else(|_| "./data/dismissals".into()),
            redis_url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into()),
            admin_key: required("ADMIN_KEY")?,
            app_base_url: env::var("APP_BASE_URL")
                .unwrap_or_else(|_| "http://localhost".into()),
            theme: Theme {
                name: env::var("THEME_NAME").unwrap_or_else(|_| "default".into()),
                app_name: optional("THEME_APP_NAME"),
                logo: optional("THEME_LOGO"),
            },
            session_limits: SessionLimits {
                max_sessions: env::var("MAX_SESSIONS")
                    .unwrap_or_else(|_| "10000".into())
                    .parse()?,
                idle_ttl: Duration::from_secs(
                    env::var("SESSION_IDLE_SECS")
                        .unwrap_or_else(|_| "1800".into())
                        .parse()?,
                ),
            },
            session_sweep_secs: env::var("SESSION_SWEEP_SECS")
                .unwrap_or_else(|_| "60".into())
                .parse()?,
        })
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).map_err(|_| anyhow::anyhow!("Missing required env var: {}", key))
}
