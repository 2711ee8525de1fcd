//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::storage::config::DriveConfig;

// ============================================================================
// Server Configuration Constants
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 8000;

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Default CORS allowed origin.
pub const DEFAULT_CORS_ALLOWED_ORIGIN: &str = "*";

/// Default retrieval tool binary, resolved through `PATH`.
pub const DEFAULT_YTDLP_PATH: &str = "yt-dlp";

/// Default directory for locally materialized downloads.
pub const DEFAULT_DOWNLOAD_DIR: &str = "./downloads";

/// Default timeout for a single callback delivery in seconds.
pub const DEFAULT_CALLBACK_TIMEOUT_SECS: u64 = 10;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub downloader: DownloaderConfig,
    pub drive: DriveConfig,
    pub callback: CallbackConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

/// External retrieval tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloaderConfig {
    pub binary_path: PathBuf,
    pub output_dir: PathBuf,
}

/// Outbound callback configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackConfig {
    pub timeout_secs: u64,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            server: ServerConfig {
                host: std::env::var("MEDIADROP_HOST")
                    .unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
                port: env_or("MEDIADROP_PORT", DEFAULT_SERVER_PORT),
                shutdown_timeout_secs: env_or(
                    "MEDIADROP_SHUTDOWN_TIMEOUT",
                    DEFAULT_SHUTDOWN_TIMEOUT_SECS,
                ),
            },
            cors: CorsConfig {
                allowed_origins: std::env::var("CORS_ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| DEFAULT_CORS_ALLOWED_ORIGIN.to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                allow_credentials: env_or("CORS_ALLOW_CREDENTIALS", false),
            },
            downloader: DownloaderConfig {
                binary_path: std::env::var("YTDLP_PATH")
                    .unwrap_or_else(|_| DEFAULT_YTDLP_PATH.to_string())
                    .into(),
                output_dir: std::env::var("DOWNLOAD_DIR")
                    .unwrap_or_else(|_| DEFAULT_DOWNLOAD_DIR.to_string())
                    .into(),
            },
            drive: DriveConfig::from_env(),
            callback: CallbackConfig {
                timeout_secs: env_or("CALLBACK_TIMEOUT_SECS", DEFAULT_CALLBACK_TIMEOUT_SECS),
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        if self.downloader.binary_path.as_os_str().is_empty() {
            anyhow::bail!("YTDLP_PATH cannot be empty");
        }

        if self.downloader.output_dir.as_os_str().is_empty() {
            anyhow::bail!("DOWNLOAD_DIR cannot be empty");
        }

        if self.callback.timeout_secs == 0 {
            anyhow::bail!("CALLBACK_TIMEOUT_SECS must be greater than 0");
        }

        self.drive.validate()?;

        // tower-http refuses credentials combined with a wildcard origin
        if self.cors.allow_credentials && self.cors.allowed_origins.iter().any(|o| o == "*") {
            anyhow::bail!("CORS_ALLOW_CREDENTIALS cannot be combined with a wildcard origin");
        }

        if self.cors.allowed_origins.is_empty() {
            tracing::warn!("No CORS origins configured - all origins will be allowed");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: DEFAULT_SERVER_HOST.to_string(),
                port: DEFAULT_SERVER_PORT,
                shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            },
            cors: CorsConfig {
                allowed_origins: vec![DEFAULT_CORS_ALLOWED_ORIGIN.to_string()],
                allow_credentials: false,
            },
            downloader: DownloaderConfig {
                binary_path: PathBuf::from(DEFAULT_YTDLP_PATH),
                output_dir: PathBuf::from(DEFAULT_DOWNLOAD_DIR),
            },
            drive: DriveConfig::default(),
            callback: CallbackConfig {
                timeout_secs: DEFAULT_CALLBACK_TIMEOUT_SECS,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const ENV_KEYS: [&str; 6] = [
        "MEDIADROP_PORT",
        "YTDLP_PATH",
        "DOWNLOAD_DIR",
        "CALLBACK_TIMEOUT_SECS",
        "CORS_ALLOWED_ORIGINS",
        "CORS_ALLOW_CREDENTIALS",
    ];

    fn clear_env() {
        for key in ENV_KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_load_reads_environment() {
        clear_env();
        std::env::set_var("MEDIADROP_PORT", "9123");
        std::env::set_var("YTDLP_PATH", "/opt/bin/yt-dlp");
        std::env::set_var("DOWNLOAD_DIR", "/srv/media");
        std::env::set_var("CORS_ALLOWED_ORIGINS", "https://a.example, https://b.example");

        let config = Config::load().unwrap();
        assert_eq!(config.server.port, 9123);
        assert_eq!(config.downloader.binary_path, PathBuf::from("/opt/bin/yt-dlp"));
        assert_eq!(config.downloader.output_dir, PathBuf::from("/srv/media"));
        assert_eq!(
            config.cors.allowed_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );

        clear_env();
    }

    #[test]
    #[serial]
    fn test_unparseable_values_fall_back_to_defaults() {
        clear_env();
        std::env::set_var("MEDIADROP_PORT", "not-a-port");
        std::env::set_var("CALLBACK_TIMEOUT_SECS", "-3");

        let config = Config::load().unwrap();
        assert_eq!(config.server.port, DEFAULT_SERVER_PORT);
        assert_eq!(config.callback.timeout_secs, DEFAULT_CALLBACK_TIMEOUT_SECS);

        clear_env();
    }

    #[test]
    fn test_validate_rejects_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_credentials_with_wildcard_origin() {
        let mut config = Config::default();
        config.cors.allow_credentials = true;
        assert!(config.validate().is_err());

        config.cors.allowed_origins = vec!["https://app.example".to_string()];
        assert!(config.validate().is_ok());
    }
}
