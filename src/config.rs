// Configuration module for filmrelay
// Handles XDG-compliant config discovery and the TOML configuration file.
// Priority everywhere is env > config file > default; secrets (catalog
// auth tokens) have no built-in defaults.

use serde::Deserialize;
use std::path::PathBuf;

use crate::resolver::mirrors::{MirrorConfig, MirrorParser, NamingRule};

const APP_NAME: &str = "filmrelay";
const CONFIG_FILENAME: &str = "config.toml";

const DEFAULT_CATALOG_BASE: &str = "https://api.themoviedb.org/3";

/// TOML configuration file structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Server configuration
    pub server: ServerConfig,

    /// Catalog metadata service configuration
    pub catalog: CatalogConfig,

    /// Download-link resolver configuration
    pub resolver: ResolverConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server port (default: 3000)
    pub port: u16,

    /// Bind address (default: 0.0.0.0)
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            bind_address: "0.0.0.0".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Catalog API base URL (default: the public catalog v3 base)
    pub base_url: Option<String>,

    /// Auth query fragment appended to catalog requests ("api_key=...").
    /// Required for live catalog lookups; no default.
    pub auth_query: Option<String>,

    /// Base URL of the identifier-keyed lookup service returning
    /// `{ Title, Year }`. Required for download-link resolution.
    pub lookup_base_url: Option<String>,

    /// Auth query fragment for the lookup service ("apikey=...").
    pub lookup_auth_query: Option<String>,
}

/// Download-link resolver configuration. The mirror list order is the
/// merge priority order of the fan-out.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Per-mirror request timeout in seconds (default: 30)
    pub request_timeout_secs: u64,

    /// Video container extensions accepted by the fan-out table strategy
    /// (lowercase, without dots)
    pub video_extensions: Vec<String>,

    /// Ordered mirror list, highest priority first
    pub mirrors: Vec<MirrorConfig>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            video_extensions: vec!["mkv".to_string(), "mp4".to_string()],
            mirrors: default_mirrors(),
        }
    }
}

/// The known mirror fleet. Operators override or reorder this list via
/// `[[resolver.mirrors]]` entries in config.toml.
fn default_mirrors() -> Vec<MirrorConfig> {
    vec![
        MirrorConfig {
            id: "starkmoviez".to_string(),
            base_url: "https://starkmoviez.com".to_string(),
            naming: NamingRule::DirectId,
            parser: MirrorParser::QualityList,
            year_threshold: 2023,
        },
        MirrorConfig {
            id: "cinedl".to_string(),
            base_url: "https://dl.cinedl.top".to_string(),
            naming: NamingRule::YearAlways,
            parser: MirrorParser::FileTable,
            year_threshold: 2023,
        },
        MirrorConfig {
            id: "tokyodl".to_string(),
            base_url: "https://s3.tokyodl.xyz".to_string(),
            naming: NamingRule::YearThreshold,
            parser: MirrorParser::FileTable,
            year_threshold: 2023,
        },
        MirrorConfig {
            id: "rooztop".to_string(),
            base_url: "https://dl2.rooztop.info".to_string(),
            naming: NamingRule::YearClamped,
            parser: MirrorParser::FileTable,
            year_threshold: 2023,
        },
    ]
}

/// Application configuration - combines TOML file with environment overrides
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server port
    pub port: u16,

    /// Bind address
    pub bind_address: String,

    /// Catalog API base URL
    pub catalog_base_url: String,

    /// Catalog auth query fragment (optional)
    pub catalog_auth_query: Option<String>,

    /// Identifier lookup base URL (optional)
    pub lookup_base_url: Option<String>,

    /// Identifier lookup auth query fragment (optional)
    pub lookup_auth_query: Option<String>,

    /// Resolver configuration
    pub resolver: ResolverConfig,
}

impl AppConfig {
    /// Load configuration from TOML file and environment
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. TOML config file
    /// 3. Default values
    pub fn load() -> Self {
        let config_dir = Self::find_config_dir();
        let config_file = Self::load_config_file(&config_dir);
        Self::build(config_file)
    }

    /// Find the config directory (for locating config.toml)
    fn find_config_dir() -> PathBuf {
        // Environment variable takes priority
        if let Ok(path) = std::env::var("FILMRELAY_CONFIG_DIR") {
            return PathBuf::from(path);
        }

        // Then XDG config dir
        if let Some(dir) = dirs::config_dir() {
            return dir.join(APP_NAME);
        }

        // Fallback to current directory
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }

    /// Load and parse the TOML config file
    fn load_config_file(config_dir: &std::path::Path) -> ConfigFile {
        let config_path = config_dir.join(CONFIG_FILENAME);

        if !config_path.exists() {
            tracing::debug!(
                "No config file found at {}, using defaults",
                config_path.display()
            );
            return ConfigFile::default();
        }

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded configuration from {}", config_path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to parse config file {}: {}. Using defaults.",
                        config_path.display(),
                        e
                    );
                    ConfigFile::default()
                }
            },
            Err(e) => {
                tracing::warn!(
                    "Failed to read config file {}: {}. Using defaults.",
                    config_path.display(),
                    e
                );
                ConfigFile::default()
            }
        }
    }

    /// Build configuration from config file with environment overrides
    fn build(config_file: ConfigFile) -> Self {
        let port = std::env::var("FILMRELAY_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(config_file.server.port);

        let bind_address = std::env::var("FILMRELAY_BIND_ADDRESS")
            .unwrap_or_else(|_| config_file.server.bind_address.clone());

        let catalog_base_url = std::env::var("CATALOG_BASE_URL")
            .ok()
            .or(config_file.catalog.base_url)
            .unwrap_or_else(|| DEFAULT_CATALOG_BASE.to_string());

        let catalog_auth_query = std::env::var("CATALOG_AUTH_QUERY")
            .ok()
            .or(config_file.catalog.auth_query);

        let lookup_base_url = std::env::var("LOOKUP_BASE_URL")
            .ok()
            .or(config_file.catalog.lookup_base_url);

        let lookup_auth_query = std::env::var("LOOKUP_AUTH_QUERY")
            .ok()
            .or(config_file.catalog.lookup_auth_query);

        Self {
            port,
            bind_address,
            catalog_base_url,
            catalog_auth_query,
            lookup_base_url,
            lookup_auth_query,
            resolver: config_file.resolver,
        }
    }

    /// Log configuration status
    pub fn log_config(&self) {
        tracing::info!("Server listening on {}:{}", self.bind_address, self.port);
        tracing::info!("Catalog base: {}", self.catalog_base_url);

        if self.catalog_auth_query.is_none() {
            tracing::warn!(
                "Catalog auth not configured; catalog requests will be rejected upstream"
            );
            tracing::info!("Hint: add auth_query to config.toml or set CATALOG_AUTH_QUERY");
        }

        match &self.lookup_base_url {
            Some(base) => tracing::info!("Title lookup base: {}", base),
            None => {
                tracing::warn!(
                    "Title lookup base not configured; download-link resolution will fail"
                );
                tracing::info!("Hint: add lookup_base_url to config.toml or set LOOKUP_BASE_URL");
            }
        }

        tracing::info!(
            "Resolver: {} mirrors, {}s timeout, extensions {:?}",
            self.resolver.mirrors.len(),
            self.resolver.request_timeout_secs,
            self.resolver.video_extensions
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_file() {
        let config = ConfigFile::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.bind_address, "0.0.0.0");
        assert!(config.catalog.auth_query.is_none());
        assert_eq!(config.resolver.request_timeout_secs, 30);
        assert_eq!(config.resolver.video_extensions, vec!["mkv", "mp4"]);
        assert_eq!(config.resolver.mirrors.len(), 4);
        assert_eq!(config.resolver.mirrors[0].id, "starkmoviez");
    }

    #[test]
    fn test_parse_config_toml() {
        let toml_str = r#"
[server]
port = 9000
bind_address = "127.0.0.1"

[catalog]
auth_query = "api_key=test_key"
lookup_base_url = "https://lookup.example"

[resolver]
request_timeout_secs = 10
video_extensions = ["mkv"]

[[resolver.mirrors]]
id = "solo"
base_url = "https://solo.example"
naming = "year-threshold"
parser = "file-table"
year_threshold = 2022
"#;
        let config: ConfigFile = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.bind_address, "127.0.0.1");
        assert_eq!(
            config.catalog.auth_query,
            Some("api_key=test_key".to_string())
        );
        assert_eq!(
            config.catalog.lookup_base_url,
            Some("https://lookup.example".to_string())
        );
        assert_eq!(config.resolver.request_timeout_secs, 10);
        assert_eq!(config.resolver.video_extensions, vec!["mkv"]);

        let mirror = &config.resolver.mirrors[0];
        assert_eq!(mirror.id, "solo");
        assert_eq!(mirror.naming, NamingRule::YearThreshold);
        assert_eq!(mirror.parser, MirrorParser::FileTable);
        assert_eq!(mirror.year_threshold, 2022);
    }

    #[test]
    fn test_partial_config_toml() {
        // Partial configs fall back to defaults for everything omitted
        let toml_str = r#"
[catalog]
auth_query = "api_key=k"
"#;
        let config: ConfigFile = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 3000); // default
        assert_eq!(config.catalog.auth_query, Some("api_key=k".to_string()));
        assert_eq!(config.resolver.mirrors.len(), 4); // default fleet
    }

    #[test]
    fn test_mirror_threshold_defaults_when_omitted() {
        let toml_str = r#"
[[resolver.mirrors]]
id = "solo"
base_url = "https://solo.example"
naming = "year-always"
parser = "file-table"
"#;
        let config: ConfigFile = toml::from_str(toml_str).unwrap();
        assert_eq!(config.resolver.mirrors[0].year_threshold, 2023);
    }
}
