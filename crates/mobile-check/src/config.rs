//! Configuration management for the Mobile Check CLI.
//!
//! Configuration is loaded from (in order of precedence):
//! 1. Command-line arguments
//! 2. Environment variables (MOBILE_CHECK_*, and VERCEL_URL for the public URL)
//! 3. Config file (~/.config/mobile-check/config.toml)
//! 4. Default values

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use mobile_check_server::server::DEFAULT_REPORT_EMAIL;
use mobile_check_store::{StoreBackend, StoreConfig};
use serde::{Deserialize, Serialize};

/// Environment variable set by Vercel deployments.
pub const VERCEL_URL_ENV: &str = "VERCEL_URL";

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Server host.
    #[serde(default = "default_host")]
    pub server_host: String,

    /// Server port.
    #[serde(default = "default_port")]
    pub server_port: u16,

    /// Where uploaded payloads are kept.
    #[serde(default)]
    pub store_backend: StoreBackend,

    /// Directory for the file store.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Directory of static files served at `/`.
    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,

    /// Base URL used in upload links.
    #[serde(default)]
    pub public_url: Option<String>,

    /// Recipient of checklist reports.
    #[serde(default = "default_report_email")]
    pub report_email: String,

    /// Enable permissive CORS.
    #[serde(default = "default_cors")]
    pub cors: bool,

    /// Reject multipart uploads without a file.
    #[serde(default)]
    pub require_upload_file: bool,

    /// Delete entries once their page has been viewed.
    #[serde(default)]
    pub consume_on_view: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_public_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_report_email() -> String {
    DEFAULT_REPORT_EMAIL.to_string()
}

fn default_cors() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: default_host(),
            server_port: default_port(),
            store_backend: StoreBackend::default(),
            data_dir: default_data_dir(),
            public_dir: default_public_dir(),
            public_url: None,
            report_email: default_report_email(),
            cors: default_cors(),
            require_upload_file: false,
            consume_on_view: false,
        }
    }
}

impl Config {
    /// Loads configuration from all sources.
    ///
    /// Reports warnings for configuration errors but falls back to defaults.
    pub fn load(config_file: Option<&Path>) -> Self {
        let config_path = Self::resolve_path(config_file);

        match Self::try_load(&config_path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("\x1b[33mWarning:\x1b[0m Configuration error, using defaults");
                eprintln!("  Config file: {}", config_path.display());
                eprintln!("  Error: {}", e);
                eprintln!();
                eprintln!("  To fix, edit or delete the config file:");
                eprintln!("    rm {}", config_path.display());
                eprintln!();
                Config::default()
            },
        }
    }

    /// Loads configuration layered over the given file.
    ///
    /// # Errors
    ///
    /// Returns an error if a source holds a value of the wrong type.
    pub fn try_load(config_path: &Path) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("MOBILE_CHECK_"))
            .extract()
    }

    /// Returns the public URL, falling back to the Vercel deployment host.
    #[must_use]
    pub fn resolved_public_url(&self) -> Option<String> {
        self.public_url
            .clone()
            .or_else(|| {
                std::env::var(VERCEL_URL_ENV)
                    .ok()
                    .map(|host| vercel_url(&host))
            })
            .filter(|url| !url.is_empty())
    }

    /// Returns the store settings.
    #[must_use]
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            backend: self.store_backend,
            data_dir: self.data_dir.clone(),
        }
    }

    /// Returns the explicit config file if given, else the default one.
    pub fn resolve_path(config_file: Option<&Path>) -> PathBuf {
        config_file.map_or_else(Self::config_path, Path::to_path_buf)
    }

    /// Returns the path to the config file.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Returns the path to the config directory.
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mobile-check")
    }

    /// Saves the current configuration to `path`.
    pub fn save_to(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let toml_str = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

        std::fs::write(path, toml_str)
    }

    /// Sets the public URL and saves to `path`.
    pub fn set_public_url(&mut self, url: &str, path: &Path) -> Result<(), std::io::Error> {
        self.public_url = Some(url.trim_end_matches('/').to_string());
        self.save_to(path)
    }

    /// Clears the public URL and saves to `path`.
    pub fn clear_public_url(&mut self, path: &Path) -> Result<(), std::io::Error> {
        self.public_url = None;
        self.save_to(path)
    }
}

/// Turns a Vercel deployment host into a base URL.
fn vercel_url(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.is_empty() || host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

/// Prints the current configuration and its sources.
pub fn show_config(config_file: Option<&Path>) {
    let config = Config::load(config_file);
    let config_path = Config::resolve_path(config_file);

    println!("Mobile Check Configuration");
    println!("==========================\n");

    println!("Config file: {}", config_path.display());
    if config_path.exists() {
        println!("Status: Found\n");
    } else {
        println!("Status: Not found (using defaults)\n");
    }

    println!("Current settings:");
    println!("  server_host: {}", config.server_host);
    println!("  server_port: {}", config.server_port);
    println!("  store_backend: {}", config.store_backend);
    println!("  data_dir: {}", config.data_dir.display());
    println!("  public_dir: {}", config.public_dir.display());
    println!(
        "  public_url: {}",
        config
            .resolved_public_url()
            .as_deref()
            .unwrap_or("(derived from request)")
    );
    println!("  report_email: {}", config.report_email);
    println!("  cors: {}", config.cors);
    println!("  require_upload_file: {}", config.require_upload_file);
    println!("  consume_on_view: {}", config.consume_on_view);

    println!("\nEnvironment variables:");
    println!("  MOBILE_CHECK_SERVER_HOST");
    println!("  MOBILE_CHECK_SERVER_PORT");
    println!("  MOBILE_CHECK_STORE_BACKEND");
    println!("  MOBILE_CHECK_DATA_DIR");
    println!("  MOBILE_CHECK_PUBLIC_DIR");
    println!("  MOBILE_CHECK_PUBLIC_URL");
    println!("  MOBILE_CHECK_REPORT_EMAIL");
    println!("  {VERCEL_URL_ENV}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.report_email, DEFAULT_REPORT_EMAIL);
        assert!(config.cors);
        assert_eq!(config.store_config(), StoreConfig::memory());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
server_port = 8088
store_backend = "file"
data_dir = "/var/lib/mobile-check"
public_url = "https://checks.example.com"
consume_on_view = true
"#,
        )
        .unwrap();

        let config = Config::try_load(&path).unwrap();
        assert_eq!(config.server_port, 8088);
        assert_eq!(config.store_backend, StoreBackend::File);
        assert_eq!(
            config.store_config(),
            StoreConfig::file("/var/lib/mobile-check")
        );
        assert_eq!(
            config.public_url.as_deref(),
            Some("https://checks.example.com")
        );
        assert!(config.consume_on_view);
        assert_eq!(config.server_host, "0.0.0.0");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("absent.toml")));
        assert_eq!(config.server_port, Config::default().server_port);
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            public_url: Some("https://checks.example.com".to_string()),
            store_backend: StoreBackend::File,
            ..Config::default()
        };

        config.save_to(&path).unwrap();
        assert_eq!(Config::try_load(&path).unwrap(), config);

        let mut loaded = Config::try_load(&path).unwrap();
        loaded.clear_public_url(&path).unwrap();
        assert_eq!(Config::try_load(&path).unwrap().public_url, None);

        loaded.set_public_url("https://other.example.com/", &path).unwrap();
        assert_eq!(
            Config::try_load(&path).unwrap().public_url.as_deref(),
            Some("https://other.example.com")
        );
    }

    #[test]
    fn test_vercel_url() {
        assert_eq!(vercel_url("my-app.vercel.app"), "https://my-app.vercel.app");
        assert_eq!(vercel_url("https://my-app.vercel.app/"), "https://my-app.vercel.app");
        assert_eq!(vercel_url(" "), "");
    }
}
