use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use toml;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_TARGET_LANGUAGE: &str = "Chinese";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub server_url: String,
    pub target_language: String,
    pub request_timeout_secs: Option<u64>,
    pub log_dir: Option<String>,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            target_language: DEFAULT_TARGET_LANGUAGE.to_string(),
            request_timeout_secs: None,
            log_dir: None,
            log_level: "info".to_string(),
        }
    }
}

/// Values given on the command line. They win over every file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub server_url: Option<String>,
    pub target_language: Option<String>,
    pub log_level: Option<String>,
}

impl Settings {
    pub fn new(overrides: &Overrides) -> Result<Self, ConfigError> {
        Self::load(get_user_config_path().as_deref(), Path::new("medreport.toml"), overrides)
    }

    pub fn load(user_config: Option<&Path>, local_config: &Path, overrides: &Overrides) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            // 1. Built-in defaults.
            .set_default("server_url", DEFAULT_SERVER_URL)?
            .set_default("target_language", DEFAULT_TARGET_LANGUAGE)?
            .set_default("log_level", "info")?;

        // 2. User's global config.
        if let Some(path) = user_config {
            builder = builder.add_source(File::from(path).required(false));
        }

        builder = builder
            // 3. medreport.toml next to where we were started.
            .add_source(File::from(local_config).required(false))
            // 4. MEDREPORT_SERVER_URL and friends.
            .add_source(Environment::with_prefix("MEDREPORT"))
            .set_override_option("server_url", overrides.server_url.clone())?
            .set_override_option("target_language", overrides.target_language.clone())?
            .set_override_option("log_level", overrides.log_level.clone())?;

        builder.build()?.try_deserialize()
    }

    pub fn log_directory(&self) -> Option<PathBuf> {
        if let Some(ref custom) = self.log_dir {
            return Some(PathBuf::from(shellexpand::tilde(custom).into_owned()));
        }
        dirs::data_local_dir().map(|d| d.join("medreport").join("logs"))
    }
}

pub fn get_user_config_path() -> Option<PathBuf> {
    let mut path = dirs::home_dir()?;
    path.push(".config");
    path.push("medreport");
    path.push("medreport.toml");
    Some(path)
}

/// Writes `key = value` into the TOML file at `path`, keeping other keys.
pub fn save_setting(path: &Path, key: &str, value: &str) -> Result<(), anyhow::Error> {
    let config_str = fs::read_to_string(path).unwrap_or_else(|_| "".to_string());
    let mut doc = config_str.parse::<toml::Table>()?;

    doc.insert(key.to_string(), toml::Value::String(value.to_string()));

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, doc.to_string())?;

    Ok(())
}

/// Persists the CLI-provided server and language into the user config.
pub fn save_overrides(overrides: &Overrides) -> Result<Option<PathBuf>, anyhow::Error> {
    let Some(path) = get_user_config_path() else {
        return Err(anyhow::anyhow!("Failed to get home directory"));
    };
    let mut saved = false;
    if let Some(ref url) = overrides.server_url {
        save_setting(&path, "server_url", url)?;
        saved = true;
    }
    if let Some(ref lang) = overrides.target_language {
        save_setting(&path, "target_language", lang)?;
        saved = true;
    }
    Ok(saved.then_some(path))
}
