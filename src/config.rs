//! Layered settings: config file, then the credentials bundle, then
//! `SHIFTSYNC_*` environment variables.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use shiftsync_core::{MessageQuery, SyncSettings};
use shiftsync_provider_google::GoogleCredentials;
use shiftsync_provider_google::types::DEFAULT_TOKEN_URI;

const ENV_PREFIX: &str = "SHIFTSYNC";

const REDACTED: &str = "********";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,

    /// Only consider mail from this address.
    #[serde(default)]
    pub sender_filter: Option<String>,

    #[serde(default)]
    pub subject_filter: Option<String>,

    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,

    /// IANA zone applied to every time in the schedule.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    #[serde(default = "default_event_title")]
    pub event_title: String,

    #[serde(default)]
    pub color_id: Option<String>,

    /// JSON bundle printed by `shiftsync auth`.
    #[serde(default)]
    pub secret_file: Option<PathBuf>,

    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_calendar_id() -> String {
    "primary".to_string()
}

fn default_lookback_days() -> u32 {
    7
}

fn default_timezone() -> String {
    "America/Toronto".to_string()
}

fn default_event_title() -> String {
    "Work".to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// ~/.config/shiftsync/config.toml
pub fn config_path() -> Result<PathBuf> {
    let dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(dir.join("shiftsync").join("config.toml"))
}

impl Settings {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => config_path()?,
        };
        Self::load_with(&path, || Environment::with_prefix(ENV_PREFIX))
    }

    /// Builds twice: the first pass only finds out where the credentials bundle is.
    fn load_with(path: &Path, env: impl Fn() -> Environment) -> Result<Self> {
        let first = Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(env())
            .build()
            .with_context(|| format!("Failed to read config at {}", path.display()))?;

        let mut builder =
            Config::builder().add_source(File::from(path.to_path_buf()).required(false));

        if let Ok(secret_file) = first.get_string("secret_file") {
            let secret_file = expand_path(&secret_file);
            if !secret_file.exists() {
                bail!("Credentials file not found at {}", secret_file.display());
            }
            builder = builder.add_source(File::from(secret_file).format(FileFormat::Json));
        }

        builder
            .add_source(env())
            .build()
            .and_then(|config| config.try_deserialize())
            .with_context(|| format!("Invalid settings in {}", path.display()))
    }

    pub fn sync_settings(&self) -> Result<SyncSettings> {
        let settings =
            SyncSettings::new(&self.event_title, self.color_id.clone(), &self.timezone)?;
        Ok(settings)
    }

    pub fn message_query(&self) -> MessageQuery {
        MessageQuery {
            sender: non_blank(&self.sender_filter),
            subject: non_blank(&self.subject_filter),
            lookback_days: self.lookback_days,
        }
    }

    pub fn credentials(&self) -> Result<GoogleCredentials> {
        match (&self.client_id, &self.client_secret, &self.refresh_token) {
            (Some(client_id), Some(client_secret), Some(refresh_token)) => Ok(GoogleCredentials {
                client_id: client_id.clone(),
                client_secret: client_secret.clone(),
                refresh_token: refresh_token.clone(),
                token_uri: self.token_uri.clone(),
            }),
            _ => bail!(
                "Google credentials are not configured.\n\n\
                Run `shiftsync auth` and point `secret_file` at the bundle it prints,\n\
                or set client_id, client_secret and refresh_token directly."
            ),
        }
    }

    /// A copy safe to print.
    pub fn redacted(&self) -> Self {
        let hide = |value: &Option<String>| value.as_ref().map(|_| REDACTED.to_string());
        Settings {
            client_secret: hide(&self.client_secret),
            refresh_token: hide(&self.refresh_token),
            ..self.clone()
        }
    }

    pub fn create_default_config(path: &Path) -> Result<()> {
        let contents = format!(
            "\
# shiftsync configuration

# Calendar to write shifts to:
# calendar_id = \"{}\"

# Which email carries the schedule:
# sender_filter = \"schedules@example.com\"
# subject_filter = \"Weekly schedule\"
# lookback_days = {}

# Zone the schedule's times are written in:
# timezone = \"{}\"

# Title and color of created events:
# event_title = \"{}\"
# color_id = \"5\"

# Credentials bundle printed by `shiftsync auth`:
# secret_file = \"~/.config/shiftsync/credentials.json\"
",
            default_calendar_id(),
            default_lookback_days(),
            default_timezone(),
            default_event_title(),
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Could not create config directory {}", parent.display())
            })?;
        }
        std::fs::write(path, contents)
            .with_context(|| format!("Could not write config file {}", path.display()))?;

        Ok(())
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Expand ~ in paths to the home directory
fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
