use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use engine_logging::{engine_info, engine_warn};
use perizia_core::{CurrencyFormat, LotFilter};
use perizia_engine::{ClientSettings, PollSettings};
use serde::{Deserialize, Serialize};

use crate::cli::{Cli, LotFilterArg};

pub const DEFAULT_CONFIG_FILE: &str = "./perizia.ron";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub submit_path: String,
    pub status_path: String,
    pub poll_interval_secs: u64,
    pub max_poll_attempts: Option<u32>,
    pub transport_retries: u32,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub lot_filter: LotFilter,
    pub currency: CurrencyFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        let client = ClientSettings::default();
        let poll = PollSettings::default();
        Self {
            base_url: client.base_url,
            submit_path: client.submit_path,
            status_path: client.status_path,
            poll_interval_secs: poll.interval.as_secs(),
            max_poll_attempts: poll.max_attempts,
            transport_retries: poll.transport_retries,
            connect_timeout_secs: client.connect_timeout.as_secs(),
            request_timeout_secs: client.request_timeout.as_secs(),
            lot_filter: LotFilter::default(),
            currency: CurrencyFormat::default(),
        }
    }
}

impl AppConfig {
    /// Loads `explicit`, or the default file when none is named.
    ///
    /// A missing default file yields defaults; a named file must load.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_file(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = ron::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        engine_info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(base_url) = &cli.base_url {
            self.base_url = base_url.clone();
        }
        if let Some(secs) = cli.poll_interval_secs {
            self.poll_interval_secs = secs;
        }
        if let Some(attempts) = cli.max_poll_attempts {
            self.max_poll_attempts = Some(attempts);
        }
        match cli.lot_filter {
            Some(LotFilterArg::ExcludeMetering) => self.lot_filter = LotFilter::ExcludeMetering,
            Some(LotFilterArg::KeyContains) => {
                self.lot_filter = LotFilter::KeyContains(cli.lot_key.clone())
            }
            None => {}
        }
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.base_url.clone(),
            submit_path: self.submit_path.clone(),
            status_path: self.status_path.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn poll_settings(&self) -> PollSettings {
        if self.poll_interval_secs == 0 {
            engine_warn!("poll_interval_secs is 0; status checks will run back to back");
        }
        PollSettings {
            interval: Duration::from_secs(self.poll_interval_secs),
            max_attempts: self.max_poll_attempts,
            transport_retries: self.transport_retries,
        }
    }
}
