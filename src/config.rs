use anyhow::{Context, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Runtime settings, read from the environment (and `.env` when present)
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Where link lists and raw records are written between stages
    pub data_dir: PathBuf,
    /// SQLite file holding one table per source
    pub database_path: PathBuf,
    pub user_agent: String,
    /// Chrome binary; auto-detected when unset
    pub chrome_path: Option<PathBuf>,
    pub headless: bool,
    /// Fixed pause between page visits
    pub listing_pause: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            database_path: PathBuf::from("data/listings.sqlite"),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            chrome_path: None,
            headless: true,
            listing_pause: Duration::from_millis(1000),
        }
    }
}

fn parsed<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("Invalid value for {name}: {value:?}")),
        Err(_) => Ok(None),
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let config = Self {
            data_dir: std::env::var("CAR_SCOUT_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            database_path: std::env::var("CAR_SCOUT_DATABASE")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
            user_agent: std::env::var("CAR_SCOUT_USER_AGENT").unwrap_or(defaults.user_agent),
            chrome_path: std::env::var("CAR_SCOUT_CHROME_PATH").ok().map(PathBuf::from),
            headless: parsed("CAR_SCOUT_HEADLESS")?.unwrap_or(defaults.headless),
            listing_pause: parsed::<u64>("CAR_SCOUT_LISTING_PAUSE_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.listing_pause),
        };

        info!(
            "Config: data_dir={}, database={}, headless={}, pause={:?}",
            config.data_dir.display(),
            config.database_path.display(),
            config.headless,
            config.listing_pause
        );
        Ok(config)
    }
}
