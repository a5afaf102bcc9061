use crate::logger::{self, Level};
use crate::PassiveError;
use config::{Config, Environment, File};
use dotenv::dotenv;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt::Debug;
use std::sync::Once;
use std::time::Duration;

static DOTENV_ONCE: Once = Once::new();

fn ensure_dotenv_loaded() {
    DOTENV_ONCE.call_once(|| {
        match dotenv() {
            Ok(_) => crate::info!("Config loaded including .env file."),
            Err(_) => crate::info!("Config loaded without .env file."),
        }
    });
}

/// Reads `path` (any format `config` understands) and overlays `<PREFIX>__SECTION__KEY` env variables.
pub fn load_config<T>(path: &str, prefix: &str) -> Result<T, PassiveError>
where
    T: DeserializeOwned + Debug,
{
    ensure_dotenv_loaded();

    let builder = Config::builder()
        .add_source(File::with_name(path).required(true))
        .add_source(
            Environment::with_prefix(prefix)
                .try_parsing(true)
                .separator("__"),
        );

    let cfg = builder.build()?.try_deserialize::<T>()?;
    crate::debug!("{:#?}", cfg);
    Ok(cfg)
}

fn duration_from_millis<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let millis = u64::deserialize(deserializer)?;
    Ok(Duration::from_millis(millis))
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub passive: PassiveSettings,
    pub storage: StorageSettings,
    pub log: LogSettings,
}

/// Defaults for declarations that do not pick their own options.
#[derive(Debug, Deserialize, Clone)]
pub struct PassiveSettings {
    pub retrieve_before_write: bool,
    pub skip_validation_if_absent: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageSettings {
    pub db_path: String,
    pub cache_size_mb: usize,
    pub lookup_attempts: usize,
    #[serde(rename = "retry_delay_ms", deserialize_with = "duration_from_millis")]
    pub retry_delay: Duration,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogSettings {
    pub level: Level,
}

impl Settings {
    pub fn new(path: &str) -> Result<Self, PassiveError> {
        load_config(path, "PASSIVE")
    }

    pub fn init_logging(&self) {
        logger::set_max_level(self.log.level);
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            passive: PassiveSettings { retrieve_before_write: true, skip_validation_if_absent: true },
            storage: StorageSettings {
                db_path: "passive.redb".to_string(),
                cache_size_mb: 64,
                lookup_attempts: 1,
                retry_delay: Duration::from_millis(50),
            },
            log: LogSettings { level: Level::Info },
        }
    }
}
