use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use platformer_engine::{GameSession, LevelData, SessionConfig, SessionError};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::script::InputScript;

const LEVEL_PATH_ENV_VAR: &str = "PLATFORMER_LEVEL_PATH";
const CONFIG_PATH_ENV_VAR: &str = "PLATFORMER_CONFIG_PATH";
const SCRIPT_PATH_ENV_VAR: &str = "PLATFORMER_SCRIPT_PATH";
const TICKS_ENV_VAR: &str = "PLATFORMER_TICKS";
const SEED_ENV_VAR: &str = "PLATFORMER_SEED";
const REALTIME_ENV_VAR: &str = "PLATFORMER_REALTIME";
const LOG_EVERY_ENV_VAR: &str = "PLATFORMER_LOG_EVERY";

const DEFAULT_TICKS: u64 = 1800;
const DEFAULT_LOG_EVERY: u64 = 60;

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path} at {location}: {source}")]
    Parse {
        path: PathBuf,
        location: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Session(#[from] SessionError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AppConfig {
    pub(crate) level_path: Option<PathBuf>,
    pub(crate) config_path: Option<PathBuf>,
    pub(crate) script_path: Option<PathBuf>,
    pub(crate) ticks: u64,
    pub(crate) seed: Option<u64>,
    pub(crate) realtime: bool,
    /// Hero state is logged every this many ticks; 0 disables it.
    pub(crate) log_every: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            level_path: None,
            config_path: None,
            script_path: None,
            ticks: DEFAULT_TICKS,
            seed: None,
            realtime: false,
            log_every: DEFAULT_LOG_EVERY,
        }
    }
}

impl AppConfig {
    pub(crate) fn from_env() -> Self {
        Self::from_lookup(|var| match env::var(var) {
            Ok(value) => Some(value),
            Err(env::VarError::NotPresent) => None,
            Err(err) => {
                warn!(env_var = var, error = %err, "unable to read env var; using default");
                None
            }
        })
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&'static str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let path = |var| {
            lookup(var)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
                .map(PathBuf::from)
        };
        let number = |var, fallback: Option<u64>| match lookup(var) {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(
                        env_var = var,
                        value = raw.as_str(),
                        "invalid numeric env var value; using default"
                    );
                    fallback
                }
            },
            None => fallback,
        };

        Self {
            level_path: path(LEVEL_PATH_ENV_VAR),
            config_path: path(CONFIG_PATH_ENV_VAR),
            script_path: path(SCRIPT_PATH_ENV_VAR),
            ticks: number(TICKS_ENV_VAR, Some(defaults.ticks)).unwrap_or(defaults.ticks),
            seed: number(SEED_ENV_VAR, None),
            realtime: lookup(REALTIME_ENV_VAR)
                .map(|raw| is_truthy(&raw))
                .unwrap_or(defaults.realtime),
            log_every: number(LOG_EVERY_ENV_VAR, Some(defaults.log_every))
                .unwrap_or(defaults.log_every),
        }
    }
}

fn is_truthy(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// A level file holds either one level or a list played in order.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LevelFile {
    Many(Vec<LevelData>),
    One(LevelData),
}

pub(crate) struct AppWiring {
    pub(crate) config: AppConfig,
    pub(crate) session: GameSession,
    pub(crate) script: InputScript,
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Platformer Startup ===");

    let config = AppConfig::from_env();
    let levels = load_levels(config.level_path.as_deref())?;

    let mut session_config = match config.config_path.as_deref() {
        Some(path) => read_json::<SessionConfig>(path)?,
        None => SessionConfig::default(),
    };
    if let Some(seed) = config.seed {
        session_config.rng_seed = seed;
    }

    let script = match config.script_path.as_deref() {
        Some(path) => read_json::<InputScript>(path)?,
        None => InputScript::builtin(),
    };
    if script.total_ticks() == 0 {
        warn!("input script has no ticks; hero input stays idle");
    }

    let session = GameSession::new(levels, session_config)?;
    info!(
        levels = session.level_count(),
        ticks = config.ticks,
        seed = session.config().rng_seed,
        realtime = config.realtime,
        "app_configured"
    );

    Ok(AppWiring {
        config,
        session,
        script,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn load_levels(path: Option<&Path>) -> Result<Vec<LevelData>, BootstrapError> {
    let Some(path) = path else {
        return Ok(vec![LevelData::test_level_1(), LevelData::test_level_2()]);
    };
    let levels = match read_json::<LevelFile>(path)? {
        LevelFile::Many(levels) => levels,
        LevelFile::One(level) => vec![level],
    };
    info!(path = %path.display(), count = levels.len(), "level_file_loaded");
    Ok(levels)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, BootstrapError> {
    let raw = fs::read_to_string(path).map_err(|source| BootstrapError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_json(&raw, path)
}

fn parse_json<T: DeserializeOwned>(raw: &str, path: &Path) -> Result<T, BootstrapError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, T>(&mut deserializer).map_err(|error| {
        let location = error.path().to_string();
        BootstrapError::Parse {
            path: path.to_path_buf(),
            location,
            source: error.into_inner(),
        }
    })
}
