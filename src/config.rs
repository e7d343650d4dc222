use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;
use uiact_core_types::ExecMode;

const ENV_EXECUTION_MODE: &str = "UIACT_EXECUTION_MODE";
const ENV_MIN_CONFIDENCE: &str = "UIACT_VERIFICATION_MIN_CONFIDENCE";
const ENV_PATTERN_STORE_PATH: &str = "UIACT_PATTERN_STORE_PATH";
const ENV_LEASE_TTL_SECONDS: &str = "UIACT_LEASE_TTL_SECONDS";
const ENV_MAX_RETRIES_HARD_CAP: &str = "UIACT_MAX_RETRIES_HARD_CAP";

/// Engine configuration, usually sourced from the environment. Mode strings
/// only exist here; past this boundary everything is typed.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Pinned execution mode. `None` lets learned history pick the driver
    /// per pattern (which falls back to `subprocess`, the only mode with a
    /// hard recovery guarantee).
    pub execution_mode: Option<ExecMode>,
    pub verification_min_confidence: f64,
    pub pattern_store_path: Option<PathBuf>,
    pub lease_ttl: Duration,
    pub max_retries_hard_cap: u8,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            execution_mode: None,
            verification_min_confidence: 0.6,
            pattern_store_path: None,
            lease_ttl: Duration::from_secs(300),
            max_retries_hard_cap: 3,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(raw) = env::var(ENV_EXECUTION_MODE) {
            match ExecMode::parse(&raw) {
                Some(mode) => {
                    if mode == ExecMode::InProc {
                        warn!("inproc execution mode configured: no isolation, not for production");
                    }
                    config.execution_mode = Some(mode);
                }
                None => warn!(%raw, "unrecognized execution mode; using learned default"),
            }
        }

        if let Ok(raw) = env::var(ENV_MIN_CONFIDENCE) {
            match raw.trim().parse::<f64>() {
                Ok(value) if (0.0..=1.0).contains(&value) => {
                    config.verification_min_confidence = value;
                }
                _ => warn!(%raw, "invalid verification confidence; keeping default"),
            }
        }

        if let Ok(raw) = env::var(ENV_PATTERN_STORE_PATH) {
            if !raw.trim().is_empty() {
                config.pattern_store_path = Some(PathBuf::from(raw));
            }
        }

        if let Ok(raw) = env::var(ENV_LEASE_TTL_SECONDS) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.lease_ttl = Duration::from_secs(secs),
                _ => warn!(%raw, "invalid lease ttl; keeping default"),
            }
        }

        if let Ok(raw) = env::var(ENV_MAX_RETRIES_HARD_CAP) {
            match raw.trim().parse::<u8>() {
                Ok(cap) => config.max_retries_hard_cap = cap,
                Err(_) => warn!(%raw, "invalid retry cap; keeping default"),
            }
        }

        config
    }
}
