use std::env;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::constants::{AUCTION_DURATION_ENV, DEFAULT_AUCTION_DURATION_MINUTES};
use crate::expiration;

#[derive(Debug, Clone)]
pub struct Config {
    pub log: LogConfig,
    pub sled_path: String,
    pub worker: WorkerConfig,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is not set.
    pub level: String,
    /// Directory for daily-rolling JSON log files. `None` logs to stdout only.
    pub file_dir: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_dir: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Whether this process runs background workers. Several replicas may all
    /// be leaders; the sweep is safe to run concurrently.
    pub is_leader: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            log: LogConfig {
                level: env_or("RUST_LOG", "info"),
                file_dir: env_or_bool("ENABLE_FILE_LOGS", false)
                    .then(|| env_or("LOG_DIR", "./logs")),
            },
            sled_path: env_or("SLED_PATH", "./data/auctions.sled"),
            worker: WorkerConfig {
                is_leader: env_or_bool("WORKER_LEADER", true),
            },
        }
    }
}

/// Supplies the auction lifetime to the monitor. Queried on every tick so a
/// changed value takes effect without restarting the sweep.
pub trait DurationSource: Send + Sync {
    fn current_duration_minutes(&self) -> i64;
}

/// Reads `AUCTION_DURATION_MINUTES` from the process environment on each call.
///
/// An unparsable value falls back to the default and is reported once; the
/// warning repeats only after the raw value changes.
#[derive(Debug, Default)]
pub struct EnvDurationSource {
    last_rejected: Mutex<Option<String>>,
}

impl EnvDurationSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn rejected(&self) -> MutexGuard<'_, Option<String>> {
        self.last_rejected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Remember `raw` as the current bad value. `true` the first time it is seen.
    fn note_rejection(&self, raw: &str) -> bool {
        let mut last = self.rejected();
        if last.as_deref() == Some(raw) {
            return false;
        }
        *last = Some(raw.to_string());
        true
    }

    fn clear_rejection(&self) {
        self.rejected().take();
    }
}

impl DurationSource for EnvDurationSource {
    fn current_duration_minutes(&self) -> i64 {
        let raw = env::var(AUCTION_DURATION_ENV).ok();
        if let Some(minutes) = expiration::parse_duration_minutes(raw.as_deref()) {
            self.clear_rejection();
            return minutes;
        }

        match raw {
            Some(raw) => {
                if self.note_rejection(&raw) {
                    tracing::warn!(
                        key = AUCTION_DURATION_ENV,
                        value = %raw,
                        default = DEFAULT_AUCTION_DURATION_MINUTES,
                        "Failed to parse auction duration, using default"
                    );
                }
            }
            None => self.clear_rejection(),
        }
        DEFAULT_AUCTION_DURATION_MINUTES
    }
}

/// A duration that never changes. Useful when embedding the monitor with a
/// value resolved elsewhere, and in tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedDurationSource(pub i64);

impl DurationSource for FixedDurationSource {
    fn current_duration_minutes(&self) -> i64 {
        self.0
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}
