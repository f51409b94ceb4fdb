use std::error::Error;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::schedule::{DEFAULT_SLEEP_SECS, SleepPolicy, TimeBand};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logger {
    pub level: String,
    #[serde(default)]
    pub verbose: bool,
}

/// External still-capture invocation:
/// `<tool> <flags...> -i <device> -vframes 1 <output>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capture {
    pub tool: String,
    pub flags: Vec<String>,
    pub device: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sensor {
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    Webcam,
    Seconds,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sampling {
    pub mode: SourceMode,
    pub sleep: String,
    #[serde(default)]
    pub periods: Vec<Period>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Period {
    pub secs: f64,
    pub hours: Vec<(u8, u8)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub logger: Logger,
    pub capture: Capture,
    pub sensor: Sensor,
    pub sampling: Sampling,
}

impl Settings {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        let settings: Settings = toml::from_str(include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../",
            "configs/default.toml"
        )))?;

        Ok(settings)
    }

    /// Resolves the `sleep` string (`fixed:N` / `lux` / `periods`) into the
    /// run's sleep policy. An unparseable value is not fatal: it logs a
    /// warning and falls back to the default fixed interval.
    pub fn sleep_policy(&self) -> SleepPolicy {
        match self.sampling.sleep.as_str() {
            "lux" => SleepPolicy::LuxAdaptive {
                base: DEFAULT_SLEEP_SECS,
            },
            "periods" => SleepPolicy::TimeOfDayBanded(
                self.sampling
                    .periods
                    .iter()
                    .map(|period| TimeBand {
                        secs: period.secs,
                        hours: period.hours.clone(),
                    })
                    .collect(),
            ),
            other => {
                if let Some(raw) = other.strip_prefix("fixed:") {
                    if let Ok(secs) = raw.parse::<f64>() {
                        if secs > 0.0 {
                            return SleepPolicy::Fixed(secs);
                        }
                    }
                }

                tracing::warn!(
                    sleep = other,
                    "unparseable sleep setting, using fixed {DEFAULT_SLEEP_SECS}s"
                );

                SleepPolicy::Fixed(DEFAULT_SLEEP_SECS)
            }
        }
    }
}
