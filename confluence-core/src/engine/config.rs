//! Engine configuration: rule thresholds, indicator periods, presets and
//! per-symbol overrides.
//!
//! Parsed from TOML. Every field has a default, so an empty document yields
//! the stock rule set. `validate()` runs once at engine construction and is
//! the only place malformed configuration is rejected.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ConfigFingerprint;

use super::session::SessionCalendar;

/// Number of confirmations the tally counts.
pub const MAX_CONFIRMATIONS: u32 = 5;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid session reset time {0:?} (expected HH:MM)")]
    InvalidResetTime(String),

    #[error("invalid UTC offset {0:?} (expected e.g. +09:00)")]
    InvalidUtcOffset(String),

    #[error("unknown time zone {0:?} (expected an IANA name such as Asia/Seoul)")]
    InvalidTimezone(String),

    #[error("{0} must be >= 1")]
    ZeroPeriod(&'static str),

    #[error("macd_fast ({fast}) must be below macd_slow ({slow})")]
    MacdPeriods { fast: usize, slow: usize },

    #[error("{field} must be positive, got {value}")]
    NonPositive { field: String, value: f64 },

    #[error("tp_multipliers must hold exactly 3 values, got {0}")]
    TakeProfitArity(usize),

    #[error("long_only = false is not supported: only the long side is implemented")]
    ShortSideUnsupported,
}

/// Named bundles of rule thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Conservative,
    Balanced,
    Active,
}

impl Preset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Conservative => "conservative",
            Preset::Balanced => "balanced",
            Preset::Active => "active",
        }
    }

    /// Overwrite the preset-controlled fields of `config`.
    pub fn apply(&self, config: &mut EngineConfig) {
        match self {
            Preset::Conservative => {
                config.confirmations_min = 4;
                config.rsi1h_block = 55.0;
                config.volume_spike_mult = 1.6;
                config.cooldown_minutes = 12;
            }
            Preset::Balanced => {
                config.confirmations_min = 3;
                config.rsi1h_block = 50.0;
                config.volume_spike_mult = 1.5;
                config.cooldown_minutes = config.cooldown_minutes.max(10);
            }
            Preset::Active => {
                config.confirmations_min = 2;
                config.rsi1h_block = 48.0;
                config.volume_spike_mult = 1.3;
                config.cooldown_minutes = 6;
            }
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-symbol rule overrides. Unset fields inherit the engine-wide value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbolOverrides {
    pub confirmations_min: Option<u32>,
    pub volume_spike_mult: Option<f64>,
    pub atr_sl_mult: Option<f64>,
    pub require_macd_and_rsi: Option<bool>,
}

/// The rule set in force for one symbol after overrides are applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedRules {
    /// Clamped into `[1, MAX_CONFIRMATIONS]`.
    pub confirmations_min: u32,
    pub volume_spike_mult: f64,
    pub atr_sl_mult: f64,
    pub require_macd_and_rsi: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// IANA zone of the local session, e.g. "Asia/Seoul". Takes precedence
    /// over `utc_offset` when set.
    pub timezone: Option<String>,
    /// Fixed UTC offset of the local session, e.g. "+09:00".
    pub utc_offset: String,
    /// Local HH:MM at which the session VWAP resets.
    pub session_reset: String,
    pub cooldown_minutes: u64,
    pub one_signal_per_bar: bool,
    pub long_only: bool,
    /// When set, overrides the preset-controlled thresholds.
    pub preset: Option<Preset>,

    pub confirmations_min: u32,
    pub rsi1h_block: f64,
    pub volume_spike_mult: f64,
    pub upper_wick_atr_block: f64,

    pub ema_fast_1h: usize,
    pub ema_slow_1h: usize,
    pub ema_trend_15m: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub rsi_period: usize,
    pub rsi_zone_low: f64,
    pub rsi_zone_mid: f64,
    pub atr_period: usize,
    pub volume_window: usize,

    pub atr_sl_mult: f64,
    pub tp_multipliers: Vec<f64>,
    pub atr_trailing_mult: f64,
    pub use_vwap_trailing: bool,

    pub symbol_overrides: BTreeMap<String, SymbolOverrides>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timezone: None,
            utc_offset: "+09:00".to_string(),
            session_reset: "00:00".to_string(),
            cooldown_minutes: 10,
            one_signal_per_bar: true,
            long_only: true,
            preset: None,
            confirmations_min: 3,
            rsi1h_block: 50.0,
            volume_spike_mult: 1.5,
            upper_wick_atr_block: 0.6,
            ema_fast_1h: 20,
            ema_slow_1h: 50,
            ema_trend_15m: 200,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            rsi_period: 14,
            rsi_zone_low: 40.0,
            rsi_zone_mid: 50.0,
            atr_period: 14,
            volume_window: 20,
            atr_sl_mult: 1.3,
            tp_multipliers: vec![0.5, 1.0, 1.5],
            atr_trailing_mult: 0.8,
            use_vwap_trailing: true,
            symbol_overrides: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse a config from a TOML string. Does not validate.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Copy of this config with the preset (if any) applied.
    pub fn effective(&self) -> Self {
        let mut config = self.clone();
        if let Some(preset) = self.preset {
            preset.apply(&mut config);
        }
        config
    }

    /// Reject configurations the engine cannot run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.long_only {
            return Err(ConfigError::ShortSideUnsupported);
        }
        self.calendar()?;

        let periods = [
            ("ema_fast_1h", self.ema_fast_1h),
            ("ema_slow_1h", self.ema_slow_1h),
            ("ema_trend_15m", self.ema_trend_15m),
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("macd_signal", self.macd_signal),
            ("rsi_period", self.rsi_period),
            ("atr_period", self.atr_period),
            ("volume_window", self.volume_window),
        ];
        for (name, value) in periods {
            if value == 0 {
                return Err(ConfigError::ZeroPeriod(name));
            }
        }
        if self.macd_fast >= self.macd_slow {
            return Err(ConfigError::MacdPeriods {
                fast: self.macd_fast,
                slow: self.macd_slow,
            });
        }

        if self.tp_multipliers.len() != 3 {
            return Err(ConfigError::TakeProfitArity(self.tp_multipliers.len()));
        }
        let mut multipliers = vec![
            ("volume_spike_mult".to_string(), self.volume_spike_mult),
            ("upper_wick_atr_block".to_string(), self.upper_wick_atr_block),
            ("atr_sl_mult".to_string(), self.atr_sl_mult),
            ("atr_trailing_mult".to_string(), self.atr_trailing_mult),
        ];
        for (i, tp) in self.tp_multipliers.iter().enumerate() {
            multipliers.push((format!("tp_multipliers[{i}]"), *tp));
        }
        for (symbol, ov) in &self.symbol_overrides {
            if let Some(v) = ov.volume_spike_mult {
                multipliers.push((format!("symbol_overrides.{symbol}.volume_spike_mult"), v));
            }
            if let Some(v) = ov.atr_sl_mult {
                multipliers.push((format!("symbol_overrides.{symbol}.atr_sl_mult"), v));
            }
        }
        for (field, value) in multipliers {
            // NaN fails this check as well.
            if !(value > 0.0) {
                return Err(ConfigError::NonPositive { field, value });
            }
        }

        Ok(())
    }

    /// Session calendar for the configured zone and reset time.
    pub fn calendar(&self) -> Result<SessionCalendar, ConfigError> {
        SessionCalendar::parse_zoned(
            self.timezone.as_deref(),
            &self.utc_offset,
            &self.session_reset,
        )
    }

    /// Rules in force for `symbol`.
    pub fn rules_for(&self, symbol: &str) -> ResolvedRules {
        let ov = self.symbol_overrides.get(symbol);
        let confirmations_min = ov
            .and_then(|o| o.confirmations_min)
            .unwrap_or(self.confirmations_min)
            .clamp(1, MAX_CONFIRMATIONS);
        ResolvedRules {
            confirmations_min,
            volume_spike_mult: ov
                .and_then(|o| o.volume_spike_mult)
                .unwrap_or(self.volume_spike_mult),
            atr_sl_mult: ov.and_then(|o| o.atr_sl_mult).unwrap_or(self.atr_sl_mult),
            require_macd_and_rsi: ov.and_then(|o| o.require_macd_and_rsi).unwrap_or(false),
        }
    }

    /// Engine-wide minimum confirmations, clamped.
    pub fn confirmations_min_clamped(&self) -> u32 {
        self.confirmations_min.clamp(1, MAX_CONFIRMATIONS)
    }

    /// BLAKE3 fingerprint of the canonical JSON form.
    ///
    /// Field order is fixed by the struct and overrides live in a `BTreeMap`,
    /// so the JSON is deterministic.
    pub fn fingerprint(&self) -> ConfigFingerprint {
        let json = serde_json::to_string(self).unwrap_or_default();
        ConfigFingerprint::from_bytes(json.as_bytes())
    }
}
