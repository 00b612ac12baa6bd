//! Application config: which symbols to watch, where messages go, and the
//! engine rules.
//!
//! ```toml
//! symbols = ["BTCUSDT", "ETHUSDT"]
//! log_level = "info"
//! recipient = "ops"
//! send_startup_message = true
//!
//! [tick_sizes]
//! BTCUSDT = 0.01
//!
//! [engine]
//! timezone = "Asia/Seoul"
//! confirmations_min = 3
//! ```
//!
//! `timezone_label` only renames the zone in status output. It may not name a
//! different IANA zone than `engine.timezone`, nor an IANA zone at all when
//! the engine runs on a fixed `utc_offset`.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use confluence_core::domain::TickSizeMap;
use confluence_core::engine::session::parse_timezone;
use confluence_core::engine::EngineConfig;

/// Candles per timeframe fetched for warmup.
pub const WARMUP_LIMIT: usize = 300;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub symbols: Vec<String>,
    /// Display name for the session zone in status output.
    pub timezone_label: Option<String>,
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,
    pub recipient: String,
    /// Announce the stream through the sink before the first event.
    pub send_startup_message: bool,
    pub tick_sizes: BTreeMap<String, f64>,
    pub engine: EngineConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            symbols: vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()],
            timezone_label: None,
            log_level: "info".to_string(),
            recipient: "stdout".to_string(),
            send_startup_message: true,
            tick_sizes: BTreeMap::new(),
            engine: EngineConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_toml(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s).context("parsing app config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("loading {}", path.display()))
    }

    fn validate(&self) -> Result<()> {
        if self.symbols.is_empty() {
            bail!("at least one symbol is required");
        }
        for (symbol, tick) in &self.tick_sizes {
            if !(tick.is_finite() && *tick > 0.0) {
                bail!("tick size for {symbol} must be positive, got {tick}");
            }
        }
        if let Some(label) = &self.timezone_label {
            match (self.engine.timezone.as_deref(), parse_timezone(label)) {
                (Some(zone), Ok(_)) if zone.trim() != label.trim() => {
                    bail!("timezone_label {label:?} disagrees with engine.timezone {zone:?}")
                }
                (None, Ok(_)) => bail!(
                    "timezone_label {label:?} names a time zone but the engine uses utc_offset {:?}; \
                     set engine.timezone instead",
                    self.engine.utc_offset
                ),
                _ => {}
            }
        }
        Ok(())
    }

    /// Zone name shown to operators: the label, else the IANA zone, else the offset.
    pub fn timezone_display(&self) -> String {
        match (&self.timezone_label, &self.engine.timezone) {
            (Some(label), _) => label.clone(),
            (None, Some(zone)) => zone.clone(),
            (None, None) => format!("UTC{}", self.engine.utc_offset.trim()),
        }
    }

    /// Text announced once when streaming starts.
    pub fn startup_message(&self, symbols: &[String], confirmations_min: u32) -> String {
        format!(
            "Started (TZ={}). LONG-only. Symbols={}. Min={confirmations_min}/5",
            self.timezone_display(),
            symbols.join(", "),
        )
    }

    pub fn tick_map(&self) -> TickSizeMap {
        self.tick_sizes
            .iter()
            .map(|(symbol, tick)| (symbol.clone(), *tick))
            .collect()
    }

    /// Symbols normalized to upper case, duplicates dropped, order kept.
    pub fn normalized_symbols(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::with_capacity(self.symbols.len());
        for symbol in &self.symbols {
            let upper = symbol.trim().to_ascii_uppercase();
            if !upper.is_empty() && !out.contains(&upper) {
                out.push(upper);
            }
        }
        out
    }
}
