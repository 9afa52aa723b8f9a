// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Configuration file support for `sdrbridge-daemon`.
//!
//! Loaded via `trx_app::ConfigFile`, same search order as the rest of the
//! workspace: `sdrbridge.toml` in the current directory, then the XDG
//! config dir, then `/etc`. Grounded on `trx-server/src/config.rs`'s
//! nested `#[serde(default)]` section structs (`SdrConfig`/
//! `SdrGainConfig` in particular).

use serde::{Deserialize, Serialize};
use trx_app::ConfigFile;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: Option<String>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
        }
    }
}

/// `driver`-selecting and SDR-tuning section. Field meanings follow the
/// driver table and `initInt` description.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// One of `file`, `limesdr`, `sxxcvr`.
    pub driver: String,
    /// SoapySDR device constructor args; empty falls back to device
    /// auto-detection.
    pub args: String,
    pub rx_freq_hz: f64,
    pub tx_freq_hz: f64,
    pub rx_if_num: i32,
    pub rx_if_den: u32,
    pub tx_if_num: i32,
    pub tx_if_den: u32,
    pub rx_gain_db: f64,
    pub tx_gain_db: f64,
    pub rx_antenna: Option<String>,
    pub tx_antenna: Option<String>,
    /// Number of blocks of TX latency to budget for (and, on untimed
    /// drivers, to pre-fill with zeros).
    pub latency_blocks: u32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            driver: "file".to_string(),
            args: String::new(),
            rx_freq_hz: 446_000_000.0,
            tx_freq_hz: 446_000_000.0,
            rx_if_num: 0,
            rx_if_den: 1,
            tx_if_num: 0,
            tx_if_den: 1,
            rx_gain_db: 50.0,
            tx_gain_db: 30.0,
            rx_antenna: Some("LNAL".to_string()),
            tx_antenna: Some("BAND1".to_string()),
            latency_blocks: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub enabled: bool,
    pub endpoint: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: sdrbridge_io::observation::DEFAULT_ENDPOINT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    pub symlink_path: String,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            symlink_path: sdrbridge_io::serial::DEFAULT_SYMLINK.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub general: GeneralConfig,
    pub driver: DriverConfig,
    pub monitor: MonitorConfig,
    pub serial: SerialConfig,
}

impl BridgeConfig {
    /// Configuration-error taxonomy (see the error design): an unknown
    /// driver or invalid resample ratio fails here, before `initInt` ever
    /// touches a transport.
    pub fn validate(&self) -> Result<(), String> {
        if !matches!(self.driver.driver.as_str(), "file" | "limesdr" | "sxxcvr") {
            return Err(format!(
                "[driver].driver '{}' is invalid (expected one of: file, limesdr, sxxcvr)",
                self.driver.driver
            ));
        }
        if self.driver.rx_if_den == 0 || self.driver.tx_if_den == 0 {
            return Err("[driver].rx_if_den and tx_if_den must be nonzero".to_string());
        }
        if self.driver.latency_blocks == 0 {
            return Err("[driver].latency_blocks must be > 0".to_string());
        }
        Ok(())
    }

    /// Generate an example configuration as a TOML string, for
    /// `--print-config`.
    pub fn example_toml() -> String {
        toml::to_string_pretty(&BridgeConfig::default()).unwrap_or_default()
    }
}

impl ConfigFile for BridgeConfig {
    fn config_filename() -> &'static str {
        "sdrbridge.toml"
    }

    fn combined_key() -> Option<&'static str> {
        Some("sdrbridge")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(BridgeConfig::default().validate().is_ok());
    }

    #[test]
    fn unknown_driver_rejected() {
        let mut cfg = BridgeConfig::default();
        cfg.driver.driver = "bogus".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_latency_blocks_rejected() {
        let mut cfg = BridgeConfig::default();
        cfg.driver.latency_blocks = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn parses_minimal_toml_section() {
        let toml_str = r#"
[driver]
driver = "limesdr"
rx_freq_hz = 145500000.0
tx_freq_hz = 145500000.0
"#;
        let cfg: BridgeConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.driver.driver, "limesdr");
        assert_eq!(cfg.driver.rx_freq_hz, 145_500_000.0);
        assert_eq!(cfg.driver.latency_blocks, 4);
    }
}
