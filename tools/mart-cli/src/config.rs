//! CLI configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// `mart.toml` configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Data store settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Merchant settings.
    #[serde(default)]
    pub merchant: MerchantConfig,

    /// Shipping settings.
    #[serde(default)]
    pub shipping: ShippingConfig,
}

/// Data store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database path.
    #[serde(default = "default_store_path")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> String {
    "mart.db".into()
}

/// Merchant settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantConfig {
    /// Banking profile name of the receiving merchant.
    #[serde(default = "default_merchant_name")]
    pub name: String,
}

impl Default for MerchantConfig {
    fn default() -> Self {
        Self {
            name: default_merchant_name(),
        }
    }
}

fn default_merchant_name() -> String {
    mart_bank::merchant::DEFAULT_MERCHANT_NAME.into()
}

/// Shipping settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingConfig {
    /// Courier printed on shipments.
    #[serde(default = "default_courier")]
    pub courier: String,

    /// Estimated delivery window in days.
    #[serde(default = "default_delivery_window")]
    pub delivery_window_days: i64,
}

impl Default for ShippingConfig {
    fn default() -> Self {
        Self {
            courier: default_courier(),
            delivery_window_days: default_delivery_window(),
        }
    }
}

fn default_courier() -> String {
    "Mart Express".into()
}

fn default_delivery_window() -> i64 {
    3
}

impl CliConfig {
    /// Load config from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config: {}", path))
    }

    /// Load `mart.toml` from the working directory if present.
    pub fn discover() -> Self {
        CliConfig::load("mart.toml").unwrap_or_default()
    }
}
