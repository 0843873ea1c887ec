//! CLI execution context.

use anyhow::{Context as _, Result};
use mart_bank::PaymentProcessor;
use mart_commerce::CheckoutPolicy;
use mart_db::Db;

use crate::config::CliConfig;
use crate::output::Output;

/// Execution context for CLI commands.
pub struct Context {
    /// CLI configuration.
    pub config: CliConfig,
    /// Output handler.
    pub output: Output,
    /// Open database handle.
    pub db: Db,
}

impl Context {
    /// Load config, open the store, and bootstrap the schema.
    pub async fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let config = match config_path {
            Some(path) => CliConfig::load(path)?,
            None => CliConfig::discover(),
        };

        let db = Db::open(&config.store.path)
            .await
            .with_context(|| format!("Failed to open store at {}", config.store.path))?;

        Ok(Self { config, output, db })
    }

    /// Payment processor against the configured merchant.
    pub fn processor(&self) -> PaymentProcessor {
        PaymentProcessor::new(self.config.merchant.name.clone())
    }

    /// Checkout policy from the shipping config.
    pub fn checkout_policy(&self) -> CheckoutPolicy {
        CheckoutPolicy {
            courier: self.config.shipping.courier.clone(),
            delivery_window_days: self.config.shipping.delivery_window_days,
        }
    }
}
