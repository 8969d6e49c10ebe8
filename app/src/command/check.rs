use std::path::PathBuf;

use alvin_config::Config;
use alvin_providers::{AlvinClient, ClientConfig};
use tracing::info;

/// Strategy for validating and displaying the effective configuration.
///
/// The API key is masked before printing.
#[derive(Debug, Clone, Copy)]
pub struct CheckConfigStrategy;

impl super::CommandStrategy for CheckConfigStrategy {
    type Input = Option<PathBuf>;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load(input.as_deref())?;

        let client = AlvinClient::new(ClientConfig::new(
            config.alvin.alvin_instance_url.clone(),
            config.alvin.api_key.clone(),
        ))?;
        info!("Configuration is valid");

        println!("=== alvin Configuration ===\n");
        println!("{}", serde_json::to_string_pretty(&config.redacted())?);
        println!();
        println!("Endpoint: {}", client.endpoint());
        Ok(())
    }
}
