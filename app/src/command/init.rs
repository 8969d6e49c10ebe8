use alvin_config::Config;

/// Strategy for initializing the configuration.
///
/// Creates the default configuration file at `~/alvin/config.json`.
#[derive(Debug, Clone, Copy)]
pub struct InitStrategy;

impl super::CommandStrategy for InitStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let config_path = Config::create_config()?;

        println!("✅ Created config file at: {}", config_path.display());
        println!();
        println!("📝 Next steps:");
        println!("   1. Edit the config file and set platform_id, api_key and alvin_instance_url");
        println!("   2. Or put ALVIN_API_KEY and friends in ./credentials.env");
        println!("   3. Run 'alvin check-config' to validate it");
        println!();
        Ok(())
    }
}
