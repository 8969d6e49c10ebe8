use std::path::PathBuf;
use std::sync::Arc;

use alvin_config::Config;
use alvin_core::{AlvinTransformer, ChainedTransformer, ErrorPolicy, InspectTransformer, Task};
use alvin_io::{JsonLinesExtractor, JsonLinesLoader};
use alvin_providers::{AlvinClient, ClientConfig};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Input parameters for the Run command strategy.
#[derive(Debug, Clone)]
pub struct RunInput {
    pub input: PathBuf,
    pub output: PathBuf,
    pub config: Option<PathBuf>,
    pub no_enrich: bool,
}

/// Strategy for running one extract -> enrich -> load task.
///
/// Records are read from a JSON-lines file, logged, enriched with lineage and
/// written to another JSON-lines file. Ctrl-C aborts outstanding lineage
/// calls; records already written stay written.
#[derive(Debug, Clone, Copy)]
pub struct RunStrategy;

fn build_transformer(config: &Config, cancel: CancellationToken) -> anyhow::Result<AlvinTransformer> {
    let client = AlvinClient::new(ClientConfig {
        timeout: config.http.timeout(),
        retry_delays: config.http.retry_delays(),
        ..ClientConfig::new(
            config.alvin.alvin_instance_url.clone(),
            config.alvin.api_key.clone(),
        )
    })?;
    let call_timeout = config.http.call_timeout();

    Ok(
        AlvinTransformer::new(config.transformer_settings(), Arc::new(client))?
            .with_cancellation(cancel)
            .with_client(|client| client.with_call_timeout(call_timeout)),
    )
}

impl super::CommandStrategy for RunStrategy {
    type Input = RunInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let cancel = CancellationToken::new();
        let on_signal = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling outstanding lineage calls");
                on_signal.cancel();
            }
        });

        let mut chain = ChainedTransformer::new().with_stage(InspectTransformer);
        let mut policy = ErrorPolicy::default();
        if input.no_enrich {
            info!("Enrichment disabled, records pass through unchanged");
        } else {
            let config = Config::load(input.config.as_deref())?;
            policy = config.task.error_policy;
            chain = chain.with_stage(build_transformer(&config, cancel.clone())?);
        }

        let extractor = JsonLinesExtractor::open(&input.input).await?;
        let loader = JsonLinesLoader::create(&input.output).await?;

        let report = Task::new(extractor, chain, loader)
            .with_error_policy(policy)
            .run()
            .await?;

        if let Some(stats) = report.enrichment {
            if stats.service_unreachable() {
                warn!("Lineage service was unreachable; only source records were written");
            } else if stats.has_failures() {
                warn!("Some lineage batches failed: {stats}");
            }
        }

        println!("{}", serde_json::to_string_pretty(&report)?);
        Ok(())
    }
}
