//! dossier-gateway binary: load configuration, install tracing, serve.

use dossier_gateway::config::GatewayConfig;
use dossier_gateway::server::{self, AppState};

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1).cloned())
        .or_else(|| args.get(1).filter(|a| !a.starts_with('-')).cloned())
        .or_else(|| std::env::var("DOSSIER_GATEWAY_CONFIG").ok())
        .unwrap_or_else(|| "dossier-gateway.toml".to_string());

    let upstream_url_override = args
        .iter()
        .position(|a| a == "--upstream-url")
        .and_then(|i| args.get(i + 1).cloned());

    // CLI overrides take precedence over TOML and env vars
    let config = GatewayConfig::load_with_upstream(&config_path, upstream_url_override.as_deref())?;

    // The tonic gRPC exporter needs a reactor, so the runtime comes first
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let tracing_guard = dossier_tracing::init_tracing(&config.tracing);

        tracing::info!(
            config_path = %config_path,
            otlp_export = tracing_guard.exporting(),
            listen_address = %config.server.listen_address,
            upstream = %config.upstream.base_url,
            "Starting dossier-gateway"
        );

        server::run(AppState::new(config)?).await
    })
}
