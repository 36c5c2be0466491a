//! Configuration types and loading logic.

use dossier_tracing::TracingConfig;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::Deserialize;

use crate::forwarder::ForwarderConfig;

/// Top-level gateway configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub tracing: TracingConfig,
}

/// Server listen configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// Upper bound for request bodies the gateway buffers itself
    /// (JSON validation, multipart re-encoding). Streamed bodies are not
    /// subject to it.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

/// Upstream backend configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL every forwarded target path is appended to.
    pub base_url: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_listen_address() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_max_body_bytes() -> usize {
    25 * 1024 * 1024
}

fn default_timeout() -> u64 {
    300
}

fn default_connect_timeout() -> u64 {
    10
}

impl GatewayConfig {
    /// Load configuration from TOML file and environment variables.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (DOSSIER_ prefix, __ for nesting)
    /// 2. TOML config file
    /// 3. Defaults
    pub fn load(config_path: &str) -> anyhow::Result<Self> {
        Self::load_with_upstream(config_path, None)
    }

    /// Like [`GatewayConfig::load`], with `upstream_url` (the `--upstream-url`
    /// flag) merged on top before extraction, so it may also supply a base
    /// URL that neither the file nor the environment sets.
    pub fn load_with_upstream(
        config_path: &str,
        upstream_url: Option<&str>,
    ) -> anyhow::Result<Self> {
        let mut figment = Figment::new()
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("DOSSIER_").split("__"));
        if let Some(url) = upstream_url {
            figment = figment.merge(Serialized::default("upstream.base_url", url));
        }
        let config: GatewayConfig = figment.extract()?;

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the forwarder cannot work with.
    pub fn validate(&self) -> anyhow::Result<()> {
        let url = reqwest::Url::parse(&self.upstream.base_url).map_err(|e| {
            anyhow::anyhow!("invalid upstream.base_url {:?}: {e}", self.upstream.base_url)
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!(
                "upstream.base_url must use http or https, got {:?}",
                url.scheme()
            );
        }
        if url.query().is_some() {
            anyhow::bail!("upstream.base_url must not carry a query string");
        }
        Ok(())
    }

    /// The slice of configuration the forwarder is constructed with.
    pub fn forwarder(&self) -> ForwarderConfig {
        ForwarderConfig::new(self.upstream.base_url.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG_FILE: &str = "dossier-gateway.toml";

    #[test]
    fn test_load_from_toml_with_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                CONFIG_FILE,
                r#"
                [upstream]
                base_url = "http://backend.internal:8080/api"
                "#,
            )?;

            let config = GatewayConfig::load(CONFIG_FILE).expect("config should load");
            assert_eq!(config.upstream.base_url, "http://backend.internal:8080/api");
            assert_eq!(config.upstream.timeout_secs, 300);
            assert_eq!(config.upstream.connect_timeout_secs, 10);
            assert_eq!(config.server.listen_address, "0.0.0.0:3000");
            assert_eq!(config.server.max_body_bytes, 25 * 1024 * 1024);
            assert_eq!(config.tracing.log_level, "info");
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_toml() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                CONFIG_FILE,
                r#"
                [server]
                listen_address = "127.0.0.1:4000"

                [upstream]
                base_url = "http://from-file:8080"
                timeout_secs = 30
                "#,
            )?;
            jail.set_env("DOSSIER_UPSTREAM__BASE_URL", "https://from-env.example.com");

            let config = GatewayConfig::load(CONFIG_FILE).expect("config should load");
            assert_eq!(config.upstream.base_url, "https://from-env.example.com");
            assert_eq!(config.upstream.timeout_secs, 30);
            assert_eq!(config.server.listen_address, "127.0.0.1:4000");
            Ok(())
        });
    }

    #[test]
    fn test_missing_base_url_is_an_error() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(CONFIG_FILE, "[server]\nlisten_address = \"0.0.0.0:1\"\n")?;
            assert!(GatewayConfig::load(CONFIG_FILE).is_err());
            Ok(())
        });
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(CONFIG_FILE, "[upstream]\nbase_url = \"ftp://backend\"\n")?;
            let err = GatewayConfig::load(CONFIG_FILE).unwrap_err();
            assert!(err.to_string().contains("http or https"));
            Ok(())
        });
    }

    #[test]
    fn test_rejects_unparseable_base_url() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(CONFIG_FILE, "[upstream]\nbase_url = \"not a url\"\n")?;
            assert!(GatewayConfig::load(CONFIG_FILE).is_err());
            Ok(())
        });
    }

    #[test]
    fn test_upstream_flag_supplies_missing_base_url() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(CONFIG_FILE, "[server]\nlisten_address = \"127.0.0.1:4000\"\n")?;
            jail.set_env("DOSSIER_UPSTREAM__BASE_URL", "http://from-env:8080");

            let config = GatewayConfig::load_with_upstream(CONFIG_FILE, Some("http://from-flag:9090"))
                .expect("config should load");
            assert_eq!(config.upstream.base_url, "http://from-flag:9090");
            assert_eq!(config.server.listen_address, "127.0.0.1:4000");

            jail.clear_env();
            let config = GatewayConfig::load_with_upstream(CONFIG_FILE, Some("http://from-flag:9090"))
                .expect("flag alone should be enough");
            assert_eq!(config.upstream.base_url, "http://from-flag:9090");
            Ok(())
        });
    }
}
