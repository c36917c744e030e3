//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::path::PathBuf;

use indexmap::IndexMap;
use secrecy::SecretString;
use tandem_config::{
    BackendConfig, Config, EmbeddingsConfig, EstimatorConfig, ExternalConfig, HealthConfig, RandomConfig,
    RoutingConfig, ServerConfig, StrategyConfig, SwRankingConfig,
};
use url::Url;

pub const STRONG: &str = "gpt-4o";
pub const WEAK: &str = "gpt-4o-mini";

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a builder routing between [`STRONG`] and [`WEAK`] on the
    /// given mock backend, with no strategies configured
    pub fn new(backend_url: &str) -> Self {
        let base_url: Url = backend_url.parse().expect("valid URL");

        Self {
            config: Config {
                server: ServerConfig {
                    listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                    health: HealthConfig::default(),
                },
                routing: RoutingConfig {
                    strong_model: STRONG.to_owned(),
                    weak_model: WEAK.to_owned(),
                    timeout: "5s".to_owned(),
                    strategies: IndexMap::new(),
                },
                backend: BackendConfig {
                    base_url: base_url.clone(),
                    api_key: Some(SecretString::from("backend-key")),
                },
                embeddings: EmbeddingsConfig {
                    base_url,
                    api_key: Some(SecretString::from("embeddings-key")),
                },
                telemetry: None,
            },
        }
    }

    /// Register a random strategy under `name`
    pub fn with_random(mut self, name: &str) -> Self {
        self.config
            .routing
            .strategies
            .insert(name.to_owned(), StrategyConfig::Random(RandomConfig::default()));
        self
    }

    /// Register a similarity-weighted ranking strategy over arena files
    pub fn with_sw_ranking(mut self, name: &str, battles: PathBuf, embeddings: PathBuf) -> Self {
        self.config.routing.strategies.insert(
            name.to_owned(),
            StrategyConfig::SwRanking(SwRankingConfig {
                battles: vec![battles],
                embeddings: vec![embeddings],
                strong_model: "arena-strong".to_owned(),
                weak_model: "arena-weak".to_owned(),
                num_tiers: NonZeroUsize::new(2).expect("non-zero"),
                embedding_model: "text-embedding-3-small".to_owned(),
                estimator: EstimatorConfig::default(),
            }),
        );
        self
    }

    /// Register an external predictor strategy
    pub fn with_external(mut self, name: &str, url: &str) -> Self {
        self.config.routing.strategies.insert(
            name.to_owned(),
            StrategyConfig::External(ExternalConfig {
                url: url.parse().expect("valid URL"),
                concurrent: false,
            }),
        );
        self
    }

    /// Override the per-request timeout
    pub fn with_timeout(mut self, timeout: &str) -> Self {
        timeout.clone_into(&mut self.config.routing.timeout);
        self
    }

    /// Disable health endpoint
    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config.validate().expect("valid test config");
        self.config
    }
}
