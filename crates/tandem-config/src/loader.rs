use std::path::Path;

use crate::{Config, StrategyConfig};

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::parse(&raw)
    }

    /// Parse and validate configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing or validation fails
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error naming the first offending key
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_model_pair()?;
        self.routing.timeout()?;
        self.validate_strategies()?;
        self.validate_telemetry()?;
        Ok(())
    }

    fn validate_model_pair(&self) -> anyhow::Result<()> {
        let routing = &self.routing;

        if routing.strong_model.trim().is_empty() {
            anyhow::bail!("routing.strong_model must not be empty");
        }
        if routing.weak_model.trim().is_empty() {
            anyhow::bail!("routing.weak_model must not be empty");
        }
        if routing.strong_model == routing.weak_model {
            anyhow::bail!("routing.strong_model and routing.weak_model must differ");
        }

        Ok(())
    }

    fn validate_strategies(&self) -> anyhow::Result<()> {
        for (name, strategy) in &self.routing.strategies {
            // Names are embedded in `router-<name>-<threshold>`, which splits on '-'
            if name.is_empty() || name.contains('-') {
                anyhow::bail!("routing.strategies.{name}: strategy names must be non-empty and must not contain '-'");
            }

            if let StrategyConfig::SwRanking(sw) = strategy {
                if sw.battles.is_empty() {
                    anyhow::bail!("routing.strategies.{name}.battles must list at least one dataset");
                }
                if sw.embeddings.is_empty() {
                    anyhow::bail!("routing.strategies.{name}.embeddings must list at least one dataset");
                }
                if sw.strong_model == sw.weak_model {
                    anyhow::bail!("routing.strategies.{name}: strong_model and weak_model must differ");
                }
                if sw.estimator.max_iterations == 0 {
                    anyhow::bail!("routing.strategies.{name}.estimator.max_iterations must be greater than 0");
                }
                if !(sw.estimator.tolerance.is_finite() && sw.estimator.tolerance > 0.0) {
                    anyhow::bail!("routing.strategies.{name}.estimator.tolerance must be a positive number");
                }
                if !(sw.estimator.l2_penalty.is_finite() && sw.estimator.l2_penalty >= 0.0) {
                    anyhow::bail!("routing.strategies.{name}.estimator.l2_penalty must be zero or positive");
                }
            }
        }

        Ok(())
    }

    fn validate_telemetry(&self) -> anyhow::Result<()> {
        if let Some(tracing) = self.telemetry.as_ref().and_then(|t| t.tracing.as_ref())
            && !(0.0..=1.0).contains(&tracing.sampling_rate)
        {
            anyhow::bail!("telemetry.tracing.sampling_rate must be between 0.0 and 1.0");
        }

        Ok(())
    }
}
