/// The two backend models a routing decision chooses between
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPair {
    strong: String,
    weak: String,
}

impl ModelPair {
    pub fn new(strong: impl Into<String>, weak: impl Into<String>) -> Self {
        Self {
            strong: strong.into(),
            weak: weak.into(),
        }
    }

    pub fn strong(&self) -> &str {
        &self.strong
    }

    pub fn weak(&self) -> &str {
        &self.weak
    }

    /// Strong model when `score >= threshold`, otherwise the weak one
    ///
    /// A NaN score never reaches the strong model.
    pub fn select(&self, score: f64, threshold: f64) -> &str {
        if score >= threshold { &self.strong } else { &self.weak }
    }
}

impl From<&tandem_config::RoutingConfig> for ModelPair {
    fn from(config: &tandem_config::RoutingConfig) -> Self {
        Self::new(config.strong_model.clone(), config.weak_model.clone())
    }
}
