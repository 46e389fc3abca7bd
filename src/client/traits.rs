use crate::{
    error::Result,
    models::{CostEstimate, GenerationParameters, GenerationResult, RawImage},
};
use async_trait::async_trait;

/// Prices a prospective generation without running it.
#[async_trait]
pub trait CostEstimator: Send + Sync {
    async fn estimate_cost(&self, params: &GenerationParameters) -> Result<CostEstimate>;
}

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate_detailed(
        &self,
        params: &GenerationParameters,
        source: Option<&RawImage>,
    ) -> Result<GenerationResult>;

    async fn generate(
        &self,
        params: &GenerationParameters,
        source: Option<&RawImage>,
    ) -> Result<RawImage> {
        Ok(self.generate_detailed(params, source).await?.image)
    }
}
