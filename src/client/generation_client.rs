use crate::{
    client::traits::{CostEstimator, ImageGenerator},
    codec::PixelCodec,
    config::ClientConfig,
    error::{Result, RetroError},
    logger,
    models::{
        CostEstimate, GenerationParameters, GenerationResult, InferenceRequest, InferenceResponse,
        ModelStyle, RawImage, ServiceErrorBody,
    },
};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use uuid::Uuid;

pub const INFERENCES_PATH: &str = "/v1/inferences";
pub const TOKEN_HEADER: &str = "X-RD-Token";

/// HTTP client for the cost and generation endpoints.
///
/// Calls are never retried. Dropping a returned future abandons the call.
#[derive(Clone)]
pub struct GenerationClient {
    http: reqwest::Client,
    config: ClientConfig,
    codec: PixelCodec,
}

impl GenerationClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| {
                RetroError::Configuration(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            http,
            config,
            codec: PixelCodec::default(),
        })
    }

    pub fn with_codec(mut self, codec: PixelCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn codec(&self) -> &PixelCodec {
        &self.codec
    }

    fn endpoint(&self) -> String {
        format!(
            "{}{}",
            self.config.base_url.trim_end_matches('/'),
            INFERENCES_PATH
        )
    }

    pub async fn estimate_cost(&self, params: &GenerationParameters) -> Result<CostEstimate> {
        params.validate()?;
        let request = InferenceRequest::from_params(params).cost_check();

        log::debug!(
            "Checking cost: style={} size={}x{} prompt_len={}",
            params.style,
            params.width,
            params.height,
            params.prompt.len()
        );

        let response = self.send(&request).await?;
        response
            .balance_cost
            .map(CostEstimate::new)
            .ok_or_else(|| RetroError::Decoding("Cost response did not include a cost".into()))
    }

    pub async fn generate(
        &self,
        params: &GenerationParameters,
        source: Option<&RawImage>,
    ) -> Result<RawImage> {
        Ok(self.generate_detailed(params, source).await?.image)
    }

    pub async fn generate_detailed(
        &self,
        params: &GenerationParameters,
        source: Option<&RawImage>,
    ) -> Result<GenerationResult> {
        let input_image = match source {
            Some(image) => Some(self.codec.flatten_and_encode(image)?.into_string()),
            None => None,
        };
        params.validate()?;

        let mut request = InferenceRequest::from_params(params);
        if let Some(data) = input_image {
            request = request.with_input_image(data);
        }

        let request_id = Uuid::new_v4().to_string();
        log::info!(
            "Generating {}x{} image with style {} [req:{}]",
            params.width,
            params.height,
            params.style,
            request_id
        );
        let _timer = logger::timer(&format!("generation {}", request_id));

        let response = self.send(&request).await?;
        let encoded = response
            .base64_images
            .first()
            .ok_or_else(|| RetroError::Decoding("No images generated".into()))?;
        let image = self.codec.decode_image(encoded)?;

        log::info!(
            "Generation {} returned a {}x{} image",
            request_id,
            image.width(),
            image.height()
        );

        Ok(GenerationResult {
            image,
            cost: response.balance_cost.map(CostEstimate::new),
            remaining_balance: response.remaining_balance,
        })
    }

    /// Converts a captured photo into pixel art: shrinks it to the upload
    /// limit, then generates at the shrunken size with an empty prompt.
    pub async fn pixelate(&self, image: RawImage, style: ModelStyle) -> Result<GenerationResult> {
        let resized = self
            .codec
            .resize(image, self.config.max_upload_dimension);
        if resized.is_empty() {
            return Err(RetroError::Encoding("Cannot pixelate an empty image".into()));
        }

        let params = GenerationParameters::new("", style, resized.width(), resized.height());
        self.generate_detailed(&params, Some(&resized)).await
    }

    async fn send(&self, request: &InferenceRequest) -> Result<InferenceResponse> {
        let api_key = self.config.resolve_api_key()?;
        let payload = serde_json::to_vec(request)?;

        let response = self
            .http
            .post(self.endpoint())
            .header(TOKEN_HEADER, api_key)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|e| {
                log::error!("Request to {} failed: {}", INFERENCES_PATH, e);
                RetroError::from(e)
            })?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ServiceErrorBody>(&body)
                .ok()
                .and_then(ServiceErrorBody::into_message)
                .unwrap_or_else(|| {
                    let text = String::from_utf8_lossy(&body).trim().to_string();
                    if text.is_empty() {
                        status.canonical_reason().unwrap_or("unknown error").to_string()
                    } else {
                        text
                    }
                });
            log::error!("Service error code: {}", status.as_u16());
            log::error!("Service error message: {}", message);
            return Err(RetroError::Service {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&body)
            .map_err(|e| RetroError::Decoding(format!("Unexpected response shape: {}", e)))
    }
}

#[async_trait]
impl CostEstimator for GenerationClient {
    async fn estimate_cost(&self, params: &GenerationParameters) -> Result<CostEstimate> {
        GenerationClient::estimate_cost(self, params).await
    }
}

#[async_trait]
impl ImageGenerator for GenerationClient {
    async fn generate_detailed(
        &self,
        params: &GenerationParameters,
        source: Option<&RawImage>,
    ) -> Result<GenerationResult> {
        GenerationClient::generate_detailed(self, params, source).await
    }
}
