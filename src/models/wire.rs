use crate::models::{GenerationParameters, ModelStyle};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InferenceRequest {
    pub prompt: String,
    pub width: u32,
    pub height: u32,
    pub num_images: u32,
    pub prompt_style: ModelStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_cost: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_image: Option<String>,
}

impl InferenceRequest {
    pub fn from_params(params: &GenerationParameters) -> Self {
        Self {
            prompt: params.prompt.clone(),
            width: params.width,
            height: params.height,
            num_images: 1,
            prompt_style: params.style,
            check_cost: None,
            input_image: None,
        }
    }

    pub fn cost_check(mut self) -> Self {
        self.check_cost = Some(true);
        self
    }

    pub fn with_input_image(mut self, data: String) -> Self {
        self.input_image = Some(data);
        self
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct InferenceResponse {
    #[serde(default, alias = "credit_cost")]
    pub balance_cost: Option<f64>,
    #[serde(default)]
    pub base64_images: Vec<String>,
    #[serde(default, alias = "remaining_credits")]
    pub remaining_balance: Option<f64>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// Error body returned with non-2xx statuses. Field names vary by endpoint.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ServiceErrorBody {
    pub detail: Option<serde_json::Value>,
    pub error: Option<String>,
    pub message: Option<String>,
}

impl ServiceErrorBody {
    pub fn into_message(self) -> Option<String> {
        let detail = self.detail.map(|detail| match detail {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        });
        detail.or(self.error).or(self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cost_check_request_shape() {
        let params = GenerationParameters::new("pixel cat", ModelStyle::Retro, 256, 128);
        let body =
            serde_json::to_value(InferenceRequest::from_params(&params).cost_check()).unwrap();
        assert_eq!(
            body,
            json!({
                "prompt": "pixel cat",
                "width": 256,
                "height": 128,
                "num_images": 1,
                "prompt_style": "rd_fast__retro",
                "check_cost": true
            })
        );
    }

    #[test]
    fn test_response_accepts_credit_aliases() {
        let response: InferenceResponse = serde_json::from_value(json!({
            "created_at": 1733425519,
            "credit_cost": 1,
            "base64_images": ["aGk="],
            "type": "txt2img",
            "remaining_credits": 41
        }))
        .unwrap();
        assert_eq!(response.balance_cost, Some(1.0));
        assert_eq!(response.remaining_balance, Some(41.0));
        assert_eq!(response.base64_images.len(), 1);
        assert_eq!(response.kind.as_deref(), Some("txt2img"));
    }

    #[test]
    fn test_error_body_message_precedence() {
        let body: ServiceErrorBody =
            serde_json::from_value(json!({"detail": "Invalid token", "message": "x"})).unwrap();
        assert_eq!(body.into_message().as_deref(), Some("Invalid token"));

        let body: ServiceErrorBody = serde_json::from_value(json!({"error": "bad size"})).unwrap();
        assert_eq!(body.into_message().as_deref(), Some("bad size"));
    }
}
