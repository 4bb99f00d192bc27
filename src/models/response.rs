use serde::{Deserialize, Serialize};

/// JSON body returned to the upload client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerateResponse {
    pub fn success(image_url: String) -> Self {
        Self {
            success: true,
            image_url: Some(image_url),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            image_url: None,
            error: Some(error.into()),
        }
    }
}

/// Successful relay outcome: the backend's first image, still base64.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedImage {
    pub image_data: String,
    pub preset_id: String,
}
