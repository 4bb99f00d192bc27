use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::models::GenerateResponse;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("No image file provided")]
    MissingImage,

    #[error("Image exceeds upload limit of {0} bytes")]
    UploadTooLarge(usize),

    #[error("{0}")]
    Decode(String),

    #[error("{0}")]
    Encode(String),

    #[error("{0}")]
    Backend(String),

    #[error("No image generated")]
    NoImageGenerated,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Internal(String),
}

impl RelayError {
    /// Short label used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::MissingImage => "missing_image",
            RelayError::UploadTooLarge(_) => "upload_too_large",
            RelayError::Decode(_) => "decode",
            RelayError::Encode(_) => "encode",
            RelayError::Backend(_) => "backend",
            RelayError::NoImageGenerated => "no_image_generated",
            RelayError::Config(_) => "config",
            RelayError::Internal(_) => "internal",
        }
    }
}

impl ResponseError for RelayError {
    fn status_code(&self) -> StatusCode {
        match self {
            RelayError::MissingImage => StatusCode::BAD_REQUEST,
            RelayError::UploadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(GenerateResponse::failure(self.to_string()))
    }
}

impl From<image::ImageError> for RelayError {
    fn from(e: image::ImageError) -> Self {
        match e {
            image::ImageError::Encoding(_) => RelayError::Encode(e.to_string()),
            _ => RelayError::Decode(e.to_string()),
        }
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(e: reqwest::Error) -> Self {
        RelayError::Backend(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_messages() {
        assert_eq!(RelayError::MissingImage.to_string(), "No image file provided");
        assert_eq!(RelayError::NoImageGenerated.to_string(), "No image generated");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(RelayError::MissingImage.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            RelayError::UploadTooLarge(10).status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            RelayError::Backend("connection refused".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            RelayError::Decode("bad".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_underlying_text_is_kept() {
        let err = RelayError::Backend("error sending request".into());
        assert_eq!(err.to_string(), "error sending request");
        assert_eq!(err.kind(), "backend");
    }
}
