use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures::StreamExt;
use serde_json::json;

use crate::{
    error::{RelayError, Result},
    imaging,
    logger,
    models::GenerateResponse,
    relay::{GenerationRequest, ImageRelay},
};

/// `POST /generate`: multipart `image` file plus optional `model_id` and `prompt`.
pub async fn generate(relay: web::Data<ImageRelay>, payload: Multipart) -> Result<HttpResponse> {
    let request_id = logger::request_id();

    let request = match read_form(payload, relay.config().max_upload_bytes).await {
        Ok(request) => request,
        Err(e) => {
            log::warn!("[req:{}] rejected upload: {}", request_id, e);
            return Err(e);
        }
    };

    log::info!(
        "[req:{}] generate: model_id={:?} prompt_len={} image_bytes={}",
        request_id,
        request.model_id,
        request.prompt.len(),
        request.image.len()
    );

    match relay.generate(request).await {
        Ok(generated) => {
            log::info!(
                "[req:{}] generated image with preset {}",
                request_id,
                generated.preset_id
            );
            let image_url = imaging::data_url(imaging::RESULT_MIME, &generated.image_data);
            Ok(HttpResponse::Ok().json(GenerateResponse::success(image_url)))
        }
        Err(e) => {
            log::error!("[req:{}] generation failed ({}): {}", request_id, e.kind(), e);
            Err(e)
        }
    }
}

pub async fn presets(relay: web::Data<ImageRelay>) -> HttpResponse {
    HttpResponse::Ok().json(relay.presets())
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

/// Drains the multipart stream into a `GenerationRequest`.
///
/// Only a part named `image` that carries a filename counts as the upload,
/// and the first occurrence of each field wins. A broken stream before the image arrives is reported as a missing image.
async fn read_form(mut payload: Multipart, max_upload_bytes: usize) -> Result<GenerationRequest> {
    let mut image: Option<Vec<u8>> = None;
    let mut prompt: Option<String> = None;
    let mut model_id: Option<String> = None;

    while let Some(item) = payload.next().await {
        let mut field = match item {
            Ok(field) => field,
            Err(e) => {
                log::debug!("multipart stream ended early: {}", e);
                break;
            }
        };

        let disposition = field.content_disposition();
        let name = disposition.get_name().unwrap_or_default().to_string();
        let is_file = disposition.get_filename().is_some();

        // Every part, text or file, is bounded by the upload cap.
        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| RelayError::Internal(e.to_string()))?;
            if data.len() + chunk.len() > max_upload_bytes {
                return Err(RelayError::UploadTooLarge(max_upload_bytes));
            }
            data.extend_from_slice(&chunk);
        }

        // Repeated fields keep their first value.
        match name.as_str() {
            "image" if is_file && image.is_none() => image = Some(data),
            "prompt" if prompt.is_none() => {
                prompt = Some(String::from_utf8_lossy(&data).into_owned())
            }
            "model_id" if model_id.is_none() => {
                model_id = Some(String::from_utf8_lossy(&data).into_owned())
            }
            _ => {}
        }
    }

    let image = image.ok_or(RelayError::MissingImage)?;

    Ok(GenerationRequest {
        image,
        prompt: prompt.unwrap_or_default(),
        model_id,
    })
}
