use std::sync::Arc;

use crate::{
    backend::GenerationBackend,
    config::RelayConfig,
    error::{RelayError, Result},
    imaging,
    models::{
        AlwaysOnScripts, ControlImage, ControlNetScript, ControlNetUnit, GeneratedImage,
        Img2ImgPayload, Preset, PresetInfo,
    },
};

/// One inbound generation request after multipart extraction.
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub image: Vec<u8>,
    pub prompt: String,
    pub model_id: Option<String>,
}

/// Turns an upload into one img2img call and interprets the answer.
#[derive(Clone)]
pub struct ImageRelay {
    config: Arc<RelayConfig>,
    backend: Arc<dyn GenerationBackend>,
}

impl ImageRelay {
    pub fn new(config: RelayConfig, backend: Arc<dyn GenerationBackend>) -> Self {
        Self {
            config: Arc::new(config),
            backend,
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn backend_endpoint(&self) -> &str {
        self.backend.endpoint()
    }

    pub fn presets(&self) -> Vec<PresetInfo> {
        self.config
            .presets
            .iter()
            .map(|(id, preset)| PresetInfo::new(id, preset))
            .collect()
    }

    pub async fn generate(&self, request: GenerationRequest) -> Result<GeneratedImage> {
        let GenerationRequest {
            image,
            prompt,
            model_id,
        } = request;

        let b64 = tokio::task::spawn_blocking(move || imaging::transcode_upload(&image))
            .await
            .map_err(|e| RelayError::Internal(format!("image worker failed: {}", e)))??;

        let (preset_id, preset) = self.config.presets.resolve(model_id.as_deref());
        log::info!("Using preset '{}' ({})", preset_id, preset.name);

        let payload = self.build_payload(&prompt, &b64, preset);

        log::debug!("Forwarding to {}", self.backend.endpoint());
        let response = {
            let _timer = crate::logger::timer("img2img");
            self.backend.img2img(&payload).await?
        };

        let image_data = response
            .first_image()
            .ok_or(RelayError::NoImageGenerated)?
            .to_string();

        Ok(GeneratedImage {
            image_data,
            preset_id: preset_id.to_string(),
        })
    }

    pub fn build_payload(&self, prompt: &str, image_b64: &str, preset: &Preset) -> Img2ImgPayload {
        let image_url = imaging::data_url(imaging::UPLOAD_MIME, image_b64);

        Img2ImgPayload {
            model: self.config.checkpoint.clone(),
            prompt: prompt.to_string(),
            steps: preset.steps,
            save_images: true,
            negative_prompt: String::new(),
            init_images: vec![image_url.clone()],
            alwayson_scripts: AlwaysOnScripts {
                control_net: ControlNetScript {
                    args: vec![ControlNetUnit {
                        enabled: true,
                        model: self.config.control_model.clone(),
                        module: self.config.control_module.clone(),
                        image: ControlImage { image: image_url },
                        guidance_start: preset.guidance_start,
                        guidance_end: preset.guidance_end,
                        weight: preset.weight,
                        control_mode: "Balanced".to_string(),
                        resize_mode: "Just Resize".to_string(),
                    }],
                },
            },
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::Img2ImgResponse;
    use async_trait::async_trait;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use serde_json::json;
    use std::io::Cursor;
    use std::sync::Mutex;

    /// In-memory backend that replays one canned outcome and records payloads.
    pub(crate) struct FakeBackend {
        reply: std::result::Result<serde_json::Value, String>,
        pub(crate) seen: Mutex<Vec<Img2ImgPayload>>,
    }

    impl FakeBackend {
        pub(crate) fn replying(body: serde_json::Value) -> Self {
            Self {
                reply: Ok(body),
                seen: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl GenerationBackend for FakeBackend {
        async fn img2img(&self, payload: &Img2ImgPayload) -> Result<Img2ImgResponse> {
            self.seen.lock().unwrap().push(payload.clone());
            match &self.reply {
                Ok(body) => serde_json::from_value(body.clone())
                    .map_err(|e| RelayError::Backend(e.to_string())),
                Err(msg) => Err(RelayError::Backend(msg.clone())),
            }
        }

        fn endpoint(&self) -> &str {
            "fake://img2img"
        }
    }

    pub(crate) fn sample_png() -> Vec<u8> {
        let img = RgbImage::from_fn(8, 8, |x, y| Rgb([(x * 30) as u8, (y * 30) as u8, 90]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    fn relay_with(backend: Arc<FakeBackend>) -> ImageRelay {
        ImageRelay::new(RelayConfig::default(), backend)
    }

    fn request(model_id: Option<&str>) -> GenerationRequest {
        GenerationRequest {
            image: sample_png(),
            prompt: "a castle at dusk".into(),
            model_id: model_id.map(String::from),
        }
    }

    #[tokio::test]
    async fn test_presets_reach_payload() {
        let cases = [
            (Some("model1"), 20, 0.3, 0.7, 1.0),
            (Some("model2"), 15, 0.4, 0.8, 1.1),
            (Some("model3"), 25, 0.2, 0.9, 1.3),
            (Some("nope"), 20, 0.3, 0.7, 1.0),
            (None, 20, 0.3, 0.7, 1.0),
        ];

        for (model_id, steps, start, end, weight) in cases {
            let backend = Arc::new(FakeBackend::replying(json!({"images": ["abc123"]})));
            relay_with(backend.clone())
                .generate(request(model_id))
                .await
                .unwrap();

            let seen = backend.seen.lock().unwrap();
            let payload = serde_json::to_value(&seen[0]).unwrap();
            let unit = &payload["alwayson_scripts"]["ControlNet"]["args"][0];
            assert_eq!(payload["steps"], json!(steps), "{:?}", model_id);
            assert_eq!(unit["guidance_start"], json!(start));
            assert_eq!(unit["guidance_end"], json!(end));
            assert_eq!(unit["weight"], json!(weight));
        }
    }

    #[tokio::test]
    async fn test_payload_fixed_fields() {
        let backend = Arc::new(FakeBackend::replying(json!({"images": ["abc123"]})));
        relay_with(backend.clone())
            .generate(request(Some("model2")))
            .await
            .unwrap();

        let seen = backend.seen.lock().unwrap();
        let payload = serde_json::to_value(&seen[0]).unwrap();
        assert_eq!(payload["model"], "DreamShaper_3.32_baked_vae_clip_fix");
        assert_eq!(payload["prompt"], "a castle at dusk");
        assert_eq!(payload["save_images"], true);
        assert_eq!(payload["negative_prompt"], "");

        let init = payload["init_images"].as_array().unwrap();
        assert_eq!(init.len(), 1);
        let init = init[0].as_str().unwrap();
        assert!(init.starts_with("data:image/jpeg;base64,"));

        let unit = &payload["alwayson_scripts"]["ControlNet"]["args"][0];
        assert_eq!(unit["enabled"], true);
        assert_eq!(unit["model"], "control_sd15_canny [fef5e48e]");
        assert_eq!(unit["module"], "canny");
        assert_eq!(unit["image"]["image"], init);
        assert_eq!(unit["control_mode"], "Balanced");
        assert_eq!(unit["resize_mode"], "Just Resize");
    }

    #[tokio::test]
    async fn test_first_image_returned() {
        let backend = Arc::new(FakeBackend::replying(json!({"images": ["abc123", "zzz"]})));
        let result = relay_with(backend).generate(request(None)).await.unwrap();
        assert_eq!(result.image_data, "abc123");
        assert_eq!(result.preset_id, "model1");
    }

    #[tokio::test]
    async fn test_empty_images_is_no_image_generated() {
        let backend = Arc::new(FakeBackend::replying(json!({"images": []})));
        let err = relay_with(backend).generate(request(None)).await.unwrap_err();
        assert!(matches!(err, RelayError::NoImageGenerated));

        let backend = Arc::new(FakeBackend::replying(json!({"info": "{}"})));
        let err = relay_with(backend).generate(request(None)).await.unwrap_err();
        assert_eq!(err.to_string(), "No image generated");
    }

    #[tokio::test]
    async fn test_bad_upload_never_reaches_backend() {
        let backend = Arc::new(FakeBackend::replying(json!({"images": ["abc123"]})));
        let mut req = request(None);
        req.image = b"GIF89a but not really".to_vec();

        let err = relay_with(backend.clone()).generate(req).await.unwrap_err();
        assert!(matches!(err, RelayError::Decode(_)));
        assert!(backend.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_backend_failure_passes_message_through() {
        let backend = Arc::new(FakeBackend::failing("503 Service Unavailable"));
        let err = relay_with(backend).generate(request(None)).await.unwrap_err();
        assert_eq!(err.to_string(), "503 Service Unavailable");
    }

    #[tokio::test]
    async fn test_large_upload_does_not_stall_other_tasks() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::time::Duration;

        let img = RgbImage::from_fn(1500, 1500, |x, y| {
            Rgb([(x % 251) as u8, (y % 241) as u8, ((x ^ y) % 239) as u8])
        });
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();

        let ticks = Arc::new(AtomicUsize::new(0));
        let ticker = {
            let ticks = ticks.clone();
            tokio::spawn(async move {
                loop {
                    tokio::time::sleep(Duration::from_millis(1)).await;
                    ticks.fetch_add(1, Ordering::SeqCst);
                }
            })
        };

        let backend = Arc::new(FakeBackend::replying(json!({"images": ["abc123"]})));
        let req = GenerationRequest {
            image: out.into_inner(),
            prompt: String::new(),
            model_id: None,
        };
        relay_with(backend).generate(req).await.unwrap();
        ticker.abort();

        assert!(ticks.load(Ordering::SeqCst) > 0);
    }

    #[test]
    fn test_presets_listing_order() {
        let relay = relay_with(Arc::new(FakeBackend::replying(json!({}))));
        let ids: Vec<String> = relay.presets().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["model1", "model2", "model3"]);
        assert_eq!(relay.backend_endpoint(), "fake://img2img");
    }
}
