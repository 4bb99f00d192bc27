use std::env;
use std::time::Duration;

use crate::{
    error::{RelayError, Result},
    models::Preset,
};

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:7860/sdapi/v1/img2img";
pub const DEFAULT_CHECKPOINT: &str = "DreamShaper_3.32_baked_vae_clip_fix";
pub const DEFAULT_CONTROL_MODEL: &str = "control_sd15_canny [fef5e48e]";
pub const DEFAULT_CONTROL_MODULE: &str = "canny";

/// Ordered preset lookup. The first entry is the fallback for unknown ids.
#[derive(Debug, Clone, PartialEq)]
pub struct PresetTable {
    entries: Vec<(String, Preset)>,
}

impl Default for PresetTable {
    fn default() -> Self {
        PresetTable {
            entries: vec![
                (
                    "model1".to_string(),
                    Preset::new("Style Transfer", 20, 0.3, 0.7, 1.0),
                ),
                (
                    "model2".to_string(),
                    Preset::new("Portrait Effects", 15, 0.4, 0.8, 1.1),
                ),
                (
                    "model3".to_string(),
                    Preset::new("Artistic Filter", 25, 0.2, 0.9, 1.3),
                ),
            ],
        }
    }
}

impl PresetTable {
    pub fn new(entries: Vec<(String, Preset)>) -> Result<Self> {
        if entries.is_empty() {
            return Err(RelayError::Config(
                "preset table needs at least one entry".into(),
            ));
        }
        Ok(Self { entries })
    }

    /// Resolves `id` to a preset, falling back to the first entry.
    pub fn resolve(&self, id: Option<&str>) -> (&str, &Preset) {
        let found = id.and_then(|id| self.entries.iter().find(|(key, _)| key == id));
        let (key, preset) = found.unwrap_or(&self.entries[0]);
        (key.as_str(), preset)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Preset)> {
        self.entries.iter().map(|(id, preset)| (id.as_str(), preset))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    pub backend_url: String,
    pub request_timeout: Option<Duration>,
    pub max_upload_bytes: usize,
    pub checkpoint: String,
    pub control_model: String,
    pub control_module: String,
    pub presets: PresetTable,
}

impl Default for RelayConfig {
    fn default() -> Self {
        RelayConfig {
            host: "127.0.0.1".to_string(),
            port: 5000,
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            request_timeout: None,
            max_upload_bytes: 16 * 1024 * 1024,
            checkpoint: DEFAULT_CHECKPOINT.to_string(),
            control_model: DEFAULT_CONTROL_MODEL.to_string(),
            control_module: DEFAULT_CONTROL_MODULE.to_string(),
            presets: PresetTable::default(),
        }
    }
}

impl RelayConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();

        let host = env::var("HOST").unwrap_or(defaults.host);
        let port = env::var("PORT")
            .ok()
            .and_then(|port| port.parse().ok())
            .unwrap_or(defaults.port);
        let backend_url = env::var("SD_API_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(defaults.backend_url);
        let request_timeout = env::var("SD_API_TIMEOUT_SECS")
            .ok()
            .and_then(|secs| secs.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);
        let max_upload_bytes = env::var("MAX_UPLOAD_MB")
            .ok()
            .and_then(|mb| mb.parse::<usize>().ok())
            .map_or(defaults.max_upload_bytes, |mb| mb * 1024 * 1024);

        RelayConfig {
            host,
            port,
            backend_url,
            request_timeout,
            max_upload_bytes,
            ..defaults
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn with_max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    pub fn with_presets(mut self, presets: PresetTable) -> Self {
        self.presets = presets;
        self
    }

    pub fn with_control_model(
        mut self,
        model: impl Into<String>,
        module: impl Into<String>,
    ) -> Self {
        self.control_model = model.into();
        self.control_module = module.into();
        self
    }

    pub fn bind_addr(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}
