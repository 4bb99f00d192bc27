use serde::{Deserialize, Serialize};

/// Generation parameters applied for one client-selected preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub steps: u32,
    pub guidance_start: f64,
    pub guidance_end: f64,
    pub weight: f64,
}

impl Preset {
    pub fn new(
        name: impl Into<String>,
        steps: u32,
        guidance_start: f64,
        guidance_end: f64,
        weight: f64,
    ) -> Self {
        Self {
            name: name.into(),
            steps,
            guidance_start,
            guidance_end,
            weight,
        }
    }
}

/// Entry returned by `GET /presets`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetInfo {
    pub id: String,
    pub name: String,
    pub steps: u32,
    pub guidance_start: f64,
    pub guidance_end: f64,
    pub weight: f64,
}

impl PresetInfo {
    pub fn new(id: &str, preset: &Preset) -> Self {
        Self {
            id: id.to_string(),
            name: preset.name.clone(),
            steps: preset.steps,
            guidance_start: preset.guidance_start,
            guidance_end: preset.guidance_end,
            weight: preset.weight,
        }
    }
}
