use serde::{Deserialize, Serialize};

/// Body of the `/sdapi/v1/img2img` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Img2ImgPayload {
    pub model: String,
    pub prompt: String,
    pub steps: u32,
    pub save_images: bool,
    pub negative_prompt: String,
    pub init_images: Vec<String>,
    pub alwayson_scripts: AlwaysOnScripts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlwaysOnScripts {
    #[serde(rename = "ControlNet")]
    pub control_net: ControlNetScript,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlNetScript {
    pub args: Vec<ControlNetUnit>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlNetUnit {
    pub enabled: bool,
    pub model: String,
    pub module: String,
    pub image: ControlImage,
    pub guidance_start: f64,
    pub guidance_end: f64,
    pub weight: f64,
    pub control_mode: String,
    pub resize_mode: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlImage {
    pub image: String,
}

/// What the backend sends back. Only `images` is interpreted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Img2ImgResponse {
    #[serde(default)]
    pub images: Option<Vec<String>>,
    #[serde(default)]
    pub parameters: Option<serde_json::Value>,
    #[serde(default)]
    pub info: Option<String>,
}

impl Img2ImgResponse {
    pub fn first_image(&self) -> Option<&str> {
        self.images
            .as_ref()
            .and_then(|images| images.first())
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_image() {
        let resp: Img2ImgResponse = serde_json::from_str(r#"{"images": ["abc123", "def"]}"#).unwrap();
        assert_eq!(resp.first_image(), Some("abc123"));

        let empty: Img2ImgResponse = serde_json::from_str(r#"{"images": []}"#).unwrap();
        assert_eq!(empty.first_image(), None);

        let missing: Img2ImgResponse = serde_json::from_str(r#"{"info": "x"}"#).unwrap();
        assert_eq!(missing.first_image(), None);

        let null: Img2ImgResponse = serde_json::from_str(r#"{"images": null}"#).unwrap();
        assert_eq!(null.first_image(), None);
    }

    #[test]
    fn test_control_net_key_is_capitalised() {
        let payload = Img2ImgPayload {
            model: "m".into(),
            prompt: String::new(),
            steps: 1,
            save_images: true,
            negative_prompt: String::new(),
            init_images: vec![],
            alwayson_scripts: AlwaysOnScripts {
                control_net: ControlNetScript { args: vec![] },
            },
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert!(value["alwayson_scripts"]["ControlNet"]["args"].is_array());
    }
}
