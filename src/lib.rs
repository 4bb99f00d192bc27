//! Relay between a browser upload form and a Stable Diffusion img2img API.
//!
//! An uploaded image is decoded, re-encoded as JPEG, combined with one of a
//! fixed set of ControlNet canny presets and forwarded to the backend. The
//! first generated image comes back as a `data:image/png;base64,...` URL.

pub mod backend;
pub mod config;
pub mod error;
pub mod imaging;
pub mod logger;
pub mod models;
pub mod relay;
pub mod server;

pub use backend::{GenerationBackend, HttpBackend};
pub use config::{PresetTable, RelayConfig};
pub use error::{RelayError, Result};
pub use models::*;
pub use relay::{GenerationRequest, ImageRelay};
