pub mod http;

use crate::{
    error::Result,
    models::{Img2ImgPayload, Img2ImgResponse},
};
use async_trait::async_trait;

pub use http::HttpBackend;

/// The remote img2img service the relay forwards to.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn img2img(&self, payload: &Img2ImgPayload) -> Result<Img2ImgResponse>;

    /// Human-readable target, for logs.
    fn endpoint(&self) -> &str;
}
