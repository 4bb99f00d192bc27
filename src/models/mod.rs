pub mod payload;
pub mod preset;
pub mod response;

pub use payload::*;
pub use preset::*;
pub use response::*;
