pub mod markdown;
pub mod render;
