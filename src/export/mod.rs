pub mod controller;
pub mod driver;
pub mod encoder;
pub mod ffmpeg;
pub mod image;
pub mod snapshot;
pub mod validate;
