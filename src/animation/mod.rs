pub mod engine;
pub mod pattern;
