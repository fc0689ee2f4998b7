pub mod color;
pub mod presets;
pub mod template;
