pub mod backend;
pub(crate) mod blur;
pub mod cpu;
pub mod host;
