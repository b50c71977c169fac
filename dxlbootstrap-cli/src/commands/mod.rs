//! Command handlers for the `dxlbootstrap` binary.

pub mod generate;

pub use generate::{handle_generate, handle_sample_config, handle_templates};
