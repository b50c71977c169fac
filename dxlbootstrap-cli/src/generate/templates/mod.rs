//! The templates shipped with the generator.

pub mod app;
pub mod client;

pub use app::AppTemplate;
pub use client::ClientTemplate;
