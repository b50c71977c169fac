//! # dxlbootstrap
//!
//! Runtime support for projects generated by the `dxlbootstrap` tool.
//!
//! - [`client::Client`] is the base for client wrappers that hide DXL topics
//!   and message formats behind typed methods.
//! - [`app::Application`] drives a persistent application that listens for
//!   events and exposes services on the fabric.
//! - [`message_utils`] converts payloads between strings, JSON and bytes.
//!
//! The fabric itself is reached through the [`fabric::DxlClient`] trait.
//! [`fabric::LocalFabric`] is an in-process implementation used by samples
//! and tests.

pub mod app;
pub mod client;
pub mod config;
pub mod error;
pub mod fabric;
pub mod message;
pub mod message_utils;
pub mod pool;

/// Version of the support library. Generated projects depend on this version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use app::{AppContext, Application, ApplicationHandler};
pub use client::Client;
pub use error::{AppError, ClientError, ConfigError, FabricError, MessageError, PoolError};
pub use message::{Message, MessageType};
