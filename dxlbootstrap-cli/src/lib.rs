//! # dxlbootstrap-cli
//!
//! Generates the structure and files of a DXL integration project from a
//! named template: a client wrapper (`client-template`) or a persistent
//! application exposing services (`application-template`).

pub mod commands;
pub mod generate;

pub use generate::{DxlBootstrap, GenerateError, GenerationReport};
