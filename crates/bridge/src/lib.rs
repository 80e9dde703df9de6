//! Registry Pipeline Bridge
//!
//! Runs named pipeline operations in an external interpreter process.
//!
//! This crate provides:
//! - The [`BridgeClient`] capability, injected wherever an operation may be
//!   delegated out of process
//! - [`ProcessBridge`], which spawns `<interpreter> <script> <operation>
//!   <params>` with a bounded lifetime and decodes the JSON object it prints
//! - The [`BridgeError`] taxonomy separating invocation failures, timeouts
//!   and undecodable output

pub mod client;
pub mod config;
pub mod error;
pub mod process;

pub use client::{encode_params, BridgeClient, BridgeOutput, BridgeParams};
pub use config::BridgeConfig;
pub use error::BridgeError;
pub use process::ProcessBridge;
