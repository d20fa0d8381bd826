//! Domain logic for the upscale service.
//!
//! Everything here is independent of HTTP: file naming conventions, the
//! on-disk layout, the per-job state machine, invoking the external upscaler
//! and inspecting its output. The `upscale-api` crate wires these together
//! behind axum handlers.

pub mod error;
pub mod hashing;
pub mod image_info;
pub mod job;
pub mod naming;
pub mod storage;
pub mod types;
pub mod upscaler;
pub mod workflow;
