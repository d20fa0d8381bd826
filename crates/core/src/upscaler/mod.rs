//! Invocation of the external upscaling program.
//!
//! The upscaler is an opaque executable. [`Upscaler`] is the seam the rest of
//! the service talks to; [`ProcessUpscaler`] is the production
//! implementation that launches the configured command as a child process
//! and waits for it to exit.

pub mod command;
pub mod invoker;
pub mod process;
pub mod subprocess;

pub use command::UpscaleCommand;
pub use invoker::{UpscaleError, UpscaleOutput, UpscaleRequest, Upscaler};
pub use process::ProcessUpscaler;
