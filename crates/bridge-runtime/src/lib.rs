//! # Bridge Runtime
//!
//! Runs a single `fftokens` token connector outside the orchestration node:
//! configuration comes from CLI flags and `TB_*` environment variables, and
//! every confirmation is logged by [`LoggingCallbacks`].

#![warn(missing_docs)]

pub mod args;
pub mod callbacks;

pub use args::Args;
pub use callbacks::{CallbackCounts, LoggingCallbacks};
