//! # Shared Types Crate
//!
//! Domain types shared between token connectors and the orchestration node
//! that drives them.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: records, requests and identifiers that cross
//!   the connector/node boundary are defined here.
//! - **Validated Construction**: records are built only from validated data;
//!   loosely-typed connector payloads never leave the connector crate.

pub mod errors;
pub mod identifiers;
pub mod tokens;

pub use errors::*;
pub use identifiers::*;
pub use tokens::*;
