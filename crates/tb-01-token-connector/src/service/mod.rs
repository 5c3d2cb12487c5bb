//! # Service Module
//!
//! Command issuer, event loop and the connector facade tying them together.

pub mod connector;
pub mod event_loop;
pub mod issuer;
pub mod shutdown;

pub use connector::{TokenConnector, Transports};
pub use event_loop::{EventLoop, EventLoopError, LoopExit};
pub use issuer::{
    CommandIssuer, ACTIVATE_POOL_PATH, APPROVAL_PATH, BURN_PATH, CREATE_POOL_PATH, MINT_PATH,
    TRANSFER_PATH,
};
pub use shutdown::{shutdown_channel, ShutdownSignal, ShutdownTrigger};
