//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the telemetry dispatcher.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Record flow
//! - Producers build a [`LogRecord`]
//! - The encoder turns it into a [`QueueItem`] (kind + opaque payload)
//! - The dispatcher resolves an [`Endpoint`] and hands a [`DispatchRequest`]
//!   to a [`Transport`]

mod config;
mod endpoint;
mod error;
mod record;
mod state;
mod stats;
mod token;
mod transport;

pub use config::*;
pub use endpoint::*;
pub use error::*;
pub use record::*;
pub use state::*;
pub use stats::*;
pub use token::*;
pub use transport::*;
