//! Transport trait - Dispatcher output interface
//!
//! Defines the abstract interface for shipping one request to the collector.

use crate::{ContractError, DispatchRequest};

/// Delivery trait
///
/// All transport implementations must implement this trait.
#[trait_variant::make(Transport: Send)]
pub trait LocalTransport {
    /// Transport name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Deliver one request
    ///
    /// # Errors
    /// Any failure, including a non-success response, is an error. The
    /// dispatcher does not retry.
    async fn send(&self, request: &DispatchRequest) -> Result<(), ContractError>;
}
